//! Repeated stepping of an [`Engine`], the way an auto-run button would.

use crate::engine::Engine;
use crate::stats::{Summary, Tracker};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

/// Shared flag that asks a running [`Driver`] to stop before its next step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Driver {
    engine: Engine,
    delay: Duration,
    cancel: CancelToken,
}

impl Driver {
    pub fn new(engine: Engine, delay: Duration) -> Self {
        Self {
            engine,
            delay,
            cancel: CancelToken::default(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Step up to `n_steps` times, reporting progress every `steps_per_report` steps.
    ///
    /// Stepping continues after the world has settled; later steps just do nothing.
    pub fn run(&mut self, n_steps: usize, steps_per_report: usize) -> Summary {
        let steps_per_report = steps_per_report.max(1);
        let mut tracker = Tracker::new(self.engine.tick(), self.engine.stats());
        let mut settled = self.engine.is_settled();

        for i_step in 0..n_steps {
            if self.cancel.is_cancelled() {
                log::info!("cancelled after {i_step} steps");
                break;
            }

            self.engine.step();
            let stats = self.engine.stats();
            tracker.record(self.engine.tick(), stats);

            if !settled && self.engine.is_settled() {
                settled = true;
                log::info!("no further infection possible at tick {}", self.engine.tick());
            }

            if (i_step + 1) % steps_per_report == 0 {
                let progress = 100.0 * (i_step + 1) as f64 / n_steps as f64;
                log::info!("completed {progress:06.2}% | {stats}");
            }

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        tracker.summary()
    }
}
