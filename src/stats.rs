//! Read-only statistics over the simulation state.

use crate::model::{Agent, AgentHealth, HealthState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell counts of the field model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldStats {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
}

impl FieldStats {
    pub fn count(cells: &[HealthState]) -> Self {
        let mut stats = Self::default();
        for state in cells {
            match state {
                HealthState::Susceptible => stats.susceptible += 1,
                HealthState::Infected => stats.infected += 1,
                HealthState::Recovered => stats.recovered += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered
    }
}

/// Population counts of the agent model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentStats {
    pub healthy: usize,
    pub infected: usize,
    pub alive: usize,
}

impl AgentStats {
    pub fn count(agents: &[Agent]) -> Self {
        let mut stats = Self::default();
        for agent in agents {
            match agent.health() {
                AgentHealth::Healthy => stats.healthy += 1,
                AgentHealth::Infected => stats.infected += 1,
            }
        }
        stats.alive = agents.len();
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stats {
    Field(FieldStats),
    Agents(AgentStats),
}

impl Stats {
    /// Number of infected cells or agents.
    pub fn infected(&self) -> usize {
        match self {
            Stats::Field(stats) => stats.infected,
            Stats::Agents(stats) => stats.infected,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stats::Field(s) => write!(
                f,
                "susceptible: {} | infected: {} | recovered: {}",
                s.susceptible, s.infected, s.recovered
            ),
            Stats::Agents(s) => write!(
                f,
                "healthy: {} | infected: {} | alive: {}",
                s.healthy, s.infected, s.alive
            ),
        }
    }
}

/// Running mean and variance (Welford).
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Outcome of a driver run.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Calls made to `Engine::step`, including ones that changed nothing.
    pub steps: usize,
    /// Tick of the engine when the run ended.
    pub final_tick: u64,
    pub final_stats: Stats,
    pub peak_infected: usize,
    pub peak_tick: u64,
    /// Infected count over the run, sampled after every step.
    pub infected: AccumulatorReport,
}

/// Builds a [`Summary`] one step at a time.
#[derive(Debug, Clone)]
pub struct Tracker {
    steps: usize,
    last_tick: u64,
    last_stats: Stats,
    peak_infected: usize,
    peak_tick: u64,
    infected: Accumulator,
}

impl Tracker {
    pub fn new(tick: u64, stats: Stats) -> Self {
        Self {
            steps: 0,
            last_tick: tick,
            last_stats: stats,
            peak_infected: stats.infected(),
            peak_tick: tick,
            infected: Accumulator::new(),
        }
    }

    pub fn record(&mut self, tick: u64, stats: Stats) {
        self.steps += 1;
        self.last_tick = tick;
        self.last_stats = stats;

        let infected = stats.infected();
        self.infected.add(infected as f64);
        if infected > self.peak_infected {
            self.peak_infected = infected;
            self.peak_tick = tick;
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            steps: self.steps,
            final_tick: self.last_tick,
            final_stats: self.last_stats,
            peak_infected: self.peak_infected,
            peak_tick: self.peak_tick,
            infected: self.infected.report(),
        }
    }
}
