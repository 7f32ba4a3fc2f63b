use crate::agents::Population;
use crate::config::{Config, Params, Rates, Variant};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::model::{Agent, Coord, HealthState, Terrain};
use crate::stats::Stats;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Simulation engine.
///
/// Holds the configuration, current world, and random number generator,
/// and provides methods to reset, step, and inspect simulations. It is the
/// only writer of its state; callers mutate it through [`Engine::infect`].
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: Config,
    rates: Rates,
    world: World,
    rng: ChaCha12Rng,
    tick: u64,
}

/// State owned by the engine, one variant per model.
#[derive(Debug, Clone, PartialEq)]
pub enum World {
    Field(Field),
    Agents(Population),
}

/// What a renderer needs to draw one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Field(HealthState),
    Terrain(Terrain),
}

impl Engine {
    /// Create a new `Engine` from a configuration, performing the first reset.
    pub fn new(cfg: Config) -> Result<Self> {
        let mut rng = seed_rng(cfg.seed)?;
        let (rates, world) = build(&cfg, &mut rng)?;
        log::debug!("created {:?} world of size {}", cfg.variant, cfg.init.size);
        Ok(Self {
            cfg,
            rates,
            world,
            rng,
            tick: 0,
        })
    }

    /// Replace the whole simulation with a fresh one built from `cfg`.
    ///
    /// The configuration is validated first; on error the current
    /// simulation is left untouched.
    pub fn reset(&mut self, cfg: Config) -> Result<()> {
        *self = Self::new(cfg)?;
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// An empty agent population is left as is and does not advance the tick.
    pub fn step(&mut self) {
        let advanced = match &mut self.world {
            World::Field(field) => {
                field.step(&self.rates, &mut self.rng);
                true
            }
            World::Agents(pop) => pop.step(&self.rates, &mut self.rng),
        };
        if advanced {
            self.tick += 1;
            log::trace!("tick {}: {}", self.tick, self.stats());
        }
    }

    /// Swap the dynamics between steps.
    pub fn set_params(&mut self, params: Params) -> Result<()> {
        self.rates = params.rates()?;
        self.cfg.params = params;
        Ok(())
    }

    pub fn set_containment(&mut self, containment: bool) -> Result<()> {
        let params = Params {
            containment,
            ..self.cfg.params.clone()
        };
        self.set_params(params)
    }

    /// Force an infection at `coord`: the cell itself for the field model,
    /// every healthy agent standing there for the agent model.
    pub fn infect(&mut self, coord: Coord) -> Result<()> {
        match &mut self.world {
            World::Field(field) => field.infect(coord),
            World::Agents(pop) => pop.infect(coord),
        }
    }

    pub fn stats(&self) -> Stats {
        match &self.world {
            World::Field(field) => Stats::Field(field.stats()),
            World::Agents(pop) => Stats::Agents(pop.stats()),
        }
    }

    pub fn cell_state(&self, coord: Coord) -> Result<CellView> {
        match &self.world {
            World::Field(field) => field.cell_state(coord).map(CellView::Field),
            World::Agents(pop) => pop.terrain().get(coord).map(CellView::Terrain),
        }
    }

    /// Living agents in id order; empty for the field model.
    pub fn agents(&self) -> &[Agent] {
        match &self.world {
            World::Field(_) => &[],
            World::Agents(pop) => pop.agents(),
        }
    }

    /// Whether no further infection is possible.
    pub fn is_settled(&self) -> bool {
        match &self.world {
            World::Field(field) => field.is_settled(self.rates.neighborhood),
            World::Agents(pop) => pop.is_settled(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Number of effective steps since the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

fn seed_rng(seed: Option<u64>) -> Result<ChaCha12Rng> {
    match seed {
        Some(seed) => Ok(ChaCha12Rng::seed_from_u64(seed)),
        None => ChaCha12Rng::try_from_os_rng().map_err(|err| Error::Entropy(err.to_string())),
    }
}

fn build(cfg: &Config, rng: &mut ChaCha12Rng) -> Result<(Rates, World)> {
    cfg.validate()?;
    let rates = cfg.params.rates()?;
    let init = &cfg.init;

    let world = match cfg.variant {
        Variant::Field => {
            let mut field = Field::new(init.size, init.p_immune, rng)?;
            for &coord in &init.infected {
                field.infect(coord)?;
            }
            World::Field(field)
        }
        Variant::Agents => World::Agents(Population::new(
            init.size,
            init.n_agents,
            init.n_infected,
            init.p_occupied,
            rng,
        )?),
    };

    Ok((rates, world))
}
