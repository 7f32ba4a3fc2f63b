use crate::error::{Error, Result};
use crate::model::{Coord, Neighborhood};
use anyhow::Context;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which model the engine runs.
    pub variant: Variant,
    /// Seed of the random number generator. Drawn from the OS when absent.
    pub seed: Option<u64>,

    pub params: Params,
    pub init: InitConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Cellular automaton over susceptible, infected and recovered cells.
    #[default]
    Field,
    /// Mobile agents over a terrain grid.
    Agents,
}

/// Dynamics of the simulation. May change between steps.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Probability that an infected cell infects a susceptible neighbour.
    pub p_inf: f64,
    /// Probability that an infected cell recovers.
    pub p_rec: f64,
    /// Probability that an infected agent dies.
    pub p_death: f64,
    /// Probability that an agent attempts a move.
    pub p_move: f64,

    /// Whether containment measures are active.
    pub containment: bool,
    /// Divisor applied to `p_inf` while containment is active.
    pub containment_factor: f64,

    pub neighborhood: Neighborhood,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            p_inf: 0.4,
            p_rec: 0.1,
            p_death: 0.05,
            p_move: 0.5,
            containment: false,
            containment_factor: 3.0,
            neighborhood: Neighborhood::Moore,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        check_prob(self.p_inf, "infection probability")?;
        check_prob(self.p_rec, "recovery probability")?;
        check_prob(self.p_death, "death probability")?;
        check_prob(self.p_move, "movement probability")?;
        check_num(self.containment_factor, 1.0..=1e6, "containment factor")?;
        Ok(())
    }

    /// Infection probability after containment dampening.
    pub fn effective_p_inf(&self) -> f64 {
        if self.containment {
            self.p_inf / self.containment_factor
        } else {
            self.p_inf
        }
    }

    /// Build the per-step distributions. Fails on out-of-range parameters.
    pub fn rates(&self) -> Result<Rates> {
        self.validate()?;
        Ok(Rates {
            infect: bernoulli(self.effective_p_inf(), "effective infection probability")?,
            recover: bernoulli(self.p_rec, "recovery probability")?,
            death: bernoulli(self.p_death, "death probability")?,
            movement: bernoulli(self.p_move, "movement probability")?,
            neighborhood: self.neighborhood,
        })
    }
}

/// Validated, sampling-ready form of [`Params`].
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    pub infect: Bernoulli,
    pub recover: Bernoulli,
    pub death: Bernoulli,
    pub movement: Bernoulli,
    pub neighborhood: Neighborhood,
}

/// Initial condition applied on every reset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitConfig {
    /// Side length of the grid.
    pub size: usize,
    /// Fraction of cells that start recovered (field model).
    pub p_immune: f64,
    /// Fraction of terrain cells that start occupied (agent model).
    pub p_occupied: f64,
    /// Number of agents placed (agent model).
    pub n_agents: usize,
    /// Number of those agents that start infected.
    pub n_infected: usize,
    /// Cells infected right after the reset (field model).
    pub infected: Vec<Coord>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            size: 20,
            p_immune: 0.15,
            p_occupied: 0.8,
            n_agents: 10,
            n_infected: 3,
            infected: Vec::new(),
        }
    }
}

impl InitConfig {
    pub fn validate(&self) -> Result<()> {
        check_num(self.size, 1..=10_000, "grid size")?;
        check_prob(self.p_immune, "initial immunity fraction")?;
        check_prob(self.p_occupied, "occupied terrain fraction")?;
        check_num(self.n_agents, 0..=100_000, "number of agents")?;
        if self.n_infected > self.n_agents {
            return Err(Error::InvalidConfig(format!(
                "initial infected count {} exceeds population of {}",
                self.n_infected, self.n_agents
            )));
        }
        if let Some(coord) = self
            .infected
            .iter()
            .find(|c| c.row >= self.size || c.col >= self.size)
        {
            return Err(Error::InvalidConfig(format!(
                "initially infected cell {coord} is outside the {0}x{0} grid",
                self.size
            )));
        }
        Ok(())
    }
}

/// Settings of the stepping loop run by the binary.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Number of steps to run.
    pub n_steps: usize,
    /// Number of steps between progress reports.
    pub steps_per_report: usize,
    /// Pause between steps, in milliseconds.
    pub delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            n_steps: 100,
            steps_per_report: 10,
            delay_ms: 0,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Missing keys take their defaults; unknown keys are rejected.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> anyhow::Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        self.init.validate()?;
        check_num(self.driver.steps_per_report, 1.., "number of steps per report")?;
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R, what: &str) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(Error::InvalidConfig(format!(
            "{what} must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

fn check_prob(prob: f64, what: &str) -> Result<()> {
    check_num(prob, 0.0..=1.0, what)
}

fn bernoulli(prob: f64, what: &str) -> Result<Bernoulli> {
    Bernoulli::new(prob).map_err(|err| Error::InvalidConfig(format!("{what}: {err}")))
}
