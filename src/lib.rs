//! Epidemic propagation on grids and in mobile agent populations.
//!
//! An [`Engine`] owns one simulation: either a [`Field`] of susceptible,
//! infected and recovered cells updated synchronously, or a [`Population`]
//! of agents moving over a terrain and infecting each other on contact.
//! Outside code resets it from a [`Config`], calls [`Engine::step`], and
//! reads back [`Stats`] and per-cell or per-agent state to draw.

pub mod agents;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod field;
pub mod grid;
pub mod model;
pub mod stats;

pub use agents::Population;
pub use config::{Config, DriverConfig, InitConfig, Params, Variant};
pub use driver::{CancelToken, Driver};
pub use engine::{CellView, Engine, World};
pub use error::{Error, Result};
pub use field::Field;
pub use grid::Grid;
pub use model::{Agent, AgentHealth, Coord, HealthState, Neighborhood, Terrain};
pub use stats::{AgentStats, FieldStats, Stats, Summary};
