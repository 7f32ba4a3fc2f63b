//! Error types for the engine.

use crate::model::Coord;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Rejected configuration. Only raised while resetting or reconfiguring, never by a step.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("coordinate {coord} is outside the {size}x{size} grid")]
    OutOfBounds { coord: Coord, size: usize },

    #[error("no living agent with id {0}")]
    UnknownAgent(u32),

    #[error("failed to seed the generator from the OS: {0}")]
    Entropy(String),
}
