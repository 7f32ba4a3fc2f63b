//! Simulation data types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a cell, `row` and `col` both in `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Shift by `(d_row, d_col)`, or `None` if the result leaves the `size x size` grid.
    pub fn offset(self, d_row: isize, d_col: isize, size: usize) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        (row < size && col < size).then_some(Self { row, col })
    }

    pub fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<[usize; 2]> for Coord {
    fn from([row, col]: [usize; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Coord> for [usize; 2] {
    fn from(coord: Coord) -> Self {
        [coord.row, coord.col]
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// State of a cell in the field model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    Susceptible,
    Infected,
    Recovered,
}

/// Ground under the agent population. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Occupied,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentHealth {
    Healthy,
    Infected,
}

/// Mobile agent of the population model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: u32,
    coord: Coord,
    health: AgentHealth,
}

impl Agent {
    pub fn new(id: u32, coord: Coord, health: AgentHealth) -> Self {
        Self { id, coord, health }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn health(&self) -> AgentHealth {
        self.health
    }

    pub fn is_infected(&self) -> bool {
        self.health == AgentHealth::Infected
    }

    pub(crate) fn move_to(&mut self, coord: Coord) {
        self.coord = coord;
    }

    pub(crate) fn infect(&mut self) {
        self.health = AgentHealth::Infected;
    }
}

/// Cells considered adjacent when infection spreads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 4-connected: north, south, west, east.
    VonNeumann,
    /// 8-connected: the von Neumann cells plus the diagonals.
    #[default]
    Moore,
}

const VON_NEUMANN: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const MOORE: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Neighborhood {
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::VonNeumann => &VON_NEUMANN,
            Neighborhood::Moore => &MOORE,
        }
    }
}

/// The four axis-aligned unit moves an agent can take.
pub const AXIS_MOVES: [(isize, isize); 4] = VON_NEUMANN;
