//! Cellular automaton over susceptible, infected and recovered cells.

use crate::config::Rates;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::model::{Coord, HealthState, Neighborhood};
use crate::stats::FieldStats;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

/// Grid of [`HealthState`] cells updated synchronously.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    grid: Grid<HealthState>,
}

impl Field {
    /// Build an `size x size` field where each cell starts recovered with probability `p_immune`.
    pub fn new<R: Rng + ?Sized>(size: usize, p_immune: f64, rng: &mut R) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("grid size must be positive".into()));
        }
        let immune_dist = Bernoulli::new(p_immune).map_err(|err| {
            Error::InvalidConfig(format!("initial immunity fraction {p_immune}: {err}"))
        })?;

        let grid = Grid::from_fn(size, |_| {
            if immune_dist.sample(rng) {
                HealthState::Recovered
            } else {
                HealthState::Susceptible
            }
        });

        Ok(Self { grid })
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn grid(&self) -> &Grid<HealthState> {
        &self.grid
    }

    pub fn cell_state(&self, coord: Coord) -> Result<HealthState> {
        self.grid.get(coord)
    }

    /// Infect a susceptible cell.
    ///
    /// Cells in any other state are left alone. Coordinates outside the grid
    /// yield [`Error::OutOfBounds`] and leave the field unchanged.
    pub fn infect(&mut self, coord: Coord) -> Result<()> {
        if self.grid.get(coord)? == HealthState::Susceptible {
            self.grid[coord] = HealthState::Infected;
        }
        Ok(())
    }

    /// Advance one tick.
    ///
    /// Every rule reads the pre-step cells and writes into a copy that
    /// replaces the grid at the end, so a cell infected during this step
    /// cannot spread until the next one.
    pub fn step<R: Rng + ?Sized>(&mut self, rates: &Rates, rng: &mut R) {
        let mut next = self.grid.clone();
        let cur = &self.grid;

        for (coord, state) in cur.iter() {
            if state != HealthState::Infected {
                continue;
            }

            for nb in cur.neighbours(coord, rates.neighborhood) {
                if cur[nb] == HealthState::Susceptible && rates.infect.sample(rng) {
                    next[nb] = HealthState::Infected;
                }
            }

            if rates.recover.sample(rng) {
                next[coord] = HealthState::Recovered;
            }
        }

        self.grid = next;
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats::count(self.grid.cells())
    }

    /// Whether no infected cell has a susceptible neighbour.
    pub fn is_settled(&self, neighborhood: Neighborhood) -> bool {
        !self.grid.iter().any(|(coord, state)| {
            state == HealthState::Infected
                && self
                    .grid
                    .neighbours(coord, neighborhood)
                    .any(|nb| self.grid[nb] == HealthState::Susceptible)
        })
    }
}
