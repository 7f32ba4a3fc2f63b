//! Dense square grid shared by both models.

use crate::error::{Error, Result};
use crate::model::{Coord, Neighborhood};
use std::ops::{Index, IndexMut};

/// A `size x size` grid stored row-major, one value per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Build a grid by evaluating `init` once per cell, in row-major order.
    pub fn from_fn(size: usize, mut init: impl FnMut(Coord) -> T) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                cells.push(init(Coord::new(row, col)));
            }
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    pub fn linear_index(&self, coord: Coord) -> Result<usize> {
        if !self.contains(coord) {
            return Err(Error::OutOfBounds {
                coord,
                size: self.size,
            });
        }
        Ok(coord.row * self.size + coord.col)
    }

    pub fn coord(&self, idx: usize) -> Coord {
        Coord::new(idx / self.size, idx % self.size)
    }

    pub fn get(&self, coord: Coord) -> Result<T> {
        let idx = self.linear_index(coord)?;
        Ok(self.cells[idx])
    }

    pub fn set(&mut self, coord: Coord, val: T) -> Result<()> {
        let idx = self.linear_index(coord)?;
        self.cells[idx] = val;
        Ok(())
    }

    /// Iterate `(coord, value)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, &val)| (self.coord(idx), val))
    }

    /// In-bounds neighbours of `coord`; cells past the edge are dropped.
    pub fn neighbours(
        &self,
        coord: Coord,
        neighborhood: Neighborhood,
    ) -> impl Iterator<Item = Coord> + '_ {
        neighborhood
            .offsets()
            .iter()
            .filter_map(move |&(d_row, d_col)| coord.offset(d_row, d_col, self.size))
    }
}

/// Panics if `coord` is outside the grid; use [`Grid::get`] for checked access.
impl<T> Index<Coord> for Grid<T> {
    type Output = T;

    fn index(&self, coord: Coord) -> &T {
        assert!(coord.col < self.size, "column {} out of range", coord.col);
        &self.cells[coord.row * self.size + coord.col]
    }
}

impl<T> IndexMut<Coord> for Grid<T> {
    fn index_mut(&mut self, coord: Coord) -> &mut T {
        assert!(coord.col < self.size, "column {} out of range", coord.col);
        &mut self.cells[coord.row * self.size + coord.col]
    }
}
