//! Toroidal grid geometry.
//!
//! Positions are continuous `(x, y)` pairs; cells are the integer squares
//! that contain them. Every position that leaves the grid on one edge
//! re-enters on the opposite edge, and every distance is measured along the
//! shortest path across the wrap.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A continuous point on the torus.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from raw coordinates (not wrapped).
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The position as `[x, y]`.
    pub const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Translate by `(dx, dy)` without wrapping.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether both coordinates are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An integer grid cell, ordered by `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
}

impl Cell {
    /// Create a cell from its column and row.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The cell's lower-left corner as a position.
    #[allow(clippy::cast_precision_loss)] // grid axes are far below 2^52
    pub const fn origin(self) -> Position {
        Position::new(self.x as f64, self.y as f64)
    }

    /// The cell's centre as a position.
    pub fn center(self) -> Position {
        self.origin().offset(0.5, 0.5)
    }
}

/// Width and height of a toroidal grid; both are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    width: usize,
    height: usize,
}

impl GridDims {
    /// Create grid dimensions, rejecting a zero-sized axis.
    pub const fn new(width: usize, height: usize) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    pub const fn width(self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub const fn cell_count(self) -> usize {
        self.width.saturating_mul(self.height)
    }

    #[allow(clippy::cast_precision_loss)] // grid axes are far below 2^52
    const fn extent(self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    /// Map any position into `[0, width) x [0, height)`.
    ///
    /// Non-finite coordinates map to 0.
    pub fn wrap(self, p: Position) -> Position {
        let (w, h) = self.extent();
        Position::new(wrap_axis(p.x, w), wrap_axis(p.y, h))
    }

    /// The cell containing `p` after wrapping.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // wrapped coords are in [0, axis)
    pub fn cell_of(self, p: Position) -> Cell {
        let w = self.wrap(p);
        let x = (w.x.floor() as usize).min(self.width.saturating_sub(1));
        let y = (w.y.floor() as usize).min(self.height.saturating_sub(1));
        Cell::new(x, y)
    }

    /// Wrap signed integer coordinates onto a cell.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn wrap_cell(self, x: i64, y: i64) -> Cell {
        // Axis lengths fit in i64 for any grid that fits in memory.
        let w = self.width as i64;
        let h = self.height as i64;
        Cell::new(x.rem_euclid(w) as usize, y.rem_euclid(h) as usize)
    }

    /// Shortest signed displacement from `from` to `to` across the wrap.
    pub fn delta(self, from: Position, to: Position) -> (f64, f64) {
        let (w, h) = self.extent();
        let a = self.wrap(from);
        let b = self.wrap(to);
        (shortest_axis(b.x - a.x, w), shortest_axis(b.y - a.y, h))
    }

    /// Shortest Euclidean distance between two positions on the torus.
    pub fn distance(self, a: Position, b: Position) -> f64 {
        let (dx, dy) = self.delta(a, b);
        dx.hypot(dy)
    }

    /// Shortest distance between two cells, measured on their indices.
    pub fn cell_distance(self, a: Cell, b: Cell) -> f64 {
        self.distance(a.origin(), b.origin())
    }

    /// Row-major storage index of a cell.
    pub const fn index(self, cell: Cell) -> usize {
        cell.y
            .saturating_mul(self.width)
            .saturating_add(cell.x)
    }

    /// Inverse of [`GridDims::index`].
    pub const fn cell_at(self, index: usize) -> Cell {
        // `width` is non-zero by construction.
        let x = index.checked_rem(self.width);
        let y = index.checked_div(self.width);
        match (x, y) {
            (Some(x), Some(y)) => Cell::new(x, y),
            _ => Cell::new(0, 0),
        }
    }

    /// Every cell whose integer offset `(dx, dy)` from the cell containing
    /// `center` satisfies `dx^2 + dy^2 <= radius^2`.
    ///
    /// Cells are returned once each in `Cell` order, even when the disc is
    /// wider than the grid. A negative or non-finite radius yields only the
    /// centre cell.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn disc_cells(self, center: Position, radius: f64) -> Vec<Cell> {
        let c = self.cell_of(center);
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        // Wider than the grid in both directions adds nothing new.
        let limit = self.width.max(self.height) as f64;
        let reach = radius.min(limit).floor() as i64;
        let r2 = radius * radius;
        let cx = c.x as i64;
        let cy = c.y as i64;

        let mut cells = BTreeSet::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let d2 = (dx as f64).mul_add(dx as f64, (dy as f64) * (dy as f64));
                if d2 <= r2 {
                    cells.insert(self.wrap_cell(cx.saturating_add(dx), cy.saturating_add(dy)));
                }
            }
        }
        cells.into_iter().collect()
    }

    /// The four edge-adjacent neighbours of a cell (right, left, up, down).
    #[allow(clippy::cast_possible_wrap)]
    pub fn neighbors4(self, cell: Cell) -> [Cell; 4] {
        let x = cell.x as i64;
        let y = cell.y as i64;
        [
            self.wrap_cell(x.saturating_add(1), y),
            self.wrap_cell(x.saturating_sub(1), y),
            self.wrap_cell(x, y.saturating_add(1)),
            self.wrap_cell(x, y.saturating_sub(1)),
        ]
    }
}

fn wrap_axis(v: f64, extent: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let r = v.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs.
    if r >= extent { 0.0 } else { r }
}

fn shortest_axis(d: f64, extent: f64) -> f64 {
    let half = extent / 2.0;
    if d > half {
        d - extent
    } else if d < -half {
        d + extent
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn dims() -> GridDims {
        GridDims::new(10, 8).unwrap()
    }

    #[test]
    fn zero_axis_is_rejected() {
        assert_eq!(
            GridDims::new(0, 5),
            Err(WorldError::InvalidDimensions { width: 0, height: 5 })
        );
    }

    #[test]
    fn wrap_handles_negative_and_overflowing_inputs() {
        let d = dims();
        assert_eq!(d.wrap(Position::new(-1.0, -0.5)), Position::new(9.0, 7.5));
        assert_eq!(d.wrap(Position::new(25.0, 16.0)), Position::new(5.0, 0.0));
        let tiny = d.wrap(Position::new(-1e-20, 3.0));
        assert!(tiny.x >= 0.0 && tiny.x < 10.0);
    }

    #[test]
    fn wrap_is_idempotent() {
        let d = dims();
        for p in [
            Position::new(-13.75, 4.5),
            Position::new(123.125, -77.0),
            Position::new(0.0, 0.0),
            Position::new(9.999, 7.999),
        ] {
            let once = d.wrap(p);
            assert_eq!(d.wrap(once), once);
        }
    }

    #[test]
    fn wrap_is_periodic_in_width() {
        let d = dims();
        let p = Position::new(3.25, -2.5);
        assert_eq!(d.wrap(p.offset(10.0, 0.0)), d.wrap(p));
        assert_eq!(d.wrap(p.offset(0.0, 8.0)), d.wrap(p));
    }

    #[test]
    fn distance_takes_the_short_way_round() {
        let d = dims();
        let a = Position::new(0.5, 0.5);
        let b = Position::new(9.5, 0.5);
        assert!((d.distance(a, b) - 1.0).abs() < 1e-12);
        let (dx, _) = d.delta(a, b);
        assert!((dx + 1.0).abs() < 1e-12);
    }

    #[test]
    fn index_round_trips_through_cell_at() {
        let d = dims();
        let cell = Cell::new(7, 3);
        assert_eq!(d.index(cell), 37);
        assert_eq!(d.cell_at(37), cell);
    }

    #[test]
    fn disc_counts_match_integer_lattice() {
        let d = GridDims::new(50, 50).unwrap();
        let center = Position::new(25.5, 25.5);
        assert_eq!(d.disc_cells(center, 0.0).len(), 1);
        assert_eq!(d.disc_cells(center, 1.0).len(), 5);
        assert_eq!(d.disc_cells(center, 2.0).len(), 13);
    }

    #[test]
    fn disc_wider_than_grid_covers_each_cell_once() {
        let d = GridDims::new(3, 3).unwrap();
        let cells = d.disc_cells(Position::new(1.0, 1.0), 10.0);
        assert_eq!(cells.len(), 9);
    }

    #[test]
    fn neighbors_wrap_at_edges() {
        let d = dims();
        let n = d.neighbors4(Cell::new(0, 0));
        assert!(n.contains(&Cell::new(9, 0)));
        assert!(n.contains(&Cell::new(0, 7)));
    }
}
