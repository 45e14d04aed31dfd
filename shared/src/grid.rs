//! Coordinate space of the dot lattice
//!
//! A grid is measured in dots, not boxes: a `3x3` grid has nine dots and
//! four boxes. Points are plain value types and never check bounds on their
//! own; [`Grid::contains`] is the only authority on validity.

use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// A lattice position, serialized as `"x,y"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    pub fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    pub fn up(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    pub fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for GridPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParseError::Point(s.to_string()))?;
        let x = x.parse().map_err(|_| ParseError::Point(s.to_string()))?;
        let y = y.parse().map_err(|_| ParseError::Point(s.to_string()))?;
        Ok(Self::new(x, y))
    }
}

/// Dimensions of the dot lattice, serialized as `"WxH"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    max_spaces: i32,
}

impl Grid {
    /// Smallest legal extent on either axis
    pub const MIN_EXTENT: i32 = 2;

    /// Largest legal extent on either axis
    ///
    /// Every dot is allocated up front, so this caps the board at 64k dots.
    pub const MAX_EXTENT: i32 = 256;

    pub const DEFAULT_EXTENT: i32 = 8;

    /// Creates a grid with both extents in `MIN_EXTENT..=MAX_EXTENT`
    pub fn new(width: i32, height: i32) -> Result<Self, ParseError> {
        let extents = Self::MIN_EXTENT..=Self::MAX_EXTENT;
        let max_spaces = (extents.contains(&width) && extents.contains(&height))
            .then(|| (width - 1).checked_mul(height - 1))
            .flatten()
            .ok_or_else(|| ParseError::Grid(format!("{}x{}", width, height)))?;
        Ok(Self {
            width,
            height,
            max_spaces,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of boxes the grid holds, i.e. the total score of a finished game
    pub fn max_spaces(&self) -> i32 {
        self.max_spaces
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
    }

    /// Every lattice point in column-major order
    ///
    /// The order is stable; full-state replays to late joiners depend on it.
    pub fn all_points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| GridPoint::new(x, y)))
    }

    /// Replaces the dimensions
    ///
    /// Callers own the dot mapping and must reconcile it afterwards.
    pub fn resize(&mut self, other: Grid) {
        *self = other;
    }
}

impl Default for Grid {
    /// The 8x8 board a fresh host offers
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_EXTENT,
            height: Self::DEFAULT_EXTENT,
            max_spaces: (Self::DEFAULT_EXTENT - 1) * (Self::DEFAULT_EXTENT - 1),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Grid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| ParseError::Grid(s.to_string()))?;
        let w = w.parse().map_err(|_| ParseError::Grid(s.to_string()))?;
        let h = h.parse().map_err(|_| ParseError::Grid(s.to_string()))?;
        Grid::new(w, h)
    }
}
