//! Line and box ownership keyed by lattice position
//!
//! Every [`Dot`] is plain data: it owns the line to its right, the line
//! below it and the box whose top-left corner it is, when those exist.
//! Nothing points back at the grid or the players; the board is the only
//! index from position to ownership.

use crate::error::{MoveError, ParseError};
use crate::grid::{Grid, GridPoint};
use crate::PlayerId;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Direction of a line relative to the dot that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The line to the right of the dot
    Horizontal,
    /// The line below the dot
    Vertical,
}

impl Orientation {
    pub fn is_vertical(self) -> bool {
        self == Orientation::Vertical
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Horizontal => "hor",
            Orientation::Vertical => "ver",
        })
    }
}

impl FromStr for Orientation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hor" => Ok(Orientation::Horizontal),
            "ver" => Ok(Orientation::Vertical),
            other => Err(ParseError::Orientation(other.to_string())),
        }
    }
}

/// A claimable line or box; ownership is write-once until a board reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Claim {
    owner: Option<PlayerId>,
}

impl Claim {
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns false when already owned
    fn claim(&mut self, player: PlayerId) -> bool {
        if self.owner.is_some() {
            return false;
        }
        self.owner = Some(player);
        true
    }
}

/// One lattice vertex and whatever it owns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dot {
    pub right: Option<Claim>,
    pub down: Option<Claim>,
    pub cell: Option<Claim>,
}

impl Dot {
    /// Shapes a dot for its position: the last column has no right line, the
    /// last row no down line, and only dots with both lines own a box.
    fn shaped(grid: &Grid, point: GridPoint) -> Self {
        let right = (point.x < grid.width() - 1).then(Claim::default);
        let down = (point.y < grid.height() - 1).then(Claim::default);
        let cell = (right.is_some() && down.is_some()).then(Claim::default);
        Self { right, down, cell }
    }

    /// Re-shapes for a resized grid, keeping the state of surviving slots
    fn reshaped(&self, grid: &Grid, point: GridPoint) -> Self {
        let fresh = Self::shaped(grid, point);
        Self {
            right: fresh.right.map(|c| self.right.unwrap_or(c)),
            down: fresh.down.map(|c| self.down.unwrap_or(c)),
            cell: fresh.cell.map(|c| self.cell.unwrap_or(c)),
        }
    }

    pub fn line(&self, orientation: Orientation) -> Option<&Claim> {
        match orientation {
            Orientation::Horizontal => self.right.as_ref(),
            Orientation::Vertical => self.down.as_ref(),
        }
    }

    fn line_mut(&mut self, orientation: Orientation) -> Option<&mut Claim> {
        match orientation {
            Orientation::Horizontal => self.right.as_mut(),
            Orientation::Vertical => self.down.as_mut(),
        }
    }

    fn reset(&mut self) {
        for claim in [&mut self.right, &mut self.down, &mut self.cell]
            .into_iter()
            .flatten()
        {
            *claim = Claim::default();
        }
    }
}

/// A claimed line, as replayed to late joiners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedLine {
    pub owner: PlayerId,
    pub orientation: Orientation,
    pub point: GridPoint,
}

/// Ownership of every line and box on the grid
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    dots: HashMap<GridPoint, Dot>,
}

impl Board {
    pub fn new(grid: Grid) -> Self {
        let dots = grid
            .all_points()
            .map(|point| (point, Dot::shaped(&grid, point)))
            .collect();
        Self { grid, dots }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dot(&self, point: GridPoint) -> Option<&Dot> {
        self.dots.get(&point)
    }

    pub fn line_owner(&self, point: GridPoint, orientation: Orientation) -> Option<PlayerId> {
        self.dot(point)?.line(orientation)?.owner()
    }

    pub fn box_owner(&self, point: GridPoint) -> Option<PlayerId> {
        self.dot(point)?.cell?.owner()
    }

    fn line_claimed(&self, point: GridPoint, orientation: Orientation) -> bool {
        self.line_owner(point, orientation).is_some()
    }

    /// True when the box rooted at `point` exists and all four edges are owned
    pub fn box_complete(&self, point: GridPoint) -> bool {
        match self.dot(point) {
            Some(dot) if dot.cell.is_some() => {
                self.line_claimed(point, Orientation::Horizontal)
                    && self.line_claimed(point, Orientation::Vertical)
                    && self.line_claimed(point.right(), Orientation::Vertical)
                    && self.line_claimed(point.down(), Orientation::Horizontal)
            }
            _ => false,
        }
    }

    /// Claims a single line without looking at the boxes around it
    pub fn claim_line(
        &mut self,
        player: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    ) -> Result<(), MoveError> {
        if !self.grid.contains(point) {
            return Err(MoveError::OutOfBounds);
        }
        let line = self
            .dots
            .get_mut(&point)
            .and_then(|dot| dot.line_mut(orientation))
            .ok_or(MoveError::OutOfBounds)?;
        if line.claim(player) {
            Ok(())
        } else {
            Err(MoveError::LineTaken)
        }
    }

    /// Claims the box rooted at `point`; false if it does not exist or is owned
    pub fn claim_box(&mut self, player: PlayerId, point: GridPoint) -> bool {
        self.dots
            .get_mut(&point)
            .and_then(|dot| dot.cell.as_mut())
            .map(|cell| cell.claim(player))
            .unwrap_or(false)
    }

    /// Claims a line and every box it closes
    ///
    /// A line is the top or left edge of the box at its own dot, and the
    /// bottom or right edge of the box at the dot above or to the left.
    /// Both are checked; the returned points are the boxes credited.
    pub fn draw_line(
        &mut self,
        player: PlayerId,
        point: GridPoint,
        orientation: Orientation,
    ) -> Result<Vec<GridPoint>, MoveError> {
        self.claim_line(player, point, orientation)?;

        let behind = match orientation {
            Orientation::Vertical => point.left(),
            Orientation::Horizontal => point.up(),
        };

        let mut closed = Vec::with_capacity(2);
        for candidate in [behind, point] {
            if self.box_complete(candidate) && self.claim_box(player, candidate) {
                closed.push(candidate);
            }
        }
        Ok(closed)
    }

    /// Clears every owner without changing the shape of the board
    pub fn reset(&mut self) {
        self.dots.values_mut().for_each(Dot::reset);
    }

    /// Adopts new dimensions, dropping dots that fell outside and adding new
    /// ones, while surviving dots keep their ownership state.
    pub fn resize(&mut self, grid: Grid) {
        self.grid.resize(grid);
        let grid = self.grid;
        self.dots.retain(|point, _| grid.contains(*point));
        for point in grid.all_points() {
            let dot = match self.dots.get(&point) {
                Some(existing) => existing.reshaped(&grid, point),
                None => Dot::shaped(&grid, point),
            };
            self.dots.insert(point, dot);
        }
    }

    /// Every owned line, column-major, right line before down line
    pub fn claimed_lines(&self) -> Vec<ClaimedLine> {
        let mut lines = Vec::new();
        for point in self.grid.all_points() {
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                if let Some(owner) = self.line_owner(point, orientation) {
                    lines.push(ClaimedLine {
                        owner,
                        orientation,
                        point,
                    });
                }
            }
        }
        lines
    }

    /// Every owned box, column-major
    pub fn claimed_boxes(&self) -> Vec<(PlayerId, GridPoint)> {
        self.grid
            .all_points()
            .filter_map(|point| self.box_owner(point).map(|owner| (owner, point)))
            .collect()
    }
}

impl fmt::Display for Board {
    /// Text picture of the board: `+` dots, `---` and `|` lines, box owners
    /// printed inside their box
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = (self.grid.width(), self.grid.height());
        for y in 0..height {
            let mut dots = String::new();
            let mut gaps = String::new();
            for x in 0..width {
                let point = GridPoint::new(x, y);
                dots.push('+');
                if x + 1 < width {
                    let claimed = self.line_owner(point, Orientation::Horizontal).is_some();
                    dots.push_str(if claimed { "---" } else { "   " });
                }
                if y + 1 < height {
                    let claimed = self.line_owner(point, Orientation::Vertical).is_some();
                    gaps.push(if claimed { '|' } else { ' ' });
                    if x + 1 < width {
                        match self.box_owner(point) {
                            Some(owner) => gaps.push_str(&format!("{:^3}", owner)),
                            None => gaps.push_str("   "),
                        }
                    }
                }
            }
            writeln!(f, "{}", dots.trim_end())?;
            if y + 1 < height {
                writeln!(f, "{}", gaps.trim_end())?;
            }
        }
        Ok(())
    }
}
