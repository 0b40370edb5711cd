//! Integer grid geometry shared by part placement and plumbing.
//!
//! Rectangles are half-open: a rect at `pos` with `size` covers the cells
//! `pos.x..pos.x + width` by `pos.y..pos.y + height`. The y axis grows
//! downward, so clockwise rotation follows screen conventions.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions and sizes
// ---------------------------------------------------------------------------

/// A cell position on the plumbing grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ORIGIN: GridPos = GridPos { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// The footprint of an element on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl GridSize {
    pub const ZERO: GridSize = GridSize {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if the footprint covers no cells.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Return the footprint after applying a rotation.
    /// Quarter turns swap width and height.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::None | Rotation::Cw180 => *self,
            Rotation::Cw90 | Rotation::Cw270 => Self {
                width: self.height,
                height: self.width,
            },
        }
    }
}

/// A sub-cell position in grid space, used for port anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortPosition {
    pub x: f32,
    pub y: f32,
}

impl PortPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by a grid position.
    pub fn translated(&self, by: GridPos) -> Self {
        Self::new(self.x + by.x as f32, self.y + by.y as f32)
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Placement rotation of a machine or junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    /// 90 degrees clockwise.
    Cw90,
    Cw180,
    /// 270 degrees clockwise (90 degrees counter-clockwise).
    Cw270,
}

impl Rotation {
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Cw180,
            Rotation::Cw270,
        ]
    }

    /// Build a rotation from a count of clockwise quarter turns.
    /// Negative counts turn counter-clockwise.
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Cw270,
        }
    }

    pub fn quarter_turns(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    pub fn rotate_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    pub fn rotate_ccw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() - 1)
    }

    /// Map a point inside an unrotated footprint of `size` into the
    /// footprint produced by this rotation.
    pub fn rotate_point(self, point: PortPosition, size: GridSize) -> PortPosition {
        let w = size.width as f32;
        let h = size.height as f32;
        match self {
            Rotation::None => point,
            Rotation::Cw90 => PortPosition::new(h - point.y, point.x),
            Rotation::Cw180 => PortPosition::new(w - point.x, h - point.y),
            Rotation::Cw270 => PortPosition::new(point.y, w - point.x),
        }
    }
}

// ---------------------------------------------------------------------------
// Rectangles
// ---------------------------------------------------------------------------

/// An axis-aligned, half-open rectangle of grid cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub pos: GridPos,
    pub size: GridSize,
}

impl GridRect {
    pub fn new(pos: GridPos, size: GridSize) -> Self {
        Self { pos, size }
    }

    /// Rectangle spanned by two corners in any order. The larger corner is
    /// exclusive.
    pub fn from_corners(a: GridPos, b: GridPos) -> Self {
        let min = GridPos::new(a.x.min(b.x), a.y.min(b.y));
        let max = GridPos::new(a.x.max(b.x), a.y.max(b.y));
        Self::new(min, GridSize::new(max.x - min.x, max.y - min.y))
    }

    /// Exclusive lower-right corner.
    pub fn end(&self) -> GridPos {
        self.pos.offset(self.size.width, self.size.height)
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// True if both rectangles share at least one cell.
    pub fn intersects(&self, other: &GridRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let a_end = self.end();
        let b_end = other.end();
        self.pos.x < b_end.x && other.pos.x < a_end.x && self.pos.y < b_end.y && other.pos.y < a_end.y
    }

    pub fn contains(&self, cell: GridPos) -> bool {
        let end = self.end();
        cell.x >= self.pos.x && cell.x < end.x && cell.y >= self.pos.y && cell.y < end.y
    }

    /// Grow the rectangle by `margin` cells on every side.
    pub fn expanded(&self, margin: i32) -> Self {
        Self::new(
            self.pos.offset(-margin, -margin),
            GridSize::new(self.size.width + 2 * margin, self.size.height + 2 * margin),
        )
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &GridRect) -> Self {
        let a_end = self.end();
        let b_end = other.end();
        let min = GridPos::new(self.pos.x.min(other.pos.x), self.pos.y.min(other.pos.y));
        let max = GridPos::new(a_end.x.max(b_end.x), a_end.y.max(b_end.y));
        Self::from_corners(min, max)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
