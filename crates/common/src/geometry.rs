//! Geometry primitives for screenshot-relative coordinates

use serde::{Deserialize, Serialize};

/// A point in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return this location moved by `(dx, dy)`, or `None` if it leaves the
    /// `i32` coordinate space
    pub fn offset(self, dx: i64, dy: i64) -> Option<Self> {
        Some(Self {
            x: shift(self.x, dx)?,
            y: shift(self.y, dy)?,
        })
    }

    /// This location expressed relative to `origin`
    pub fn relative_to(self, origin: Location) -> Option<Self> {
        self.offset(-(origin.x as i64), -(origin.y as i64))
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RectangleSize {
    pub width: u32,
    pub height: u32,
}

impl RectangleSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for RectangleSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const EMPTY: Region = Region {
        left: 0,
        top: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a region from a location and a size
    pub fn from_parts(location: Location, size: RectangleSize) -> Self {
        Self::new(location.x, location.y, size.width, size.height)
    }

    /// A region without area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn location(&self) -> Location {
        Location::new(self.left, self.top)
    }

    pub fn size(&self) -> RectangleSize {
        RectangleSize::new(self.width, self.height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// Return this region moved by `(dx, dy)`, or `None` if its origin
    /// leaves the `i32` coordinate space
    pub fn offset(self, dx: i64, dy: i64) -> Option<Self> {
        Some(Self {
            left: shift(self.left, dx)?,
            top: shift(self.top, dy)?,
            ..self
        })
    }

    /// This region expressed relative to `origin`
    pub fn relative_to(self, origin: Location) -> Option<Self> {
        self.offset(-(origin.x as i64), -(origin.y as i64))
    }

    /// Whether `point` lies inside the region (right and bottom edges excluded)
    pub fn contains(&self, point: Location) -> bool {
        let (x, y) = (point.x as i64, point.y as i64);
        x >= self.left as i64 && x < self.right() && y >= self.top as i64 && y < self.bottom()
    }

    /// Overlap of two regions, or [`Region::EMPTY`] when they do not overlap
    pub fn intersection(&self, other: &Region) -> Region {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left as i64 || bottom <= top as i64 {
            return Region::EMPTY;
        }

        Region::new(
            left,
            top,
            (right - left as i64) as u32,
            (bottom - top as i64) as u32,
        )
    }
}

fn shift(value: i32, delta: i64) -> Option<i32> {
    i32::try_from(value as i64 + delta).ok()
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}x{}", self.left, self.top, self.width, self.height)
    }
}
