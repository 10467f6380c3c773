use std::fmt;
use std::ops::Add;

use crate::math::{LatticeVector, Point2};

use super::Direction;

/// A point of the integer lattice.
///
/// Points are ordered lexicographically, `x` first and `y` second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LatticePoint {
    pub x: i64,
    pub y: i64,
}

impl LatticePoint {
    /// Largest absolute coordinate a checked path may start at.
    ///
    /// A path steps one unit per move, so starting inside this range keeps
    /// every reachable point far from `i64` overflow.
    pub const LIMIT: i64 = 1 << 62;

    /// Creates a new lattice point.
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates lie within `±LIMIT`.
    #[must_use]
    pub fn is_within_limit(self) -> bool {
        let range = -Self::LIMIT..=Self::LIMIT;
        range.contains(&self.x) && range.contains(&self.y)
    }

    /// Returns the point one unit away in the given direction.
    ///
    /// Coordinates are not checked for overflow; keep points within
    /// [`Self::LIMIT`].
    #[must_use]
    pub fn step(self, dir: Direction) -> Self {
        self + dir.unit_vector()
    }

    /// Converts this point to floating-point coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_point2(self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }
}

impl Add<LatticeVector> for LatticePoint {
    type Output = Self;

    fn add(self, v: LatticeVector) -> Self {
        Self::new(self.x + v.x, self.y + v.y)
    }
}

impl From<(i64, i64)> for LatticePoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for LatticePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
