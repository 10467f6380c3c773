use crate::geometry::{Direction, LatticePoint};

/// One accepted move together with the perturbation of its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckedMove {
    pub direction: Direction,
    pub perturbation: f64,
}

impl CheckedMove {
    /// Creates a new checked move.
    #[must_use]
    pub fn new(direction: Direction, perturbation: f64) -> Self {
        Self {
            direction,
            perturbation,
        }
    }
}

/// The accepted prefix of a path, with one perturbation per move, and whether
/// the last attempted move was rejected as an intersection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedPath {
    moves: Vec<CheckedMove>,
    intersecting: bool,
}

impl CheckedPath {
    /// Creates a checked path from its moves and intersection flag.
    #[must_use]
    pub fn new(moves: Vec<CheckedMove>, intersecting: bool) -> Self {
        Self {
            moves,
            intersecting,
        }
    }

    /// Returns the accepted moves.
    #[must_use]
    pub fn moves(&self) -> &[CheckedMove] {
        &self.moves
    }

    /// Returns the number of accepted moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` if no move was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns `true` if the last attempted move intersected the path.
    #[must_use]
    pub fn has_intersection(&self) -> bool {
        self.intersecting
    }

    /// Returns the directions of the accepted moves.
    #[must_use]
    pub fn directions(&self) -> Vec<Direction> {
        self.moves.iter().map(|m| m.direction).collect()
    }

    /// Returns the perturbations of the accepted moves.
    #[must_use]
    pub fn perturbations(&self) -> Vec<f64> {
        self.moves.iter().map(|m| m.perturbation).collect()
    }

    /// Returns the largest perturbation in absolute value, or `0` when empty.
    #[must_use]
    pub fn max_abs_perturbation(&self) -> f64 {
        self.moves
            .iter()
            .map(|m| m.perturbation.abs())
            .fold(0.0, f64::max)
    }

    /// Returns the lattice point reached after all accepted moves.
    #[must_use]
    pub fn end_point(&self, start: LatticePoint) -> LatticePoint {
        self.moves.iter().fold(start, |p, m| p.step(m.direction))
    }
}
