use thiserror::Error;

use crate::geometry::Direction;

/// Top-level error type for the orthogonal path checker.
#[derive(Debug, Error)]
pub enum OrthoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Reasons a raw direction string is rejected before it reaches the checker.
///
/// Every variant except [`ValidationError::EmptyPath`] carries the index of
/// the offending move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty path")]
    EmptyPath,

    #[error("character {character:?} at index {index} is not a valid direction")]
    InvalidCharacter { index: usize, character: char },

    #[error("U-turn {previous}{current} at index {index} not allowed")]
    UTurn {
        index: usize,
        previous: Direction,
        current: Direction,
    },

    #[error("after move {index} the path returns to its start")]
    PrematureReturnToStart { index: usize },
}

impl ValidationError {
    /// Returns the index of the violating move, if the error has one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::EmptyPath => None,
            Self::InvalidCharacter { index, .. }
            | Self::UTurn { index, .. }
            | Self::PrematureReturnToStart { index } => Some(*index),
        }
    }
}

/// Internal consistency failures of the half-segment bookkeeping.
///
/// These indicate a bug in perturbation or link maintenance, never bad input.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("half-segment {0} has an undefined perturbation")]
    UndefinedPerturbation(u64),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Misuse of the path checker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckerError {
    #[error("no path has been started")]
    NotStarted,

    #[error("the last move intersected the path; undo it before continuing")]
    PendingIntersection,

    #[error("a path cannot start with a West move")]
    WestStart,

    #[error("start point ({x},{y}) lies outside the supported coordinate range")]
    StartOutOfRange { x: i64, y: i64 },
}

/// Errors related to drawing geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("invalid render parameters: {0}")]
    InvalidParameters(String),
}

/// Convenience type alias for results using [`OrthoError`].
pub type Result<T> = std::result::Result<T, OrthoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_index_is_reported() {
        let err = ValidationError::UTurn {
            index: 1,
            previous: Direction::East,
            current: Direction::West,
        };
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.to_string(), "U-turn EW at index 1 not allowed");
        assert_eq!(ValidationError::EmptyPath.index(), None);
    }

    #[test]
    fn layers_convert_into_top_level() {
        let err: OrthoError = CheckerError::NotStarted.into();
        assert!(matches!(err, OrthoError::Checker(CheckerError::NotStarted)));
        assert_eq!(err.to_string(), "no path has been started");
    }
}
