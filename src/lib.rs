pub mod checker;
pub mod error;
pub mod geometry;
pub mod math;
pub mod path;
pub mod topology;

pub use checker::{CheckedMove, CheckedPath, CheckerConfig, CheckerState, PathChecker, PerturbStyle};
pub use error::{OrthoError, Result};
pub use geometry::{Direction, LatticePoint};
