use crate::checker::CheckedPath;
use crate::error::ValidationError;
use crate::geometry::Direction;
use crate::math::TOLERANCE;

use super::validate;

/// Parses a direction string whose letters may be separated by whitespace.
///
/// # Errors
///
/// Returns the first validation failure of the letters, with indices counted
/// after whitespace removal.
pub fn parse_path(text: &str) -> Result<Vec<Direction>, ValidationError> {
    let letters: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    validate(&letters)
}

/// Formats directions as letters, optionally separated by single spaces.
#[must_use]
pub fn format_path(dirs: &[Direction], separated: bool) -> String {
    let letters = dirs.iter().map(|d| d.letter().to_string());
    if separated {
        letters.collect::<Vec<_>>().join(" ")
    } else {
        letters.collect()
    }
}

/// Returns the same route walked backwards: reversed order, each direction
/// flipped.
#[must_use]
pub fn reverse_path(dirs: &[Direction]) -> Vec<Direction> {
    dirs.iter().rev().map(|d| d.opposite()).collect()
}

fn format_perturbation(p: f64) -> String {
    let rounded = p.round();
    if (p - rounded).abs() < TOLERANCE {
        #[allow(clippy::cast_possible_truncation)]
        let whole = rounded as i64;
        whole.to_string()
    } else {
        p.to_string()
    }
}

/// Formats a checked path as space-separated direction/perturbation pairs,
/// e.g. `E 0 N 0.5`. The reversed form walks the path backwards; each edge
/// keeps its perturbation.
#[must_use]
pub fn format_checked_path(path: &CheckedPath, reversed: bool) -> String {
    let pair = |dir: Direction, p: f64| format!("{dir} {}", format_perturbation(p));
    let pairs: Vec<String> = if reversed {
        path.moves()
            .iter()
            .rev()
            .map(|m| pair(m.direction.opposite(), m.perturbation))
            .collect()
    } else {
        path.moves()
            .iter()
            .map(|m| pair(m.direction, m.perturbation))
            .collect()
    };
    pairs.join(" ")
}
