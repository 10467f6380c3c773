use crate::error::ValidationError;
use crate::geometry::{Direction, LatticePoint};

/// Decodes every character of `raw` into a direction.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCharacter`] at the first character that
/// is not a direction letter.
pub fn check_directions(raw: &str) -> Result<Vec<Direction>, ValidationError> {
    raw.chars()
        .enumerate()
        .map(|(index, character)| {
            Direction::from_char(character)
                .ok_or(ValidationError::InvalidCharacter { index, character })
        })
        .collect()
}

/// Rejects two consecutive opposite moves.
///
/// # Errors
///
/// Returns [`ValidationError::UTurn`] at the index of the second move.
pub fn check_no_u_turns(dirs: &[Direction]) -> Result<(), ValidationError> {
    match dirs.windows(2).position(|w| w[1] == w[0].opposite()) {
        Some(i) => Err(ValidationError::UTurn {
            index: i + 1,
            previous: dirs[i],
            current: dirs[i + 1],
        }),
        None => Ok(()),
    }
}

/// Rejects a path that passes through its start before the final move. A
/// closed path, ending where it began, is fine.
///
/// # Errors
///
/// Returns [`ValidationError::PrematureReturnToStart`] at the index of the
/// move that comes back.
pub fn check_admissible_start(dirs: &[Direction]) -> Result<(), ValidationError> {
    let origin = LatticePoint::default();
    let mut point = origin;
    for (index, &dir) in dirs.iter().enumerate().take(dirs.len().saturating_sub(1)) {
        point = point.step(dir);
        if point == origin {
            return Err(ValidationError::PrematureReturnToStart { index });
        }
    }
    Ok(())
}

/// Validates a raw direction string, applying the rules in order and stopping
/// at the first failure.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPath`] for an empty string, otherwise the
/// first violation of [`check_directions`], [`check_no_u_turns`] and
/// [`check_admissible_start`].
pub fn validate(raw: &str) -> Result<Vec<Direction>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    let dirs = check_directions(raw)?;
    check_no_u_turns(&dirs)?;
    check_admissible_start(&dirs)?;
    Ok(dirs)
}
