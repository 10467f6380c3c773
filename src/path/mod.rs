//! Direction strings: validation before checking and the text format of
//! checked paths.

mod text;
mod validate;

pub use text::{format_checked_path, format_path, parse_path, reverse_path};
pub use validate::{check_admissible_start, check_directions, check_no_u_turns, validate};
