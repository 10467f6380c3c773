use std::fmt;

use crate::math::LatticeVector;

/// One of the four cardinal directions of a lattice move.
///
/// The discriminants follow counterclockwise order starting from East, so the
/// cyclic radial order around a vertex is `East < North < West < South`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Direction {
    /// All directions in counterclockwise order.
    pub const ALL: [Self; 4] = [Self::East, Self::North, Self::West, Self::South];

    /// Returns the direction with the given cyclic index.
    ///
    /// Any integer is accepted and reduced modulo 4, so `-1` maps to South and
    /// `4` maps to East.
    #[must_use]
    pub fn from_cyclic(index: i32) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let i = index.rem_euclid(4) as usize;
        Self::ALL[i]
    }

    /// Returns the index of this direction in `0..4`.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Decodes a direction letter (case-insensitive).
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(Self::East),
            'N' => Some(Self::North),
            'W' => Some(Self::West),
            'S' => Some(Self::South),
            _ => None,
        }
    }

    /// Returns the upper-case letter encoding this direction.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::East => 'E',
            Self::North => 'N',
            Self::West => 'W',
            Self::South => 'S',
        }
    }

    /// Returns the direction rotated by 180 degrees.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// Returns the unit displacement of a move in this direction.
    #[must_use]
    pub fn unit_vector(self) -> LatticeVector {
        match self {
            Self::East => LatticeVector::new(1, 0),
            Self::North => LatticeVector::new(0, 1),
            Self::West => LatticeVector::new(-1, 0),
            Self::South => LatticeVector::new(0, -1),
        }
    }

    /// Returns `true` for East and West.
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    /// Sign applied to perturbations when ordering same-direction half-segments.
    ///
    /// For East and South a larger perturbation lies later in counterclockwise
    /// order (`+1`); for North and West a smaller one does (`-1`).
    #[must_use]
    pub fn perturbation_sign(self) -> f64 {
        match self {
            Self::East | Self::South => 1.0,
            Self::North | Self::West => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_sentinels_wrap() {
        assert_eq!(Direction::from_cyclic(-1), Direction::South);
        assert_eq!(Direction::from_cyclic(4), Direction::East);
        assert_eq!(Direction::from_cyclic(2), Direction::West);
        assert_eq!(
            Direction::from_cyclic(-1).unit_vector(),
            LatticeVector::new(0, -1)
        );
    }

    #[test]
    fn opposite_is_involution() {
        for d in Direction::ALL {
            assert_ne!(d.opposite(), d);
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.unit_vector() + d.opposite().unit_vector(), LatticeVector::zeros());
        }
    }

    #[test]
    fn letters_decode_case_insensitively() {
        assert_eq!(Direction::from_char('n'), Some(Direction::North));
        assert_eq!(Direction::from_char('W'), Some(Direction::West));
        assert_eq!(Direction::from_char('x'), None);
        for d in Direction::ALL {
            assert_eq!(Direction::from_char(d.letter()), Some(d));
        }
    }

    #[test]
    fn counterclockwise_order() {
        assert!(Direction::East < Direction::North);
        assert!(Direction::North < Direction::West);
        assert!(Direction::West < Direction::South);
        assert_eq!(Direction::South.to_string(), "S");
    }
}
