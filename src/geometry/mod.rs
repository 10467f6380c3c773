pub mod direction;
pub mod lattice;

pub use direction::Direction;
pub use lattice::LatticePoint;
