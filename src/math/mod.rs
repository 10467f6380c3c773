/// 2D point type used for rendering geometry.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type used for rendering geometry.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Integer displacement on the lattice.
pub type LatticeVector = nalgebra::Vector2<i64>;

/// Global tolerance for floating-point comparisons of perturbations.
pub const TOLERANCE: f64 = 1e-10;
