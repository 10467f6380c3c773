use crate::error::{RenderError, Result};
use crate::geometry::{Direction, LatticePoint};
use crate::math::{Point2, Vector2};

use super::CheckedPath;

/// Smallest perturbation bound used by [`PerturbStyle::fit`].
const MIN_PERTURBATION_BOUND: f64 = 3.0;

/// Offsets used to draw a checked path without crossings.
///
/// Each vertex owns a virtual square of half-side `offset`; a move leaves and
/// enters vertices on the border of that square. Across the move, the edge is
/// shifted by `scale` times its perturbation.
#[derive(Debug, Clone, Copy)]
pub struct PerturbStyle {
    offset: f64,
    scale: f64,
}

impl Default for PerturbStyle {
    fn default() -> Self {
        Self {
            offset: 0.2,
            scale: 0.05,
        }
    }
}

impl PerturbStyle {
    /// Creates a new style.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is not in `(0, 0.5)` or `scale` is not
    /// positive.
    pub fn new(offset: f64, scale: f64) -> Result<Self> {
        if offset <= 0.0 || offset >= 0.5 {
            return Err(RenderError::InvalidParameters(
                "offset must lie strictly between 0 and 0.5".to_owned(),
            )
            .into());
        }
        if scale <= 0.0 {
            return Err(
                RenderError::InvalidParameters("scale must be positive".to_owned()).into(),
            );
        }
        Ok(Self { offset, scale })
    }

    /// Returns a style whose largest perturbation stays inside the vertex
    /// square.
    #[must_use]
    pub fn fit(path: &CheckedPath) -> Self {
        let offset = Self::default().offset;
        let bound = path.max_abs_perturbation().max(MIN_PERTURBATION_BOUND);
        Self {
            offset,
            scale: offset / (bound + 1.0),
        }
    }

    /// Returns the vertex square half-side.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns the perturbation scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Position where an edge in direction `dir` with perturbation `p`
    /// touches the square of `vertex`.
    fn attach(&self, vertex: LatticePoint, dir: Direction, p: f64) -> Point2 {
        let unit = dir.unit_vector();
        #[allow(clippy::cast_precision_loss)]
        let along = Vector2::new(unit.x as f64, unit.y as f64) * self.offset;
        let across = if dir.is_horizontal() {
            Vector2::new(0.0, 1.0)
        } else {
            Vector2::new(1.0, 0.0)
        };
        vertex.to_point2() + along + across * (self.scale * p)
    }
}

impl CheckedPath {
    /// Returns the perturbed drawing of this path as a polyline starting at
    /// `start`.
    ///
    /// Each move contributes two points: where it leaves the square of its
    /// first vertex and where it enters the square of the next one.
    #[must_use]
    pub fn to_polyline(&self, start: LatticePoint, style: &PerturbStyle) -> Vec<Point2> {
        let mut points = Vec::with_capacity(2 * self.len() + 1);
        points.push(start.to_point2());
        let mut from = start;
        for m in self.moves() {
            let to = from.step(m.direction);
            points.push(style.attach(from, m.direction, m.perturbation));
            points.push(style.attach(to, m.direction.opposite(), m.perturbation));
            from = to;
        }
        points
    }
}
