use std::fmt;

use crate::error::TopologyError;
use crate::geometry::{Direction, LatticePoint};

use super::SegmentStore;

slotmap::new_key_type! {
    /// Unique identifier for a half-segment in the segment store.
    pub struct HalfSegmentId;
}

/// What a half-segment stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    /// One end of a unit edge actually traversed by the path.
    Path,
    /// The synthetic West mate of the path's first half-segment.
    ///
    /// It only anchors the radial order at the start vertex: it has no
    /// opposite and never appears in a checked path.
    Anchor,
}

/// Data associated with a half-segment: one end of a directed unit edge.
#[derive(Debug, Clone)]
pub struct HalfSegmentData {
    /// Creation sequence number, unique within a store.
    pub serial: u64,
    /// The vertex the half-segment leaves from.
    pub start: LatticePoint,
    /// Direction as seen from `start`.
    pub direction: Direction,
    /// Offset across the edge, `None` until assigned.
    ///
    /// Applies to `x` for vertical edges and to `y` for horizontal ones, and
    /// equals the opposite's perturbation once both ends exist.
    pub perturbation: Option<f64>,
    /// The other end of the same unit edge.
    pub opposite: Option<HalfSegmentId>,
    /// The other half-segment of the same passage through `start`.
    pub mate: Option<HalfSegmentId>,
    /// Whether this is a path edge end or the start anchor.
    pub role: SegmentRole,
}

impl HalfSegmentData {
    pub(crate) fn new(serial: u64, start: LatticePoint, direction: Direction) -> Self {
        Self {
            serial,
            start,
            direction,
            perturbation: None,
            opposite: None,
            mate: None,
            role: SegmentRole::Path,
        }
    }

    /// Returns the far endpoint of the unit edge.
    #[must_use]
    pub fn end(&self) -> LatticePoint {
        self.start.step(self.direction)
    }

    /// Returns `true` for the synthetic start anchor.
    #[must_use]
    pub fn is_anchor(&self) -> bool {
        self.role == SegmentRole::Anchor
    }

    /// Tests whether `self` lies before `other` in counterclockwise order.
    ///
    /// Both half-segments must share start point and direction. Returns
    /// `false` when either perturbation is undefined, and also when the two
    /// perturbations are equal, which breaks the ordering invariant.
    #[must_use]
    pub fn precedes(&self, other: &Self) -> bool {
        let (Some(mine), Some(theirs)) = (self.perturbation, other.perturbation) else {
            return false;
        };
        if mine == theirs {
            tracing::warn!(
                a = self.serial,
                b = other.serial,
                perturbation = mine,
                "equal perturbations in radial order"
            );
            return false;
        }
        (theirs - mine) * self.direction.perturbation_sign() > 0.0
    }
}

impl fmt::Display for HalfSegmentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HalfSegment {}: {} dir {}", self.serial, self.start, self.direction)?;
        match self.perturbation {
            Some(p) => write!(f, ", pert {p}"),
            None => write!(f, ", pert undefined"),
        }
    }
}

/// Returns `true` if `d` lies in the closed counterclockwise range `d1..=d2`.
fn loosely_between(d: Direction, d1: Direction, d2: Direction) -> bool {
    if d1 < d2 {
        d1 <= d && d <= d2
    } else {
        d >= d1 || d <= d2
    }
}

impl SegmentStore {
    /// Tests whether `seg` lies strictly between `seg1` and `seg2` in
    /// counterclockwise order around their common start point.
    ///
    /// Directions decide first; equal directions fall back to perturbations.
    /// With `assign`, the perturbation of `seg` is instead computed so that it
    /// fits the sector (see [`Self::update_perturb`]), and the result tells
    /// whether such a value exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a same-direction neighbor has
    /// no perturbation.
    pub fn is_between(
        &mut self,
        seg: HalfSegmentId,
        seg1: HalfSegmentId,
        seg2: HalfSegmentId,
        assign: bool,
    ) -> Result<bool, TopologyError> {
        let d = self.segment(seg)?.direction;
        let d1 = self.segment(seg1)?.direction;
        let d2 = self.segment(seg2)?.direction;

        if d1 == d2 {
            if d != d1 {
                return Ok(false);
            }
            if assign {
                return self.update_perturb(seg, Some(seg1), Some(seg2));
            }
            let (s, s1, s2) = (self.segment(seg)?, self.segment(seg1)?, self.segment(seg2)?);
            return Ok(s1.precedes(s) && s.precedes(s2));
        }

        if !loosely_between(d, d1, d2) {
            return Ok(false);
        }
        if assign {
            return self.update_perturb(seg, Some(seg1), Some(seg2));
        }
        let (s, s1, s2) = (self.segment(seg)?, self.segment(seg1)?, self.segment(seg2)?);
        if d == d1 && !s1.precedes(s) {
            return Ok(false);
        }
        if d == d2 && !s.precedes(s2) {
            return Ok(false);
        }
        Ok(true)
    }

    /// Assigns the perturbation of `seg` so it lies after `prec` and before
    /// `succ`, considering only neighbors with the same direction as `seg`.
    ///
    /// With no such neighbor the value is `0`. With one, it is offset by one
    /// unit past it. With two, it is their midpoint, and the call returns
    /// `false` (leaving `seg` untouched) unless they are already strictly in
    /// counterclockwise order.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a same-direction neighbor has
    /// no perturbation.
    pub fn update_perturb(
        &mut self,
        seg: HalfSegmentId,
        prec: Option<HalfSegmentId>,
        succ: Option<HalfSegmentId>,
    ) -> Result<bool, TopologyError> {
        let dir = self.segment(seg)?.direction;
        let prec = self.same_direction_perturbation(prec, dir)?;
        let succ = self.same_direction_perturbation(succ, dir)?;
        let sign = dir.perturbation_sign();

        let value = match (prec, succ) {
            (None, None) => 0.0,
            (None, Some(s)) => s - sign,
            (Some(p), None) => p + sign,
            (Some(p), Some(s)) => {
                if (s - p) * sign <= 0.0 {
                    return Ok(false);
                }
                0.5 * (p + s)
            }
        };
        self.segment_mut(seg)?.perturbation = Some(value);
        Ok(true)
    }

    /// Returns the perturbation of `neighbor` if it has direction `dir`.
    fn same_direction_perturbation(
        &self,
        neighbor: Option<HalfSegmentId>,
        dir: Direction,
    ) -> Result<Option<f64>, TopologyError> {
        let Some(id) = neighbor else {
            return Ok(None);
        };
        let data = self.segment(id)?;
        if data.direction != dir {
            return Ok(None);
        }
        data.perturbation
            .map(Some)
            .ok_or(TopologyError::UndefinedPerturbation(data.serial))
    }
}
