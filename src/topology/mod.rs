pub mod directory;
pub mod half_segment;
pub mod radial;

pub use directory::VertexDirectory;
pub use half_segment::{HalfSegmentData, HalfSegmentId, SegmentRole};
pub use radial::{RadialList, RadialNodeId};

use crate::error::TopologyError;
use crate::geometry::{Direction, LatticePoint};
use slotmap::SlotMap;

/// Parameters of the perturbation rebalancing pass.
#[derive(Debug, Clone, Copy)]
pub struct RebalancePolicy {
    /// Vertices with fewer half-segments are never rebalanced.
    pub min_segments: usize,
    /// A direction run is renumbered when two consecutive perturbations are
    /// closer than this.
    pub min_gap: f64,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            min_segments: 5,
            min_gap: 1.0,
        }
    }
}

/// Central arena that owns all half-segments of a path.
///
/// Half-segments reference each other via typed IDs (generational indices),
/// so the cyclic `opposite` and `mate` relations need no shared ownership.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: SlotMap<HalfSegmentId, HalfSegmentData>,
    next_serial: u64,
}

impl SegmentStore {
    /// Creates a new, empty segment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live half-segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the store holds no half-segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a reference to the half-segment data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn segment(&self, id: HalfSegmentId) -> Result<&HalfSegmentData, TopologyError> {
        self.segments
            .get(id)
            .ok_or(TopologyError::EntityNotFound("half-segment"))
    }

    /// Returns a mutable reference to the half-segment data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn segment_mut(
        &mut self,
        id: HalfSegmentId,
    ) -> Result<&mut HalfSegmentData, TopologyError> {
        self.segments
            .get_mut(id)
            .ok_or(TopologyError::EntityNotFound("half-segment"))
    }

    /// Iterates over all live half-segments.
    pub fn iter(&self) -> impl Iterator<Item = (HalfSegmentId, &HalfSegmentData)> {
        self.segments.iter()
    }

    /// Creates an unlinked half-segment with undefined perturbation.
    pub fn create(&mut self, start: LatticePoint, direction: Direction) -> HalfSegmentId {
        self.next_serial += 1;
        self.segments
            .insert(HalfSegmentData::new(self.next_serial, start, direction))
    }

    /// Creates the other end of the unit edge of `id`, at its far endpoint,
    /// pointing back. Both `opposite` links are set and the perturbation is
    /// copied, since it belongs to the edge.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale.
    pub fn make_opposite(&mut self, id: HalfSegmentId) -> Result<HalfSegmentId, TopologyError> {
        let seg = self.segment(id)?;
        let (end, direction, perturbation) =
            (seg.end(), seg.direction.opposite(), seg.perturbation);
        let opposite = self.create(end, direction);
        let data = self.segment_mut(opposite)?;
        data.opposite = Some(id);
        data.perturbation = perturbation;
        self.segment_mut(id)?.opposite = Some(opposite);
        Ok(opposite)
    }

    /// Creates the mate of `id`: a half-segment at the same vertex with
    /// direction `direction` and undefined perturbation.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or already points in `direction`.
    pub fn make_mate(
        &mut self,
        id: HalfSegmentId,
        direction: Direction,
    ) -> Result<HalfSegmentId, TopologyError> {
        let seg = self.segment(id)?;
        if seg.direction == direction {
            return Err(TopologyError::InvalidTopology(format!(
                "mate of half-segment {} cannot share its direction {direction}",
                seg.serial
            )));
        }
        let start = seg.start;
        let mate = self.create(start, direction);
        self.segment_mut(mate)?.mate = Some(id);
        self.segment_mut(id)?.mate = Some(mate);
        Ok(mate)
    }

    /// Creates the synthetic West mate anchoring the first vertex of a path,
    /// with perturbation `0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or itself points West.
    pub fn make_anchor(&mut self, id: HalfSegmentId) -> Result<HalfSegmentId, TopologyError> {
        let anchor = self.make_mate(id, Direction::West)?;
        let data = self.segment_mut(anchor)?;
        data.role = SegmentRole::Anchor;
        data.perturbation = Some(0.0);
        Ok(anchor)
    }

    /// Removes a half-segment and clears the links other half-segments hold
    /// to it.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale.
    pub fn remove(&mut self, id: HalfSegmentId) -> Result<HalfSegmentData, TopologyError> {
        let data = self
            .segments
            .remove(id)
            .ok_or(TopologyError::EntityNotFound("half-segment"))?;
        if let Some(other) = data.opposite.and_then(|o| self.segments.get_mut(o)) {
            other.opposite = None;
        }
        if let Some(other) = data.mate.and_then(|m| self.segments.get_mut(m)) {
            other.mate = None;
        }
        Ok(data)
    }

    /// Returns `true` if some half-segment at `point` with `direction` has no
    /// opposite, either because it is the start anchor or because the path
    /// has not continued past it yet.
    #[must_use]
    pub fn has_unpaired(&self, point: LatticePoint, direction: Direction) -> bool {
        self.segments
            .values()
            .any(|s| s.start == point && s.direction == direction && s.opposite.is_none())
    }

    /// Sets the perturbations of `run` (sorted by increasing perturbation) to
    /// consecutive integers, the middle element getting `0`. Opposites are
    /// updated with the same values.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale.
    pub fn renumber(&mut self, run: &[HalfSegmentId]) -> Result<(), TopologyError> {
        let middle = run.len() / 2;
        for (i, &id) in run.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let value = i as f64 - middle as f64;
            let seg = self.segment_mut(id)?;
            seg.perturbation = Some(value);
            let opposite = seg.opposite;
            if let Some(opposite) = opposite {
                self.segment_mut(opposite)?.perturbation = Some(value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn opposite_links_both_ways() {
        let mut store = SegmentStore::new();
        let a = store.create(LatticePoint::new(0, 0), Direction::North);
        store.segment_mut(a).unwrap().perturbation = Some(1.5);
        let b = store.make_opposite(a).unwrap();

        let data = store.segment(b).unwrap();
        assert_eq!(data.start, LatticePoint::new(0, 1));
        assert_eq!(data.direction, Direction::South);
        assert_eq!(data.opposite, Some(a));
        assert_eq!(data.perturbation, Some(1.5));
        assert_eq!(store.segment(a).unwrap().opposite, Some(b));
    }

    #[test]
    fn mate_shares_start() {
        let mut store = SegmentStore::new();
        let a = store.create(LatticePoint::new(3, 4), Direction::West);
        let m = store.make_mate(a, Direction::South).unwrap();

        let data = store.segment(m).unwrap();
        assert_eq!(data.start, LatticePoint::new(3, 4));
        assert_eq!(data.mate, Some(a));
        assert!(data.perturbation.is_none());
        assert_eq!(store.segment(a).unwrap().mate, Some(m));
        assert!(store.make_mate(a, Direction::West).is_err());
    }

    #[test]
    fn anchor_points_west() {
        let mut store = SegmentStore::new();
        let a = store.create(LatticePoint::new(0, 0), Direction::East);
        let anchor = store.make_anchor(a).unwrap();
        let data = store.segment(anchor).unwrap();
        assert!(data.is_anchor());
        assert_eq!(data.direction, Direction::West);
        assert_eq!(data.perturbation, Some(0.0));
        assert!(data.opposite.is_none());
    }

    #[test]
    fn serials_increase() {
        let mut store = SegmentStore::new();
        let a = store.create(LatticePoint::new(0, 0), Direction::East);
        let b = store.make_opposite(a).unwrap();
        assert!(store.segment(a).unwrap().serial < store.segment(b).unwrap().serial);
    }

    #[test]
    fn remove_clears_back_links() {
        let mut store = SegmentStore::new();
        let a = store.create(LatticePoint::new(0, 0), Direction::East);
        let b = store.make_opposite(a).unwrap();
        let c = store.make_mate(b, Direction::North).unwrap();

        store.remove(b).unwrap();
        assert!(store.segment(b).is_err());
        assert!(store.segment(a).unwrap().opposite.is_none());
        assert!(store.segment(c).unwrap().mate.is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn renumber_centers_on_middle() {
        let mut store = SegmentStore::new();
        let run: Vec<_> = (0..4)
            .map(|i| {
                let id = store.create(LatticePoint::new(0, 0), Direction::East);
                store.segment_mut(id).unwrap().perturbation = Some(0.1 * f64::from(i));
                id
            })
            .collect();
        let opposite = store.make_opposite(run[0]).unwrap();

        store.renumber(&run).unwrap();
        let values: Vec<_> = run
            .iter()
            .map(|&id| store.segment(id).unwrap().perturbation.unwrap())
            .collect();
        assert_eq!(values, vec![-2.0, -1.0, 0.0, 1.0]);
        assert_eq!(store.segment(opposite).unwrap().perturbation, Some(-2.0));
    }
}
