use std::collections::BTreeMap;

use crate::error::TopologyError;
use crate::geometry::LatticePoint;

use super::{RadialList, RebalancePolicy, SegmentStore};

/// Every vertex visited by a path, in lexicographic order, with its radial
/// list.
///
/// Entries are created on first visit and never removed; undoing moves only
/// empties their lists.
#[derive(Debug, Clone, Default)]
pub struct VertexDirectory {
    vertices: BTreeMap<LatticePoint, RadialList>,
}

impl VertexDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of visited vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if no vertex was ever visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the radial list of `point`, creating an empty one on first visit.
    pub fn conditional_insert(&mut self, point: LatticePoint) -> &mut RadialList {
        self.vertices
            .entry(point)
            .or_insert_with(|| RadialList::new(point))
    }

    /// Returns the radial list of `point`, if visited.
    #[must_use]
    pub fn get(&self, point: LatticePoint) -> Option<&RadialList> {
        self.vertices.get(&point)
    }

    /// Returns the radial list of `point` mutably, if visited.
    pub fn get_mut(&mut self, point: LatticePoint) -> Option<&mut RadialList> {
        self.vertices.get_mut(&point)
    }

    /// Iterates over visited vertices in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&LatticePoint, &RadialList)> {
        self.vertices.iter()
    }

    /// Returns the total number of half-segments placed around all vertices.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.vertices.values().map(RadialList::len).sum()
    }

    /// Rebalances crowded perturbations at every vertex and returns how many
    /// direction runs were renumbered.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookkeeping is inconsistent.
    pub fn adjust_perturbations(
        &self,
        store: &mut SegmentStore,
        policy: &RebalancePolicy,
    ) -> Result<usize, TopologyError> {
        let mut adjusted = 0;
        for list in self.vertices.values() {
            adjusted += list.adjust_perturbations(store, policy)?;
        }
        Ok(adjusted)
    }

    /// Runs [`RadialList::check_order`] on every vertex.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_all(&self, store: &SegmentStore) -> Result<(), TopologyError> {
        self.vertices
            .values()
            .try_for_each(|list| list.check_order(store))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Direction;

    #[test]
    fn vertices_are_created_once() {
        let mut dir = VertexDirectory::new();
        assert!(dir.is_empty());
        dir.conditional_insert(LatticePoint::new(1, 1));
        dir.conditional_insert(LatticePoint::new(1, 1));
        assert_eq!(dir.len(), 1);
        assert!(dir.get(LatticePoint::new(0, 0)).is_none());
    }

    #[test]
    fn iteration_is_lexicographic() {
        let mut dir = VertexDirectory::new();
        for (x, y) in [(2, 0), (0, 3), (0, -1), (1, 5)] {
            dir.conditional_insert(LatticePoint::new(x, y));
        }
        let order: Vec<_> = dir.iter().map(|(p, _)| (p.x, p.y)).collect();
        assert_eq!(order, vec![(0, -1), (0, 3), (1, 5), (2, 0)]);
    }

    #[test]
    fn counts_placed_segments() {
        let mut store = SegmentStore::new();
        let mut dir = VertexDirectory::new();
        let p = LatticePoint::new(0, 0);
        let a = store.create(p, Direction::East);
        let b = store.make_anchor(a).unwrap();
        store.segment_mut(a).unwrap().perturbation = Some(0.0);
        dir.conditional_insert(p).add_first_pair(&store, a, b).unwrap();

        assert_eq!(dir.segment_count(), 2);
        dir.check_all(&store).unwrap();
        assert_eq!(
            dir.adjust_perturbations(&mut store, &RebalancePolicy::default())
                .unwrap(),
            0
        );
    }
}
