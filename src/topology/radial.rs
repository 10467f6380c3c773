use std::cmp::Ordering;

use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::geometry::{Direction, LatticePoint};

use super::{HalfSegmentData, HalfSegmentId, RebalancePolicy, SegmentStore};

slotmap::new_key_type! {
    /// Position of a half-segment inside a radial list.
    pub struct RadialNodeId;
}

#[derive(Debug, Clone)]
struct RadialNode {
    segment: HalfSegmentId,
    next: RadialNodeId,
    prev: RadialNodeId,
    /// Position of the mate, once both halves of the passage are placed.
    mate_pos: Option<RadialNodeId>,
}

/// The half-segments leaving one vertex, in counterclockwise order.
///
/// The list is circular and doubly linked. Each node also knows the position
/// of its mate, so a scan can skip a whole settled passage in one step.
/// Between moves the list holds complete passages only, hence an even length.
#[derive(Debug, Clone)]
pub struct RadialList {
    vertex: LatticePoint,
    nodes: SlotMap<RadialNodeId, RadialNode>,
    first: Option<RadialNodeId>,
}

impl RadialList {
    /// Creates an empty radial list around `vertex`.
    #[must_use]
    pub fn new(vertex: LatticePoint) -> Self {
        Self {
            vertex,
            nodes: SlotMap::with_key(),
            first: None,
        }
    }

    /// Returns the vertex shared by every half-segment of the list.
    #[must_use]
    pub fn vertex(&self) -> LatticePoint {
        self.vertex
    }

    /// Returns the number of half-segments in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the list holds no half-segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the half-segment stored at `pos`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is not a position of this list.
    pub fn segment_at(&self, pos: RadialNodeId) -> Result<HalfSegmentId, TopologyError> {
        Ok(self.node(pos)?.segment)
    }

    /// Returns the half-segments in counterclockwise order, starting from
    /// the first inserted one still present.
    #[must_use]
    pub fn segments(&self) -> Vec<HalfSegmentId> {
        let mut out = Vec::with_capacity(self.len());
        let Some(first) = self.first else {
            return out;
        };
        let mut curr = first;
        loop {
            let Some(node) = self.nodes.get(curr) else {
                break;
            };
            out.push(node.segment);
            curr = node.next;
            if curr == first || out.len() == self.len() {
                break;
            }
        }
        out
    }

    fn node(&self, pos: RadialNodeId) -> Result<&RadialNode, TopologyError> {
        self.nodes
            .get(pos)
            .ok_or(TopologyError::EntityNotFound("radial node"))
    }

    fn node_mut(&mut self, pos: RadialNodeId) -> Result<&mut RadialNode, TopologyError> {
        self.nodes
            .get_mut(pos)
            .ok_or(TopologyError::EntityNotFound("radial node"))
    }

    fn add_first_node(&mut self, segment: HalfSegmentId) -> RadialNodeId {
        let pos = self.nodes.insert_with_key(|key| RadialNode {
            segment,
            next: key,
            prev: key,
            mate_pos: None,
        });
        self.first = Some(pos);
        pos
    }

    /// Inserts `segment` immediately before `curr`.
    fn add_before(
        &mut self,
        curr: RadialNodeId,
        segment: HalfSegmentId,
    ) -> Result<RadialNodeId, TopologyError> {
        let prev = self.node(curr)?.prev;
        let pos = self.nodes.insert(RadialNode {
            segment,
            next: curr,
            prev,
            mate_pos: None,
        });
        self.node_mut(prev)?.next = pos;
        self.node_mut(curr)?.prev = pos;
        Ok(pos)
    }

    fn link_mates(&mut self, a: RadialNodeId, b: RadialNodeId) -> Result<(), TopologyError> {
        self.node_mut(a)?.mate_pos = Some(b);
        self.node_mut(b)?.mate_pos = Some(a);
        Ok(())
    }

    fn expect_here(&self, data: &HalfSegmentData) -> Result<(), TopologyError> {
        if data.start == self.vertex {
            Ok(())
        } else {
            Err(TopologyError::InvalidTopology(format!(
                "half-segment {} starts at {}, not at {}",
                data.serial, data.start, self.vertex
            )))
        }
    }

    /// Seeds an empty list with the passage `a`, `b`; `b` goes right before
    /// `a` and the two become mates.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is not empty or the two half-segments
    /// are not mates at this vertex.
    pub fn add_first_pair(
        &mut self,
        store: &SegmentStore,
        a: HalfSegmentId,
        b: HalfSegmentId,
    ) -> Result<(), TopologyError> {
        if !self.is_empty() {
            return Err(TopologyError::InvalidTopology(format!(
                "first pair added to non-empty list at {}",
                self.vertex
            )));
        }
        let (da, db) = (store.segment(a)?, store.segment(b)?);
        self.expect_here(da)?;
        self.expect_here(db)?;
        if da.mate != Some(b) || db.mate != Some(a) {
            return Err(TopologyError::InvalidTopology(format!(
                "half-segments {} and {} are not mates",
                da.serial, db.serial
            )));
        }
        let pa = self.add_first_node(a);
        let pb = self.add_before(pa, b)?;
        self.link_mates(pa, pb)
    }

    /// Places an entering half-segment, whose perturbation is already known,
    /// in the unique gap of the counterclockwise order that admits it.
    ///
    /// Returns `None` if no gap does, which means the path intersects itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the list does not hold complete passages only, or
    /// if the bookkeeping is inconsistent.
    pub fn add_entering(
        &mut self,
        store: &mut SegmentStore,
        seg: HalfSegmentId,
    ) -> Result<Option<RadialNodeId>, TopologyError> {
        self.expect_here(store.segment(seg)?)?;
        let first = match self.first {
            Some(first) if self.len() % 2 == 0 => first,
            _ => {
                return Err(TopologyError::InvalidTopology(format!(
                    "entering half-segment added to a list of {} at {}",
                    self.len(),
                    self.vertex
                )))
            }
        };

        let mut curr = first;
        loop {
            let node = self.node(curr)?;
            let (prev_seg, curr_seg, next) =
                (self.segment_at(node.prev)?, node.segment, node.next);
            if store.is_between(seg, prev_seg, curr_seg, false)? {
                tracing::trace!(vertex = %self.vertex, "entering half-segment placed");
                return self.add_before(curr, seg).map(Some);
            }
            curr = next;
            if curr == first {
                tracing::debug!(vertex = %self.vertex, "no gap for entering half-segment");
                return Ok(None);
            }
        }
    }

    /// Places the exiting mate of the half-segment at `entering`, assigning
    /// its perturbation on the way.
    ///
    /// The scan walks counterclockwise from `entering`. After each rejected
    /// gap it jumps over the whole passage met there, and gives up as soon as
    /// the candidate falls in the sector spanned by such a passage, since the
    /// new passage would then cross it.
    ///
    /// Returns `None` if the path intersects itself.
    ///
    /// # Errors
    ///
    /// Returns an error if `entering` is not a position of this list or the
    /// bookkeeping is inconsistent.
    pub fn add_exiting(
        &mut self,
        store: &mut SegmentStore,
        seg: HalfSegmentId,
        entering: RadialNodeId,
    ) -> Result<Option<RadialNodeId>, TopologyError> {
        self.expect_here(store.segment(seg)?)?;
        if self.len() == 1 {
            store.update_perturb(seg, None, None)?;
            let pos = self.add_before(entering, seg)?;
            self.link_mates(entering, pos)?;
            return Ok(Some(pos));
        }

        let mut curr = entering;
        for _ in 0..self.len() {
            curr = self.node(curr)?.next;
            let node = self.node(curr)?;
            let (prev_seg, curr_seg, mate_pos) =
                (self.segment_at(node.prev)?, node.segment, node.mate_pos);

            if store.is_between(seg, prev_seg, curr_seg, true)? {
                let pos = self.add_before(curr, seg)?;
                self.link_mates(entering, pos)?;
                tracing::trace!(vertex = %self.vertex, "exiting half-segment placed");
                return Ok(Some(pos));
            }

            let curr_mate = store.segment(curr_seg)?.mate.ok_or_else(|| {
                TopologyError::InvalidTopology(format!(
                    "half-segment at {} has no mate",
                    self.vertex
                ))
            })?;
            if store.is_between(seg, curr_seg, curr_mate, false)? {
                tracing::debug!(vertex = %self.vertex, "exiting half-segment in forbidden sector");
                return Ok(None);
            }
            match mate_pos {
                Some(pos) => curr = pos,
                None => break,
            }
        }
        tracing::debug!(vertex = %self.vertex, "no gap for exiting half-segment");
        Ok(None)
    }

    fn remove_node(&mut self, pos: RadialNodeId) -> Result<(), TopologyError> {
        let node = self
            .nodes
            .remove(pos)
            .ok_or(TopologyError::EntityNotFound("radial node"))?;
        if self.nodes.is_empty() {
            self.first = None;
            return Ok(());
        }
        self.node_mut(node.prev)?.next = node.next;
        self.node_mut(node.next)?.prev = node.prev;
        if self.first == Some(pos) {
            self.first = Some(node.next);
        }
        Ok(())
    }

    /// Removes `seg` and, if placed, its mate. Returns whether `seg` was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the circular links are broken.
    pub fn search_remove(&mut self, seg: HalfSegmentId) -> Result<bool, TopologyError> {
        let Some(pos) = self
            .nodes
            .iter()
            .find_map(|(pos, node)| (node.segment == seg).then_some(pos))
        else {
            return Ok(false);
        };
        let mate_pos = self.node(pos)?.mate_pos;
        self.remove_node(pos)?;
        if let Some(mate_pos) = mate_pos {
            self.remove_node(mate_pos)?;
        }
        Ok(true)
    }

    /// Returns the maximal counterclockwise run of half-segments pointing in
    /// `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale.
    pub fn direction_run(
        &self,
        store: &SegmentStore,
        dir: Direction,
    ) -> Result<Vec<HalfSegmentId>, TopologyError> {
        let segments = self.segments();
        let dirs = segments
            .iter()
            .map(|&id| store.segment(id).map(|s| s.direction))
            .collect::<Result<Vec<_>, _>>()?;
        let n = segments.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let Some(start) = (0..n).find(|&i| dirs[i] == dir && dirs[(i + n - 1) % n] != dir) else {
            // Either absent, or every half-segment points in `dir`.
            return Ok(if dirs[0] == dir { segments } else { Vec::new() });
        };
        Ok((0..n)
            .map(|k| (start + k) % n)
            .take_while(|&i| dirs[i] == dir)
            .map(|i| segments[i])
            .collect())
    }

    /// Returns the direction runs whose perturbations have crowded closer
    /// than `policy.min_gap`, each sorted by increasing perturbation.
    ///
    /// Vertices with fewer than `policy.min_segments` half-segments, or with
    /// an unfinished passage, never need rebalancing.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a perturbation is undefined.
    pub fn crowded_runs(
        &self,
        store: &SegmentStore,
        policy: &RebalancePolicy,
    ) -> Result<Vec<Vec<HalfSegmentId>>, TopologyError> {
        if self.len() < policy.min_segments || self.len() % 2 == 1 {
            return Ok(Vec::new());
        }
        let mut crowded = Vec::new();
        for dir in Direction::ALL {
            let mut run = self
                .direction_run(store, dir)?
                .into_iter()
                .map(|id| {
                    let data = store.segment(id)?;
                    data.perturbation
                        .map(|p| (id, p))
                        .ok_or(TopologyError::UndefinedPerturbation(data.serial))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if run.len() < 2 {
                continue;
            }
            run.sort_by(|a, b| a.1.total_cmp(&b.1));
            let min_gap = run
                .windows(2)
                .map(|w| w[1].1 - w[0].1)
                .fold(f64::INFINITY, f64::min);
            if min_gap < policy.min_gap {
                crowded.push(run.into_iter().map(|(id, _)| id).collect());
            }
        }
        Ok(crowded)
    }

    /// Renumbers crowded direction runs to consecutive integers, keeping
    /// their order, and returns how many runs changed.
    ///
    /// A run is left alone when the half-segments of the same lattice edge at
    /// the neighboring vertex include one without an opposite here, as
    /// renumbering could not keep that end in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale or a perturbation is undefined.
    pub fn adjust_perturbations(
        &self,
        store: &mut SegmentStore,
        policy: &RebalancePolicy,
    ) -> Result<usize, TopologyError> {
        let mut adjusted = 0;
        for run in self.crowded_runs(store, policy)? {
            let Some(&head) = run.first() else {
                continue;
            };
            let dir = store.segment(head)?.direction;
            let neighbor = self.vertex.step(dir);
            if store.has_unpaired(neighbor, dir.opposite()) {
                tracing::warn!(
                    vertex = %self.vertex,
                    direction = %dir,
                    "rebalancing skipped: unpaired half-segment at {neighbor}"
                );
                continue;
            }
            store.renumber(&run)?;
            tracing::debug!(
                vertex = %self.vertex,
                direction = %dir,
                len = run.len(),
                "perturbations renumbered"
            );
            adjusted += 1;
        }
        Ok(adjusted)
    }

    /// Verifies the list invariants: even length, every half-segment rooted
    /// here with a defined perturbation, strict counterclockwise order, and
    /// symmetric mate positions matching the store's mate links.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_order(&self, store: &SegmentStore) -> Result<(), TopologyError> {
        let violation =
            |msg: String| TopologyError::InvalidTopology(format!("{}: {msg}", self.vertex));
        if self.len() % 2 == 1 {
            return Err(violation(format!("odd length {}", self.len())));
        }
        let segments = self.segments();
        if segments.len() != self.len() {
            return Err(violation("broken circular links".into()));
        }

        let mut keys = Vec::with_capacity(segments.len());
        for &id in &segments {
            let data = store.segment(id)?;
            self.expect_here(data)?;
            let p = data
                .perturbation
                .ok_or(TopologyError::UndefinedPerturbation(data.serial))?;
            keys.push((data.direction, p * data.direction.perturbation_sign()));
        }
        let mut descents = 0;
        for (i, a) in keys.iter().enumerate() {
            let b = &keys[(i + 1) % keys.len()];
            let by_perturbation = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
            match a.0.cmp(&b.0).then(by_perturbation) {
                Ordering::Less => {}
                Ordering::Greater => descents += 1,
                Ordering::Equal if keys.len() > 1 => {
                    return Err(violation(format!("tie at position {i}")));
                }
                Ordering::Equal => {}
            }
        }
        if keys.len() > 1 && descents != 1 {
            return Err(violation(format!("{descents} descents in cyclic order")));
        }

        for (pos, node) in &self.nodes {
            let Some(mate_pos) = node.mate_pos else {
                return Err(violation(format!("node {pos:?} has no mate position")));
            };
            let mate = self.node(mate_pos)?;
            if mate.mate_pos != Some(pos) {
                return Err(violation("asymmetric mate positions".into()));
            }
            if store.segment(node.segment)?.mate != Some(mate.segment) {
                return Err(violation("mate position disagrees with mate link".into()));
            }
        }
        Ok(())
    }

    /// Renders the list, one half-segment per line.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale.
    pub fn describe(&self, store: &SegmentStore) -> Result<String, TopologyError> {
        if self.is_empty() {
            return Ok("Empty list".to_owned());
        }
        self.segments()
            .into_iter()
            .map(|id| store.segment(id).map(|seg| format!("{seg}\n")))
            .collect()
    }
}
