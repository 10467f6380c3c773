mod checked_path;
mod render;

pub use checked_path::{CheckedMove, CheckedPath};
pub use render::PerturbStyle;

use crate::error::{CheckerError, Result, TopologyError, ValidationError};
use crate::geometry::{Direction, LatticePoint};
use crate::topology::{HalfSegmentId, RebalancePolicy, SegmentStore, VertexDirectory};

/// Parameters of a [`PathChecker`].
#[derive(Debug, Clone, Copy)]
pub struct CheckerConfig {
    /// Number of moves the checked path reserves room for up front.
    pub initial_capacity: usize,
    /// Policy of [`PathChecker::adjust_perturbations`].
    pub rebalance: RebalancePolicy,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 100,
            rebalance: RebalancePolicy::default(),
        }
    }
}

/// Where a [`PathChecker`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerState {
    /// No move accepted.
    Empty,
    /// At least one move accepted, the last attempt succeeded.
    Building,
    /// The last attempted move intersected the path.
    Intersected,
}

/// Checks an orthogonal path for self-intersection one move at a time,
/// assigning each move a perturbation that lets it be drawn without
/// crossings.
///
/// A rejected move is a normal outcome: it is reported by
/// [`PathChecker::continue_test`] and stays pending until
/// [`PathChecker::undo_test`] discards it.
#[derive(Debug, Default)]
pub struct PathChecker {
    config: CheckerConfig,
    store: SegmentStore,
    directory: VertexDirectory,
    start: Option<LatticePoint>,
    /// Exiting half-segment of the last accepted move.
    last: Option<HalfSegmentId>,
    moves: Vec<HalfSegmentId>,
    intersecting: bool,
}

impl PathChecker {
    /// Creates a checker with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a checker with the given configuration.
    #[must_use]
    pub fn with_config(config: CheckerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Returns the half-segment arena.
    #[must_use]
    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// Returns the visited vertices and their radial lists.
    #[must_use]
    pub fn directory(&self) -> &VertexDirectory {
        &self.directory
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CheckerState {
        match (self.last, self.intersecting) {
            (None, _) => CheckerState::Empty,
            (Some(_), false) => CheckerState::Building,
            (Some(_), true) => CheckerState::Intersected,
        }
    }

    /// Returns the number of accepted moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` if no move is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns `true` if the last attempted move intersected the path.
    #[must_use]
    pub fn has_intersection(&self) -> bool {
        self.intersecting
    }

    /// Discards every vertex and half-segment.
    pub fn reset(&mut self) {
        self.store = SegmentStore::new();
        self.directory = VertexDirectory::new();
        self.start = None;
        self.last = None;
        self.moves = Vec::with_capacity(self.config.initial_capacity);
        self.intersecting = false;
    }

    /// Starts a new path at `(x, y)` whose first move goes in `dir`.
    ///
    /// Any previous path is discarded. The first half-segment is paired with
    /// a synthetic West anchor that fixes the radial order at the start.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is West, which would collide with the
    /// anchor, or if a coordinate exceeds [`LatticePoint::LIMIT`].
    pub fn start_test(&mut self, x: i64, y: i64, dir: Direction) -> Result<()> {
        if dir == Direction::West {
            return Err(CheckerError::WestStart.into());
        }
        let start = LatticePoint::new(x, y);
        if !start.is_within_limit() {
            return Err(CheckerError::StartOutOfRange { x, y }.into());
        }
        self.reset();
        let first = self.store.create(start, dir);
        self.store.update_perturb(first, None, None)?;
        let anchor = self.store.make_anchor(first)?;
        self.directory
            .conditional_insert(start)
            .add_first_pair(&self.store, first, anchor)?;
        self.start = Some(start);
        tracing::debug!(%start, %dir, "path started");
        self.accept(first)
    }

    /// Extends the path by one move in `dir`.
    ///
    /// Returns `Ok(true)` if the move is accepted and `Ok(false)` if it would
    /// make the path intersect itself; in that case the checked path keeps
    /// its length and the checker stays [`CheckerState::Intersected`] until
    /// [`Self::undo_test`].
    ///
    /// # Errors
    ///
    /// Returns an error if no path was started, if an intersection is
    /// pending, if `dir` reverses the last move, or if the bookkeeping is
    /// inconsistent.
    pub fn continue_test(&mut self, dir: Direction) -> Result<bool> {
        let last = self.last.ok_or(CheckerError::NotStarted)?;
        if self.intersecting {
            return Err(CheckerError::PendingIntersection.into());
        }
        let previous = self.store.segment(last)?.direction;
        if dir == previous.opposite() {
            return Err(ValidationError::UTurn {
                index: self.moves.len(),
                previous,
                current: dir,
            }
            .into());
        }
        let entering = self.store.make_opposite(last)?;
        let exiting = self.store.make_mate(entering, dir)?;
        let point = self.store.segment(entering)?.start;
        let list = self.directory.conditional_insert(point);

        if list.is_empty() {
            // First visit: the entering end keeps the perturbation of its edge.
            self.store.update_perturb(exiting, None, None)?;
            list.add_first_pair(&self.store, entering, exiting)?;
            tracing::trace!(%point, %dir, "first visit");
            self.accept(exiting)?;
            return Ok(true);
        }

        let Some(entering_pos) = list.add_entering(&mut self.store, entering)? else {
            tracing::debug!(%point, "intersection at entering half-segment");
            self.intersecting = true;
            return Ok(false);
        };
        if list
            .add_exiting(&mut self.store, exiting, entering_pos)?
            .is_none()
        {
            tracing::debug!(%point, %dir, "intersection at exiting half-segment");
            self.intersecting = true;
            return Ok(false);
        }
        self.accept(exiting)?;
        Ok(true)
    }

    /// Records `seg` as the exiting half-segment of the last accepted move.
    fn accept(&mut self, seg: HalfSegmentId) -> Result<()> {
        let data = self.store.segment(seg)?;
        if data.perturbation.is_none() {
            return Err(TopologyError::UndefinedPerturbation(data.serial).into());
        }
        let mate = data.mate.ok_or_else(|| {
            TopologyError::InvalidTopology(format!("half-segment {} has no mate", data.serial))
        })?;
        let mate = self.store.segment(mate)?;
        if mate.perturbation.is_none() {
            return Err(TopologyError::UndefinedPerturbation(mate.serial).into());
        }
        self.last = Some(seg);
        self.moves.push(seg);
        Ok(())
    }

    /// Undoes the last step.
    ///
    /// After an intersection, only the rejected move is discarded. Otherwise
    /// the last accepted move is removed and the path walks back one vertex.
    /// Returns `false` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookkeeping is inconsistent.
    pub fn undo_test(&mut self) -> Result<bool> {
        let Some(last) = self.last else {
            return Ok(false);
        };

        if self.intersecting {
            let entering = self.store.segment(last)?.opposite.ok_or_else(|| {
                TopologyError::InvalidTopology("rejected move has no entering half-segment".into())
            })?;
            let data = self.store.segment(entering)?;
            let (point, exiting) = (data.start, data.mate);
            if let Some(list) = self.directory.get_mut(point) {
                list.search_remove(entering)?;
            }
            if let Some(exiting) = exiting {
                self.store.remove(exiting)?;
            }
            self.store.remove(entering)?;
            self.intersecting = false;
            tracing::debug!(%point, "rejected move discarded");
            return Ok(true);
        }

        let data = self.store.segment(last)?;
        let point = data.start;
        let mate = data.mate.ok_or_else(|| {
            TopologyError::InvalidTopology(format!("half-segment {} has no mate", data.serial))
        })?;
        let removed = self
            .directory
            .get_mut(point)
            .map(|list| list.search_remove(last))
            .transpose()?
            .unwrap_or(false);
        if !removed {
            return Err(TopologyError::InvalidTopology(format!(
                "last half-segment missing from the list at {point}"
            ))
            .into());
        }
        let previous = self.store.segment(mate)?.opposite;
        self.store.remove(last)?;
        self.store.remove(mate)?;
        self.moves.pop();
        self.last = previous;
        tracing::debug!(%point, remaining = self.moves.len(), "move undone");
        Ok(true)
    }

    /// Returns the accepted moves with their perturbations.
    ///
    /// # Errors
    ///
    /// Returns an error if an accepted half-segment is missing or has no
    /// perturbation.
    pub fn checked_path(&self) -> Result<CheckedPath> {
        let moves = self
            .moves
            .iter()
            .map(|&id| {
                let data = self.store.segment(id)?;
                let p = data
                    .perturbation
                    .ok_or(TopologyError::UndefinedPerturbation(data.serial))?;
                Ok(CheckedMove::new(data.direction, p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CheckedPath::new(moves, self.intersecting))
    }

    /// Returns the start point of the path, if one was started.
    #[must_use]
    pub fn start_point(&self) -> Option<LatticePoint> {
        self.start
    }

    /// Returns the point reached by the last accepted move, or the start
    /// point when no move is accepted.
    #[must_use]
    pub fn last_point(&self) -> Option<LatticePoint> {
        self.last
            .and_then(|id| self.store.segment(id).ok())
            .map(|data| data.end())
            .or(self.start)
    }

    /// Renumbers crowded perturbations according to the configured policy and
    /// returns how many direction runs changed. Safe to call between moves.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookkeeping is inconsistent.
    pub fn adjust_perturbations(&mut self) -> Result<usize> {
        Ok(self
            .directory
            .adjust_perturbations(&mut self.store, &self.config.rebalance)?)
    }

    /// Verifies the ordering invariants of every radial list.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_consistency(&self) -> Result<()> {
        Ok(self.directory.check_all(&self.store)?)
    }

    /// Checks a whole path from `(x, y)`, stopping at the first intersection.
    ///
    /// # Errors
    ///
    /// Returns an error if `dirs` is empty or starts West, or if the
    /// bookkeeping is inconsistent.
    pub fn test(&mut self, x: i64, y: i64, dirs: &[Direction]) -> Result<CheckedPath> {
        let (&first, rest) = dirs.split_first().ok_or(ValidationError::EmptyPath)?;
        self.start_test(x, y, first)?;
        for &dir in rest {
            if !self.continue_test(dir)? {
                break;
            }
        }
        if self.intersecting {
            tracing::info!(accepted = self.moves.len(), "path intersects itself");
        } else {
            tracing::info!(accepted = self.moves.len(), "path is free of crossings");
        }
        self.checked_path()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use approx::assert_relative_eq;

    fn walk(checker: &mut PathChecker, moves: &str) -> Vec<bool> {
        let dirs: Vec<_> = moves.chars().filter_map(Direction::from_char).collect();
        let (&first, rest) = dirs.split_first().unwrap();
        checker.start_test(0, 0, first).unwrap();
        rest.iter()
            .map(|&d| checker.continue_test(d).unwrap())
            .collect()
    }

    #[test]
    fn starts_empty() {
        let mut checker = PathChecker::new();
        assert_eq!(checker.state(), CheckerState::Empty);
        assert!(checker.last_point().is_none());
        assert!(!checker.undo_test().unwrap());
        assert!(matches!(
            checker.continue_test(Direction::North),
            Err(crate::OrthoError::Checker(CheckerError::NotStarted))
        ));
    }

    #[test]
    fn start_places_first_pair() {
        let mut checker = PathChecker::new();
        checker.start_test(2, 3, Direction::North).unwrap();
        assert_eq!(checker.state(), CheckerState::Building);
        assert_eq!(checker.len(), 1);
        assert_eq!(checker.last_point(), Some(LatticePoint::new(2, 4)));
        let list = checker.directory().get(LatticePoint::new(2, 3)).unwrap();
        assert_eq!(list.len(), 2);
        checker.check_consistency().unwrap();
    }

    #[test]
    fn west_start_is_rejected() {
        let mut checker = PathChecker::new();
        assert!(checker.start_test(0, 0, Direction::West).is_err());
        assert_eq!(checker.state(), CheckerState::Empty);
    }

    #[test]
    fn start_far_out_is_rejected() {
        let mut checker = PathChecker::new();
        assert!(matches!(
            checker.start_test(i64::MAX, 0, Direction::East),
            Err(crate::OrthoError::Checker(CheckerError::StartOutOfRange { .. }))
        ));
        assert!(checker.last_point().is_none());

        let lim = LatticePoint::LIMIT;
        checker.start_test(lim, -lim, Direction::East).unwrap();
        assert_eq!(checker.last_point(), Some(LatticePoint::new(lim + 1, -lim)));
    }

    #[test]
    fn u_turn_leaves_checker_untouched() {
        let mut checker = PathChecker::new();
        walk(&mut checker, "EN");
        let segments = checker.store().len();
        assert!(matches!(
            checker.continue_test(Direction::South),
            Err(crate::OrthoError::Validation(ValidationError::UTurn { index: 2, .. }))
        ));
        assert_eq!(checker.store().len(), segments);
        assert!(checker.continue_test(Direction::West).unwrap());
    }

    #[test]
    fn unit_square_closes() {
        let mut checker = PathChecker::new();
        assert_eq!(walk(&mut checker, "ENWS"), vec![true, true, true]);
        assert!(!checker.has_intersection());
        assert_eq!(checker.last_point(), Some(LatticePoint::new(0, 0)));
        checker.check_consistency().unwrap();
    }

    #[test]
    fn crossing_is_detected_and_undone() {
        // Straight through (1,0) eastward, later straight through it southward.
        let mut checker = PathChecker::new();
        assert_eq!(walk(&mut checker, "EENWSS"), vec![true, true, true, true, false]);
        assert_eq!(checker.state(), CheckerState::Intersected);
        assert_eq!(checker.len(), 5);
        assert!(checker.checked_path().unwrap().has_intersection());
        assert!(matches!(
            checker.continue_test(Direction::West),
            Err(crate::OrthoError::Checker(CheckerError::PendingIntersection))
        ));

        assert!(checker.undo_test().unwrap());
        assert_eq!(checker.state(), CheckerState::Building);
        assert_eq!(checker.len(), 5);
        assert_eq!(checker.last_point(), Some(LatticePoint::new(1, 0)));
        checker.check_consistency().unwrap();

        // Turning back west instead only touches the earlier passage.
        assert!(checker.continue_test(Direction::West).unwrap());
        checker.check_consistency().unwrap();
    }

    #[test]
    fn overlapping_retrace_is_accepted() {
        // Around the unit square and along its first edge again.
        let mut checker = PathChecker::new();
        assert_eq!(walk(&mut checker, "ENWSE"), vec![true; 4]);
        let path = checker.checked_path().unwrap();
        assert_eq!(path.len(), 5);
        assert_relative_eq!(path.moves()[0].perturbation, 0.0);
        assert_relative_eq!(path.moves()[4].perturbation, 1.0);
        checker.check_consistency().unwrap();
    }

    #[test]
    fn undo_walks_back_to_empty() {
        let mut checker = PathChecker::new();
        walk(&mut checker, "ENNW");
        let segments = checker.store().len();
        assert_eq!(segments, 8);

        assert!(checker.undo_test().unwrap());
        assert_eq!(checker.len(), 3);
        assert_eq!(checker.last_point(), Some(LatticePoint::new(1, 2)));
        while checker.undo_test().unwrap() {}
        assert_eq!(checker.state(), CheckerState::Empty);
        assert!(checker.store().is_empty());
        assert_eq!(checker.directory().segment_count(), 0);
        assert_eq!(checker.last_point(), Some(LatticePoint::new(0, 0)));
    }

    #[test]
    fn test_runs_whole_path() {
        let dirs = parse_path("E E N W S S E").unwrap();
        let mut checker = PathChecker::new();
        let path = checker.test(0, 0, &dirs).unwrap();
        assert!(path.has_intersection());
        assert_eq!(path.len(), 5);
        assert!(checker.test(0, 0, &[]).is_err());
    }

    /// Three passages through (0,2) whose East ends end up at 0, 0.5 and 1.
    const CROWDING_WALK: &str = "NNESENWWNWSEE";

    #[test]
    fn crowded_walk_is_renumbered() {
        let mut checker = PathChecker::new();
        assert_eq!(walk(&mut checker, CROWDING_WALK), vec![true; 12]);
        let before = checker.checked_path().unwrap();
        assert_relative_eq!(before.moves()[2].perturbation, 0.0);
        assert_relative_eq!(before.moves()[7].perturbation, 1.0);
        assert_relative_eq!(before.moves()[12].perturbation, 0.5);

        assert_eq!(checker.adjust_perturbations().unwrap(), 1);
        checker.check_consistency().unwrap();
        let after = checker.checked_path().unwrap();
        assert_relative_eq!(after.moves()[2].perturbation, -1.0);
        assert_relative_eq!(after.moves()[7].perturbation, 1.0);
        assert_relative_eq!(after.moves()[12].perturbation, 0.0);
        assert_eq!(after.directions(), before.directions());

        assert_eq!(checker.adjust_perturbations().unwrap(), 0);
        assert_eq!(checker.checked_path().unwrap(), after);
    }

    /// Walks `moves` twice, rebalancing one checker before every move, and
    /// checks both accept and reject the same moves. Rejected moves are
    /// undone; moves that would reverse the last accepted one are skipped.
    /// Returns how many runs were renumbered.
    fn walk_rebalanced(config: CheckerConfig, moves: &str) -> usize {
        let dirs: Vec<_> = moves.chars().filter_map(Direction::from_char).collect();
        let mut plain = PathChecker::new();
        let mut balanced = PathChecker::with_config(config);
        plain.start_test(0, 0, dirs[0]).unwrap();
        balanced.start_test(0, 0, dirs[0]).unwrap();

        let mut adjusted = 0;
        for &dir in &dirs[1..] {
            adjusted += balanced.adjust_perturbations().unwrap();
            balanced.check_consistency().unwrap();
            let last = plain.checked_path().unwrap().directions().pop().unwrap();
            if dir == last.opposite() {
                continue;
            }
            let accepted = plain.continue_test(dir).unwrap();
            assert_eq!(balanced.continue_test(dir).unwrap(), accepted, "move {dir}");
            if !accepted {
                assert!(plain.undo_test().unwrap());
                assert!(balanced.undo_test().unwrap());
            }
        }
        adjusted += balanced.adjust_perturbations().unwrap();
        balanced.check_consistency().unwrap();
        assert_eq!(balanced.len(), plain.len());
        adjusted
    }

    #[test]
    fn rebalancing_between_moves_keeps_outcomes() {
        let moves = format!("{CROWDING_WALK}NESSWWNNEESWN");
        assert!(walk_rebalanced(CheckerConfig::default(), &moves) > 0);
    }

    #[test]
    fn eager_rebalancing_keeps_outcomes() {
        // Every pair of same-direction ends counts as crowded, so runs next to
        // the start anchor and the dangling last exit get renumbered or skipped
        // on almost every move.
        let config = CheckerConfig {
            rebalance: RebalancePolicy {
                min_segments: 2,
                min_gap: 1.5,
            },
            ..CheckerConfig::default()
        };
        assert!(walk_rebalanced(config, "ENWSENWSENWSE") > 0);
        assert!(walk_rebalanced(config, CROWDING_WALK) > 0);
    }
}
