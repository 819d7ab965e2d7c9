#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resource cluster solver.
//!
//! Resource cells are grouped by single-link clustering: two cells share a
//! cluster when a chain of members connects them with every link no longer
//! than the configured squared distance. Each cluster is summarised by a
//! centroid, the passable non-resource cell that minimises the summed squared
//! distance to every member. Clusters are derived once from static map data.

use gridwise_core::{BoardSize, BoardView, Direction, Location, MAX_BOARD_SIDE};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Tuning knobs for the clustering pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterTuning {
    /// Largest squared distance that links two resource cells into one cluster.
    pub cluster_distance: u32,
}

impl Default for ClusterTuning {
    fn default() -> Self {
        Self {
            cluster_distance: 13,
        }
    }
}

/// Identifier assigned to a cluster in first-seen order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(u32);

impl ClusterId {
    /// Creates a new cluster identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Inclusive axis-aligned box expressed in board coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterBounds {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl ClusterBounds {
    /// Box covering a single cell.
    #[must_use]
    pub const fn around(location: Location) -> Self {
        Self {
            min_x: location.x(),
            min_y: location.y(),
            max_x: location.x(),
            max_y: location.y(),
        }
    }

    /// Grows the box until it covers the provided cell.
    pub fn include(&mut self, location: Location) {
        self.min_x = self.min_x.min(location.x());
        self.min_y = self.min_y.min(location.y());
        self.max_x = self.max_x.max(location.x());
        self.max_y = self.max_y.max(location.y());
    }

    /// Box grown by `margin` cells on every side and clipped to the board.
    #[must_use]
    pub fn expanded(self, margin: i32, size: BoardSize) -> Self {
        let last = size.side() as i32 - 1;
        Self {
            min_x: (self.min_x - margin).max(0),
            min_y: (self.min_y - margin).max(0),
            max_x: (self.max_x + margin).min(last),
            max_y: (self.max_y + margin).min(last),
        }
    }

    /// Reports whether the cell lies inside the box.
    #[must_use]
    pub const fn contains(&self, location: Location) -> bool {
        location.x() >= self.min_x
            && location.x() <= self.max_x
            && location.y() >= self.min_y
            && location.y() <= self.max_y
    }

    /// Smallest column and row covered by the box.
    #[must_use]
    pub const fn min(&self) -> (i32, i32) {
        (self.min_x, self.min_y)
    }

    /// Largest column and row covered by the box.
    #[must_use]
    pub const fn max(&self) -> (i32, i32) {
        (self.max_x, self.max_y)
    }
}

/// Immutable summary of a single resource cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cluster {
    /// Identifier assigned during the pass that discovered the cluster.
    pub id: ClusterId,
    /// Representative cell chosen for the cluster.
    pub centroid: Location,
    /// Box enclosing every member cell.
    pub bounds: ClusterBounds,
    /// Number of resource cells in the cluster.
    pub member_count: u32,
}

/// Running sums that evaluate the summed squared distance in constant time.
#[derive(Clone, Copy, Debug, Default)]
struct Moments {
    count: i64,
    sum_x: i64,
    sum_y: i64,
    sum_squares: i64,
}

impl Moments {
    fn add(&mut self, location: Location) {
        let x = i64::from(location.x());
        let y = i64::from(location.y());
        self.count += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_squares += x * x + y * y;
    }

    /// `Σ (x - xi)² + (y - yi)²` over every member.
    fn cost(&self, location: Location) -> i64 {
        let x = i64::from(location.x());
        let y = i64::from(location.y());
        self.count * (x * x + y * y) - 2 * (x * self.sum_x + y * self.sum_y) + self.sum_squares
    }
}

/// Flood-fill clusterer with generation-tagged claims.
///
/// Cells claimed by any cluster of the current pass are never revisited, so
/// calling [`ClusterSolver::solve_cluster`] for every cell of the board costs
/// one visit per resource cell overall.
#[derive(Debug)]
pub struct ClusterSolver {
    size: BoardSize,
    neighbourhood: Vec<Direction>,
    generation: u32,
    claimed: Vec<u32>,
    owners: Vec<ClusterId>,
    stack: Vec<Location>,
    next_id: u32,
}

impl ClusterSolver {
    /// Allocates the claim grid for a board and precomputes the link offsets.
    #[must_use]
    pub fn new(size: BoardSize, tuning: ClusterTuning) -> Self {
        let cells = size.cell_count();
        Self {
            size,
            neighbourhood: link_offsets(tuning.cluster_distance),
            generation: 1,
            claimed: vec![0; cells],
            owners: vec![ClusterId::new(0); cells],
            stack: Vec::new(),
            next_id: 0,
        }
    }

    /// Starts a fresh partition: forgets every claim and restarts identifiers.
    pub fn begin_pass(&mut self) {
        self.generation = match self.generation.checked_add(1) {
            Some(generation) => generation,
            None => {
                self.claimed.fill(0);
                1
            }
        };
        self.next_id = 0;
    }

    /// Centroid of the cluster grown from `seed`.
    ///
    /// Returns `None` when the seed carries no resource or already belongs to
    /// a cluster of the current pass.
    pub fn compute_centroid(
        &mut self,
        view: &BoardView<'_>,
        seed: Location,
        reference: Location,
    ) -> Option<Location> {
        self.solve_cluster(view, seed, reference)
            .map(|cluster| cluster.centroid)
    }

    /// Grows the cluster containing `seed` and summarises it.
    ///
    /// Ties between equally central cells go to the one closest to
    /// `reference`, then to the first in row-major order. When the scanned box
    /// holds no passable non-resource cell the seed stands in as centroid.
    pub fn solve_cluster(
        &mut self,
        view: &BoardView<'_>,
        seed: Location,
        reference: Location,
    ) -> Option<Cluster> {
        debug_assert_eq!(view.size(), self.size, "board view does not match solver");

        let seed_index = self.size.index(seed)?;
        if self.claimed[seed_index] == self.generation || !view.has_resource(seed) {
            return None;
        }

        let id = ClusterId::new(self.next_id);
        self.claimed[seed_index] = self.generation;
        self.owners[seed_index] = id;
        let mut bounds = ClusterBounds::around(seed);
        let mut moments = Moments::default();

        self.stack.clear();
        self.stack.push(seed);
        while let Some(member) = self.stack.pop() {
            moments.add(member);

            for &offset in &self.neighbourhood {
                let Some(next) = self.size.checked_add(member, offset) else {
                    continue;
                };
                let Some(index) = self.size.index(next) else {
                    continue;
                };
                if self.claimed[index] == self.generation || !view.has_resource(next) {
                    continue;
                }

                self.claimed[index] = self.generation;
                self.owners[index] = id;
                bounds.include(next);
                self.stack.push(next);
            }
        }

        self.next_id += 1;
        let centroid = self
            .pick_centroid(view, bounds, &moments, reference)
            .unwrap_or(seed);
        let member_count = u32::try_from(moments.count).unwrap_or(u32::MAX);

        trace!(id = id.get(), ?seed, ?centroid, member_count, "cluster solved");
        Some(Cluster {
            id,
            centroid,
            bounds,
            member_count,
        })
    }

    /// Cluster that claimed the cell during the current pass.
    #[must_use]
    pub fn owner(&self, location: Location) -> Option<ClusterId> {
        let index = self.size.index(location)?;
        (self.claimed[index] == self.generation).then(|| self.owners[index])
    }

    fn pick_centroid(
        &self,
        view: &BoardView<'_>,
        bounds: ClusterBounds,
        moments: &Moments,
        reference: Location,
    ) -> Option<Location> {
        let scan = bounds.expanded(1, self.size);
        let (min_x, min_y) = scan.min();
        let (max_x, max_y) = scan.max();
        let mut best: Option<(i64, u32, Location)> = None;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let cell = self.size.pack(x, y);
                if !view.is_passable(cell) || view.has_resource(cell) {
                    continue;
                }

                let cost = moments.cost(cell);
                let tie_break = if self.size.holds(reference) {
                    cell.distance_squared(reference)
                } else {
                    0
                };
                let better = match best {
                    None => true,
                    Some((best_cost, best_tie, _)) => (cost, tie_break) < (best_cost, best_tie),
                };
                if better {
                    best = Some((cost, tie_break, cell));
                }
            }
        }

        best.map(|(_, _, cell)| cell)
    }
}

/// Every cluster of a board, partitioned in a single row-major pass.
#[derive(Clone, Debug)]
pub struct ClusterMap {
    size: BoardSize,
    clusters: Vec<Cluster>,
    membership: Vec<Option<ClusterId>>,
}

impl ClusterMap {
    /// Partitions every resource cell of the board.
    #[must_use]
    pub fn build(view: &BoardView<'_>, reference: Location, tuning: ClusterTuning) -> Self {
        let mut solver = ClusterSolver::new(view.size(), tuning);
        Self::build_with(&mut solver, view, reference)
    }

    /// Partitions the board reusing an existing solver's scratch state.
    #[must_use]
    pub fn build_with(
        solver: &mut ClusterSolver,
        view: &BoardView<'_>,
        reference: Location,
    ) -> Self {
        solver.begin_pass();

        let clusters: Vec<Cluster> = view
            .locations()
            .filter_map(|seed| solver.solve_cluster(view, seed, reference))
            .collect();
        let membership = view.locations().map(|cell| solver.owner(cell)).collect();

        debug!(
            clusters = clusters.len(),
            side = view.size().side(),
            "resource clustering pass finished"
        );
        Self {
            size: view.size(),
            clusters,
            membership,
        }
    }

    /// Number of clusters found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Reports whether the board holds no resource cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster registered under the identifier.
    #[must_use]
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        let index = usize::try_from(id.get()).ok()?;
        self.clusters.get(index)
    }

    /// Identifier of the cluster containing the cell, if it carries a resource.
    #[must_use]
    pub fn cluster_of(&self, location: Location) -> Option<ClusterId> {
        let index = self.size.index(location)?;
        self.membership.get(index).copied().flatten()
    }

    /// Iterator over the clusters in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }
}

fn link_offsets(cluster_distance: u32) -> Vec<Direction> {
    let limit = MAX_BOARD_SIDE as i32 - 1;
    let mut radius = 0_i32;
    while radius < limit && ((radius + 1) * (radius + 1)) as u32 <= cluster_distance {
        radius += 1;
    }

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let offset = Direction::new(dx as i8, dy as i8);
            if !offset.is_zero() && offset.magnitude() <= cluster_distance {
                offsets.push(offset);
            }
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Layers {
        size: BoardSize,
        passable: Vec<bool>,
        primary: Vec<bool>,
        secondary: Vec<bool>,
    }

    impl Layers {
        fn open(side: u32) -> Self {
            let size = BoardSize::new(side).expect("valid side");
            let cells = size.cell_count();
            Self {
                size,
                passable: vec![true; cells],
                primary: vec![false; cells],
                secondary: vec![false; cells],
            }
        }

        fn with_primary(mut self, cells: &[(i32, i32)]) -> Self {
            for &(x, y) in cells {
                let index = self.size.index(self.size.pack(x, y)).expect("on board");
                self.primary[index] = true;
            }
            self
        }

        fn view(&self) -> BoardView<'_> {
            BoardView::new(self.size, &self.passable, &self.primary, &self.secondary)
                .expect("consistent layers")
        }
    }

    #[test]
    fn link_offsets_cover_the_default_disc() {
        let offsets = link_offsets(13);
        assert_eq!(offsets.len(), 44);
        assert!(offsets.contains(&Direction::new(3, 2)));
        assert!(!offsets.contains(&Direction::new(3, 3)));
        assert!(link_offsets(0).is_empty());
    }

    #[test]
    fn moments_match_direct_sum() {
        let size = BoardSize::new(9).expect("valid side");
        let members = [size.pack(0, 0), size.pack(3, 1), size.pack(8, 7)];
        let mut moments = Moments::default();
        members.iter().for_each(|&member| moments.add(member));

        for cell in size.locations() {
            let direct: i64 = members
                .iter()
                .map(|&member| i64::from(cell.distance_squared(member)))
                .sum();
            assert_eq!(moments.cost(cell), direct);
        }
    }

    #[test]
    fn diagonal_pair_forms_one_cluster() {
        let layers = Layers::open(5).with_primary(&[(0, 0), (1, 1)]);
        let view = layers.view();
        let size = layers.size;
        let mut solver = ClusterSolver::new(size, ClusterTuning::default());

        let cluster = solver
            .solve_cluster(&view, size.pack(0, 0), size.pack(4, 0))
            .expect("seed carries a resource");

        assert_eq!(cluster.member_count, 2);
        assert_eq!(cluster.centroid, size.pack(1, 0));
        assert_eq!(solver.owner(size.pack(1, 1)), Some(cluster.id));
        assert_eq!(solver.solve_cluster(&view, size.pack(1, 1), size.pack(4, 0)), None);
    }

    #[test]
    fn reference_breaks_centroid_ties() {
        let layers = Layers::open(5).with_primary(&[(0, 0), (1, 1)]);
        let view = layers.view();
        let size = layers.size;
        let mut solver = ClusterSolver::new(size, ClusterTuning::default());

        let centroid = solver.compute_centroid(&view, size.pack(0, 0), size.pack(0, 4));
        assert_eq!(centroid, Some(size.pack(0, 1)));
    }

    #[test]
    fn seeds_without_resources_are_ignored() {
        let layers = Layers::open(4).with_primary(&[(2, 2)]);
        let view = layers.view();
        let mut solver = ClusterSolver::new(layers.size, ClusterTuning::default());

        assert_eq!(
            solver.compute_centroid(&view, layers.size.pack(0, 0), layers.size.pack(0, 0)),
            None
        );
        assert_eq!(
            solver.compute_centroid(&view, Location::OFF_GRID, layers.size.pack(0, 0)),
            None
        );
    }

    #[test]
    fn blocked_surroundings_fall_back_to_the_seed() {
        let mut layers = Layers::open(3).with_primary(&[(1, 1)]);
        layers.passable.fill(false);
        let view = layers.view();
        let mut solver = ClusterSolver::new(layers.size, ClusterTuning::default());

        let centroid = solver.compute_centroid(&view, layers.size.pack(1, 1), layers.size.pack(0, 0));
        assert_eq!(centroid, Some(layers.size.pack(1, 1)));
    }

    #[test]
    fn begin_pass_releases_claims_and_restarts_ids() {
        let layers = Layers::open(6).with_primary(&[(0, 0), (5, 5)]);
        let view = layers.view();
        let size = layers.size;
        let mut solver = ClusterSolver::new(size, ClusterTuning::default());

        let first = solver
            .solve_cluster(&view, size.pack(5, 5), size.pack(0, 0))
            .expect("fresh seed");
        assert_eq!(first.id, ClusterId::new(0));

        solver.begin_pass();
        assert_eq!(solver.owner(size.pack(5, 5)), None);
        let again = solver
            .solve_cluster(&view, size.pack(5, 5), size.pack(0, 0))
            .expect("claims were released");
        assert_eq!(again.id, ClusterId::new(0));
        assert_eq!(again, first);
    }

    #[test]
    fn generation_wraparound_releases_claims() {
        let layers = Layers::open(5).with_primary(&[(1, 1), (4, 4)]);
        let view = layers.view();
        let size = layers.size;
        let mut solver = ClusterSolver::new(size, ClusterTuning::default());

        solver.generation = u32::MAX;
        let before = solver
            .solve_cluster(&view, size.pack(1, 1), size.pack(0, 0))
            .expect("fresh seed");
        assert_eq!(solver.owner(size.pack(1, 1)), Some(before.id));

        solver.begin_pass();

        assert_eq!(solver.generation, 1);
        assert!(solver.claimed.iter().all(|&stamp| stamp == 0));
        assert_eq!(solver.owner(size.pack(1, 1)), None);
        let after = solver
            .solve_cluster(&view, size.pack(1, 1), size.pack(0, 0))
            .expect("claims were released");
        assert_eq!(after, before);
    }

    #[test]
    fn bounds_expand_within_the_board() {
        let size = BoardSize::new(4).expect("valid side");
        let mut bounds = ClusterBounds::around(size.pack(0, 3));
        bounds.include(size.pack(1, 2));

        let scan = bounds.expanded(1, size);
        assert_eq!(scan.min(), (0, 1));
        assert_eq!(scan.max(), (2, 3));
        assert!(scan.contains(size.pack(2, 1)));
        assert!(!scan.contains(size.pack(3, 3)));
    }
}
