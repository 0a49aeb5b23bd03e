//! Pooled-arena Barnes–Hut quadtree (spec.md §4.3).
//!
//! Nodes live in a contiguous `Vec` and are handed out by index, never by
//! pointer, so that `Reset` can recycle slots across simulation steps
//! instead of allocating a fresh tree every frame (spec.md §9,
//! "Arena-pooled nodes"). Crowded-leaf body lists are pooled the same way.
//!
//! Life cycle is strictly `Reset -> Insert* -> Evaluate -> Query*`; calling
//! an operation out of order is a programmer error and panics
//! (see `crate::error::QuadTreeError`).

use crate::{aabb::Aabb, body::BodyId, calculator::Calculator, error::QuadTreeError, vector2::Vector2};

/// Maximum subdivision depth before a leaf becomes "crowded" instead of
/// splitting further.
pub const MAX_DEPTH: u32 = 32;
const PADDING_MULT: f64 = 0.01;
const PADDING_FLAT: f64 = 1e-10;

/// The minimal per-body data the tree needs: identity (for the
/// self-interaction skip), position, and mass. Decoupled from `Body` itself
/// so the tree has no dependency on `BodyManager`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeBody {
    pub id: BodyId,
    pub position: Vector2,
    pub mass: f64,
}

#[derive(Debug, Clone, Copy)]
enum NodeContent {
    Empty,
    Single(TreeBody),
    /// Index into the crowded-list pool.
    Crowded(usize),
    /// Indices of the four children, in NW/NE/SW/SE order.
    Internal([usize; 4]),
}

#[derive(Debug, Clone, Copy)]
struct QuadTreeNode {
    bounds: Aabb,
    depth: u32,
    content: NodeContent,
    mass: f64,
    center_of_mass: Vector2,
    max_dimension_sq: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No `Reset` has happened yet (or ever, for a fresh tree).
    Idle,
    /// Between `Reset` and `Evaluate`: inserts are accepted.
    Building,
    /// `Evaluate` has run: queries are accepted, inserts are rejected.
    Evaluated,
}

/// A reusable Barnes–Hut tree. See the module docs for the state machine.
#[derive(Debug)]
pub struct QuadTree {
    nodes: Vec<QuadTreeNode>,
    free_nodes: Vec<usize>,
    crowded_pool: Vec<Vec<TreeBody>>,
    free_crowded: Vec<usize>,
    state: State,
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadTree {
    const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            crowded_pool: Vec::new(),
            free_crowded: Vec::new(),
            state: State::Idle,
        }
    }

    /// Resets the tree to a fresh, padded root covering `[min, max]`, ready
    /// to accept `expected_bodies` insertions. Panics on contract violation
    /// (inverted bounds, non-positive `expected_bodies`).
    pub fn reset(&mut self, min: Vector2, max: Vector2, expected_bodies: usize) {
        self.try_reset(min, max, expected_bodies)
            .unwrap_or_else(|e| panic!("{e}"));
    }

    fn try_reset(
        &mut self,
        min: Vector2,
        max: Vector2,
        expected_bodies: usize,
    ) -> Result<(), QuadTreeError> {
        if min.x >= max.x || min.y >= max.y {
            return Err(QuadTreeError::InvertedBounds);
        }
        if expected_bodies == 0 {
            return Err(QuadTreeError::NonPositiveExpectedBodies);
        }

        let required_capacity = 4 * expected_bodies + 16;
        if self.nodes.capacity() < required_capacity {
            self.nodes.reserve(required_capacity - self.nodes.len());
        }

        // Free all previously used node slots, LIFO so slot 0 is reused first.
        self.free_nodes.clear();
        for i in (0..self.nodes.len()).rev() {
            self.free_nodes.push(i);
        }

        self.free_crowded.clear();
        for i in (0..self.crowded_pool.len()).rev() {
            self.crowded_pool[i].clear();
            self.free_crowded.push(i);
        }

        let width = max.x - min.x;
        let height = max.y - min.y;
        let padding = width.max(height) * PADDING_MULT + PADDING_FLAT;
        let center = Vector2::new(min.x + width / 2.0, min.y + height / 2.0);
        let half_dimension = Vector2::new(width / 2.0 + padding, height / 2.0 + padding);
        let bounds = Aabb::new(center, half_dimension);

        let root_idx = self.alloc_node(bounds, 0);
        debug_assert_eq!(root_idx, Self::ROOT, "root must always land at slot 0");

        self.state = State::Building;
        Ok(())
    }

    fn alloc_node(&mut self, bounds: Aabb, depth: u32) -> usize {
        let fresh = QuadTreeNode {
            bounds,
            depth,
            content: NodeContent::Empty,
            mass: 0.0,
            center_of_mass: Vector2::ZERO,
            max_dimension_sq: 0.0,
        };
        if let Some(idx) = self.free_nodes.pop() {
            self.nodes[idx] = fresh;
            idx
        } else {
            self.nodes.push(fresh);
            self.nodes.len() - 1
        }
    }

    fn alloc_crowded(&mut self) -> usize {
        if let Some(idx) = self.free_crowded.pop() {
            idx
        } else {
            self.crowded_pool.push(Vec::new());
            self.crowded_pool.len() - 1
        }
    }

    /// Inserts a body. Panics if called outside `Reset..Evaluate`, or if the
    /// body's position is outside the root bounds.
    pub fn insert(&mut self, body: TreeBody) {
        self.try_insert(body).unwrap_or_else(|e| panic!("{e}"));
    }

    fn try_insert(&mut self, body: TreeBody) -> Result<(), QuadTreeError> {
        match self.state {
            State::Idle => return Err(QuadTreeError::NotReset),
            State::Evaluated => return Err(QuadTreeError::AlreadyEvaluated),
            State::Building => {}
        }
        if !self.nodes[Self::ROOT].bounds.contains(body.position) {
            return Err(QuadTreeError::OutsideBounds);
        }
        self.insert_into(Self::ROOT, body);
        Ok(())
    }

    fn insert_into(&mut self, node_idx: usize, body: TreeBody) {
        let content = self.nodes[node_idx].content;
        match content {
            NodeContent::Empty => {
                self.nodes[node_idx].content = NodeContent::Single(body);
            }
            NodeContent::Single(existing) => {
                if self.nodes[node_idx].depth < MAX_DEPTH {
                    self.subdivide_and_reinsert(node_idx, existing, body);
                } else {
                    self.crowd(node_idx, existing, body);
                }
            }
            NodeContent::Crowded(pool_idx) => {
                self.crowded_pool[pool_idx].push(body);
            }
            NodeContent::Internal(children) => {
                let quadrant = self.nodes[node_idx].bounds.quadrant_of(body.position);
                self.insert_into(children[quadrant], body);
            }
        }
    }

    fn subdivide_and_reinsert(&mut self, node_idx: usize, existing: TreeBody, new_body: TreeBody) {
        let bounds = self.nodes[node_idx].bounds;
        let depth = self.nodes[node_idx].depth;
        let child_bounds = bounds.subdivide();

        let mut children = [0usize; 4];
        for (i, cb) in child_bounds.into_iter().enumerate() {
            children[i] = self.alloc_node(cb, depth + 1);
        }
        self.nodes[node_idx].content = NodeContent::Internal(children);

        let existing_quadrant = bounds.quadrant_of(existing.position);
        self.insert_into(children[existing_quadrant], existing);
        let new_quadrant = bounds.quadrant_of(new_body.position);
        self.insert_into(children[new_quadrant], new_body);
    }

    fn crowd(&mut self, node_idx: usize, existing: TreeBody, new_body: TreeBody) {
        let pool_idx = self.alloc_crowded();
        self.crowded_pool[pool_idx].push(existing);
        self.crowded_pool[pool_idx].push(new_body);
        self.nodes[node_idx].content = NodeContent::Crowded(pool_idx);
    }

    /// Bottom-up mass/center-of-mass aggregation. Panics if called before
    /// `Reset`.
    pub fn evaluate(&mut self) {
        if self.state == State::Idle {
            panic!("{}", QuadTreeError::NotReset);
        }
        self.evaluate_node(Self::ROOT);
        self.state = State::Evaluated;
    }

    fn evaluate_node(&mut self, node_idx: usize) -> (f64, Vector2) {
        let bounds = self.nodes[node_idx].bounds;
        let content = self.nodes[node_idx].content;

        let (mass, center_of_mass) = match content {
            NodeContent::Empty => (0.0, Vector2::ZERO),
            NodeContent::Single(b) => (b.mass, b.position),
            NodeContent::Crowded(pool_idx) => {
                let bodies = &self.crowded_pool[pool_idx];
                let mass: f64 = bodies.iter().map(|b| b.mass).sum();
                let com = if mass != 0.0 {
                    let weighted = bodies
                        .iter()
                        .fold(Vector2::ZERO, |acc, b| acc + b.position * b.mass);
                    weighted / mass
                } else {
                    Vector2::ZERO
                };
                (mass, com)
            }
            NodeContent::Internal(children) => {
                let mut mass = 0.0;
                let mut weighted = Vector2::ZERO;
                for child in children {
                    let (child_mass, child_com) = self.evaluate_node(child);
                    mass += child_mass;
                    weighted += child_com * child_mass;
                }
                let com = if mass != 0.0 {
                    weighted / mass
                } else {
                    Vector2::ZERO
                };
                (mass, com)
            }
        };

        let max_dimension = bounds.max_dimension();
        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.center_of_mass = center_of_mass;
        node.max_dimension_sq = max_dimension * max_dimension;
        (mass, center_of_mass)
    }

    /// Barnes–Hut acceleration on `target_id` (currently at `target_position`)
    /// due to every other body in the tree. Panics if called before
    /// `Evaluate`.
    pub fn calc_acceleration(
        &self,
        target_id: BodyId,
        target_position: Vector2,
        calculator: &Calculator,
    ) -> Vector2 {
        if self.state != State::Evaluated {
            panic!("{}", QuadTreeError::NotEvaluated);
        }
        self.calc_acceleration_at(Self::ROOT, target_id, target_position, calculator)
    }

    fn calc_acceleration_at(
        &self,
        node_idx: usize,
        target_id: BodyId,
        target_position: Vector2,
        calculator: &Calculator,
    ) -> Vector2 {
        let node = &self.nodes[node_idx];
        if node.mass == 0.0 {
            return Vector2::ZERO;
        }
        if let NodeContent::Single(b) = node.content {
            if b.id == target_id {
                return Vector2::ZERO;
            }
        }

        let d_sq = calculator.distance_squared_softened(target_position, node.center_of_mass);
        let s_sq = node.max_dimension_sq;
        if s_sq / d_sq < calculator.theta_sq() {
            return calculator.acceleration(target_position, node.center_of_mass, node.mass, Some(d_sq));
        }

        match node.content {
            NodeContent::Empty => Vector2::ZERO,
            NodeContent::Single(b) => {
                calculator.acceleration(target_position, b.position, b.mass, Some(d_sq))
            }
            NodeContent::Crowded(pool_idx) => {
                let mut total = Vector2::ZERO;
                for b in &self.crowded_pool[pool_idx] {
                    if b.id != target_id {
                        total += calculator.acceleration(target_position, b.position, b.mass, None);
                    }
                }
                total
            }
            NodeContent::Internal(children) => {
                let mut total = Vector2::ZERO;
                for child in children {
                    total += self.calc_acceleration_at(child, target_id, target_position, calculator);
                }
                total
            }
        }
    }

    /// Total mass aggregated at the root. Only meaningful after `Evaluate`.
    pub fn root_mass(&self) -> f64 {
        self.nodes[Self::ROOT].mass
    }

    /// The tree's current (padded) root bounds. Only meaningful after `Reset`.
    pub fn root_bounds(&self) -> Aabb {
        self.nodes[Self::ROOT].bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: u64, x: f64, y: f64, mass: f64) -> TreeBody {
        TreeBody {
            id: BodyId(id),
            position: Vector2::new(x, y),
            mass,
        }
    }

    #[test]
    #[should_panic]
    fn reset_rejects_inverted_bounds() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0), 1);
    }

    #[test]
    #[should_panic]
    fn reset_rejects_non_positive_expected_bodies() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::ZERO, Vector2::new(1.0, 1.0), 0);
    }

    #[test]
    #[should_panic]
    fn insert_before_reset_panics() {
        let mut tree = QuadTree::new();
        tree.insert(body(0, 0.0, 0.0, 1.0));
    }

    #[test]
    #[should_panic]
    fn insert_outside_bounds_panics() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::ZERO, Vector2::new(1.0, 1.0), 1);
        tree.insert(body(0, 100.0, 100.0, 1.0));
    }

    #[test]
    #[should_panic]
    fn insert_after_evaluate_panics() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::ZERO, Vector2::new(1.0, 1.0), 1);
        tree.evaluate();
        tree.insert(body(0, 0.5, 0.5, 1.0));
    }

    #[test]
    #[should_panic]
    fn query_before_evaluate_panics() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::ZERO, Vector2::new(1.0, 1.0), 1);
        let calculator = Calculator::default();
        tree.calc_acceleration(BodyId(0), Vector2::ZERO, &calculator);
    }

    #[test]
    fn padded_root_bounds_strictly_contain_every_inserted_point() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(0.0, 0.0), Vector2::new(10.0, 10.0), 4);
        let bounds = tree.root_bounds();
        assert!(bounds.min().x < 0.0);
        assert!(bounds.min().y < 0.0);
        assert!(bounds.max().x > 10.0);
        assert!(bounds.max().y > 10.0);
        assert!(bounds.contains(Vector2::new(0.0, 0.0)));
        assert!(bounds.contains(Vector2::new(10.0, 10.0)));
        assert!(bounds.contains(Vector2::new(5.0, 5.0)));
    }

    #[test]
    fn root_mass_equals_sum_of_inserted_masses_after_evaluate() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(-1.0, -1.0), Vector2::new(1.0, 1.0), 4);
        tree.insert(body(0, 0.5, 0.5, 1.0));
        tree.insert(body(1, -0.5, 0.5, 2.0));
        tree.insert(body(2, -0.5, -0.5, 3.0));
        tree.insert(body(3, 0.5, -0.5, 4.0));
        tree.evaluate();
        assert_eq!(tree.root_mass(), 10.0);
    }

    #[test]
    fn crowded_leaf_forms_at_max_depth_for_coincident_bodies() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(-1.0, -1.0), Vector2::new(1.0, 1.0), 4);
        // Four coincident points force every leaf down to MAX_DEPTH to crowd.
        for i in 0..4 {
            tree.insert(body(i, 0.1, 0.1, 1.0));
        }
        tree.evaluate();
        assert_eq!(tree.root_mass(), 4.0);
    }

    #[test]
    fn theta_zero_reduces_to_brute_force_pairwise_sum() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(-10.0, -10.0), Vector2::new(10.0, 10.0), 3);
        let bodies = [
            body(0, 0.0, 0.0, 5.0),
            body(1, 3.0, 0.0, 2.0),
            body(2, 0.0, 4.0, 7.0),
        ];
        for b in bodies {
            tree.insert(b);
        }
        tree.evaluate();

        let calculator = Calculator::new(6.674_30e-11, 0.0, 1e-4);
        let target = bodies[0];
        let tree_acc = tree.calc_acceleration(target.id, target.position, &calculator);

        let mut brute = Vector2::ZERO;
        for other in &bodies[1..] {
            brute += calculator.acceleration(target.position, other.position, other.mass, None);
        }

        assert!((tree_acc.x - brute.x).abs() < 1e-9);
        assert!((tree_acc.y - brute.y).abs() < 1e-9);
    }

    #[test]
    fn theta_one_approximates_a_distant_cluster_as_its_center_of_mass() {
        let mut tree = QuadTree::new();
        tree.reset(Vector2::new(-1_100.0, -10.0), Vector2::new(-900.0, 10.0), 3);
        // A tight cluster far from the query point; its extent (~10) is
        // tiny next to the ~1000 separation, so theta=1 should fold it into
        // one point mass at its center of mass with <1% error.
        let cluster = [
            body(0, -1_005.0, -5.0, 3.0),
            body(1, -995.0, 5.0, 5.0),
            body(2, -1_000.0, 0.0, 2.0),
        ];
        for b in cluster {
            tree.insert(b);
        }
        tree.evaluate();

        let calculator = Calculator::new(6.674_30e-11, 1.0, 1e-4);
        let query_position = Vector2::new(0.0, 0.0);
        let query_id = BodyId(999);
        let tree_acc = tree.calc_acceleration(query_id, query_position, &calculator);

        let total_mass: f64 = cluster.iter().map(|b| b.mass).sum();
        let com_x = cluster.iter().map(|b| b.position.x * b.mass).sum::<f64>() / total_mass;
        let com_y = cluster.iter().map(|b| b.position.y * b.mass).sum::<f64>() / total_mass;
        let point_mass_acc =
            calculator.acceleration(query_position, Vector2::new(com_x, com_y), total_mass, None);

        let relative_error =
            (tree_acc.magnitude() - point_mass_acc.magnitude()).abs() / point_mass_acc.magnitude();
        assert!(relative_error < 0.01, "relative error {relative_error}");
    }
}
