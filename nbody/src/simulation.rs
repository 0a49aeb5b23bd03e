//! Owns the Timer, BodyManager, QuadTree, and Calculator, and drives the
//! KDK Velocity-Verlet step that ties them together (spec.md §4.5).

use log::trace;

use crate::body_manager::BodyManager;
use crate::calculator::Calculator;
use crate::quadtree::{QuadTree, TreeBody};
use crate::timer::Timer;
use crate::vector2::Vector2;

/// Minimum half-extent applied to the post-drift bounding box on either axis
/// before handing it to `QuadTree::reset`, which rejects `min >= max`
/// (quadtree.rs). A single enabled body, or several collinear/coincident
/// ones, collapses the raw bounding box to zero width and/or height; this
/// keeps the tree's root rectangle strictly non-degenerate on both axes
/// without perturbing any body's actual position.
const MIN_BOUNDS_HALF_EXTENT: f64 = 1e-6;

/// The full mutable simulation state. `Simulation::step` is the only place
/// a step's two body loops (kick-drift, then force-and-kick) are sequenced
/// against a single tree build, per spec.md §4.5's ordering guarantees.
#[derive(Default)]
pub struct Simulation {
    pub timer: Timer,
    pub bodies: BodyManager,
    pub calculator: Calculator,
    tree: QuadTree,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the simulation by `timer.time_step` (spec.md §4.5).
    pub fn step(&mut self) {
        let dt = self.timer.time_step();
        trace!(
            "simulation step: t={}, dt={}, enabled={}",
            self.timer.simulation_time(),
            dt,
            self.bodies.enabled_count()
        );

        if self.bodies.enabled_count() == 0 {
            self.timer.advance();
            return;
        }

        let ids: Vec<_> = self.bodies.enabled_ids().to_vec();

        let mut min = Vector2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for &id in &ids {
            let body = self.bodies.get_mut(id).expect("enabled id must exist");
            let v_half = body.velocity + body.acceleration * (dt / 2.0);
            let new_position = body.position + v_half * dt;
            body.position = new_position;
            body.v_half = v_half;

            min.x = min.x.min(new_position.x);
            min.y = min.y.min(new_position.y);
            max.x = max.x.max(new_position.x);
            max.y = max.y.max(new_position.y);
        }

        if max.x <= min.x {
            min.x -= MIN_BOUNDS_HALF_EXTENT;
            max.x += MIN_BOUNDS_HALF_EXTENT;
        }
        if max.y <= min.y {
            min.y -= MIN_BOUNDS_HALF_EXTENT;
            max.y += MIN_BOUNDS_HALF_EXTENT;
        }

        self.tree.reset(min, max, ids.len());
        for &id in &ids {
            let body = self.bodies.get_mut(id).expect("enabled id must exist");
            self.tree.insert(TreeBody {
                id,
                position: body.position,
                mass: body.mass,
            });
        }
        self.tree.evaluate();

        for &id in &ids {
            let position = self.bodies.get_mut(id).expect("enabled id must exist").position;
            let a_new = self.tree.calc_acceleration(id, position, &self.calculator);
            let body = self.bodies.get_mut(id).expect("enabled id must exist");
            body.velocity = body.v_half + a_new * (dt / 2.0);
            body.acceleration = a_new;
        }

        self.timer.advance();
    }
}
