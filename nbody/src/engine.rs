//! The stateless facade coordinating Timer, BodyManager, QuadTree, and
//! Calculator behind a small set of entry points (spec.md §4.6).

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};
use crate::simulation::Simulation;
use crate::vector2::Vector2;

/// Snapshot of simulation-wide parameters, used for both import/export and
/// `createBody`-adjacent plumbing (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimDataBase {
    pub simulation_time: f64,
    pub time_step: f64,
    pub theta: f64,
    #[serde(rename = "G_SI")]
    pub g_si: f64,
    pub epsilon: f64,
}

/// Partial update to simulation-wide parameters, excluding `simulationTime`
/// which only ever advances through `tick()` (spec.md §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimDataUpdates {
    pub time_step: Option<f64>,
    pub theta: Option<f64>,
    #[serde(rename = "G_SI")]
    pub g_si: Option<f64>,
    pub epsilon: Option<f64>,
}

/// Flat, serialization-friendly view of one body (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyDataBase {
    pub id: u64,
    pub enabled: bool,
    pub mass: f64,
    pub pos_x: f64,
    pub pos_y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub acc_x: f64,
    pub acc_y: f64,
}

/// Partial update to one body's fields, excluding `id` (spec.md §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyDataUpdates {
    pub enabled: Option<bool>,
    pub mass: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub vel_x: Option<f64>,
    pub vel_y: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
}

fn to_data_base(body: &Body) -> BodyDataBase {
    BodyDataBase {
        id: body.id().value(),
        enabled: body.enabled(),
        mass: body.mass,
        pos_x: body.position.x,
        pos_y: body.position.y,
        vel_x: body.velocity.x,
        vel_y: body.velocity.y,
        acc_x: body.acceleration.x,
        acc_y: body.acceleration.y,
    }
}

/// A read-only, borrowed window onto the current live state; callers must
/// not retain it across `tick()` (spec.md §5).
pub struct EngineView<'a> {
    simulation: &'a Simulation,
}

impl<'a> EngineView<'a> {
    pub fn simulation_time(&self) -> f64 {
        self.simulation.timer.simulation_time()
    }

    pub fn time_step(&self) -> f64 {
        self.simulation.timer.time_step()
    }

    pub fn g_si(&self) -> f64 {
        self.simulation.calculator.g_si()
    }

    pub fn theta(&self) -> f64 {
        self.simulation.calculator.theta()
    }

    pub fn epsilon(&self) -> f64 {
        self.simulation.calculator.epsilon()
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyDataBase> + 'a {
        self.simulation.bodies.all_bodies().map(to_data_base)
    }
}

/// Stateless coordinator over a single `Simulation` (spec.md §4.6). Domain
/// failures (missing id, duplicate id) return `false`/`None`; they never
/// panic and never emit a signal.
#[derive(Default)]
pub struct Engine {
    simulation: Simulation,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> EngineView<'_> {
        EngineView {
            simulation: &self.simulation,
        }
    }

    /// Runs one Simulation step (spec.md §4.5).
    pub fn tick(&mut self) {
        self.simulation.step();
    }

    /// Registers a callback for BodyManager signals (spec.md §6).
    pub fn subscribe(&mut self, listener: Box<dyn FnMut(&crate::body_manager::BodyManagerEvent)>) {
        self.simulation.bodies.subscribe(listener);
    }

    pub fn create_body(&mut self) -> BodyId {
        self.simulation.bodies.create_body(Body::new).id()
    }

    pub fn delete_body(&mut self, id: BodyId) -> bool {
        let removed = self.simulation.bodies.try_delete_body(id);
        if !removed {
            warn!("deleteBody: no body with id {:?}", id);
        }
        removed
    }

    pub fn update_body(&mut self, id: BodyId, updates: BodyDataUpdates) -> bool {
        let applied = self.simulation.bodies.try_update_body(
            id,
            crate::body_manager::BodyUpdates {
                enabled: updates.enabled,
                mass: updates.mass,
                pos_x: updates.pos_x,
                pos_y: updates.pos_y,
                vel_x: updates.vel_x,
                vel_y: updates.vel_y,
                acc_x: updates.acc_x,
                acc_y: updates.acc_y,
            },
        );
        if !applied {
            warn!("updateBody: no body with id {:?}", id);
        }
        applied
    }

    /// Applies a partial update to the timer and calculator. `theta` and
    /// `epsilon` are clamped rather than rejected (spec.md §7).
    pub fn update_simulation(&mut self, updates: SimDataUpdates) {
        if let Some(time_step) = updates.time_step {
            self.simulation.timer.set_time_step(time_step);
        }
        if let Some(theta) = updates.theta {
            self.simulation.calculator.set_theta(theta);
        }
        if let Some(g_si) = updates.g_si {
            self.simulation.calculator.set_g_si(g_si);
        }
        if let Some(epsilon) = updates.epsilon {
            self.simulation.calculator.set_epsilon(epsilon);
        }
    }

    /// Replaces the entire state from a base-data snapshot (spec.md §4.6).
    /// Subscribed listeners survive the import; `BodyManager::clear` is a
    /// bulk reset, not a delete-per-body, so it does not replay
    /// `bodyRemoved`/`enabledContentModified` for the bodies being discarded.
    pub fn import(&mut self, sim_base: SimDataBase, bodies_base: &[BodyDataBase]) {
        trace!("import: {} bodies", bodies_base.len());
        self.simulation.bodies.clear();
        self.simulation.timer.set_simulation_time(sim_base.simulation_time);
        self.simulation.timer.set_time_step(sim_base.time_step);
        self.simulation.calculator.set_theta(sim_base.theta);
        self.simulation.calculator.set_g_si(sim_base.g_si);
        self.simulation.calculator.set_epsilon(sim_base.epsilon);

        for data in bodies_base {
            self.simulation.bodies.try_add_body(Body {
                id: BodyId(data.id),
                enabled: data.enabled,
                mass: data.mass,
                position: Vector2::new(data.pos_x, data.pos_y),
                velocity: Vector2::new(data.vel_x, data.vel_y),
                acceleration: Vector2::new(data.acc_x, data.acc_y),
                v_half: Vector2::ZERO,
                enabled_index: crate::body::NOT_ENABLED,
            });
        }
    }

    pub fn export(&self) -> (SimDataBase, Vec<BodyDataBase>) {
        let sim_base = SimDataBase {
            simulation_time: self.simulation.timer.simulation_time(),
            time_step: self.simulation.timer.time_step(),
            theta: self.simulation.calculator.theta(),
            g_si: self.simulation.calculator.g_si(),
            epsilon: self.simulation.calculator.epsilon(),
        };
        let bodies_base = self.simulation.bodies.all_bodies().map(to_data_base).collect();
        (sim_base, bodies_base)
    }
}
