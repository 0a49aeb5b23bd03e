//! Physical constants, the Barnes–Hut elementary force formula, and the
//! single-body integrators used both to test the engine and, for
//! Velocity-Verlet, internally by `Simulation::step` (spec.md §4.4).

use crate::{body::BodyId, quadtree::QuadTree, vector2::Vector2};

/// Astronomical unit, in meters.
const AU: f64 = 149_597_870_700.0;
/// Solar mass, in kilograms.
const M_SUN: f64 = 1.988_416e30;
/// A day, in seconds.
const DAY: f64 = 86_400.0;

/// Conversion factor between SI gravitational constant and the engine's
/// internal AU³·M☉⁻¹·day⁻² ("AC") unit system: `G_AC = G_SI / G_SI_PER_AC`.
const G_SI_PER_AC: f64 = AU * AU * AU / M_SUN / (DAY * DAY);

const DEFAULT_G_SI: f64 = 6.674_30e-11;
const DEFAULT_THETA: f64 = 0.5;
const DEFAULT_EPSILON: f64 = 0.001;
const MIN_EPSILON: f64 = 1e-4;

/// Holds the gravitational constant (SI and internal AC units), the
/// Barnes–Hut opening angle, and the Plummer softening length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculator {
    g_si: f64,
    g_ac: f64,
    theta: f64,
    theta_sq: f64,
    epsilon: f64,
    epsilon_sq: f64,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(DEFAULT_G_SI, DEFAULT_THETA, DEFAULT_EPSILON)
    }
}

impl Calculator {
    pub fn new(g_si: f64, theta: f64, epsilon: f64) -> Self {
        let mut calculator = Self {
            g_si: 0.0,
            g_ac: 0.0,
            theta: 0.0,
            theta_sq: 0.0,
            epsilon: 0.0,
            epsilon_sq: 0.0,
        };
        calculator.set_g_si(g_si);
        calculator.set_theta(theta);
        calculator.set_epsilon(epsilon);
        calculator
    }

    pub fn g_si(&self) -> f64 {
        self.g_si
    }

    pub fn g_ac(&self) -> f64 {
        self.g_ac
    }

    pub fn set_g_si(&mut self, g_si: f64) {
        self.g_si = g_si;
        self.g_ac = g_si / G_SI_PER_AC;
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn theta_sq(&self) -> f64 {
        self.theta_sq
    }

    /// Clamps to `[0, 1]` (spec.md §4.4).
    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta.clamp(0.0, 1.0);
        self.theta_sq = self.theta * self.theta;
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn epsilon_sq(&self) -> f64 {
        self.epsilon_sq
    }

    /// Clamps to `>= 1e-4` (spec.md §4.4).
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.max(MIN_EPSILON);
        self.epsilon_sq = self.epsilon * self.epsilon;
    }

    pub fn distance_squared_softened(&self, a: Vector2, b: Vector2) -> f64 {
        a.distance_to_squared(b) + self.epsilon_sq
    }

    /// Acceleration exerted on a body at `p_target` by a mass `m_source` at
    /// `p_source`. `d_sq`, if provided, must already be softened
    /// (`distance_squared_softened`) and is reused instead of recomputed.
    ///
    /// The direction is `source - target`, so positive masses attract and
    /// negative masses repel (spec.md §4.4).
    pub fn acceleration(
        &self,
        p_target: Vector2,
        p_source: Vector2,
        m_source: f64,
        d_sq: Option<f64>,
    ) -> Vector2 {
        let d_sq = d_sq.unwrap_or_else(|| self.distance_squared_softened(p_target, p_source));
        if d_sq == 0.0 {
            return Vector2::ZERO;
        }
        let magnitude = self.g_ac * m_source / d_sq;
        let direction = (p_source - p_target).normalized();
        direction * magnitude
    }
}

/// The `(position, velocity, acceleration)` triple returned by every
/// single-body integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedState {
    pub position: Vector2,
    pub velocity: Vector2,
    pub acceleration: Vector2,
}

fn field_acceleration(
    tree: &QuadTree,
    calculator: &Calculator,
    id: BodyId,
    position: Vector2,
) -> Vector2 {
    tree.calc_acceleration(id, position, calculator)
}

/// Semi-implicit (symplectic) Euler: `v' = v + a·dt`, `x' = x + v'·dt`, then
/// the acceleration is refreshed at the new position.
pub fn integrate_symplectic_euler(
    calculator: &Calculator,
    tree: &QuadTree,
    id: BodyId,
    position: Vector2,
    velocity: Vector2,
    dt: f64,
    acceleration: Vector2,
) -> IntegratedState {
    let new_velocity = velocity + acceleration * dt;
    let new_position = position + new_velocity * dt;
    let new_acceleration = field_acceleration(tree, calculator, id, new_position);
    IntegratedState {
        position: new_position,
        velocity: new_velocity,
        acceleration: new_acceleration,
    }
}

/// Classical 4th-order Runge-Kutta applied to the coupled ODE
/// `x' = v, v' = a(x)`.
pub fn integrate_rk4(
    calculator: &Calculator,
    tree: &QuadTree,
    id: BodyId,
    position: Vector2,
    velocity: Vector2,
    dt: f64,
) -> IntegratedState {
    let a1 = field_acceleration(tree, calculator, id, position);
    let v1 = velocity;

    let x2 = position + v1 * (dt / 2.0);
    let v2 = velocity + a1 * (dt / 2.0);
    let a2 = field_acceleration(tree, calculator, id, x2);

    let x3 = position + v2 * (dt / 2.0);
    let v3 = velocity + a2 * (dt / 2.0);
    let a3 = field_acceleration(tree, calculator, id, x3);

    let x4 = position + v3 * dt;
    let v4 = velocity + a3 * dt;
    let a4 = field_acceleration(tree, calculator, id, x4);

    let new_position = position + (v1 + (v2 + v3) * 2.0 + v4) * (dt / 6.0);
    let new_velocity = velocity + (a1 + (a2 + a3) * 2.0 + a4) * (dt / 6.0);
    let new_acceleration = field_acceleration(tree, calculator, id, new_position);

    IntegratedState {
        position: new_position,
        velocity: new_velocity,
        acceleration: new_acceleration,
    }
}

/// KDK Velocity-Verlet: half-kick, drift, refresh acceleration, half-kick.
/// This is also the math `Simulation::step` applies across the enabled body
/// set; this standalone form exists for single-body round-trip testing
/// (spec.md §8) and is exactly time-reversible under `dt -> -dt`.
pub fn integrate_velocity_verlet(
    calculator: &Calculator,
    tree: &QuadTree,
    id: BodyId,
    position: Vector2,
    velocity: Vector2,
    dt: f64,
    acceleration: Vector2,
) -> IntegratedState {
    let v_half = velocity + acceleration * (dt / 2.0);
    let new_position = position + v_half * dt;
    let new_acceleration = field_acceleration(tree, calculator, id, new_position);
    let new_velocity = v_half + new_acceleration * (dt / 2.0);
    IntegratedState {
        position: new_position,
        velocity: new_velocity,
        acceleration: new_acceleration,
    }
}
