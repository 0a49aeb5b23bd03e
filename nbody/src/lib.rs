//! 2D point-mass gravity simulation core: a Barnes–Hut quadtree paired with
//! a Kick–Drift–Kick Velocity-Verlet integrator, wrapped in a stateless
//! facade (`Engine`) for embedding collaborators to drive.

pub mod aabb;
pub mod body;
pub mod body_manager;
pub mod calculator;
pub mod engine;
pub mod error;
pub mod quadtree;
pub mod simulation;
pub mod timer;
pub mod vector2;

pub use body::{Body, BodyId};
pub use body_manager::{BodyManager, BodyManagerEvent, BodyUpdates};
pub use calculator::{Calculator, IntegratedState};
pub use engine::{BodyDataBase, BodyDataUpdates, Engine, EngineView, SimDataBase, SimDataUpdates};
pub use error::QuadTreeError;
pub use quadtree::{QuadTree, TreeBody};
pub use simulation::Simulation;
pub use timer::Timer;
pub use vector2::Vector2;
