//! Physics simulation module
//!
//! The per-step pipeline. Single-threaded and synchronous:
//! - One tick runs to completion before the next starts
//! - Bodies are processed in registry order
//! - Pair resolution follows discovery order (sequential impulses)
//! - No rendering or platform dependencies

pub mod body;
pub mod broad_phase;
pub mod collision;
pub mod correction;
pub mod integrate;
pub mod quadtree;
pub mod rect;
pub mod step;
pub mod world;

pub use body::{Body, BodyId, BodyListener, Commands, Shape};
pub use broad_phase::{BroadPhase, PairKey, is_eligible, pair_key, passes_through};
pub use collision::{
    CollisionResult, apply_impulses, circle_circle_collision, narrow_phase, resolve_collision, shapes_overlap,
};
pub use correction::OverlapCorrection;
pub use integrate::{cull_out_of_bounds, integrate, integrate_body, is_out_of_bounds};
pub use quadtree::{NodeView, QuadTree};
pub use rect::Rect;
pub use step::{PhysicsEngine, PhysicsEvent, StepReport, TrajectoryPoint};
pub use world::{BodyRegistry, World};
