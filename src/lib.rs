//! Plinko Physics - 2D impulse physics for peg-board games
//!
//! Core modules:
//! - `sim`: Per-step pipeline (integration, quadtree broad phase, narrow phase, impulses)
//! - `renderer`: Debug overlay contract (the crate never draws by itself)
//! - `settings`: Construction-time configuration
//! - `error`: Configuration errors

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{PhysicsError, Result};
pub use settings::Settings;
pub use sim::{Body, BodyId, BodyRegistry, PhysicsEngine, Shape, World};

/// Simulation constants
pub mod consts {
    /// Every per-tick time-dependent term uses `dt * TIME_SCALE`
    pub const TIME_SCALE: f32 = 10.0;

    /// Coulomb friction coefficient for circle contacts
    pub const FRICTION: f32 = 0.2;

    /// Restitution used when a body leaves it unset
    pub const DEFAULT_BOUNCINESS: f32 = 1.0;

    /// Quadtree nodes at this depth never subdivide
    pub const MAX_DEPTH: u32 = 12;
    /// Quadtree nodes never split into quadrants narrower than this
    pub const MIN_NODE_SIZE: f32 = 1.0;

    /// Smoothing factor for the frames-per-second estimate
    pub const FPS_ALPHA: f32 = 0.1;
}
