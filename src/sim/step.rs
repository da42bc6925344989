//! Per-tick pipeline
//!
//! One call to [`PhysicsEngine::step`] runs, in order: integration, bounds
//! culling, quadtree rebuild, broad phase with pair filtering and narrow
//! phase, impulse resolution in discovery order, optional global overlap
//! correction, and finally the deferred commands queued by hooks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, Commands, pair_mut};
use super::broad_phase::{BroadPhase, is_eligible};
use super::collision::{apply_impulses, narrow_phase, resolve_collision};
use super::correction::OverlapCorrection;
use super::integrate::{cull_out_of_bounds, integrate, integrate_body, is_out_of_bounds};
use super::quadtree::QuadTree;
use super::rect::Rect;
use super::world::BodyRegistry;
use crate::consts::{FPS_ALPHA, TIME_SCALE};
use crate::error::Result;
use crate::renderer::{DebugSurface, draw_quad_tree};
use crate::settings::Settings;

/// Something the host may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    /// Impulses were applied to an eligible, overlapping pair
    Collision { a: BodyId, b: BodyId },
    /// `body` overlapped `other` but was excluded from collision
    Passthrough { body: BodyId, other: BodyId },
    /// A free body left the world and was removed
    Culled { id: BodyId },
}

/// Summary of one tick
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Events in the order they happened
    pub events: Vec<PhysicsEvent>,
    /// Number of pairs handed to the resolver
    pub pairs: usize,
    /// Bodies removed by the culler
    pub culled: Vec<BodyId>,
}

/// Predicted state of a body after one replay tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
}

impl From<&Body> for TrajectoryPoint {
    fn from(body: &Body) -> Self {
        Self {
            pos: body.pos,
            vel: body.vel,
            angular_vel: body.angular_vel,
        }
    }
}

/// The simulation context: configuration plus per-tick scratch state
#[derive(Debug)]
pub struct PhysicsEngine {
    settings: Settings,
    tree: QuadTree<usize>,
    broad_phase: BroadPhase,
    fps: Option<f32>,
    ticks: u64,
}

impl PhysicsEngine {
    /// Validate settings and build an engine
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let tree = QuadTree::new(Rect::default(), settings.quad_tree_capacity)?;
        log::info!(
            "Physics engine ready: capacity={}, drag={}, gravity={}, correction={:?}",
            settings.quad_tree_capacity,
            settings.drag,
            settings.gravity,
            settings.overlap_correction
        );
        Ok(Self {
            settings,
            tree,
            broad_phase: BroadPhase::new(),
            fps: None,
            ticks: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Turn the quadtree overlay on or off
    pub fn set_draw_quad_tree(&mut self, enabled: bool) {
        self.settings.draw_quad_tree = enabled;
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Exponentially smoothed frame rate, from the `dt` values passed to `step`
    pub fn smoothed_fps(&self) -> Option<f32> {
        self.fps
    }

    /// Index built by the last tick
    pub fn quad_tree(&self) -> &QuadTree<usize> {
        &self.tree
    }

    fn sample_fps(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        let current = 1.0 / dt;
        self.fps = Some(match self.fps {
            Some(fps) => fps * (1.0 - FPS_ALPHA) + current * FPS_ALPHA,
            None => current,
        });
    }

    fn rebuild_index(&mut self, bodies: &[Body], size: Vec2) {
        self.tree.reset(Rect::new(0.0, 0.0, size.x, size.y));
        for (slot, body) in bodies.iter().enumerate() {
            if body.is_massive() {
                self.tree.insert(body.aabb(), slot);
            }
        }
    }

    /// Advance the live world by one tick of `dt` seconds
    pub fn step<R: BodyRegistry + ?Sized>(&mut self, registry: &mut R, dt: f32) -> StepReport {
        self.sample_fps(dt);
        self.ticks += 1;
        let dt = dt * TIME_SCALE;
        let mut report = StepReport::default();

        integrate(
            registry.bodies_mut(),
            self.settings.gravity,
            self.settings.drag,
            dt,
        );

        report.culled = cull_out_of_bounds(registry);
        report
            .events
            .extend(report.culled.iter().map(|&id| PhysicsEvent::Culled { id }));

        let size = registry.dimensions();
        self.rebuild_index(registry.bodies(), size);

        let mut commands = Commands::new();
        let correction = self.settings.overlap_correction;
        let bodies = registry.bodies_mut();
        let pairs = self.broad_phase.find_pairs(
            bodies,
            &self.tree,
            &correction,
            &mut commands,
            &mut report.events,
        );

        for &(i, j) in &pairs {
            let (a, b) = pair_mut(bodies, i, j);
            let (id_a, id_b) = (a.id, b.id);
            if resolve_collision(a, b, &mut commands) {
                report.events.push(PhysicsEvent::Collision { a: id_a, b: id_b });
            }
        }
        correction.after_resolution(bodies, &pairs);
        report.pairs = pairs.len();

        if !commands.is_empty() {
            registry.apply_commands(commands);
        }

        log::debug!(
            "tick {}: {} pairs, {} culled, {} quadtree nodes",
            self.ticks,
            report.pairs,
            report.culled.len(),
            self.tree.node_count()
        );
        report
    }

    /// Predict `steps` ticks of one body without touching the registry
    ///
    /// The body is copied without its listener. Every other massive body is
    /// frozen where it is and acts as an immovable obstacle (eligibility
    /// still follows its real `fixed` flag). No hooks fire. The prediction
    /// stops early if the body would be culled. `None` if `id` is unknown.
    ///
    /// Contacts are corrected and then resolved in registry order, with the
    /// lower slot as the first body, which is how a live tick orders a pair.
    /// A global correction then runs over the same contacts.
    pub fn simulate_body_steps<R: BodyRegistry + ?Sized>(
        &self,
        registry: &R,
        id: BodyId,
        steps: usize,
        dt: f32,
    ) -> Option<Vec<TrajectoryPoint>> {
        let bodies = registry.bodies();
        let slot = bodies.iter().position(|b| b.id == id)?;
        let mut body = bodies[slot].detached();
        let dt = dt * TIME_SCALE;
        let size = registry.dimensions();
        let cull = registry.culls_out_of_bounds();
        let correction = self.settings.overlap_correction;

        let mut frozen = QuadTree::new(
            Rect::new(0.0, 0.0, size.x, size.y),
            self.settings.quad_tree_capacity,
        )
        .ok()?;
        for (other_slot, other) in bodies.iter().enumerate() {
            if other_slot != slot && other.is_massive() {
                frozen.insert(other.aabb(), other_slot);
            }
        }

        let obstacle = |other_slot: usize| {
            let mut obstacle = bodies[other_slot].detached();
            obstacle.fixed = true;
            obstacle
        };

        let mut trajectory = Vec::with_capacity(steps);
        let mut candidates = Vec::new();
        let mut contacts = Vec::new();
        for _ in 0..steps {
            integrate_body(&mut body, self.settings.gravity, self.settings.drag, dt);
            if cull && body.is_free() && is_out_of_bounds(&body, size) {
                break;
            }

            if body.is_massive() {
                candidates.clear();
                contacts.clear();
                frozen.query_into(&body.candidate_range(), &mut candidates);
                candidates.sort_unstable();

                for &other_slot in &candidates {
                    let other = &bodies[other_slot];
                    if !is_eligible(&body, other) || !narrow_phase(&body, other).hit {
                        continue;
                    }
                    let mut other = obstacle(other_slot);
                    if other_slot < slot {
                        correction.on_contact(&mut other, &mut body);
                    } else {
                        correction.on_contact(&mut body, &mut other);
                    }
                    contacts.push(other_slot);
                }
                for &other_slot in &contacts {
                    let mut other = obstacle(other_slot);
                    if other_slot < slot {
                        apply_impulses(&mut other, &mut body);
                    } else {
                        apply_impulses(&mut body, &mut other);
                    }
                }
                if matches!(correction, OverlapCorrection::Global { .. }) && !contacts.is_empty() {
                    body.pos = separate_from_obstacles(&body, slot, &contacts, &obstacle, correction);
                }
            }
            trajectory.push(TrajectoryPoint::from(&body));
        }
        Some(trajectory)
    }

    /// Draw the last tick's quadtree if the overlay is on
    pub fn draw_debug(&self, surface: &mut dyn DebugSurface) {
        if self.settings.draw_quad_tree {
            draw_quad_tree(&self.tree, surface);
        }
    }
}

/// Position of the replay body after the global correction pass
///
/// Builds the same pair list a live tick would see for this body and lets
/// the correction move it; obstacles are fixed and stay put.
fn separate_from_obstacles(
    body: &Body,
    slot: usize,
    contacts: &[usize],
    obstacle: &impl Fn(usize) -> Body,
    correction: OverlapCorrection,
) -> Vec2 {
    let mut local: Vec<Body> = contacts.iter().map(|&other_slot| obstacle(other_slot)).collect();
    let me = local.len();
    local.push(body.detached());
    let pairs: Vec<(usize, usize)> = contacts
        .iter()
        .enumerate()
        .map(|(k, &other_slot)| if other_slot < slot { (k, me) } else { (me, k) })
        .collect();
    correction.after_resolution(&mut local, &pairs);
    local[me].pos
}
