//! Bodies and their event hooks
//!
//! A body is physically simulated only when it has a positive mass and a
//! well-formed shape. Everything else is a visual marker the pipeline skips.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::consts::DEFAULT_BOUNCINESS;

/// Stable body identifier, unique within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body geometry, centered on the body position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rectangle { width: f32, height: f32 },
}

impl Shape {
    /// Half width and half height of the bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rectangle { width, height } => Vec2::new(width, height) * 0.5,
        }
    }

    /// Radius for circles, `None` for everything else
    pub fn radius(&self) -> Option<f32> {
        match *self {
            Shape::Circle { radius } => Some(radius),
            Shape::Rectangle { .. } => None,
        }
    }

    /// All dimensions finite and positive
    pub fn is_well_formed(&self) -> bool {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Shape::Circle { radius } => ok(radius),
            Shape::Rectangle { width, height } => ok(width) && ok(height),
        }
    }
}

/// Deferred world changes requested from inside a tick
///
/// Hooks cannot reach the registry; they queue requests here and the
/// registry applies them once the tick has finished.
#[derive(Debug, Default)]
pub struct Commands {
    pub(crate) spawn: Vec<Body>,
    pub(crate) despawn: Vec<BodyId>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body at the end of the tick (its id is assigned by the registry)
    pub fn spawn(&mut self, body: Body) {
        self.spawn.push(body);
    }

    /// Remove a body at the end of the tick
    pub fn despawn(&mut self, id: BodyId) {
        if !self.despawn.contains(&id) {
            self.despawn.push(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spawn.is_empty() && self.despawn.is_empty()
    }

    /// Take the queued requests: (spawns, despawns)
    pub fn into_parts(self) -> (Vec<Body>, Vec<BodyId>) {
        (self.spawn, self.despawn)
    }
}

/// Event hooks attached to a body
///
/// Both hooks run synchronously in the middle of a tick. They may change
/// `this` (the body the listener belongs to) and read `other`, but world
/// membership changes must go through `commands`.
pub trait BodyListener {
    /// Called before an overlapping, eligible pair is resolved
    fn on_collision(&mut self, _this: &mut Body, _other: &Body, _commands: &mut Commands) {}

    /// Called once per tick while this body overlaps one it may not collide
    /// with
    ///
    /// Only movable bodies are called, and only if this body is itself
    /// `collide_with_fixed_only` or `other` is fixed.
    fn on_passthrough(&mut self, _this: &mut Body, _other: &Body, _commands: &mut Commands) {}
}

/// A simulated entity
#[derive(Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub shape: Shape,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Angular velocity (radians per scaled time unit)
    #[serde(default)]
    pub angular_vel: f32,
    /// `None` marks a purely visual body
    pub mass: Option<f32>,
    /// Infinite mass, never moved by physics
    #[serde(default)]
    pub fixed: bool,
    /// Restitution coefficient, 1.0 when unset
    #[serde(default)]
    pub bounciness: Option<f32>,
    /// Only collide with fixed bodies; everything else is a passthrough
    #[serde(default)]
    pub collide_with_fixed_only: bool,
    #[serde(skip)]
    pub listener: Option<Box<dyn BodyListener>>,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("pos", &self.pos)
            .field("vel", &self.vel)
            .field("angular_vel", &self.angular_vel)
            .field("mass", &self.mass)
            .field("fixed", &self.fixed)
            .field("bounciness", &self.bounciness)
            .field("collide_with_fixed_only", &self.collide_with_fixed_only)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Body {
    fn with_shape(shape: Shape, pos: Vec2) -> Self {
        Self {
            id: BodyId::default(),
            shape,
            pos,
            vel: Vec2::ZERO,
            angular_vel: 0.0,
            mass: Some(1.0),
            fixed: false,
            bounciness: None,
            collide_with_fixed_only: false,
            listener: None,
        }
    }

    /// A unit-mass circle at rest
    pub fn circle(pos: Vec2, radius: f32) -> Self {
        Self::with_shape(Shape::Circle { radius }, pos)
    }

    /// A unit-mass rectangle at rest, centered on `pos`
    pub fn rectangle(pos: Vec2, width: f32, height: f32) -> Self {
        Self::with_shape(Shape::Rectangle { width, height }, pos)
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_angular_velocity(mut self, angular_vel: f32) -> Self {
        self.angular_vel = angular_vel;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Drop the mass: the body becomes a visual marker
    pub fn massless(mut self) -> Self {
        self.mass = None;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = Some(bounciness);
        self
    }

    pub fn collide_with_fixed_only(mut self) -> Self {
        self.collide_with_fixed_only = true;
        self
    }

    pub fn with_listener(mut self, listener: impl BodyListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Takes part in the index, the integrator and collisions
    pub fn is_massive(&self) -> bool {
        matches!(self.mass, Some(m) if m.is_finite() && m > 0.0) && self.shape.is_well_formed()
    }

    /// Massive and movable
    #[inline]
    pub fn is_free(&self) -> bool {
        self.is_massive() && !self.fixed
    }

    /// Bounding box around the current position
    pub fn aabb(&self) -> Rect {
        Rect::from_center(self.pos, self.shape.half_extents())
    }

    /// Range searched for collision candidates
    ///
    /// Circles grow their bounding box by half its size on each side.
    /// Rectangles are sensors and search exactly their own box.
    pub fn candidate_range(&self) -> Rect {
        match self.shape {
            Shape::Circle { .. } => self.aabb().expand(self.shape.half_extents()),
            Shape::Rectangle { .. } => self.aabb(),
        }
    }

    /// Zero for fixed bodies
    pub fn inverse_mass(&self) -> f32 {
        match self.mass {
            Some(m) if !self.fixed && m > 0.0 => 1.0 / m,
            _ => 0.0,
        }
    }

    /// Solid disk inertia; `None` for fixed bodies or non-circles
    pub fn inertia(&self) -> Option<f32> {
        if self.fixed {
            return None;
        }
        let r = self.shape.radius()?;
        self.mass.map(|m| 0.5 * m * r * r)
    }

    pub fn restitution(&self) -> f32 {
        self.bounciness.unwrap_or(DEFAULT_BOUNCINESS)
    }

    /// Copy of every physical field, without the listener
    pub fn detached(&self) -> Body {
        Body {
            id: self.id,
            shape: self.shape,
            pos: self.pos,
            vel: self.vel,
            angular_vel: self.angular_vel,
            mass: self.mass,
            fixed: self.fixed,
            bounciness: self.bounciness,
            collide_with_fixed_only: self.collide_with_fixed_only,
            listener: None,
        }
    }

    /// Fire the collision hook, if any
    pub(crate) fn notify_collision(&mut self, other: &Body, commands: &mut Commands) -> bool {
        match self.listener.take() {
            Some(mut listener) => {
                listener.on_collision(self, other, commands);
                self.listener = Some(listener);
                true
            }
            None => false,
        }
    }

    /// Fire the passthrough hook, if any
    pub(crate) fn notify_passthrough(&mut self, other: &Body, commands: &mut Commands) -> bool {
        match self.listener.take() {
            Some(mut listener) => {
                listener.on_passthrough(self, other, commands);
                self.listener = Some(listener);
                true
            }
            None => false,
        }
    }
}

/// Two distinct bodies of a slice, both mutable
///
/// Panics if `i == j`.
pub(crate) fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    assert_ne!(i, j, "a body cannot pair with itself");
    if i < j {
        let (head, tail) = bodies.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
