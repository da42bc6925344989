//! Body registry
//!
//! The engine does not own bodies. It works against [`BodyRegistry`], which a
//! host can implement over its own entity storage; [`World`] is the
//! in-memory registry used by the demo and the tests.

use glam::Vec2;

use super::body::{Body, BodyId, Commands};

/// Storage the engine steps
pub trait BodyRegistry {
    /// All bodies in stable iteration order
    fn bodies(&self) -> &[Body];

    fn bodies_mut(&mut self) -> &mut [Body];

    /// Remove a body; `None` if it was already gone
    fn remove_body(&mut self, id: BodyId) -> Option<Body>;

    /// Current world size, queried once per tick
    fn dimensions(&self) -> Vec2;

    /// Whether free bodies leaving the world are removed
    fn culls_out_of_bounds(&self) -> bool {
        false
    }

    /// Apply spawn/despawn requests queued during a tick
    fn apply_commands(&mut self, commands: Commands);

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies().iter().find(|b| b.id == id)
    }
}

/// Ordered in-memory body registry
#[derive(Debug)]
pub struct World {
    bodies: Vec<Body>,
    size: Vec2,
    /// Remove free bodies that leave the world
    pub kill_out_of_bounds: bool,
    next_id: u32,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bodies: Vec::new(),
            size: Vec2::new(width, height),
            kill_out_of_bounds: false,
            next_id: 1,
        }
    }

    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.kill_out_of_bounds = enabled;
        self
    }

    /// Allocate a new body ID
    pub fn next_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a body, assigning it a fresh id
    pub fn spawn(&mut self, mut body: Body) -> BodyId {
        let id = self.next_body_id();
        body.id = id;
        self.bodies.push(body);
        id
    }

    /// Change the world size (e.g. on window resize)
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }
}

impl BodyRegistry for World {
    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        // Keep iteration order stable for determinism
        Some(self.bodies.remove(index))
    }

    fn dimensions(&self) -> Vec2 {
        self.size
    }

    fn culls_out_of_bounds(&self) -> bool {
        self.kill_out_of_bounds
    }

    fn apply_commands(&mut self, commands: Commands) {
        let (spawns, despawns) = commands.into_parts();
        for id in despawns {
            self.remove_body(id);
        }
        for body in spawns {
            self.spawn(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_assigns_increasing_ids() {
        let mut world = World::new(100.0, 100.0);
        let a = world.spawn(Body::circle(Vec2::ZERO, 1.0));
        let b = world.spawn(Body::circle(Vec2::ZERO, 1.0));
        assert!(a < b);
        assert_eq!(world.len(), 2);
        assert_eq!(world.get(b).map(|body| body.id), Some(b));
    }

    #[test]
    fn test_remove_keeps_order_and_is_idempotent() {
        let mut world = World::new(100.0, 100.0);
        let a = world.spawn(Body::circle(Vec2::ZERO, 1.0));
        let b = world.spawn(Body::circle(Vec2::ZERO, 1.0));
        let c = world.spawn(Body::circle(Vec2::ZERO, 1.0));

        assert!(world.remove_body(b).is_some());
        assert!(world.remove_body(b).is_none());
        let ids: Vec<_> = world.iter().map(|body| body.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_apply_commands() {
        let mut world = World::new(100.0, 100.0);
        let a = world.spawn(Body::circle(Vec2::ZERO, 1.0));

        let mut commands = Commands::new();
        commands.despawn(a);
        commands.spawn(Body::circle(Vec2::ONE, 2.0));
        world.apply_commands(commands);

        assert_eq!(world.len(), 1);
        assert!(world.get(a).is_none());
        assert_eq!(world.iter().next().map(|b| b.pos), Some(Vec2::ONE));
    }

    #[test]
    fn test_resize_is_visible_to_engine() {
        let mut world = World::new(100.0, 50.0);
        world.resize(640.0, 480.0);
        assert_eq!(world.dimensions(), Vec2::new(640.0, 480.0));
    }
}
