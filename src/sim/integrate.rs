//! Motion integration and out-of-bounds culling

use glam::Vec2;

use super::body::{Body, BodyId};
use super::world::BodyRegistry;

/// Advance one free body by `dt` (already time-scaled)
///
/// Semi-implicit Euler: gravity, then drag, then position from the new
/// velocity.
#[inline]
pub fn integrate_body(body: &mut Body, gravity: f32, drag: f32, dt: f32) {
    if !body.is_free() {
        return;
    }
    body.vel.y += gravity * dt;
    body.vel *= 1.0 - drag * dt;
    body.pos += body.vel * dt;
}

/// Advance every free body once, in registry order
pub fn integrate(bodies: &mut [Body], gravity: f32, drag: f32, dt: f32) {
    for body in bodies.iter_mut() {
        integrate_body(body, gravity, drag, dt);
    }
}

/// Center outside the world grown by the body's half extents
pub fn is_out_of_bounds(body: &Body, size: Vec2) -> bool {
    let margin = body.shape.half_extents();
    body.pos.x < -margin.x
        || body.pos.x > size.x + margin.x
        || body.pos.y < -margin.y
        || body.pos.y > size.y + margin.y
}

/// Remove free bodies that left the world; returns their ids
///
/// Does nothing unless the registry enables culling.
pub fn cull_out_of_bounds<R: BodyRegistry + ?Sized>(registry: &mut R) -> Vec<BodyId> {
    if !registry.culls_out_of_bounds() {
        return Vec::new();
    }
    let size = registry.dimensions();
    let doomed: Vec<BodyId> = registry
        .bodies()
        .iter()
        .filter(|b| b.is_free() && is_out_of_bounds(b, size))
        .map(|b| b.id)
        .collect();

    for &id in &doomed {
        log::trace!("culling {id}: left the world");
        registry.remove_body(id);
    }
    doomed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::World;

    #[test]
    fn test_velocity_integrates_before_position() {
        let (g, d, dt) = (3.0, 0.05, 0.5);
        let mut body = Body::circle(Vec2::new(100.0, 100.0), 5.0).with_velocity(Vec2::new(2.0, -1.0));
        integrate_body(&mut body, g, d, dt);

        let vx1 = 2.0 * (1.0 - d * dt);
        let vy1 = (-1.0 + g * dt) * (1.0 - d * dt);
        assert!((body.vel.x - vx1).abs() < 1e-6);
        assert!((body.vel.y - vy1).abs() < 1e-6);
        assert!((body.pos.x - (100.0 + vx1 * dt)).abs() < 1e-5);
        assert!((body.pos.y - (100.0 + vy1 * dt)).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_and_massless_untouched() {
        let mut bodies = vec![
            Body::circle(Vec2::ONE, 5.0).with_velocity(Vec2::X).fixed(),
            Body::circle(Vec2::ONE, 5.0).with_velocity(Vec2::X).massless(),
        ];
        integrate(&mut bodies, 10.0, 0.1, 1.0);
        for body in &bodies {
            assert_eq!(body.pos, Vec2::ONE);
            assert_eq!(body.vel, Vec2::X);
        }
    }

    #[test]
    fn test_bounds_margin() {
        let size = Vec2::new(100.0, 100.0);
        assert!(!is_out_of_bounds(&Body::circle(Vec2::new(-5.0, 50.0), 5.0), size));
        assert!(is_out_of_bounds(&Body::circle(Vec2::new(-5.1, 50.0), 5.0), size));
        assert!(is_out_of_bounds(&Body::circle(Vec2::new(50.0, 105.1), 5.0), size));

        let sensor = Body::rectangle(Vec2::new(115.0, 50.0), 30.0, 10.0);
        assert!(!is_out_of_bounds(&sensor, size));
    }

    #[test]
    fn test_cull_removes_once_when_enabled() {
        let mut world = World::new(100.0, 100.0).with_culling(true);
        let gone = world.spawn(Body::circle(Vec2::new(-6.0, 50.0), 5.0));
        let pinned = world.spawn(Body::circle(Vec2::new(-60.0, 50.0), 5.0).fixed());
        let stays = world.spawn(Body::circle(Vec2::new(50.0, 50.0), 5.0));

        assert_eq!(cull_out_of_bounds(&mut world), vec![gone]);
        assert!(cull_out_of_bounds(&mut world).is_empty());
        assert!(world.get(pinned).is_some());
        assert!(world.get(stays).is_some());
    }

    #[test]
    fn test_cull_disabled_never_removes() {
        let mut world = World::new(100.0, 100.0);
        world.spawn(Body::circle(Vec2::new(-600.0, 50.0), 5.0));
        assert!(cull_out_of_bounds(&mut world).is_empty());
        assert_eq!(world.len(), 1);
    }
}
