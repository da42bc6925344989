//! Collision detection and response
//!
//! Narrow phase is circle–circle only. Rectangles are sensors: they show up
//! as candidates and can trigger passthrough hooks, but never report a
//! contact and are never deflected.
//!
//! Response is a single sequential impulse per pair: restitution along the
//! contact normal, then Coulomb friction along the tangent, which also spins
//! both circles.

use glam::Vec2;

use super::body::{Body, Commands, Shape};
use crate::consts::FRICTION;

/// Result of a narrow-phase check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Contact point on the surface of the first shape
    pub point: Vec2,
    /// Unit normal pointing from the first shape to the second
    /// (zero when the centers coincide)
    pub normal: Vec2,
    /// Overlap depth
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
///
/// Overlapping iff the center distance is strictly below the radius sum.
pub fn circle_circle_collision(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> CollisionResult {
    let delta = pos_b - pos_a;
    let dist = delta.length();
    let min_dist = radius_a + radius_b;

    if !(dist < min_dist) {
        return CollisionResult::miss();
    }

    let normal = delta.normalize_or_zero();
    CollisionResult {
        hit: true,
        point: pos_a + normal * radius_a,
        normal,
        penetration: min_dist - dist,
    }
}

/// Exact overlap test between two bodies
pub fn narrow_phase(a: &Body, b: &Body) -> CollisionResult {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle_collision(a.pos, ra, b.pos, rb)
        }
        _ => CollisionResult::miss(),
    }
}

/// Whether two shapes overlap, for sensor purposes
///
/// Circles use the exact test, a circle against a rectangle tests the
/// closest point of the box, and two rectangles compare bounding boxes.
/// Touching is not overlapping.
pub fn shapes_overlap(a: &Body, b: &Body) -> bool {
    match (a.shape, b.shape) {
        (Shape::Circle { .. }, Shape::Circle { .. }) => narrow_phase(a, b).hit,
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => circle_overlaps_box(a.pos, radius, b),
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => circle_overlaps_box(b.pos, radius, a),
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
            let (ha, hb) = (a.shape.half_extents(), b.shape.half_extents());
            let gap = (b.pos - a.pos).abs();
            gap.x < ha.x + hb.x && gap.y < ha.y + hb.y
        }
    }
}

fn circle_overlaps_box(center: Vec2, radius: f32, rect: &Body) -> bool {
    let half = rect.shape.half_extents();
    let closest = center.clamp(rect.pos - half, rect.pos + half);
    (center - closest).length_squared() < radius * radius
}

/// Fire collision hooks, then apply impulses
///
/// Hooks see each other's state as of the call; whatever they change is what
/// the impulse computation uses. Returns whether impulses were applied.
pub fn resolve_collision(a: &mut Body, b: &mut Body, commands: &mut Commands) -> bool {
    if a.fixed && b.fixed {
        return false;
    }
    a.notify_collision(b, commands);
    b.notify_collision(a, commands);
    apply_impulses(a, b)
}

/// Velocity of the contact point on `body`'s surface along `normal`
///
/// `side` is +1 for the body the normal points away from, -1 for the other.
#[inline]
fn contact_velocity(body: &Body, normal: Vec2, radius: f32, side: f32) -> Vec2 {
    if body.fixed {
        return Vec2::ZERO;
    }
    let spin = body.angular_vel * radius * side;
    body.vel + Vec2::new(-spin * normal.y, spin * normal.x)
}

/// Normal and friction impulses for an overlapping circle pair
///
/// Skips silently (returns false) for non-circles, coincident centers,
/// separated circles and pairs with no finite mass.
pub fn apply_impulses(a: &mut Body, b: &mut Body) -> bool {
    if a.fixed && b.fixed {
        return false;
    }
    let (Some(ra), Some(rb)) = (a.shape.radius(), b.shape.radius()) else {
        return false;
    };

    let delta = b.pos - a.pos;
    let dist = delta.length();
    if dist == 0.0 || !(dist < ra + rb) {
        return false;
    }

    let normal = delta / dist;
    let tangent = normal.perp();

    let inv_mass_a = a.inverse_mass();
    let inv_mass_b = b.inverse_mass();
    let inv_mass_sum = inv_mass_a + inv_mass_b;
    if inv_mass_sum == 0.0 {
        return false;
    }

    let rel = contact_velocity(b, normal, rb, -1.0) - contact_velocity(a, normal, ra, 1.0);
    let v_rel_n = rel.dot(normal);
    let v_rel_t = rel.dot(tangent);

    // Normal impulse
    let e = a.restitution().min(b.restitution());
    let jn = -(1.0 + e) * v_rel_n / inv_mass_sum;
    if !a.fixed {
        a.vel -= normal * (jn * inv_mass_a);
    }
    if !b.fixed {
        b.vel += normal * (jn * inv_mass_b);
    }

    // Friction impulse, solid disk inertia
    let inertia_a = a.inertia();
    let inertia_b = b.inertia();
    let rot_term = |r: f32, inertia: Option<f32>| match inertia {
        Some(i) if i > 0.0 => r * r / i,
        _ => 0.0,
    };
    let friction_denom = inv_mass_sum + rot_term(ra, inertia_a) + rot_term(rb, inertia_b);
    if friction_denom <= 0.0 || !friction_denom.is_finite() {
        return true;
    }

    let max_jt = FRICTION * jn.abs();
    let mut jt = -v_rel_t / friction_denom;
    if jt.abs() > max_jt {
        jt = max_jt.copysign(jt);
    }

    if !a.fixed {
        a.vel -= tangent * (jt * inv_mass_a);
        if let Some(i) = inertia_a.filter(|i| *i > 0.0) {
            a.angular_vel -= ra * jt / i;
        }
    }
    if !b.fixed {
        b.vel += tangent * (jt * inv_mass_b);
        if let Some(i) = inertia_b.filter(|i| *i > 0.0) {
            b.angular_vel += rb * jt / i;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BodyListener;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    fn ball(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        Body::circle(Vec2::new(x, y), 5.0).with_velocity(Vec2::new(vx, vy))
    }

    #[test]
    fn test_circle_circle_collision() {
        let result = circle_circle_collision(Vec2::ZERO, 5.0, Vec2::new(8.0, 0.0), 5.0);
        assert!(result.hit);
        assert!((result.normal - Vec2::X).length() < EPS);
        assert!((result.penetration - 2.0).abs() < EPS);
        assert!((result.point - Vec2::new(5.0, 0.0)).length() < EPS);

        // Touching is not overlapping
        assert!(!circle_circle_collision(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0).hit);
    }

    #[test]
    fn test_rectangles_never_collide() {
        let circle = Body::circle(Vec2::ZERO, 5.0);
        let sensor = Body::rectangle(Vec2::ZERO, 35.0, 20.0);
        assert!(!narrow_phase(&circle, &sensor).hit);
        assert!(!narrow_phase(&sensor, &circle).hit);
        assert!(!narrow_phase(&sensor, &sensor).hit);
    }

    #[test]
    fn test_sensor_overlap() {
        let goal = Body::rectangle(Vec2::new(100.0, 100.0), 35.0, 20.0);
        // Box spans x 82.5..117.5, y 90..110
        assert!(shapes_overlap(&Body::circle(Vec2::new(100.0, 100.0), 8.0), &goal));
        assert!(shapes_overlap(&goal, &Body::circle(Vec2::new(124.0, 100.0), 8.0)));
        assert!(!shapes_overlap(&Body::circle(Vec2::new(140.0, 100.0), 8.0), &goal));
        // Near the corner but outside the radius
        assert!(!shapes_overlap(&Body::circle(Vec2::new(123.0, 115.0), 7.0), &goal));

        let other = Body::rectangle(Vec2::new(130.0, 100.0), 35.0, 20.0);
        assert!(shapes_overlap(&goal, &other));
        let far = Body::rectangle(Vec2::new(138.0, 100.0), 35.0, 20.0);
        assert!(!shapes_overlap(&goal, &far));

        assert!(shapes_overlap(&Body::circle(Vec2::ZERO, 5.0), &Body::circle(Vec2::X * 9.0, 5.0)));
        assert!(!shapes_overlap(&Body::circle(Vec2::ZERO, 5.0), &Body::circle(Vec2::X * 10.0, 5.0)));
    }

    #[test]
    fn test_head_on_elastic_exchange() {
        let mut a = ball(0.0, 0.0, 1.0, 0.0);
        let mut b = ball(9.0, 0.0, -1.0, 0.0);
        assert!(apply_impulses(&mut a, &mut b));
        assert!((a.vel - Vec2::new(-1.0, 0.0)).length() < EPS);
        assert!((b.vel - Vec2::new(1.0, 0.0)).length() < EPS);
        assert_eq!(a.angular_vel, 0.0);
        assert_eq!(b.angular_vel, 0.0);
    }

    #[test]
    fn test_bounce_off_fixed_peg() {
        let mut peg = Body::circle(Vec2::ZERO, 4.0).fixed();
        let mut drop = Body::circle(Vec2::new(0.0, -10.0), 8.0)
            .with_velocity(Vec2::new(0.0, 1.0))
            .with_bounciness(0.5);
        assert!(apply_impulses(&mut peg, &mut drop));
        assert!((drop.vel - Vec2::new(0.0, -0.5)).length() < EPS);
        assert_eq!(peg.vel, Vec2::ZERO);
        assert_eq!(peg.pos, Vec2::ZERO);
    }

    #[test]
    fn test_friction_is_clamped_and_spins() {
        let mut peg = Body::circle(Vec2::ZERO, 5.0).fixed();
        let mut drop = ball(0.0, -9.0, 2.0, 1.0);
        assert!(apply_impulses(&mut peg, &mut drop));

        // jn = 2, jt = -2/3 clamped to -0.4
        assert!((drop.vel.x - 1.6).abs() < EPS);
        assert!((drop.vel.y - (-1.0)).abs() < EPS);
        assert!((drop.angular_vel - (-0.16)).abs() < EPS);
    }

    #[test]
    fn test_fixed_pair_untouched() {
        let mut a = ball(0.0, 0.0, 1.0, 0.0).fixed();
        let mut b = ball(3.0, 0.0, -1.0, 0.0).fixed();
        assert!(!resolve_collision(&mut a, &mut b, &mut Commands::new()));
        assert_eq!(a.vel, Vec2::X);
        assert_eq!(b.vel, -Vec2::X);
        assert_eq!(b.pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_degenerate_geometry_skipped() {
        let mut a = ball(0.0, 0.0, 1.0, 0.0);
        let mut b = ball(0.0, 0.0, -1.0, 0.0);
        assert!(!apply_impulses(&mut a, &mut b));
        assert_eq!(a.vel, Vec2::X);

        let mut far = ball(10.0, 0.0, -1.0, 0.0);
        assert!(!apply_impulses(&mut a, &mut far));
        assert_eq!(far.vel, -Vec2::X);
    }

    #[test]
    fn test_hook_state_feeds_resolution() {
        struct Deaden;
        impl BodyListener for Deaden {
            fn on_collision(&mut self, this: &mut Body, _other: &Body, _commands: &mut Commands) {
                this.bounciness = Some(0.0);
            }
        }

        let mut a = ball(0.0, 0.0, 1.0, 0.0).with_listener(Deaden);
        let mut b = ball(9.0, 0.0, -1.0, 0.0);
        assert!(resolve_collision(&mut a, &mut b, &mut Commands::new()));
        // Perfectly inelastic: both end at rest along the normal
        assert!(a.vel.length() < EPS);
        assert!(b.vel.length() < EPS);
    }

    proptest! {
        #[test]
        fn prop_restitution_scales_normal_speed(
            angle in 0.0f32..std::f32::consts::TAU,
            speed_a in 0.0f32..50.0,
            speed_b in 0.0f32..50.0,
            e in 0.0f32..=1.0,
            spin_a in -2.0f32..2.0,
            spin_b in -2.0f32..2.0,
        ) {
            let n = Vec2::from_angle(angle);
            let mut a = Body::circle(Vec2::ZERO, 5.0)
                .with_velocity(n * speed_a)
                .with_angular_velocity(spin_a)
                .with_bounciness(e);
            let mut b = Body::circle(n * 9.0, 5.0)
                .with_velocity(-n * speed_b)
                .with_angular_velocity(spin_b)
                .with_bounciness(1.0);

            let before = (b.vel - a.vel).dot(n);
            prop_assert!(apply_impulses(&mut a, &mut b));
            let after = (b.vel - a.vel).dot(n);
            prop_assert!((after + e * before).abs() < 1e-3 * (1.0 + before.abs()));
        }
    }
}
