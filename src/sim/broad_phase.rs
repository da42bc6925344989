//! Broad phase and pair filtering
//!
//! Every massive circle queries the quadtree with a range twice its own size;
//! rectangles query exactly their own box. Candidates go through the
//! eligibility rule, then the narrow phase; pairs are keyed by sorted ids so
//! each is handled at most once per tick no matter how often it is
//! rediscovered. Pair order is discovery order.

use std::collections::HashSet;

use super::body::{Body, BodyId, Commands, pair_mut};
use super::collision::{narrow_phase, shapes_overlap};
use super::correction::OverlapCorrection;
use super::quadtree::QuadTree;
use super::step::PhysicsEvent;

/// Unordered body pair in canonical (min, max) order
pub type PairKey = (BodyId, BodyId);

#[inline]
pub fn pair_key(a: BodyId, b: BodyId) -> PairKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// Whether two bodies may physically collide
///
/// A `collide_with_fixed_only` body only collides with fixed bodies.
#[inline]
pub fn is_eligible(a: &Body, b: &Body) -> bool {
    !((a.collide_with_fixed_only && !b.fixed) || (b.collide_with_fixed_only && !a.fixed))
}

/// Reusable broad-phase scratch space
#[derive(Debug, Default)]
pub struct BroadPhase {
    collided: HashSet<PairKey>,
    passed: HashSet<PairKey>,
    candidates: Vec<usize>,
}

impl BroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlapping, eligible pairs as body slot indices, in discovery order
    ///
    /// Passthrough hooks fire inline, once per pair per tick, when an
    /// ineligible pair actually overlaps (see [`passes_through`]). Pairs of
    /// two fixed bodies are dropped. `tree` must index `bodies` by slot.
    pub fn find_pairs(
        &mut self,
        bodies: &mut [Body],
        tree: &QuadTree<usize>,
        correction: &OverlapCorrection,
        commands: &mut Commands,
        events: &mut Vec<PhysicsEvent>,
    ) -> Vec<(usize, usize)> {
        self.collided.clear();
        self.passed.clear();
        let mut pairs = Vec::new();

        for i in 0..bodies.len() {
            if !bodies[i].is_massive() {
                continue;
            }
            self.candidates.clear();
            tree.query_into(&bodies[i].candidate_range(), &mut self.candidates);

            for &j in &self.candidates {
                if j == i {
                    continue;
                }
                let key = pair_key(bodies[i].id, bodies[j].id);

                if !is_eligible(&bodies[i], &bodies[j]) {
                    if !self.passed.contains(&key) && shapes_overlap(&bodies[i], &bodies[j]) {
                        self.passed.insert(key);
                        notify_passthrough(bodies, i, j, commands, events);
                    }
                    continue;
                }

                if self.collided.contains(&key) {
                    continue;
                }
                let (a, b) = pair_mut(bodies, i, j);
                if !narrow_phase(a, b).hit {
                    continue;
                }
                self.collided.insert(key);
                correction.on_contact(a, b);
                if a.fixed && b.fixed {
                    continue;
                }
                pairs.push((i, j));
            }
        }
        pairs
    }
}

/// Whether `this` is told it passed through `other`
///
/// Only movable bodies are told, and only when they opted into the
/// restriction themselves or `other` is a fixed sensor. A plain body that
/// merely overlaps a `collide_with_fixed_only` one hears nothing.
pub fn passes_through(this: &Body, other: &Body) -> bool {
    !this.fixed && (this.collide_with_fixed_only || other.fixed)
}

fn notify_passthrough(
    bodies: &mut [Body],
    i: usize,
    j: usize,
    commands: &mut Commands,
    events: &mut Vec<PhysicsEvent>,
) {
    for (this, other) in [(i, j), (j, i)] {
        let (this, other) = pair_mut(bodies, this, other);
        if !passes_through(this, other) {
            continue;
        }
        log::trace!("{} passes through {}", this.id, other.id);
        this.notify_passthrough(other, commands);
        events.push(PhysicsEvent::Passthrough {
            body: this.id,
            other: other.id,
        });
    }
}
