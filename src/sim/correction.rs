//! Positional overlap correction
//!
//! Impulses only change velocities, so overlapping circles can stay sunk
//! into each other. A correction strategy nudges positions apart:
//!
//! - `Pairwise` runs as soon as the narrow phase confirms a pair, moving
//!   each movable body `overlap * 0.5 / iterations` per iteration. It
//!   deliberately leaves some overlap so the resolver still sees contact.
//! - `Global` runs after every pair has been resolved and sweeps the whole
//!   pair list, each pass moving both bodies half the overlap apart.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, pair_mut};
use crate::error::{PhysicsError, Result};

/// Overlap correction strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OverlapCorrection {
    Disabled,
    /// Per-pair push at confirmation time
    Pairwise { iterations: u32, tolerance: f32 },
    /// Whole pair list after resolution
    Global { iterations: u32, tolerance: f32 },
}

impl Default for OverlapCorrection {
    fn default() -> Self {
        OverlapCorrection::Pairwise {
            iterations: 6,
            tolerance: 1e-3,
        }
    }
}

impl OverlapCorrection {
    pub fn validate(&self) -> Result<()> {
        match *self {
            OverlapCorrection::Disabled => Ok(()),
            OverlapCorrection::Pairwise { iterations, tolerance }
            | OverlapCorrection::Global { iterations, tolerance } => {
                if iterations == 0 {
                    return Err(PhysicsError::invalid(
                        "overlap correction needs at least one iteration",
                    ));
                }
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(PhysicsError::invalid(format!(
                        "overlap correction tolerance must be finite and non-negative, got {tolerance}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Hook for a pair the narrow phase just confirmed
    pub fn on_contact(&self, a: &mut Body, b: &mut Body) {
        if let OverlapCorrection::Pairwise { iterations, tolerance } = *self {
            separate_pair(a, b, iterations, tolerance);
        }
    }

    /// Hook after every pair of the tick has been resolved
    pub fn after_resolution(&self, bodies: &mut [Body], pairs: &[(usize, usize)]) {
        if let OverlapCorrection::Global { iterations, tolerance } = *self {
            separate_all(bodies, pairs, iterations, tolerance);
        }
    }
}

/// Circle overlap depth and the unit vector from `a` to `b`
fn overlap(a: &Body, b: &Body) -> Option<(f32, Vec2, f32)> {
    let ra = a.shape.radius()?;
    let rb = b.shape.radius()?;
    let delta = b.pos - a.pos;
    let dist = delta.length();
    Some((ra + rb - dist, delta, dist))
}

fn push_apart(a: &mut Body, b: &mut Body, offset: Vec2) {
    if !a.fixed {
        a.pos -= offset;
    }
    if !b.fixed {
        b.pos += offset;
    }
}

/// Gradual push used by the pairwise strategy
///
/// Coincident centers are left alone (no meaningful direction).
pub fn separate_pair(a: &mut Body, b: &mut Body, iterations: u32, tolerance: f32) {
    if a.fixed && b.fixed {
        return;
    }
    let step = 0.5 / iterations as f32;
    for _ in 0..iterations {
        let Some((depth, delta, dist)) = overlap(a, b) else {
            return;
        };
        if depth <= tolerance || dist == 0.0 {
            return;
        }
        push_apart(a, b, delta / dist * depth * step);
    }
}

/// Full half-overlap sweeps over a pair list
///
/// Stops early once a whole pass finds nothing above `tolerance`.
/// Coincident centers are pushed apart along +x.
pub fn separate_all(bodies: &mut [Body], pairs: &[(usize, usize)], iterations: u32, tolerance: f32) {
    for pass in 0..iterations {
        let mut worst = 0.0f32;
        for &(i, j) in pairs {
            let (a, b) = pair_mut(bodies, i, j);
            if a.fixed && b.fixed {
                continue;
            }
            let Some((depth, delta, dist)) = overlap(a, b) else {
                continue;
            };
            if depth <= tolerance {
                continue;
            }
            worst = worst.max(depth);
            let dir = if dist == 0.0 { Vec2::X } else { delta / dist };
            push_apart(a, b, dir * depth * 0.5);
        }
        if worst <= tolerance {
            log::trace!("overlap correction converged after {} passes", pass + 1);
            return;
        }
    }
}
