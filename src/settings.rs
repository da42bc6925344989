//! Engine settings
//!
//! Fixed at construction; validated before any simulation runs.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::sim::OverlapCorrection;

/// Physics engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Max bodies per quadtree leaf before it subdivides (>= 1)
    pub quad_tree_capacity: usize,
    /// Velocity damping per unit of scaled time, in [0, 1)
    pub drag: f32,
    /// Downward acceleration (screen space, +y is down)
    pub gravity: f32,
    /// Render the quadtree through the debug overlay
    pub draw_quad_tree: bool,
    /// Positional correction applied to overlapping circle pairs
    pub overlap_correction: OverlapCorrection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quad_tree_capacity: 1,
            drag: 0.0,
            gravity: 0.0,
            draw_quad_tree: false,
            overlap_correction: OverlapCorrection::default(),
        }
    }
}

impl Settings {
    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.quad_tree_capacity < 1 {
            return Err(PhysicsError::invalid(format!(
                "quad_tree_capacity must be at least 1, got {}",
                self.quad_tree_capacity
            )));
        }
        if !self.drag.is_finite() || !(0.0..1.0).contains(&self.drag) {
            return Err(PhysicsError::invalid(format!(
                "drag must be in [0, 1), got {}",
                self.drag
            )));
        }
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(PhysicsError::invalid(format!(
                "gravity must be finite and non-negative, got {}",
                self.gravity
            )));
        }
        self.overlap_correction.validate()
    }

    /// Parse settings from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| PhysicsError::invalid(format!("malformed settings: {e}")))?;
        settings.validate()?;
        log::info!(
            "Loaded settings: capacity={}, drag={}, gravity={}",
            settings.quad_tree_capacity,
            settings.drag,
            settings.gravity
        );
        Ok(settings)
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PhysicsError::invalid(format!("unserializable settings: {e}")))
    }
}
