//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the editing session. All fields have defaults so partial JSON works.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Start new sessions with auto-key enabled.
    pub auto_key: bool,

    /// Magnitude bounds for the cumulative scale handle, per axis.
    pub scale_clamp_min: f32,
    pub scale_clamp_max: f32,

    /// Rotation deltas below this angle (radians) are dropped.
    pub rotate_epsilon: f32,
    /// Previous scale values below this magnitude give a ratio of 1.
    pub ratio_epsilon: f32,

    /// World units per pointer pixel for the depth nudge.
    pub depth_sensitivity: f32,

    /// Status messages retained before the oldest are dropped.
    pub max_status_messages: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            auto_key: true,
            scale_clamp_min: 0.1,
            scale_clamp_max: 5.0,
            rotate_epsilon: 1e-6,
            ratio_epsilon: 1e-6,
            depth_sensitivity: 0.01,
            max_status_messages: 64,
        }
    }
}

impl EditorConfig {
    /// Manual keying: edits stay visual until an explicit commit.
    pub fn manual_key() -> Self {
        Self {
            auto_key: false,
            ..Self::default()
        }
    }

    /// Clamp one axis of a cumulative scale to `[min, max]` in magnitude, keeping
    /// its sign. Zero is treated as positive.
    pub fn clamp_scale_axis(&self, v: f32) -> f32 {
        let mag = v.abs().clamp(self.scale_clamp_min, self.scale_clamp_max);
        if v < 0.0 {
            -mag
        } else {
            mag
        }
    }
}
