//! Engine Settings
//!
//! Startup configuration for the frame scheduler, the input channel and the
//! physics subsystem. Every struct deserializes with `#[serde(default)]`, so a
//! settings file only needs the keys it overrides.
//!
//! ```rust,ignore
//! use grove::settings::EngineSettings;
//!
//! let settings = EngineSettings::from_json_str(r#"{ "time": { "max_steps_per_frame": 4 } }"#)?;
//! assert_eq!(settings.time.max_steps_per_frame, 4);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::{GroveError, Result};

/// Fixed/variable step scheduling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    /// Size of one physics step, in seconds.
    pub fixed_step: f64,
    /// Upper bound of fixed steps consumed in a single frame.
    pub max_steps_per_frame: u32,
    /// Raw frame deltas are clamped to `[0, max_delta]`.
    pub max_delta: f64,
    /// Scale applied to the clamped delta.
    pub time_scale: f64,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            max_steps_per_frame: 8,
            max_delta: 0.25,
            time_scale: 1.0,
        }
    }
}

/// Input channel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Capacity of the edge-triggered event channel. Events published while
    /// the channel is full are dropped.
    pub event_capacity: usize,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self { event_capacity: 256 }
    }
}

/// Physics subsystem parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// World gravity, in units per second squared.
    pub gravity: Vec2,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub time: TimeSettings,
    pub input: InputSettings,
    pub physics: PhysicsSettings,
}

impl EngineSettings {
    /// Parses settings from JSON and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        let time = &self.time;
        if !(time.fixed_step.is_finite() && time.fixed_step > 0.0) {
            return Err(GroveError::InvalidSettings(format!(
                "fixed_step must be positive, got {}",
                time.fixed_step
            )));
        }
        if time.max_steps_per_frame == 0 {
            return Err(GroveError::InvalidSettings(
                "max_steps_per_frame must be at least 1".into(),
            ));
        }
        if !(time.max_delta.is_finite() && time.max_delta >= 0.0) {
            return Err(GroveError::InvalidSettings(format!(
                "max_delta must be non-negative, got {}",
                time.max_delta
            )));
        }
        if !(time.time_scale.is_finite() && time.time_scale >= 0.0) {
            return Err(GroveError::InvalidSettings(format!(
                "time_scale must be non-negative, got {}",
                time.time_scale
            )));
        }
        if self.input.event_capacity == 0 {
            return Err(GroveError::InvalidSettings(
                "event_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
