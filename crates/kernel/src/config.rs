use glam::Vec3;
use handworks_common::Transform;
use handworks_input::DEFAULT_DEADZONE;
use serde::{Deserialize, Serialize};

/// What a hand does with its hover set when a grabbable leaves its volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HoverExitPolicy {
    /// Drop the grabbable from the hover set on exit.
    #[default]
    Remove,
    /// Keep it until a successful release clears it. Legacy behaviour: a hand
    /// keeps treating an object as hovered after leaving its volume.
    Retain,
}

/// Tunables for hand acquisition and the grab protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Analog readings must be strictly above this to count as pressed.
    pub deadzone: f32,
    /// Hover-mode holds are released once the object is farther than this.
    pub hover_release_distance: f32,
    /// Maximum length of the pointer ray.
    pub pointer_range: f32,
    /// Pointer attachment relative to the hand pose.
    pub pointer_offset: Transform,
    pub hover_exit: HoverExitPolicy,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            hover_release_distance: 3.0,
            pointer_range: 100_000.0,
            pointer_offset: Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),
            hover_exit: HoverExitPolicy::Remove,
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl GrabConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(ConfigError::Invalid {
                field: "deadzone",
                reason: "must be in [0, 1)",
            });
        }
        if !(self.hover_release_distance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "hover_release_distance",
                reason: "must be positive",
            });
        }
        if !(self.pointer_range > 0.0) {
            return Err(ConfigError::Invalid {
                field: "pointer_range",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
