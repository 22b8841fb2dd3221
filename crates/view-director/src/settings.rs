//! View-mode configuration.
//!
//! Set once by the owning environment (or loaded from a settings file) and
//! read by transition logic.

use bevy::prelude::Resource;
use serde::Deserialize;

/// Default distance the chase view sits behind the rig, in meters.
pub const DEFAULT_FOLLOW_DISTANCE: i32 = 3;
/// Default rotation lag speed (fraction of the remaining angle per second).
pub const DEFAULT_ROTATION_LAG_SPEED: f32 = 10.0;

/// Settings for the view-mode director.
#[derive(Resource, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewModeSettings {
    /// How far behind the rig the chase view sits, in meters.
    pub follow_distance: i32,
    /// Whether the rig heading eases toward the vehicle heading.
    ///
    /// Customary for ground vehicles; without it the view can shake.
    pub rotation_lag_enabled: bool,
    /// Rotation lag speed, used when lag is enabled.
    pub rotation_lag_speed: f32,
    /// Manual pose controller tuning.
    pub manual: ManualPoseSettings,
}

impl Default for ViewModeSettings {
    fn default() -> Self {
        Self {
            follow_distance: DEFAULT_FOLLOW_DISTANCE,
            rotation_lag_enabled: false,
            rotation_lag_speed: DEFAULT_ROTATION_LAG_SPEED,
            manual: ManualPoseSettings::default(),
        }
    }
}

/// Tuning for manual pose edits.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ManualPoseSettings {
    /// Base translation speed in meters per second.
    pub translation_speed: f32,
    /// Rotation speed in degrees per second.
    pub rotation_speed_degrees: f32,
    /// Per-update growth of the acceleration factor while input is held.
    pub acceleration_growth: f32,
    /// Upper bound for the acceleration factor.
    pub max_acceleration: f32,
}

impl Default for ManualPoseSettings {
    fn default() -> Self {
        Self {
            translation_speed: 3.0,
            rotation_speed_degrees: 45.0,
            acceleration_growth: 1.1,
            max_acceleration: 20.0,
        }
    }
}
