//! View modes and the per-mode dispatch table.

use std::{fmt, str::FromStr};

use crate::{
    cameras::ViewSlot,
    error::{Error, Result},
};

/// Camera view mode.
///
/// Change modes through [`crate::ViewModeStateMachine::request_mode`] or one
/// of its named triggers, never by assigning a mode directly.
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug, Hash)]
#[cfg_attr(not(target_family = "wasm"), derive(clap::ValueEnum))]
pub enum ViewMode {
    /// Egocentric view from the vehicle.
    #[default]
    Fpv,
    /// External view parked at a fixed offset, altitude held.
    GroundObserver,
    /// External view on the rig, flying at a fixed world offset.
    FlyWithMe,
    /// External view driven by manual pose input.
    Manual,
    /// External view on the rig, chasing behind the vehicle.
    SpringArmChase,
    /// Rear view.
    Backup,
    /// All views off and world rendering disabled.
    NoDisplay,
    /// Front view.
    Front,
}

/// Which behavior drives the views during a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeDriver {
    /// Manual pose controller moves its owned view.
    ManualPose,
    /// The rig carries the external view; only rotation lag runs.
    Rig,
    /// Follow behavior moves the rig, which carries the external view.
    RigFollow,
    /// Follow behavior moves the external view directly.
    Follow,
    /// Nothing moves.
    Idle,
}

impl ViewMode {
    /// All modes, in index order.
    pub const ALL: [ViewMode; 8] = [
        ViewMode::Fpv,
        ViewMode::GroundObserver,
        ViewMode::FlyWithMe,
        ViewMode::Manual,
        ViewMode::SpringArmChase,
        ViewMode::Backup,
        ViewMode::NoDisplay,
        ViewMode::Front,
    ];

    /// Convert a raw mode index (0..=7) into a mode.
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| Error::InvalidModeConfiguration {
                value: index.to_string(),
            })
    }

    /// The stable raw index of this mode.
    pub fn index(self) -> u8 {
        match self {
            ViewMode::Fpv => 0,
            ViewMode::GroundObserver => 1,
            ViewMode::FlyWithMe => 2,
            ViewMode::Manual => 3,
            ViewMode::SpringArmChase => 4,
            ViewMode::Backup => 5,
            ViewMode::NoDisplay => 6,
            ViewMode::Front => 7,
        }
    }

    /// The view this mode puts on screen, or needs present.
    ///
    /// NoDisplay shows nothing but still requires the external view.
    pub fn primary_slot(self) -> ViewSlot {
        match self {
            ViewMode::Fpv => ViewSlot::Fpv,
            ViewMode::Backup => ViewSlot::Backup,
            ViewMode::Front => ViewSlot::Front,
            ViewMode::GroundObserver
            | ViewMode::FlyWithMe
            | ViewMode::Manual
            | ViewMode::SpringArmChase
            | ViewMode::NoDisplay => ViewSlot::External,
        }
    }

    /// Whether the external view is carried by the chase rig in this mode.
    pub fn is_rig_driven(self) -> bool {
        matches!(self, ViewMode::SpringArmChase | ViewMode::FlyWithMe)
    }

    /// Per-frame behavior for this mode.
    pub fn driver(self) -> ModeDriver {
        match self {
            ViewMode::Manual => ModeDriver::ManualPose,
            ViewMode::SpringArmChase => ModeDriver::Rig,
            ViewMode::FlyWithMe => ModeDriver::RigFollow,
            ViewMode::NoDisplay => ModeDriver::Idle,
            ViewMode::Fpv | ViewMode::GroundObserver | ViewMode::Backup | ViewMode::Front => {
                ModeDriver::Follow
            }
        }
    }

    /// Name of the user-facing trigger that requests this mode.
    pub fn trigger_name(self) -> &'static str {
        match self {
            ViewMode::Fpv => "fpv_view",
            ViewMode::GroundObserver => "ground_view",
            ViewMode::FlyWithMe => "fly_with_view",
            ViewMode::Manual => "manual_view",
            ViewMode::SpringArmChase => "spring_arm_chase_view",
            ViewMode::Backup => "backup_view",
            ViewMode::NoDisplay => "no_display_view",
            ViewMode::Front => "front_view",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::Fpv => "FPV",
            ViewMode::GroundObserver => "GroundObserver",
            ViewMode::FlyWithMe => "FlyWithMe",
            ViewMode::Manual => "Manual",
            ViewMode::SpringArmChase => "SpringArmChase",
            ViewMode::Backup => "Backup",
            ViewMode::NoDisplay => "NoDisplay",
            ViewMode::Front => "Front",
        };
        f.write_str(name)
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    /// Accepts a raw index or a mode name (case, `-` and `_` ignored).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<u8>() {
            return Self::from_index(index);
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "fpv" => Ok(ViewMode::Fpv),
            "groundobserver" | "ground" => Ok(ViewMode::GroundObserver),
            "flywithme" | "flywith" => Ok(ViewMode::FlyWithMe),
            "manual" => Ok(ViewMode::Manual),
            "springarmchase" | "chase" => Ok(ViewMode::SpringArmChase),
            "backup" => Ok(ViewMode::Backup),
            "nodisplay" => Ok(ViewMode::NoDisplay),
            "front" => Ok(ViewMode::Front),
            _ => Err(Error::InvalidModeConfiguration {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_covers_all_modes() {
        for mode in ViewMode::ALL {
            assert_eq!(ViewMode::from_index(mode.index()), Ok(mode));
        }
    }

    #[test]
    fn test_unknown_index_is_invalid_configuration() {
        assert_eq!(
            ViewMode::from_index(8),
            Err(Error::InvalidModeConfiguration {
                value: "8".to_string()
            })
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("spring-arm-chase".parse(), Ok(ViewMode::SpringArmChase));
        assert_eq!("No_Display".parse(), Ok(ViewMode::NoDisplay));
        assert_eq!("4".parse(), Ok(ViewMode::SpringArmChase));
        assert!("orbit".parse::<ViewMode>().is_err());
    }

    #[test]
    fn test_driver_table() {
        assert_eq!(ViewMode::Manual.driver(), ModeDriver::ManualPose);
        assert_eq!(ViewMode::SpringArmChase.driver(), ModeDriver::Rig);
        assert_eq!(ViewMode::FlyWithMe.driver(), ModeDriver::RigFollow);
        assert_eq!(ViewMode::NoDisplay.driver(), ModeDriver::Idle);
        assert_eq!(ViewMode::GroundObserver.driver(), ModeDriver::Follow);

        // Only the two rig modes carry the external view on the rig.
        let rig_modes: Vec<_> = ViewMode::ALL
            .into_iter()
            .filter(|mode| mode.is_rig_driven())
            .collect();
        assert_eq!(rig_modes, vec![ViewMode::FlyWithMe, ViewMode::SpringArmChase]);
    }
}
