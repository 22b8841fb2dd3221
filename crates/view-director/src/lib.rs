//! Camera view-mode director for a vehicle simulator.
//!
//! Switches an observer between first-person, chase, follow, manual, fixed
//! vehicle-mounted and no-display views, keeping exactly one view on screen
//! and the shared external view parented correctly for each mode.
//!
//! The state machine is engine-agnostic: it drives the scene through
//! [`scene::CameraScene`]. [`scene::MemoryScene`] backs the headless
//! simulator and the tests; [`plugin::ViewModePlugin`] runs the director
//! inside a Bevy app.

pub mod cameras;
pub mod chase_rig;
pub mod error;
pub mod follow;
pub mod input;
pub mod manual;
pub mod mode;
pub mod plugin;
pub mod pose;
pub mod scene;
pub mod settings;
mod state_machine;

pub use cameras::{CameraSet, ViewSlot};
pub use error::{Error, Result};
pub use mode::{ModeDriver, ViewMode};
pub use pose::{KeepTransform, Pose};
pub use settings::{ManualPoseSettings, ViewModeSettings};
pub use state_machine::ViewModeStateMachine;
