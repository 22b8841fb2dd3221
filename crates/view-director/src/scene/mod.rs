//! Engine services the director drives.
//!
//! The director owns no rendering, no input polling and no scene graph. It
//! reaches all of those through [`CameraScene`], implemented by
//! [`MemoryScene`] for headless runs and by [`crate::plugin::WorldScene`]
//! for Bevy.

mod memory;

use std::fmt;

pub use memory::{MemoryScene, NodeId};

use crate::{
    mode::ViewMode,
    pose::{KeepTransform, Pose},
};

/// Pass-through gimbal properties of a view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gimbal {
    /// Whether the gimbal holds the view steady against vehicle motion.
    pub enabled: bool,
    /// Stabilization strength, 0 (none) to 1 (full).
    pub stabilization: f32,
    /// Gimbal pitch in degrees.
    pub pitch: f32,
}

impl Default for Gimbal {
    fn default() -> Self {
        Self {
            enabled: false,
            stabilization: 0.5,
            pitch: 0.0,
        }
    }
}

/// Notification raised after every mode request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewModeChanged {
    /// The mode in effect after the request.
    pub mode: ViewMode,
    /// Whether world rendering should be suppressed.
    pub no_display: bool,
}

impl ViewModeChanged {
    /// Build the notification for a mode.
    pub fn for_mode(mode: ViewMode) -> Self {
        Self {
            mode,
            no_display: mode == ViewMode::NoDisplay,
        }
    }
}

/// Scene graph, display and render services used by the director.
///
/// All calls happen on the simulation thread, between frames.
pub trait CameraScene {
    /// Handle to a node (view, rig, or actor).
    type Node: Copy + Eq + fmt::Debug;

    /// World-space pose of a node.
    fn world_pose(&self, node: Self::Node) -> Pose;

    /// Move a node so that its world-space pose becomes `pose`.
    fn set_world_pose(&mut self, node: Self::Node, pose: Pose);

    /// Pose of a node relative to its parent.
    fn local_pose(&self, node: Self::Node) -> Pose;

    /// Set a node's pose relative to its parent.
    fn set_local_pose(&mut self, node: Self::Node, pose: Pose);

    /// Current parent of a node, `None` at the scene root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Move a node under `parent` (or the scene root), keeping either its
    /// world or its relative transform.
    fn reparent(&mut self, node: Self::Node, parent: Option<Self::Node>, keep: KeepTransform);

    /// Put a view on screen.
    fn show_on_screen(&mut self, view: Self::Node);

    /// Stop a view's main render output.
    fn disable_main_output(&mut self, view: Self::Node);

    /// Suppress or restore all world rendering in the viewport.
    fn set_rendering_disabled(&mut self, disabled: bool);

    /// Gimbal properties of a view.
    fn gimbal(&self, view: Self::Node) -> Gimbal;

    /// Replace a view's gimbal properties.
    fn set_gimbal(&mut self, view: Self::Node, gimbal: Gimbal);

    /// Tell a vehicle-mounted view which actor it belongs to.
    fn set_view_owner(&mut self, view: Self::Node, owner: Option<Self::Node>);

    /// Receive the mode-changed notification.
    fn view_mode_changed(&mut self, changed: ViewModeChanged);
}
