//! Keyboard bindings for the view-mode triggers and manual pose control.
//!
//! Uses `leafwing-input-manager`. Trigger presses become
//! [`ViewModeRequests`]; manual axes are written to [`ManualPoseInput`]
//! ahead of the director's systems.

use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::{
    manual::PoseInput,
    mode::ViewMode,
    plugin::{ManualPoseInput, ViewModeRequests, ViewModeSystems},
};

// ============================================================================
// Actions
// ============================================================================

/// View mode actions.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum ViewModeAction {
    /// First-person view (F).
    FpvView,
    /// Ground observer view (Backslash).
    GroundView,
    /// Fly-with-me view (B).
    FlyWithView,
    /// Manual view (M).
    ManualView,
    /// Chase view (Slash).
    SpringArmChaseView,
    /// Rear view (K).
    BackupView,
    /// Rendering off (Minus).
    NoDisplayView,
    /// Front view (I).
    FrontView,
    /// Manual translation (arrow keys).
    #[actionlike(DualAxis)]
    ManualMove,
    /// Manual rise and fall (PageUp/PageDown).
    #[actionlike(Axis)]
    ManualRise,
    /// Manual yaw and pitch (numpad 8/2/4/6).
    #[actionlike(DualAxis)]
    ManualTurn,
}

impl ViewModeAction {
    /// Trigger actions and the mode each requests.
    pub const TRIGGERS: [(ViewModeAction, ViewMode); 8] = [
        (ViewModeAction::FpvView, ViewMode::Fpv),
        (ViewModeAction::GroundView, ViewMode::GroundObserver),
        (ViewModeAction::FlyWithView, ViewMode::FlyWithMe),
        (ViewModeAction::ManualView, ViewMode::Manual),
        (ViewModeAction::SpringArmChaseView, ViewMode::SpringArmChase),
        (ViewModeAction::BackupView, ViewMode::Backup),
        (ViewModeAction::NoDisplayView, ViewMode::NoDisplay),
        (ViewModeAction::FrontView, ViewMode::Front),
    ];

    /// Trigger actions and their default keys.
    pub const TRIGGER_KEYS: [(ViewModeAction, KeyCode); 8] = [
        (ViewModeAction::FpvView, KeyCode::KeyF),
        (ViewModeAction::FlyWithView, KeyCode::KeyB),
        (ViewModeAction::GroundView, KeyCode::Backslash),
        (ViewModeAction::ManualView, KeyCode::KeyM),
        (ViewModeAction::SpringArmChaseView, KeyCode::Slash),
        (ViewModeAction::BackupView, KeyCode::KeyK),
        (ViewModeAction::NoDisplayView, KeyCode::Minus),
        (ViewModeAction::FrontView, KeyCode::KeyI),
    ];

    /// The mode a trigger action requests, `None` for manual axes.
    pub fn mode(self) -> Option<ViewMode> {
        Self::TRIGGERS
            .iter()
            .find(|(action, _)| *action == self)
            .map(|(_, mode)| *mode)
    }
}

// ============================================================================
// Input map
// ============================================================================

/// Create the default input map for view mode actions.
pub fn default_view_mode_input_map() -> InputMap<ViewModeAction> {
    ViewModeAction::TRIGGER_KEYS
        .into_iter()
        .fold(InputMap::default(), |map, (action, key)| map.with(action, key))
        .with_dual_axis(ViewModeAction::ManualMove, VirtualDPad::arrow_keys())
        .with_axis(
            ViewModeAction::ManualRise,
            VirtualAxis::new(KeyCode::PageDown, KeyCode::PageUp),
        )
        .with_dual_axis(ViewModeAction::ManualTurn, VirtualDPad::numpad())
}

// ============================================================================
// Plugin
// ============================================================================

/// Plugin that binds keys to the view-mode director.
pub struct ViewModeInputPlugin;

impl Plugin for ViewModeInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<ViewModeAction>::default())
            .add_systems(Startup, spawn_view_mode_input)
            .add_systems(
                Update,
                (request_view_modes, read_manual_pose_input).before(ViewModeSystems),
            );
    }
}

fn spawn_view_mode_input(mut commands: Commands) {
    commands.spawn((
        Name::new("View mode input"),
        default_view_mode_input_map(),
        ActionState::<ViewModeAction>::default(),
    ));
}

/// Queue a mode request for each trigger pressed this frame.
fn request_view_modes(
    action_query: Query<&ActionState<ViewModeAction>>,
    mut requests: ResMut<ViewModeRequests>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    for (action, mode) in ViewModeAction::TRIGGERS {
        if action_state.just_pressed(&action) {
            tracing::debug!("{} pressed", mode.trigger_name());
            requests.request_mode(mode);
        }
    }
}

/// Copy the manual axes into [`ManualPoseInput`].
fn read_manual_pose_input(
    action_query: Query<&ActionState<ViewModeAction>>,
    mut input: ResMut<ManualPoseInput>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    let pose_input = pose_input_from_axes(
        action_state.clamped_axis_pair(&ViewModeAction::ManualMove),
        action_state.clamped_value(&ViewModeAction::ManualRise),
        action_state.clamped_axis_pair(&ViewModeAction::ManualTurn),
    );
    if input.0 != pose_input {
        input.0 = pose_input;
    }
}

/// Map raw axes to view-space pose input.
///
/// Up on the move pad is forward (−Z); right on the turn pad yaws right.
fn pose_input_from_axes(movement: Vec2, rise: f32, turn: Vec2) -> PoseInput {
    PoseInput {
        translation: Vec3::new(movement.x, rise, -movement.y),
        rotation: Vec3::new(turn.y, -turn.x, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_has_one_trigger() {
        for mode in ViewMode::ALL {
            let count = ViewModeAction::TRIGGERS
                .iter()
                .filter(|(_, m)| *m == mode)
                .count();
            assert_eq!(count, 1, "{mode}");
        }
        assert_eq!(ViewModeAction::ManualMove.mode(), None);
        assert_eq!(
            ViewModeAction::NoDisplayView.mode(),
            Some(ViewMode::NoDisplay)
        );
    }

    #[test]
    fn test_default_trigger_keys() {
        let map = default_view_mode_input_map();
        let expected = [
            (ViewModeAction::FpvView, KeyCode::KeyF),
            (ViewModeAction::FlyWithView, KeyCode::KeyB),
            (ViewModeAction::GroundView, KeyCode::Backslash),
            (ViewModeAction::ManualView, KeyCode::KeyM),
            (ViewModeAction::SpringArmChaseView, KeyCode::Slash),
            (ViewModeAction::BackupView, KeyCode::KeyK),
            (ViewModeAction::NoDisplayView, KeyCode::Minus),
            (ViewModeAction::FrontView, KeyCode::KeyI),
        ];

        for (action, key) in expected {
            let bound: Vec<Box<dyn Buttonlike>> = vec![Box::new(key)];
            assert_eq!(map.get_buttonlike(&action), Some(&bound), "{action:?}");
        }
    }

    #[test]
    fn test_pose_input_from_axes() {
        let input = pose_input_from_axes(Vec2::new(0.0, 1.0), -1.0, Vec2::new(1.0, 0.0));

        assert_eq!(input.translation, Vec3::new(0.0, -1.0, -1.0));
        // Turning right is a negative rotation about up.
        assert_eq!(input.rotation, Vec3::new(0.0, -1.0, 0.0));
        assert!(input.is_active());

        assert!(!pose_input_from_axes(Vec2::ZERO, 0.0, Vec2::ZERO).is_active());
    }
}
