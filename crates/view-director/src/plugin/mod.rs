//! Bevy integration for the view-mode director.
//!
//! Mode changes go through [`ViewModeRequests`]; the request system applies
//! them to the state machine in order, then the tick system advances the
//! current mode. Both are exclusive systems chained in `Update`, so a
//! transition always completes before the tick sees it.

mod world_scene;

use bevy::prelude::*;

use crate::{
    cameras::CameraSet,
    manual::PoseInput,
    mode::ViewMode,
    scene::{Gimbal, ViewModeChanged},
    settings::ViewModeSettings,
    state_machine::ViewModeStateMachine,
};

pub use world_scene::WorldScene;

// ============================================================================
// Requests
// ============================================================================

/// A queued change for the director.
#[derive(Debug, Clone)]
pub enum ViewModeRequest {
    /// Create the state machine for a newly controllable vehicle.
    ///
    /// On a director that already has a machine this is a possession
    /// switch followed by a mode request: the machine keeps its settings
    /// and two mode-changed notifications are raised.
    Initialize {
        /// Mode to start in.
        mode: ViewMode,
        /// Vehicle to follow.
        follow_target: Option<Entity>,
        /// Views the vehicle exposes.
        cameras: CameraSet<Entity>,
    },
    /// Hand the director a different vehicle.
    SwitchPossession {
        /// Vehicle to follow.
        follow_target: Option<Entity>,
        /// Views the vehicle exposes.
        cameras: CameraSet<Entity>,
    },
    /// Switch view mode.
    SetMode(ViewMode),
    /// Change the chase follow distance in meters.
    SetFollowDistance(i32),
    /// Enable or disable chase rotation lag.
    SetRotationLag(bool),
}

/// View mode requests, applied in order on the next update.
#[derive(Resource, Default)]
pub struct ViewModeRequests {
    pending: Vec<ViewModeRequest>,
}

impl ViewModeRequests {
    /// Request initialization for a vehicle.
    pub fn request_initialize(
        &mut self,
        mode: ViewMode,
        follow_target: Option<Entity>,
        cameras: CameraSet<Entity>,
    ) {
        self.pending.push(ViewModeRequest::Initialize {
            mode,
            follow_target,
            cameras,
        });
    }

    /// Request a possession switch.
    pub fn request_switch_possession(
        &mut self,
        follow_target: Option<Entity>,
        cameras: CameraSet<Entity>,
    ) {
        self.pending.push(ViewModeRequest::SwitchPossession {
            follow_target,
            cameras,
        });
    }

    /// Request a mode change.
    pub fn request_mode(&mut self, mode: ViewMode) {
        self.pending.push(ViewModeRequest::SetMode(mode));
    }

    /// Request a new follow distance.
    pub fn request_follow_distance(&mut self, follow_distance: i32) {
        self.pending
            .push(ViewModeRequest::SetFollowDistance(follow_distance));
    }

    /// Request rotation lag on or off.
    pub fn request_rotation_lag(&mut self, enabled: bool) {
        self.pending.push(ViewModeRequest::SetRotationLag(enabled));
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn take(&mut self) -> Vec<ViewModeRequest> {
        std::mem::take(&mut self.pending)
    }
}

// ============================================================================
// Resources and components
// ============================================================================

/// The director's state machine and chase rig entity.
#[derive(Resource, Default)]
pub struct ViewModeDirector {
    machine: Option<ViewModeStateMachine<Entity>>,
    rig: Option<Entity>,
}

impl ViewModeDirector {
    /// Current mode, or `None` before initialization.
    pub fn mode(&self) -> Option<ViewMode> {
        self.machine.as_ref().map(ViewModeStateMachine::mode)
    }

    /// The state machine, once initialized.
    pub fn machine(&self) -> Option<&ViewModeStateMachine<Entity>> {
        self.machine.as_ref()
    }

    /// The chase rig entity, once spawned.
    pub fn rig(&self) -> Option<Entity> {
        self.rig
    }
}

/// Display state of a view.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOutput {
    /// Presented in the viewport.
    pub on_screen: bool,
    /// Main render output running.
    pub main_output: bool,
}

impl Default for ViewOutput {
    fn default() -> Self {
        Self {
            on_screen: false,
            main_output: true,
        }
    }
}

impl ViewOutput {
    /// On screen with its main output running.
    pub fn is_displayed(&self) -> bool {
        self.on_screen && self.main_output
    }
}

/// Gimbal properties of a vehicle-mounted view.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewGimbal(pub Gimbal);

/// Vehicle a mounted view belongs to.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOwner(pub Option<Entity>);

/// Whether world rendering is suppressed.
#[derive(Resource, Default, Debug)]
pub struct ViewportRendering {
    /// Set while the viewport draws nothing (the no-display mode).
    pub disabled: bool,
}

/// Most recent mode-changed notification.
#[derive(Resource, Default, Debug)]
pub struct ViewModeStatus {
    last: Option<ViewModeChanged>,
    changes: u64,
}

impl ViewModeStatus {
    /// The last notification raised.
    pub fn last(&self) -> Option<ViewModeChanged> {
        self.last
    }

    /// Number of notifications raised so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }

    fn record(&mut self, changed: ViewModeChanged) {
        self.last = Some(changed);
        self.changes += 1;
    }
}

/// Manual pose input, handed to the manual controller before each tick.
#[derive(Resource, Default, Debug)]
pub struct ManualPoseInput(pub PoseInput);

/// Systems that apply requests and advance the current mode.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewModeSystems;

// ============================================================================
// Plugin
// ============================================================================

/// Plugin that runs the view-mode director.
pub struct ViewModePlugin;

impl Plugin for ViewModePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewModeSettings>()
            .init_resource::<ViewModeRequests>()
            .init_resource::<ViewModeDirector>()
            .init_resource::<ViewportRendering>()
            .init_resource::<ViewModeStatus>()
            .init_resource::<ManualPoseInput>()
            .add_systems(
                Update,
                (
                    process_view_mode_requests,
                    tick_view_mode,
                    sync_camera_activity,
                )
                    .chain()
                    .in_set(ViewModeSystems),
            );
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Apply queued requests to the state machine.
fn process_view_mode_requests(world: &mut World) {
    let requests = world.resource_mut::<ViewModeRequests>().take();
    if requests.is_empty() {
        return;
    }

    world.resource_scope(|world, mut director: Mut<ViewModeDirector>| {
        for request in requests {
            apply_request(world, &mut director, request);
        }
    });
}

fn apply_request(world: &mut World, director: &mut ViewModeDirector, request: ViewModeRequest) {
    let request = match request {
        ViewModeRequest::Initialize {
            mode,
            follow_target,
            cameras,
        } => {
            // An initialized director re-targets its machine so the rig is
            // detached through the normal exit path.
            if let Some(machine) = director.machine.as_mut() {
                let mut scene = WorldScene::new(world);
                let possession = machine.switch_possession(&mut scene, follow_target, cameras);
                let requested = machine.request_mode(&mut scene, mode);
                if let Err(err) = possession.and(requested) {
                    tracing::debug!("View mode re-initialization not applied: {err}");
                }
                return;
            }

            let rig = *director.rig.get_or_insert_with(|| {
                world
                    .spawn((Name::new("View director rig"), Transform::default()))
                    .id()
            });
            let settings = world
                .get_resource::<ViewModeSettings>()
                .cloned()
                .unwrap_or_default();
            let mut scene = WorldScene::new(world);
            director.machine = Some(ViewModeStateMachine::initialize(
                &mut scene,
                mode,
                rig,
                follow_target,
                cameras,
                settings,
            ));
            return;
        }
        other => other,
    };

    let Some(machine) = director.machine.as_mut() else {
        tracing::warn!("Ignoring {request:?}: view director is not initialized");
        return;
    };

    let mut scene = WorldScene::new(world);
    let result = match request {
        ViewModeRequest::SwitchPossession {
            follow_target,
            cameras,
        } => machine.switch_possession(&mut scene, follow_target, cameras),
        ViewModeRequest::SetMode(mode) => machine.set_mode(&mut scene, mode),
        ViewModeRequest::SetFollowDistance(follow_distance) => {
            machine.set_follow_distance(follow_distance);
            Ok(())
        }
        ViewModeRequest::SetRotationLag(enabled) => {
            machine.set_camera_rotation_lag_enabled(enabled);
            Ok(())
        }
        // Handled above.
        ViewModeRequest::Initialize { .. } => Ok(()),
    };

    // The state machine has already logged the failure.
    if let Err(err) = result {
        tracing::debug!("View mode request not applied: {err}");
    }
}

/// Advance the current mode by one frame.
fn tick_view_mode(world: &mut World) {
    let dt = world.get_resource::<Time>().map_or(0.0, Time::delta_secs);
    let input = world.resource::<ManualPoseInput>().0;

    world.resource_scope(|world, mut director: Mut<ViewModeDirector>| {
        let Some(machine) = director.machine.as_mut() else {
            return;
        };
        machine.manual_mut().set_input(input);
        machine.tick(&mut WorldScene::new(world), dt);
    });
}

/// Mirror view display state onto the cameras.
fn sync_camera_activity(
    rendering: Res<ViewportRendering>,
    mut views: Query<(&ViewOutput, &mut Camera)>,
) {
    for (output, mut camera) in &mut views {
        let active = output.is_displayed() && !rendering.disabled;
        if camera.is_active != active {
            camera.is_active = active;
        }
    }
}
