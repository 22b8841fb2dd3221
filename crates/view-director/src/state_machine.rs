//! The view-mode state machine.
//!
//! Owns the current [`ViewMode`] and every transition between modes.
//!
//! ## Transition order
//!
//! A request runs, in order:
//!
//! 1. Availability check. A mode whose view is missing is rejected before
//!    anything changes.
//! 2. Exit actions for the current mode. These capture the continuity anchor,
//!    detach the rig, restore rendering and revoke manual ownership.
//! 3. Entry actions for the new mode. These seat the manual view, attach
//!    the rig or suppress rendering.
//! 4. Display toggles. The primary view goes on screen and every other view
//!    is disabled.
//! 5. Commit, then the mode-changed notification. The notification is raised
//!    for failed requests and re-requests too.
//!
//! ## Frame update
//!
//! [`ViewModeStateMachine::tick`] dispatches on [`ViewMode::driver`]:
//!
//! ```text
//! Manual              -> manual pose controller
//! SpringArmChase      -> rig (rotation lag only)
//! FlyWithMe           -> follow behavior on the rig, then rig
//! NoDisplay           -> nothing
//! FPV, GroundObserver,
//! Backup, Front       -> follow behavior on the external view
//! ```

use std::fmt;

use crate::{
    cameras::{CameraSet, ViewSlot},
    chase_rig::{AttachmentState, ChaseRig},
    error::{Error, Result},
    follow::FollowBehavior,
    manual::ManualPoseController,
    mode::{ModeDriver, ViewMode},
    pose::Pose,
    scene::{CameraScene, ViewModeChanged},
    settings::ViewModeSettings,
};

/// Switches the observer between camera view modes.
#[derive(Debug)]
pub struct ViewModeStateMachine<N> {
    mode: ViewMode,
    cameras: CameraSet<N>,
    follow_target: Option<N>,
    rig: ChaseRig<N>,
    follow: FollowBehavior,
    manual: ManualPoseController<N>,
    settings: ViewModeSettings,
    /// World pose of the last visible camera, captured by exit actions.
    continuity_anchor: Option<Pose>,
    /// External view pose at the last possession switch.
    camera_start: Pose,
}

impl<N: Copy + Eq + fmt::Debug> ViewModeStateMachine<N> {
    /// Create the state machine for a newly controllable vehicle and enter
    /// `mode`.
    ///
    /// `rig` is the scene node used as the chase rig. If the initial mode's
    /// view is missing, the failure is logged and the machine stays in
    /// `mode` without any view on screen.
    ///
    /// The new machine knows nothing of an earlier one on the same rig. To
    /// re-target a running machine use [`Self::switch_possession`], which
    /// detaches the external view first.
    pub fn initialize<S: CameraScene<Node = N>>(
        scene: &mut S,
        mode: ViewMode,
        rig: N,
        follow_target: Option<N>,
        cameras: CameraSet<N>,
        settings: ViewModeSettings,
    ) -> Self {
        let mut machine = Self {
            mode,
            cameras: CameraSet::default(),
            follow_target: None,
            rig: ChaseRig::new(rig, &settings),
            follow: FollowBehavior::default(),
            manual: ManualPoseController::new(settings.manual.clone()),
            settings,
            continuity_anchor: None,
            camera_start: Pose::IDENTITY,
        };

        if let Err(err) = machine.switch_possession(scene, follow_target, cameras) {
            tracing::warn!("Initial view mode {mode} not entered: {err}");
        }
        tracing::info!("View director initialized in {} mode", machine.mode);
        machine
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The current mode.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The views in use.
    pub fn cameras(&self) -> &CameraSet<N> {
        &self.cameras
    }

    /// The actor being followed.
    pub fn follow_target(&self) -> Option<N> {
        self.follow_target
    }

    /// Current settings.
    pub fn settings(&self) -> &ViewModeSettings {
        &self.settings
    }

    /// The chase rig.
    pub fn rig(&self) -> &ChaseRig<N> {
        &self.rig
    }

    /// Chase rig attachment state.
    pub fn attachment(&self) -> AttachmentState<N> {
        self.rig.state()
    }

    /// Follow behavior state.
    pub fn follow(&self) -> &FollowBehavior {
        &self.follow
    }

    /// The view owned by the manual pose controller.
    pub fn manual_owner(&self) -> Option<N> {
        self.manual.owner()
    }

    /// The manual pose controller, for feeding input or claiming ownership.
    pub fn manual_mut(&mut self) -> &mut ManualPoseController<N> {
        &mut self.manual
    }

    /// Anchor captured by the most recent transition, if any.
    pub fn continuity_anchor(&self) -> Option<Pose> {
        self.continuity_anchor
    }

    /// External view pose captured at the last possession switch.
    pub fn camera_start(&self) -> Pose {
        self.camera_start
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Set the chase follow distance in meters. Applies on the next entry
    /// into a rig-driven mode.
    pub fn set_follow_distance(&mut self, follow_distance: i32) {
        self.settings.follow_distance = follow_distance;
        self.rig.set_follow_distance(follow_distance);
    }

    /// Enable or disable chase rig rotation lag.
    pub fn set_camera_rotation_lag_enabled(&mut self, enabled: bool) {
        self.settings.rotation_lag_enabled = enabled;
        self.rig.set_rotation_lag_enabled(enabled);
    }

    // ------------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------------

    /// Request a mode through its named trigger.
    pub fn set_mode<S: CameraScene<Node = N>>(&mut self, scene: &mut S, mode: ViewMode) -> Result<()> {
        match mode {
            ViewMode::Fpv => self.fpv_view(scene),
            ViewMode::GroundObserver => self.ground_view(scene),
            ViewMode::FlyWithMe => self.fly_with_view(scene),
            ViewMode::Manual => self.manual_view(scene),
            ViewMode::SpringArmChase => self.spring_arm_chase_view(scene),
            ViewMode::Backup => self.backup_view(scene),
            ViewMode::NoDisplay => self.no_display_view(scene),
            ViewMode::Front => self.front_view(scene),
        }
    }

    /// Trigger: first-person view.
    pub fn fpv_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::Fpv)
    }

    /// Trigger: ground observer view.
    pub fn ground_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::GroundObserver)
    }

    /// Trigger: fly-with-me view.
    pub fn fly_with_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::FlyWithMe)
    }

    /// Trigger: manual view.
    pub fn manual_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::Manual)
    }

    /// Trigger: chase view.
    pub fn spring_arm_chase_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::SpringArmChase)
    }

    /// Trigger: rear view.
    pub fn backup_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::Backup)
    }

    /// Trigger: rendering off.
    pub fn no_display_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::NoDisplay)
    }

    /// Trigger: front view.
    pub fn front_view<S: CameraScene<Node = N>>(&mut self, scene: &mut S) -> Result<()> {
        self.request_mode(scene, ViewMode::Front)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Switch to `mode`. The only way the mode changes.
    ///
    /// Raises the mode-changed notification exactly once, whether or not
    /// the request succeeds.
    pub fn request_mode<S: CameraScene<Node = N>>(&mut self, scene: &mut S, mode: ViewMode) -> Result<()> {
        let result = self.transition(scene, mode);
        if let Err(err) = &result {
            tracing::warn!("View mode {mode} rejected: {err}");
        }
        scene.view_mode_changed(ViewModeChanged::for_mode(self.mode));
        result
    }

    fn transition<S: CameraScene<Node = N>>(&mut self, scene: &mut S, mode: ViewMode) -> Result<()> {
        let required = mode.primary_slot();
        if self.cameras.get(required).is_none() {
            return Err(Error::CameraUnavailable {
                mode,
                view: required,
            });
        }

        let previous = self.mode;
        self.exit_mode(scene, previous, mode);
        self.enter_mode(scene, mode);
        self.apply_display(scene, mode);
        self.mode = mode;

        if previous == mode {
            tracing::debug!("Re-entered {mode} view mode");
        } else {
            tracing::info!("Transitioned from {previous} to {mode} view mode");
        }
        Ok(())
    }

    /// Undo whatever `from` set up, capturing the continuity anchor first.
    fn exit_mode<S: CameraScene<Node = N>>(&mut self, scene: &mut S, from: ViewMode, to: ViewMode) {
        self.continuity_anchor = None;

        if from == ViewMode::Fpv
            && let Some(fpv) = self.cameras.fpv
        {
            self.continuity_anchor = Some(scene.world_pose(fpv));
        }

        if from.is_rig_driven()
            && !to.is_rig_driven()
            && let Some(external) = self.cameras.external
        {
            self.continuity_anchor = Some(scene.world_pose(external));
            self.rig.detach(scene, external);
        }

        if from == ViewMode::NoDisplay && to != ViewMode::NoDisplay {
            scene.set_rendering_disabled(false);
        }

        // Only revoke our own grant; another claimant keeps its ownership.
        if to != ViewMode::Manual
            && let Some(external) = self.cameras.external
            && self.manual.owner() == Some(external)
        {
            self.manual.set_owner(None);
            tracing::debug!("Revoked manual ownership of {:?}", external);
        }
    }

    fn enter_mode<S: CameraScene<Node = N>>(&mut self, scene: &mut S, mode: ViewMode) {
        match mode {
            ViewMode::Manual => {
                if let Some(external) = self.cameras.external {
                    let pose = self.continuity_anchor.unwrap_or(self.camera_start);
                    scene.set_world_pose(external, pose);
                    self.manual.set_owner(Some(external));
                }
            }
            ViewMode::SpringArmChase | ViewMode::FlyWithMe => {
                if let Some(external) = self.cameras.external {
                    self.rig.attach(scene, external, self.follow_target);
                }
            }
            ViewMode::NoDisplay => {
                scene.set_rendering_disabled(true);
            }
            ViewMode::Fpv | ViewMode::GroundObserver | ViewMode::Backup | ViewMode::Front => {}
        }
    }

    /// Show the mode's primary view and disable every other view.
    fn apply_display<S: CameraScene<Node = N>>(&mut self, scene: &mut S, mode: ViewMode) {
        let primary = match mode {
            ViewMode::NoDisplay => None,
            _ => self.cameras.get(mode.primary_slot()),
        };

        if let Some(view) = primary {
            scene.show_on_screen(view);
        }
        for (_, view) in self.cameras.present() {
            if Some(view) != primary {
                scene.disable_main_output(view);
            }
        }

        match mode {
            ViewMode::GroundObserver => self.follow.set_altitude_locked(true),
            ViewMode::FlyWithMe => self.follow.set_altitude_locked(false),
            _ => {}
        }
    }

    /// Hand the director a new vehicle and re-enter the current mode.
    ///
    /// Captures the external view's current pose as the camera-start pose
    /// and its offset from the new target as the follow offset.
    pub fn switch_possession<S: CameraScene<Node = N>>(
        &mut self,
        scene: &mut S,
        follow_target: Option<N>,
        cameras: CameraSet<N>,
    ) -> Result<()> {
        if self.mode.is_rig_driven()
            && let Some(external) = self.cameras.external
        {
            self.rig.detach(scene, external);
        }

        self.follow_target = follow_target;
        self.cameras = cameras;

        if let Some(fpv) = cameras.fpv {
            scene.set_view_owner(fpv, follow_target);
        }

        self.camera_start = cameras
            .external
            .map_or(Pose::IDENTITY, |external| scene.world_pose(external));
        let target_position = follow_target.map(|target| scene.world_pose(target).translation);
        self.follow
            .capture(self.camera_start.translation, target_position);

        tracing::info!(
            "Possessed {:?}; follow offset {:?}",
            follow_target,
            self.follow.offset()
        );

        self.request_mode(scene, self.mode)
    }

    // ------------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------------

    /// Advance whichever behavior drives the current mode.
    pub fn tick<S: CameraScene<Node = N>>(&mut self, scene: &mut S, dt: f32) {
        match self.mode.driver() {
            ModeDriver::ManualPose => self.manual.update(scene, dt),
            ModeDriver::Rig => self.rig.update(scene, self.follow_target, dt),
            ModeDriver::RigFollow => {
                self.follow
                    .update(scene, self.rig.node(), self.follow_target);
                self.rig.update(scene, self.follow_target, dt);
            }
            ModeDriver::Follow => {
                if let Some(external) = self.cameras.external {
                    self.follow.update(scene, external, self.follow_target);
                }
            }
            ModeDriver::Idle => {}
        }
    }

    // ------------------------------------------------------------------------
    // FPV gimbal pass-throughs
    // ------------------------------------------------------------------------

    fn require_fpv(&self) -> Result<N> {
        self.cameras.fpv.ok_or(Error::CameraUnavailable {
            mode: self.mode,
            view: ViewSlot::Fpv,
        })
    }

    /// Whether the FPV gimbal is enabled.
    pub fn fpv_gimbal_enabled<S: CameraScene<Node = N>>(&self, scene: &S) -> Result<bool> {
        Ok(scene.gimbal(self.require_fpv()?).enabled)
    }

    /// Enable or disable the FPV gimbal.
    pub fn set_fpv_gimbal_enabled<S: CameraScene<Node = N>>(&self, scene: &mut S, enabled: bool) -> Result<()> {
        let fpv = self.require_fpv()?;
        let mut gimbal = scene.gimbal(fpv);
        gimbal.enabled = enabled;
        scene.set_gimbal(fpv, gimbal);
        Ok(())
    }

    /// Set FPV gimbal stabilization, clamped to `[0, 1]`.
    pub fn set_fpv_gimbal_stabilization<S: CameraScene<Node = N>>(
        &self,
        scene: &mut S,
        stabilization: f32,
    ) -> Result<()> {
        let fpv = self.require_fpv()?;
        let mut gimbal = scene.gimbal(fpv);
        gimbal.stabilization = stabilization.clamp(0.0, 1.0);
        scene.set_gimbal(fpv, gimbal);
        Ok(())
    }

    /// FPV gimbal pitch in degrees.
    pub fn fpv_gimbal_pitch<S: CameraScene<Node = N>>(&self, scene: &S) -> Result<f32> {
        Ok(scene.gimbal(self.require_fpv()?).pitch)
    }

    /// Set FPV gimbal pitch in degrees.
    pub fn set_fpv_gimbal_pitch<S: CameraScene<Node = N>>(&self, scene: &mut S, pitch: f32) -> Result<()> {
        let fpv = self.require_fpv()?;
        let mut gimbal = scene.gimbal(fpv);
        gimbal.pitch = pitch;
        scene.set_gimbal(fpv, gimbal);
        Ok(())
    }
}
