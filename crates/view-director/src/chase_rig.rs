//! Chase rig: an offset carrier that drags the external view with a target.
//!
//! Attaching moves the view onto the rig. The view first leaves its current
//! parent keeping its world pose (no jump), then joins the rig keeping its
//! relative pose so the fixed chase offset applies. Detaching puts the view
//! back under the parent it had before attaching.
//!
//! The rig follows only the target's heading. Pitch and roll of the target
//! never reach the chase view.

use std::fmt;

use glam::{Quat, Vec3};

use crate::{
    pose::{KeepTransform, Pose},
    scene::CameraScene,
    settings::ViewModeSettings,
};

/// Where the rig sits relative to the target origin, in meters.
pub const RIG_MOUNT_OFFSET: Vec3 = Vec3::new(0.0, 0.34, 0.0);
/// Fixed downward tilt of the chase view, in degrees.
pub const CHASE_TILT_DEGREES: f32 = -10.0;

/// Whether the external view rides the rig, and where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentState<N> {
    /// The view is parented to the rig.
    pub attached: bool,
    /// Parent the view had before it was attached; restored on detach.
    pub prior_parent: Option<N>,
}

impl<N> Default for AttachmentState<N> {
    fn default() -> Self {
        Self {
            attached: false,
            prior_parent: None,
        }
    }
}

/// The chase rig and its attachment bookkeeping.
#[derive(Debug)]
pub struct ChaseRig<N> {
    rig: N,
    state: AttachmentState<N>,
    follow_distance: i32,
    rotation_lag_enabled: bool,
    rotation_lag_speed: f32,
    /// Smoothed rig heading; `None` until the first lagged update.
    lagged_heading: Option<Quat>,
}

impl<N: Copy + Eq + fmt::Debug> ChaseRig<N> {
    /// Wrap an existing rig node.
    pub fn new(rig: N, settings: &ViewModeSettings) -> Self {
        Self {
            rig,
            state: AttachmentState::default(),
            follow_distance: settings.follow_distance,
            rotation_lag_enabled: settings.rotation_lag_enabled,
            rotation_lag_speed: settings.rotation_lag_speed,
            lagged_heading: None,
        }
    }

    /// The rig node.
    pub fn node(&self) -> N {
        self.rig
    }

    /// Current attachment state.
    pub fn state(&self) -> AttachmentState<N> {
        self.state
    }

    /// Whether `view` is currently parented to the rig.
    pub fn is_attached<S: CameraScene<Node = N>>(&self, scene: &S, view: N) -> bool {
        scene.parent(view) == Some(self.rig)
    }

    /// Set how far behind the rig the view sits. Applies on the next attach.
    pub fn set_follow_distance(&mut self, follow_distance: i32) {
        self.follow_distance = follow_distance;
    }

    /// Enable or disable rotation lag. The next update snaps or eases from
    /// the target's current heading.
    pub fn set_rotation_lag_enabled(&mut self, enabled: bool) {
        self.rotation_lag_enabled = enabled;
        self.lagged_heading = None;
    }

    /// Local pose of the view on the rig: backward by the follow distance,
    /// tilted down.
    #[allow(clippy::cast_precision_loss)]
    pub fn chase_local_pose(&self) -> Pose {
        Pose::new(
            Vec3::new(0.0, 0.0, self.follow_distance as f32),
            Quat::from_rotation_x(CHASE_TILT_DEGREES.to_radians()),
        )
    }

    /// Attach `view` to the rig and mount the rig on `target`.
    ///
    /// The chase offset, tilt and heading are reapplied on every call, not
    /// only when the view was newly attached.
    pub fn attach<S: CameraScene<Node = N>>(
        &mut self,
        scene: &mut S,
        view: N,
        target: Option<N>,
    ) -> AttachmentState<N> {
        if !self.is_attached(scene, view) {
            match target {
                Some(target) => scene.reparent(self.rig, Some(target), KeepTransform::Relative),
                None => {
                    tracing::debug!("No follow target; chase rig stays in place");
                    scene.reparent(self.rig, None, KeepTransform::World);
                }
            }

            self.state.prior_parent = scene.parent(view);
            scene.reparent(view, None, KeepTransform::World);
            scene.reparent(view, Some(self.rig), KeepTransform::Relative);
            tracing::debug!(
                "Attached {:?} to chase rig (prior parent: {:?})",
                view,
                self.state.prior_parent
            );
        }

        if let Some(target) = target {
            scene.set_local_pose(self.rig, Pose::from_translation(RIG_MOUNT_OFFSET));
            let heading = heading_of(scene.world_pose(target).rotation);
            self.set_heading(scene, heading);
            self.lagged_heading = Some(heading);
        }
        scene.set_local_pose(view, self.chase_local_pose());

        self.state.attached = true;
        self.state
    }

    /// Detach `view` from the rig, returning it to its prior parent.
    ///
    /// Keeps the view's relative pose. No-op when the view is not attached.
    pub fn detach<S: CameraScene<Node = N>>(&mut self, scene: &mut S, view: N) -> AttachmentState<N> {
        if self.is_attached(scene, view) {
            scene.reparent(view, None, KeepTransform::Relative);
            scene.reparent(view, self.state.prior_parent, KeepTransform::Relative);
            tracing::debug!(
                "Detached {:?} from chase rig (restored parent: {:?})",
                view,
                self.state.prior_parent
            );
        }

        self.state.attached = false;
        self.state
    }

    /// Turn the rig to the target's heading.
    ///
    /// Only yaw is followed. With rotation lag the heading eases toward the
    /// target's; without it the heading snaps. No-op unless the rig is
    /// attached to a target.
    pub fn update<S: CameraScene<Node = N>>(&mut self, scene: &mut S, target: Option<N>, dt: f32) {
        if !self.state.attached {
            return;
        }
        let Some(target) = target else {
            return;
        };

        let desired = heading_of(scene.world_pose(target).rotation);
        let heading = if self.rotation_lag_enabled {
            let current = self.lagged_heading.unwrap_or(desired);
            let alpha = (dt * self.rotation_lag_speed).clamp(0.0, 1.0);
            let eased = current.slerp(desired, alpha).normalize();
            self.lagged_heading = Some(eased);
            eased
        } else {
            desired
        };
        self.set_heading(scene, heading);
    }

    /// Set the rig's world rotation, keeping its world position.
    fn set_heading<S: CameraScene<Node = N>>(&self, scene: &mut S, heading: Quat) {
        let mut pose = scene.world_pose(self.rig);
        pose.rotation = heading;
        scene.set_world_pose(self.rig, pose);
    }
}

/// Yaw-only part of a rotation (rotation about world up).
fn heading_of(rotation: Quat) -> Quat {
    let forward = rotation * Vec3::NEG_Z;
    let flat = Vec3::new(forward.x, 0.0, forward.z);
    if flat.length_squared() < 1e-8 {
        // Looking straight up or down; heading is undefined.
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y((-flat.x).atan2(-flat.z))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::scene::{MemoryScene, NodeId};

    struct Fixture {
        scene: MemoryScene,
        home: NodeId,
        rig: NodeId,
        view: NodeId,
        target: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = MemoryScene::new();
        let home = scene.spawn("director", Pose::IDENTITY);
        let rig = scene.spawn_child("rig", home, Pose::IDENTITY);
        let view = scene.spawn_child(
            "external",
            home,
            Pose::from_translation(Vec3::new(-20.0, 5.0, 0.0)),
        );
        let target = scene.spawn(
            "vehicle",
            Pose::from_translation(Vec3::new(100.0, 0.0, 50.0)),
        );
        Fixture {
            scene,
            home,
            rig,
            view,
            target,
        }
    }

    #[test]
    fn test_attach_applies_chase_offset() {
        let mut f = fixture();
        let mut rig = ChaseRig::new(f.rig, &ViewModeSettings::default());

        let state = rig.attach(&mut f.scene, f.view, Some(f.target));

        assert!(state.attached);
        assert_eq!(state.prior_parent, Some(f.home));
        assert_eq!(f.scene.parent(f.rig), Some(f.target));
        assert_eq!(f.scene.parent(f.view), Some(f.rig));
        assert_eq!(f.scene.local_pose(f.view), rig.chase_local_pose());

        // Behind and slightly above the vehicle, looking down.
        let world = f.scene.world_pose(f.view);
        let expected = Vec3::new(100.0, 0.34, 50.0 + 3.0);
        assert!(world.translation.abs_diff_eq(expected, 1e-4));
        assert!(world.forward().y < 0.0);
    }

    #[test]
    fn test_attach_twice_keeps_state_and_reapplies_offset() {
        let mut f = fixture();
        let mut rig = ChaseRig::new(f.rig, &ViewModeSettings::default());
        let first = rig.attach(&mut f.scene, f.view, Some(f.target));

        rig.set_follow_distance(8);
        let second = rig.attach(&mut f.scene, f.view, Some(f.target));

        assert_eq!(first, second);
        assert_eq!(
            f.scene.local_pose(f.view).translation,
            Vec3::new(0.0, 0.0, 8.0)
        );
    }

    #[test]
    fn test_detach_restores_prior_parent() {
        let mut f = fixture();
        let mut rig = ChaseRig::new(f.rig, &ViewModeSettings::default());
        rig.attach(&mut f.scene, f.view, Some(f.target));

        let state = rig.detach(&mut f.scene, f.view);

        assert!(!state.attached);
        assert_eq!(f.scene.parent(f.view), Some(f.home));
        assert!(!rig.is_attached(&f.scene, f.view));
    }

    #[test]
    fn test_detach_when_not_attached_is_noop() {
        let mut f = fixture();
        let mut rig = ChaseRig::new(f.rig, &ViewModeSettings::default());
        let before = f.scene.local_pose(f.view);

        rig.detach(&mut f.scene, f.view);

        assert_eq!(f.scene.parent(f.view), Some(f.home));
        assert_eq!(f.scene.local_pose(f.view), before);
    }

    #[test]
    fn test_rotation_lag_eases_heading() {
        let mut f = fixture();
        let settings = ViewModeSettings {
            rotation_lag_enabled: true,
            ..Default::default()
        };
        let mut rig = ChaseRig::new(f.rig, &settings);
        rig.attach(&mut f.scene, f.view, Some(f.target));
        rig.update(&mut f.scene, Some(f.target), 0.05);

        // Vehicle turns a quarter; half the remaining angle is covered per 0.05 s.
        let mut vehicle = f.scene.world_pose(f.target);
        vehicle.rotation = Quat::from_rotation_y(FRAC_PI_2);
        f.scene.set_world_pose(f.target, vehicle);

        rig.update(&mut f.scene, Some(f.target), 0.05);
        let eased = f.scene.world_pose(f.rig).rotation;
        assert!((eased.angle_between(Quat::IDENTITY) - FRAC_PI_2 / 2.0).abs() < 1e-3);

        for _ in 0..20 {
            rig.update(&mut f.scene, Some(f.target), 0.05);
        }
        let settled = f.scene.world_pose(f.rig).rotation;
        assert!(settled.angle_between(Quat::from_rotation_y(FRAC_PI_2)) < 1e-3);
    }

    #[test]
    fn test_update_without_lag_snaps_to_heading() {
        let mut f = fixture();
        let mut rig = ChaseRig::new(f.rig, &ViewModeSettings::default());
        rig.attach(&mut f.scene, f.view, Some(f.target));

        let mut vehicle = f.scene.world_pose(f.target);
        vehicle.rotation = Quat::from_rotation_y(1.1);
        f.scene.set_world_pose(f.target, vehicle);
        rig.update(&mut f.scene, Some(f.target), 0.01);

        let rig_pose = f.scene.world_pose(f.rig);
        assert!(rig_pose.rotation.angle_between(Quat::from_rotation_y(1.1)) < 1e-4);
        assert!(
            rig_pose
                .translation
                .abs_diff_eq(Vec3::new(100.0, 0.34, 50.0), 1e-4)
        );
    }

    #[test]
    fn test_chase_view_stays_level_on_pitched_and_rolled_target() {
        let mut f = fixture();
        let mut vehicle = f.scene.world_pose(f.target);
        vehicle.rotation =
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.5) * Quat::from_rotation_z(0.6);
        f.scene.set_world_pose(f.target, vehicle);

        for lag in [false, true] {
            let settings = ViewModeSettings {
                rotation_lag_enabled: lag,
                ..Default::default()
            };
            let mut rig = ChaseRig::new(f.rig, &settings);
            rig.attach(&mut f.scene, f.view, Some(f.target));
            let attached = f.scene.world_pose(f.view).rotation;
            assert!((attached * Vec3::X).y.abs() < 1e-4, "lag {lag}");

            rig.update(&mut f.scene, Some(f.target), 0.05);
            let rig_rotation = f.scene.world_pose(f.rig).rotation;
            assert!(rig_rotation.angle_between(Quat::from_rotation_y(0.7)) < 1e-3, "lag {lag}");
            let view = f.scene.world_pose(f.view).rotation;
            assert!((view * Vec3::X).y.abs() < 1e-4, "lag {lag}");

            rig.detach(&mut f.scene, f.view);
        }
    }

    #[test]
    fn test_disabling_lag_catches_up_with_heading() {
        let mut f = fixture();
        let settings = ViewModeSettings {
            rotation_lag_enabled: true,
            ..Default::default()
        };
        let mut rig = ChaseRig::new(f.rig, &settings);
        rig.attach(&mut f.scene, f.view, Some(f.target));

        let mut vehicle = f.scene.world_pose(f.target);
        vehicle.rotation = Quat::from_rotation_y(1.5);
        f.scene.set_world_pose(f.target, vehicle);
        for _ in 0..3 {
            rig.update(&mut f.scene, Some(f.target), 0.02);
        }
        let lagging = f.scene.world_pose(f.rig).rotation;
        assert!(lagging.angle_between(Quat::from_rotation_y(1.5)) > 0.1);

        rig.set_rotation_lag_enabled(false);
        rig.update(&mut f.scene, Some(f.target), 0.02);

        let caught_up = f.scene.world_pose(f.rig).rotation;
        assert!(caught_up.angle_between(Quat::from_rotation_y(1.5)) < 1e-3);
    }

    #[test]
    fn test_heading_ignores_pitch() {
        let rotation = Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.4);
        assert!(heading_of(rotation).angle_between(Quat::from_rotation_y(0.8)) < 1e-4);
    }
}
