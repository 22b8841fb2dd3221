//! Manual pose controller.
//!
//! Holds an explicit ownership token for at most one view and applies user
//! pose edits to it each frame. Ownership is granted and revoked by the
//! caller; it is never inferred from the current mode.

use glam::{Quat, Vec3};

use crate::{scene::CameraScene, settings::ManualPoseSettings};

/// Current manual input, each axis in −1..=1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseInput {
    /// Movement in view space (x=right, y=up, z=backward).
    pub translation: Vec3,
    /// Rotation rates (x=pitch, y=yaw, z=roll).
    pub rotation: Vec3,
}

impl PoseInput {
    /// Whether any axis is active.
    pub fn is_active(&self) -> bool {
        self.translation != Vec3::ZERO || self.rotation != Vec3::ZERO
    }
}

/// Applies manual pose edits to the owned view.
#[derive(Debug)]
pub struct ManualPoseController<N> {
    owner: Option<N>,
    input: PoseInput,
    /// Grows while input is held; zero when idle.
    acceleration: f32,
    settings: ManualPoseSettings,
}

impl<N: Copy + Eq> ManualPoseController<N> {
    /// Create a controller with no owner.
    pub fn new(settings: ManualPoseSettings) -> Self {
        Self {
            owner: None,
            input: PoseInput::default(),
            acceleration: 0.0,
            settings,
        }
    }

    /// The view currently owned, if any.
    pub fn owner(&self) -> Option<N> {
        self.owner
    }

    /// Grant ownership to `owner`, or clear it with `None`.
    ///
    /// Any previous owner is released; it is returned.
    pub fn set_owner(&mut self, owner: Option<N>) -> Option<N> {
        self.acceleration = 0.0;
        std::mem::replace(&mut self.owner, owner)
    }

    /// Current input.
    pub fn input(&self) -> PoseInput {
        self.input
    }

    /// Replace the current input.
    pub fn set_input(&mut self, input: PoseInput) {
        self.input = input;
    }

    /// Apply the current input to the owned view. No-op without an owner.
    pub fn update<S: CameraScene<Node = N>>(&mut self, scene: &mut S, dt: f32) {
        let Some(owner) = self.owner else {
            return;
        };

        if !self.input.is_active() {
            self.acceleration = 0.0;
            return;
        }

        self.acceleration = if self.acceleration <= 0.0 {
            1.0
        } else {
            (self.acceleration * self.settings.acceleration_growth)
                .min(self.settings.max_acceleration)
        };

        let mut pose = scene.world_pose(owner);

        // Translate along the view's own axes.
        let step = self.settings.translation_speed * self.acceleration * dt;
        let direction = self.input.translation.clamp_length_max(1.0);
        pose.translation += pose.rotation * direction * step;

        // Yaw about world up; pitch and roll about the view's local axes.
        let angle = self.settings.rotation_speed_degrees.to_radians() * dt;
        let yaw = Quat::from_rotation_y(self.input.rotation.y * angle);
        let local = Quat::from_rotation_x(self.input.rotation.x * angle)
            * Quat::from_rotation_z(self.input.rotation.z * angle);
        pose.rotation = (yaw * pose.rotation * local).normalize();

        scene.set_world_pose(owner, pose);
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::{pose::Pose, scene::MemoryScene};

    #[test]
    fn test_update_without_owner_is_noop() {
        let mut scene = MemoryScene::new();
        let view = scene.spawn("external", Pose::IDENTITY);
        let mut controller = ManualPoseController::new(ManualPoseSettings::default());
        controller.set_input(PoseInput {
            translation: Vec3::NEG_Z,
            ..Default::default()
        });

        controller.update(&mut scene, 1.0);

        assert_eq!(scene.world_pose(view), Pose::IDENTITY);
    }

    #[test]
    fn test_set_owner_returns_previous() {
        let mut controller = ManualPoseController::new(ManualPoseSettings::default());
        assert_eq!(controller.set_owner(Some(1)), None);
        assert_eq!(controller.set_owner(Some(2)), Some(1));
        assert_eq!(controller.set_owner(None), Some(2));
        assert_eq!(controller.owner(), None);
    }

    #[test]
    fn test_moves_along_view_axes_with_acceleration() {
        let mut scene = MemoryScene::new();
        // Facing +X (a quarter turn right).
        let view = scene.spawn("external", Pose::new(Vec3::ZERO, Quat::from_rotation_y(-FRAC_PI_2)));
        let settings = ManualPoseSettings::default();
        let mut controller = ManualPoseController::new(settings.clone());
        controller.set_owner(Some(view));
        controller.set_input(PoseInput {
            translation: Vec3::NEG_Z,
            ..Default::default()
        });

        controller.update(&mut scene, 1.0);
        let first = scene.world_pose(view).translation;
        assert!(first.abs_diff_eq(Vec3::new(settings.translation_speed, 0.0, 0.0), 1e-4));

        controller.update(&mut scene, 1.0);
        let second = scene.world_pose(view).translation;
        let expected = settings.translation_speed * (1.0 + settings.acceleration_growth);
        assert!(second.abs_diff_eq(Vec3::new(expected, 0.0, 0.0), 1e-4));

        // Releasing input resets the ramp.
        controller.set_input(PoseInput::default());
        controller.update(&mut scene, 1.0);
        assert_eq!(scene.world_pose(view).translation, second);

        controller.set_input(PoseInput {
            translation: Vec3::NEG_Z,
            ..Default::default()
        });
        controller.update(&mut scene, 1.0);
        let third = scene.world_pose(view).translation;
        assert!((third.x - second.x - settings.translation_speed).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_input_turns_view() {
        let mut scene = MemoryScene::new();
        let view = scene.spawn("external", Pose::IDENTITY);
        let mut controller = ManualPoseController::new(ManualPoseSettings {
            rotation_speed_degrees: 90.0,
            ..Default::default()
        });
        controller.set_owner(Some(view));
        controller.set_input(PoseInput {
            rotation: Vec3::new(0.0, 1.0, 0.0),
            ..Default::default()
        });

        controller.update(&mut scene, 1.0);

        let rotation = scene.world_pose(view).rotation;
        assert!(rotation.angle_between(Quat::from_rotation_y(FRAC_PI_2)) < 1e-4);
    }
}
