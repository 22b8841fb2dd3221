//! Follow behavior: keeps a node at a fixed world offset from the target.
//!
//! The offset is captured when a vehicle is possessed and stays fixed until
//! the next possession switch. Ground observer mode locks the altitude.

use glam::Vec3;

use crate::scene::CameraScene;

/// Per-frame world-offset tracking.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FollowBehavior {
    /// World offset from the target to the follower.
    offset: Vec3,
    /// Follower altitude held while the altitude lock is on.
    anchor_altitude: f32,
    /// Hold the follower's altitude instead of tracking the target's.
    altitude_locked: bool,
}

impl FollowBehavior {
    /// Capture the offset between a follower pose and the target position.
    ///
    /// With no target the offset is measured from the world origin.
    pub fn capture(&mut self, follower_position: Vec3, target_position: Option<Vec3>) {
        self.offset = follower_position - target_position.unwrap_or(Vec3::ZERO);
        self.anchor_altitude = follower_position.y;
    }

    /// World offset from target to follower.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Whether the altitude lock is on.
    pub fn altitude_locked(&self) -> bool {
        self.altitude_locked
    }

    /// Turn the altitude lock on or off.
    pub fn set_altitude_locked(&mut self, locked: bool) {
        self.altitude_locked = locked;
    }

    /// Where the follower belongs for a target at `target_position`.
    pub fn follow_position(&self, target_position: Vec3) -> Vec3 {
        let mut position = target_position + self.offset;
        if self.altitude_locked {
            position.y = self.anchor_altitude;
        }
        position
    }

    /// Move `follower` to its follow position. Rotation is left alone.
    ///
    /// No-op without a target.
    pub fn update<S: CameraScene>(&self, scene: &mut S, follower: S::Node, target: Option<S::Node>) {
        let Some(target) = target else {
            return;
        };

        let target_position = scene.world_pose(target).translation;
        let mut pose = scene.world_pose(follower);
        pose.translation = self.follow_position(target_position);
        scene.set_world_pose(follower, pose);
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::{pose::Pose, scene::MemoryScene};

    #[test]
    fn test_tracks_full_offset() {
        let mut scene = MemoryScene::new();
        let target = scene.spawn("vehicle", Pose::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        let rotation = Quat::from_rotation_y(0.3);
        let view = scene.spawn(
            "external",
            Pose::new(Vec3::new(-5.0, 3.0, 2.0), rotation),
        );

        let mut follow = FollowBehavior::default();
        follow.capture(scene.world_pose(view).translation, Some(Vec3::new(0.0, 1.0, 0.0)));

        scene.set_world_pose(target, Pose::from_translation(Vec3::new(10.0, 6.0, -4.0)));
        follow.update(&mut scene, view, Some(target));

        let pose = scene.world_pose(view);
        assert!(pose.translation.abs_diff_eq(Vec3::new(5.0, 8.0, -2.0), 1e-5));
        assert!(pose.rotation.abs_diff_eq(rotation, 1e-6));
    }

    #[test]
    fn test_altitude_lock_holds_height() {
        let mut follow = FollowBehavior::default();
        follow.capture(Vec3::new(-5.0, 3.0, 2.0), Some(Vec3::new(0.0, 1.0, 0.0)));
        follow.set_altitude_locked(true);

        // Target climbs 50 m; only the horizontal position tracks it.
        let position = follow.follow_position(Vec3::new(10.0, 51.0, -4.0));
        assert!(position.abs_diff_eq(Vec3::new(5.0, 3.0, -2.0), 1e-5));
    }

    #[test]
    fn test_no_target_is_noop() {
        let mut scene = MemoryScene::new();
        let view = scene.spawn("external", Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let follow = FollowBehavior::default();

        follow.update(&mut scene, view, None);

        assert_eq!(scene.world_pose(view).translation, Vec3::new(1.0, 2.0, 3.0));
    }
}
