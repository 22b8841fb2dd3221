//! Rigid poses and reparenting rules.
//!
//! Scale is never part of a camera pose, so a [`Pose`] is just a translation
//! and a rotation. Conventions follow Bevy: Y is up, −Z is forward.

use glam::{Quat, Vec3};

/// A rigid transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Position in the parent frame (or world frame for world poses).
    pub translation: Vec3,
    /// Orientation in the parent frame (or world frame for world poses).
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The identity pose.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a pose from a translation and rotation.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create a pose with the given translation and no rotation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }

    /// Compose `self` (parent) with `local` (child), giving the child's pose
    /// in the parent's frame.
    pub fn mul_pose(&self, local: &Pose) -> Pose {
        Pose {
            translation: self.translation + self.rotation * local.translation,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Express this world pose relative to `parent`'s world pose.
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        parent.inverse().mul_pose(self)
    }

    /// Forward direction (−Z).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Approximate equality on both translation and rotation.
    ///
    /// Rotations compare by absolute dot product, so `q` and `-q` match.
    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.translation
            .abs_diff_eq(other.translation, max_abs_diff)
            && (1.0 - self.rotation.dot(other.rotation).abs()) <= max_abs_diff
    }
}

/// Which part of a node's transform survives a reparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeepTransform {
    /// Keep the world pose; the local pose is recomputed.
    World,
    /// Keep the local pose; the world pose follows the new parent.
    Relative,
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn test_mul_then_relative_round_trips() {
        let parent = Pose::new(Vec3::new(10.0, 2.0, -3.0), Quat::from_rotation_y(FRAC_PI_2));
        let local = Pose::new(Vec3::new(0.0, 0.0, 5.0), Quat::from_rotation_x(-0.2));

        let world = parent.mul_pose(&local);
        assert!(world.relative_to(&parent).abs_diff_eq(&local, 1e-5));
    }

    #[test]
    fn test_child_offset_rotates_with_parent() {
        // A quarter turn left about Y maps local +Z (behind) to world +X.
        let parent = Pose::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        let world = parent.mul_pose(&Pose::from_translation(Vec3::new(0.0, 0.0, 4.0)));
        assert!(world.translation.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_inverse_cancels() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.7));
        assert!(pose.mul_pose(&pose.inverse()).abs_diff_eq(&Pose::IDENTITY, 1e-5));
    }
}
