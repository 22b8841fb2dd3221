//! [`CameraScene`] over a Bevy [`World`].
//!
//! Nodes are entities. Poses come from [`Transform`] composed along the
//! [`ChildOf`] chain, so they are valid immediately after a write, before
//! transform propagation has run. Scale is left untouched.

use bevy::prelude::*;

use crate::{
    pose::{KeepTransform, Pose},
    scene::{CameraScene, Gimbal, ViewModeChanged},
};

use super::{ViewGimbal, ViewModeStatus, ViewOutput, ViewOwner, ViewportRendering};

/// Borrowed view of a [`World`] as a camera scene.
pub struct WorldScene<'w> {
    world: &'w mut World,
}

impl<'w> WorldScene<'w> {
    /// Wrap a world.
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    /// The wrapped world.
    pub fn world(&self) -> &World {
        self.world
    }

    fn is_ancestor(&self, ancestor: Entity, node: Entity) -> bool {
        let mut current = Some(node);
        while let Some(entity) = current {
            if entity == ancestor {
                return true;
            }
            current = self.parent(entity);
        }
        false
    }

    fn update_output(&mut self, view: Entity, apply: impl FnOnce(&mut ViewOutput)) {
        let Ok(mut entity) = self.world.get_entity_mut(view) else {
            tracing::warn!("View {view} no longer exists");
            return;
        };
        let mut output = entity.get::<ViewOutput>().copied().unwrap_or_default();
        apply(&mut output);
        entity.insert(output);
    }
}

fn pose_of(transform: &Transform) -> Pose {
    Pose::new(transform.translation, transform.rotation)
}

impl CameraScene for WorldScene<'_> {
    type Node = Entity;

    fn world_pose(&self, node: Entity) -> Pose {
        let local = self.local_pose(node);
        match self.parent(node) {
            Some(parent) => self.world_pose(parent).mul_pose(&local),
            None => local,
        }
    }

    fn set_world_pose(&mut self, node: Entity, pose: Pose) {
        let local = match self.parent(node) {
            Some(parent) => pose.relative_to(&self.world_pose(parent)),
            None => pose,
        };
        self.set_local_pose(node, local);
    }

    fn local_pose(&self, node: Entity) -> Pose {
        self.world
            .get::<Transform>(node)
            .map_or(Pose::IDENTITY, pose_of)
    }

    fn set_local_pose(&mut self, node: Entity, pose: Pose) {
        let Ok(mut entity) = self.world.get_entity_mut(node) else {
            tracing::warn!("Node {node} no longer exists");
            return;
        };
        if let Some(mut transform) = entity.get_mut::<Transform>() {
            transform.translation = pose.translation;
            transform.rotation = pose.rotation;
        } else {
            entity.insert(Transform::from_translation(pose.translation).with_rotation(pose.rotation));
        }
    }

    fn parent(&self, node: Entity) -> Option<Entity> {
        self.world.get::<ChildOf>(node).map(ChildOf::parent)
    }

    fn reparent(&mut self, node: Entity, parent: Option<Entity>, keep: KeepTransform) {
        if let Some(parent) = parent
            && self.is_ancestor(node, parent)
        {
            tracing::warn!("Refusing to parent {node} under its own descendant {parent}");
            return;
        }

        let world_pose = self.world_pose(node);
        let Ok(mut entity) = self.world.get_entity_mut(node) else {
            tracing::warn!("Node {node} no longer exists");
            return;
        };
        match parent {
            Some(parent) => {
                entity.insert(ChildOf(parent));
            }
            None => {
                entity.remove::<ChildOf>();
            }
        }

        if keep == KeepTransform::World {
            self.set_world_pose(node, world_pose);
        }
    }

    fn show_on_screen(&mut self, view: Entity) {
        self.update_output(view, |output| {
            output.on_screen = true;
            output.main_output = true;
        });
    }

    fn disable_main_output(&mut self, view: Entity) {
        self.update_output(view, |output| {
            output.on_screen = false;
            output.main_output = false;
        });
    }

    fn set_rendering_disabled(&mut self, disabled: bool) {
        self.world
            .get_resource_or_init::<ViewportRendering>()
            .disabled = disabled;
    }

    fn gimbal(&self, view: Entity) -> Gimbal {
        self.world
            .get::<ViewGimbal>(view)
            .map_or_else(Gimbal::default, |gimbal| gimbal.0)
    }

    fn set_gimbal(&mut self, view: Entity, gimbal: Gimbal) {
        if let Ok(mut entity) = self.world.get_entity_mut(view) {
            entity.insert(ViewGimbal(gimbal));
        }
    }

    fn set_view_owner(&mut self, view: Entity, owner: Option<Entity>) {
        if let Ok(mut entity) = self.world.get_entity_mut(view) {
            entity.insert(ViewOwner(owner));
        }
    }

    fn view_mode_changed(&mut self, changed: ViewModeChanged) {
        self.world
            .get_resource_or_init::<ViewModeStatus>()
            .record(changed);
    }
}
