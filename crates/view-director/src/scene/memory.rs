//! In-memory scene graph.
//!
//! A small parent/child pose tree with per-view display state. Used by the
//! headless simulator and by tests; behaves like the engine services the
//! Bevy adapter provides.

use std::fmt;

use super::{CameraScene, Gimbal, ViewModeChanged};
use crate::pose::{KeepTransform, Pose};

/// Handle to a node in a [`MemoryScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    local: Pose,
    on_screen: bool,
    main_output: bool,
    gimbal: Gimbal,
    owner: Option<NodeId>,
}

/// A scene graph held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: Vec<Node>,
    rendering_disabled: bool,
    notifications: Vec<ViewModeChanged>,
}

impl MemoryScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root-level node at a world pose.
    pub fn spawn(&mut self, name: impl Into<String>, pose: Pose) -> NodeId {
        self.push(name.into(), None, pose)
    }

    /// Add a node under `parent` at a local pose.
    pub fn spawn_child(&mut self, name: impl Into<String>, parent: NodeId, local: Pose) -> NodeId {
        self.push(name.into(), Some(parent), local)
    }

    fn push(&mut self, name: String, parent: Option<NodeId>, local: Pose) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            name,
            parent,
            local,
            on_screen: false,
            main_output: true,
            gimbal: Gimbal::default(),
            owner: None,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Name given at spawn time.
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Whether a view is on screen with its main output running.
    pub fn is_displayed(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.on_screen && node.main_output
    }

    /// Whether a view's main render output is running.
    pub fn main_output_enabled(&self, id: NodeId) -> bool {
        self.node(id).main_output
    }

    /// Whether world rendering is suppressed.
    pub fn rendering_disabled(&self) -> bool {
        self.rendering_disabled
    }

    /// Every notification raised so far, oldest first.
    pub fn notifications(&self) -> &[ViewModeChanged] {
        &self.notifications
    }

    /// Actor a vehicle-mounted view belongs to.
    pub fn view_owner(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).owner
    }

    /// Whether `ancestor` is `node` or one of its parents.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }
}

impl CameraScene for MemoryScene {
    type Node = NodeId;

    fn world_pose(&self, node: NodeId) -> Pose {
        let local = self.node(node).local;
        match self.node(node).parent {
            Some(parent) => self.world_pose(parent).mul_pose(&local),
            None => local,
        }
    }

    fn set_world_pose(&mut self, node: NodeId, pose: Pose) {
        let local = match self.node(node).parent {
            Some(parent) => pose.relative_to(&self.world_pose(parent)),
            None => pose,
        };
        self.node_mut(node).local = local;
    }

    fn local_pose(&self, node: NodeId) -> Pose {
        self.node(node).local
    }

    fn set_local_pose(&mut self, node: NodeId, pose: Pose) {
        self.node_mut(node).local = pose;
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn reparent(&mut self, node: NodeId, parent: Option<NodeId>, keep: KeepTransform) {
        if let Some(parent) = parent
            && self.is_ancestor(node, parent)
        {
            tracing::warn!(
                "Refusing to parent {} under its own descendant {}",
                self.name(node),
                self.name(parent)
            );
            return;
        }

        let world = self.world_pose(node);
        self.node_mut(node).parent = parent;
        if keep == KeepTransform::World {
            self.set_world_pose(node, world);
        }
    }

    fn show_on_screen(&mut self, view: NodeId) {
        let node = self.node_mut(view);
        node.on_screen = true;
        node.main_output = true;
    }

    fn disable_main_output(&mut self, view: NodeId) {
        let node = self.node_mut(view);
        node.on_screen = false;
        node.main_output = false;
    }

    fn set_rendering_disabled(&mut self, disabled: bool) {
        self.rendering_disabled = disabled;
    }

    fn gimbal(&self, view: NodeId) -> Gimbal {
        self.node(view).gimbal
    }

    fn set_gimbal(&mut self, view: NodeId, gimbal: Gimbal) {
        self.node_mut(view).gimbal = gimbal;
    }

    fn set_view_owner(&mut self, view: NodeId, owner: Option<NodeId>) {
        self.node_mut(view).owner = owner;
    }

    fn view_mode_changed(&mut self, changed: ViewModeChanged) {
        self.notifications.push(changed);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    #[test]
    fn test_reparent_keep_world_preserves_world_pose() {
        let mut scene = MemoryScene::new();
        let parent = scene.spawn(
            "parent",
            Pose::new(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_y(0.5)),
        );
        let child = scene.spawn("child", Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)));

        let before = scene.world_pose(child);
        scene.reparent(child, Some(parent), KeepTransform::World);

        assert_eq!(scene.parent(child), Some(parent));
        assert!(scene.world_pose(child).abs_diff_eq(&before, 1e-5));
    }

    #[test]
    fn test_reparent_keep_relative_preserves_local_pose() {
        let mut scene = MemoryScene::new();
        let parent = scene.spawn("parent", Pose::from_translation(Vec3::new(0.0, 10.0, 0.0)));
        let child = scene.spawn("child", Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)));

        scene.reparent(child, Some(parent), KeepTransform::Relative);

        assert_eq!(
            scene.local_pose(child),
            Pose::from_translation(Vec3::new(1.0, 0.0, 0.0))
        );
        assert!(
            scene
                .world_pose(child)
                .translation
                .abs_diff_eq(Vec3::new(1.0, 10.0, 0.0), 1e-5)
        );
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut scene = MemoryScene::new();
        let root = scene.spawn("root", Pose::IDENTITY);
        let child = scene.spawn_child("child", root, Pose::IDENTITY);

        scene.reparent(root, Some(child), KeepTransform::World);
        assert_eq!(scene.parent(root), None);
    }

    #[test]
    fn test_display_toggles() {
        let mut scene = MemoryScene::new();
        let view = scene.spawn("view", Pose::IDENTITY);
        assert!(!scene.is_displayed(view));

        scene.show_on_screen(view);
        assert!(scene.is_displayed(view));

        scene.disable_main_output(view);
        assert!(!scene.is_displayed(view));
        assert!(!scene.main_output_enabled(view));
    }
}
