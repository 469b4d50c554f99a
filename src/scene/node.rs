//! Scene graph nodes.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use super::events::{NodeEvent, NodeEvents};
use super::light::Light;
use super::mesh::SharedMesh;
use crate::util::{compose_trs, Mat4, Vec3};

/// What a node contributes besides its transform and children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Plain,
    Light(Light),
}

/// Transform-bearing element of the scene hierarchy.
///
/// Owns its child nodes and shares its meshes. The local transform is
/// `baked * T * Rx * Ry * Rz * S`; world transforms are computed by
/// traversal and never stored here.
#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    translation: Vec3,
    /// Euler angles in radians.
    rotation: Vec3,
    scale: Vec3,
    baked: Mat4,
    child_nodes: Vec<Node>,
    child_meshes: Vec<SharedMesh>,
    events: NodeEvents,
}

impl Node {
    pub fn new() -> Self {
        Self::named("Node")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Plain,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            baked: Mat4::IDENTITY,
            child_nodes: Vec::new(),
            child_meshes: Vec::new(),
            events: NodeEvents::default(),
        }
    }

    /// Light node named after its variant.
    pub fn light(light: impl Into<Light>) -> Self {
        let light = light.into();
        let name = match light {
            Light::Sun(_) => "SunLight",
            Light::Point(_) => "PointLight",
        };
        let mut node = Self::named(name);
        node.kind = NodeKind::Light(light);
        node
    }

    /// Node holding a single mesh.
    pub fn with_mesh(mesh: SharedMesh) -> Self {
        let mut node = Self::new();
        node.child_meshes.push(mesh);
        node
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_child(mut self, node: Node) -> Self {
        self.child_nodes.push(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, NodeKind::Light(_))
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            NodeKind::Plain => None,
        }
    }

    /// Replace the light carried by this node (turning it into a light node).
    pub fn set_light(&mut self, light: impl Into<Light>) {
        self.kind = NodeKind::Light(light.into());
        self.events.publish(NodeEvent::LightChanged);
    }

    /// Edit the light in place; no-op on plain nodes.
    pub fn update_light(&mut self, f: impl FnOnce(&mut Light)) -> bool {
        match &mut self.kind {
            NodeKind::Light(light) => {
                f(light);
                self.events.publish(NodeEvent::LightChanged);
                true
            }
            NodeKind::Plain => false,
        }
    }

    /// Receive this node's change events.
    pub fn subscribe(&mut self) -> Receiver<NodeEvent> {
        self.events.subscribe()
    }

    // ===== Hierarchy =====

    /// Append a child node. Returns its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        let index = self.child_nodes.len();
        let name = node.name.clone();
        self.child_nodes.push(node);
        self.events.publish(NodeEvent::AddedChildNode { index, name });
        index
    }

    /// Detach and return the child at `index`.
    pub fn remove_node(&mut self, index: usize) -> Option<Node> {
        if index >= self.child_nodes.len() {
            return None;
        }
        let node = self.child_nodes.remove(index);
        self.events.publish(NodeEvent::RemovedChildNode {
            index,
            name: node.name.clone(),
        });
        Some(node)
    }

    /// Append a mesh reference. Returns its index.
    pub fn add_mesh(&mut self, mesh: SharedMesh) -> usize {
        let index = self.child_meshes.len();
        let name = mesh.read().name().to_string();
        self.child_meshes.push(mesh);
        self.events.publish(NodeEvent::AddedChildMesh { index, name });
        index
    }

    /// Remove the first reference to `mesh` (by handle identity).
    pub fn remove_mesh(&mut self, mesh: &SharedMesh) -> bool {
        let Some(index) = self.child_meshes.iter().position(|m| Arc::ptr_eq(m, mesh)) else {
            return false;
        };
        let removed = self.child_meshes.remove(index);
        let name = removed.read().name().to_string();
        self.events.publish(NodeEvent::RemovedChildMesh { index, name });
        true
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.child_nodes
    }

    pub fn child_node(&self, index: usize) -> Option<&Node> {
        self.child_nodes.get(index)
    }

    pub fn child_node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.child_nodes.get_mut(index)
    }

    pub fn child_meshes(&self) -> &[SharedMesh] {
        &self.child_meshes
    }

    /// Every descendant node, depth-first pre-order.
    pub fn all_child_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a Node>) {
        for child in &self.child_nodes {
            out.push(child);
            child.collect_nodes(out);
        }
    }

    /// Every mesh in this subtree, in traversal order.
    pub fn all_child_meshes(&self) -> Vec<SharedMesh> {
        let mut out = Vec::new();
        self.collect_meshes(&mut out);
        out
    }

    fn collect_meshes(&self, out: &mut Vec<SharedMesh>) {
        out.extend(self.child_meshes.iter().cloned());
        for child in &self.child_nodes {
            child.collect_meshes(out);
        }
    }

    // ===== Transformations =====

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.events.publish(NodeEvent::TranslationChanged(translation));
    }

    /// Euler angles in radians.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.events.publish(NodeEvent::RotationChanged(rotation));
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.events.publish(NodeEvent::ScaleChanged(scale));
    }

    /// Matrix accumulated by [`Node::apply_transformations`].
    pub fn baked(&self) -> Mat4 {
        self.baked
    }

    /// Local transform: baked matrix times translate, rotate X/Y/Z, scale.
    pub fn transformation(&self) -> Mat4 {
        self.baked * compose_trs(self.translation, self.rotation, self.scale)
    }

    /// Fold TRS into the baked matrix and reset TRS to identity.
    ///
    /// [`Node::transformation`] returns the same matrix before and after.
    pub fn apply_transformations(&mut self) {
        self.baked = self.transformation();
        self.translation = Vec3::ZERO;
        self.rotation = Vec3::ZERO;
        self.scale = Vec3::ONE;
        self.events.publish(NodeEvent::TransformationApplied(self.baked));
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::light::{PointLight, SunLight, Visibility};
    use crate::scene::mesh::Mesh;

    #[test]
    fn test_transform_order() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let r = Vec3::new(0.3, -0.7, 1.1);
        let s = Vec3::new(2.0, 0.5, 1.5);
        let node = Node::new().with_translation(t).with_rotation(r).with_scale(s);

        let expected = Mat4::from_translation(t)
            * Mat4::from_rotation_x(r.x)
            * Mat4::from_rotation_y(r.y)
            * Mat4::from_rotation_z(r.z)
            * Mat4::from_scale(s);
        assert!(node.transformation().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_apply_transformations_keeps_matrix() {
        let mut node = Node::new()
            .with_translation(Vec3::new(4.0, 0.0, 0.0))
            .with_rotation(Vec3::new(0.0, 0.5, 0.0))
            .with_scale(Vec3::splat(2.0));
        let before = node.transformation();

        node.apply_transformations();
        assert!(node.transformation().abs_diff_eq(before, 1e-6));
        assert_eq!(node.translation(), Vec3::ZERO);
        assert_eq!(node.rotation(), Vec3::ZERO);
        assert_eq!(node.scale(), Vec3::ONE);

        // New TRS stacks on top of the baked matrix
        node.set_translation(Vec3::Y);
        let expected = before * Mat4::from_translation(Vec3::Y);
        assert!(node.transformation().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_events() {
        let mut node = Node::named("root");
        let rx = node.subscribe();

        node.add_node(Node::named("child"));
        node.set_translation(Vec3::X);
        let mesh = Mesh::default().with_name("tri").into_shared();
        node.add_mesh(mesh.clone());
        assert!(node.remove_mesh(&mesh));
        assert!(node.remove_node(0).is_some());

        let events: Vec<NodeEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                NodeEvent::AddedChildNode { index: 0, name: "child".into() },
                NodeEvent::TranslationChanged(Vec3::X),
                NodeEvent::AddedChildMesh { index: 0, name: "tri".into() },
                NodeEvent::RemovedChildMesh { index: 0, name: "tri".into() },
                NodeEvent::RemovedChildNode { index: 0, name: "child".into() },
            ]
        );
    }

    #[test]
    fn test_remove_mesh_by_identity() {
        let a = Mesh::default().into_shared();
        let b = Mesh::default().into_shared();
        let mut node = Node::with_mesh(a.clone());
        assert!(!node.remove_mesh(&b));
        assert!(node.remove_mesh(&a));
        assert!(node.child_meshes().is_empty());
        assert!(node.remove_node(3).is_none());
    }

    #[test]
    fn test_all_children_preorder() {
        let shared = Mesh::default().into_shared();
        let tree = Node::named("root")
            .with_child(Node::named("a").with_child(Node::with_mesh(shared.clone()).with_name("a1")))
            .with_child(Node::with_mesh(shared.clone()).with_name("b"));

        let names: Vec<&str> = tree.all_child_nodes().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "a1", "b"]);
        // Same handle referenced twice counts twice
        assert_eq!(tree.all_child_meshes().len(), 2);
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_light_nodes() {
        let mut node = Node::light(SunLight::default());
        assert!(node.is_light());
        assert_eq!(node.name(), "SunLight");

        let rx = node.subscribe();
        assert!(node.update_light(|l| l.params_mut().visibility = Visibility::Sphere));
        node.set_light(PointLight::default());
        assert_eq!(rx.try_iter().count(), 2);
        assert!(matches!(node.as_light(), Some(Light::Point(_))));

        let mut plain = Node::new();
        assert!(!plain.update_light(|_| {}));
        assert!(plain.as_light().is_none());
    }
}
