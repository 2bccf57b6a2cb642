//! Scene graph: an owning tree of transformed, optionally meshed nodes
use std::rc::Rc;

use crate::math::Matrix4;
use crate::mesh::Mesh;
use crate::transform::Transform;

/// A node in the scene tree.
///
/// Children are owned exclusively, so dropping a node drops its subtree.
/// Meshes are shared and never mutated through the node. There are no
/// parent links; world placement is only resolved by [`SceneNode::traverse`].
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub transform: Transform,
    mesh: Option<Rc<Mesh>>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(mesh: Option<Rc<Mesh>>, transform: Transform) -> Self {
        Self {
            transform,
            mesh,
            children: Vec::new(),
        }
    }

    /// Node without geometry, used for grouping
    pub fn empty(transform: Transform) -> Self {
        Self::new(None, transform)
    }

    pub fn with_mesh(mesh: Rc<Mesh>, transform: Transform) -> Self {
        Self::new(Some(mesh), transform)
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_deref()
    }

    pub fn set_mesh(&mut self, mesh: Option<Rc<Mesh>>) {
        self.mesh = mesh;
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.children.get_mut(index)
    }

    /// Append a child and return its index
    pub fn add_child(&mut self, node: SceneNode) -> usize {
        self.children.push(node);
        self.children.len() - 1
    }

    /// Detach the child at `index`, handing its subtree back to the caller.
    pub fn remove_child(&mut self, index: usize) -> Option<SceneNode> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Depth-first, pre-order walk. Each node's world matrix is
    /// `parent_world * transform.matrix()`; pass the identity at the root.
    pub fn traverse<F>(&self, parent_world: &Matrix4, visitor: &mut F)
    where
        F: FnMut(&SceneNode, &Matrix4),
    {
        let world = parent_world * &self.transform.matrix();
        visitor(self, &world);
        for child in &self.children {
            child.traverse(&world, visitor);
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vector3};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_child_inherits_parent_translation() {
        let mut parent = SceneNode::empty(Transform::from_position(2.0, 0.0, 0.0));
        parent.add_child(SceneNode::empty(Transform::from_position(0.0, 3.0, 0.0)));

        let mut worlds = Vec::new();
        parent.traverse(&Matrix4::identity(), &mut |_, world| worlds.push(*world));

        assert_eq!(worlds.len(), 2);
        assert_eq!(worlds[0], Matrix4::translation(2.0, 0.0, 0.0));
        assert_eq!(worlds[1], Matrix4::translation(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_traversal_is_preorder() {
        let named = |x: f32| SceneNode::empty(Transform::from_position(x, 0.0, 0.0));

        // root(0) -> [a(1) -> [c(3)], b(2)]
        let mut a = named(1.0);
        a.add_child(named(3.0));
        let mut root = named(0.0);
        root.add_child(a);
        root.add_child(named(2.0));

        let mut order = Vec::new();
        root.traverse(&Matrix4::identity(), &mut |node, _| {
            order.push(node.transform.position.x)
        });
        assert_eq!(order, vec![0.0, 1.0, 3.0, 2.0]);
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_parent_rotation_moves_child() {
        let rotation = Quaternion::from_axis_angle(Vector3::Z, 90.0);
        let mut parent = SceneNode::empty(Transform::default().with_rotation(rotation));
        parent.add_child(SceneNode::empty(Transform::from_position(1.0, 0.0, 0.0)));

        let mut child_origin = None;
        parent.traverse(&Matrix4::identity(), &mut |node, world| {
            if node.children().is_empty() {
                child_origin = Some(world.transform_point(Vector3::ZERO));
            }
        });
        assert_abs_diff_eq!(child_origin.unwrap(), Vector3::Y, epsilon = 1e-6);
    }

    #[test]
    fn test_shared_mesh() {
        let cube = Rc::new(Mesh::cube(1.0));
        let mut root = SceneNode::default();
        root.add_child(SceneNode::with_mesh(Rc::clone(&cube), Transform::default()));
        root.add_child(SceneNode::with_mesh(Rc::clone(&cube), Transform::default()));

        assert_eq!(Rc::strong_count(&cube), 3);
        assert!(root.mesh().is_none());
        assert!(root.children().iter().all(|c| c.mesh().is_some()));
    }

    #[test]
    fn test_child_mut_edits_are_seen_by_traversal() {
        let mut root = SceneNode::default();
        root.add_child(SceneNode::default());
        root.child_mut(0).unwrap().transform.position = Vector3::new(0.0, 0.0, -4.0);
        assert!(root.child_mut(1).is_none());

        let mut last = Matrix4::identity();
        root.traverse(&Matrix4::identity(), &mut |_, world| last = *world);
        assert_eq!(last.translation_part(), Vector3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn test_remove_child_returns_subtree() {
        let mut root = SceneNode::default();
        let mut branch = SceneNode::default();
        branch.add_child(SceneNode::default());
        let index = root.add_child(branch);

        let removed = root.remove_child(index).unwrap();
        assert_eq!(removed.node_count(), 2);
        assert!(root.children().is_empty());
        assert!(root.remove_child(0).is_none());
    }
}
