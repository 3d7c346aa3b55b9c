//! Entity hierarchies.
//!
//! A [`SceneNode`] owns one item (normally an [`Entity`]) and its children.
//! Every child is placed relative to its parent: propagating world transforms
//! writes each node's model matrix into the parent matrix of its children,
//! walking the tree top-down so a whole hierarchy follows its root.

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{entity::Entity, transform::Transform};

/// Anything placed in the world through a [`Transform`].
pub trait Placed {
    fn transform(&self) -> &Transform;

    fn transform_mut(&mut self) -> &mut Transform;
}

impl Placed for Transform {
    fn transform(&self) -> &Transform {
        self
    }

    fn transform_mut(&mut self) -> &mut Transform {
        self
    }
}

impl Placed for Entity {
    fn transform(&self) -> &Transform {
        Entity::transform(self)
    }

    fn transform_mut(&mut self) -> &mut Transform {
        Entity::transform_mut(self)
    }
}

#[derive(Debug)]
pub struct SceneNode<T: Placed = Entity> {
    pub item: T,
    pub children: Vec<SceneNode<T>>,
}

impl<T: Placed> SceneNode<T> {
    pub fn new(item: T) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SceneNode<T>) -> Self {
        self.add_child(child);
        self
    }

    /// Appends `child` and returns its index among this node's children.
    pub fn add_child(&mut self, child: SceneNode<T>) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub fn remove_child(&mut self, idx: usize) -> Option<SceneNode<T>> {
        if idx >= self.children.len() {
            log::warn!(
                "You tried to remove child {}, but there are only {} children.",
                idx,
                self.children.len()
            );
            return None;
        }
        Some(self.children.remove(idx))
    }

    /// Sets `parent` as this node's parent matrix and pushes the resulting
    /// world matrix down to every descendant.
    pub fn update_world_transforms(&mut self, parent: Matrix4<f32>) {
        let transform = self.item.transform_mut();
        transform.parent = parent;
        let world = transform.model_matrix();
        for child in self.children.iter_mut() {
            child.update_world_transforms(world);
        }
    }

    /// Propagates from the root, which is treated as unparented.
    pub fn update_world_transform_all(&mut self) {
        self.update_world_transforms(Matrix4::identity());
    }

    /// Depth-first, parents before their children.
    pub fn items(&self) -> Vec<&T> {
        let mut items = vec![&self.item];
        for child in &self.children {
            items.extend(child.items());
        }
        items
    }

    pub fn len(&self) -> usize {
        1 + self.children.iter().map(|c| c.len()).sum::<usize>()
    }
}

impl SceneNode<Entity> {
    /// Propagates world transforms from the root and refreshes the MVP of
    /// every entity in the tree.
    pub fn update(&mut self, queue: &wgpu::Queue, view_proj: Matrix4<f32>) {
        self.update_world_transform_all();
        self.write_uniforms(queue, view_proj);
    }

    fn write_uniforms(&mut self, queue: &wgpu::Queue, view_proj: Matrix4<f32>) {
        self.item.update(queue, view_proj);
        for child in self.children.iter_mut() {
            child.write_uniforms(queue, view_proj);
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.item.draw(render_pass);
        for child in &self.children {
            child.draw(render_pass);
        }
    }

    pub fn entities(&self) -> Vec<&Entity> {
        self.items()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::Vector3;

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5
    }

    #[test]
    fn children_follow_their_parent() {
        let mut root = SceneNode::new(Transform::new().with_position([10.0, 0.0, 0.0]))
            .with_child(
                SceneNode::new(Transform::new().with_position([0.0, 2.0, 0.0]))
                    .with_child(SceneNode::new(Transform::new().with_position([0.0, 0.0, 3.0]))),
            );
        root.update_world_transform_all();

        let positions: Vec<_> = root.items().iter().map(|t| t.world_position()).collect();
        assert!(close(positions[0], Vector3::new(10.0, 0.0, 0.0)));
        assert!(close(positions[1], Vector3::new(10.0, 2.0, 0.0)));
        assert!(close(positions[2], Vector3::new(10.0, 2.0, 3.0)));
    }

    #[test]
    fn parent_rotation_and_scale_reach_grandchildren() {
        let mut root = SceneNode::new(
            Transform::new()
                .with_rotation([0.0, FRAC_PI_2, 0.0])
                .with_scale([2.0, 2.0, 2.0]),
        )
        .with_child(
            SceneNode::new(Transform::new())
                .with_child(SceneNode::new(Transform::new().with_position([1.0, 0.0, 0.0]))),
        );
        root.update_world_transform_all();

        let leaf = root.children[0].children[0].item;
        assert!(close(leaf.world_position(), Vector3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn moving_the_root_needs_a_new_propagation() {
        let mut root = SceneNode::new(Transform::new())
            .with_child(SceneNode::new(Transform::new().with_position([1.0, 0.0, 0.0])));
        root.update_world_transform_all();
        root.item.position = Vector3::new(0.0, 0.0, 5.0);
        assert!(close(root.children[0].item.world_position(), Vector3::new(1.0, 0.0, 0.0)));

        root.update_world_transform_all();
        assert!(close(root.children[0].item.world_position(), Vector3::new(1.0, 0.0, 5.0)));
    }

    #[test]
    fn root_parent_is_reset() {
        let mut root = SceneNode::new(
            Transform::new().with_parent(Matrix4::from_translation(Vector3::new(9.0, 9.0, 9.0))),
        );
        root.update_world_transform_all();
        assert!(close(root.item.world_position(), Vector3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn items_are_depth_first() {
        let mut root = SceneNode::new(Transform::new().with_position([0.0, 0.0, 0.0]));
        let mut a = SceneNode::new(Transform::new().with_position([1.0, 0.0, 0.0]));
        a.add_child(SceneNode::new(Transform::new().with_position([2.0, 0.0, 0.0])));
        root.add_child(a);
        root.add_child(SceneNode::new(Transform::new().with_position([3.0, 0.0, 0.0])));

        let xs: Vec<f32> = root.items().iter().map(|t| t.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn remove_child_out_of_bounds_is_none() {
        let mut root = SceneNode::new(Transform::new());
        assert!(root.remove_child(0).is_none());
        root.add_child(SceneNode::new(Transform::new()));
        assert!(root.remove_child(0).is_some());
        assert!(root.children.is_empty());
    }
}
