//! Transform hierarchy node
//!
//! A [`TransformNode`] is the component that places an entity in the
//! transform hierarchy. It owns the entity's local [`Transform`], caches the
//! derived world [`Transform`], and links to its parent and children through
//! non-owning [`Entity`] handles into the world arena.
//!
//! # State
//!
//! ```text
//! Clean --(local mutation / re-parent)--> Dirty --(propagation)--> Clean
//! ```
//!
//! `updated` is set by the pass that recomputed the world transform and
//! cleared at the start of the next one.
//!
//! Structural fields are only written by the hierarchy mutator in
//! [`super::hierarchy`], which keeps parent and child lists consistent.

use hecs::Entity;
use smallvec::SmallVec;

use super::components::Transform;

/// Ordered child list, in attach order
pub type ChildList = SmallVec<[Entity; 8]>;

/// A node in the transform hierarchy
///
/// Nodes are created by [`World::spawn_node`](super::World::spawn_node) and
/// [`World::attach_transform`](super::World::attach_transform) only, so every
/// live node enters the world as a linkless root.
#[derive(Debug)]
pub struct TransformNode {
    /// Pose relative to the parent
    local: Transform,
    /// Derived pose in world space, valid only while not dirty
    world: Transform,
    /// Non-owning back-reference
    parent: Option<Entity>,
    /// Children in attach order
    children: ChildList,
    /// Entity this node is attached to, set by [`Self::attached`]
    owner: Option<Entity>,
    dirty: bool,
    updated: bool,
    /// Hidden by a direct `hide` call on this node
    hidden: bool,
    /// Effectively hidden, either directly or through an ancestor
    visibly_hidden: bool,
}

impl TransformNode {
    /// Create a detached root node with the given local transform.
    #[must_use]
    pub(crate) fn new(local: Transform) -> Self {
        Self {
            local,
            world: local,
            parent: None,
            children: ChildList::new(),
            owner: None,
            dirty: true,
            updated: false,
            hidden: false,
            visibly_hidden: false,
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle hooks
    // -------------------------------------------------------------------------

    /// Called when the node is attached to its owning entity.
    pub(crate) fn attached(&mut self, owner: Entity) {
        self.owner = Some(owner);
        self.dirty = true;
    }

    /// Called when the node is removed from its owning entity. Returns the
    /// previous owner, `None` for a node that was never attached.
    pub(crate) fn detached(&mut self) -> Option<Entity> {
        self.owner.take()
    }

    #[must_use]
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    #[must_use]
    #[inline]
    pub fn local(&self) -> &Transform {
        &self.local
    }

    /// World transform as of the last propagation.
    #[must_use]
    #[inline]
    pub fn world(&self) -> &Transform {
        &self.world
    }

    #[must_use]
    #[inline]
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    #[must_use]
    #[inline]
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    #[must_use]
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the last propagation pass recomputed this node's world transform.
    #[must_use]
    #[inline]
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[must_use]
    pub fn is_visibly_hidden(&self) -> bool {
        self.visibly_hidden
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Recompute the cached local matrix.
    pub fn update_transform(&mut self) {
        self.local.update();
    }

    /// Recompute the world transform from the parent's world transform.
    ///
    /// `parent_world` must be the current world transform of this node's
    /// parent, or `None` for a root.
    pub fn update_world_transform(&mut self, parent_world: Option<&Transform>) {
        self.world = match parent_world {
            Some(parent) => Transform::compose(parent, &self.local),
            None => self.local,
        };
        self.world.update_normal_matrix();
        self.dirty = false;
        self.updated = true;
    }

    // -------------------------------------------------------------------------
    // Crate-internal mutation
    // -------------------------------------------------------------------------

    pub(crate) fn local_mut(&mut self) -> &mut Transform {
        self.dirty = true;
        &mut self.local
    }

    pub(crate) fn set_local(&mut self, local: Transform) {
        self.local = local;
        self.dirty = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_updated(&mut self) {
        self.updated = false;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Entity>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: Entity) {
        debug_assert!(!self.children.contains(&child));
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.children.iter().position(|&e| e == child) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub(crate) fn set_visibly_hidden(&mut self, hidden: bool) {
        self.visibly_hidden = hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_new_node_is_dirty_root() {
        let node = TransformNode::new(Transform::IDENTITY);
        assert!(node.is_dirty());
        assert!(!node.is_updated());
        assert!(node.is_root());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_update_world_transform_root_copies_local() {
        let mut node = TransformNode::new(Transform::from_translation((1.0, 2.0, 3.0)));
        node.update_transform();
        node.update_world_transform(None);

        assert_eq!(node.world().translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.world().matrix(), node.local().matrix());
        assert!(!node.is_dirty());
        assert!(node.is_updated());
    }

    #[test]
    fn test_update_world_transform_composes_parent() {
        let parent = Transform::from_translation((1.0, 0.0, 0.0));
        let mut node = TransformNode::new(Transform::from_translation((0.0, 1.0, 0.0)));
        node.update_transform();
        node.update_world_transform(Some(&parent));
        assert!(
            node.world()
                .translation()
                .abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6)
        );
    }

    #[test]
    fn test_update_world_transform_is_idempotent() {
        let parent = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.4),
            Vec3::new(1.0, 2.0, 1.0),
        );
        let mut node = TransformNode::new(Transform::from_translation((0.5, 0.0, 0.0)));
        node.update_transform();
        node.update_world_transform(Some(&parent));
        let first = *node.world();
        node.update_world_transform(Some(&parent));
        assert_eq!(first, *node.world());
    }

    #[test]
    fn test_normal_matrix_uniform_vs_non_uniform() {
        let mut uniform = TransformNode::new(Transform::from_parts(
            Vec3::ONE,
            Quat::from_rotation_z(0.2),
            Vec3::splat(3.0),
        ));
        uniform.update_transform();
        uniform.update_world_transform(None);
        assert_eq!(uniform.world().normal_matrix(), uniform.world().matrix());

        let mut stretched = TransformNode::new(Transform::from_parts(
            Vec3::ONE,
            Quat::from_rotation_z(0.2),
            Vec3::new(1.0, 1.0, 4.0),
        ));
        stretched.update_transform();
        stretched.update_world_transform(None);
        let world = stretched.world().matrix();
        assert_eq!(stretched.world().normal_matrix(), world.inverse().transpose());
    }

    #[test]
    fn test_local_mutation_marks_dirty() {
        let mut node = TransformNode::new(Transform::IDENTITY);
        node.update_transform();
        node.update_world_transform(None);
        assert!(!node.is_dirty());

        node.local_mut().set_translation(Vec3::X);
        assert!(node.is_dirty());
    }

    #[test]
    fn test_child_list_keeps_order() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());

        let mut node = TransformNode::new(Transform::IDENTITY);
        node.push_child(a);
        node.push_child(b);
        node.push_child(c);
        assert_eq!(node.children(), &[a, b, c]);

        assert!(node.remove_child(b));
        assert!(!node.remove_child(b));
        assert_eq!(node.children(), &[a, c]);
    }

    #[test]
    fn test_lifecycle_hooks() {
        let mut world = hecs::World::new();
        let owner = world.spawn(());
        let mut node = TransformNode::new(Transform::IDENTITY);
        node.attached(owner);
        assert_eq!(node.owner(), Some(owner));
        assert_eq!(node.detached(), Some(owner));
        assert_eq!(node.owner(), None);
        assert_eq!(node.detached(), None);
    }
}
