//! Transform capability handle
//!
//! An entity with a [`TransformNode`] exposes its spatial API through a
//! [`TransformHandle`] borrowed from the world. Every mutator marks the node
//! and its subtree dirty, so callers never have to remember to.

use glam::{Mat4, Quat, Vec3};
use hecs::Entity;

use super::components::Transform;
use super::error::HierarchyError;
use super::node::{ChildList, TransformNode};
use super::world::World;

/// Mutable access to one entity's transform node
pub struct TransformHandle<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl World {
    /// Borrow the transform capability of `entity`, if it has a node.
    pub fn transform(&mut self, entity: Entity) -> Option<TransformHandle<'_>> {
        if self.has_transform(entity) {
            Some(TransformHandle {
                world: self,
                entity,
            })
        } else {
            None
        }
    }
}

impl TransformHandle<'_> {
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    fn read<R>(&self, f: impl FnOnce(&TransformNode) -> R) -> R {
        // Handles only exist for entities with a node and borrow the world
        // exclusively; the fallback is unreachable in practice.
        match self.world.node(self.entity) {
            Some(node) => f(&*node),
            None => f(&TransformNode::new(Transform::IDENTITY)),
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut Transform)) -> &mut Self {
        if let Ok(node) = self.world.node_mut(self.entity) {
            f(node.local_mut());
        }
        self.world.set_updated(self.entity);
        self
    }

    // -------------------------------------------------------------------------
    // Local accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn local(&self) -> Transform {
        self.read(|node| *node.local())
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.read(|node| node.local().translation())
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.read(|node| node.local().rotation())
    }

    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.read(|node| node.local().scale())
    }

    // -------------------------------------------------------------------------
    // World accessors (as of the last propagation)
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn world(&self) -> Transform {
        self.read(|node| *node.world())
    }

    #[must_use]
    pub fn world_translation(&self) -> Vec3 {
        self.read(|node| node.world().translation())
    }

    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.read(|node| node.world().matrix())
    }

    #[must_use]
    pub fn normal_matrix(&self) -> Mat4 {
        self.read(|node| node.world().normal_matrix())
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.read(TransformNode::is_dirty)
    }

    #[must_use]
    pub fn is_updated(&self) -> bool {
        self.read(TransformNode::is_updated)
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn set_translation(&mut self, translation: impl Into<Vec3>) -> &mut Self {
        let translation = translation.into();
        self.edit(|t| t.set_translation(translation))
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.edit(|t| t.set_rotation(rotation))
    }

    /// Set the rotation from XYZ Euler angles (radians).
    pub fn set_rotation_euler(&mut self, angles: impl Into<Vec3>) -> &mut Self {
        let angles = angles.into();
        self.edit(|t| t.set_rotation_euler(angles))
    }

    pub fn set_scale(&mut self, scale: impl Into<Vec3>) -> &mut Self {
        let scale = scale.into();
        self.edit(|t| t.set_scale(scale))
    }

    pub fn set_uniform_scale(&mut self, scale: f32) -> &mut Self {
        self.edit(|t| t.set_uniform_scale(scale))
    }

    pub fn add_translation(&mut self, delta: impl Into<Vec3>) -> &mut Self {
        let delta = delta.into();
        self.edit(|t| t.add_translation(delta))
    }

    /// Add XYZ Euler angles (radians) to the current rotation.
    pub fn add_rotation(&mut self, delta: impl Into<Vec3>) -> &mut Self {
        let delta = delta.into();
        self.edit(|t| t.add_rotation(delta))
    }

    /// Replace the whole local transform.
    pub fn set_local(&mut self, local: Transform) -> &mut Self {
        self.edit(|t| *t = local)
    }

    /// Rotate so the node faces `target` (world space).
    ///
    /// The node's world position is brought up to date first, so translation
    /// changes made earlier in the same tick are honoured. Returns `false`
    /// when the direction is degenerate.
    pub fn look_at(&mut self, target: impl Into<Vec3>, up: impl Into<Vec3>) -> bool {
        let (target, up) = (target.into(), up.into());
        if self.world.update_chain(self.entity).is_err() {
            return false;
        }

        let eye = self.world_translation();
        let mut facing = Transform::IDENTITY;
        if !facing.look_at(eye, target, up) {
            log::debug!(
                "Ignoring degenerate look_at for {}",
                self.world.label(self.entity)
            );
            return false;
        }

        let parent_rotation = self
            .parent()
            .and_then(|parent| self.world.node(parent).map(|node| node.world().rotation()))
            .unwrap_or(Quat::IDENTITY);
        let local_rotation = parent_rotation.inverse() * facing.rotation();
        self.set_rotation(local_rotation);
        true
    }

    /// Flag this node and its subtree for recomputation after an out-of-band edit.
    pub fn set_updated(&mut self) -> &mut Self {
        self.world.set_updated(self.entity);
        self
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn parent(&self) -> Option<Entity> {
        self.read(TransformNode::parent)
    }

    #[must_use]
    pub fn children(&self) -> ChildList {
        self.read(|node| node.children().iter().copied().collect())
    }

    /// See [`World::attach_child`].
    ///
    /// # Errors
    ///
    /// Propagates the rejection from [`World::attach_child`]
    pub fn attach_child(&mut self, child: Entity, keep_world: bool) -> Result<(), HierarchyError> {
        self.world.attach_child(self.entity, child, keep_world)
    }

    /// See [`World::detach_child`].
    ///
    /// # Errors
    ///
    /// Propagates the rejection from [`World::detach_child`]
    pub fn detach_child(
        &mut self,
        child: Entity,
        keep_world: bool,
    ) -> Result<bool, HierarchyError> {
        self.world.detach_child(self.entity, child, keep_world)
    }

    /// Recompute this node's world transform immediately.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`World::update_chain`]
    pub fn update_now(&mut self) -> Result<(), HierarchyError> {
        self.world.update_chain(self.entity)
    }
}
