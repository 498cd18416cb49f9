//! Transform hierarchy mutation and traversal
//!
//! Every change to a node's parent link or child list goes through
//! [`World::attach_child`] and [`World::detach_child`], which keep both sides
//! of the relation consistent: a node is either a root absent from every child
//! list, or appears exactly once in its parent's list.

use hecs::Entity;

use super::components::Transform;
use super::error::HierarchyError;
use super::node::{ChildList, TransformNode};
use super::world::World;
use crate::core::HierarchyEvent;

impl World {
    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The parent of `entity`, or `None` for a root.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if `entity` has no node
    pub fn parent_of(&self, entity: Entity) -> Result<Option<Entity>, HierarchyError> {
        self.node(entity)
            .map(|node| node.parent())
            .ok_or(HierarchyError::MissingTransform(entity))
    }

    /// The children of `entity` in attach order.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if `entity` has no node
    pub fn children_of(&self, entity: Entity) -> Result<ChildList, HierarchyError> {
        self.node(entity)
            .map(|node| node.children().iter().copied().collect())
            .ok_or(HierarchyError::MissingTransform(entity))
    }

    /// Ancestors of `entity`, nearest first.
    #[must_use]
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut ancestors = Vec::new();
        let mut current = self.node(entity).and_then(|node| node.parent());
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.node(parent).and_then(|node| node.parent());
        }
        ancestors
    }

    /// Whether `ancestor` lies on the parent chain of `entity`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        self.ancestors(entity).contains(&ancestor)
    }

    /// All nodes without a parent.
    #[must_use]
    pub fn roots(&self) -> Vec<Entity> {
        self.inner
            .query::<&TransformNode>()
            .iter()
            .filter(|(_, node)| node.is_root())
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Pre-order walk from `root`. Returning `false` from `visit` skips that
    /// node's descendants.
    pub fn traverse(
        &self,
        root: Entity,
        mut visit: impl FnMut(Entity, &TransformNode, usize) -> bool,
    ) {
        let mut stack = vec![(root, 0usize)];
        while let Some((entity, depth)) = stack.pop() {
            let Some(node) = self.node(entity) else {
                continue;
            };
            if visit(entity, &*node, depth) {
                stack.extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
            }
        }
    }

    /// Every node below `root` in pre-order, `root` excluded.
    #[must_use]
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        self.traverse(root, |entity, _, depth| {
            if depth > 0 {
                out.push(entity);
            }
            true
        });
        out
    }

    pub(crate) fn traverse_mut(
        &mut self,
        root: Entity,
        mut visit: impl FnMut(&mut TransformNode, usize) -> bool,
    ) {
        let mut stack = vec![(root, 0usize)];
        while let Some((entity, depth)) = stack.pop() {
            let Ok(node) = self.node_mut(entity) else {
                continue;
            };
            if visit(&mut *node, depth) {
                stack.extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------------

    /// Mark `entity` and its whole subtree for recomputation.
    ///
    /// Use after editing a node's transform out of band.
    pub fn set_updated(&mut self, entity: Entity) {
        self.traverse_mut(entity, |node, _| {
            node.mark_dirty();
            true
        });
    }

    /// Recompute the world transform of `entity` and its ancestors right now,
    /// top-down, without waiting for the next propagation pass.
    ///
    /// Dirty flags are left as they were, so the next pass still reports
    /// these nodes as updated.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if `entity` has no node
    pub fn update_chain(&mut self, entity: Entity) -> Result<(), HierarchyError> {
        if !self.has_transform(entity) {
            return Err(HierarchyError::MissingTransform(entity));
        }
        let mut chain = self.ancestors(entity);
        chain.reverse();
        chain.push(entity);

        let mut parent_world: Option<Transform> = None;
        for link in chain {
            let node = self.node_mut(link)?;
            let was_dirty = node.is_dirty();
            node.update_transform();
            node.update_world_transform(parent_world.as_ref());
            if was_dirty {
                node.mark_dirty();
            }
            parent_world = Some(*node.world());
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Append `child` to `parent`'s children.
    ///
    /// A child that already has a parent is detached from it first. With
    /// `keep_world` the child's local transform is rewritten so that its world
    /// pose is unchanged under the new parent.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::CycleViolation`] if `child` is `parent` or one of its ancestors
    /// - [`HierarchyError::SingularTransform`] if `keep_world` is set and the
    ///   parent's world matrix cannot be inverted
    /// - [`HierarchyError::MissingTransform`] if either side has no node
    ///
    /// The tree is left unchanged on error.
    pub fn attach_child(
        &mut self,
        parent: Entity,
        child: Entity,
        keep_world: bool,
    ) -> Result<(), HierarchyError> {
        self.require(parent)?;
        self.require(child)?;
        if child == parent || self.is_ancestor(child, parent) {
            self.emit(HierarchyEvent::AttachRejected { parent, child });
            return Err(self.reject(HierarchyError::CycleViolation { parent, child }));
        }

        let new_local = if keep_world {
            self.update_chain(parent)?;
            self.update_chain(child)?;
            let parent_world = *self.node_mut(parent)?.world();
            let child_world = *self.node_mut(child)?.world();
            let Some(inverse) = parent_world.inverse() else {
                return Err(self.reject(HierarchyError::SingularTransform(parent)));
            };
            let mut local = Transform::compose(&inverse, &child_world);
            local.update();
            Some(local)
        } else {
            None
        };

        if let Some(old_parent) = self.parent_of(child)? {
            if let Ok(node) = self.node_mut(old_parent) {
                node.remove_child(child);
            }
            self.emit(HierarchyEvent::ChildDetached {
                parent: old_parent,
                child,
            });
        }

        self.node_mut(parent)?.push_child(child);
        let node = self.node_mut(child)?;
        node.set_parent(Some(parent));
        if let Some(local) = new_local {
            node.set_local(local);
        }
        self.set_updated(child);
        self.refresh_visibility(child);

        self.emit(HierarchyEvent::ChildAttached { parent, child });
        log::debug!("Attached {} under {}", self.label(child), self.label(parent));
        Ok(())
    }

    /// Remove `child` from `parent`'s children, making it a root.
    ///
    /// With `keep_world` the child's local transform becomes its last world
    /// transform. Returns `Ok(false)` when `child` was not a child of `parent`.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::SelfDetach`] if `parent == child`
    /// - [`HierarchyError::MissingTransform`] if `parent` has no node
    pub fn detach_child(
        &mut self,
        parent: Entity,
        child: Entity,
        keep_world: bool,
    ) -> Result<bool, HierarchyError> {
        if parent == child {
            return Err(self.reject(HierarchyError::SelfDetach(child)));
        }
        self.require(parent)?;
        let is_member = self
            .node(parent)
            .is_some_and(|node| node.children().contains(&child));
        if !is_member {
            return Ok(false);
        }

        let new_local = if keep_world && self.has_transform(child) {
            self.update_chain(child)?;
            let mut local = *self.node_mut(child)?.world();
            local.update();
            Some(local)
        } else {
            None
        };

        self.node_mut(parent)?.remove_child(child);
        if let Ok(node) = self.node_mut(child) {
            node.set_parent(None);
            if let Some(local) = new_local {
                node.set_local(local);
            }
        }
        self.set_updated(child);
        self.refresh_visibility(child);

        self.emit(HierarchyEvent::ChildDetached { parent, child });
        log::debug!("Detached {} from {}", self.label(child), self.label(parent));
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Hide `entity` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if `entity` has no node
    pub fn hide(&mut self, entity: Entity) -> Result<(), HierarchyError> {
        self.require(entity)?;
        self.node_mut(entity)?.set_hidden(true);
        self.traverse_mut(entity, |node, _| {
            node.set_visibly_hidden(true);
            true
        });
        Ok(())
    }

    /// Clear `entity`'s own hidden flag.
    ///
    /// It stays visibly hidden while any ancestor is hidden. Otherwise its
    /// subtree is revealed, stopping at descendants that were hidden themselves.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if `entity` has no node
    pub fn show(&mut self, entity: Entity) -> Result<(), HierarchyError> {
        self.require(entity)?;
        self.node_mut(entity)?.set_hidden(false);

        let ancestor_hidden = self
            .ancestors(entity)
            .into_iter()
            .any(|ancestor| self.node(ancestor).is_some_and(|node| node.is_hidden()));
        if ancestor_hidden {
            self.node_mut(entity)?.set_visibly_hidden(true);
            return Ok(());
        }

        self.traverse_mut(entity, |node, depth| {
            if depth > 0 && node.is_hidden() {
                return false;
            }
            node.set_visibly_hidden(false);
            true
        });
        Ok(())
    }

    /// Whether `entity` is neither hidden nor under a hidden ancestor.
    #[must_use]
    pub fn is_visible(&self, entity: Entity) -> bool {
        self.node(entity)
            .is_some_and(|node| !node.is_visibly_hidden())
    }

    /// Re-derive `visibly_hidden` below a node whose parent just changed.
    fn refresh_visibility(&mut self, entity: Entity) {
        let inherited = self
            .node(entity)
            .and_then(|node| node.parent())
            .and_then(|parent| self.node(parent))
            .is_some_and(|parent| parent.is_visibly_hidden());

        let mut stack = vec![(entity, inherited)];
        while let Some((current, inherited)) = stack.pop() {
            let Ok(node) = self.node_mut(current) else {
                continue;
            };
            let hidden = inherited || node.is_hidden();
            node.set_visibly_hidden(hidden);
            stack.extend(node.children().iter().map(|&child| (child, hidden)));
        }
    }

    fn require(&self, entity: Entity) -> Result<(), HierarchyError> {
        if self.has_transform(entity) {
            Ok(())
        } else {
            Err(self.reject(HierarchyError::MissingTransform(entity)))
        }
    }
}
