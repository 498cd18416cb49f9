//! World wrapper around hecs
//!
//! The hecs world is the arena every [`TransformNode`] lives in; parent and
//! child links are plain [`Entity`] handles into it.

use hecs::Entity;

use super::components::{Name, Transform};
use super::error::HierarchyError;
use super::node::TransformNode;
use crate::core::{EventQueue, HierarchyConfig, HierarchyEvent, HierarchyStats};

/// Scene world containing all entities, their components and the transform forest
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
    pub(crate) config: HierarchyConfig,
    pub(crate) events: EventQueue,
    pub(crate) stats: HierarchyStats,
}

impl World {
    /// Create a new empty world with default settings
    pub fn new() -> Self {
        Self::with_config(HierarchyConfig::default())
    }

    pub fn with_config(config: HierarchyConfig) -> Self {
        Self {
            inner: hecs::World::new(),
            stats: HierarchyStats::new(config.stats_samples),
            events: EventQueue::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Spawn a named root node with the given local transform
    pub fn spawn_node(&mut self, name: impl Into<String>, local: Transform) -> Entity {
        let entity = self.inner.spawn((Name::new(name),));
        let mut node = TransformNode::new(local);
        node.attached(entity);
        // Freshly spawned, so the insert cannot miss
        let _ = self.inner.insert_one(entity, node);
        self.emit(HierarchyEvent::TransformAttached { entity });
        entity
    }

    /// Give an existing entity a transform node.
    ///
    /// If the entity already has one, only its local transform is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if the entity does not exist
    pub fn attach_transform(
        &mut self,
        entity: Entity,
        local: Transform,
    ) -> Result<(), HierarchyError> {
        if !self.inner.contains(entity) {
            return Err(HierarchyError::MissingTransform(entity));
        }
        if let Ok(node) = self.inner.query_one_mut::<&mut TransformNode>(entity) {
            node.set_local(local);
            self.set_updated(entity);
            return Ok(());
        }

        let mut node = TransformNode::new(local);
        node.attached(entity);
        self.inner
            .insert_one(entity, node)
            .map_err(|_| HierarchyError::MissingTransform(entity))?;
        self.emit(HierarchyEvent::TransformAttached { entity });
        Ok(())
    }

    /// Remove an entity's transform node.
    ///
    /// The node is detached from its parent. Its children are not destroyed:
    /// they become roots and keep their world placement.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingTransform`] if the entity has no node
    pub fn detach_transform(&mut self, entity: Entity) -> Result<TransformNode, HierarchyError> {
        // Children first, while this node still has its full world placement
        for child in self.children_of(entity)? {
            self.detach_child(entity, child, true)?;
        }
        if let Some(parent) = self.parent_of(entity)? {
            self.detach_child(parent, entity, false)?;
        }

        let mut node = self
            .inner
            .remove_one::<TransformNode>(entity)
            .map_err(|_| HierarchyError::MissingTransform(entity))?;
        if node.detached().is_none() {
            log::debug!("Removed transform node of {entity:?} that was never attached");
        }
        self.emit(HierarchyEvent::TransformDetached { entity });
        Ok(node)
    }

    /// Despawn an entity, unlinking its transform node first
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if self.has_transform(entity) {
            // Cannot fail: the node was just checked
            let _ = self.detach_transform(entity);
        }
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Borrow an entity's transform node
    pub fn node(&self, entity: Entity) -> Option<hecs::Ref<'_, TransformNode>> {
        self.inner.get::<&TransformNode>(entity).ok()
    }

    #[must_use]
    pub fn has_transform(&self, entity: Entity) -> bool {
        self.node(entity).is_some()
    }

    /// Human-readable identity for diagnostics: the `Name` if present
    #[must_use]
    pub fn label(&self, entity: Entity) -> String {
        match self.inner.get::<&Name>(entity) {
            Ok(name) => format!("'{}'", name.as_str()),
            Err(_) => format!("{entity:?}"),
        }
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities, events and statistics
    pub fn clear(&mut self) {
        self.inner.clear();
        self.events.clear();
        self.stats.reset();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    #[must_use]
    pub fn stats(&self) -> &HierarchyStats {
        &self.stats
    }

    // -------------------------------------------------------------------------
    // Crate-internal helpers
    // -------------------------------------------------------------------------

    pub(crate) fn node_mut(
        &mut self,
        entity: Entity,
    ) -> Result<&mut TransformNode, HierarchyError> {
        self.inner
            .query_one_mut::<&mut TransformNode>(entity)
            .map_err(|_| HierarchyError::MissingTransform(entity))
    }

    pub(crate) fn emit(&mut self, event: HierarchyEvent) {
        if self.config.record_events {
            self.events.push(event);
        }
    }

    /// Report a rejected call and hand the error back
    pub(crate) fn reject(&self, error: HierarchyError) -> HierarchyError {
        if self.config.warn_on_rejection {
            match error {
                HierarchyError::CycleViolation { parent, child } => log::warn!(
                    "Rejected attaching {} under {}: would create a cycle",
                    self.label(child),
                    self.label(parent)
                ),
                HierarchyError::SelfDetach(entity) => {
                    log::warn!("Rejected {} detaching itself", self.label(entity));
                }
                HierarchyError::MissingTransform(entity) => {
                    log::warn!("{} has no transform node", self.label(entity));
                }
                HierarchyError::SingularTransform(entity) => log::warn!(
                    "World transform of {} is singular, cannot keep world placement",
                    self.label(entity)
                ),
            }
        }
        error
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
