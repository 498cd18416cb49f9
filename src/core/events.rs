//! Hierarchy Event Queue
//!
//! A double-buffered queue of topology changes. The world pushes events as
//! nodes are attached, detached or rejected; collaborators (scripting, render
//! bookkeeping) read them after the next `swap()` instead of listening on a
//! global bus.
//!
//! # Example
//!
//! ```ignore
//! world.attach_child(root, arm, false)?;
//!
//! world.events_mut().swap();
//! for event in world.events().iter() {
//!     if let HierarchyEvent::ChildAttached { parent, child } = event {
//!         rebuild_batch(*parent, *child);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use hecs::Entity;

// ============================================================================
// Event Types
// ============================================================================

/// A change to the transform hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HierarchyEvent {
    /// A child was appended to a parent's child list.
    ChildAttached {
        parent: Entity,
        child: Entity,
    },

    /// A child was removed from a parent's child list.
    ChildDetached {
        parent: Entity,
        child: Entity,
    },

    /// An attach was refused because it would create a cycle.
    AttachRejected {
        parent: Entity,
        child: Entity,
    },

    /// An entity received a transform node.
    TransformAttached {
        entity: Entity,
    },

    /// An entity lost its transform node.
    TransformDetached {
        entity: Entity,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed before a `swap()` become readable after it and stay readable
/// until the following `swap()`.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<HierarchyEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<HierarchyEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event, readable after the next `swap()`.
    #[inline]
    pub fn push(&mut self, event: HierarchyEvent) {
        self.pending.push_back(event);
    }

    /// Make pending events readable and start a fresh pending buffer.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events made readable by the last `swap()`.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyEvent> {
        self.processing.iter()
    }

    /// Take ownership of the readable events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = HierarchyEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop both buffers.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entities() -> (Entity, Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let (parent, child) = test_entities();
        let mut queue = EventQueue::new();

        queue.push(HierarchyEvent::ChildAttached { parent, child });
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.iter().next(),
            Some(&HierarchyEvent::ChildAttached { parent, child })
        );
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let (parent, child) = test_entities();
        let mut queue = EventQueue::new();

        queue.push(HierarchyEvent::ChildAttached { parent, child });
        queue.swap();
        queue.push(HierarchyEvent::ChildDetached { parent, child });

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], HierarchyEvent::ChildAttached { .. }));

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], HierarchyEvent::ChildDetached { .. }));
    }

    #[test]
    fn test_event_queue_drain_and_clear() {
        let (entity, other) = test_entities();
        let mut queue = EventQueue::new();

        queue.push(HierarchyEvent::TransformAttached { entity });
        queue.push(HierarchyEvent::TransformDetached { entity });
        queue.swap();
        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());

        queue.push(HierarchyEvent::TransformAttached { entity: other });
        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
