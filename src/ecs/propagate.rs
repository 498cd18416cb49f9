//! Transform propagation
//!
//! One pass per tick:
//!
//! 1. Clear every node's `updated` flag and rebuild the local matrix of each
//!    dirty node.
//! 2. Walk each root's tree in pre-order, recomputing the world transform of
//!    every node that is dirty or whose parent was recomputed in this pass.
//!
//! Pre-order guarantees a parent's world transform is final before any of its
//! children reads it.

use hecs::Entity;

use super::components::Transform;
use super::node::TransformNode;
use super::world::World;
use crate::core::PropagationStats;

impl World {
    /// Run one propagation pass over every tree in the world.
    ///
    /// Hierarchy events raised since the previous pass become readable
    /// through [`World::events`].
    pub fn propagate(&mut self) -> PropagationStats {
        self.events.swap();
        let mut stats = PropagationStats::default();
        let mut roots = Vec::new();

        for (entity, node) in self.inner.query_mut::<&mut TransformNode>() {
            stats.nodes += 1;
            node.clear_updated();
            if node.is_dirty() {
                node.update_transform();
                stats.locals_updated += 1;
            }
            if node.is_root() {
                roots.push(entity);
            }
        }
        stats.roots = roots.len();

        let mut stack: Vec<(Entity, Option<Transform>, bool)> = Vec::new();
        for root in roots {
            stack.push((root, None, false));
            while let Some((entity, parent_world, parent_changed)) = stack.pop() {
                let Ok(node) = self.inner.query_one_mut::<&mut TransformNode>(entity) else {
                    continue;
                };
                let changed = parent_changed || node.is_dirty();
                if changed {
                    node.update_world_transform(parent_world.as_ref());
                    stats.worlds_updated += 1;
                }
                let world = *node.world();
                stack.extend(
                    node.children()
                        .iter()
                        .rev()
                        .map(|&child| (child, Some(world), changed)),
                );
            }
        }

        log::trace!(
            "Propagated {} of {} transforms from {} roots",
            stats.worlds_updated,
            stats.nodes,
            stats.roots
        );
        self.stats.record_pass(stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    const EPS: f32 = 1e-5;

    fn chain(world: &mut World, len: usize) -> Vec<Entity> {
        let nodes: Vec<Entity> = (0..len)
            .map(|i| world.spawn_node(format!("n{i}"), Transform::from_translation(Vec3::X)))
            .collect();
        for pair in nodes.windows(2) {
            world.attach_child(pair[0], pair[1], false).unwrap();
        }
        nodes
    }

    #[test]
    fn test_first_pass_updates_everything() {
        let mut world = World::new();
        let nodes = chain(&mut world, 4);

        let stats = world.propagate();
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.roots, 1);
        assert_eq!(stats.worlds_updated, 4);

        let leaf = world.node(nodes[3]).unwrap().world().translation();
        assert!(leaf.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), EPS));
        for &n in &nodes {
            let node = world.node(n).unwrap();
            assert!(node.is_updated());
            assert!(!node.is_dirty());
        }
    }

    #[test]
    fn test_clean_pass_does_nothing() {
        let mut world = World::new();
        let nodes = chain(&mut world, 3);
        world.propagate();

        let stats = world.propagate();
        assert_eq!(stats.locals_updated, 0);
        assert_eq!(stats.worlds_updated, 0);
        assert!(!world.node(nodes[0]).unwrap().is_updated());
    }

    #[test]
    fn test_only_dirty_subtree_is_recomputed() {
        let mut world = World::new();
        let root = world.spawn_node("root", Transform::IDENTITY);
        let left = world.spawn_node("left", Transform::IDENTITY);
        let right = world.spawn_node("right", Transform::IDENTITY);
        let leaf = world.spawn_node("leaf", Transform::IDENTITY);
        world.attach_child(root, left, false).unwrap();
        world.attach_child(root, right, false).unwrap();
        world.attach_child(left, leaf, false).unwrap();
        world.propagate();

        world.transform(left).unwrap().set_translation((0.0, 2.0, 0.0));
        let stats = world.propagate();

        assert_eq!(stats.worlds_updated, 2);
        assert!(world.node(left).unwrap().is_updated());
        assert!(world.node(leaf).unwrap().is_updated());
        assert!(!world.node(root).unwrap().is_updated());
        assert!(!world.node(right).unwrap().is_updated());

        let leaf_world = world.node(leaf).unwrap().world().translation();
        assert!(leaf_world.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPS));
    }

    #[test]
    fn test_parent_before_child_with_rotation() {
        let mut world = World::new();
        let root = world.spawn_node(
            "root",
            Transform::from_parts(
                Vec3::ZERO,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::ONE,
            ),
        );
        let arm = world.spawn_node("arm", Transform::from_translation((1.0, 0.0, 0.0)));
        let hand = world.spawn_node("hand", Transform::from_translation((1.0, 0.0, 0.0)));
        world.attach_child(root, arm, false).unwrap();
        world.attach_child(arm, hand, false).unwrap();

        world.propagate();

        // 90 degrees about Z maps +X to +Y
        let hand_world = world.node(hand).unwrap().world().translation();
        assert!(hand_world.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPS));
    }

    #[test]
    fn test_world_matches_composed_chain() {
        let mut world = World::new();
        let locals = [
            Transform::from_parts(
                Vec3::new(1.0, 0.0, 0.0),
                Quat::from_rotation_y(0.3),
                Vec3::splat(2.0),
            ),
            Transform::from_parts(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::from_rotation_x(0.7),
                Vec3::new(1.0, 2.0, 1.0),
            ),
            Transform::from_parts(Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY, Vec3::ONE),
        ];
        let nodes: Vec<Entity> = locals
            .iter()
            .enumerate()
            .map(|(i, &local)| world.spawn_node(format!("n{i}"), local))
            .collect();
        world.attach_child(nodes[0], nodes[1], false).unwrap();
        world.attach_child(nodes[1], nodes[2], false).unwrap();
        world.propagate();

        let expected = locals[0].matrix() * locals[1].matrix() * locals[2].matrix();
        let actual = world.node(nodes[2]).unwrap().world().matrix();
        assert!(actual.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_normal_matrix_follows_world_scale() {
        let mut world = World::new();
        let root = world.spawn_node("root", Transform::IDENTITY.with_scale([2.0, 2.0, 2.0]));
        let child = world.spawn_node("child", Transform::IDENTITY.with_scale([1.0, 3.0, 1.0]));
        world.attach_child(root, child, false).unwrap();
        world.propagate();

        let root_world = *world.node(root).unwrap().world();
        assert_eq!(root_world.normal_matrix(), root_world.matrix());

        let child_world = *world.node(child).unwrap().world();
        assert_eq!(
            child_world.normal_matrix(),
            child_world.matrix().inverse().transpose()
        );
    }

    #[test]
    fn test_stats_history_recorded() {
        let mut world = World::new();
        chain(&mut world, 2);
        world.propagate();
        world.propagate();
        assert_eq!(world.stats().total_passes(), 2);
        assert_eq!(world.stats().max_worlds_updated(), 2);
    }

    #[test]
    fn test_pass_publishes_events_without_growth() {
        let mut world = World::new();
        let parent = world.spawn_node("parent", Transform::IDENTITY);
        let child = world.spawn_node("child", Transform::IDENTITY);

        for _ in 0..100 {
            world.attach_child(parent, child, false).unwrap();
            world.detach_child(parent, child, false).unwrap();
            world.propagate();
        }

        assert_eq!(world.events().pending_count(), 0);
        assert_eq!(world.events().len(), 2);

        world.propagate();
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_multiple_roots() {
        let mut world = World::new();
        let a = chain(&mut world, 2);
        let b = chain(&mut world, 3);
        let stats = world.propagate();
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.worlds_updated, 5);
        let tip = world.node(b[2]).unwrap().world().translation();
        assert!(tip.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
        let tip = world.node(a[1]).unwrap().world().translation();
        assert!(tip.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPS));
    }
}
