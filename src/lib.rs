//! A transform hierarchy for 3D scenes
//!
//! This crate provides:
//! - Local and world transforms with cached matrices and normal matrices
//! - A parent/child tree of transform nodes stored in a hecs world
//! - Dirty tracking and top-down propagation of world transforms
//! - Scene capture and loading in RON or JSON

pub mod core;
pub mod ecs;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{
        HierarchyConfig, HierarchyEvent, HierarchyStats, PropagationStats, Scene, SceneError,
    };
    pub use crate::ecs::{
        HierarchyError, Name, Transform, TransformHandle, TransformNode, World,
    };
    pub use glam::{Mat4, Quat, Vec3};
    pub use hecs::Entity;
}
