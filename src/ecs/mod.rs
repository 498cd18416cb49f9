//! Entity Component System module
//!
//! Built on top of the hecs ECS library. Transform nodes are components, and
//! the hecs world is the arena their parent and child links point into.

mod components;
mod error;
mod handle;
mod hierarchy;
mod node;
mod propagate;
mod world;

pub use components::{Name, Transform};
pub use error::HierarchyError;
pub use handle::TransformHandle;
pub use node::{ChildList, TransformNode};
pub use world::World;
