//! Core module
//!
//! Configuration, events, statistics and scene persistence around the hierarchy

mod config;
mod debug;
mod events;
mod scene;

pub use config::HierarchyConfig;
pub use debug::{HierarchyStats, PropagationStats};
pub use events::{EventQueue, HierarchyEvent};
pub use scene::{Scene, SceneError, SerializedEntity};
