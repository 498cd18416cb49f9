//! Hierarchy configuration

use serde::{Deserialize, Serialize};

/// Settings for a [`World`](crate::ecs::World)'s transform hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Log a warning whenever a hierarchy mutation is rejected
    pub warn_on_rejection: bool,
    /// Push topology changes to the world's event queue
    pub record_events: bool,
    /// Number of passes kept in the propagation statistics history
    pub stats_samples: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            warn_on_rejection: true,
            record_events: true,
            stats_samples: 120,
        }
    }
}

impl HierarchyConfig {
    /// Enable or disable rejection warnings
    pub fn with_warn_on_rejection(mut self, warn: bool) -> Self {
        self.warn_on_rejection = warn;
        self
    }

    /// Enable or disable hierarchy events
    pub fn with_record_events(mut self, record: bool) -> Self {
        self.record_events = record;
        self
    }

    /// Set the statistics history length
    pub fn with_stats_samples(mut self, samples: usize) -> Self {
        self.stats_samples = samples;
        self
    }

    /// Parse a config from RON text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the RON parse error when the text is malformed
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}
