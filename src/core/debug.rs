//! Propagation statistics

use std::collections::VecDeque;

/// Counters for a single propagation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Nodes that carry a transform
    pub nodes: usize,
    /// Root nodes the pass walked from
    pub roots: usize,
    /// Nodes whose local matrix was rebuilt
    pub locals_updated: usize,
    /// Nodes whose world transform was recomputed
    pub worlds_updated: usize,
}

/// Rolling history of propagation passes
#[derive(Debug)]
pub struct HierarchyStats {
    /// Worlds-updated count per pass, newest last
    history: VecDeque<usize>,
    max_samples: usize,
    last: PropagationStats,
    total_passes: u64,
    avg_worlds_updated: f32,
    max_worlds_updated: usize,
}

impl HierarchyStats {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            history: VecDeque::with_capacity(max_samples),
            max_samples,
            last: PropagationStats::default(),
            total_passes: 0,
            avg_worlds_updated: 0.0,
            max_worlds_updated: 0,
        }
    }

    /// Record the result of a pass
    pub fn record_pass(&mut self, stats: PropagationStats) {
        self.total_passes += 1;
        self.last = stats;

        if self.history.len() >= self.max_samples {
            self.history.pop_front();
        }
        self.history.push_back(stats.worlds_updated);

        let total: usize = self.history.iter().sum();
        self.avg_worlds_updated = total as f32 / self.history.len() as f32;
        self.max_worlds_updated = self.history.iter().copied().max().unwrap_or(0);
    }

    #[must_use]
    pub fn last(&self) -> PropagationStats {
        self.last
    }

    #[must_use]
    pub fn total_passes(&self) -> u64 {
        self.total_passes
    }

    /// Average world recomputations per pass over the history window
    #[must_use]
    pub fn avg_worlds_updated(&self) -> f32 {
        self.avg_worlds_updated
    }

    #[must_use]
    pub fn max_worlds_updated(&self) -> usize {
        self.max_worlds_updated
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        self.history.clear();
        self.last = PropagationStats::default();
        self.total_passes = 0;
        self.avg_worlds_updated = 0.0;
        self.max_worlds_updated = 0;
    }

    /// One-line summary for logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "passes: {} | last: {}/{} worlds | avg: {:.1} | max: {}",
            self.total_passes,
            self.last.worlds_updated,
            self.last.nodes,
            self.avg_worlds_updated,
            self.max_worlds_updated
        )
    }
}

impl Default for HierarchyStats {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(worlds_updated: usize) -> PropagationStats {
        PropagationStats {
            nodes: 10,
            roots: 1,
            locals_updated: worlds_updated,
            worlds_updated,
        }
    }

    #[test]
    fn test_record_pass_averages() {
        let mut stats = HierarchyStats::new(4);
        stats.record_pass(pass(2));
        stats.record_pass(pass(4));
        assert_eq!(stats.total_passes(), 2);
        assert!((stats.avg_worlds_updated() - 3.0).abs() < f32::EPSILON);
        assert_eq!(stats.max_worlds_updated(), 4);
        assert_eq!(stats.last().worlds_updated, 4);
    }

    #[test]
    fn test_history_window_rolls() {
        let mut stats = HierarchyStats::new(2);
        stats.record_pass(pass(10));
        stats.record_pass(pass(0));
        stats.record_pass(pass(0));
        assert_eq!(stats.max_worlds_updated(), 0);
        assert_eq!(stats.total_passes(), 3);
    }

    #[test]
    fn test_reset() {
        let mut stats = HierarchyStats::default();
        stats.record_pass(pass(5));
        stats.reset();
        assert_eq!(stats.total_passes(), 0);
        assert_eq!(stats.last(), PropagationStats::default());
        assert!(stats.summary().starts_with("passes: 0"));
    }
}
