//! Process-wide counters for runs

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every run of one downloader
#[derive(Debug, Default)]
pub struct Metrics {
    resources_resolved: AtomicU64,
    resources_failed: AtomicU64,
    transfers_completed: AtomicU64,
    transfers_failed: AtomicU64,
    bundles_written: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_resolved(&self) {
        self.resources_resolved.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "resources_resolved", "Metric incremented");
    }

    pub fn resource_failed(&self) {
        self.resources_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "resources_failed", "Metric incremented");
    }

    pub fn transfers(&self, completed: usize, failed: usize) {
        self.transfers_completed
            .fetch_add(completed as u64, Ordering::Relaxed);
        self.transfers_failed.fetch_add(failed as u64, Ordering::Relaxed);
        tracing::debug!(completed, failed, "Transfer metrics recorded");
    }

    pub fn bundle_written(&self) {
        self.bundles_written.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "bundles_written", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resources_resolved: self.resources_resolved.load(Ordering::Relaxed),
            resources_failed: self.resources_failed.load(Ordering::Relaxed),
            transfers_completed: self.transfers_completed.load(Ordering::Relaxed),
            transfers_failed: self.transfers_failed.load(Ordering::Relaxed),
            bundles_written: self.bundles_written.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub resources_resolved: u64,
    pub resources_failed: u64,
    /// Terminal transfers, failed ones included
    pub transfers_completed: u64,
    pub transfers_failed: u64,
    pub bundles_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.resource_resolved();
        metrics.resource_resolved();
        metrics.resource_failed();
        metrics.transfers(3, 1);
        metrics.bundle_written();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                resources_resolved: 2,
                resources_failed: 1,
                transfers_completed: 3,
                transfers_failed: 1,
                bundles_written: 1,
            }
        );
    }
}
