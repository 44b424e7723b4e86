//! Process-wide admission counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for message admission outcomes.
///
/// One instance lives in the [`PluginRegistry`] and is bumped from
/// [`MessageEnvelope::validate`]; reads are snapshots, not synchronized
/// with writers.
///
/// [`PluginRegistry`]: crate::registry::PluginRegistry
/// [`MessageEnvelope::validate`]: crate::message::MessageEnvelope::validate
#[derive(Debug, Default)]
pub struct ServerStats {
    ttl_expired: AtomicU64,
    filtered: AtomicU64,
    passed: AtomicU64,
}

impl ServerStats {
    /// Create a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message rejected because its TTL admission window passed.
    pub fn increment_ttl_expired(&self) {
        self.ttl_expired.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message whose filter did not match this node.
    pub fn increment_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message that passed admission.
    pub fn increment_passed(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of TTL-expired rejections.
    pub fn ttl_expired(&self) -> u64 {
        self.ttl_expired.load(Ordering::Relaxed)
    }

    /// Number of filter rejections.
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    /// Number of admitted messages.
    pub fn passed(&self) -> u64 {
        self.passed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = ServerStats::new();
        assert_eq!(stats.ttl_expired(), 0);
        assert_eq!(stats.filtered(), 0);
        assert_eq!(stats.passed(), 0);
    }

    #[test]
    fn test_increments() {
        let stats = ServerStats::new();
        stats.increment_ttl_expired();
        stats.increment_ttl_expired();
        stats.increment_filtered();
        stats.increment_passed();

        assert_eq!(stats.ttl_expired(), 2);
        assert_eq!(stats.filtered(), 1);
        assert_eq!(stats.passed(), 1);
    }
}
