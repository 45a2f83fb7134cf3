//! Sync Metrics
//!
//! Counters for synchronization and write activity, shared across the
//! engine and its subscription task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Internal counter set. Engine-owned; read through
/// [`SyncMetricsSnapshot`].
#[derive(Debug, Default)]
pub(crate) struct SyncMetrics {
    snapshots_applied: AtomicU64,
    writes_issued: AtomicU64,
    writes_failed: AtomicU64,
    last_sync_time: Mutex<Option<String>>,
}

impl SyncMetrics {
    pub(crate) fn record_snapshot(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::SeqCst);
        *self.last_sync_time.lock().unwrap() = Some(chrono::Utc::now().to_rfc3339());
    }

    pub(crate) fn record_write_issued(&self) {
        self.writes_issued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_write_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> SyncMetricsSnapshot {
        SyncMetricsSnapshot {
            snapshots_applied: self.snapshots_applied.load(Ordering::SeqCst),
            writes_issued: self.writes_issued.load(Ordering::SeqCst),
            writes_failed: self.writes_failed.load(Ordering::SeqCst),
            last_sync_time: self.last_sync_time.lock().unwrap().clone(),
        }
    }
}

/// Point-in-time view of the engine's sync counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMetricsSnapshot {
    /// Snapshots applied to the cache since construction
    pub snapshots_applied: u64,
    /// Remote writes issued, including failed ones
    pub writes_issued: u64,
    /// Remote writes that came back with an error
    pub writes_failed: u64,
    /// RFC 3339 timestamp of the last applied snapshot
    pub last_sync_time: Option<String>,
}

impl SyncMetricsSnapshot {
    /// Fraction of issued writes that succeeded
    pub fn write_success_rate(&self) -> f64 {
        if self.writes_issued == 0 {
            0.0
        } else {
            (self.writes_issued - self.writes_failed) as f64 / self.writes_issued as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = SyncMetrics::default();
        let view = metrics.snapshot();
        assert_eq!(view.snapshots_applied, 0);
        assert_eq!(view.writes_issued, 0);
        assert_eq!(view.writes_failed, 0);
        assert!(view.last_sync_time.is_none());
    }

    #[test]
    fn test_record_snapshot_stamps_sync_time() {
        let metrics = SyncMetrics::default();
        metrics.record_snapshot();
        let view = metrics.snapshot();
        assert_eq!(view.snapshots_applied, 1);
        assert!(view.last_sync_time.is_some());
    }

    #[test]
    fn test_write_success_rate() {
        let metrics = SyncMetrics::default();
        assert_eq!(metrics.snapshot().write_success_rate(), 0.0);

        metrics.record_write_issued();
        metrics.record_write_issued();
        metrics.record_write_issued();
        metrics.record_write_failed();
        let view = metrics.snapshot();
        assert!((view.write_success_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
