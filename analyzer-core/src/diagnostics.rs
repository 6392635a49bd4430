use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for anomalies the engine otherwise degrades silently on.
#[derive(Debug, Default)]
pub struct Diagnostics {
    scans_total: AtomicU64,
    scans_failed: AtomicU64,
    records_truncated: AtomicU64,
    frames_malformed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub scans_total: u64,
    pub scans_failed: u64,
    pub records_truncated: u64,
    pub frames_malformed: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_completed(&self) {
        self.scans_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scan_failed(&self) {
        self.scans_total.fetch_add(1, Ordering::Relaxed);
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_truncated(&self, n: usize) {
        if n > 0 {
            self.records_truncated.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub fn frame_malformed(&self) {
        self.frames_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            scans_total: self.scans_total.load(Ordering::Relaxed),
            scans_failed: self.scans_failed.load(Ordering::Relaxed),
            records_truncated: self.records_truncated.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
        }
    }
}
