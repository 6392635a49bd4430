//! Scan orchestration: run the radio scan, derive records, publish them.

use crate::diagnostics::Diagnostics;
use crate::histogram::{ChannelHistogram, DEFAULT_MAX_CHANNEL};
use crate::presence::PresenceTracker;
use crate::records::{AccessPointRecord, AccessPointStore, Snapshot};
use crate::signal::{SignalQuality, TierPolicy};
use crate::traits::RadioScanner;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A record plus the classification the dashboard renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkView {
    #[serde(flatten)]
    pub record: AccessPointRecord,
    pub quality: SignalQuality,
    pub signal_percent: u8,
}

pub struct ScanOrchestrator {
    scanner: Arc<dyn RadioScanner>,
    store: Arc<AccessPointStore>,
    presence: Option<Arc<PresenceTracker>>,
    diagnostics: Arc<Diagnostics>,
    tier_policy: TierPolicy,
    max_channel: u8,
    // Serializes scans: the radio runs one at a time.
    scan_lock: Mutex<()>,
}

impl ScanOrchestrator {
    pub fn new(scanner: Arc<dyn RadioScanner>, store: Arc<AccessPointStore>) -> Self {
        Self {
            scanner,
            store,
            presence: None,
            diagnostics: Arc::new(Diagnostics::new()),
            tier_policy: TierPolicy::default(),
            max_channel: DEFAULT_MAX_CHANNEL,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn with_presence(mut self, presence: Arc<PresenceTracker>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_tier_policy(mut self, policy: TierPolicy) -> Self {
        self.tier_policy = policy;
        self
    }

    pub fn with_max_channel(mut self, max_channel: u8) -> Self {
        self.max_channel = max_channel;
        self
    }

    pub fn presence(&self) -> Option<&Arc<PresenceTracker>> {
        self.presence.as_ref()
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    pub fn tier_policy(&self) -> TierPolicy {
        self.tier_policy
    }

    /// Runs a scan and publishes the result. A failed scan publishes an
    /// empty sequence, indistinguishable from an empty radio environment.
    pub async fn run_scan(&self) -> Snapshot {
        match self.try_run_scan().await {
            Ok(snapshot) => snapshot,
            Err(_) => Arc::from(Vec::new()),
        }
    }

    /// Like [`run_scan`](Self::run_scan), but hands the scanner error back
    /// after the empty result has been published.
    pub async fn try_run_scan(&self) -> crate::Result<Snapshot> {
        let _guard = self.scan_lock.lock().await;
        let started = Instant::now();
        debug!(backend = self.scanner.name(), "Starting scan");

        let raw = match self.scanner.scan().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(backend = self.scanner.name(), "Scan failed: {}", e);
                self.diagnostics.scan_failed();
                self.store.replace(Vec::new());
                return Err(e);
            }
        };

        let client_estimate = self
            .presence
            .as_ref()
            .filter(|p| p.is_tracking())
            .map(|p| p.estimated_count(Instant::now()));

        let heard = raw.len();
        let records: Vec<AccessPointRecord> = raw
            .into_iter()
            .map(|r| AccessPointRecord::from_raw(r, client_estimate))
            .collect();

        let dropped = self.store.replace(records);
        if dropped > 0 {
            warn!(
                heard,
                kept = self.store.capacity(),
                "Scan exceeded record capacity, dropped {} access points",
                dropped
            );
        }
        self.diagnostics.records_truncated(dropped);
        self.diagnostics.scan_completed();

        info!(
            networks = heard - dropped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );
        Ok(self.store.snapshot())
    }

    /// Latest published records, without scanning.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn views(&self, snapshot: &[AccessPointRecord]) -> Vec<NetworkView> {
        snapshot
            .iter()
            .map(|record| {
                let report = self.tier_policy.classify(record.rssi);
                NetworkView {
                    record: record.clone(),
                    quality: report.quality,
                    signal_percent: report.percent,
                }
            })
            .collect()
    }

    pub fn histogram(&self) -> ChannelHistogram {
        ChannelHistogram::from_records(&self.store.snapshot(), self.max_channel)
    }
}
