use analyzer_core::histogram::ChannelHistogram;
use analyzer_core::mac::MacAddr;
use analyzer_core::presence::PresenceTracker;
use analyzer_core::records::{auth_code, AccessPointStore, RawScanResult, HIDDEN_SSID_LABEL};
use analyzer_core::scan::ScanOrchestrator;
use analyzer_core::signal::{SignalQuality, TierPolicy};
use analyzer_core::traits::RadioScanner;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Replay(Vec<RawScanResult>);

#[async_trait]
impl RadioScanner for Replay {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn scan(&self) -> analyzer_core::Result<Vec<RawScanResult>> {
        Ok(self.0.clone())
    }
}

fn raw(ssid: &str, rssi: i32, channel: u8, auth: u8, last: u8) -> RawScanResult {
    RawScanResult {
        ssid: ssid.to_string(),
        rssi,
        channel,
        auth_code: auth,
        bssid: MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, last]),
    }
}

#[tokio::test]
async fn hidden_and_named_networks_on_one_channel() {
    let scanner = Arc::new(Replay(vec![
        raw("", -45, 6, auth_code::OPEN, 1),
        raw("Home", -72, 6, auth_code::WPA2_PSK, 2),
    ]));
    let orchestrator = ScanOrchestrator::new(scanner, Arc::new(AccessPointStore::default()));

    let snapshot = orchestrator.run_scan().await;
    assert_eq!(snapshot.len(), 2);

    assert!(snapshot[0].is_hidden);
    assert_eq!(snapshot[0].ssid, HIDDEN_SSID_LABEL);
    assert_eq!(snapshot[0].encryption.label(), "Open");
    assert_eq!(snapshot[0].hardware_address.to_string(), "AA:BB:CC:DD:EE:01");

    assert!(!snapshot[1].is_hidden);
    assert_eq!(snapshot[1].encryption.label(), "WPA2");
    // -72 dBm sits in the -80..-70 band.
    let views = orchestrator.views(&snapshot);
    assert_eq!(views[0].quality, SignalQuality::Excellent);
    assert_eq!(views[1].quality, SignalQuality::Weak);
    assert_eq!(views[1].signal_percent, 56);
    assert_eq!(TierPolicy::FiveTier.quality(-65), SignalQuality::Fair);

    let histogram = orchestrator.histogram();
    assert_eq!(histogram.count(6), 2);
    assert_eq!(histogram.total(), 2);
    assert_eq!(histogram.most_used_channel, 6);
    assert_eq!(histogram, ChannelHistogram::from_records(&snapshot, 13));
}

#[tokio::test]
async fn four_tier_deployment_reports_poor() {
    let scanner = Arc::new(Replay(vec![raw("Home", -72, 6, auth_code::WPA2_PSK, 2)]));
    let orchestrator = ScanOrchestrator::new(scanner, Arc::new(AccessPointStore::default()))
        .with_tier_policy(TierPolicy::FourTier)
        .with_max_channel(14);

    let snapshot = orchestrator.run_scan().await;
    assert_eq!(orchestrator.views(&snapshot)[0].quality, SignalQuality::Poor);
    assert_eq!(orchestrator.histogram().channels.len(), 14);
}

#[tokio::test]
async fn scans_replace_rather_than_merge() {
    let first = Arc::new(Replay(vec![
        raw("A", -50, 1, auth_code::OPEN, 1),
        raw("B", -50, 6, auth_code::OPEN, 2),
    ]));
    let store = Arc::new(AccessPointStore::default());
    let orchestrator = ScanOrchestrator::new(first, store.clone());
    let old = orchestrator.run_scan().await;

    let replacement = Arc::new(Replay(vec![raw("C", -50, 11, auth_code::OPEN, 3)]));
    let second = ScanOrchestrator::new(replacement, store.clone());
    let new = second.run_scan().await;

    assert_eq!(old.len(), 2);
    assert_eq!(new.len(), 1);
    assert_eq!(store.snapshot()[0].ssid, "C");
}

#[tokio::test]
async fn client_estimate_follows_count_window() {
    let tracker = Arc::new(PresenceTracker::new(Duration::from_secs(60), Duration::from_secs(30)));
    let now = Instant::now();
    tracker.start(now);
    for last in 1..=3u8 {
        tracker.observe(MacAddr([0x02, 0, 0, 0, 0, last]), now);
    }
    tracker.observe(MacAddr::BROADCAST, now);

    let scanner = Arc::new(Replay(vec![raw("Home", -60, 6, auth_code::WPA2_PSK, 1)]));
    let orchestrator = ScanOrchestrator::new(scanner, Arc::new(AccessPointStore::default()))
        .with_presence(tracker.clone());

    let snapshot = orchestrator.run_scan().await;
    assert_eq!(snapshot[0].estimated_client_count, Some(3));
    assert_eq!(tracker.list_clients(now).len(), 3);
}
