use crate::frame::{management_frame, subtype};
use crate::mac::MacAddr;
use crate::presence::PresenceTracker;
use crate::records::{auth_code, RawScanResult};
use crate::traits::RadioScanner;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

/// A mock scanner for local development.
/// It simulates a scan without any real hardware interaction.
#[derive(Debug)]
pub struct MockScanner {
    delay: Duration,
}

impl MockScanner {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(300),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn ap(ssid: &str, rssi: i32, channel: u8, auth: u8, last: u8) -> RawScanResult {
    RawScanResult {
        ssid: ssid.to_string(),
        rssi,
        channel,
        auth_code: auth,
        bssid: MacAddr([0x24, 0x0A, 0xC4, 0x10, 0x20, last]),
    }
}

#[async_trait]
impl RadioScanner for MockScanner {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn scan(&self) -> Result<Vec<RawScanResult>> {
        debug!("🤖 [MockScanner] Scanning for networks...");
        // Simulate the radio dwell time
        sleep(self.delay).await;

        // Return a fixed list of fake networks
        let networks = vec![
            ap("MyHomeWiFi", -42, 6, auth_code::WPA3_PSK, 0x01),
            ap("CafeGuest", -58, 1, auth_code::OPEN, 0x02),
            ap("Neighbor's Network", -67, 6, auth_code::WPA2_PSK, 0x03),
            ap("xfinitywifi", -74, 11, auth_code::WPA_WPA2_PSK, 0x04),
            ap("", -83, 11, auth_code::WPA2_PSK, 0x05),
            ap("CorpNet", -77, 6, auth_code::WPA2_ENTERPRISE, 0x06),
            ap("OldPrinter", -91, 3, auth_code::WEP, 0x07),
        ];

        debug!("🤖 [MockScanner] Found {} networks.", networks.len());
        Ok(networks)
    }
}

/// Stations the mock capture pretends to overhear.
const MOCK_STATIONS: [MacAddr; 5] = [
    MacAddr([0x3C, 0x22, 0xFB, 0x01, 0x02, 0x03]),
    MacAddr([0xA4, 0x83, 0xE7, 0x11, 0x12, 0x13]),
    MacAddr([0xDA, 0xA1, 0x19, 0x21, 0x22, 0x23]),
    MacAddr([0xF0, 0x18, 0x98, 0x31, 0x32, 0x33]),
    MacAddr([0x5E, 0xE0, 0x8B, 0x41, 0x42, 0x43]),
];

const MOCK_BSSID: MacAddr = MacAddr([0x24, 0x0A, 0xC4, 0x10, 0x20, 0x01]);

/// Synthesises management frames on a timer and feeds them to a tracker,
/// standing in for the radio's promiscuous-mode callback.
pub struct MockCapture;

impl MockCapture {
    /// The frames emitted on tick `n`. The last station goes quiet after a
    /// few ticks so eviction can be watched on the dashboard.
    pub fn frames_for_tick(n: u64) -> Vec<Vec<u8>> {
        let len = MOCK_STATIONS.len() as u64;
        let mut frames = vec![management_frame(
            subtype::BEACON,
            MacAddr::BROADCAST,
            MOCK_BSSID,
            MOCK_BSSID,
        )];

        let prober = MOCK_STATIONS[(n % (len - 1)) as usize];
        frames.push(management_frame(
            subtype::PROBE_REQUEST,
            MacAddr::BROADCAST,
            prober,
            MacAddr::BROADCAST,
        ));
        frames.push(management_frame(
            subtype::PROBE_RESPONSE,
            prober,
            MOCK_BSSID,
            MOCK_BSSID,
        ));

        if n < 3 {
            let quiet = MOCK_STATIONS[(len - 1) as usize];
            frames.push(management_frame(
                subtype::ASSOC_REQUEST,
                MOCK_BSSID,
                quiet,
                MOCK_BSSID,
            ));
        }
        frames
    }

    pub fn spawn(tracker: Arc<PresenceTracker>, period: Duration) -> JoinHandle<()> {
        info!("🤖 [MockCapture] Feeding synthetic frames every {:?}", period);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut n: u64 = 0;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                for frame in Self::frames_for_tick(n) {
                    tracker.record_frame(&frame, now);
                }
                n = n.wrapping_add(1);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_scan_includes_hidden_network() {
        let scanner = MockScanner::with_delay(Duration::ZERO);
        let results = scanner.scan().await.unwrap();
        assert_eq!(results.len(), 7);
        assert!(results.iter().any(|r| r.ssid.is_empty()));
    }

    #[test]
    fn synthetic_frames_never_count_the_access_point() {
        let tracker = PresenceTracker::default();
        let now = Instant::now();
        tracker.start(now);
        for n in 0..8 {
            for frame in MockCapture::frames_for_tick(n) {
                tracker.record_frame(&frame, now);
            }
        }
        let active = tracker.list_active(now);
        assert_eq!(active.len(), MOCK_STATIONS.len());
        assert!(active.iter().all(|e| e.hardware_address != MOCK_BSSID));
    }
}
