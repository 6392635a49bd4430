//! Presence tracking of nearby stations from overheard management frames.
//!
//! Each hardware address moves Unknown -> Active on its first observation,
//! stays Active while re-observed, and is evicted lazily: `list_active`
//! drops entries older than the eviction window as a side effect of
//! listing. There is no background sweep.
//!
//! The map is written from the capture path (which may be a driver
//! callback on another thread) and read from request handlers, so every
//! access goes through one mutex.

use crate::diagnostics::Diagnostics;
use crate::frame::{FrameHeader, FrameKind};
use crate::mac::MacAddr;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_EVICTION_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_COUNT_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEntry {
    pub hardware_address: MacAddr,
    pub last_seen_at: Instant,
}

/// Listing row handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub hardware_address: MacAddr,
    pub seconds_since_last_seen: u64,
}

#[derive(Debug, Default)]
struct PresenceState {
    entries: HashMap<MacAddr, Instant>,
    /// Whether captured frames are fed into the map.
    tracking: bool,
    /// Set while stopped; aging is evaluated against this instant.
    paused_at: Option<Instant>,
}

impl PresenceState {
    fn effective_now(&self, now: Instant) -> Instant {
        match self.paused_at {
            Some(paused) if paused < now => paused,
            _ => now,
        }
    }
}

#[derive(Debug)]
pub struct PresenceTracker {
    eviction_window: Duration,
    count_window: Duration,
    state: Mutex<PresenceState>,
    diagnostics: Arc<Diagnostics>,
}

impl PresenceTracker {
    pub fn new(eviction_window: Duration, count_window: Duration) -> Self {
        Self {
            eviction_window,
            count_window,
            state: Mutex::new(PresenceState::default()),
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    /// Shares the engine-wide counters instead of a private set.
    pub fn with_diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn eviction_window(&self) -> Duration {
        self.eviction_window
    }

    pub fn count_window(&self) -> Duration {
        self.count_window
    }

    fn lock(&self) -> MutexGuard<'_, PresenceState> {
        // Entries are plain timestamps; a panic elsewhere cannot leave them torn.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts or refreshes `addr`. Broadcast and all-zero addresses are
    /// ignored. A timestamp older than the stored one does not move it back.
    pub fn observe(&self, addr: MacAddr, at: Instant) {
        if addr.is_broadcast() || addr.is_zero() {
            return;
        }
        let mut state = self.lock();
        state
            .entries
            .entry(addr)
            .and_modify(|seen| {
                if at > *seen {
                    *seen = at;
                }
            })
            .or_insert(at);
    }

    /// Radio callback entry point. Only management frames are considered,
    /// and only while tracking is started.
    pub fn record_frame(&self, frame: &[u8], at: Instant) {
        if !self.is_tracking() {
            return;
        }
        let Some(header) = FrameHeader::parse(frame) else {
            self.diagnostics.frame_malformed();
            return;
        };
        if header.kind != FrameKind::Management {
            return;
        }
        for addr in header.station_addresses() {
            self.observe(addr, at);
        }
    }

    /// Entries seen within the eviction window, most recent first. Entries
    /// outside the window are removed for good.
    pub fn list_active(&self, now: Instant) -> Vec<PresenceEntry> {
        let mut state = self.lock();
        self.evict_and_list(&mut state, now).1
    }

    /// `list_active` shaped for the HTTP layer. Ages are measured against the
    /// same instant the eviction used.
    pub fn list_clients(&self, now: Instant) -> Vec<ClientView> {
        let mut state = self.lock();
        let (reference, active) = self.evict_and_list(&mut state, now);
        drop(state);
        active
            .into_iter()
            .map(|entry| ClientView {
                hardware_address: entry.hardware_address,
                seconds_since_last_seen: reference
                    .saturating_duration_since(entry.last_seen_at)
                    .as_secs(),
            })
            .collect()
    }

    /// Returns the effective now along with the surviving entries.
    fn evict_and_list(
        &self,
        state: &mut PresenceState,
        now: Instant,
    ) -> (Instant, Vec<PresenceEntry>) {
        let window = self.eviction_window;
        let now = state.effective_now(now);
        let before = state.entries.len();
        state
            .entries
            .retain(|_, seen| now.saturating_duration_since(*seen) <= window);
        let evicted = before - state.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = state.entries.len(), "Evicted stale presence entries");
        }

        let mut active: Vec<PresenceEntry> = state
            .entries
            .iter()
            .map(|(addr, seen)| PresenceEntry {
                hardware_address: *addr,
                last_seen_at: *seen,
            })
            .collect();
        active.sort_by(|a, b| {
            b.last_seen_at
                .cmp(&a.last_seen_at)
                .then(a.hardware_address.cmp(&b.hardware_address))
        });
        (now, active)
    }

    /// Number of entries seen within the count window. Does not evict.
    pub fn estimated_count(&self, now: Instant) -> usize {
        let window = self.count_window;
        let state = self.lock();
        let now = state.effective_now(now);
        state
            .entries
            .values()
            .filter(|seen| now.saturating_duration_since(**seen) <= window)
            .count()
    }

    pub fn is_tracking(&self) -> bool {
        self.lock().tracking
    }

    /// Wires the capture path back in. Entries recorded before a `stop`
    /// resume aging from where they were frozen.
    pub fn start(&self, now: Instant) {
        let mut state = self.lock();
        if state.tracking {
            return;
        }
        if let Some(paused) = state.paused_at.take() {
            let span = now.saturating_duration_since(paused);
            for seen in state.entries.values_mut() {
                *seen = (*seen + span).min(now);
            }
        }
        state.tracking = true;
    }

    /// Unwires the capture path and freezes the aging of recorded entries.
    pub fn stop(&self, now: Instant) {
        let mut state = self.lock();
        if !state.tracking {
            return;
        }
        state.tracking = false;
        state.paused_at = Some(now);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_EVICTION_WINDOW, DEFAULT_COUNT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{management_frame, subtype};

    const A: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0A]);
    const B: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0B]);
    const AP: MacAddr = MacAddr([0x0A, 0, 0, 0, 0, 0x01]);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn reobserving_refreshes_in_place() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        tracker.observe(A, t0);
        tracker.observe(A, t0 + secs(5));
        let active = tracker.list_active(t0 + secs(5));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].last_seen_at, t0 + secs(5));

        // An older timestamp does not roll the entry back.
        tracker.observe(A, t0 + secs(1));
        assert_eq!(tracker.list_active(t0 + secs(5))[0].last_seen_at, t0 + secs(5));
    }

    #[test]
    fn broadcast_and_zero_are_never_admitted() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        tracker.observe(MacAddr::BROADCAST, t0);
        tracker.observe(MacAddr::ZERO, t0);
        assert!(tracker.is_empty());
        assert!(tracker.list_active(t0).is_empty());
    }

    #[test]
    fn listing_evicts_stale_entries_for_good() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        tracker.observe(A, t0);
        tracker.observe(B, t0 + secs(50));

        assert_eq!(tracker.list_active(t0 + secs(60)).len(), 2);
        let later = tracker.list_active(t0 + secs(61));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].hardware_address, B);
        assert_eq!(tracker.len(), 1);

        // Re-observing A with a timestamp already outside the window does not revive it.
        tracker.observe(A, t0);
        let again = tracker.list_active(t0 + secs(61));
        assert!(again.iter().all(|e| e.hardware_address != A));
    }

    #[test]
    fn estimated_count_uses_shorter_window_without_evicting() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        tracker.observe(A, t0);
        tracker.observe(B, t0 + secs(20));

        let now = t0 + secs(45);
        assert_eq!(tracker.estimated_count(now), 1);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.list_active(now).len(), 2);
    }

    #[test]
    fn frames_only_feed_while_tracking() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        let frame = management_frame(subtype::ASSOC_REQUEST, AP, A, AP);

        tracker.record_frame(&frame, t0);
        assert!(tracker.is_empty());

        tracker.start(t0);
        tracker.record_frame(&frame, t0);
        let active = tracker.list_active(t0);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].hardware_address, A);
    }

    #[test]
    fn malformed_frames_are_counted() {
        let diagnostics = Arc::new(Diagnostics::new());
        let tracker = PresenceTracker::default().with_diagnostics(diagnostics.clone());
        tracker.start(Instant::now());
        tracker.record_frame(&[0u8; 10], Instant::now());
        assert!(tracker.is_empty());
        assert_eq!(diagnostics.snapshot().frames_malformed, 1);
    }

    #[test]
    fn stopping_freezes_aging() {
        let tracker = PresenceTracker::default();
        let t0 = Instant::now();
        tracker.start(t0);
        tracker.observe(A, t0);
        tracker.stop(t0 + secs(10));

        // Far past the window, but frozen at the stop instant.
        let clients = tracker.list_clients(t0 + secs(500));
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].seconds_since_last_seen, 10);

        // Resuming continues from 10 seconds of age.
        tracker.start(t0 + secs(500));
        assert!(tracker.is_tracking());
        let clients = tracker.list_clients(t0 + secs(520));
        assert_eq!(clients[0].seconds_since_last_seen, 30);
        assert!(tracker.list_active(t0 + secs(551)).is_empty());
    }

    #[test]
    fn client_ages_never_exceed_the_window_while_toggling() {
        let tracker = Arc::new(PresenceTracker::default());
        let t0 = Instant::now();
        tracker.start(t0);

        // Paused at t0+1 every entry is fresh; running at t0+100 it is stale.
        let toggler = {
            let tracker = tracker.clone();
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    tracker.stop(t0 + secs(1));
                    tracker.start(t0 + secs(1));
                }
            })
        };

        let window = tracker.eviction_window().as_secs();
        while !toggler.is_finished() {
            tracker.observe(A, t0 + secs(1));
            for client in tracker.list_clients(t0 + secs(100)) {
                assert!(client.seconds_since_last_seen <= window);
            }
        }
        toggler.join().unwrap();
    }

    #[test]
    fn concurrent_capture_and_listing_lose_nothing() {
        const STATIONS: u16 = 2000;
        let tracker = Arc::new(PresenceTracker::default());
        let t0 = Instant::now();
        tracker.start(t0);

        let capture = {
            let tracker = tracker.clone();
            std::thread::spawn(move || {
                for i in 1..=STATIONS {
                    let [hi, lo] = i.to_be_bytes();
                    let station = MacAddr([0x02, 0, 0, 0, hi, lo]);
                    let frame = management_frame(subtype::ASSOC_REQUEST, AP, station, AP);
                    tracker.record_frame(&frame, t0);
                }
            })
        };

        let mut last_seen = 0;
        while !capture.is_finished() {
            let listed = tracker.list_active(t0).len();
            assert!(listed >= last_seen);
            assert!(tracker.estimated_count(t0) >= listed);
            last_seen = listed;
        }
        capture.join().unwrap();

        assert_eq!(tracker.list_active(t0).len(), STATIONS as usize);
        assert_eq!(tracker.estimated_count(t0), STATIONS as usize);
        assert_eq!(tracker.len(), STATIONS as usize);
    }
}
