//! Access point records and the store holding the latest scan.

use crate::mac::MacAddr;
use crate::signal::Rssi;
use serde::{Serialize, Serializer};
use std::sync::{Arc, RwLock};

/// Display name stored in place of an empty SSID.
pub const HIDDEN_SSID_LABEL: &str = "[Hidden Network]";

/// Default number of records kept per scan.
pub const DEFAULT_CAPACITY: usize = 50;

/// Authentication mode codes as reported by the radio driver.
pub mod auth_code {
    pub const OPEN: u8 = 0;
    pub const WEP: u8 = 1;
    pub const WPA_PSK: u8 = 2;
    pub const WPA2_PSK: u8 = 3;
    pub const WPA_WPA2_PSK: u8 = 4;
    pub const WPA2_ENTERPRISE: u8 = 5;
    pub const WPA3_PSK: u8 = 6;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionKind {
    Open,
    Wep,
    Wpa,
    Wpa2,
    WpaWpa2,
    Wpa2Enterprise,
    Wpa3,
    Unknown,
}

impl EncryptionKind {
    /// Maps a driver auth code. Codes without a mapping become `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            auth_code::OPEN => EncryptionKind::Open,
            auth_code::WEP => EncryptionKind::Wep,
            auth_code::WPA_PSK => EncryptionKind::Wpa,
            auth_code::WPA2_PSK => EncryptionKind::Wpa2,
            auth_code::WPA_WPA2_PSK => EncryptionKind::WpaWpa2,
            auth_code::WPA2_ENTERPRISE => EncryptionKind::Wpa2Enterprise,
            auth_code::WPA3_PSK => EncryptionKind::Wpa3,
            _ => EncryptionKind::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EncryptionKind::Open => "Open",
            EncryptionKind::Wep => "WEP",
            EncryptionKind::Wpa => "WPA",
            EncryptionKind::Wpa2 => "WPA2",
            EncryptionKind::WpaWpa2 => "WPA/WPA2",
            EncryptionKind::Wpa2Enterprise => "WPA2-Enterprise",
            EncryptionKind::Wpa3 => "WPA3",
            EncryptionKind::Unknown => "Unknown",
        }
    }
}

impl Serialize for EncryptionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One access point as reported by the radio, before any derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScanResult {
    pub ssid: String,
    pub rssi: Rssi,
    pub channel: u8,
    pub auth_code: u8,
    pub bssid: MacAddr,
}

/// An access point discovered by one scan.
///
/// Records never outlive their scan: the next scan replaces all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPointRecord {
    /// Broadcast name, or [`HIDDEN_SSID_LABEL`] when the network is hidden.
    pub ssid: String,
    pub rssi: Rssi,
    pub channel: u8,
    #[serde(rename = "encryptionLabel")]
    pub encryption: EncryptionKind,
    pub hardware_address: MacAddr,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_client_count: Option<usize>,
}

impl AccessPointRecord {
    pub fn from_raw(raw: RawScanResult, estimated_client_count: Option<usize>) -> Self {
        let is_hidden = raw.ssid.is_empty();
        let ssid = if is_hidden {
            HIDDEN_SSID_LABEL.to_string()
        } else {
            raw.ssid
        };
        Self {
            ssid,
            rssi: raw.rssi,
            channel: raw.channel,
            encryption: EncryptionKind::from_code(raw.auth_code),
            hardware_address: raw.bssid,
            is_hidden,
            estimated_client_count,
        }
    }
}

/// Immutable view of one scan's records.
pub type Snapshot = Arc<[AccessPointRecord]>;

/// Holds the records of the most recent scan.
///
/// `replace` swaps the whole sequence under a write lock, so `snapshot`
/// observes either the previous scan or the new one, never a mix.
#[derive(Debug)]
pub struct AccessPointStore {
    capacity: usize,
    records: RwLock<Snapshot>,
}

impl AccessPointStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: RwLock::new(Arc::from(Vec::new())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Installs `records` as the current scan, keeping at most `capacity`
    /// of them in their original order. Returns how many were dropped.
    pub fn replace(&self, mut records: Vec<AccessPointRecord>) -> usize {
        let dropped = records.len().saturating_sub(self.capacity);
        records.truncate(self.capacity);
        let next: Snapshot = Arc::from(records);
        // A poisoned lock still holds a whole snapshot; keep serving it.
        let mut guard = self.records.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
        dropped
    }

    pub fn snapshot(&self) -> Snapshot {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for AccessPointStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
