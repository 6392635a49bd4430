//! Signal quality classification.
//!
//! Two tier policies exist: the five-tier one (Excellent/Good/Fair/Weak/Very
//! Weak) and a coarser four-tier one that folds everything below -70 dBm
//! into `Poor`. A deployment picks exactly one through configuration.

use serde::{Deserialize, Serialize};

/// Received signal strength in dBm.
pub type Rssi = i32;

/// RSSI at or above which a signal counts as full strength.
pub const RSSI_CEILING: Rssi = -50;
/// RSSI at or below which a signal counts as no signal.
pub const RSSI_FLOOR: Rssi = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    #[default]
    FiveTier,
    FourTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SignalQuality {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Fair")]
    Fair,
    #[serde(rename = "Weak")]
    Weak,
    #[serde(rename = "Very Weak")]
    VeryWeak,
    /// Only produced by [`TierPolicy::FourTier`].
    #[serde(rename = "Poor")]
    Poor,
}

impl SignalQuality {
    pub fn label(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Fair => "Fair",
            SignalQuality::Weak => "Weak",
            SignalQuality::VeryWeak => "Very Weak",
            SignalQuality::Poor => "Poor",
        }
    }
}

/// Result of classifying one RSSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalReport {
    pub quality: SignalQuality,
    pub percent: u8,
}

impl TierPolicy {
    pub fn quality(&self, rssi: Rssi) -> SignalQuality {
        match self {
            TierPolicy::FiveTier => match rssi {
                r if r >= -50 => SignalQuality::Excellent,
                r if r >= -60 => SignalQuality::Good,
                r if r >= -70 => SignalQuality::Fair,
                r if r >= -80 => SignalQuality::Weak,
                _ => SignalQuality::VeryWeak,
            },
            TierPolicy::FourTier => match rssi {
                r if r >= -50 => SignalQuality::Excellent,
                r if r >= -60 => SignalQuality::Good,
                r if r >= -70 => SignalQuality::Fair,
                _ => SignalQuality::Poor,
            },
        }
    }

    pub fn classify(&self, rssi: Rssi) -> SignalReport {
        SignalReport {
            quality: self.quality(rssi),
            percent: signal_percent(rssi),
        }
    }
}

/// Maps RSSI linearly onto 0..=100, saturating outside [-100, -50].
pub fn signal_percent(rssi: Rssi) -> u8 {
    (2 * (rssi.clamp(RSSI_FLOOR, RSSI_CEILING) - RSSI_FLOOR)) as u8
}

/// Classifies with the default (five-tier) policy.
pub fn classify(rssi: Rssi) -> SignalReport {
    TierPolicy::default().classify(rssi)
}
