use crate::histogram::DEFAULT_MAX_CHANNEL;
use crate::presence::{DEFAULT_COUNT_WINDOW, DEFAULT_EVICTION_WINDOW};
use crate::records::DEFAULT_CAPACITY;
use crate::signal::TierPolicy;
use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// 顶层应用配置
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub server: ServerConfig,
    pub scan: ScanConfig,
    /// `None` when presence tracking is disabled for this deployment.
    pub presence: Option<PresenceConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub capacity: usize,
    /// Highest channel in the histogram, 13 or 14.
    pub max_channel: u8,
    pub tier_policy: TierPolicy,
    /// `None` disables the periodic scan timer.
    pub auto_interval: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresenceConfig {
    pub start_tracking: bool,
    pub eviction_window: Duration,
    pub count_window: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            },
            scan: ScanConfig {
                capacity: DEFAULT_CAPACITY,
                max_channel: DEFAULT_MAX_CHANNEL,
                tier_policy: TierPolicy::FiveTier,
                auto_interval: Some(Duration::from_secs(10)),
            },
            presence: Some(PresenceConfig {
                start_tracking: true,
                eviction_window: DEFAULT_EVICTION_WINDOW,
                count_window: DEFAULT_COUNT_WINDOW,
            }),
        }
    }
}

// ============= TOML 文件结构 =============

/// 用于解析 TOML 的临时结构
#[derive(Deserialize, Default)]
#[serde(default)]
struct AnalyzerConfigFile {
    server: ServerToml,
    scan: ScanToml,
    presence: PresenceToml,
}

#[derive(Deserialize)]
#[serde(default)]
struct ServerToml {
    bind_addr: String,
}

impl Default for ServerToml {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct ScanToml {
    capacity: usize,
    max_channel: u8,
    tier_policy: TierPolicy,
    auto_interval_secs: u64,
}

impl Default for ScanToml {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_channel: DEFAULT_MAX_CHANNEL,
            tier_policy: TierPolicy::FiveTier,
            auto_interval_secs: 10,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct PresenceToml {
    enabled: bool,
    start_tracking: bool,
    eviction_window_secs: u64,
    count_window_secs: u64,
}

impl Default for PresenceToml {
    fn default() -> Self {
        Self {
            enabled: true,
            start_tracking: true,
            eviction_window_secs: 60,
            count_window_secs: 30,
        }
    }
}

impl TryFrom<AnalyzerConfigFile> for AnalyzerConfig {
    type Error = Error;

    fn try_from(t: AnalyzerConfigFile) -> Result<Self> {
        let bind_addr = SocketAddr::from_str(&t.server.bind_addr)
            .map_err(|e| Error::InvalidConfig(format!("server.bind_addr: {e}")))?;

        if t.scan.capacity == 0 {
            return Err(Error::InvalidConfig("scan.capacity must be positive".into()));
        }
        if !matches!(t.scan.max_channel, 13 | 14) {
            return Err(Error::InvalidConfig(format!(
                "scan.max_channel must be 13 or 14, got {}",
                t.scan.max_channel
            )));
        }

        let presence = if t.presence.enabled {
            if t.presence.eviction_window_secs == 0 || t.presence.count_window_secs == 0 {
                return Err(Error::InvalidConfig(
                    "presence windows must be positive".into(),
                ));
            }
            Some(PresenceConfig {
                start_tracking: t.presence.start_tracking,
                eviction_window: Duration::from_secs(t.presence.eviction_window_secs),
                count_window: Duration::from_secs(t.presence.count_window_secs),
            })
        } else {
            None
        };

        Ok(AnalyzerConfig {
            server: ServerConfig { bind_addr },
            scan: ScanConfig {
                capacity: t.scan.capacity,
                max_channel: t.scan.max_channel,
                tier_policy: t.scan.tier_policy,
                auto_interval: (t.scan.auto_interval_secs > 0)
                    .then(|| Duration::from_secs(t.scan.auto_interval_secs)),
            },
            presence,
        })
    }
}

// ============= 配置加载函数 =============

/// 从 TOML 字符串加载应用配置
pub fn load_config_from_toml_str(s: &str) -> Result<AnalyzerConfig> {
    let parsed: AnalyzerConfigFile = toml::from_str(s)?;
    parsed.try_into()
}
