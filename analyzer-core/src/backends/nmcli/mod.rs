use crate::mac::MacAddr;
use crate::records::{auth_code, RawScanResult};
use crate::signal::Rssi;
use crate::traits::RadioScanner;
use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

// 通过调用nmcli命令行工具实现的扫描后端，适用于使用NetworkManager管理网络连接的Linux系统
const DEFAULT_IFACE: &str = "wlan0";

#[derive(Debug, Clone)]
pub struct NmcliScanner {
    iface: String,
}

impl NmcliScanner {
    pub fn new() -> Self {
        Self::with_interface(DEFAULT_IFACE)
    }

    pub fn with_interface(iface: impl Into<String>) -> Self {
        Self { iface: iface.into() }
    }

    /// Splits one `nmcli -t` line on unescaped colons, undoing `\:` and `\\`.
    fn split_terse(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                ':' => fields.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        fields.push(current);
        fields
    }

    /// NetworkManager reports 0-100; invert the analyzer's percent mapping.
    fn percent_to_dbm(percent: u8) -> Rssi {
        percent.min(100) as Rssi / 2 - 100
    }

    fn security_to_auth_code(security: &str) -> u8 {
        let s = security.trim();
        if s.is_empty() || s == "--" {
            auth_code::OPEN
        } else if s.contains("802.1X") {
            auth_code::WPA2_ENTERPRISE
        } else if s.contains("WPA3") || s.contains("SAE") {
            auth_code::WPA3_PSK
        } else if s.contains("WPA1") && s.contains("WPA2") {
            auth_code::WPA_WPA2_PSK
        } else if s.contains("WPA2") {
            auth_code::WPA2_PSK
        } else if s.contains("WPA") {
            auth_code::WPA_PSK
        } else if s.contains("WEP") {
            auth_code::WEP
        } else {
            u8::MAX
        }
    }

    /// Why a rescan did not succeed, if it didn't.
    fn rescan_failure(result: &std::io::Result<Output>) -> Option<String> {
        match result {
            Ok(out) if out.status.success() => None,
            Ok(out) => Some(String::from_utf8_lossy(&out.stderr).trim().to_string()),
            Err(e) => Some(e.to_string()),
        }
    }

    /// Parses `SSID:BSSID:CHAN:SIGNAL:SECURITY` terse rows.
    fn parse_nmcli_list(output: &str) -> Vec<RawScanResult> {
        let mut networks = Vec::new();
        for line in output.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let parts = Self::split_terse(line);
            if parts.len() < 5 {
                debug!("Skipping short nmcli row: {}", line);
                continue;
            }
            let Ok(bssid) = parts[1].parse::<MacAddr>() else {
                warn!("Skipping nmcli row with bad BSSID: {}", parts[1]);
                continue;
            };
            let channel = parts[2].trim().parse::<u8>().unwrap_or(0);
            let signal = parts[3].trim().parse::<u8>().unwrap_or(0);
            networks.push(RawScanResult {
                ssid: parts[0].clone(),
                rssi: Self::percent_to_dbm(signal),
                channel,
                auth_code: Self::security_to_auth_code(&parts[4]),
                bssid,
            });
        }
        networks
    }
}

impl Default for NmcliScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RadioScanner for NmcliScanner {
    fn name(&self) -> &'static str {
        "nmcli"
    }

    async fn scan(&self) -> Result<Vec<RawScanResult>> {
        // A failed rescan still leaves NetworkManager's cached list readable.
        let rescan = Command::new("nmcli")
            .arg("device")
            .arg("wifi")
            .arg("rescan")
            .arg("ifname")
            .arg(&self.iface)
            .output()
            .await;
        if let Some(reason) = Self::rescan_failure(&rescan) {
            debug!(iface = %self.iface, "nmcli rescan failed, list may be stale: {}", reason);
        }
        let output = Command::new("nmcli")
            .arg("-t")
            .arg("-f")
            .arg("SSID,BSSID,CHAN,SIGNAL,SECURITY")
            .arg("device")
            .arg("wifi")
            .arg("list")
            .arg("ifname")
            .arg(&self.iface)
            .output()
            .await?;
        if !output.status.success() {
            let err = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed(format!("nmcli scan failed: {}", err)));
        }
        let stdout = String::from_utf8(output.stdout)?;
        Ok(Self::parse_nmcli_list(&stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_escaped_terse_rows() {
        let out = "Home:AA\\:BB\\:CC\\:DD\\:EE\\:01:6:70:WPA2\n\
                   :AA\\:BB\\:CC\\:DD\\:EE\\:02:11:30:\n\
                   Cafe\\:Bar:AA\\:BB\\:CC\\:DD\\:EE\\:03:1:100:WPA1 WPA2\n\
                   broken:row\n";
        let nets = NmcliScanner::parse_nmcli_list(out);
        assert_eq!(nets.len(), 3);

        assert_eq!(nets[0].ssid, "Home");
        assert_eq!(nets[0].bssid.to_string(), "AA:BB:CC:DD:EE:01");
        assert_eq!(nets[0].channel, 6);
        assert_eq!(nets[0].rssi, -65);
        assert_eq!(nets[0].auth_code, auth_code::WPA2_PSK);

        assert_eq!(nets[1].ssid, "");
        assert_eq!(nets[1].auth_code, auth_code::OPEN);
        assert_eq!(nets[1].rssi, -85);

        assert_eq!(nets[2].ssid, "Cafe:Bar");
        assert_eq!(nets[2].rssi, -50);
        assert_eq!(nets[2].auth_code, auth_code::WPA_WPA2_PSK);
    }

    #[cfg(unix)]
    #[test]
    fn rescan_failures_are_described() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let ok = Ok(Output {
            status: ExitStatus::from_raw(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        });
        assert_eq!(NmcliScanner::rescan_failure(&ok), None);

        let busy = Ok(Output {
            status: ExitStatus::from_raw(256),
            stdout: Vec::new(),
            stderr: b"Error: Scanning not allowed while unavailable.\n".to_vec(),
        });
        assert_eq!(
            NmcliScanner::rescan_failure(&busy).as_deref(),
            Some("Error: Scanning not allowed while unavailable.")
        );

        let missing = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nmcli not found"));
        assert_eq!(NmcliScanner::rescan_failure(&missing).as_deref(), Some("nmcli not found"));
    }

    #[test]
    fn maps_security_strings() {
        assert_eq!(NmcliScanner::security_to_auth_code("WPA2 802.1X"), auth_code::WPA2_ENTERPRISE);
        assert_eq!(NmcliScanner::security_to_auth_code("WPA3"), auth_code::WPA3_PSK);
        assert_eq!(NmcliScanner::security_to_auth_code("WEP"), auth_code::WEP);
        assert_eq!(NmcliScanner::security_to_auth_code("OWE"), u8::MAX);
    }
}
