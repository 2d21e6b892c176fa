//! Application settings: file paths, the wireless interface name, the two
//! service-command tables, and the scan retry parameters.
//!
//! Everything that used to be a hard-coded constant lives here so the
//! orchestrator can be pointed at a scratch directory in tests. The settings
//! file is optional TOML under the user config dir; a missing file means
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::ServiceCommand;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Wireless interface being switched between modes.
    pub wifi_interface: String,

    /// Where the DHCP-client config is written.
    pub dhcpcd_conf_path: PathBuf,

    /// Where the interfaces(5) config is written.
    pub interfaces_conf_path: PathBuf,

    /// JSON credential store of saved networks.
    pub credentials_path: PathBuf,

    /// hostapd pid file; its presence means access-point mode is active.
    pub hostapd_pid_path: PathBuf,

    /// Scan attempts before opportunistic reconnect gives up.
    pub scan_retries: u32,

    /// Pause between scan attempts.
    pub scan_delay_ms: u64,

    /// Pause after bringing the interface up before the first scan.
    pub settle_delay_ms: u64,

    /// Service sequence applied when switching to client mode.
    pub client_sequence: Vec<ServiceCommand>,

    /// Service sequence applied when switching to access-point mode.
    /// Networking is restarted twice on purpose: once before the
    /// access-point services start, to clear interface state left over from
    /// client mode, and once after, to apply the static interface definition.
    pub ap_sequence: Vec<ServiceCommand>,
}

impl Default for Settings {
    fn default() -> Self {
        let service = |name: &str, verb: &str| ServiceCommand::new(["sudo", "service", name, verb]);

        Self {
            wifi_interface: "wlan0".to_string(),
            dhcpcd_conf_path: PathBuf::from("/etc/dhcpcd.conf"),
            interfaces_conf_path: PathBuf::from("/etc/network/interfaces"),
            credentials_path: PathBuf::from("/etc/wifi-modesw/credentials.json"),
            hostapd_pid_path: PathBuf::from("/var/run/hostapd.pid"),
            scan_retries: 20,
            scan_delay_ms: 1000,
            settle_delay_ms: 1000,
            client_sequence: vec![
                service("dhcpcd", "restart"),
                service("dnsmasq", "stop"),
                service("hostapd", "stop"),
                service("networking", "restart"),
            ],
            ap_sequence: vec![
                service("dhcpcd", "restart"),
                service("networking", "restart"),
                service("dnsmasq", "start"),
                service("hostapd", "start"),
                service("networking", "restart"),
            ],
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = settings_path()?;
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = settings_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        Ok(())
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

pub fn settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("wifi-modesw").join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_device_layout() {
        let settings = Settings::default();

        assert_eq!(settings.wifi_interface, "wlan0");
        assert_eq!(settings.scan_retries, 20);
        assert_eq!(settings.scan_delay(), Duration::from_secs(1));
        assert_eq!(settings.client_sequence.len(), 4);
        assert_eq!(settings.ap_sequence.len(), 5);
    }

    #[test]
    fn ap_sequence_restarts_networking_before_and_after_ap_services() {
        let settings = Settings::default();
        let displays: Vec<_> = settings
            .ap_sequence
            .iter()
            .map(ServiceCommand::display)
            .collect();

        let restarts: Vec<_> = displays
            .iter()
            .enumerate()
            .filter(|(_, d)| d.as_str() == "sudo service networking restart")
            .map(|(i, _)| i)
            .collect();
        let hostapd = displays
            .iter()
            .position(|d| d == "sudo service hostapd start")
            .unwrap();

        assert_eq!(restarts.len(), 2);
        assert!(restarts[0] < hostapd && hostapd < restarts[1]);
    }

    #[test]
    fn toml_round_trip_preserves_command_tables() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();

        assert_eq!(back.client_sequence, settings.client_sequence);
        assert_eq!(back.ap_sequence, settings.ap_sequence);
        assert_eq!(back.credentials_path, settings.credentials_path);
    }

    #[test]
    fn partial_settings_file_falls_back_to_defaults() {
        let partial: Settings = toml::from_str("wifi_interface = \"wlp2s0\"").unwrap();

        assert_eq!(partial.wifi_interface, "wlp2s0");
        assert_eq!(partial.scan_retries, 20);
        assert_eq!(partial.ap_sequence, Settings::default().ap_sequence);
    }
}
