//! Radio scan boundary.
//!
//! The orchestrator only needs "which SSIDs are in range, and how strong" -
//! the [`Scanner`] trait captures that, and [`NmcliScanner`] is the
//! production implementation on top of NetworkManager's nmcli. Results are
//! returned in raw scan order; ranking happens in the orchestrator.

use std::collections::HashSet;
use std::process::Command;
use tracing::debug;

use crate::error::SwitchError;

/// One network visible in a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Network name. Hidden networks (empty SSID) are filtered out upstream.
    pub ssid: String,

    /// Signal quality as a percentage, used only for relative ranking.
    pub quality: u8,
}

/// Performs one wireless scan. An `Err` from a single scan is recoverable:
/// the reconnect loop logs it and retries.
pub trait Scanner {
    fn scan(&mut self) -> Result<Vec<ScanResult>, SwitchError>;
}

/// Scanner backed by `nmcli device wifi`.
#[derive(Debug)]
pub struct NmcliScanner {
    interface: String,
}

impl NmcliScanner {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl Scanner for NmcliScanner {
    fn scan(&mut self) -> Result<Vec<ScanResult>, SwitchError> {
        // Rescan can fail if one is already in flight; cached results from
        // the list call below are still usable.
        let _ = Command::new("nmcli")
            .args(["device", "wifi", "rescan", "ifname", &self.interface])
            .output();

        std::thread::sleep(std::time::Duration::from_millis(500));

        let output = Command::new("nmcli")
            .args([
                "-t",
                "-f",
                "SSID,SIGNAL",
                "device",
                "wifi",
                "list",
                "ifname",
                &self.interface,
            ])
            .output()
            .map_err(|e| SwitchError::ScanFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SwitchError::ScanFailed(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = parse_scan_output(&stdout);
        debug!("scan on {} found {} networks", self.interface, results.len());

        Ok(results)
    }
}

/// Parses terse `nmcli -t -f SSID,SIGNAL device wifi list` output.
///
/// Lines look like `MyNetwork:87`. SSIDs may contain escaped colons
/// (`\:`), so the signal is taken from the last unescaped field. Hidden
/// networks and duplicate SSIDs (same network seen from several APs) are
/// dropped, keeping the first occurrence.
pub fn parse_scan_output(output: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for line in output.lines() {
        let Some((raw_ssid, raw_signal)) = line.rsplit_once(':') else {
            continue;
        };

        let ssid = raw_ssid.replace("\\:", ":");
        if ssid.is_empty() || seen.contains(&ssid) {
            continue;
        }

        let quality: u8 = raw_signal.trim().parse().unwrap_or(0);

        seen.insert(ssid.clone());
        results.push(ScanResult { ssid, quality });
    }

    results
}
