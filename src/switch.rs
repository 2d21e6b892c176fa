//! Mode switch orchestration.
//!
//! The orchestrator decides what config text to write, whether the
//! credential store changes, and which service sequence to run, then applies
//! all of it. It is generic over the scan and service-control boundaries so
//! the selection and retry logic can be exercised without touching the OS;
//! file paths come from [`Settings`], so tests point them at a scratch
//! directory.
//!
//! Switching is best-effort end to end: a failing service command never
//! stops the rest of its sequence, and the caller gets the per-step status
//! list to inspect.

use std::fs;
use std::path::Path;
use std::thread;
use tracing::{debug, error};

use crate::error::SwitchError;
use crate::render;
use crate::scan::{ScanResult, Scanner};
use crate::services::{run_sequence, ServiceRunner, StepStatus};
use crate::settings::Settings;
use crate::status;
use crate::store::{CredentialStore, NetworkCredential, Security};

/// Caller-supplied credentials for an explicit client-mode switch.
#[derive(Debug, Clone)]
pub struct ClientParams {
    pub ssid: String,
    /// Empty means an open network.
    pub password: String,
    pub security: Security,
}

/// How an opportunistic reconnect ended. The three no-op outcomes are
/// terminal but not errors; nothing was changed on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// A saved network was in range; the client switch was applied.
    Connected(String),
    /// Every scan attempt in the budget came back empty.
    ScanExhausted,
    /// There is no credential store to match against.
    NoCredentials,
    /// Networks were visible but none of them is saved.
    NoMatch,
}

/// Picks the strongest in-range network with a saved credential.
///
/// Sorts descending by quality with a stable sort, so equal-quality networks
/// keep their raw scan order (first seen wins), then returns the first entry
/// present in the store. There is no separate priority field; strongest
/// saved network wins.
pub fn select_network<'a>(
    scan: &[ScanResult],
    store: &'a CredentialStore,
) -> Option<(String, &'a NetworkCredential)> {
    let mut ranked: Vec<&ScanResult> = scan.iter().collect();
    ranked.sort_by(|a, b| b.quality.cmp(&a.quality));

    ranked
        .into_iter()
        .find_map(|r| store.lookup(&r.ssid).map(|cred| (r.ssid.clone(), cred)))
}

pub struct Orchestrator<S, R> {
    settings: Settings,
    scanner: S,
    runner: R,
}

impl<S: Scanner, R: ServiceRunner> Orchestrator<S, R> {
    pub fn new(settings: Settings, scanner: S, runner: R) -> Self {
        Self {
            settings,
            scanner,
            runner,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Switches the adapter to access-point mode: static 10.0.0.1/24 on the
    /// wireless interface, dnsmasq and hostapd started. The credential store
    /// is not touched.
    pub fn switch_to_access_point(&mut self) -> Result<Vec<StepStatus>, SwitchError> {
        let interface = &self.settings.wifi_interface;
        debug!("switching {interface} to access-point mode");

        write_config(
            &self.settings.dhcpcd_conf_path,
            &render::dhcpcd_access_point(interface),
        )?;
        write_config(
            &self.settings.interfaces_conf_path,
            &render::interfaces_access_point(interface),
        )?;

        Ok(run_sequence(&mut self.runner, &self.settings.ap_sequence))
    }

    /// Switches the adapter to client mode with explicit credentials.
    ///
    /// The credential is upserted into the store before the service sequence
    /// runs. A missing store file starts from an empty store; a corrupt one
    /// is a hard error.
    pub fn switch_to_client(&mut self, params: &ClientParams) -> Result<Vec<StepStatus>, SwitchError> {
        let interface = self.settings.wifi_interface.clone();
        debug!("switching {interface} to client mode, ssid {}", params.ssid);

        write_config(&self.settings.dhcpcd_conf_path, &render::dhcpcd_client())?;

        let mut store = CredentialStore::load_or_empty(&self.settings.credentials_path)?;
        store.upsert(
            &params.ssid,
            NetworkCredential {
                password: params.password.clone(),
                security: params.security,
            },
        );
        store.save(&self.settings.credentials_path)?;

        write_config(
            &self.settings.interfaces_conf_path,
            &render::interfaces_client(&interface, &params.ssid, &params.password, params.security),
        )?;

        Ok(run_sequence(&mut self.runner, &self.settings.client_sequence))
    }

    /// Client-mode switch without caller-supplied credentials: scan for
    /// whatever saved network is in range and connect to the strongest one.
    ///
    /// Scanning is retried up to `scan_retries` times with `scan_delay`
    /// between attempts; a scan error counts as an empty attempt. The first
    /// non-empty result ends the loop early.
    pub fn reconnect(&mut self) -> Result<ReconnectOutcome, SwitchError> {
        debug!("reconnect requested on {}", self.settings.wifi_interface);

        // The adapter cannot scan while hosting; drop to client mode first
        // and give the interface a moment to come up.
        if status::is_access_point_active(&self.settings) {
            run_sequence(&mut self.runner, &self.settings.client_sequence);
            thread::sleep(self.settings.settle_delay());
        }

        let mut scan = Vec::new();
        for attempt in 1..=self.settings.scan_retries {
            match self.scanner.scan() {
                Ok(results) if !results.is_empty() => {
                    scan = results;
                    break;
                }
                Ok(_) => debug!("scan attempt {attempt}: no networks visible"),
                Err(e) => error!("scan attempt {attempt} failed: {e}"),
            }

            if attempt < self.settings.scan_retries {
                thread::sleep(self.settings.scan_delay());
            }
        }

        if scan.is_empty() {
            debug!("wifi scan unsuccessful");
            return Ok(ReconnectOutcome::ScanExhausted);
        }
        debug!("wifi scan found {} networks", scan.len());

        let store = match CredentialStore::load(&self.settings.credentials_path) {
            Ok(store) => store,
            Err(SwitchError::StoreMissing(_)) => {
                error!("no saved wifi credentials were found");
                return Ok(ReconnectOutcome::NoCredentials);
            }
            Err(e) => return Err(e),
        };

        let Some((ssid, credential)) = select_network(&scan, &store) else {
            debug!("no scanned network matches saved credentials");
            return Ok(ReconnectOutcome::NoMatch);
        };

        let params = ClientParams {
            ssid,
            password: credential.password.clone(),
            security: credential.security,
        };
        // Re-enters the explicit-ssid branch; the store write there is
        // redundant but harmless.
        self.switch_to_client(&params)?;

        Ok(ReconnectOutcome::Connected(params.ssid))
    }
}

fn write_config(path: &Path, text: &str) -> Result<(), SwitchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SwitchError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, text).map_err(|source| SwitchError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    fn net(ssid: &str, quality: u8) -> ScanResult {
        ScanResult {
            ssid: ssid.to_string(),
            quality,
        }
    }

    fn cred(password: &str, security: Security) -> NetworkCredential {
        NetworkCredential {
            password: password.to_string(),
            security,
        }
    }

    /// Scanner that replays a script of responses, then keeps returning
    /// empty results. Counts every attempt.
    struct ScriptedScanner {
        script: VecDeque<Result<Vec<ScanResult>, SwitchError>>,
        calls: Rc<RefCell<u32>>,
    }

    impl ScriptedScanner {
        fn new(
            script: Vec<Result<Vec<ScanResult>, SwitchError>>,
        ) -> (Self, Rc<RefCell<u32>>) {
            let calls = Rc::new(RefCell::new(0));
            (
                Self {
                    script: script.into(),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl Scanner for ScriptedScanner {
        fn scan(&mut self) -> Result<Vec<ScanResult>, SwitchError> {
            *self.calls.borrow_mut() += 1;
            self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Runner that records every attempted command and always succeeds.
    struct RecordingRunner {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingRunner {
        fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
            let log = Rc::new(RefCell::new(Vec::new()));
            (Self { log: log.clone() }, log)
        }
    }

    impl ServiceRunner for RecordingRunner {
        fn run_step(&mut self, command: &crate::services::ServiceCommand) -> crate::services::StepOutcome {
            self.log.borrow_mut().push(command.display());
            crate::services::StepOutcome::Success
        }
    }

    fn test_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.dhcpcd_conf_path = dir.join("dhcpcd.conf");
        settings.interfaces_conf_path = dir.join("interfaces");
        settings.credentials_path = dir.join("credentials.json");
        settings.hostapd_pid_path = dir.join("hostapd.pid");
        settings.scan_delay_ms = 0;
        settings.settle_delay_ms = 0;
        settings
    }

    fn orchestrator(
        settings: Settings,
        script: Vec<Result<Vec<ScanResult>, SwitchError>>,
    ) -> (
        Orchestrator<ScriptedScanner, RecordingRunner>,
        Rc<RefCell<u32>>,
        Rc<RefCell<Vec<String>>>,
    ) {
        let (scanner, calls) = ScriptedScanner::new(script);
        let (runner, log) = RecordingRunner::new();
        (Orchestrator::new(settings, scanner, runner), calls, log)
    }

    #[test]
    fn selection_is_by_quality_then_store_membership() {
        // B and C tie at 90; the stable sort keeps B first, but B is not
        // saved, so the strongest *saved* network C wins over A at 30.
        let scan = vec![net("A", 30), net("B", 90), net("C", 90)];
        let mut store = CredentialStore::default();
        store.upsert("A", cred("pa", Security::Wpa));
        store.upsert("C", cred("pc", Security::Wpa));

        let (ssid, credential) = select_network(&scan, &store).unwrap();
        assert_eq!(ssid, "C");
        assert_eq!(credential.password, "pc");
    }

    #[test]
    fn selection_ties_keep_scan_order() {
        let scan = vec![net("B", 90), net("C", 90)];
        let mut store = CredentialStore::default();
        store.upsert("B", cred("pb", Security::Wpa));
        store.upsert("C", cred("pc", Security::Wpa));

        let (ssid, _) = select_network(&scan, &store).unwrap();
        assert_eq!(ssid, "B");
    }

    #[test]
    fn reconnect_makes_exactly_twenty_attempts_when_all_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, calls, log) = orchestrator(test_settings(dir.path()), Vec::new());

        let outcome = orch.reconnect().unwrap();

        assert_eq!(outcome, ReconnectOutcome::ScanExhausted);
        assert_eq!(*calls.borrow(), 20);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn reconnect_stops_scanning_after_first_hit() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());

        let mut store = CredentialStore::default();
        store.upsert("home", cred("hunter2", Security::Wpa));
        store.save(&settings.credentials_path).unwrap();

        let script = vec![Ok(Vec::new()), Ok(Vec::new()), Ok(vec![net("home", 70)])];
        let (mut orch, calls, log) = orchestrator(settings, script);

        let outcome = orch.reconnect().unwrap();

        assert_eq!(outcome, ReconnectOutcome::Connected("home".to_string()));
        assert_eq!(*calls.borrow(), 3);
        // the match triggered the full client switch
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn reconnect_treats_scan_errors_as_empty_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());

        let mut store = CredentialStore::default();
        store.upsert("home", cred("hunter2", Security::Wpa));
        store.save(&settings.credentials_path).unwrap();

        let script = vec![
            Err(SwitchError::ScanFailed("device busy".to_string())),
            Err(SwitchError::ScanFailed("device busy".to_string())),
            Ok(vec![net("home", 70)]),
        ];
        let (mut orch, calls, _) = orchestrator(settings, script);

        let outcome = orch.reconnect().unwrap();
        assert_eq!(outcome, ReconnectOutcome::Connected("home".to_string()));
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn reconnect_without_store_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let script = vec![Ok(vec![net("home", 70)])];
        let (mut orch, _, log) = orchestrator(test_settings(dir.path()), script);

        let outcome = orch.reconnect().unwrap();

        assert_eq!(outcome, ReconnectOutcome::NoCredentials);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn reconnect_with_corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        std::fs::write(&settings.credentials_path, "{broken").unwrap();

        let script = vec![Ok(vec![net("home", 70)])];
        let (mut orch, _, _) = orchestrator(settings, script);

        assert!(matches!(
            orch.reconnect(),
            Err(SwitchError::StoreCorrupt { .. })
        ));
    }

    #[test]
    fn reconnect_with_no_saved_match_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());

        let mut store = CredentialStore::default();
        store.upsert("home", cred("hunter2", Security::Wpa));
        store.save(&settings.credentials_path).unwrap();
        let before = std::fs::read_to_string(&settings.credentials_path).unwrap();

        let script = vec![Ok(vec![net("stranger", 95)])];
        let (mut orch, _, log) = orchestrator(settings, script);

        let outcome = orch.reconnect().unwrap();

        assert_eq!(outcome, ReconnectOutcome::NoMatch);
        assert!(log.borrow().is_empty());
        let after = std::fs::read_to_string(orch.settings().credentials_path.as_path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn reconnect_drops_out_of_ap_mode_before_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.scan_retries = 1;
        std::fs::write(&settings.hostapd_pid_path, "1234\n").unwrap();

        let (mut orch, calls, log) = orchestrator(settings, Vec::new());

        let outcome = orch.reconnect().unwrap();

        assert_eq!(outcome, ReconnectOutcome::ScanExhausted);
        assert_eq!(*calls.borrow(), 1);
        // the client sequence ran once to bring the interface up
        let expected: Vec<String> = Settings::default()
            .client_sequence
            .iter()
            .map(|c| c.display())
            .collect();
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn client_switch_writes_configs_and_persists_credential() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        let (mut orch, _, log) = orchestrator(settings, Vec::new());

        let params = ClientParams {
            ssid: "home".to_string(),
            password: "hunter2".to_string(),
            security: Security::Wpa,
        };
        let statuses = orch.switch_to_client(&params).unwrap();

        assert_eq!(statuses.len(), 4);
        assert_eq!(log.borrow().len(), 4);

        let dhcpcd = std::fs::read_to_string(&orch.settings().dhcpcd_conf_path).unwrap();
        assert!(!dhcpcd.contains("denyinterfaces"));

        let interfaces = std::fs::read_to_string(&orch.settings().interfaces_conf_path).unwrap();
        assert!(interfaces.contains("wpa-ssid \"home\""));

        // missing store file was auto-created
        let store = CredentialStore::load(&orch.settings().credentials_path).unwrap();
        assert_eq!(store.lookup("home").unwrap().password, "hunter2");
    }

    #[test]
    fn repeated_client_switch_keeps_one_store_entry() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        let (mut orch, _, _) = orchestrator(settings, Vec::new());

        let params = ClientParams {
            ssid: "home".to_string(),
            password: "hunter2".to_string(),
            security: Security::Wpa,
        };
        orch.switch_to_client(&params).unwrap();
        let first = std::fs::read_to_string(&orch.settings().credentials_path).unwrap();
        orch.switch_to_client(&params).unwrap();
        let second = std::fs::read_to_string(&orch.settings().credentials_path).unwrap();

        assert_eq!(first, second);
        let store = CredentialStore::load(&orch.settings().credentials_path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ap_switch_runs_full_sequence_and_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        let (mut orch, _, log) = orchestrator(settings, Vec::new());

        let statuses = orch.switch_to_access_point().unwrap();

        assert_eq!(statuses.len(), 5);
        let restarts = log
            .borrow()
            .iter()
            .filter(|c| c.as_str() == "sudo service networking restart")
            .count();
        assert_eq!(restarts, 2);

        let dhcpcd = std::fs::read_to_string(&orch.settings().dhcpcd_conf_path).unwrap();
        assert!(dhcpcd.ends_with("denyinterfaces wlan0"));

        let interfaces = std::fs::read_to_string(&orch.settings().interfaces_conf_path).unwrap();
        assert!(interfaces.contains("iface wlan0 inet static"));

        assert!(!orch.settings().credentials_path.exists());
    }
}
