//! WiFi Mode Switch Library
//!
//! This library toggles a wireless adapter on a single-board host between
//! client mode (join an existing network) and access-point mode (host a
//! network for other devices). It is a thin control plane over the OS
//! network services: it keeps a small credential store, writes two static
//! config files, and sequences a handful of service restarts, tolerating
//! individual step failures.
//!
//! # Modules
//!
//! - [`settings`] - Injected configuration: paths, interface name, command tables
//! - [`store`] - Saved network credential store (flat JSON file)
//! - [`scan`] - Radio scan boundary and the nmcli-backed scanner
//! - [`services`] - Service-control boundary and best-effort sequence executor
//! - [`render`] - Pure rendering of the dhcpcd/interfaces config variants
//! - [`switch`] - The mode switch orchestrator and opportunistic reconnect
//! - [`status`] - Access-point liveness query (pid-file check)
//! - [`error`] - Custom error types for the library
//!
//! # Example Usage
//!
//! ```no_run
//! use wifi_modesw::{Orchestrator, Settings};
//! use wifi_modesw::scan::NmcliScanner;
//! use wifi_modesw::services::SystemRunner;
//!
//! let settings = Settings::default();
//! let scanner = NmcliScanner::new(settings.wifi_interface.clone());
//! let mut orch = Orchestrator::new(settings, scanner, SystemRunner);
//!
//! // Reconnect to the strongest saved network in range
//! let outcome = orch.reconnect().expect("reconnect failed");
//! println!("{outcome:?}");
//! ```

pub mod error;
pub mod render;
pub mod scan;
pub mod services;
pub mod settings;
pub mod status;
pub mod store;
pub mod switch;

pub use error::SwitchError;
pub use scan::{ScanResult, Scanner};
pub use services::{ServiceCommand, ServiceRunner, StepOutcome, StepStatus};
pub use settings::Settings;
pub use status::is_access_point_active;
pub use store::{CredentialStore, NetworkCredential, Security};
pub use switch::{ClientParams, Orchestrator, ReconnectOutcome};
