use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wifi_modesw::{
    scan::NmcliScanner,
    services::SystemRunner,
    settings::{self, Settings},
    status,
    store::{CredentialStore, NetworkCredential, Security},
    switch::{ClientParams, Orchestrator, ReconnectOutcome},
    StepStatus,
};

#[derive(Parser)]
#[command(name = "wifi-modesw")]
#[command(about = "Switch a wireless adapter between client and access-point mode")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch to access-point mode (host a hotspot on 10.0.0.1/24)
    Ap,

    /// Switch to client mode and join a network
    Client {
        /// SSID to join; omit to reconnect to the strongest saved network in range
        ssid: Option<String>,

        /// Password for the network (omit for an open network)
        #[arg(short, long)]
        password: Option<String>,

        /// The network uses legacy WEP instead of WPA
        #[arg(long)]
        wep: bool,
    },

    /// Show whether the access-point service is running
    Status,

    /// Save network credentials without switching mode
    SaveNetwork {
        /// SSID of the network
        ssid: String,

        /// Password for the network (omit for an open network)
        #[arg(short, long)]
        password: Option<String>,

        /// The network uses legacy WEP instead of WPA
        #[arg(long)]
        wep: bool,
    },

    /// List saved networks
    ShowNetworks,

    /// Show the effective settings and where they are loaded from
    ShowSettings,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Commands::Ap => cmd_ap(settings),
        Commands::Client {
            ssid,
            password,
            wep,
        } => cmd_client(settings, ssid.as_deref(), password.as_deref(), wep),
        Commands::Status => cmd_status(&settings),
        Commands::SaveNetwork {
            ssid,
            password,
            wep,
        } => cmd_save_network(&settings, &ssid, password.as_deref(), wep),
        Commands::ShowNetworks => cmd_show_networks(&settings),
        Commands::ShowSettings => cmd_show_settings(&settings),
    }
}

fn build_orchestrator(settings: Settings) -> Orchestrator<NmcliScanner, SystemRunner> {
    let scanner = NmcliScanner::new(settings.wifi_interface.clone());
    Orchestrator::new(settings, scanner, SystemRunner)
}

fn security_flag(wep: bool) -> Security {
    if wep { Security::Wep } else { Security::Wpa }
}

fn cmd_ap(settings: Settings) -> Result<()> {
    let mut orch = build_orchestrator(settings);
    println!("Switching to access-point mode...");

    let statuses = orch.switch_to_access_point()?;
    report_steps(&statuses);

    Ok(())
}

fn cmd_client(
    settings: Settings,
    ssid: Option<&str>,
    password: Option<&str>,
    wep: bool,
) -> Result<()> {
    let mut orch = build_orchestrator(settings);

    match ssid {
        Some(ssid) => {
            println!("Switching to client mode, joining '{ssid}'...");
            let params = ClientParams {
                ssid: ssid.to_string(),
                password: password.unwrap_or_default().to_string(),
                security: security_flag(wep),
            };
            let statuses = orch.switch_to_client(&params)?;
            report_steps(&statuses);
        }
        None => {
            println!("No SSID given, scanning for saved networks...");
            match orch.reconnect()? {
                ReconnectOutcome::Connected(ssid) => println!("Reconnected to '{ssid}'."),
                ReconnectOutcome::ScanExhausted => println!("Scan found no networks; giving up."),
                ReconnectOutcome::NoCredentials => println!("No saved credentials to match against."),
                ReconnectOutcome::NoMatch => {
                    println!("No network in range matches the saved credentials.")
                }
            }
        }
    }

    Ok(())
}

fn report_steps(statuses: &[StepStatus]) {
    let succeeded = statuses.iter().filter(|s| s.outcome.is_success()).count();
    println!("{succeeded} of {} service steps succeeded.", statuses.len());

    for status in statuses {
        if let wifi_modesw::StepOutcome::Failed(reason) = &status.outcome {
            println!("  failed: {} ({reason})", status.command.display());
        }
    }
}

fn cmd_status(settings: &Settings) -> Result<()> {
    if status::is_access_point_active(settings) {
        println!("Access point: active");
    } else {
        println!("Access point: inactive");
    }

    Ok(())
}

fn cmd_save_network(
    settings: &Settings,
    ssid: &str,
    password: Option<&str>,
    wep: bool,
) -> Result<()> {
    let mut store = CredentialStore::load_or_empty(&settings.credentials_path)?;

    store.upsert(
        ssid,
        NetworkCredential {
            password: password.unwrap_or_default().to_string(),
            security: security_flag(wep),
        },
    );
    store.save(&settings.credentials_path)?;

    println!(
        "Saved network '{ssid}' to {}",
        settings.credentials_path.display()
    );

    Ok(())
}

fn cmd_show_networks(settings: &Settings) -> Result<()> {
    println!("Credential store: {}", settings.credentials_path.display());
    println!();

    let store = CredentialStore::load_or_empty(&settings.credentials_path)?;

    if store.is_empty() {
        println!("No saved networks.");
    } else {
        println!("{:<24} {:<8} {}", "SSID", "SECURITY", "PASSWORD");
        println!("{}", "-".repeat(48));
        for (ssid, credential) in store.iter() {
            let security = match credential.security {
                Security::Wep => "WEP",
                Security::Wpa if credential.password.is_empty() => "open",
                Security::Wpa => "WPA",
            };
            let masked = "*".repeat(credential.password.len().min(12));
            println!("{ssid:<24} {security:<8} {masked}");
        }
    }

    Ok(())
}

fn cmd_show_settings(settings: &Settings) -> Result<()> {
    let path = settings::settings_path()?;
    println!("Settings file: {}", path.display());
    println!();
    print!("{}", toml::to_string_pretty(settings)?);

    Ok(())
}
