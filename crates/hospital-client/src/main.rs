//! Hospital Ops command-line client.
//!
//! # Usage
//!
//! ```text
//! hospital [--config <PATH>] [--api-url <URL>] <COMMAND>
//!
//! Commands:
//!   hospitals        List hospitals offered at login
//!   login            Staff login
//!   patient-login    Patient login by patient id and contact number
//!   signup           Register a staff account
//!   change-password  Change the signed-in user's password
//!   whoami           Re-validate the stored session and print the user
//!   logout           Sign out (local state is cleared even if the server fails)
//!   staff            Sync the doctor and nurse directories from the server
//!   simulate         Run the bed-occupancy simulation on the demo board
//!   dispatch-demo    Walk one ambulance request through its lifecycle
//!   init-config      Write the effective configuration to the config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable       | Description                                  |
//! |----------------|----------------------------------------------|
//! | `HMS_CONFIG`   | Config file path (default: platform dir)     |
//! | `HMS_API_URL`  | Backend base URL, overrides `[api] base_url` |
//! | `HMS_PASSWORD` | Password for `login`                         |
//! | `RUST_LOG`     | Log filter, overrides `[logging] log_level`  |

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hospital_client::application::api::ApiClient;
use hospital_client::application::dashboard::DashboardService;
use hospital_client::application::session::{SessionManager, SignupRequest};
use hospital_client::infrastructure::scheduler::IntervalTicks;
use hospital_client::infrastructure::storage::config::{self, ClientConfig, ConfigError};
use hospital_client::infrastructure::storage::FileSessionStore;
use hospital_client::infrastructure::transport::ReqwestBackend;
use hospital_core::seed::demo_store;
use hospital_core::{
    AmbulanceStatus, NewAmbulanceRequest, Priority, RequestStatus, Role, SystemClock,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "hospital", about = "Hospital Ops command-line client", version)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, env = "HMS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL including the `/api` prefix.
    #[arg(long, env = "HMS_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Hospitals,
    Login {
        #[arg(long)]
        hospital_id: String,
        #[arg(long)]
        staff_id: String,
        #[arg(long, env = "HMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    PatientLogin {
        #[arg(long)]
        hospital_id: String,
        #[arg(long)]
        patient_id: String,
        #[arg(long)]
        contact_number: String,
    },
    Signup {
        #[arg(long)]
        hospital_id: String,
        #[arg(long)]
        staff_id: String,
        #[arg(long)]
        name: String,
        /// doctor, nurse, admin, or staff.
        #[arg(long, default_value = "staff", value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    ChangePassword {
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
    },
    Whoami,
    Logout,
    Staff,
    Simulate {
        /// Number of ticks to run; Ctrl+C stops early.
        #[arg(long, default_value_t = 10)]
        ticks: u64,
        /// Seconds between ticks, overrides `[simulation] interval_secs`.
        #[arg(long)]
        interval_secs: Option<u64>,
        /// RNG seed, overrides `[simulation] seed`.
        #[arg(long)]
        seed: Option<u64>,
    },
    DispatchDemo,
    InitConfig,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown role '{raw}' (expected doctor, nurse, admin, or staff)"))
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => match config::load_config() {
                Ok(cfg) => cfg,
                Err(ConfigError::NoPlatformConfigDir) => ClientConfig::default(),
                Err(e) => return Err(e).context("failed to load config"),
            },
        };
        if let Some(url) = &self.api_url {
            cfg.api.base_url = url.clone();
        }
        Ok(cfg)
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn api_client(cfg: &ClientConfig) -> anyhow::Result<Arc<ApiClient>> {
    let backend = ReqwestBackend::new(Duration::from_secs(cfg.api.timeout_secs))
        .context("failed to build HTTP client")?;
    let session_path = cfg
        .session_file_path()
        .context("no location for the session file; set [session] store_path")?;
    let store = FileSessionStore::new(session_path);
    Ok(Arc::new(ApiClient::new(
        cfg.api.base_url.clone(),
        Arc::new(backend),
        Arc::new(store),
    )))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    // RUST_LOG wins; the config's log level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.log_level)),
        )
        .init();

    info!(base_url = %cfg.api.base_url, "hospital client starting");

    match cli.command {
        Command::Hospitals => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            let hospitals = session.load_hospitals().await?;
            print_json(&hospitals)?;
        }
        Command::Login {
            hospital_id,
            staff_id,
            password,
        } => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            let outcome = session.login(&hospital_id, &staff_id, &password).await?;
            println!("Signed in as {}.", outcome.user.display_name());
            print_json(&outcome.user)?;
            if outcome.needs_password_reset {
                println!("Password reset required: run `hospital change-password`.");
            }
        }
        Command::PatientLogin {
            hospital_id,
            patient_id,
            contact_number,
        } => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            let user = session
                .patient_login(&hospital_id, &patient_id, &contact_number)
                .await?;
            print_json(&user)?;
        }
        Command::Signup {
            hospital_id,
            staff_id,
            name,
            role,
            password,
            email,
            department,
            specialization,
            phone,
        } => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            let user = session
                .signup(SignupRequest {
                    hospital_id,
                    staff_id,
                    name,
                    role,
                    password,
                    email,
                    department,
                    specialization,
                    phone,
                })
                .await?;
            print_json(&user)?;
        }
        Command::ChangePassword {
            old_password,
            new_password,
        } => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            let message = session.change_password(&old_password, &new_password).await?;
            println!("{message}");
        }
        Command::Whoami => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            match session.refresh_user().await? {
                Some(user) => {
                    println!("Signed in as {}.", user.display_name());
                    print_json(&user)?;
                }
                None => println!("Not signed in."),
            }
        }
        Command::Logout => {
            let mut session = SessionManager::new(api_client(&cfg)?);
            session.logout().await;
            println!("Signed out.");
        }
        Command::Staff => {
            let api = api_client(&cfg)?;
            let dashboard = DashboardService::new(demo_store(Arc::new(SystemClock)));
            let counts = dashboard.sync_staff(&api).await?;
            println!("Synced {} doctors and {} nurses.", counts.doctors, counts.nurses);
        }
        Command::Simulate {
            ticks,
            interval_secs,
            seed,
        } => {
            let interval = interval_secs.unwrap_or(cfg.simulation.interval_secs);
            if interval == 0 {
                bail!("interval must be at least one second");
            }
            let seed = seed.or(cfg.simulation.seed);
            run_simulation(ticks, Duration::from_secs(interval), seed).await?;
        }
        Command::DispatchDemo => dispatch_demo()?,
        Command::InitConfig => {
            let path = init_config(cli.config.as_deref(), &cfg)?;
            println!("Wrote {}.", path.display());
        }
    }

    Ok(())
}

async fn run_simulation(ticks: u64, interval: Duration, seed: Option<u64>) -> anyhow::Result<()> {
    let dashboard = DashboardService::new(demo_store(Arc::new(SystemClock)));
    print_json(&dashboard.overview().await)?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, stopping simulation");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut source = IntervalTicks::limited(interval, ticks);
    let applied = dashboard
        .run_simulation(&mut source, &mut rng, &running)
        .await;

    info!(applied, "simulation finished");
    print_json(&dashboard.overview().await)
}

/// Writes `cfg` to `path`, or to the platform config file when no path is
/// given, and returns where it went.
fn init_config(path: Option<&Path>, cfg: &ClientConfig) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => {
            config::save_config_to(path, cfg)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(path.to_path_buf())
        }
        None => {
            config::save_config(cfg).context("failed to write config")?;
            Ok(config::config_file_path()?)
        }
    }
}

fn dispatch_demo() -> anyhow::Result<()> {
    let mut store = demo_store(Arc::new(SystemClock));

    let request = store.request_ambulance(NewAmbulanceRequest {
        patient_id: "P001".to_string(),
        patient_name: Some("John Smith".to_string()),
        pickup_location: "14 Residency Road".to_string(),
        destination: Some("Emergency".to_string()),
        priority: Priority::High,
        notes: None,
    });
    print_json(&request)?;

    let Some(ambulance_id) = store
        .ambulances()
        .iter()
        .find(|a| a.status == AmbulanceStatus::Available)
        .map(|a| a.id.clone())
    else {
        bail!("no ambulance available");
    };

    print_json(&store.accept_ambulance_request(&request.id, &ambulance_id)?)?;
    for next in [
        RequestStatus::EnRoute,
        RequestStatus::Arrived,
        RequestStatus::Completed,
    ] {
        print_json(&store.advance_ambulance_request(&request.id, next)?)?;
    }
    print_json(&store.overview())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::parse_from(["hospital", "simulate"]);
        match cli.command {
            Command::Simulate {
                ticks,
                interval_secs,
                seed,
            } => {
                assert_eq!(ticks, 10);
                assert!(interval_secs.is_none());
                assert!(seed.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_api_url_flag_overrides_config() {
        let cli = Cli::parse_from([
            "hospital",
            "--config",
            "/nonexistent/hospital-ops/config.toml",
            "--api-url",
            "https://hms.example.org/api",
            "hospitals",
        ]);

        let cfg = cli.resolve_config().unwrap();

        assert_eq!(cfg.api.base_url, "https://hms.example.org/api");
        assert_eq!(cfg.api.timeout_secs, 30);
    }

    #[test]
    fn test_signup_role_defaults_to_staff() {
        let cli = Cli::parse_from([
            "hospital", "signup", "--hospital-id", "HOSP001", "--staff-id", "S1", "--name",
            "Sam", "--password", "secret1",
        ]);
        match cli.command {
            Command::Signup { role, .. } => assert_eq!(role, Role::Staff),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_role_is_case_insensitive() {
        assert_eq!(parse_role("Doctor").unwrap(), Role::Doctor);
        assert!(parse_role("surgeon").is_err());
    }

    #[test]
    fn test_init_config_writes_overrides_to_given_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("hospital_cli_init_{}", std::process::id()));
        let path = dir.join("config.toml");
        let cli = Cli::parse_from([
            "hospital",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "https://hms.example.org/api",
            "init-config",
        ]);
        let cfg = cli.resolve_config().unwrap();

        // Act
        let written_to = init_config(cli.config.as_deref(), &cfg).unwrap();

        // Assert
        assert_eq!(written_to, path);
        let written = config::load_config_from(&path).unwrap();
        assert_eq!(written.api.base_url, "https://hms.example.org/api");
        assert!(matches!(cli.command, Command::InitConfig));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dispatch_demo_runs_to_completion() {
        assert!(dispatch_demo().is_ok());
    }
}
