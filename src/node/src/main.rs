//! CareLink portal CLI
//!
//! Permission checks, context fetches and a watch loop that keeps the active
//! context refreshed against the portal API.

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use carelink_authz::EngineConfig;
use carelink_core::{Clock, DomainContext, Session, SystemClock, UserProfile};
use carelink_node::{open_store, CheckRequest, PortalConfig};
use carelink_store::EcosystemStateStore;

/// CareLink portal CLI
#[derive(Parser)]
#[command(name = "carelink")]
#[command(about = "CareLink portal: authorization checks and context sync")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "carelink.toml", env = "CARELINK_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide one permission check and print it as JSON
    Check {
        #[arg(long)]
        role: String,

        #[arg(long)]
        permission: String,

        /// Shift assignment; enables the shift-window check
        #[arg(long)]
        shift: Option<String>,

        /// Local hour to evaluate at (0-23)
        #[arg(long)]
        hour: Option<u32>,

        /// Caller's organization
        #[arg(long)]
        org: Option<String>,

        /// Caller's organization level (unit, department, facility, network)
        #[arg(long)]
        level: Option<String>,

        /// Organization being accessed
        #[arg(long)]
        target_org: Option<String>,

        #[arg(long)]
        resource: Option<String>,

        #[arg(long)]
        resource_type: Option<String>,

        /// Resources assigned to the caller
        #[arg(long, value_delimiter = ',')]
        assigned: Option<Vec<String>>,
    },

    /// Load a context for the logged-in user and print its snapshot
    Fetch {
        context: String,

        /// Ignore a valid cache entry
        #[arg(long)]
        force: bool,
    },

    /// Keep the active context refreshed until interrupted
    Watch {
        #[arg(long)]
        context: Option<String>,
    },

    /// Start a session for the user described in a JSON file
    Login {
        #[arg(long)]
        user_file: PathBuf,

        /// Session token; generated when omitted
        #[arg(long)]
        token: Option<String>,

        /// Session lifetime in hours
        #[arg(long, default_value_t = 8)]
        ttl_hours: i64,
    },

    /// End the current session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Checks work without a config file
    let config = match &cli.command {
        Command::Check { .. } if !cli.config.exists() => None,
        _ => {
            let config = PortalConfig::load(&cli.config)?;
            config.validate()?;
            Some(config)
        }
    };

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    if config.is_some() {
        info!("Loaded configuration from {:?}", cli.config);
    }

    match cli.command {
        Command::Check {
            role,
            permission,
            shift,
            hour,
            org,
            level,
            target_org,
            resource,
            resource_type,
            assigned,
        } => {
            let request = CheckRequest {
                role,
                permission,
                shift,
                hour,
                organization_id: org,
                organization_level: level,
                target_organization: target_org,
                resource_id: resource,
                resource_type,
                assigned_resources: assigned,
            };
            let engine_config = config
                .as_ref()
                .map(PortalConfig::engine_config)
                .unwrap_or_else(EngineConfig::default);

            let decision = request.decide(engine_config).await?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Fetch { context, force } => {
            let store = open_logged_in(config.as_ref()).await?;
            let context = parse_context(&context)?;

            if force {
                store.refresh(Some(context)).await?;
            } else {
                store.load(context).await?;
            }
            let snapshot = store.snapshot(context).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            store.shutdown();
        }
        Command::Watch { context } => {
            let store = open_logged_in(config.as_ref()).await?;
            let context = match context {
                Some(context) => parse_context(&context)?,
                None => store.active_context(),
            };
            watch(&store, context).await?;
        }
        Command::Login {
            user_file,
            token,
            ttl_hours,
        } => {
            let store = open_store(require_config(config.as_ref())?).await?;
            let session = read_session(&user_file, token, ttl_hours)?;
            let user_id = session.user.id.clone();

            store.login(session).await?;
            store.shutdown();
            println!("Logged in as {}", user_id);
        }
        Command::Logout => {
            let store = open_store(require_config(config.as_ref())?).await?;
            store.logout().await?;
            println!("Logged out");
        }
    }

    Ok(())
}

fn require_config(config: Option<&PortalConfig>) -> Result<&PortalConfig> {
    config.context("Configuration file is required for this command")
}

async fn open_logged_in(config: Option<&PortalConfig>) -> Result<EcosystemStateStore> {
    let store = open_store(require_config(config)?).await?;
    if store.current_user().is_none() {
        anyhow::bail!("Not logged in; run `carelink login --user-file <FILE>` first");
    }
    Ok(store)
}

fn parse_context(token: &str) -> Result<DomainContext> {
    token
        .parse()
        .with_context(|| format!("Unknown context '{}'", token))
}

fn read_session(user_file: &Path, token: Option<String>, ttl_hours: i64) -> Result<Session> {
    let raw = std::fs::read_to_string(user_file)
        .with_context(|| format!("Failed to read user file {:?}", user_file))?;
    let user: UserProfile = serde_json::from_str(&raw).context("Failed to parse user file")?;

    let now = SystemClock.now_utc();
    let token = token.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    Ok(Session::new(token, user, now).expiring_at(now + ChronoDuration::hours(ttl_hours)))
}

/// Run until Ctrl+C or SIGTERM, logging system status every refresh period
async fn watch(store: &EcosystemStateStore, context: DomainContext) -> Result<()> {
    let snapshot = store.switch_context(context).await?;
    info!(
        "Watching {} (cached: {}, loading: {})",
        context,
        snapshot.data.is_some(),
        snapshot.loading
    );
    if !store.is_auto_refresh_running() {
        warn!("Auto-refresh is disabled; status is reported but nothing is refreshed");
    }

    let period = store
        .preferences()
        .refresh_interval()
        .max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = store.sync_state(context);
                info!(
                    "{}: status={:?} loading={} stale={} error={:?} last_synced={:?}",
                    context,
                    store.system_status(),
                    state.loading,
                    state.stale,
                    state.error,
                    state.last_synced_at
                );
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C)");
                break;
            }
            _ = shutdown_signal() => {
                info!("Received shutdown signal (SIGTERM)");
                break;
            }
        }
    }

    store.shutdown();
    info!("Watch stopped");
    Ok(())
}

/// Cross-platform shutdown signal handling
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix systems, only Ctrl+C is supported
    std::future::pending::<()>().await
}
