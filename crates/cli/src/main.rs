use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use kimchi_api::state::AppState;
use kimchi_core::config::RelayConfig;
use kimchi_core::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "kimchi")]
#[command(about = "Market-data relay: cached spot price, derivatives risk, and kimchi premium")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long, env = "KIMCHI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SnapshotKind {
    Price,
    Risk,
    Premium,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address, overriding [server] host/port
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Fetch one value from upstream and print it as JSON
    Snapshot {
        #[arg(value_enum)]
        kind: SnapshotKind,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    match cli.log_format {
        LogFormat::Text => fmt().with_env_filter(filter).with_target(false).init(),
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
    }

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind_addr());
            let state = Arc::new(AppState::from_config(&config, Arc::new(SystemClock))?);
            let alert_interval = config
                .alert
                .interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs);
            tracing::info!(
                base_asset = %config.market.base_asset,
                ttl_ms = config.cache.ttl_ms,
                fx_providers = config.upstream.fx_providers.len(),
                "Starting relay"
            );
            kimchi_api::start_server(state, &bind, alert_interval).await?;
        }
        Commands::Snapshot { kind } => {
            let state = AppState::from_config(&config, Arc::new(SystemClock))?;
            let json = match kind {
                SnapshotKind::Price => serde_json::to_string_pretty(&state.price.get().await?.value)?,
                SnapshotKind::Risk => serde_json::to_string_pretty(&state.risk.get().await?.value)?,
                SnapshotKind::Premium => serde_json::to_string_pretty(&state.premium.get().await?.value)?,
            };
            println!("{json}");
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<RelayConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            Ok(RelayConfig::load(path)?)
        }
        None => Ok(RelayConfig::default()),
    }
}
