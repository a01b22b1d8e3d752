//! RateCon Dashboard Server
//!
//! Run with: cargo run --bin ratecon
//!
//! # Configuration
//!
//! Read from `--config`, or the first of `~/.config/ratecon/config.toml`,
//! `/etc/ratecon/config.toml` and `./config.toml`, then overridden by:
//! - `SUPABASE_URL`: Project URL (required)
//! - `SUPABASE_ANON_KEY`: Anonymous API key (required)
//! - `RATECON_HOST` / `RATECON_PORT`: Bind address (default: 127.0.0.1:8085)
//! - `RATECON_SESSION_FILE`: Where the signed-in session is kept
//! - `RUST_LOG`: Log filter (overrides the configured level)
//!
//! `--demo` serves sample loads from memory and needs no project settings.

use clap::Parser;
use ratecon::api::{serve, ApiConfig, AppState};
use ratecon::config::Config;
use ratecon::loads::LOADS_TABLE;
use ratecon::store::{MemoryStore, SupabaseClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ratecon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RateCon Ripper load dashboard server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve sample loads from memory (sign in as demo@ratecon.dev / demo)
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.logging.init();
    tracing::info!("Starting RateCon dashboard v{}", env!("CARGO_PKG_VERSION"));

    let api_config = ApiConfig::from(&config.server).demo(args.demo);

    let state = if args.demo {
        tracing::info!("Demo mode: serving sample loads from memory");
        let store = Arc::new(MemoryStore::demo());
        AppState::mount(store.clone(), store, LOADS_TABLE, api_config.clone()).await?
    } else {
        let settings = match config.supabase() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Refusing to start without store settings");
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        tracing::info!(url = %settings.url, table = %config.store.table, "Record store configured");

        let mut client = SupabaseClient::new(settings)?;
        if let Some(sessions) = config.session.store() {
            tracing::info!("Session file: {:?}", sessions.path());
            client = client.with_session_store(sessions);
        }
        let client = Arc::new(client);

        AppState::mount(client.clone(), client, &config.store.table, api_config.clone()).await?
    };

    serve(state, &api_config).await?;
    Ok(())
}
