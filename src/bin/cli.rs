//! RateCon CLI
//!
//! Terminal client for the load dashboard:
//! - Sign in and out (the session is kept between runs)
//! - List loads and revenue stats
//! - Show and edit a single load

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ratecon::config::Config;
use ratecon::dashboard::{render_card, render_dashboard, DashboardPhase, DashboardView, LoadCard};
use ratecon::loads::format_amount;
use ratecon::store::{AuthClient, SupabaseClient};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ratecon-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Freight load dashboard in the terminal")]
#[command(long_about = "RateCon Ripper in the terminal.\nReview parsed rate confirmations and fix the reference, rate or commodity of a load.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print log output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Show the dashboard
    List {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show pending revenue and load count
    Stats,

    /// Show one load with its raw parsed data
    Show {
        /// Load id
        id: String,
    },

    /// Edit reference, rate or commodity of a load
    Edit {
        /// Load id
        id: String,
        /// New reference number
        #[arg(short, long)]
        reference: Option<String>,
        /// New rate
        #[arg(long, allow_hyphen_values = true)]
        rate: Option<String>,
        /// New commodity
        #[arg(long)]
        commodity: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        verbose,
    } = Cli::parse();

    match command {
        Commands::Config { output } => write_config(output),
        command => {
            let config = match &config {
                Some(path) => Config::load_with_env(path)?,
                None => Config::load_default(),
            };
            if verbose {
                config.logging.init();
            }
            run(command, &config).await
        }
    }
}

fn write_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let content = ratecon::config::generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    let settings = match config.supabase() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut client = SupabaseClient::new(settings)?;
    match config.session.store() {
        Some(sessions) => client = client.with_session_store(sessions),
        None => eprintln!("Note: session persistence is off; sign-in lasts for this command only"),
    }
    let client = Arc::new(client);

    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };

            match client.sign_in_with_password(email.trim(), &password).await {
                Ok(session) => println!("Signed in as {}", session.display_name()),
                Err(e) => bail!("Sign-in failed: {}", e.message()),
            }
        }

        Commands::Logout => {
            client.sign_out().await.context("Sign-out failed")?;
            println!("Signed out");
        }

        Commands::Whoami => match client.current_session().await? {
            Some(session) => {
                println!("{}", session.display_name());
                println!("  user id: {}", session.user.id);
                if let Some(expires_at) = session.expires_at {
                    if let Some(at) = chrono::DateTime::from_timestamp(expires_at, 0) {
                        println!("  session expires: {}", at.format("%Y-%m-%d %H:%M UTC"));
                    }
                }
            }
            None => println!("Not signed in"),
        },

        Commands::List { format } => {
            let view = open_dashboard(&client, config).await?;
            let snapshot = view.snapshot();

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view.loads())?),
                "table" => print!("{}", render_dashboard(&snapshot)),
                other => bail!("Unknown format '{}' (expected table or json)", other),
            }
        }

        Commands::Stats => {
            let view = open_dashboard(&client, config).await?;
            let stats = view.stats();

            println!("{:<20} ${}", "Pending Revenue", stats.revenue_display());
            println!("{:<20} {}", "Active Loads", stats.active_loads);
        }

        Commands::Show { id } => {
            let view = open_dashboard(&client, config).await?;
            let Some(load) = view.loads().iter().find(|l| l.id == id) else {
                bail!("Load not found: {}", id);
            };

            print!("{}", render_card(&LoadCard::from_load(load)));
            println!("  created: {}", load.created_at);
            println!("  status: {}", load.status.as_str());
            println!();
            println!("{}", serde_json::to_string_pretty(&load.raw_data)?);
        }

        Commands::Edit {
            id,
            reference,
            rate,
            commodity,
        } => {
            if reference.is_none() && rate.is_none() && commodity.is_none() {
                bail!("Nothing to change: pass --reference, --rate or --commodity");
            }

            let mut view = open_dashboard(&client, config).await?;
            let form = view.select(&id)?;
            if let Some(reference) = reference {
                form.set_load_reference(reference);
            }
            if let Some(rate) = rate {
                form.set_rate_input(rate);
            }
            if let Some(commodity) = commodity {
                form.set_commodity(commodity);
            }

            if let Err(e) = view.submit_update().await {
                let message = view.alert().map(str::to_string).unwrap_or_else(|| e.to_string());
                bail!(message);
            }

            let Some(load) = view.loads().iter().find(|l| l.id == id) else {
                bail!("Load not found: {}", id);
            };
            println!("Updated load {}", id);
            print!("{}", render_card(&LoadCard::from_load(load)));
            println!("Pending revenue now ${}", format_amount(view.stats().pending_revenue));
        }

        Commands::Config { output } => write_config(output)?,
    }

    Ok(())
}

/// Mount a dashboard view and require a session and a loaded list
async fn open_dashboard(client: &Arc<SupabaseClient>, config: &Config) -> anyhow::Result<DashboardView> {
    let mut view =
        DashboardView::new(client.clone(), client.clone()).with_table(config.store.table.as_str());
    view.mount().await?;

    if view.phase() == DashboardPhase::Unauthenticated {
        bail!("Not signed in. Run `ratecon-cli login` first.");
    }
    if let Some(error) = view.last_fetch_error() {
        bail!("Error fetching loads: {}", error);
    }

    Ok(view)
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
