//! Reseller Panel CLI - session, admin guard, exports and key import.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from -p or RP_PASSWORD)
//! rp-cli login -u admin
//!
//! # Show the logged-in account
//! rp-cli whoami
//!
//! # Run the admin guard and print its decision
//! rp-cli guard check
//!
//! # Export filtered transactions as CSV
//! rp-cli transactions export --kind purchase --from 2024-05-01 -o may.csv
//!
//! # Import license keys for a product
//! rp-cli keys import --product win11-pro --file keys.txt
//!
//! # Log out
//! rp-cli logout
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `guard check` - Admin guard decision
//! - `transactions export` - CSV export (admin only)
//! - `keys import` - Bulk license key import (admin only)
//!
//! Configuration is read from the environment; see
//! [`PanelConfig`](reseller_panel_admin::PanelConfig).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reseller_panel_admin::{AppError, PanelConfig};
use reseller_panel_core::TransactionKind;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rp-cli")]
#[command(author, version, about = "Reseller panel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "RP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Admin guard
    Guard {
        #[command(subcommand)]
        action: GuardAction,
    },
    /// Credit transactions
    Transactions {
        #[command(subcommand)]
        action: TransactionsAction,
    },
    /// License key inventory
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand)]
enum GuardAction {
    /// Run the guard and print the final state
    Check,
}

#[derive(Subcommand)]
enum TransactionsAction {
    /// Export transactions as CSV
    Export {
        /// Only this kind (`purchase`, `credit`, `refund`, `adjustment`)
        #[arg(long)]
        kind: Option<TransactionKind>,

        /// Username contains (case-insensitive)
        #[arg(long)]
        user: Option<String>,

        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Description contains (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        /// Output file (defaults to a name derived from the date range)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Import keys from a text file, one per line
    Import {
        /// Product the keys belong to
        #[arg(long)]
        product: String,

        /// Key file
        #[arg(short, long)]
        file: PathBuf,

        /// Parse and report without uploading
        #[arg(long)]
        dry_run: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PanelConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reseller_panel_admin=info,rp_cli=info".into());

    // Logs go to stderr; stdout carries command output
    let is_json = std::env::var("RP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = PanelConfig::from_env();
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(AppError::from(e).into()),
    };

    if let Err(e) = result {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => app_error.report(),
            None => tracing::error!("Command failed: {e}"),
        }
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: PanelConfig) -> Result<(), Box<dyn std::error::Error>> {
    let panel = commands::Panel::open(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&panel, &username, &password).await?;
        }
        Commands::Logout => commands::session::logout(&panel).await,
        Commands::Whoami => commands::session::whoami(&panel).await?,
        Commands::Guard { action } => match action {
            GuardAction::Check => commands::guard::check(&panel).await?,
        },
        Commands::Transactions { action } => match action {
            TransactionsAction::Export {
                kind,
                user,
                from,
                to,
                search,
                output,
            } => {
                let filter = commands::transactions::build_filter(kind, user, from, to, search)?;
                commands::transactions::export(&panel, &filter, output).await?;
            }
        },
        Commands::Keys { action } => match action {
            KeysAction::Import {
                product,
                file,
                dry_run,
            } => commands::keys::import(&panel, &product, &file, dry_run).await?,
        },
    }
    Ok(())
}
