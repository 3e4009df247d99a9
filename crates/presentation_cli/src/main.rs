//! Aphasia trainer CLI
//!
//! Administration of the user store and quick checks of a running server.

#![allow(clippy::print_stdout)]

mod admin;

use application::{BootstrapOutcome, NewLocalUser};
use clap::{Parser, Subcommand};
use domain::Role;
use infrastructure::AppConfig;
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::{Admin, user_table};

/// Aphasia trainer CLI
#[derive(Parser)]
#[command(name = "aphasia-trainer-cli")]
#[command(author, version, about = "Aphasia conversation trainer CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check readiness of a running server
    Status {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },

    /// Liveness probe (used by container health checks)
    Health {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },

    /// Apply database migrations
    Migrate,

    /// Create the bootstrap developer account if no user exists
    Seed,

    /// Create a local account
    ///
    /// Example: aphasia-trainer-cli create-user anna --therapist terapeut@hospital.dk
    CreateUser {
        username: String,

        /// patient or developer
        #[arg(short, long, default_value = "patient")]
        role: Role,

        /// Therapist the patient is linked to
        #[arg(short, long)]
        therapist: Option<String>,

        #[arg(short, long)]
        display_name: Option<String>,

        /// Password (at least 8 characters)
        #[arg(long, env = "APHASIA_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List every account
    ListUsers,

    /// Print the effective configuration without secrets
    ShowConfig,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn load_config() -> AppConfig {
    AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(
            cli.verbose,
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Status { url } => {
            let resp = reqwest::Client::new()
                .get(endpoint_url(&url, "/ready"))
                .send()
                .await?;
            let status = resp.status();
            let body = resp.json::<serde_json::Value>().await?;

            println!("System status ({status}):");
            println!("{}", serde_json::to_string_pretty(&body)?);
        },

        Commands::Health { url } => {
            let resp = reqwest::Client::new()
                .get(endpoint_url(&url, "/health"))
                .send()
                .await?;
            if !resp.status().is_success() {
                anyhow::bail!("Health check failed with status {}", resp.status());
            }
            println!("ok");
        },

        Commands::Migrate => {
            let admin = Admin::connect(&load_config()).await?;
            admin.migrate().await?;
            println!("Migrations applied");
            admin.close().await;
        },

        Commands::Seed => {
            let config = load_config();
            let admin = Admin::connect(&config).await?;
            match admin.seed(config.bootstrap.account()).await? {
                BootstrapOutcome::Created(user) => {
                    println!("Created developer account '{}'", user.username());
                    println!("Change its password before going live.");
                },
                BootstrapOutcome::AlreadyInitialized => {
                    println!("User store already has accounts, nothing to do");
                },
            }
            admin.close().await;
        },

        Commands::CreateUser {
            username,
            role,
            therapist,
            display_name,
            password,
        } => {
            let admin = Admin::connect(&load_config()).await?;
            let user = admin
                .create_user(NewLocalUser {
                    username,
                    password: SecretString::from(password),
                    role,
                    display_name,
                    therapist,
                })
                .await?;
            println!("Created {} '{}'", user.role().label(), user.username());
            admin.close().await;
        },

        Commands::ListUsers => {
            let admin = Admin::connect(&load_config()).await?;
            print!("{}", user_table(&admin.list_users().await?));
            admin.close().await;
        },

        Commands::ShowConfig => {
            let config = load_config();
            println!("{}", toml::to_string_pretty(&config)?);
            for warning in config.warnings() {
                println!("# warning: {warning}");
            }
        },
    }

    Ok(())
}
