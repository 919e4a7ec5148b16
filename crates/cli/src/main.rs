//! Novel LMS CLI - drive the client library from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print the landing route for the resolved role
//! lms-cli -e editor@example.com login
//!
//! # Print the canonical identity and role of the signed-in account
//! lms-cli -e admin@example.com whoami
//!
//! # Resolve another user's LMS role
//! lms-cli -e admin@example.com role learner@example.com
//!
//! # Show normalized module progress for a member
//! lms-cli -e admin@example.com progress learner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `LMS_BASE_URL` - Base URL of the LMS backend
//! - `LMS_EMAIL` / `LMS_PASSWORD` - Credentials (flags take precedence)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use novel_lms_client::{AppState, LmsConfig};
use novel_lms_core::Identity;

mod commands;

#[derive(Parser)]
#[command(name = "lms-cli")]
#[command(author, version, about = "Novel LMS client tools")]
struct Cli {
    /// Account used to sign in to the LMS backend
    #[arg(short, long, env = "LMS_EMAIL")]
    email: String,

    /// Password for the account; prefer passing it via the environment
    #[arg(short, long, env = "LMS_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and print the landing route for the resolved role
    Login,
    /// Print the canonical identity and role of the signed-in account
    Whoami,
    /// Resolve the LMS role of another user
    Role {
        /// Identity to classify
        user: String,
    },
    /// Show normalized module progress for a member
    Progress {
        /// Member whose enrollments to report
        member: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter, defaulting to info for our crates
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "novel_lms=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = LmsConfig::from_env()?;
    let state = AppState::new(config)?;

    let identity = Identity::parse(&cli.email)?;
    let secret = SecretString::from(cli.password);

    match cli.command {
        Commands::Login => commands::login(&state, &identity, &secret).await?,
        Commands::Whoami => commands::whoami(&state, &identity, &secret).await?,
        Commands::Role { user } => {
            let target = Identity::parse(&user)?;
            commands::role(&state, &identity, &secret, &target).await?;
        }
        Commands::Progress { member } => {
            let target = Identity::parse(&member)?;
            commands::progress(&state, &identity, &secret, &target).await?;
        }
    }

    Ok(())
}
