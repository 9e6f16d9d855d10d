// ABOUTME: garmin-cli - command-line tool for Garmin Connect login and token management
// ABOUTME: Logs in, stores and inspects tokens, and runs a few read-only API calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Log in and write oauth1_token.json / oauth2_token.json to ~/.garminconnect
//! garmin-cli login --username me@example.com --password secret
//!
//! # Show expiry of the stored tokens
//! garmin-cli tokens
//!
//! # Print user settings using the stored tokens
//! garmin-cli settings
//!
//! # List the ten most recent activities
//! garmin-cli activities --start 0 --limit 10
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use garmin_connect::config::{GarminConfig, GarminDomain};
use garmin_connect::logging::LoggingConfig;

#[derive(Parser)]
#[command(
    name = "garmin-cli",
    about = "Garmin Connect command-line client",
    long_about = "Log in to Garmin Connect, manage stored OAuth tokens, and query the Connect API."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Token directory override (defaults to GARMIN_TOKEN_DIR or ~/.garminconnect)
    #[arg(long, global = true)]
    token_dir: Option<PathBuf>,

    /// Garmin domain override (garmin.com or garmin.cn)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Log in with credentials and store the resulting tokens
    Login {
        /// Account username (falls back to GARMIN_USERNAME or garmin.config.json)
        #[arg(long)]
        username: Option<String>,

        /// Account password (falls back to GARMIN_PASSWORD or garmin.config.json)
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the stored tokens' expiry
    Tokens,

    /// Print user settings
    Settings,

    /// List activities
    Activities {
        /// Offset of the first activity
        #[arg(long, default_value = "0")]
        start: u32,

        /// Number of activities to fetch
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

fn load_config(cli: &Cli) -> Result<GarminConfig> {
    let mut config = GarminConfig::from_env()?;
    if let Some(domain) = &cli.domain {
        config = config.with_domain(GarminDomain::from_str_or_default(domain));
    }
    if let Some(dir) = &cli.token_dir {
        config.token_dir.clone_from(dir);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env();
    let logging = if cli.verbose {
        logging.with_level("debug")
    } else {
        logging
    };
    logging.init()?;

    let config = load_config(&cli)?;

    match cli.command {
        Command::Login { username, password } => {
            commands::auth::login(config, username.as_deref(), password.as_deref()).await?;
        }
        Command::Tokens => {
            commands::auth::show_tokens(&config).await?;
        }
        Command::Settings => {
            commands::data::settings(config).await?;
        }
        Command::Activities { start, limit } => {
            commands::data::activities(config, start, limit).await?;
        }
    }

    Ok(())
}
