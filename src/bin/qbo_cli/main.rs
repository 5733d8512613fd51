// ABOUTME: Command-line client for QBO token exchange, refresh and inspection
// ABOUTME: Shares configuration and stores with the local server; prints JSON or text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # qbo-cli
//!
//! ```bash
//! # Consent URL to open manually
//! qbo-cli authorize-url
//!
//! # Exchange the code from the redirect URL
//! qbo-cli exchange --code AB11... --realm-id 9341452311
//!
//! # Rotate and inspect
//! qbo-cli refresh
//! qbo-cli --format text peek
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qbo_oauth_helper::config::ServerConfig;
use qbo_oauth_helper::formatters::OutputFormat;
use qbo_oauth_helper::logging::init_logging;

#[derive(Parser)]
#[command(name = "qbo-cli")]
#[command(version)]
#[command(about = "QuickBooks Online OAuth token maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    format: FormatArg,

    /// Env file to load before reading configuration (default: QBO_ENV_FILE or .env)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print a consent URL to open in a browser
    AuthorizeUrl,

    /// Exchange an authorization code and store the tokens
    Exchange {
        /// Authorization code from the redirect URL
        #[arg(long)]
        code: String,

        /// Company realm id from the redirect URL
        #[arg(long)]
        realm_id: String,

        /// Redirect URI used for the consent request (default: INTUIT_REDIRECT_URI)
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Rotate the stored tokens
    Refresh {
        /// Realm to refresh (default: QBO_PIN_REALM_ID or the most recently updated)
        #[arg(long)]
        realm_id: Option<String>,
    },

    /// Show a redacted view of the stored tokens
    Peek {
        /// Realm to show (default: QBO_PIN_REALM_ID or the most recently updated)
        #[arg(long)]
        realm_id: Option<String>,
    },

    /// Show effective configuration without secrets
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::from_env_with_file(cli.env_file.as_deref())
        .context("Failed to load configuration")?;
    init_logging(if cli.verbose { "debug" } else { "warn" });

    let format = OutputFormat::from(cli.format);
    match cli.command {
        Commands::AuthorizeUrl => commands::tokens::authorize_url(&config, format),
        Commands::Exchange {
            code,
            realm_id,
            redirect_uri,
        } => {
            commands::tokens::exchange(&config, format, &code, &realm_id, redirect_uri.as_deref())
                .await
        }
        Commands::Refresh { realm_id } => {
            commands::tokens::refresh(&config, format, realm_id.as_deref()).await
        }
        Commands::Peek { realm_id } => {
            commands::tokens::peek(&config, format, realm_id.as_deref()).await
        }
        Commands::Config => commands::config::show(&config, format),
    }
}
