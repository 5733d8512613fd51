// ABOUTME: Local HTTP server for the QBO OAuth consent flow, refresh and peek
// ABOUTME: Loads .env, opens the credential store and optionally launches the browser
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # QBO OAuth Helper Server
//!
//! ## Usage
//!
//! ```bash
//! # Start on 127.0.0.1:5000 and open the home page
//! cargo run --bin qbo-oauth-helper
//!
//! # Different port, no browser
//! cargo run --bin qbo-oauth-helper -- --port 8080 --no-browser
//! ```
//!
//! The redirect URI registered with Intuit (`INTUIT_REDIRECT_URI`) must point
//! at this server's `/callback`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use qbo_oauth_helper::clock::{SharedClock, SystemClock};
use qbo_oauth_helper::config::ServerConfig;
use qbo_oauth_helper::constants::service;
use qbo_oauth_helper::logging::init_logging;
use qbo_oauth_helper::server::{request_timeout, serve, HelperServices};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "qbo-oauth-helper",
    version,
    about = "Local QuickBooks Online OAuth helper",
    long_about = "Runs the Intuit OAuth2 consent flow in the browser, stores the token pair \
                  and exposes /refresh and /peek for manual token maintenance"
)]
struct ServerArgs {
    /// Bind host (overrides HTTP_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Do not open the home page in the default browser
    #[arg(long)]
    no_browser: bool,

    /// Env file to load before reading configuration (default: QBO_ENV_FILE or .env)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    // Load .env first so it can set RUST_LOG and LOG_FORMAT
    let mut config = ServerConfig::from_env_with_file(args.env_file.as_deref())
        .context("Failed to load configuration")?;
    init_logging(if args.verbose { "debug" } else { "info" });

    if let Some(host) = args.host {
        config.http_host = host;
    }
    if let Some(port) = args.port {
        config.http_port = port;
    }

    info!("=== {} v{} ===", service::NAME, service::VERSION);
    info!("Environment: {}", config.environment);

    let clock: SharedClock = Arc::new(SystemClock);
    let services = HelperServices::build(&config, clock.clone())
        .await
        .context("Failed to initialize services")?;

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    let home = config.home_url();
    info!("Listening on {home}");
    info!("Redirect URI: {}", config.oauth.redirect_uri);

    if !args.no_browser {
        open_browser(&home);
    }

    serve(
        listener,
        services.context(clock),
        request_timeout(&config),
        shutdown_signal(),
    )
    .await
    .context("Server stopped with an error")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "browser")]
fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        warn!("Could not open browser: {e}. Visit {url} manually");
    }
}

#[cfg(not(feature = "browser"))]
fn open_browser(url: &str) {
    warn!("Built without browser support. Visit {url} manually");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
