// ABOUTME: Main library entry point for the local QuickBooks Online OAuth helper
// ABOUTME: Token exchange, credential storage, redacted summaries and the local HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # QBO OAuth Helper
//!
//! A local developer utility that runs the Intuit OAuth2 authorization-code
//! flow, stores the resulting access/refresh token pair and refreshes it on
//! demand while keeping the company's realm id attached to the credential.
//!
//! ## Architecture
//!
//! - **`oauth2_client`**: token endpoint calls and consent URL construction
//! - **`database` / `database_plugins`**: `SQLite`, `PostgreSQL` and `.env` credential stores
//! - **`formatters`**: redacted summaries rendered as JSON or text
//! - **`lifecycle`**: authenticate, refresh and peek orchestration
//! - **`routes`**: the local axum server's endpoints
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qbo_oauth_helper::clock::SystemClock;
//! use qbo_oauth_helper::config::ServerConfig;
//! use qbo_oauth_helper::server::HelperServices;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let services = HelperServices::build(&config, Arc::new(SystemClock)).await?;
//! if let Some(summary) = services.lifecycle.peek().await? {
//!     println!("realm {} access token {}", summary.account_scope, summary.access_token);
//! }
//! # Ok(())
//! # }
//! ```

/// Injectable time source
pub mod clock;

/// Environment-driven configuration
pub mod config;

/// Application constants
pub mod constants;

/// `SQLite` credential store
pub mod database;

/// Credential store trait, factory and additional backends
pub mod database_plugins;

/// HTTP error responses
pub mod errors;

/// Redacted summaries and output rendering
pub mod formatters;

/// Token lifecycle orchestration
pub mod lifecycle;

/// Tracing subscriber setup
pub mod logging;

/// Intuit token endpoint client
pub mod oauth2_client;

/// HTTP routes
pub mod routes;

/// Service wiring shared by the binaries
pub mod server;

/// Env file helpers
pub mod utils;

pub use qbo_core::{
    Environment, TokenGrant, TokenLifecycleError, TokenRecord, TokenRecordData, TokenSummary,
};
