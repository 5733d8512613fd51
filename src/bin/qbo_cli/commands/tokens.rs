// ABOUTME: Token commands for qbo-cli: consent URL, code exchange, refresh and peek
// ABOUTME: Every command prints a redacted summary, never a raw token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use anyhow::{Context, Result};
use qbo_oauth_helper::clock::SystemClock;
use qbo_oauth_helper::config::ServerConfig;
use qbo_oauth_helper::errors::AppError;
use qbo_oauth_helper::formatters::OutputFormat;
use qbo_oauth_helper::oauth2_client::IntuitTokenClient;
use qbo_oauth_helper::routes::TokenSavedResponse;
use qbo_oauth_helper::server::HelperServices;
use qbo_oauth_helper::TokenLifecycleError;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::print_output;

async fn services(config: &ServerConfig) -> Result<HelperServices> {
    HelperServices::build(config, Arc::new(SystemClock))
        .await
        .context("Failed to initialize services")
}

/// Report a lifecycle failure the same way the HTTP surface does, then fail
fn report_failure(err: TokenLifecycleError, format: OutputFormat) -> anyhow::Error {
    let app_error = AppError::from(err);
    if let Err(e) = print_output(&app_error.to_response_body(), format) {
        return e;
    }
    anyhow::Error::new(app_error)
}

/// `qbo-cli authorize-url`
pub fn authorize_url(config: &ServerConfig, format: OutputFormat) -> Result<()> {
    let client = IntuitTokenClient::new(config.oauth.clone()).context("Invalid OAuth client")?;
    let state = Uuid::new_v4().simple().to_string();
    print_output(
        &json!({
            "authorization_url": client.authorization_url(&state),
            "state": state,
            "redirect_uri": config.oauth.redirect_uri,
        }),
        format,
    )
}

/// `qbo-cli exchange`
pub async fn exchange(
    config: &ServerConfig,
    format: OutputFormat,
    code: &str,
    realm_id: &str,
    redirect_uri: Option<&str>,
) -> Result<()> {
    let services = services(config).await?;
    let redirect_uri = redirect_uri.unwrap_or(&config.oauth.redirect_uri);

    let summary = services
        .lifecycle
        .authenticate(code, redirect_uri, Some(realm_id))
        .await
        .map_err(|e| report_failure(e, format))?;

    info!("Tokens saved for realm {}", summary.account_scope);
    print_output(
        &TokenSavedResponse {
            message: "Tokens saved".to_owned(),
            summary,
        },
        format,
    )
}

/// `qbo-cli refresh`
pub async fn refresh(
    config: &ServerConfig,
    format: OutputFormat,
    realm_id: Option<&str>,
) -> Result<()> {
    let services = services(config).await?;
    let summary = services
        .lifecycle
        .refresh_scope(realm_id)
        .await
        .map_err(|e| report_failure(e, format))?;

    print_output(
        &TokenSavedResponse {
            message: "Refreshed".to_owned(),
            summary,
        },
        format,
    )
}

/// `qbo-cli peek`
pub async fn peek(config: &ServerConfig, format: OutputFormat, realm_id: Option<&str>) -> Result<()> {
    let services = services(config).await?;
    let summary = services
        .lifecycle
        .peek_scope(realm_id)
        .await
        .map_err(|e| report_failure(e, format))?;

    match summary {
        Some(summary) => print_output(&summary, format),
        None => {
            let not_found = AppError::not_found("No QBO token stored");
            print_output(&not_found.to_response_body(), format)?;
            Err(anyhow::Error::new(not_found))
        }
    }
}
