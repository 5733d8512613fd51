// ABOUTME: Configuration display for qbo-cli
// ABOUTME: Shows effective settings with the client secret and store password hidden
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use qbo_oauth_helper::config::environment::redact_store_url;
use qbo_oauth_helper::config::ServerConfig;
use qbo_oauth_helper::formatters::OutputFormat;
use serde_json::json;

use super::print_output;

/// `qbo-cli config`
pub fn show(config: &ServerConfig, format: OutputFormat) -> Result<()> {
    let secret_state = if config.oauth.client_secret.is_empty() {
        "missing"
    } else {
        "set"
    };

    print_output(
        &json!({
            "environment": config.environment,
            "api_base_url": config.environment.api_base_url(),
            "client_id": config.oauth.client_id,
            "client_secret": secret_state,
            "redirect_uri": config.oauth.redirect_uri,
            "authorization_url": config.oauth.authorization_url,
            "token_url": config.oauth.token_url,
            "scope": config.oauth.scope,
            "realm_id": config.realm_id,
            "store": redact_store_url(&config.store_url),
            "http_bind": config.bind_address(),
            "timeout_secs": config.oauth.timeout.as_secs(),
        }),
        format,
    )
}
