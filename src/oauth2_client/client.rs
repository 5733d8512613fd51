// ABOUTME: HTTP client for the Intuit OAuth2 token endpoint and consent URL construction
// ABOUTME: Form-encoded grant calls with basic client auth, bounded by a per-request timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Intuit Token Client
//!
//! Performs the two OAuth2 grants the helper needs:
//!
//! - `authorization_code`: after the consent redirect
//! - `refresh_token`: on demand, rotating the refresh token
//!
//! Requests are `application/x-www-form-urlencoded` POSTs authenticated with
//! HTTP basic auth (client id / client secret). There is no retry: a failed
//! call is reported to the caller as-is.
//!
//! ```rust,no_run
//! use qbo_oauth_helper::config::OAuthClientConfig;
//! use qbo_oauth_helper::oauth2_client::{IntuitTokenClient, TokenExchange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IntuitTokenClient::new(OAuthClientConfig::new("client-id", "client-secret"))?;
//! let grant = client.refresh("stored-refresh-token").await?;
//! println!("access token lifetime: {}s", grant.expires_in);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use qbo_core::{ConfigError, LifecycleResult, TokenGrant, TokenLifecycleError};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::TokenExchange;
use crate::config::OAuthClientConfig;

/// Which grant a request carries; selects the error variant on rejection
#[derive(Debug, Clone, Copy)]
enum GrantKind {
    AuthorizationCode,
    RefreshToken,
}

impl GrantKind {
    const fn operation(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization code exchange",
            Self::RefreshToken => "token refresh",
        }
    }

    fn rejected(self, status: StatusCode, body: String) -> TokenLifecycleError {
        let status = status.as_u16();
        match self {
            Self::AuthorizationCode => TokenLifecycleError::Exchange { status, body },
            Self::RefreshToken => TokenLifecycleError::Refresh { status, body },
        }
    }
}

/// Token endpoint client for one OAuth client registration
pub struct IntuitTokenClient {
    config: OAuthClientConfig,
    authorization_endpoint: Url,
    http_client: Client,
}

impl IntuitTokenClient {
    /// Build a client from an explicit registration
    ///
    /// # Errors
    ///
    /// Returns an error if the client credentials are missing, an endpoint URL
    /// is malformed or the HTTP client cannot be constructed
    pub fn new(config: OAuthClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let authorization_endpoint =
            Url::parse(&config.authorization_url).map_err(|e| ConfigError::Invalid {
                name: "QBO_AUTH_URL",
                reason: e.to_string(),
            })?;
        Url::parse(&config.token_url).map_err(|e| ConfigError::Invalid {
            name: "QBO_TOKEN_URL",
            reason: e.to_string(),
        })?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "QBO_HTTP_TIMEOUT_SECS",
                reason: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            authorization_endpoint,
            http_client,
        })
    }

    /// Registration this client was built from
    #[must_use]
    pub const fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// Consent page URL the user is sent to
    ///
    /// `prompt=consent` forces the provider to show the consent screen again
    /// even when the app was already authorized.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state)
            .append_pair("prompt", "consent");
        url.into()
    }

    fn timeout_error(&self, kind: GrantKind) -> TokenLifecycleError {
        TokenLifecycleError::Timeout {
            operation: kind.operation(),
            seconds: self.config.timeout.as_secs(),
        }
    }

    fn transport_error(&self, kind: GrantKind, err: &reqwest::Error) -> TokenLifecycleError {
        if err.is_timeout() {
            warn!("{} timed out", kind.operation());
            self.timeout_error(kind)
        } else {
            warn!("{} transport failure: {err}", kind.operation());
            TokenLifecycleError::Transport(err.to_string())
        }
    }

    async fn post_grant(
        &self,
        kind: GrantKind,
        form: &[(&str, &str)],
    ) -> LifecycleResult<TokenGrant> {
        debug!("POST {} ({})", self.config.token_url, kind.operation());

        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| self.transport_error(kind, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(kind, &e))?;

        if !status.is_success() {
            warn!("{} rejected with HTTP {status}", kind.operation());
            return Err(kind.rejected(status, body));
        }

        let grant: TokenGrant = serde_json::from_str(&body)
            .map_err(|e| TokenLifecycleError::InvalidResponse(e.to_string()))?;
        grant
            .validate_lifetimes()
            .map_err(TokenLifecycleError::InvalidResponse)?;

        info!(
            expires_in = grant.expires_in,
            has_refresh = !grant.refresh_token.is_empty(),
            "{} succeeded",
            kind.operation()
        );
        Ok(grant)
    }
}

#[async_trait]
impl TokenExchange for IntuitTokenClient {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> LifecycleResult<TokenGrant> {
        self.post_grant(
            GrantKind::AuthorizationCode,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> LifecycleResult<TokenGrant> {
        if refresh_token.trim().is_empty() {
            return Err(TokenLifecycleError::MissingRefreshToken);
        }
        self.post_grant(
            GrantKind::RefreshToken,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }
}
