// ABOUTME: Token lifecycle data models for QBO OAuth credentials
// ABOUTME: Environment selector, token endpoint grant, stored record write/read models and summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::redaction::redact_secret;

/// Default token type reported by the provider
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Access token lifetime assumed when the provider omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Largest token lifetime accepted from the provider or a store (100 years)
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 3_155_760_000;

/// Check a lifetime in seconds lies in `0..=MAX_TOKEN_LIFETIME_SECS`
///
/// # Errors
///
/// Returns a description naming `field` when the value is out of range
pub fn check_lifetime(field: &str, seconds: i64) -> Result<i64, String> {
    if (0..=MAX_TOKEN_LIFETIME_SECS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(format!(
            "{field} of {seconds} seconds is outside 0..={MAX_TOKEN_LIFETIME_SECS}"
        ))
    }
}

/// `issued_at + seconds`, saturating at the latest representable instant
fn expiry_after(issued_at: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Provider environment a credential was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer sandbox companies
    #[default]
    Sandbox,
    /// Live production companies
    Production,
}

impl Environment {
    /// Stable lowercase name used as the storage key component
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    /// Accounting API base URL for this environment
    #[must_use]
    pub const fn api_base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox-quickbooks.api.intuit.com",
            Self::Production => "https://quickbooks.api.intuit.com",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    /// Parse case-insensitively; blank input selects the sandbox
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "sandbox" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Invalid {
                name: "QBO_ENV",
                reason: format!("expected 'sandbox' or 'production', got '{other}'"),
            }),
        }
    }
}

const fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_owned()
}

/// Token endpoint response for both the authorization-code and refresh grants
///
/// `realm_id` is rarely present in the body; the provider sends it as a
/// query parameter on the redirect callback instead.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Opaque access token
    pub access_token: String,
    /// Opaque refresh token, rotated on every refresh
    #[serde(default)]
    pub refresh_token: String,
    /// Token type, normally "bearer"
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_refresh_token_expires_in: Option<i64>,
    /// Account scope echoed by the provider, if any
    #[serde(
        default,
        rename = "realmId",
        alias = "realm_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub realm_id: Option<String>,
}

impl TokenGrant {
    /// Reject lifetimes that cannot be turned into an expiry timestamp
    ///
    /// # Errors
    ///
    /// Returns a description of the first out-of-range lifetime
    pub fn validate_lifetimes(&self) -> Result<(), String> {
        check_lifetime("expires_in", self.expires_in)?;
        if let Some(secs) = self.x_refresh_token_expires_in {
            check_lifetime("x_refresh_token_expires_in", secs)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &redact_secret(&self.access_token))
            .field("refresh_token", &redact_secret(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "x_refresh_token_expires_in",
                &self.x_refresh_token_expires_in,
            )
            .field("realm_id", &self.realm_id)
            .finish()
    }
}

/// Write model handed to a credential store
///
/// Derived expiry timestamps are not fields: stores compute them from
/// `issued_at` on every write so a stale value can never be persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecordData {
    /// Account scope (realm id) the token authorizes
    pub account_scope: String,
    /// Environment the token was issued for
    pub environment: Environment,
    /// Opaque access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Token type, normally "bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in_seconds: i64,
    /// Refresh token lifetime in seconds, when the provider reported one
    pub refresh_expires_in_seconds: Option<i64>,
    /// When the grant was received
    pub issued_at: DateTime<Utc>,
    /// OAuth client that obtained the grant
    pub client_id: String,
}

impl TokenRecordData {
    /// Build a write model from a token endpoint grant
    #[must_use]
    pub fn from_grant(
        account_scope: impl Into<String>,
        environment: Environment,
        client_id: impl Into<String>,
        grant: &TokenGrant,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let token_type = if grant.token_type.trim().is_empty() {
            default_token_type()
        } else {
            grant.token_type.clone()
        };

        Self {
            account_scope: account_scope.into(),
            environment,
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            token_type,
            expires_in_seconds: grant.expires_in,
            refresh_expires_in_seconds: grant.x_refresh_token_expires_in,
            issued_at,
            client_id: client_id.into(),
        }
    }

    /// Access token expiry derived from the issue time
    #[must_use]
    pub fn access_expires_at(&self) -> DateTime<Utc> {
        expiry_after(self.issued_at, self.expires_in_seconds)
    }

    /// Refresh token expiry derived from the issue time, absent when unknown
    #[must_use]
    pub fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_expires_in_seconds
            .map(|secs| expiry_after(self.issued_at, secs))
    }

    /// Materialize the read model with store-managed timestamps
    #[must_use]
    pub fn into_record(self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> TokenRecord {
        let access_expires_at = self.access_expires_at();
        let refresh_expires_at = self.refresh_expires_at();
        TokenRecord {
            account_scope: self.account_scope,
            environment: self.environment,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_in_seconds: self.expires_in_seconds,
            refresh_expires_in_seconds: self.refresh_expires_in_seconds,
            issued_at: self.issued_at,
            access_expires_at,
            refresh_expires_at,
            client_id: self.client_id,
            created_at,
            updated_at,
        }
    }
}

impl fmt::Debug for TokenRecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecordData")
            .field("account_scope", &self.account_scope)
            .field("environment", &self.environment)
            .field("access_token", &redact_secret(&self.access_token))
            .field("refresh_token", &redact_secret(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field(
                "refresh_expires_in_seconds",
                &self.refresh_expires_in_seconds,
            )
            .field("issued_at", &self.issued_at)
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// One stored OAuth credential set for one account scope in one environment
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Account scope (realm id) the token authorizes
    pub account_scope: String,
    /// Environment the token was issued for
    pub environment: Environment,
    /// Opaque access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Token type, normally "bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in_seconds: i64,
    /// Refresh token lifetime in seconds, when the provider reported one
    pub refresh_expires_in_seconds: Option<i64>,
    /// When the grant was received
    pub issued_at: DateTime<Utc>,
    /// `issued_at + expires_in_seconds`
    pub access_expires_at: DateTime<Utc>,
    /// `issued_at + refresh_expires_in_seconds`
    pub refresh_expires_at: Option<DateTime<Utc>>,
    /// OAuth client that obtained the grant
    pub client_id: String,
    /// First write of this (scope, environment) pair
    pub created_at: DateTime<Utc>,
    /// Most recent write of this (scope, environment) pair
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the access token has expired at `now`
    #[must_use]
    pub fn is_access_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_expires_at
    }

    /// Whether the refresh token is known to have expired at `now`
    #[must_use]
    pub fn is_refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires_at.is_some_and(|at| now >= at)
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("account_scope", &self.account_scope)
            .field("environment", &self.environment)
            .field("access_token", &redact_secret(&self.access_token))
            .field("refresh_token", &redact_secret(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("issued_at", &self.issued_at)
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("client_id", &self.client_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Non-secret view of a stored token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSummary {
    /// Account scope in full
    #[serde(rename = "realmId")]
    pub account_scope: String,
    /// Environment the token was issued for
    pub environment: Environment,
    /// Masked access token
    pub access_token: String,
    /// Masked refresh token
    pub refresh_token: String,
    /// Whether an access token is stored
    pub has_access: bool,
    /// Whether a refresh token is stored
    pub has_refresh: bool,
    /// Length of the stored access token
    pub access_len: usize,
    /// Token type
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub x_refresh_token_expires_in: Option<i64>,
    /// When the grant was received
    pub issued_at: DateTime<Utc>,
    /// Access token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry
    pub refresh_expires_at: Option<DateTime<Utc>>,
    /// When this summary was produced
    pub observed_at: DateTime<Utc>,
}
