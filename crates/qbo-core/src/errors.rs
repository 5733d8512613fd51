// ABOUTME: Error taxonomy for token exchange, refresh, storage and configuration failures
// ABOUTME: Every variant carries a stable machine-readable code for structured responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::Environment;

/// Credential store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not open or reach the backing store
    #[error("Failed to connect to credential store: {0}")]
    Connection(String),

    /// Schema setup failed
    #[error("Credential store migration failed: {0}")]
    Migration(String),

    /// A read or write statement failed
    #[error("Credential store query failed: {context}")]
    Query {
        /// Description of the failed operation
        context: String,
    },

    /// A stored row could not be turned back into a token record
    #[error("Stored token record is malformed: {0}")]
    Decode(String),

    /// File-backed store I/O failure
    #[error("Credential file I/O failed for {path}: {source}")]
    Io {
        /// File the operation touched
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for credential store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by the token lifecycle
#[derive(Debug, thiserror::Error)]
pub enum TokenLifecycleError {
    /// Token endpoint rejected the authorization code
    #[error("Authorization code exchange failed ({status}): {body}")]
    Exchange {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw response body returned by the provider
        body: String,
    },

    /// Token endpoint rejected the refresh token
    #[error("Token refresh failed ({status}): {body}")]
    Refresh {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw response body returned by the provider
        body: String,
    },

    /// No refresh token was available to send
    #[error("No refresh token available; authenticate first")]
    MissingRefreshToken,

    /// Refresh attempted with nothing stored
    #[error("No stored {environment} credential to refresh; authenticate first")]
    NoPriorCredential {
        /// Environment that was searched
        environment: Environment,
    },

    /// A network or storage call exceeded its bound
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Operation that timed out
        operation: &'static str,
        /// Bound that was exceeded
        seconds: u64,
    },

    /// Durable store failure on read or write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Token endpoint could not be reached
    #[error("Token endpoint request failed: {0}")]
    Transport(String),

    /// Token endpoint answered 2xx with an unreadable body
    #[error("Token endpoint returned an unreadable response: {0}")]
    InvalidResponse(String),

    /// Callback carried no account scope and the grant did not echo one
    #[error("No realmId was supplied with the authorization callback")]
    MissingAccountScope,
}

impl TokenLifecycleError {
    /// Stable machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Exchange { .. } => "exchange_failed",
            Self::Refresh { .. } => "refresh_failed",
            Self::MissingRefreshToken => "missing_refresh_token",
            Self::NoPriorCredential { .. } => "no_prior_credential",
            Self::Timeout { .. } => "timeout",
            Self::Store(_) => "store_error",
            Self::Transport(_) => "transport_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::MissingAccountScope => "missing_account_scope",
        }
    }

    /// HTTP status the provider answered with, when the failure came from it
    #[must_use]
    pub const fn provider_status(&self) -> Option<u16> {
        match self {
            Self::Exchange { status, .. } | Self::Refresh { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw provider response body, when the failure came from it
    #[must_use]
    pub fn provider_body(&self) -> Option<&str> {
        match self {
            Self::Exchange { body, .. } | Self::Refresh { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Result alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, TokenLifecycleError>;

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing required configuration: {name}")]
    Missing {
        /// Variable name
        name: &'static str,
    },

    /// A variable is set to an unusable value
    #[error("Invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_details_only_for_provider_failures() {
        let refresh = TokenLifecycleError::Refresh {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(refresh.code(), "refresh_failed");
        assert_eq!(refresh.provider_status(), Some(400));
        assert_eq!(refresh.provider_body(), Some(r#"{"error":"invalid_grant"}"#));

        let missing = TokenLifecycleError::NoPriorCredential {
            environment: Environment::Sandbox,
        };
        assert_eq!(missing.code(), "no_prior_credential");
        assert!(missing.provider_status().is_none());
        assert!(missing.to_string().contains("sandbox"));
    }

    #[test]
    fn test_store_errors_convert_transparently() {
        let err: TokenLifecycleError = StoreError::Query {
            context: "upsert failed".into(),
        }
        .into();
        assert_eq!(err.code(), "store_error");
        assert_eq!(err.to_string(), "Credential store query failed: upsert failed");
    }
}
