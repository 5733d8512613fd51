// ABOUTME: HTTP-facing error type mapping lifecycle, store and config failures to JSON responses
// ABOUTME: Carries a machine-readable code plus the provider's status and body when available
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qbo_core::{ConfigError, StoreError, TokenLifecycleError};
use serde::{Deserialize, Serialize};

/// JSON body returned for every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// HTTP status the provider answered with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Raw provider response body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Error returned by route handlers
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    provider_status: Option<u16>,
    provider_body: Option<String>,
}

/// Result alias for route handlers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            provider_status: None,
            provider_body: None,
        }
    }

    /// Bad request with a specific code
    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Nothing stored for the requested key
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Response status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// JSON body for this error
    #[must_use]
    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.code.to_owned(),
            message: self.message.clone(),
            status: self.provider_status,
            body: self.provider_body.clone(),
        }
    }
}

impl From<TokenLifecycleError> for AppError {
    fn from(err: TokenLifecycleError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: err.code(),
            message: err.to_string(),
            provider_status: err.provider_status(),
            provider_body: err.provider_body().map(ToOwned::to_owned),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        TokenLifecycleError::from(err).into()
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::invalid_input("invalid_configuration", err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.to_response_body())).into_response()
    }
}
