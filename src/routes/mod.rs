// ABOUTME: Route module organization for the local QBO OAuth helper server
// ABOUTME: Merges the OAuth helper and health routers under tracing and timeout layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the QBO OAuth helper
//!
//! Handlers stay thin: they validate request parameters and delegate to
//! [`crate::lifecycle::TokenLifecycleManager`].

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Health check route
pub mod health;
/// Consent, callback, refresh and peek routes
pub mod oauth2;

pub use health::{HealthResponse, HealthRoutes};
pub use oauth2::{OAuthHelperContext, OAuthHelperRoutes, TokenSavedResponse};

/// Full application router
///
/// `request_timeout` must exceed the token endpoint timeout plus two store
/// calls so that lifecycle timeouts surface as JSON errors first.
pub fn app_router(context: OAuthHelperContext, request_timeout: Duration) -> Router {
    Router::new()
        .merge(OAuthHelperRoutes::router(context.clone()))
        .merge(HealthRoutes::router(context.lifecycle))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}
