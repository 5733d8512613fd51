// ABOUTME: Liveness endpoint reporting service identity and connection state
// ABOUTME: Never touches the token endpoint and never returns token material
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::constants::service;
use crate::lifecycle::TokenLifecycleManager;

/// Health check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Configured provider environment
    pub environment: String,
    /// Lifecycle state of the managed connection
    pub connection_state: String,
    /// Credential store backend
    pub store: String,
}

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// `GET /health`
    pub fn router(lifecycle: Arc<TokenLifecycleManager>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(lifecycle)
    }

    async fn handle_health(
        State(lifecycle): State<Arc<TokenLifecycleManager>>,
    ) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".to_owned(),
            service: service::NAME.to_owned(),
            version: service::VERSION.to_owned(),
            environment: lifecycle.environment().to_string(),
            connection_state: lifecycle.state().to_string(),
            store: lifecycle.store_description(),
        })
    }
}
