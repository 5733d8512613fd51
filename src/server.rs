// ABOUTME: Wiring of configuration, credential store, exchange client and lifecycle manager
// ABOUTME: Shared by the local server binary and the command-line client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use std::time::Duration;

use qbo_core::{ConfigError, StoreError};
use tokio::net::TcpListener;
use tracing::info;

use crate::clock::SharedClock;
use crate::config::ServerConfig;
use crate::database_plugins::factory::create_credential_store;
use crate::lifecycle::TokenLifecycleManager;
use crate::oauth2_client::{IntuitTokenClient, PendingAuthorizations};
use crate::routes::{app_router, OAuthHelperContext};

/// Failures while assembling the services
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration is incomplete or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Credential store could not be opened
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Listener could not be bound or the server failed
    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fully wired services for one configuration
#[derive(Clone)]
pub struct HelperServices {
    /// Lifecycle orchestrator
    pub lifecycle: Arc<TokenLifecycleManager>,
    /// Token endpoint client
    pub client: Arc<IntuitTokenClient>,
}

impl HelperServices {
    /// Open the configured store and build the lifecycle manager
    ///
    /// # Errors
    ///
    /// Returns an error if client credentials are missing or the store
    /// cannot be opened
    pub async fn build(config: &ServerConfig, clock: SharedClock) -> Result<Self, StartupError> {
        let client = Arc::new(IntuitTokenClient::new(config.oauth.clone())?);
        let store = create_credential_store(&config.store_url, clock.clone()).await?;
        info!("Credential store: {}", store.describe());

        let lifecycle = TokenLifecycleManager::new(
            client.clone(),
            store,
            clock,
            config.environment,
            config.oauth.client_id.clone(),
        )
        .with_pinned_realm(config.realm_id.clone())
        .with_store_timeout(config.store_timeout);

        Ok(Self {
            lifecycle: Arc::new(lifecycle),
            client,
        })
    }

    /// Route context for the local server
    #[must_use]
    pub fn context(&self, clock: SharedClock) -> OAuthHelperContext {
        OAuthHelperContext {
            lifecycle: self.lifecycle.clone(),
            consent: self.client.clone(),
            pending: Arc::new(PendingAuthorizations::new(clock)),
        }
    }
}

/// Per-request bound covering one token call and two store calls
#[must_use]
pub fn request_timeout(config: &ServerConfig) -> Duration {
    config.oauth.timeout + config.store_timeout * 2 + Duration::from_secs(5)
}

/// Serve the helper routes until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the server fails while running
pub async fn serve<F>(
    listener: TcpListener,
    context: OAuthHelperContext,
    request_timeout: Duration,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = app_router(context, request_timeout);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
