// ABOUTME: OAuth2 token endpoint client module for the Intuit authorization server
// ABOUTME: Defines the TokenExchange seam used by the lifecycle manager plus consent state tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Token endpoint access.
//!
//! [`TokenExchange`] is the only thing the lifecycle manager knows about the
//! provider. [`IntuitTokenClient`] implements it over HTTP; tests substitute
//! in-process fakes.

use async_trait::async_trait;
use qbo_core::{LifecycleResult, TokenGrant};

/// reqwest-backed token endpoint client
pub mod client;
/// Pending consent `state` values issued by the local server
pub mod state;

pub use client::IntuitTokenClient;
pub use state::PendingAuthorizations;

/// OAuth2 grant calls against a token endpoint
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Trade an authorization code for a token grant
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the code, the call times out
    /// or the response cannot be read
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> LifecycleResult<TokenGrant>;

    /// Trade a refresh token for a new token grant
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is empty, the provider rejects it,
    /// the call times out or the response cannot be read
    async fn refresh(&self, refresh_token: &str) -> LifecycleResult<TokenGrant>;
}
