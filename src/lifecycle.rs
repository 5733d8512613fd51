// ABOUTME: Token lifecycle orchestration for one logical QBO connection
// ABOUTME: Sequences code exchange, refresh and peek across the exchange client and credential store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Token Lifecycle
//!
//! [`TokenLifecycleManager`] owns the rules for a credential's life:
//!
//! - **authenticate**: code exchange, merge the callback's realm id, store, summarize, re-pin
//! - **refresh**: read the prior record, rotate tokens, keep the prior realm id, store
//! - **peek**: read and summarize, `None` when nothing is stored
//!
//! The store is never written when the provider call fails. Store calls are
//! bounded by a timeout; the network call is bounded by the exchange client.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use qbo_core::{
    Environment, LifecycleResult, StoreResult, TokenGrant, TokenLifecycleError, TokenRecord,
    TokenRecordData, TokenSummary,
};
use tracing::{info, warn};

use crate::clock::SharedClock;
use crate::constants::defaults;
use crate::database_plugins::CredentialStore;
use crate::formatters::summarize;
use crate::oauth2_client::TokenExchange;

/// Observable state of the managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No credential known yet
    Unauthenticated,
    /// A credential is stored
    Authenticated,
    /// A refresh call is in flight
    Refreshing,
    /// The last attempt failed
    Failed,
}

impl ConnectionState {
    /// Lowercase name for status output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates exchange, storage and summaries for one connection
pub struct TokenLifecycleManager {
    exchange: Arc<dyn TokenExchange>,
    store: Arc<dyn CredentialStore>,
    clock: SharedClock,
    environment: Environment,
    client_id: String,
    pinned_realm: Mutex<Option<String>>,
    store_timeout: Duration,
    state: Mutex<ConnectionState>,
}

impl TokenLifecycleManager {
    /// Manager for `environment`, recording `client_id` on every write
    #[must_use]
    pub fn new(
        exchange: Arc<dyn TokenExchange>,
        store: Arc<dyn CredentialStore>,
        clock: SharedClock,
        environment: Environment,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            exchange,
            store,
            clock,
            environment,
            client_id: client_id.into(),
            pinned_realm: Mutex::new(None),
            store_timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            state: Mutex::new(ConnectionState::Unauthenticated),
        }
    }

    /// Refresh and peek this realm instead of the most recently updated one
    ///
    /// A later successful authenticate for another realm moves the pin there.
    #[must_use]
    pub fn with_pinned_realm(self, realm_id: Option<String>) -> Self {
        *self.pinned_realm.lock().unwrap_or_else(PoisonError::into_inner) = realm_id
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());
        self
    }

    /// Bound applied to every store call
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Environment this manager issues and reads credentials for
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Realm used when no scope is passed explicitly
    #[must_use]
    pub fn pinned_realm(&self) -> Option<String> {
        self.pinned_realm
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn repin(&self, scope: &str) {
        let mut pinned = self.pinned_realm.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pinned.as_deref().filter(|p| *p != scope) {
            info!(
                previous = %previous,
                realm_id = %scope,
                "Pinned realm moved to the newly authorized company"
            );
            *pinned = Some(scope.to_owned());
        }
    }

    /// Description of the backing store
    #[must_use]
    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Record the outcome of an attempt in the state machine
    fn settle<T>(&self, result: LifecycleResult<T>) -> LifecycleResult<T> {
        match &result {
            Ok(_) => self.set_state(ConnectionState::Authenticated),
            Err(e) => {
                warn!(error_code = e.code(), "Token lifecycle operation failed: {e}");
                self.set_state(ConnectionState::Failed);
            }
        }
        result
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> LifecycleResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(TokenLifecycleError::from),
            Err(_) => Err(TokenLifecycleError::Timeout {
                operation,
                seconds: self.store_timeout.as_secs(),
            }),
        }
    }

    async fn read_current(&self, scope: Option<&str>) -> LifecycleResult<Option<TokenRecord>> {
        let target = scope.map(ToOwned::to_owned).or_else(|| self.pinned_realm());
        match target.as_deref() {
            Some(scope) => {
                self.bounded("credential store read", self.store.get(scope, self.environment))
                    .await
            }
            None => {
                self.bounded("credential store read", self.store.latest(self.environment))
                    .await
            }
        }
    }

    fn checked_data(
        &self,
        scope: &str,
        environment: Environment,
        grant: &TokenGrant,
    ) -> LifecycleResult<TokenRecordData> {
        grant
            .validate_lifetimes()
            .map_err(TokenLifecycleError::InvalidResponse)?;
        Ok(TokenRecordData::from_grant(
            scope,
            environment,
            &self.client_id,
            grant,
            self.clock.now(),
        ))
    }

    async fn persist(&self, data: TokenRecordData) -> LifecycleResult<TokenSummary> {
        self.bounded("credential store write", self.store.upsert(&data))
            .await?;
        let issued_at = data.issued_at;
        let record = data.into_record(issued_at, issued_at);
        Ok(summarize(&record, self.clock.now()))
    }

    /// Exchange an authorization code and store the resulting credential
    ///
    /// `account_scope` is the realm id from the consent callback; the token
    /// body's realm id is used only when the callback did not supply one.
    /// A pinned realm follows the newly stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails, no realm id is available or
    /// the store write fails. Nothing is stored on any failure.
    pub async fn authenticate(
        &self,
        code: &str,
        redirect_uri: &str,
        account_scope: Option<&str>,
    ) -> LifecycleResult<TokenSummary> {
        let result = self
            .authenticate_inner(code, redirect_uri, account_scope)
            .await;
        self.settle(result)
    }

    async fn authenticate_inner(
        &self,
        code: &str,
        redirect_uri: &str,
        account_scope: Option<&str>,
    ) -> LifecycleResult<TokenSummary> {
        let grant = self
            .exchange
            .exchange_authorization_code(code, redirect_uri)
            .await?;

        let scope = account_scope
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| grant.realm_id.clone().filter(|s| !s.trim().is_empty()))
            .ok_or(TokenLifecycleError::MissingAccountScope)?;

        let data = self.checked_data(&scope, self.environment, &grant)?;
        let summary = self.persist(data).await?;
        self.repin(&scope);

        info!(realm_id = %scope, environment = %self.environment, "QBO tokens saved");
        Ok(summary)
    }

    /// Refresh the pinned or most recently updated credential
    ///
    /// # Errors
    ///
    /// See [`Self::refresh_scope`]
    pub async fn refresh(&self) -> LifecycleResult<TokenSummary> {
        self.refresh_scope(None).await
    }

    /// Refresh the credential for `scope` (or the default one)
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is stored, the stored refresh token is
    /// empty, the provider rejects it or a store call fails. The stored record
    /// is left untouched on any failure.
    pub async fn refresh_scope(&self, scope: Option<&str>) -> LifecycleResult<TokenSummary> {
        self.set_state(ConnectionState::Refreshing);
        let result = self.refresh_inner(scope).await;
        self.settle(result)
    }

    async fn refresh_inner(&self, scope: Option<&str>) -> LifecycleResult<TokenSummary> {
        let prior = self
            .read_current(scope)
            .await?
            .ok_or(TokenLifecycleError::NoPriorCredential {
                environment: self.environment,
            })?;

        if prior.refresh_token.is_empty() {
            return Err(TokenLifecycleError::MissingRefreshToken);
        }

        let mut grant = self.exchange.refresh(&prior.refresh_token).await?;

        if grant.refresh_token.is_empty() {
            warn!(
                realm_id = %prior.account_scope,
                "Refresh response carried no refresh token, keeping the stored one"
            );
            grant.refresh_token.clone_from(&prior.refresh_token);
        }
        if let Some(echoed) = grant.realm_id.as_deref() {
            if echoed != prior.account_scope {
                warn!(
                    stored = %prior.account_scope,
                    echoed = %echoed,
                    "Refresh response named a different realm, keeping the stored one"
                );
            }
        }

        let data = self.checked_data(&prior.account_scope, prior.environment, &grant)?;
        let summary = self.persist(data).await?;

        info!(
            realm_id = %prior.account_scope,
            environment = %prior.environment,
            "QBO tokens refreshed"
        );
        Ok(summary)
    }

    /// Summary of the pinned or most recently updated credential
    ///
    /// # Errors
    ///
    /// See [`Self::peek_scope`]
    pub async fn peek(&self) -> LifecycleResult<Option<TokenSummary>> {
        self.peek_scope(None).await
    }

    /// Summary of the credential for `scope`, `None` when nothing is stored
    ///
    /// # Errors
    ///
    /// Returns an error only if the store read fails or times out
    pub async fn peek_scope(&self, scope: Option<&str>) -> LifecycleResult<Option<TokenSummary>> {
        let record = self.read_current(scope).await?;
        Ok(record.map(|record| {
            {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                if *state == ConnectionState::Unauthenticated {
                    *state = ConnectionState::Authenticated;
                }
            }
            summarize(&record, self.clock.now())
        }))
    }
}
