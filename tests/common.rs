// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Fixed clock, in-memory stores, scripted token exchange and store wrappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `qbo_oauth_helper`

use std::collections::VecDeque;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use qbo_core::{
    Environment, LifecycleResult, StoreResult, TokenGrant, TokenLifecycleError, TokenRecord,
    TokenRecordData,
};
use qbo_oauth_helper::clock::FixedClock;
use qbo_oauth_helper::database::Database;
use qbo_oauth_helper::database_plugins::CredentialStore;
use qbo_oauth_helper::lifecycle::TokenLifecycleManager;
use qbo_oauth_helper::oauth2_client::TokenExchange;

static INIT_LOGGER: Once = Once::new();

pub const TEST_REALM: &str = "9341452311";
pub const TEST_CLIENT_ID: &str = "test-client-id";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

pub fn issue_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
}

pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(issue_time()))
}

pub async fn memory_database(clock: Arc<FixedClock>) -> Database {
    Database::new("sqlite::memory:", clock).await.unwrap()
}

pub fn grant(access: &str, refresh: &str) -> TokenGrant {
    TokenGrant {
        access_token: access.to_owned(),
        refresh_token: refresh.to_owned(),
        token_type: "bearer".to_owned(),
        expires_in: 3600,
        x_refresh_token_expires_in: Some(8_726_400),
        realm_id: None,
    }
}

pub fn record_data(scope: &str, access: &str, refresh: &str, issued_at: DateTime<Utc>) -> TokenRecordData {
    TokenRecordData::from_grant(
        scope,
        Environment::Sandbox,
        TEST_CLIENT_ID,
        &grant(access, refresh),
        issued_at,
    )
}

/// Token endpoint double answering from scripted queues
#[derive(Default)]
pub struct ScriptedExchange {
    exchange_results: Mutex<VecDeque<LifecycleResult<TokenGrant>>>,
    refresh_results: Mutex<VecDeque<LifecycleResult<TokenGrant>>>,
    pub codes_seen: Mutex<Vec<(String, String)>>,
    pub refresh_tokens_seen: Mutex<Vec<String>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_exchange(&self, result: LifecycleResult<TokenGrant>) -> &Self {
        self.exchange_results.lock().unwrap().push_back(result);
        self
    }

    pub fn on_refresh(&self, result: LifecycleResult<TokenGrant>) -> &Self {
        self.refresh_results.lock().unwrap().push_back(result);
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_tokens_seen.lock().unwrap().len()
    }
}

fn unscripted() -> LifecycleResult<TokenGrant> {
    Err(TokenLifecycleError::Transport(
        "no scripted response".to_owned(),
    ))
}

#[async_trait]
impl TokenExchange for ScriptedExchange {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> LifecycleResult<TokenGrant> {
        self.codes_seen
            .lock()
            .unwrap()
            .push((code.to_owned(), redirect_uri.to_owned()));
        self.exchange_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn refresh(&self, refresh_token: &str) -> LifecycleResult<TokenGrant> {
        self.refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_owned());
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unscripted)
    }
}

/// Store wrapper counting writes and optionally stalling every call
pub struct InstrumentedStore {
    inner: Arc<dyn CredentialStore>,
    writes: AtomicUsize,
    delay: Option<Duration>,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn stalled(inner: Arc<dyn CredentialStore>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(inner)
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn maybe_stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CredentialStore for InstrumentedStore {
    async fn upsert(&self, record: &TokenRecordData) -> StoreResult<()> {
        self.maybe_stall().await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(record).await
    }

    async fn get(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        self.maybe_stall().await;
        self.inner.get(account_scope, environment).await
    }

    async fn latest(&self, environment: Environment) -> StoreResult<Option<TokenRecord>> {
        self.maybe_stall().await;
        self.inner.latest(environment).await
    }

    fn describe(&self) -> String {
        format!("instrumented {}", self.inner.describe())
    }
}

/// Everything a lifecycle test needs
pub struct LifecycleHarness {
    pub clock: Arc<FixedClock>,
    pub exchange: Arc<ScriptedExchange>,
    pub store: Arc<InstrumentedStore>,
    pub manager: TokenLifecycleManager,
}

pub async fn lifecycle_harness() -> LifecycleHarness {
    init_test_logging();
    let clock = test_clock();
    let exchange = Arc::new(ScriptedExchange::new());
    let database: Arc<dyn CredentialStore> = Arc::new(memory_database(clock.clone()).await);
    let store = Arc::new(InstrumentedStore::new(database));
    let manager = TokenLifecycleManager::new(
        exchange.clone(),
        store.clone(),
        clock.clone(),
        Environment::Sandbox,
        TEST_CLIENT_ID,
    );

    LifecycleHarness {
        clock,
        exchange,
        store,
        manager,
    }
}
