// ABOUTME: Credential store abstraction with SQLite, PostgreSQL and env-file backends
// ABOUTME: One token record per (account scope, environment), written with upsert semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use qbo_core::{Environment, StoreResult, TokenRecord, TokenRecordData};

/// `.env` file backend
pub mod env_file;
/// Store selection from a configured URL
pub mod factory;

/// PostgreSQL credential store
#[cfg(feature = "postgresql")]
pub mod postgres;

/// Durable storage for OAuth credentials
///
/// Implementations must derive `access_expires_at` and `refresh_expires_at`
/// from the record being written and must keep `created_at` stable across
/// updates of the same key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create or fully replace the record for `(account_scope, environment)`
    async fn upsert(&self, record: &TokenRecordData) -> StoreResult<()>;

    /// Record for one key, `None` when nothing is stored
    async fn get(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>>;

    /// Most recently updated record for an environment
    async fn latest(&self, environment: Environment) -> StoreResult<Option<TokenRecord>>;

    /// Human-readable backend description, free of credentials
    fn describe(&self) -> String;
}
