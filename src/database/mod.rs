// ABOUTME: SQLite-backed credential store with embedded schema migrations
// ABOUTME: Owns the connection pool and the injected clock used for store-managed timestamps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// QBO OAuth token table operations
pub mod qbo_oauth_tokens;

use std::str::FromStr;

use async_trait::async_trait;
use qbo_core::{Environment, StoreError, StoreResult, TokenRecord, TokenRecordData};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::clock::SharedClock;
use crate::database_plugins::CredentialStore;

/// `SQLite` database holding the `qbo_oauth_tokens` table
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    clock: SharedClock,
    url: String,
}

impl Database {
    /// Open (creating if needed) the database at `database_url` and run migrations
    ///
    /// In-memory URLs get a single long-lived connection so every statement
    /// sees the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL is invalid or malformed
    /// - Database connection fails
    /// - Migration process fails
    pub async fn new(database_url: &str, clock: SharedClock) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true);

        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let db = Self {
            pool,
            clock,
            url: database_url.to_owned(),
        };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run all embedded migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails
    pub async fn migrate(&self) -> StoreResult<()> {
        debug!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[async_trait]
impl CredentialStore for Database {
    async fn upsert(&self, record: &TokenRecordData) -> StoreResult<()> {
        self.upsert_qbo_token(record).await
    }

    async fn get(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        self.get_qbo_token(account_scope, environment).await
    }

    async fn latest(&self, environment: Environment) -> StoreResult<Option<TokenRecord>> {
        self.latest_qbo_token(environment).await
    }

    fn describe(&self) -> String {
        format!("SQLite ({})", self.url)
    }
}
