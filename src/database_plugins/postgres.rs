// ABOUTME: PostgreSQL credential store writing the config.qbo_oauth_tokens table
// ABOUTME: Same keyed upsert as the SQLite store with the schema created on connect
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! `PostgreSQL` credential store
//!
//! Intended for shared finance databases where other jobs read the current
//! QBO access token straight from `config.qbo_oauth_tokens`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qbo_core::{Environment, StoreError, StoreResult, TokenRecord, TokenRecordData};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use super::CredentialStore;
use crate::clock::SharedClock;
use crate::config::environment::redact_store_url;

const SCHEMA_STATEMENTS: [&str; 2] = [
    "CREATE SCHEMA IF NOT EXISTS config",
    r"
    CREATE TABLE IF NOT EXISTS config.qbo_oauth_tokens (
        realm_id                 TEXT        NOT NULL,
        qbo_environment          TEXT        NOT NULL,
        access_token             TEXT        NOT NULL,
        refresh_token            TEXT        NOT NULL,
        token_type               TEXT        NOT NULL DEFAULT 'bearer',
        expires_in               BIGINT      NOT NULL,
        refresh_expires_in       BIGINT,
        issued_at_utc            TIMESTAMPTZ NOT NULL,
        access_token_expires_at  TIMESTAMPTZ NOT NULL,
        refresh_token_expires_at TIMESTAMPTZ,
        client_id                TEXT        NOT NULL,
        created_at               TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at               TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (realm_id, qbo_environment)
    )
    ",
];

const SELECT_COLUMNS: &str = r"
    SELECT realm_id, qbo_environment, access_token, refresh_token, token_type,
           expires_in, refresh_expires_in, issued_at_utc, access_token_expires_at,
           refresh_token_expires_at, client_id, created_at, updated_at
    FROM config.qbo_oauth_tokens
";

/// `PostgreSQL` credential store
#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: Pool<Postgres>,
    clock: SharedClock,
    description: String,
}

impl PostgresCredentialStore {
    /// Connect and create the schema if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails
    pub async fn new(database_url: &str, clock: SharedClock) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self {
            pool,
            clock,
            description: format!("PostgreSQL ({})", redact_store_url(database_url)),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Migration(e.to_string()))?;
        }
        info!("PostgreSQL credential schema ready");
        Ok(())
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        binds: &[&str],
    ) -> StoreResult<Option<TokenRecord>> {
        let query = format!("{SELECT_COLUMNS} {clause}");
        let mut q = sqlx::query(&query);
        for value in binds {
            q = q.bind(*value);
        }
        let row = q
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query {
                context: format!("Failed to read QBO token: {e}"),
            })?;
        row.as_ref().map(row_to_token_record).transpose()
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn upsert(&self, record: &TokenRecordData) -> StoreResult<()> {
        let now = self.clock.now();

        sqlx::query(
            r"
            INSERT INTO config.qbo_oauth_tokens (
                realm_id, qbo_environment, access_token, refresh_token, token_type,
                expires_in, refresh_expires_in, issued_at_utc, access_token_expires_at,
                refresh_token_expires_at, client_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            ON CONFLICT (realm_id, qbo_environment)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_type = EXCLUDED.token_type,
                expires_in = EXCLUDED.expires_in,
                refresh_expires_in = EXCLUDED.refresh_expires_in,
                issued_at_utc = EXCLUDED.issued_at_utc,
                access_token_expires_at = EXCLUDED.access_token_expires_at,
                refresh_token_expires_at = EXCLUDED.refresh_token_expires_at,
                client_id = EXCLUDED.client_id,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&record.account_scope)
        .bind(record.environment.as_str())
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(&record.token_type)
        .bind(record.expires_in_seconds)
        .bind(record.refresh_expires_in_seconds)
        .bind(record.issued_at)
        .bind(record.access_expires_at())
        .bind(record.refresh_expires_at())
        .bind(&record.client_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query {
            context: format!("Failed to upsert QBO token: {e}"),
        })?;

        debug!(realm_id = %record.account_scope, environment = %record.environment, "Stored QBO token");
        Ok(())
    }

    async fn get(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        self.fetch_one_where(
            "WHERE realm_id = $1 AND qbo_environment = $2",
            &[account_scope, environment.as_str()],
        )
        .await
    }

    async fn latest(&self, environment: Environment) -> StoreResult<Option<TokenRecord>> {
        self.fetch_one_where(
            "WHERE qbo_environment = $1 ORDER BY updated_at DESC, realm_id LIMIT 1",
            &[environment.as_str()],
        )
        .await
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

fn decode<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn row_to_token_record(row: &PgRow) -> StoreResult<TokenRecord> {
    let environment: String = decode(row, "qbo_environment")?;
    let environment = environment
        .parse::<Environment>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    Ok(TokenRecord {
        account_scope: decode(row, "realm_id")?,
        environment,
        access_token: decode(row, "access_token")?,
        refresh_token: decode(row, "refresh_token")?,
        token_type: decode(row, "token_type")?,
        expires_in_seconds: decode(row, "expires_in")?,
        refresh_expires_in_seconds: decode(row, "refresh_expires_in")?,
        issued_at: decode::<DateTime<Utc>>(row, "issued_at_utc")?,
        access_expires_at: decode::<DateTime<Utc>>(row, "access_token_expires_at")?,
        refresh_expires_at: decode::<Option<DateTime<Utc>>>(row, "refresh_token_expires_at")?,
        client_id: decode(row, "client_id")?,
        created_at: decode::<DateTime<Utc>>(row, "created_at")?,
        updated_at: decode::<DateTime<Utc>>(row, "updated_at")?,
    })
}
