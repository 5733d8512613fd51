// ABOUTME: QBO OAuth token table operations for the SQLite credential store
// ABOUTME: Keyed upsert that recomputes derived expiries, plus scoped and latest-record reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use qbo_core::{Environment, StoreError, StoreResult, TokenRecord, TokenRecordData};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::Database;

const SELECT_COLUMNS: &str = r"
    SELECT realm_id, qbo_environment, access_token, refresh_token, token_type,
           expires_in, refresh_expires_in, issued_at_utc, access_token_expires_at,
           refresh_token_expires_at, client_id, created_at, updated_at
    FROM qbo_oauth_tokens
";

impl Database {
    /// Insert or replace the credential for `(account_scope, environment)`
    ///
    /// Expiry timestamps are derived from `record.issued_at` here, never
    /// carried over from the existing row. `created_at` is only set on insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn upsert_qbo_token(&self, record: &TokenRecordData) -> StoreResult<()> {
        let now = self.clock.now();

        sqlx::query(
            r"
            INSERT INTO qbo_oauth_tokens (
                realm_id, qbo_environment, access_token, refresh_token, token_type,
                expires_in, refresh_expires_in, issued_at_utc, access_token_expires_at,
                refresh_token_expires_at, client_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
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
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query {
            context: format!("Failed to upsert QBO token: {e}"),
        })?;

        debug!(
            realm_id = %record.account_scope,
            environment = %record.environment,
            "Stored QBO token"
        );
        Ok(())
    }

    /// Credential for one `(account_scope, environment)` pair
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed
    pub async fn get_qbo_token(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        let query = format!("{SELECT_COLUMNS} WHERE realm_id = $1 AND qbo_environment = $2");
        let row = sqlx::query(&query)
            .bind(account_scope)
            .bind(environment.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query {
                context: format!("Failed to get QBO token: {e}"),
            })?;

        row.as_ref().map(row_to_token_record).transpose()
    }

    /// Most recently written credential for an environment
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed
    pub async fn latest_qbo_token(
        &self,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE qbo_environment = $1 ORDER BY updated_at DESC, realm_id LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(environment.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query {
                context: format!("Failed to get latest QBO token: {e}"),
            })?;

        row.as_ref().map(row_to_token_record).transpose()
    }
}

fn decode<'r, T>(row: &'r SqliteRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn row_to_token_record(row: &SqliteRow) -> StoreResult<TokenRecord> {
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
