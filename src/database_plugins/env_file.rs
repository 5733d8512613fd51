// ABOUTME: Credential store backed by a dotenv-style file patched in place
// ABOUTME: Holds a single connection slot, written atomically with owner-only permissions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `.env` file credential store.
//!
//! The file keeps whatever else it contains (client id, redirect URI, ...);
//! only the `QBO_*` token keys are rewritten. One file holds one connection:
//! writing a record for a different realm or environment replaces the
//! previous one.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qbo_core::models::{DEFAULT_EXPIRES_IN_SECS, DEFAULT_TOKEN_TYPE};
use qbo_core::{
    check_lifetime, Environment, StoreError, StoreResult, TokenRecord, TokenRecordData,
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::CredentialStore;
use crate::clock::SharedClock;
use crate::constants::env_file_keys as keys;
use crate::utils::env_file::{parse_env_text, patch_env_text};

/// Env file credential store
pub struct EnvFileCredentialStore {
    path: PathBuf,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

impl EnvFileCredentialStore {
    /// Store backed by the file at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: SharedClock) -> Self {
        Self {
            path: path.into(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn read_text(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn read_record(&self) -> StoreResult<Option<TokenRecord>> {
        let Some(text) = self.read_text().await? else {
            return Ok(None);
        };
        let values = parse_env_text(&text);
        if non_empty(&values, keys::ACCESS_TOKEN).is_none()
            || non_empty(&values, keys::REALM_ID).is_none()
        {
            return Ok(None);
        }

        // Files written by hand carry no timestamps; fall back to the file's mtime
        let modified = match fs::metadata(&self.path).await.and_then(|m| m.modified()) {
            Ok(at) => DateTime::<Utc>::from(at),
            Err(_) => self.clock.now(),
        };
        record_from_values(&values, modified).map(Some)
    }

    /// Replace the file contents via a sibling temp file and rename
    async fn write_atomically(&self, contents: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let file_name = self
            .path
            .file_name()
            .map_or_else(|| ".env".into(), |n| n.to_string_lossy().into_owned());
        let tmp_path = self
            .path
            .with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path).await.map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.io_error(e));
        }
        Ok(())
    }
}

fn non_empty<'a>(values: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn parse_field<T: std::str::FromStr>(
    values: &HashMap<String, String>,
    key: &str,
) -> StoreResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    non_empty(values, key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| StoreError::Decode(format!("{key}: {e}")))
        })
        .transpose()
}

fn parse_lifetime(values: &HashMap<String, String>, key: &str) -> StoreResult<Option<i64>> {
    parse_field::<i64>(values, key)?
        .map(|secs| check_lifetime(key, secs).map_err(StoreError::Decode))
        .transpose()
}

fn record_from_values(
    values: &HashMap<String, String>,
    fallback_time: DateTime<Utc>,
) -> StoreResult<TokenRecord> {
    let environment = non_empty(values, keys::ENVIRONMENT)
        .map_or(Ok(Environment::default()), str::parse::<Environment>)
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    let issued_at = parse_field::<DateTime<Utc>>(values, keys::ISSUED_AT)?.unwrap_or(fallback_time);
    let data = TokenRecordData {
        account_scope: non_empty(values, keys::REALM_ID)
            .unwrap_or_default()
            .to_owned(),
        environment,
        access_token: non_empty(values, keys::ACCESS_TOKEN)
            .unwrap_or_default()
            .to_owned(),
        refresh_token: values
            .get(keys::REFRESH_TOKEN)
            .cloned()
            .unwrap_or_default(),
        token_type: non_empty(values, keys::TOKEN_TYPE)
            .unwrap_or(DEFAULT_TOKEN_TYPE)
            .to_owned(),
        expires_in_seconds: parse_lifetime(values, keys::EXPIRES_IN)?
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        refresh_expires_in_seconds: parse_lifetime(values, keys::REFRESH_EXPIRES_IN)?,
        issued_at,
        client_id: values.get(keys::CLIENT_ID).cloned().unwrap_or_default(),
    };

    let created_at = parse_field(values, keys::CREATED_AT)?.unwrap_or(issued_at);
    let updated_at = parse_field(values, keys::UPDATED_AT)?.unwrap_or(issued_at);
    Ok(data.into_record(created_at, updated_at))
}

fn entries_for(
    record: &TokenRecordData,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let optional_secs = |v: Option<i64>| v.map(|s| s.to_string()).unwrap_or_default();
    vec![
        (keys::ACCESS_TOKEN, record.access_token.clone()),
        (keys::REFRESH_TOKEN, record.refresh_token.clone()),
        (keys::REALM_ID, record.account_scope.clone()),
        (keys::ENVIRONMENT, record.environment.as_str().to_owned()),
        (keys::TOKEN_TYPE, record.token_type.clone()),
        (keys::EXPIRES_IN, record.expires_in_seconds.to_string()),
        (
            keys::REFRESH_EXPIRES_IN,
            optional_secs(record.refresh_expires_in_seconds),
        ),
        (keys::ISSUED_AT, record.issued_at.to_rfc3339()),
        (keys::CLIENT_ID, record.client_id.clone()),
        (keys::CREATED_AT, created_at.to_rfc3339()),
        (keys::UPDATED_AT, updated_at.to_rfc3339()),
    ]
}

#[async_trait]
impl CredentialStore for EnvFileCredentialStore {
    async fn upsert(&self, record: &TokenRecordData) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let text = self.read_text().await?.unwrap_or_default();
        let values = parse_env_text(&text);

        let stored_environment = non_empty(&values, keys::ENVIRONMENT)
            .map_or(Environment::default(), |e| e.parse().unwrap_or_default());
        let same_key = non_empty(&values, keys::REALM_ID) == Some(record.account_scope.as_str())
            && stored_environment == record.environment;
        let created_at = if same_key {
            parse_field(&values, keys::CREATED_AT)?.unwrap_or(now)
        } else {
            now
        };

        let patched = patch_env_text(&text, &entries_for(record, created_at, now)).map_err(|e| {
            StoreError::Query {
                context: format!("Failed to patch env file: {e}"),
            }
        })?;
        self.write_atomically(&patched).await?;

        debug!(
            realm_id = %record.account_scope,
            environment = %record.environment,
            path = %self.path.display(),
            "Stored QBO token in env file"
        );
        Ok(())
    }

    async fn get(
        &self,
        account_scope: &str,
        environment: Environment,
    ) -> StoreResult<Option<TokenRecord>> {
        Ok(self.read_record().await?.filter(|record| {
            record.account_scope == account_scope && record.environment == environment
        }))
    }

    async fn latest(&self, environment: Environment) -> StoreResult<Option<TokenRecord>> {
        Ok(self
            .read_record()
            .await?
            .filter(|record| record.environment == environment))
    }

    fn describe(&self) -> String {
        format!("env file ({})", self.path.display())
    }
}
