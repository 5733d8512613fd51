// ABOUTME: Configuration loading tests against the real process environment
// ABOUTME: Serialized with serial_test because they mutate environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::env;
use std::fs;
use std::time::Duration;

use common::init_test_logging;
use qbo_core::{ConfigError, Environment};
use qbo_oauth_helper::config::ServerConfig;
use qbo_oauth_helper::constants::env_vars;
use serial_test::serial;
use tempfile::TempDir;

const TOUCHED: &[&str] = &[
    env_vars::CLIENT_ID,
    env_vars::CLIENT_SECRET,
    env_vars::REDIRECT_URI,
    env_vars::QBO_ENV,
    env_vars::PIN_REALM_ID,
    env_vars::TOKEN_STORE,
    env_vars::DATABASE_URL,
    env_vars::PG_HOST,
    env_vars::PG_PORT,
    env_vars::PG_DATABASE,
    env_vars::PG_USER,
    env_vars::PG_PASSWORD,
    env_vars::AUTH_URL,
    env_vars::TOKEN_URL,
    env_vars::HTTP_TIMEOUT_SECS,
    env_vars::HTTP_HOST,
    env_vars::HTTP_PORT,
    env_vars::ENV_FILE,
];

fn clear_env() {
    for name in TOUCHED {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_env_file_seeds_unset_variables_only() {
    init_test_logging();
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    fs::write(
        &path,
        "INTUIT_CLIENT_ID=file-client\n\
         INTUIT_CLIENT_SECRET=file-secret\n\
         QBO_ENV=sandbox\n\
         QBO_PIN_REALM_ID=9341452311\n\
         QBO_TOKEN_STORE=sqlite::memory:\n",
    )
    .unwrap();
    env::set_var(env_vars::QBO_ENV, "production");

    let config = ServerConfig::from_env_with_file(Some(&path)).unwrap();

    assert_eq!(config.oauth.client_id, "file-client");
    assert_eq!(config.oauth.client_secret, "file-secret");
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.realm_id.as_deref(), Some("9341452311"));
    assert_eq!(config.store_url, "sqlite::memory:");
    clear_env();
}

#[test]
#[serial]
fn test_missing_env_file_is_not_an_error() {
    init_test_logging();
    clear_env();
    let dir = TempDir::new().unwrap();

    let config = ServerConfig::from_env_with_file(Some(&dir.path().join("absent.env"))).unwrap();

    assert_eq!(config.environment, Environment::Sandbox);
    assert_eq!(config.bind_address(), "127.0.0.1:5000");
    assert_eq!(config.oauth.timeout, Duration::from_secs(30));
    assert!(config.store_url.starts_with("sqlite:"));
    assert!(config.oauth.validate().is_err());
}

#[test]
#[serial]
fn test_env_file_location_comes_from_variable() {
    init_test_logging();
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("helper.env");
    fs::write(&path, "HTTP_PORT=5055\nHTTP_HOST=0.0.0.0\n").unwrap();
    env::set_var(env_vars::ENV_FILE, &path);

    let config = ServerConfig::from_env_with_file(None).unwrap();

    assert_eq!(config.http_port, 5055);
    assert_eq!(config.home_url(), "http://localhost:5055/");
    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_are_reported_by_name() {
    init_test_logging();
    clear_env();
    env::set_var(env_vars::HTTP_TIMEOUT_SECS, "0");

    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "QBO_HTTP_TIMEOUT_SECS",
            ..
        }
    ));

    env::set_var(env_vars::HTTP_TIMEOUT_SECS, "10");
    env::set_var(env_vars::QBO_ENV, "staging");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("QBO_ENV"));
    clear_env();
}
