// ABOUTME: Environment-based configuration for the OAuth client, credential store and HTTP server
// ABOUTME: Resolves store URLs from QBO_TOKEN_STORE, DATABASE_URL or the PG_* connection variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration is read from environment variables only. An optional `.env`
//! file can seed the environment first (see [`ServerConfig::from_env_with_file`]).

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use qbo_core::{ConfigError, Environment};
use tracing::{debug, warn};
use url::Url;

use crate::constants::{defaults, env_vars, intuit};
use crate::utils::env_file::load_env_file;

/// OAuth client registration passed to the token exchange client
#[derive(Clone)]
pub struct OAuthClientConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Consent page URL
    pub authorization_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Scope requested during consent
    pub scope: String,
    /// Bound for every token endpoint call
    pub timeout: Duration,
}

impl OAuthClientConfig {
    /// Client registration against the production Intuit endpoints
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: intuit::DEFAULT_REDIRECT_URI.to_owned(),
            authorization_url: intuit::AUTHORIZATION_URL.to_owned(),
            token_url: intuit::TOKEN_URL.to_owned(),
            scope: intuit::ACCOUNTING_SCOPE.to_owned(),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        }
    }

    /// Ensure the client can authenticate against the token endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the client id or secret is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: env_vars::CLIENT_ID,
            });
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: env_vars::CLIENT_SECRET,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// OAuth client registration
    pub oauth: OAuthClientConfig,
    /// Provider environment tokens are issued for
    pub environment: Environment,
    /// Account scope pinned for refresh and peek
    pub realm_id: Option<String>,
    /// Credential store URL
    pub store_url: String,
    /// Local server bind host
    pub http_host: String,
    /// Local server bind port
    pub http_port: u16,
    /// Bound for credential store calls
    pub store_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Seed the environment from an env file, then load configuration
    ///
    /// The file defaults to `QBO_ENV_FILE` or `.env` in the working directory.
    /// Variables already set in the process take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a variable is invalid
    pub fn from_env_with_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(
            || {
                env::var(env_vars::ENV_FILE)
                    .map_or_else(|_| PathBuf::from(defaults::ENV_FILE), PathBuf::from)
            },
            Path::to_path_buf,
        );
        load_env_file(&path).map_err(|e| ConfigError::Invalid {
            name: env_vars::ENV_FILE,
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_env()
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match get(env_vars::HTTP_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::Invalid {
                        name: env_vars::HTTP_TIMEOUT_SECS,
                        reason: format!("expected a positive number of seconds, got '{raw}'"),
                    })
                }
                Ok(secs) => secs,
            },
            None => defaults::TIMEOUT_SECS,
        };
        let timeout = Duration::from_secs(timeout_secs);

        let http_port = match get(env_vars::HTTP_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: env_vars::HTTP_PORT,
                reason: e.to_string(),
            })?,
            None => defaults::HTTP_PORT,
        };

        let environment = get(env_vars::QBO_ENV)
            .map_or(Ok(Environment::Sandbox), |raw| raw.parse::<Environment>())?;

        let oauth = OAuthClientConfig {
            client_id: get(env_vars::CLIENT_ID).unwrap_or_default(),
            client_secret: get(env_vars::CLIENT_SECRET).unwrap_or_default(),
            redirect_uri: get(env_vars::REDIRECT_URI)
                .unwrap_or_else(|| intuit::DEFAULT_REDIRECT_URI.to_owned()),
            authorization_url: get(env_vars::AUTH_URL)
                .unwrap_or_else(|| intuit::AUTHORIZATION_URL.to_owned()),
            token_url: get(env_vars::TOKEN_URL).unwrap_or_else(|| intuit::TOKEN_URL.to_owned()),
            scope: intuit::ACCOUNTING_SCOPE.to_owned(),
            timeout,
        };

        let store_url = resolve_store_url(&get)?;
        debug!("Credential store resolved to {}", redact_store_url(&store_url));

        Ok(Self {
            oauth,
            environment,
            realm_id: get(env_vars::PIN_REALM_ID),
            store_url,
            http_host: get(env_vars::HTTP_HOST).unwrap_or_else(|| defaults::HTTP_HOST.to_owned()),
            http_port,
            store_timeout: timeout,
        })
    }

    /// Address the local server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Home page URL opened in the browser
    #[must_use]
    pub fn home_url(&self) -> String {
        let host = if self.http_host == "0.0.0.0" {
            "localhost"
        } else {
            self.http_host.as_str()
        };
        format!("http://{host}:{}/", self.http_port)
    }
}

/// Store URL priority: `QBO_TOKEN_STORE`, `DATABASE_URL`, `PG_*`, default SQLite file
fn resolve_store_url<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(url) = get(env_vars::TOKEN_STORE) {
        return Ok(url);
    }
    if let Some(url) = get(env_vars::DATABASE_URL) {
        return Ok(url);
    }
    if let Some(host) = get(env_vars::PG_HOST) {
        return postgres_url_from_parts(
            &host,
            get(env_vars::PG_PORT).as_deref(),
            get(env_vars::PG_DATABASE).as_deref(),
            get(env_vars::PG_USER).as_deref(),
            get(env_vars::PG_PASSWORD).as_deref(),
        );
    }
    Ok(default_sqlite_url())
}

fn postgres_url_from_parts(
    host: &str,
    port: Option<&str>,
    database: Option<&str>,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<String, ConfigError> {
    let port = match port {
        Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            name: env_vars::PG_PORT,
            reason: e.to_string(),
        })?,
        None => defaults::PG_PORT,
    };

    let invalid_host = |reason: String| ConfigError::Invalid {
        name: env_vars::PG_HOST,
        reason,
    };
    let mut url = Url::parse(&format!("postgres://{host}:{port}"))
        .map_err(|e| invalid_host(e.to_string()))?;
    if let Some(user) = user {
        url.set_username(user)
            .map_err(|()| invalid_host("cannot carry a user name".to_owned()))?;
    }
    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|()| invalid_host("cannot carry a password".to_owned()))?;
    }
    if let Some(database) = database {
        url.set_path(database);
    }
    Ok(url.to_string())
}

fn default_sqlite_url() -> String {
    let path = dirs::data_dir().map_or_else(
        || {
            warn!("No platform data directory, storing tokens in the working directory");
            PathBuf::from(defaults::DATABASE_FILE)
        },
        |dir| {
            dir.join(defaults::DATA_DIR_NAME)
                .join(defaults::DATABASE_FILE)
        },
    );
    format!("sqlite:{}", path.display())
}

/// Hide any password embedded in a store URL before it is logged or printed
#[must_use]
pub fn redact_store_url(store_url: &str) -> String {
    match Url::parse(store_url) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("****")).is_err() {
                return store_url.to_owned();
            }
            url.to_string()
        }
        _ => store_url.to_owned(),
    }
}
