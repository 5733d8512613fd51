// ABOUTME: Provider endpoints, scopes, environment variable names and operational defaults
// ABOUTME: Single source for values shared by configuration, the exchange client and routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Intuit OAuth 2.0 endpoints and scopes
pub mod intuit {
    /// Consent page the user-agent is redirected to
    pub const AUTHORIZATION_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
    /// Token endpoint for both grants
    pub const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
    /// Accounting API scope requested during consent
    pub const ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";
    /// Redirect URI used when none is configured
    pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/callback";
}

/// Environment variable names
pub mod env_vars {
    /// OAuth client id
    pub const CLIENT_ID: &str = "INTUIT_CLIENT_ID";
    /// OAuth client secret
    pub const CLIENT_SECRET: &str = "INTUIT_CLIENT_SECRET";
    /// Redirect URI registered with the provider
    pub const REDIRECT_URI: &str = "INTUIT_REDIRECT_URI";
    /// `sandbox` or `production`
    pub const QBO_ENV: &str = "QBO_ENV";
    /// Pinned account scope used by refresh and peek
    ///
    /// Distinct from the env-file store's `QBO_REALM_ID` key so a stored
    /// credential never turns into a pin when the file is loaded at startup.
    pub const PIN_REALM_ID: &str = "QBO_PIN_REALM_ID";
    /// Credential store URL (`sqlite:...`, `postgres://...`, `env-file:...`)
    pub const TOKEN_STORE: &str = "QBO_TOKEN_STORE";
    /// Fallback database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// PostgreSQL host used to assemble a store URL
    pub const PG_HOST: &str = "PG_HOST";
    /// PostgreSQL port
    pub const PG_PORT: &str = "PG_PORT";
    /// PostgreSQL database name
    pub const PG_DATABASE: &str = "PG_DATABASE";
    /// PostgreSQL user
    pub const PG_USER: &str = "PG_USER";
    /// PostgreSQL password
    pub const PG_PASSWORD: &str = "PG_PASSWORD";
    /// Consent page override
    pub const AUTH_URL: &str = "QBO_AUTH_URL";
    /// Token endpoint override
    pub const TOKEN_URL: &str = "QBO_TOKEN_URL";
    /// Bound for token endpoint and store calls, in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "QBO_HTTP_TIMEOUT_SECS";
    /// Local server bind host
    pub const HTTP_HOST: &str = "HTTP_HOST";
    /// Local server bind port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Env file loaded at startup
    pub const ENV_FILE: &str = "QBO_ENV_FILE";
    /// Log output format (`pretty`, `compact`, `json`)
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Keys written by the env-file credential store
pub mod env_file_keys {
    /// Access token
    pub const ACCESS_TOKEN: &str = "QBO_ACCESS_TOKEN";
    /// Refresh token
    pub const REFRESH_TOKEN: &str = "QBO_REFRESH_TOKEN";
    /// Account scope
    pub const REALM_ID: &str = "QBO_REALM_ID";
    /// Environment of the stored token
    pub const ENVIRONMENT: &str = "QBO_TOKEN_ENVIRONMENT";
    /// Token type
    pub const TOKEN_TYPE: &str = "QBO_TOKEN_TYPE";
    /// Access token lifetime
    pub const EXPIRES_IN: &str = "QBO_TOKEN_EXPIRES_IN";
    /// Refresh token lifetime
    pub const REFRESH_EXPIRES_IN: &str = "QBO_REFRESH_TOKEN_EXPIRES_IN";
    /// Issue time (RFC 3339)
    pub const ISSUED_AT: &str = "QBO_TOKEN_ISSUED_AT";
    /// Client that obtained the token
    pub const CLIENT_ID: &str = "QBO_TOKEN_CLIENT_ID";
    /// First write time (RFC 3339)
    pub const CREATED_AT: &str = "QBO_TOKEN_CREATED_AT";
    /// Last write time (RFC 3339)
    pub const UPDATED_AT: &str = "QBO_TOKEN_UPDATED_AT";
}

/// Operational defaults
pub mod defaults {
    /// Bound for token endpoint and store calls
    pub const TIMEOUT_SECS: u64 = 30;
    /// Local server bind host
    pub const HTTP_HOST: &str = "127.0.0.1";
    /// Local server bind port
    pub const HTTP_PORT: u16 = 5000;
    /// PostgreSQL port when `PG_PORT` is unset
    pub const PG_PORT: u16 = 5432;
    /// How long an issued authorization `state` stays valid
    pub const AUTHORIZATION_STATE_TTL_SECS: i64 = 600;
    /// Env file loaded at startup
    pub const ENV_FILE: &str = ".env";
    /// Directory under the platform data dir holding the default database
    pub const DATA_DIR_NAME: &str = "qbo-oauth-helper";
    /// Default SQLite database file name
    pub const DATABASE_FILE: &str = "tokens.db";
}

/// Service identity
pub mod service {
    /// Name reported by health checks and logs
    pub const NAME: &str = "qbo-oauth-helper";
    /// Crate version
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
