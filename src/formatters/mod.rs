// ABOUTME: Redacted token summaries and their JSON or plain-text rendering
// ABOUTME: Never emits a full access or refresh token on any path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Summary formatting
//!
//! [`summarize`] turns a stored [`TokenRecord`] into a [`TokenSummary`] that
//! is safe to print, log or return over HTTP: token values are reduced to a
//! head/tail display, everything else is copied as-is.
//!
//! ## Supported Formats
//!
//! - **JSON**: Default format, pretty-printed
//! - **Text**: `key: value` lines for terminals
//!
//! ```rust,no_run
//! use qbo_oauth_helper::formatters::{format_output, OutputFormat};
//!
//! let status = serde_json::json!({"realmId": "9341452311", "has_refresh": true});
//! if let Ok(output) = format_output(&status, OutputFormat::Text) {
//!     println!("{}", output.data);
//! }
//! ```

use std::{error::Error, fmt};

use chrono::{DateTime, Utc};
use qbo_core::{redact_secret, TokenRecord, TokenSummary};
use serde::Serialize;
use serde_json::Value;

/// Safe view of a stored credential as of `observed_at`
#[must_use]
pub fn summarize(record: &TokenRecord, observed_at: DateTime<Utc>) -> TokenSummary {
    TokenSummary {
        account_scope: record.account_scope.clone(),
        environment: record.environment,
        access_token: redact_secret(&record.access_token),
        refresh_token: redact_secret(&record.refresh_token),
        has_access: !record.access_token.is_empty(),
        has_refresh: !record.refresh_token.is_empty(),
        access_len: record.access_token.chars().count(),
        token_type: record.token_type.clone(),
        expires_in: record.expires_in_seconds,
        x_refresh_token_expires_in: record.refresh_expires_in_seconds,
        issued_at: record.issued_at,
        access_expires_at: record.access_expires_at,
        refresh_expires_at: record.refresh_expires_at,
        observed_at,
    }
}

/// Output serialization format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// One `key: value` line per field
    Text,
}

impl OutputFormat {
    /// Parse format from string parameter (case-insensitive)
    /// Returns `Json` for unrecognized values
    #[must_use]
    pub fn from_str_param(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "plain" => Self::Text,
            _ => Self::Json,
        }
    }

    /// Get the MIME content type for this format
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    /// Get the format name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rendered output and the format it was rendered in
#[derive(Debug, Clone)]
pub struct FormattedOutput {
    /// Rendered text
    pub data: String,
    /// The format used for serialization
    pub format: OutputFormat,
}

/// Error type for formatting operations
#[derive(Debug, Clone)]
pub struct FormatError {
    /// Error message describing what went wrong
    pub message: String,
    /// The format that was being used when the error occurred
    pub format: OutputFormat,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format error ({}): {}", self.format, self.message)
    }
}

impl Error for FormatError {}

/// Render any serializable value in the requested format
///
/// Text output lists fields in key order; nested objects
/// are flattened with dotted keys and `null` fields print as `-`.
///
/// # Errors
///
/// Returns `FormatError` if the value cannot be serialized
pub fn format_output<T: Serialize>(
    data: &T,
    format: OutputFormat,
) -> Result<FormattedOutput, FormatError> {
    let to_error = |e: serde_json::Error| FormatError {
        message: e.to_string(),
        format,
    };

    let data = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(to_error)?,
        OutputFormat::Text => {
            let value = serde_json::to_value(data).map_err(to_error)?;
            let mut lines = Vec::new();
            flatten_text("", &value, &mut lines);
            lines.join("\n")
        }
    };

    Ok(FormattedOutput { data, format })
}

fn flatten_text(prefix: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_text(&key, nested, lines);
            }
        }
        Value::Null => lines.push(format!("{prefix}: -")),
        Value::String(s) => lines.push(format!("{prefix}: {s}")),
        other => lines.push(format!("{prefix}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use qbo_core::{Environment, TokenGrant, TokenRecordData};

    fn record(access: &str, refresh: &str) -> TokenRecord {
        let issued = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let grant = TokenGrant {
            access_token: access.into(),
            refresh_token: refresh.into(),
            token_type: "bearer".into(),
            expires_in: 3600,
            x_refresh_token_expires_in: Some(8_726_400),
            realm_id: None,
        };
        TokenRecordData::from_grant("9341452311", Environment::Sandbox, "client", &grant, issued)
            .into_record(issued, issued)
    }

    #[test]
    fn test_summary_masks_tokens_and_keeps_scope() {
        let record = record("AB12CD34EF56GH78", "RT1");
        let observed = record.issued_at + Duration::minutes(5);
        let summary = summarize(&record, observed);

        assert_eq!(summary.account_scope, "9341452311");
        assert_eq!(summary.access_token, "AB12CD34...EF56GH78");
        assert_eq!(summary.refresh_token, "...");
        assert!(summary.has_access);
        assert!(summary.has_refresh);
        assert_eq!(summary.access_len, 16);
        assert_eq!(summary.expires_in, 3600);
        assert_eq!(summary.observed_at, observed);
        assert_ne!(summary.observed_at, summary.issued_at);
    }

    #[test]
    fn test_long_tokens_never_appear_in_rendered_output() {
        let access = "eyJlbmMiOiJBMTI4Q0JDLUhTMjU2IiwiYWxnIjoiZGlyIn0..Zx9Qk";
        let refresh = "AB11735409011dP7oVv4ZPcDlK2x6sfXMqD9xJ5lGYz";
        let summary = summarize(&record(access, refresh), Utc::now());

        for format in [OutputFormat::Json, OutputFormat::Text] {
            let output = format_output(&summary, format).unwrap();
            assert!(!output.data.contains(access));
            assert!(!output.data.contains(refresh));
        }
    }

    #[test]
    fn test_missing_refresh_token_is_flagged() {
        let summary = summarize(&record("AB12CD34EF56GH78", ""), Utc::now());
        assert_eq!(summary.refresh_token, "");
        assert!(!summary.has_refresh);
    }

    #[test]
    fn test_text_rendering_flattens_fields() {
        let value = serde_json::json!({
            "message": "ok",
            "summary": {"realmId": "42", "x_refresh_token_expires_in": null}
        });
        let output = format_output(&value, OutputFormat::Text).unwrap();
        assert!(output.data.contains("message: ok"));
        assert!(output.data.contains("summary.realmId: 42"));
        assert!(output.data.contains("summary.x_refresh_token_expires_in: -"));
    }

    #[test]
    fn test_format_param_parsing() {
        assert_eq!(OutputFormat::from_str_param("TEXT"), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str_param("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_param("yaml"), OutputFormat::Json);
    }
}
