// ABOUTME: Head/tail masking for OAuth access and refresh tokens
// ABOUTME: Produces display strings that never carry a long token as a contiguous substring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Number of characters kept from each end of a secret
pub const REDACTION_EDGE_CHARS: usize = 8;

/// Marker placed between the kept head and tail
pub const REDACTION_MARKER: &str = "...";

/// Mask a secret token for display
///
/// Keeps the first 8 characters, then the marker, then the last 8 characters
/// that were not already shown. A 16 character token renders as
/// `AB12CD34...EF56GH78`, a 12 character token keeps its last 4 characters.
/// Secrets no longer than the head are replaced by the marker alone, and an
/// empty secret renders as an empty string.
#[must_use]
pub fn redact_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }

    let total = secret.chars().count();
    if total <= REDACTION_EDGE_CHARS {
        return REDACTION_MARKER.to_owned();
    }

    let tail_len = (total - REDACTION_EDGE_CHARS).min(REDACTION_EDGE_CHARS);
    let head: String = secret.chars().take(REDACTION_EDGE_CHARS).collect();
    let tail: String = secret.chars().skip(total - tail_len).collect();

    format!("{head}{REDACTION_MARKER}{tail}")
}
