// ABOUTME: Parsing and in-place patching of dotenv-style KEY=value files
// ABOUTME: Replaces existing keys without disturbing unrelated lines and appends new ones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::Path;

use regex::{NoExpand, Regex};
use tracing::debug;

/// Parse `KEY=value` lines into a map
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is accepted
/// and matching single or double quotes around a value are removed.
#[must_use]
pub fn parse_env_text(text: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_owned(), unquote(value.trim()).to_owned());
    }
    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Set or replace `entries` in env file `text`, keeping every other line intact
///
/// # Errors
///
/// Returns an error if a key pattern cannot be compiled
pub fn patch_env_text(text: &str, entries: &[(&str, String)]) -> Result<String, regex::Error> {
    let mut patched = text.to_owned();
    for (key, value) in entries {
        let pattern = Regex::new(&format!(r"(?m)^{}=.*$", regex::escape(key)))?;
        let line = format!("{key}={value}");
        if pattern.is_match(&patched) {
            patched = pattern
                .replace_all(&patched, NoExpand(&line))
                .into_owned();
        } else {
            if !patched.is_empty() && !patched.ends_with('\n') {
                patched.push('\n');
            }
            patched.push_str(&line);
            patched.push('\n');
        }
    }
    Ok(patched)
}

/// Export the variables of an env file into the process environment
///
/// Variables that are already set win over the file. A missing file is not
/// an error and loads nothing.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read
pub fn load_env_file(path: &Path) -> io::Result<usize> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut loaded = 0;
    for (key, value) in parse_env_text(&text) {
        if env::var_os(&key).is_none() {
            env::set_var(&key, value);
            loaded += 1;
        }
    }
    debug!("Loaded {} variables from {}", loaded, path.display());
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_strips_quotes() {
        let text = "# comment\nINTUIT_CLIENT_ID=abc\nexport QBO_ENV=\"production\"\n\nBROKEN\nEMPTY=\n";
        let values = parse_env_text(text);
        assert_eq!(values.get("INTUIT_CLIENT_ID").map(String::as_str), Some("abc"));
        assert_eq!(values.get("QBO_ENV").map(String::as_str), Some("production"));
        assert_eq!(values.get("EMPTY").map(String::as_str), Some(""));
        assert!(!values.contains_key("BROKEN"));
    }

    #[test]
    fn test_patch_replaces_in_place_and_appends() {
        let text = "INTUIT_CLIENT_ID=abc\nQBO_ACCESS_TOKEN=old\nOTHER=keep";
        let patched = patch_env_text(
            text,
            &[
                ("QBO_ACCESS_TOKEN", "new".to_owned()),
                ("QBO_REFRESH_TOKEN", "rt".to_owned()),
            ],
        )
        .unwrap();
        assert_eq!(
            patched,
            "INTUIT_CLIENT_ID=abc\nQBO_ACCESS_TOKEN=new\nOTHER=keep\nQBO_REFRESH_TOKEN=rt\n"
        );
    }

    #[test]
    fn test_patch_does_not_expand_dollar_signs() {
        let patched = patch_env_text("TOKEN=a\n", &[("TOKEN", "x$1y${0}".to_owned())]).unwrap();
        assert_eq!(patched, "TOKEN=x$1y${0}\n");
    }

    #[test]
    fn test_patch_does_not_touch_prefixed_keys() {
        let patched =
            patch_env_text("MY_QBO_REALM_ID=1\nQBO_REALM_ID=2\n", &[("QBO_REALM_ID", "3".to_owned())])
                .unwrap();
        assert_eq!(patched, "MY_QBO_REALM_ID=1\nQBO_REALM_ID=3\n");
    }
}
