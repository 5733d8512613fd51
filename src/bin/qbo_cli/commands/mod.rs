// ABOUTME: Subcommand implementations for qbo-cli
// ABOUTME: Token operations and configuration display
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod config;
pub mod tokens;

use anyhow::{Context, Result};
use qbo_oauth_helper::formatters::{format_output, OutputFormat};
use serde::Serialize;

/// Print `value` to stdout in the selected format
pub fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let output = format_output(value, format).context("Failed to render output")?;
    println!("{}", output.data);
    Ok(())
}
