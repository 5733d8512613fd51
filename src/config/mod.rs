// ABOUTME: Configuration module organization for the QBO OAuth helper
// ABOUTME: Environment-driven settings for the OAuth client, credential store and local server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable based configuration
pub mod environment;

pub use environment::{OAuthClientConfig, ServerConfig};
