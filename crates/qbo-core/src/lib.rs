// ABOUTME: Core library for the QBO OAuth helper with token models and error taxonomy
// ABOUTME: Shared by the credential stores, the exchange client and the lifecycle orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # QBO Core
//!
//! Types shared across the QBO OAuth helper:
//!
//! - [`models`]: environments, token grants, stored token records and summaries
//! - [`errors`]: lifecycle, store and configuration error types
//! - [`redaction`]: head/tail masking of secret token material

/// Error taxonomy for token lifecycle, storage and configuration failures
pub mod errors;

/// Token grant, record and summary models
pub mod models;

/// Masking helpers that keep secret token material out of output
pub mod redaction;

pub use errors::{
    ConfigError, LifecycleResult, StoreError, StoreResult, TokenLifecycleError,
};
pub use models::{
    check_lifetime, Environment, TokenGrant, TokenRecord, TokenRecordData, TokenSummary,
    DEFAULT_EXPIRES_IN_SECS, MAX_TOKEN_LIFETIME_SECS,
};
pub use redaction::redact_secret;
