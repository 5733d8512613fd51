// ABOUTME: Utility module organization for shared helpers
// ABOUTME: Hosts env-file parsing and in-place patching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// `.env` file parsing, patching and loading
pub mod env_file;
