// ABOUTME: Registry of outstanding consent `state` values for CSRF protection on the callback
// ABOUTME: Values are single use and expire after a fixed window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::constants::defaults;

/// Outstanding consent requests keyed by their `state` value
pub struct PendingAuthorizations {
    issued: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
    clock: SharedClock,
}

impl PendingAuthorizations {
    /// Registry using the default ten minute window
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self::with_ttl(
            clock,
            Duration::seconds(defaults::AUTHORIZATION_STATE_TTL_SECS),
        )
    }

    /// Registry with a custom expiry window
    #[must_use]
    pub fn with_ttl(clock: SharedClock, ttl: Duration) -> Self {
        Self {
            issued: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Generate and remember a fresh `state` value
    #[must_use]
    pub fn issue(&self) -> String {
        let now = self.clock.now();
        self.purge_expired(now);

        let state = Uuid::new_v4().simple().to_string();
        self.issued.insert(state.clone(), now);
        state
    }

    /// Accept a `state` value once; unknown or expired values are rejected
    pub fn consume(&self, state: &str) -> bool {
        let now = self.clock.now();
        match self.issued.remove(state) {
            Some((_, issued_at)) if now - issued_at <= self.ttl => true,
            Some(_) => {
                debug!("Consent state expired");
                false
            }
            None => false,
        }
    }

    /// Number of outstanding values
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// Whether nothing is outstanding
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.issued.retain(|_, issued_at| now - *issued_at <= ttl);
    }
}
