//! Response status classification
//!
//! Every HTTP response is sorted into one of four classes before its body is
//! looked at. The checks run in a fixed priority order:
//!
//! 1. status in the tolerated set → [`ResponseClass::Tolerated`]
//! 2. status in the extra-retry set, or `500..=MAX_KNOWN_STATUS` → [`ResponseClass::Retriable`]
//! 3. status in `400..500` → [`ResponseClass::Fatal`]
//! 4. anything else → [`ResponseClass::Success`]

use std::collections::BTreeSet;

/// Highest status code with a registered meaning (511 Network Authentication Required)
pub const MAX_KNOWN_STATUS: u16 = 511;

/// Outcome class of a single HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Parse the body for records
    Success,
    /// Expected absence; treat as an empty result and stop fetching
    Tolerated,
    /// Transient; re-send the identical request after backoff
    Retriable,
    /// Abort the run
    Fatal,
}

/// Per-stream status classification rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePolicy {
    tolerated: BTreeSet<u16>,
    extra_retry: BTreeSet<u16>,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            tolerated: BTreeSet::new(),
            extra_retry: BTreeSet::from([429]),
        }
    }
}

impl ResponsePolicy {
    /// Create a policy with no tolerated statuses and 429 as the only extra retry
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat these statuses as "no data"
    #[must_use]
    pub fn tolerate(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.tolerated.extend(statuses);
        self
    }

    /// Retry these statuses in addition to the 5xx range
    #[must_use]
    pub fn retry_on(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.extra_retry.extend(statuses);
        self
    }

    /// Statuses treated as "no data"
    pub fn tolerated(&self) -> &BTreeSet<u16> {
        &self.tolerated
    }

    /// Check if a status is tolerated
    pub fn is_tolerated(&self, status: u16) -> bool {
        self.tolerated.contains(&status)
    }

    /// Classify a response status
    pub fn classify(&self, status: u16) -> ResponseClass {
        if self.tolerated.contains(&status) {
            ResponseClass::Tolerated
        } else if self.extra_retry.contains(&status) || (500..=MAX_KNOWN_STATUS).contains(&status)
        {
            ResponseClass::Retriable
        } else if (400..500).contains(&status) {
            ResponseClass::Fatal
        } else {
            ResponseClass::Success
        }
    }
}
