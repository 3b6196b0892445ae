//! Trace policy configuration
//!
//! This module defines the policy flags that decide how strict a trace is
//! about ordering and duplicate firings, and the formatting options used by
//! reports.

use crate::types::{Result, TraceError};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

/// Policy flags for a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Whether items must fire in the order they are listed
    #[serde(default = "default_true")]
    pub enforce_order: bool,

    /// Whether extra firings of an already matched item are tolerated
    #[serde(default)]
    pub allow_duplicates: bool,

    /// Whether a failing trace should stop the process immediately
    #[serde(default)]
    pub assert_on_failure: bool,
}

fn default_true() -> bool {
    true
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S%.3f".to_string()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enforce_order: true,
            allow_duplicates: false,
            assert_on_failure: false,
        }
    }
}

impl TraceConfig {
    /// Create a new trace configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable order enforcement
    pub fn with_enforce_order(mut self, enabled: bool) -> Self {
        self.enforce_order = enabled;
        self
    }

    /// Builder method: tolerate or reject duplicate firings
    pub fn with_allow_duplicates(mut self, enabled: bool) -> Self {
        self.allow_duplicates = enabled;
        self
    }

    /// Builder method: stop the process as soon as the trace fails
    pub fn with_assert_on_failure(mut self, enabled: bool) -> Self {
        self.assert_on_failure = enabled;
        self
    }
}

/// Formatting options passed to reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFormat {
    /// `chrono` format string used for every timestamp in a report
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl ReportFormat {
    /// Builder method: use a custom timestamp format
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Reject format strings `chrono` cannot render
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(TraceError::ReportError(format!(
                "invalid timestamp format: {:?}",
                self.timestamp_format
            )));
        }
        Ok(())
    }

    /// Render a timestamp with the configured format
    pub fn format_timestamp(&self, timestamp: &crate::types::Timestamp) -> String {
        timestamp.format(&self.timestamp_format).to_string()
    }
}
