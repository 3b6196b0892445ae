//! Trace definitions
//!
//! A [`Trace`] names an expected sequence of items together with the policy
//! used to check it. It is plain data; the matching itself happens in
//! [`TraceResult`](crate::TraceResult).

use crate::config::TraceConfig;
use crate::item::TraceItem;
use crate::types::{Result, TraceError};

/// A named, ordered list of items expected to fire during a session
#[derive(Debug, Clone)]
pub struct Trace {
    /// Name used in logs and reports
    pub name: String,
    /// Optional longer explanation of the flow under test
    pub description: Option<String>,
    /// The expected sequence; repeated entries mean "expect this more than once"
    pub items_to_match: Vec<TraceItem>,
    /// Ordering and duplicate policy
    pub config: TraceConfig,
}

impl Trace {
    /// Create a trace with the default policy
    pub fn new(name: impl Into<String>, items_to_match: Vec<TraceItem>) -> Self {
        Self {
            name: name.into(),
            description: None,
            items_to_match,
            config: TraceConfig::default(),
        }
    }

    /// Builder method: attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method: replace the policy
    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Check that this trace can be run
    ///
    /// Controllers should call this before starting a session; starting a
    /// session with an empty trace is a programming error and panics.
    pub fn validate(&self) -> Result<()> {
        if self.items_to_match.is_empty() {
            return Err(TraceError::EmptyTrace(self.name.clone()));
        }
        self.items_to_match.iter().try_for_each(TraceItem::validate)
    }

    /// Whether `item` appears anywhere in the expected sequence
    pub fn expects(&self, item: &TraceItem) -> bool {
        self.items_to_match.contains(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_trace() {
        let trace = Trace::new("empty", Vec::new());
        assert!(matches!(trace.validate(), Err(TraceError::EmptyTrace(name)) if name == "empty"));
    }

    #[test]
    fn test_validate_rejects_blank_type_tag() {
        let trace = Trace::new(
            "checkout",
            vec![TraceItem::new("event", "cart"), TraceItem::new("", "pay")],
        );
        assert!(matches!(trace.validate(), Err(TraceError::InvalidItem(_))));
    }

    #[test]
    fn test_expects() {
        let trace = Trace::new("login", vec![TraceItem::new("event", "login")])
            .with_description("User logs in")
            .with_config(TraceConfig::new().with_allow_duplicates(true));

        assert!(trace.validate().is_ok());
        assert!(trace.expects(&TraceItem::new("event", "login")));
        assert!(!trace.expects(&TraceItem::new("event", "logout")));
        assert!(trace.config.allow_duplicates);
        assert_eq!(trace.description.as_deref(), Some("User logs in"));
    }
}
