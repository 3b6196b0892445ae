//! Fired-event input
//!
//! Events are read from a JSON-lines file, one fired item per line:
//!
//! ```text
//! {"type": "event", "value": "cart_opened", "offset_ms": 120}
//! {"type": "event", "value": "payment_sent", "properties": {"amount": 9.99}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use event_trace::{Properties, TraceItem};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// One fired item as recorded in the events file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FiredEvent {
    #[serde(rename = "type")]
    pub item_type: String,
    pub value: String,
    pub hint: Option<String>,
    /// Milliseconds since the start of the recorded session
    pub offset_ms: Option<u64>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl FiredEvent {
    pub fn to_trace_item(&self) -> TraceItem {
        let item = TraceItem::new(self.item_type.clone(), self.value.clone());
        match &self.hint {
            Some(hint) => item.with_hint(hint.clone()),
            None => item,
        }
    }

    /// Properties flattened to strings; `None` if the event carried none
    pub fn properties(&self) -> Option<Properties> {
        if self.properties.is_empty() {
            return None;
        }
        Some(
            self.properties
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect(),
        )
    }
}

/// Parse JSON-lines content into fired events
pub fn parse_events(content: &str) -> Result<Vec<FiredEvent>> {
    let mut events = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: FiredEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", line_no + 1))?;
        event
            .to_trace_item()
            .validate()
            .with_context(|| format!("Invalid event on line {}", line_no + 1))?;
        events.push(event);
    }
    log::debug!("Parsed {} fired event(s)", events.len());
    Ok(events)
}

/// Load fired events from a file, or from stdin when `path` is `-`
pub fn load_events(path: &Path) -> Result<Vec<FiredEvent>> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read events from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read events file: {:?}", path))?
    };

    parse_events(&content).with_context(|| format!("Failed to parse events file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_events() {
        let content = r#"
            # recorded on a test device
            {"type": "event", "value": "cart_opened", "offset_ms": 120}

            {"type": "screen", "value": "payment", "hint": "Pay screen", "properties": {"amount": 9.99, "currency": "EUR"}}
        "#;

        let events = parse_events(content).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].offset_ms, Some(120));
        assert!(events[0].properties().is_none());

        let properties = events[1].properties().unwrap();
        assert_eq!(properties.get("amount").map(String::as_str), Some("9.99"));
        assert_eq!(properties.get("currency").map(String::as_str), Some("EUR"));
        assert_eq!(events[1].to_trace_item().hint(), Some("Pay screen"));
    }

    #[test]
    fn test_event_matches_configured_item() {
        let events = parse_events(r#"{"type": "event", "value": "launch"}"#).unwrap();
        assert_eq!(
            events[0].to_trace_item(),
            TraceItem::new("event", "launch".to_string())
        );
    }

    #[test]
    fn test_invalid_line_is_reported() {
        let err = parse_events("{\"type\": \"event\", \"value\": \"ok\"}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_blank_type_tag_is_rejected() {
        let err = parse_events(
            "{\"type\": \"event\", \"value\": \"ok\"}\n{\"type\": \" \", \"value\": \"pay\"}",
        )
        .unwrap_err();

        assert!(err.to_string().contains("line 2"));
        let cause = err.downcast_ref::<event_trace::TraceError>();
        assert!(matches!(cause, Some(event_trace::TraceError::InvalidItem(_))));
    }

    #[test]
    fn test_load_events_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "event", "value": "launch", "offset_ms": 5}}"#).unwrap();

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, "launch");
    }
}
