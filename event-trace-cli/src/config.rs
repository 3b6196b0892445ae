//! Configuration loading and parsing

use anyhow::{Context, Result};
use event_trace::{ReportFormat, Trace, TraceConfig, TraceItem};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from trace.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub trace: TraceSection,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceSection {
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub policy: TraceConfig,
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ItemConfig {
    #[serde(rename = "type")]
    pub item_type: String,
    pub value: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Items fired at or after this offset are not delivered
    pub timeout_ms: Option<u64>,
    pub max_events: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
    pub output_dir: Option<PathBuf>,
    pub timestamp_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Summary report
    Txt,
    /// Raw audit log
    Log,
    Csv,
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Txt]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            output_dir: None,
            timestamp_format: None,
        }
    }
}

impl ItemConfig {
    pub fn to_trace_item(&self) -> TraceItem {
        let item = TraceItem::new(self.item_type.clone(), self.value.clone());
        match &self.hint {
            Some(hint) => item.with_hint(hint.clone()),
            None => item,
        }
    }
}

impl TraceSection {
    /// Build the trace definition, rejecting one with no items
    pub fn to_trace(&self) -> Result<Trace> {
        let items = self.items.iter().map(ItemConfig::to_trace_item).collect();
        let mut trace = Trace::new(self.name.clone(), items).with_config(self.policy);
        if let Some(description) = &self.description {
            trace = trace.with_description(description.clone());
        }
        trace.validate()?;
        Ok(trace)
    }
}

impl OutputConfig {
    pub fn report_format(&self) -> Result<ReportFormat> {
        let format = match &self.timestamp_format {
            Some(format) => ReportFormat::default().with_timestamp_format(format.clone()),
            None => ReportFormat::default(),
        };
        format.validate()?;
        Ok(format)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
