//! Report output
//!
//! Writes the configured report formats either to files in an output
//! directory or, when no directory is configured, to stdout.

use crate::config::{OutputConfig, OutputFormat};
use anyhow::{Context, Result};
use event_trace::{TraceReport, TraceResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Render one format of the report
pub fn render(report: &TraceReport<'_>, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Txt => report.summary(),
        OutputFormat::Log => report.raw_log(),
        OutputFormat::Csv => report.csv_log().context("Failed to export CSV report")?,
    };
    Ok(rendered)
}

/// File name for one format of a trace's report, e.g. `checkout-flow.csv`
pub fn file_name(trace_name: &str, format: OutputFormat) -> String {
    let slug: String = trace_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = if slug.is_empty() { "trace".to_string() } else { slug };

    match format {
        OutputFormat::Txt => format!("{}-summary.txt", slug),
        OutputFormat::Log => format!("{}-raw.txt", slug),
        OutputFormat::Csv => format!("{}.csv", slug),
    }
}

/// Write every configured format; returns the files written
pub fn write_reports(
    result: &TraceResult,
    output: &OutputConfig,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let report = TraceReport::with_format(result, output.report_format()?);
    let output_dir = output_dir.or(output.output_dir.as_deref());

    let Some(dir) = output_dir else {
        for format in &output.formats {
            println!("{}", render(&report, *format)?);
        }
        return Ok(Vec::new());
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let mut written = Vec::new();
    for format in &output.formats {
        let path = dir.join(file_name(&result.trace().name, *format));
        fs::write(&path, render(&report, *format)?)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        log::info!("Wrote {:?} report to {:?}", format, path);
        written.push(path);
    }
    Ok(written)
}
