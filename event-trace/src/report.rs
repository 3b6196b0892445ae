//! Trace reports
//!
//! Read-only renderings of a [`TraceResult`]: a multi-line summary, the raw
//! audit log, and a CSV export of the audit log.

use crate::config::ReportFormat;
use crate::result::TraceResult;
use crate::types::{ItemState, Properties, Result, TraceError};
use chrono::Utc;
use std::fmt;
use std::io;

const CSV_HEADER: [&str; 3] = ["Item", "Timestamp", "Properties"];

/// A report over a trace's execution
pub struct TraceReport<'a> {
    result: &'a TraceResult,
    format: ReportFormat,
}

impl<'a> TraceReport<'a> {
    /// Create a report using the default formatting
    pub fn new(result: &'a TraceResult) -> Self {
        Self::with_format(result, ReportFormat::default())
    }

    pub fn with_format(result: &'a TraceResult, format: ReportFormat) -> Self {
        Self { result, format }
    }

    /// The result this report was generated from
    pub fn result(&self) -> &TraceResult {
        self.result
    }

    /// Multi-line summary of the verdict, counts and every expected item
    pub fn summary(&self) -> String {
        format!("{:?}", self)
    }

    /// Every fired item, in arrival order, with how it was categorized
    pub fn raw_log(&self) -> String {
        self.to_string()
    }

    /// The audit log as CSV, one row per fired item
    pub fn csv_log(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TraceError::ReportError(e.to_string()))
    }

    /// Write the CSV export to `writer`
    ///
    /// Rows end in CRLF. Fields are quoted only when they contain a comma,
    /// a quote or a line break.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);

        csv_writer.write_record(CSV_HEADER)?;
        for entry in self.result.log() {
            let properties = match &entry.properties {
                Some(properties) if !properties.is_empty() => describe_properties(properties),
                _ => "none".to_string(),
            };
            csv_writer.write_record([
                entry.item.to_string(),
                self.format.format_timestamp(&entry.timestamp),
                properties,
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn write_summary(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let result = self.result;
        let trace = result.trace();
        let total = result.slots().len();
        let matched = |state: ItemState| format!("{} out of {}", result.count_slots(state), total);

        writeln!(out, "========  Begin Trace Report  ========")?;
        writeln!(out)?;
        writeln!(out, "Trace name: {}", trace.name)?;
        if let Some(description) = &trace.description {
            writeln!(out, "Description: {}", description)?;
        }
        writeln!(out)?;
        writeln!(out, "Start time: {}", self.start_time())?;
        writeln!(out, "End time: {}", self.end_time())?;
        writeln!(out)?;
        writeln!(out, "Result: {}", result.state())?;
        writeln!(out, "What does this mean?: {}", result.state().description())?;
        writeln!(out)?;
        writeln!(out, "Enforcing order?: {}", trace.config.enforce_order)?;
        writeln!(out, "Allow duplicates?: {}", trace.config.allow_duplicates)?;
        writeln!(out)?;
        write_legend(out)?;
        write_banner(out, "            Trace Results")?;
        writeln!(out, "Total items to match: {}", total)?;
        writeln!(out)?;
        writeln!(out, "--> Matched: {}", matched(ItemState::Matched))?;
        writeln!(out, "--> Missing: {}", matched(ItemState::Missing))?;
        writeln!(out, "--> Out of order: {}", matched(ItemState::OutOfOrder))?;
        writeln!(out, "--> Had duplicates: {}", matched(ItemState::HadDuplicates))?;
        writeln!(
            out,
            "--> Ignored, but matched: {}",
            result.count_logged(ItemState::IgnoredButMatched)
        )?;
        writeln!(
            out,
            "--> Ignored, no match: {}",
            result.count_logged(ItemState::IgnoredNoMatch)
        )?;
        writeln!(out)?;
        write_banner(out, "         Items To Match Log")?;
        for slot in result.slots() {
            writeln!(out, "{}. {}", slot.index + 1, slot.state)?;
            writeln!(out, "---> type: {},", slot.item.item_type())?;
            writeln!(out, "     itemToMatch: {:?}", slot.item.payload())?;
            if let Some(hint) = slot.item.hint() {
                writeln!(out, "     hint: {}", hint)?;
            }
            writeln!(out)?;
        }
        writeln!(out, "The raw log can be exported separately.")?;
        writeln!(out)?;
        writeln!(out, "========   End Trace Report   ========")
    }

    fn write_raw_log(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "========  Begin Trace Raw Log  ========")?;
        writeln!(out)?;
        writeln!(out, "Trace name: {}", self.result.trace().name)?;
        writeln!(out)?;
        writeln!(out, "Start time: {}", self.start_time())?;
        writeln!(out, "End time: {}", self.end_time())?;
        writeln!(out)?;
        write_legend(out)?;
        writeln!(out, "=======================================")?;
        writeln!(out, "                Raw Log")?;
        writeln!(out, "=======================================")?;
        writeln!(out)?;
        for entry in self.result.log() {
            writeln!(out, "{}", entry.state)?;
            writeln!(out, "---> type: {},", entry.item.item_type())?;
            writeln!(out, "     itemToMatch: {:?}", entry.item.payload())?;
            writeln!(
                out,
                "---> timestamp: {}",
                self.format.format_timestamp(&entry.timestamp)
            )?;
            if let Some(properties) = &entry.properties {
                writeln!(out, "---> properties: {}", describe_properties(properties))?;
            }
            writeln!(out)?;
        }
        writeln!(out, "========   End Trace Raw Log   ========")
    }

    fn start_time(&self) -> String {
        self.format.format_timestamp(&self.result.start_time())
    }

    fn end_time(&self) -> String {
        let end = self.result.end_time().unwrap_or_else(Utc::now);
        self.format.format_timestamp(&end)
    }
}

impl fmt::Display for TraceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_raw_log(f)
    }
}

impl fmt::Debug for TraceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_summary(f)
    }
}

fn write_banner(out: &mut impl fmt::Write, title: &str) -> fmt::Result {
    writeln!(out, "======================================")?;
    writeln!(out, "{}", title)?;
    writeln!(out, "======================================")?;
    writeln!(out)
}

fn write_legend(out: &mut impl fmt::Write) -> fmt::Result {
    write_banner(out, "            Results Legend")?;
    for state in ItemState::REPORTABLE {
        writeln!(out, "--> {}", state.description())?;
    }
    writeln!(out)
}

fn describe_properties(properties: &Properties) -> String {
    properties
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("; ")
}
