//! Core types for the event trace library
//!
//! This module defines the states a trace and its items move through, the
//! audit-log entry type, and the library error type.

use crate::item::TraceItem;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Result type for trace operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Free-form key/value data attached to a fired item
pub type Properties = BTreeMap<String, String>;

/// Errors that can occur while preparing or reporting on a trace
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Trace '{0}' is invalid: cannot match against an empty list of items")]
    EmptyTrace(String),

    #[error("Invalid trace item: {0}")]
    InvalidItem(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How a single item was categorized during a trace
///
/// The first five states can be assigned to a slot of the expected sequence.
/// The last three only ever appear in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// The item has not fired yet
    WaitingToBeMatched,
    /// The item fired where it was expected
    Matched,
    /// The trace finished before the item fired
    Missing,
    /// The item fired, but not in the expected order
    OutOfOrder,
    /// The item fired more times than expected
    HadDuplicates,
    /// A firing beyond the expected count (duplicates not allowed)
    Duplicate,
    /// A firing that matches nothing in the expected sequence
    IgnoredNoMatch,
    /// A firing beyond the expected count (duplicates allowed)
    IgnoredButMatched,
}

impl ItemState {
    /// States that can be assigned to a slot and appear in reports
    pub const REPORTABLE: [ItemState; 5] = [
        ItemState::WaitingToBeMatched,
        ItemState::Matched,
        ItemState::Missing,
        ItemState::OutOfOrder,
        ItemState::HadDuplicates,
    ];

    /// Whether this state may be held by a slot of the expected sequence
    pub fn is_slot_assignable(&self) -> bool {
        Self::REPORTABLE.contains(self)
    }

    /// A short explanation of the state, used in report legends
    pub fn description(&self) -> &'static str {
        match self {
            ItemState::WaitingToBeMatched => "Waiting to be matched; the item has not fired yet",
            ItemState::Matched => "Matched; the item fired as expected",
            ItemState::Missing => "Missing; the trace ended before the item fired",
            ItemState::OutOfOrder => "Out of order; the item fired before an item expected earlier",
            ItemState::HadDuplicates => "Had duplicates; the item fired more times than expected",
            ItemState::Duplicate => "Duplicate; an extra firing of an already matched item",
            ItemState::IgnoredNoMatch => "Ignored, no match; the item is not part of this trace",
            ItemState::IgnoredButMatched => "Ignored, but matched; an extra firing that was allowed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::WaitingToBeMatched => write!(f, "Waiting to be matched"),
            ItemState::Matched => write!(f, "Matched"),
            ItemState::Missing => write!(f, "Missing"),
            ItemState::OutOfOrder => write!(f, "Out of order"),
            ItemState::HadDuplicates => write!(f, "Had duplicates"),
            ItemState::Duplicate => write!(f, "Duplicate"),
            ItemState::IgnoredNoMatch => write!(f, "Ignored, no match"),
            ItemState::IgnoredButMatched => write!(f, "Ignored, but matched"),
        }
    }
}

/// The overall verdict of a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraceState {
    /// Nothing relevant has fired yet
    #[default]
    Waiting,
    /// At least one item matched and nothing has failed so far
    Passing,
    /// The trace was finalized with every item matched
    Passed,
    /// The trace failed; this state is final
    Failed,
}

impl TraceState {
    /// A short explanation of the verdict, used in reports
    pub fn description(&self) -> &'static str {
        match self {
            TraceState::Waiting => "The trace is waiting for its first matching item",
            TraceState::Passing => "The trace is passing so far, but has not finished",
            TraceState::Passed => "Every expected item fired as expected",
            TraceState::Failed => "At least one item was missing, out of order, or duplicated",
        }
    }

    /// Whether the verdict can no longer change
    pub fn is_final(&self) -> bool {
        matches!(self, TraceState::Passed | TraceState::Failed)
    }
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceState::Waiting => write!(f, "Waiting"),
            TraceState::Passing => write!(f, "Passing"),
            TraceState::Passed => write!(f, "Passed"),
            TraceState::Failed => write!(f, "Failed"),
        }
    }
}

/// One position of the expected sequence and how it has been matched so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Position in the expected sequence
    pub index: usize,
    /// The item expected at this position
    pub item: TraceItem,
    /// Current state of this position
    pub state: ItemState,
}

/// A fired item as recorded in the audit log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// The item that fired
    pub item: TraceItem,
    /// How the firing was categorized
    pub state: ItemState,
    /// When the firing was received
    pub timestamp: Timestamp,
    /// Optional data supplied alongside the firing
    pub properties: Option<Properties>,
}
