//! Event Trace Library
//!
//! Verifies that the items fired while an application flow runs (analytics
//! events, lifecycle callbacks, screen views...) match an expected sequence.
//!
//! # Architecture
//!
//! - [`TraceItem`] identifies one kind of fired item. Equality looks at its
//!   type tag and payload, never at its hint.
//! - [`Trace`] names an expected sequence and its [`TraceConfig`] policy.
//! - [`TraceResult`] is the matching engine: feed it fired items one at a
//!   time, then finalize it to settle the verdict.
//! - [`TraceReport`] renders a result as text or CSV.
//!
//! The library does NOT:
//! - Start, stop or time out sessions
//! - Capture fired items from an application
//! - Share one engine between concurrent sessions
//!
//! Session handling lives in the application layer (event-trace-cli).
//!
//! # Example Usage
//!
//! ```
//! use event_trace::{Trace, TraceConfig, TraceItem, TraceReport, TraceResult, TraceState};
//!
//! let trace = Trace::new(
//!     "onboarding",
//!     vec![
//!         TraceItem::new("event", "welcome_shown"),
//!         TraceItem::new("event", "signup_tapped"),
//!     ],
//! )
//! .with_config(TraceConfig::new().with_enforce_order(true));
//!
//! let mut result = TraceResult::new(trace);
//! result.subscribe(|state| println!("Trace is now {}", state));
//!
//! result.fire(TraceItem::new("event", "welcome_shown"));
//! result.fire(TraceItem::new("event", "signup_tapped"));
//! result.finalize();
//!
//! assert_eq!(result.state(), TraceState::Passed);
//! println!("{}", TraceReport::new(&result).summary());
//! ```

// Public modules
pub mod config;
pub mod item;
pub mod report;
pub mod result;
pub mod signal;
pub mod trace;
pub mod types;

// Re-export main types for convenience
pub use config::{ReportFormat, TraceConfig};
pub use item::{AnyPayload, TraceItem, TracePayload};
pub use report::TraceReport;
pub use result::TraceResult;
pub use signal::{StateSubscribers, SubscriptionId};
pub use trace::Trace;
pub use types::{
    ItemState, LogEntry, Properties, Result, Slot, Timestamp, TraceError, TraceState,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
