//! Session control
//!
//! A [`Session`] owns exactly one [`TraceResult`]. It forwards fired items in
//! arrival order while running, finalizes the result exactly once on stop,
//! and records every overall-state transition it is notified of.

use crate::config::SessionConfig;
use crate::events::FiredEvent;
use anyhow::Result;
use event_trace::{Properties, SubscriptionId, Trace, TraceItem, TraceResult, TraceState};
use std::sync::{Arc, Mutex};

/// Why a replay stopped delivering events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every event was delivered
    Exhausted,
    /// An event was at or past the session deadline
    Deadline,
    /// The configured maximum number of events was delivered
    MaxEvents,
}

/// Outcome of replaying recorded events into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub delivered: usize,
    pub skipped: usize,
    pub stop_reason: StopReason,
}

pub struct Session {
    result: TraceResult,
    subscription: Option<SubscriptionId>,
    transitions: Arc<Mutex<Vec<TraceState>>>,
    running: bool,
}

impl Session {
    /// Start a session for `trace`
    pub fn start(trace: Trace) -> Result<Self> {
        trace.validate()?;

        let name = trace.name.clone();
        let mut result = TraceResult::new(trace);
        let transitions = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&transitions);
        let subscription = result.subscribe(move |state| {
            log::info!("Trace '{}' is now {}", name, state);
            if let Ok(mut recorded) = recorded.lock() {
                recorded.push(state);
            }
        });

        Ok(Self {
            result,
            subscription: Some(subscription),
            transitions,
            running: true,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Forward a fired item. Returns false if the session is stopped.
    pub fn log(&mut self, item: TraceItem, properties: Option<Properties>) -> bool {
        if !self.running {
            log::debug!("Session stopped; not delivering {}", item);
            return false;
        }
        match properties {
            Some(properties) => self.result.fire_with_properties(item, properties),
            None => self.result.fire(item),
        }
        true
    }

    /// Deliver recorded events in order until they run out or a limit is hit
    pub fn replay(&mut self, events: &[FiredEvent], limits: &SessionConfig) -> ReplaySummary {
        let mut delivered = 0;
        let mut stop_reason = StopReason::Exhausted;

        for event in events {
            if !self.is_running() {
                break;
            }
            if limits.max_events.is_some_and(|max| delivered >= max) {
                stop_reason = StopReason::MaxEvents;
                break;
            }
            if let (Some(timeout), Some(offset)) = (limits.timeout_ms, event.offset_ms) {
                if offset >= timeout {
                    log::info!("Session deadline of {} ms reached at offset {} ms", timeout, offset);
                    stop_reason = StopReason::Deadline;
                    break;
                }
            }
            self.log(event.to_trace_item(), event.properties());
            delivered += 1;
        }

        ReplaySummary {
            delivered,
            skipped: events.len() - delivered,
            stop_reason,
        }
    }

    /// Finalize the trace. Only the first call has an effect.
    pub fn stop(&mut self) -> &TraceResult {
        if self.running {
            self.running = false;
            self.result.finalize();
            if let Some(id) = self.subscription.take() {
                self.result.unsubscribe(id);
            }
        }
        &self.result
    }

    pub fn result(&self) -> &TraceResult {
        &self.result
    }

    /// Overall states observed so far, oldest first
    pub fn transitions(&self) -> Vec<TraceState> {
        self.transitions
            .lock()
            .map(|transitions| transitions.clone())
            .unwrap_or_default()
    }
}
