//! Trace evaluation
//!
//! [`TraceResult`] is the matching engine. It owns one slot per expected
//! item, an append-only audit log of every firing, and the overall verdict.
//! Each call to [`TraceResult::fire`] or [`TraceResult::finalize`] is one
//! complete step; the engine does no locking and expects its owner to
//! deliver calls one at a time.

use crate::config::TraceConfig;
use crate::item::TraceItem;
use crate::signal::{StateSubscribers, SubscriptionId};
use crate::trace::Trace;
use crate::types::{ItemState, LogEntry, Properties, Slot, Timestamp, TraceState};
use chrono::Utc;

/// Collects and evaluates the firings of a single trace session
#[derive(Debug)]
pub struct TraceResult {
    trace: Trace,
    slots: Vec<Slot>,
    log: Vec<LogEntry>,
    state: TraceState,
    subscribers: StateSubscribers,
    start_time: Timestamp,
    end_time: Option<Timestamp>,
    finalized: bool,
}

impl TraceResult {
    /// Start evaluating `trace`
    ///
    /// # Panics
    /// Panics if the trace has no items to match. Use
    /// [`Trace::validate`] first when the trace comes from user input.
    pub fn new(trace: Trace) -> Self {
        if trace.items_to_match.is_empty() {
            panic!(
                "Trace '{}' is invalid: cannot match against an empty list of items",
                trace.name
            );
        }

        let slots = trace
            .items_to_match
            .iter()
            .enumerate()
            .map(|(index, item)| Slot {
                index,
                item: item.clone(),
                state: ItemState::WaitingToBeMatched,
            })
            .collect();

        log::info!(
            "Trace '{}' started: {} item(s) to match (enforce_order={}, allow_duplicates={})",
            trace.name,
            trace.items_to_match.len(),
            trace.config.enforce_order,
            trace.config.allow_duplicates
        );

        Self {
            trace,
            slots,
            log: Vec::new(),
            state: TraceState::Waiting,
            subscribers: StateSubscribers::new(),
            start_time: Utc::now(),
            end_time: None,
            finalized: false,
        }
    }

    /// Start evaluating an anonymous trace built from raw policy flags
    ///
    /// # Panics
    /// Panics if `items` is empty.
    pub fn from_items(
        items: Vec<TraceItem>,
        enforce_order: bool,
        allow_duplicates: bool,
        assert_on_failure: bool,
    ) -> Self {
        let config = TraceConfig::new()
            .with_enforce_order(enforce_order)
            .with_allow_duplicates(allow_duplicates)
            .with_assert_on_failure(assert_on_failure);
        Self::new(Trace::new("unnamed", items).with_config(config))
    }

    // ------------------------------------------------------------------
    // Firing / finalizing
    // ------------------------------------------------------------------

    /// Evaluate a fired item. Ignored once the trace is finalized.
    pub fn fire(&mut self, item: TraceItem) {
        self.handle_firing(item, None);
    }

    /// Evaluate a fired item and keep `properties` with its log entry
    pub fn fire_with_properties(&mut self, item: TraceItem, properties: Properties) {
        self.handle_firing(item, Some(properties));
    }

    /// Mark every item still waiting as missing and settle the verdict
    ///
    /// Calling this more than once has no further effect.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }

        // Waiting slots must become Missing before the verdict is computed
        for slot in self.slots.iter_mut() {
            if slot.state == ItemState::WaitingToBeMatched {
                slot.state = ItemState::Missing;
            }
        }
        self.update_state(true);
        self.end_time = Some(Utc::now());
        self.finalized = true;

        log::info!("Trace '{}' finalized: {}", self.trace.name, self.state);
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a callback invoked with the new overall state on every change
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(TraceState) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Remove a previously registered callback
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The trace being evaluated
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// One slot per expected item, in order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Every firing received so far, in arrival order
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// The current overall verdict
    pub fn state(&self) -> TraceState {
        self.state
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// `None` until the trace is finalized
    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of slots currently in `state`
    pub fn count_slots(&self, state: ItemState) -> usize {
        self.slots.iter().filter(|slot| slot.state == state).count()
    }

    /// Number of audit-log entries categorized as `state`
    pub fn count_logged(&self, state: ItemState) -> usize {
        self.log.iter().filter(|entry| entry.state == state).count()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn handle_firing(&mut self, item: TraceItem, properties: Option<Properties>) {
        if self.finalized {
            log::debug!("Trace '{}' is finalized; ignoring {}", self.trace.name, item);
            return;
        }

        match self.categorize(&item) {
            Some(state) => {
                log::debug!("Trace '{}': {} -> {}", self.trace.name, item, state);
                self.log.push(LogEntry {
                    item,
                    state,
                    timestamp: Utc::now(),
                    properties,
                });
            }
            None => {
                log::warn!(
                    "Trace '{}': could not locate the slot duplicated by {}; dropping it",
                    self.trace.name,
                    item
                );
            }
        }
        self.update_state(false);
    }

    /// Update slot states for a fired item and return how it was categorized
    ///
    /// Returns `None` only when a duplicate cannot be traced back to a slot.
    fn categorize(&mut self, item: &TraceItem) -> Option<ItemState> {
        if !self.trace.expects(item) {
            return Some(ItemState::IgnoredNoMatch);
        }

        let same_type_waiting = self
            .slots
            .iter()
            .position(|slot| slot.state == ItemState::WaitingToBeMatched && slot.item == *item);

        let Some(index) = same_type_waiting else {
            return self.categorize_duplicate(item);
        };

        // Any waiting slot, regardless of item; at worst this is `index` itself
        let first_waiting = self
            .slots
            .iter()
            .position(|slot| slot.state == ItemState::WaitingToBeMatched)
            .unwrap_or(index);

        let state = if !self.trace.config.enforce_order || self.slots[first_waiting].item == *item {
            ItemState::Matched
        } else {
            // Everything still pending before this slot was skipped over
            for slot in self.slots[..index].iter_mut() {
                if slot.state == ItemState::WaitingToBeMatched {
                    slot.state = ItemState::OutOfOrder;
                }
            }
            ItemState::OutOfOrder
        };

        self.slots[index].state = state;
        Some(state)
    }

    fn categorize_duplicate(&mut self, item: &TraceItem) -> Option<ItemState> {
        if self.trace.config.allow_duplicates {
            return Some(ItemState::IgnoredButMatched);
        }

        let slot = self.slots.iter_mut().find(|slot| slot.item == *item)?;
        slot.state = ItemState::HadDuplicates;
        Some(ItemState::Duplicate)
    }

    fn update_state(&mut self, finalizing: bool) {
        // Failed is sticky
        if self.state == TraceState::Failed {
            return;
        }

        let allow_duplicates = self.trace.config.allow_duplicates;
        let failing = self.slots.iter().any(|slot| match slot.state {
            ItemState::Missing | ItemState::OutOfOrder => true,
            ItemState::HadDuplicates => !allow_duplicates,
            _ => false,
        });
        if failing {
            self.set_state(TraceState::Failed);
            return;
        }

        if self
            .slots
            .iter()
            .all(|slot| slot.state == ItemState::WaitingToBeMatched)
        {
            return;
        }

        if finalizing {
            if self.slots.iter().all(|slot| slot.state == ItemState::Matched) {
                self.set_state(TraceState::Passed);
            }
        } else if self.slots.iter().any(|slot| slot.state == ItemState::Matched) {
            self.set_state(TraceState::Passing);
        }
    }

    fn set_state(&mut self, state: TraceState) {
        if self.state == state {
            return;
        }

        log::info!("Trace '{}' state: {} -> {}", self.trace.name, self.state, state);
        self.state = state;
        self.subscribers.notify(state);

        if state == TraceState::Failed && self.trace.config.assert_on_failure {
            self.finalize();
            log::error!(
                "Trace '{}' failed with assert_on_failure set; {} of {} item(s) matched",
                self.trace.name,
                self.count_slots(ItemState::Matched),
                self.slots.len()
            );
            panic!("Trace ({}) failed.", self.trace.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn item(name: &'static str) -> TraceItem {
        TraceItem::new("event", name)
    }

    fn items(names: &[&'static str]) -> Vec<TraceItem> {
        names.iter().copied().map(item).collect()
    }

    fn slot_states(result: &TraceResult) -> Vec<ItemState> {
        result.slots().iter().map(|slot| slot.state).collect()
    }

    #[test]
    fn test_new_result_is_waiting() {
        let result = TraceResult::from_items(items(&["a", "b", "c"]), true, false, false);

        assert_eq!(result.slots().len(), 3);
        assert!(result
            .slots()
            .iter()
            .enumerate()
            .all(|(i, slot)| slot.index == i && slot.state == ItemState::WaitingToBeMatched));
        assert!(result.log().is_empty());
        assert_eq!(result.state(), TraceState::Waiting);
        assert!(result.end_time().is_none());
        assert!(!result.is_finalized());
    }

    #[test]
    fn test_owned_string_fires_match_literal_items() {
        let mut result = TraceResult::from_items(items(&["login"]), true, false, false);
        result.fire(TraceItem::new("event", "login".to_string()));

        assert_eq!(result.log()[0].state, ItemState::Matched);
        assert_eq!(result.state(), TraceState::Passing);
    }

    #[test]
    #[should_panic(expected = "cannot match against an empty list of items")]
    fn test_empty_trace_panics() {
        TraceResult::from_items(Vec::new(), true, false, false);
    }

    #[test]
    fn test_in_order_match_passes() {
        let mut result = TraceResult::from_items(items(&["a", "b", "c"]), true, false, false);

        result.fire(item("a"));
        assert_eq!(result.state(), TraceState::Passing);
        result.fire(item("b"));
        result.fire(item("c"));
        result.finalize();

        assert_eq!(result.state(), TraceState::Passed);
        assert!(slot_states(&result).iter().all(|s| *s == ItemState::Matched));
        assert_eq!(result.count_logged(ItemState::Matched), 3);
    }

    #[test]
    fn test_out_of_order_back_propagates() {
        let mut result = TraceResult::from_items(items(&["a", "b", "c"]), true, false, false);

        result.fire(item("b"));
        assert_eq!(
            slot_states(&result),
            vec![ItemState::OutOfOrder, ItemState::OutOfOrder, ItemState::WaitingToBeMatched]
        );
        assert_eq!(result.log()[0].state, ItemState::OutOfOrder);
        assert_eq!(result.state(), TraceState::Failed);

        result.fire(item("a"));
        result.fire(item("c"));
        assert_eq!(result.state(), TraceState::Failed);
    }

    #[test]
    fn test_back_propagation_skips_settled_slots() {
        let mut result = TraceResult::from_items(items(&["a", "b", "c", "d"]), true, false, false);

        result.fire(item("a"));
        result.fire(item("d"));

        assert_eq!(
            slot_states(&result),
            vec![
                ItemState::Matched,
                ItemState::OutOfOrder,
                ItemState::OutOfOrder,
                ItemState::OutOfOrder
            ]
        );
    }

    #[test]
    fn test_unordered_accepts_any_order() {
        let mut result = TraceResult::from_items(items(&["a", "b", "c"]), false, false, false);

        result.fire(item("c"));
        result.fire(item("a"));
        result.fire(item("b"));
        result.finalize();

        assert_eq!(result.state(), TraceState::Passed);
    }

    #[test]
    fn test_unknown_item_is_ignored() {
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, false, false);

        result.fire(item("z"));

        assert_eq!(result.log().len(), 1);
        assert_eq!(result.log()[0].state, ItemState::IgnoredNoMatch);
        assert!(slot_states(&result).iter().all(|s| *s == ItemState::WaitingToBeMatched));
        assert_eq!(result.state(), TraceState::Waiting);
    }

    #[test]
    fn test_duplicate_fails_originating_slot() {
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, false, false);

        result.fire(item("a"));
        result.fire(item("a"));

        assert_eq!(result.slots()[0].state, ItemState::HadDuplicates);
        assert_eq!(result.log()[1].state, ItemState::Duplicate);
        assert_eq!(result.state(), TraceState::Failed);
    }

    #[test]
    fn test_duplicate_allowed_is_ignored() {
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, true, false);

        result.fire(item("a"));
        result.fire(item("a"));

        assert_eq!(result.slots()[0].state, ItemState::Matched);
        assert_eq!(result.log()[1].state, ItemState::IgnoredButMatched);
        assert_eq!(result.state(), TraceState::Passing);

        result.fire(item("b"));
        result.finalize();
        assert_eq!(result.state(), TraceState::Passed);
    }

    #[test]
    fn test_repeated_expected_items_use_separate_slots() {
        let mut result = TraceResult::from_items(items(&["a", "a", "b"]), true, false, false);

        result.fire(item("a"));
        result.fire(item("a"));
        result.fire(item("b"));
        result.finalize();

        assert_eq!(result.state(), TraceState::Passed);
        assert_eq!(result.count_slots(ItemState::Matched), 3);
    }

    #[test]
    fn test_finalize_marks_missing_and_is_idempotent() {
        let mut result = TraceResult::from_items(items(&["a", "b", "c"]), true, false, false);

        result.fire(item("a"));
        result.finalize();

        assert_eq!(
            slot_states(&result),
            vec![ItemState::Matched, ItemState::Missing, ItemState::Missing]
        );
        assert_eq!(result.state(), TraceState::Failed);

        let end_time = result.end_time();
        assert!(end_time.is_some());
        result.finalize();
        assert_eq!(result.end_time(), end_time);
    }

    #[test]
    fn test_firings_after_finalize_are_ignored() {
        let mut result = TraceResult::from_items(items(&["a"]), true, false, false);

        result.fire(item("a"));
        result.finalize();
        result.fire(item("a"));
        result.fire(item("z"));

        assert_eq!(result.log().len(), 1);
        assert_eq!(result.state(), TraceState::Passed);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, false, false);

        let sink = Arc::clone(&seen);
        result.subscribe(move |state| sink.lock().unwrap().push(state));

        result.fire(item("a"));
        result.fire(item("b"));
        result.finalize();

        assert_eq!(*seen.lock().unwrap(), vec![TraceState::Passing, TraceState::Passed]);
    }

    #[test]
    fn test_unsubscribed_callbacks_are_not_called() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, false, false);

        let sink = Arc::clone(&seen);
        let id = result.subscribe(move |state| sink.lock().unwrap().push(state));
        result.fire(item("a"));
        assert!(result.unsubscribe(id));
        result.fire(item("a"));

        assert_eq!(*seen.lock().unwrap(), vec![TraceState::Passing]);
        assert_eq!(result.state(), TraceState::Failed);
    }

    #[test]
    #[should_panic(expected = "Trace (unnamed) failed.")]
    fn test_assert_on_failure_panics() {
        let mut result = TraceResult::from_items(items(&["a", "b"]), true, false, true);
        result.fire(item("b"));
    }

    #[test]
    fn test_properties_are_kept_with_log_entry() {
        let mut result = TraceResult::from_items(items(&["a"]), true, false, false);
        let mut properties = Properties::new();
        properties.insert("screen".to_string(), "home".to_string());

        result.fire_with_properties(item("a"), properties.clone());
        result.fire(item("z"));

        assert_eq!(result.log()[0].properties.as_ref(), Some(&properties));
        assert!(result.log()[1].properties.is_none());
    }
}
