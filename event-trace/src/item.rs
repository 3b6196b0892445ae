//! Item identity
//!
//! A [`TraceItem`] identifies one kind of observable occurrence: a type tag,
//! an opaque payload and an optional hint for humans. Equality and hashing
//! only look at the type tag and the payload, so two items that differ only
//! in their hint are interchangeable when matching.

use crate::types::{Result, TraceError};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A payload that can be compared and hashed without knowing its concrete type
///
/// Implemented automatically for every `'static` type that is
/// `Debug + Eq + Hash + Send + Sync`.
pub trait TracePayload: Any + fmt::Debug + Send + Sync {
    /// Structural equality against another, possibly differently typed, payload
    fn eq_payload(&self, other: &dyn TracePayload) -> bool;

    /// Feeds the payload (including its concrete type) into `state`
    fn hash_payload(&self, state: &mut dyn Hasher);

    /// Access to the concrete value for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T> TracePayload for T
where
    T: Any + fmt::Debug + Eq + Hash + Send + Sync,
{
    fn eq_payload(&self, other: &dyn TracePayload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn hash_payload(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Type-erased wrapper around a [`TracePayload`]
#[derive(Clone)]
pub struct AnyPayload(Arc<dyn TracePayload>);

impl AnyPayload {
    /// Wrap a concrete payload value
    ///
    /// String literals are stored as `String`, so `"login"` and
    /// `"login".to_string()` are the same payload.
    pub fn new<T: TracePayload>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(text) = any.downcast_ref::<&'static str>() {
            return Self(Arc::new(text.to_string()));
        }
        Self(Arc::new(value))
    }

    /// Borrow the payload as its concrete type, if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for AnyPayload {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_payload(other.0.as_ref())
    }
}

impl Eq for AnyPayload {}

impl Hash for AnyPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_payload(state);
    }
}

impl fmt::Debug for AnyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// An immutable token identifying one kind of fired item
#[derive(Clone)]
pub struct TraceItem {
    item_type: String,
    payload: AnyPayload,
    hint: Option<String>,
}

impl TraceItem {
    /// Create an item from a type tag and a payload
    ///
    /// Payloads compare by concrete type and value. A `&str` payload is
    /// stored as a `String`, so both spellings match each other.
    ///
    /// # Example
    /// ```
    /// use event_trace::TraceItem;
    ///
    /// let login = TraceItem::new("event", "login");
    /// assert_eq!(login, TraceItem::new("event", "login").with_hint("Tap the login button"));
    /// assert_ne!(login, TraceItem::new("screen", "login"));
    /// assert_eq!(login, TraceItem::new("event", "login".to_string()));
    /// ```
    pub fn new<T: TracePayload>(item_type: impl Into<String>, payload: T) -> Self {
        Self {
            item_type: item_type.into(),
            payload: AnyPayload::new(payload),
            hint: None,
        }
    }

    /// Builder method: attach a human-readable hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// The type tag (category) of this item
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// The type-erased payload of this item
    pub fn payload(&self) -> &AnyPayload {
        &self.payload
    }

    /// Optional hint describing where in the flow this item should fire
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Reject items whose type tag is blank
    pub fn validate(&self) -> Result<()> {
        if self.item_type.trim().is_empty() {
            return Err(TraceError::InvalidItem(format!(
                "{:?} has an empty type tag",
                self.payload
            )));
        }
        Ok(())
    }
}

impl PartialEq for TraceItem {
    fn eq(&self, other: &Self) -> bool {
        self.item_type == other.item_type && self.payload == other.payload
    }
}

impl Eq for TraceItem {}

impl Hash for TraceItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item_type.hash(state);
        self.payload.hash(state);
    }
}

impl fmt::Debug for TraceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceItem")
            .field("type", &self.item_type)
            .field("payload", &self.payload)
            .field("hint", &self.hint)
            .finish()
    }
}

impl fmt::Display for TraceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.item_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Checkpoint {
        One,
        Two,
    }

    fn hash_of(item: &TraceItem) -> u64 {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_hint_is_ignored_by_equality() {
        let a = TraceItem::new("event", Checkpoint::One).with_hint("first");
        let b = TraceItem::new("event", Checkpoint::One).with_hint("something else");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.hint(), Some("first"));
    }

    #[test]
    fn test_type_tag_and_payload_both_matter() {
        let a = TraceItem::new("event", Checkpoint::One);
        assert_ne!(a, TraceItem::new("event", Checkpoint::Two));
        assert_ne!(a, TraceItem::new("screen", Checkpoint::One));
    }

    #[test]
    fn test_different_payload_types_never_equal() {
        // Same Debug text, different concrete types
        let a = TraceItem::new("event", 1u32);
        let b = TraceItem::new("event", 1u64);
        assert_ne!(a, b);
        assert_ne!(a, TraceItem::new("event", "1"));
    }

    #[test]
    fn test_items_work_in_hash_sets() {
        let mut set = HashSet::new();
        set.insert(TraceItem::new("event", "login"));
        set.insert(TraceItem::new("event", "login").with_hint("dup"));
        set.insert(TraceItem::new("event", String::from("logout")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_downcast_payload() {
        let item = TraceItem::new("event", Checkpoint::Two);
        assert_eq!(item.payload().downcast_ref::<Checkpoint>(), Some(&Checkpoint::Two));
        assert!(item.payload().downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_str_and_string_payloads_match() {
        let literal = TraceItem::new("event", "login");
        let owned = TraceItem::new("event", String::from("login"));
        assert_eq!(literal, owned);
        assert_eq!(hash_of(&literal), hash_of(&owned));
        assert_eq!(literal.payload().downcast_ref::<String>().map(String::as_str), Some("login"));
    }

    #[test]
    fn test_blank_type_tag_is_invalid() {
        assert!(TraceItem::new("event", "login").validate().is_ok());
        let err = TraceItem::new("  ", "login").validate().unwrap_err();
        assert!(matches!(err, TraceError::InvalidItem(_)));
        assert_eq!(err.to_string(), "Invalid trace item: \"login\" has an empty type tag");
    }

    #[test]
    fn test_display() {
        let item = TraceItem::new("event", "login");
        assert_eq!(item.to_string(), "event: \"login\"");
        assert_eq!(item.item_type(), "event");
    }
}
