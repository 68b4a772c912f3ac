//! Per-widget tags
//!
//! A tag links a widget to the configuration bound to it and gives the click
//! multiplexer a stable key. Tags are stored in the widget's arena slot, so
//! they are dropped together with the widget.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TAG_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tag identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(u64);

impl TagId {
    /// Allocate a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_TAG_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for TagId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag#{}", self.0)
    }
}

/// Lifecycle of a widget's tag
///
/// `Untagged -> Idless` when a click action is attached without a
/// configuration, `Untagged | Idless -> Bound` on bind, and back to
/// `Untagged` when the widget is unbound with removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Untagged,
    Idless,
    Bound,
}

/// Tag stored on a widget
#[derive(Clone)]
pub struct WidgetTag {
    id: TagId,
    configuration_id: Option<String>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl WidgetTag {
    /// A tag with a fresh id and no configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: TagId::new(),
            configuration_id: None,
            payload: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> TagId {
        self.id
    }

    /// The configuration bound to the widget, if any
    #[must_use]
    pub fn configuration_id(&self) -> Option<&str> {
        self.configuration_id.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> TagState {
        if self.configuration_id.is_some() {
            TagState::Bound
        } else {
            TagState::Idless
        }
    }

    /// Record the configuration id unless one is already present
    ///
    /// Returns whether the id was written.
    pub fn fill_configuration_id(&mut self, id: &str) -> bool {
        if self.configuration_id.is_some() {
            return false;
        }
        self.configuration_id = Some(id.to_string());
        true
    }

    /// Arbitrary caller data carried alongside the tag
    #[must_use]
    pub fn payload(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.payload.as_ref()
    }

    /// Typed view of the payload
    #[must_use]
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    pub fn set_payload(&mut self, payload: impl Any + Send + Sync) {
        self.payload = Some(Arc::new(payload));
    }
}

impl Default for WidgetTag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WidgetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetTag")
            .field("id", &self.id)
            .field("configuration_id", &self.configuration_id)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}
