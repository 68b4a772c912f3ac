//! Composite adapters
//!
//! A composite exposes the named sub-widgets of a widget so that binding can
//! flow into its internal structure. Each slot declares a [`Fallback`] applied
//! when the configuration has no child for that slot.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BindingError, BindingResult};
use crate::widget::{Visibility, WidgetId, WidgetTree};

/// Visibility applied to a slot with no matching configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    #[default]
    Gone = 0,
    Invisible = 1,
    Visible = 2,
}

impl Fallback {
    /// Decode a declared fallback code; unknown codes leave the slot visible
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Gone,
            1 => Self::Invisible,
            _ => Self::Visible,
        }
    }

    #[must_use]
    pub fn visibility(self) -> Visibility {
        match self {
            Self::Gone => Visibility::Gone,
            Self::Invisible => Visibility::Invisible,
            Self::Visible => Visibility::Visible,
        }
    }
}

/// One named sub-widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSlot {
    pub key: String,
    pub widget: WidgetId,
    pub fallback: Fallback,
}

/// Named sub-widget slots of a widget, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Composite {
    slots: IndexMap<String, CompositeSlot>,
}

impl Composite {
    /// The empty composite
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a slot; a later declaration for the same key replaces it
    pub fn put(&mut self, key: impl Into<String>, widget: WidgetId, fallback: Fallback) {
        let key = key.into();
        self.slots.insert(
            key.clone(),
            CompositeSlot {
                key,
                widget,
                fallback,
            },
        );
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, widget: WidgetId, fallback: Fallback) -> Self {
        self.put(key, widget, fallback);
        self
    }

    /// Build a composite from descendants found by name
    ///
    /// Names with no matching descendant are left out.
    #[must_use]
    pub fn from_named_children(tree: &WidgetTree, widget: WidgetId, slots: &[(&str, Fallback)]) -> Self {
        let mut composite = Self::new();
        for (name, fallback) in slots {
            if let Some(child) = tree.find_by_name(widget, name) {
                composite.put(*name, child, *fallback);
            }
        }
        composite
    }

    #[must_use]
    pub fn slot(&self, key: &str) -> Option<&CompositeSlot> {
        self.slots.get(key)
    }

    pub fn slots(&self) -> impl Iterator<Item = &CompositeSlot> {
        self.slots.values()
    }

    #[must_use]
    pub fn into_slots(self) -> Vec<CompositeSlot> {
        self.slots.into_values().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Builds the composite of a live widget
pub trait CompositeFactory: Send + Sync {
    fn build(&self, tree: &WidgetTree, widget: WidgetId) -> BindingResult<Composite>;
}

impl<F> CompositeFactory for F
where
    F: Fn(&WidgetTree, WidgetId) -> BindingResult<Composite> + Send + Sync,
{
    fn build(&self, tree: &WidgetTree, widget: WidgetId) -> BindingResult<Composite> {
        self(tree, widget)
    }
}

/// Composite factories keyed by widget kind
#[derive(Default, Clone)]
pub struct CompositeRegistry {
    factories: IndexMap<String, Arc<dyn CompositeFactory>>,
}

impl CompositeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: impl CompositeFactory + 'static) -> &mut Self {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Register a fixed list of named slots for a widget kind
    pub fn register_named(&mut self, kind: impl Into<String>, slots: &[(&str, Fallback)]) -> &mut Self {
        let slots: Vec<(String, Fallback)> = slots.iter().map(|(name, f)| ((*name).to_string(), *f)).collect();
        self.register(kind, move |tree: &WidgetTree, widget: WidgetId| -> BindingResult<Composite> {
            let borrowed: Vec<(&str, Fallback)> = slots.iter().map(|(name, f)| (name.as_str(), *f)).collect();
            Ok(Composite::from_named_children(tree, widget, &borrowed))
        })
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }
}

impl CompositeFactory for CompositeRegistry {
    fn build(&self, tree: &WidgetTree, widget: WidgetId) -> BindingResult<Composite> {
        let kind = tree
            .kind(widget)
            .ok_or_else(|| BindingError::StaleWidget(widget.to_string()))?;
        match self.factories.get(kind) {
            Some(factory) => factory.build(tree, widget),
            None => Err(BindingError::NoComposite(kind.to_string())),
        }
    }
}

impl fmt::Debug for CompositeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
