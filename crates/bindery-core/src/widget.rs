//! Widget arena
//!
//! Widgets live in a generational arena: a [`WidgetId`] is an index plus the
//! generation of the slot it was allocated in. Destroying a widget frees its
//! slot and bumps the generation, so stale handles are detected instead of
//! aliasing a newer widget. The widget's [`WidgetTag`] lives inside the slot
//! and goes away with it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BindingError, BindingResult};
use crate::tag::{TagState, WidgetTag};
use crate::value::ParamValue;

/// Listener installed on a widget; fired by [`WidgetTree::click`]
pub type ClickListener = Arc<dyn Fn() + Send + Sync>;

/// Generational handle to a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Widget visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

struct WidgetData {
    kind: String,
    name: Option<String>,
    visibility: Visibility,
    props: IndexMap<String, ParamValue>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    click_listener: Option<ClickListener>,
    tag: Option<WidgetTag>,
}

struct Slot {
    generation: u32,
    widget: Option<WidgetData>,
}

/// Arena of widgets forming a tree
#[derive(Default)]
pub struct WidgetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl WidgetTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached widget of the given kind
    pub fn create(&mut self, kind: impl Into<String>) -> WidgetId {
        self.insert(kind.into(), None)
    }

    /// Create a detached widget with a name used for lookups
    pub fn create_named(&mut self, kind: impl Into<String>, name: impl Into<String>) -> WidgetId {
        self.insert(kind.into(), Some(name.into()))
    }

    fn insert(&mut self, kind: String, name: Option<String>) -> WidgetId {
        let data = WidgetData {
            kind,
            name,
            visibility: Visibility::Visible,
            props: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            click_listener: None,
            tag: None,
        };
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.widget = Some(data);
            return WidgetId {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            widget: Some(data),
        });
        WidgetId { index, generation: 0 }
    }

    /// Destroy a widget and its whole subtree
    ///
    /// Returns `false` if the handle was already stale.
    pub fn destroy(&mut self, id: WidgetId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(data) = self.get_mut(parent) {
                data.children.retain(|c| *c != id);
            }
        }

        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(data) = slot.widget.take() {
                queue.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                self.live -= 1;
            }
        }
        true
    }

    /// Whether the handle refers to a live widget
    #[must_use]
    pub fn is_alive(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live widgets
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn get(&self, id: WidgetId) -> Option<&WidgetData> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.widget.as_ref()
    }

    fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.widget.as_mut()
    }

    fn live_mut(&mut self, id: WidgetId) -> BindingResult<&mut WidgetData> {
        self.get_mut(id).ok_or_else(|| BindingError::StaleWidget(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    #[must_use]
    pub fn kind(&self, id: WidgetId) -> Option<&str> {
        self.get(id).map(|w| w.kind.as_str())
    }

    #[must_use]
    pub fn name(&self, id: WidgetId) -> Option<&str> {
        self.get(id).and_then(|w| w.name.as_deref())
    }

    /// Check that a live widget has the expected kind
    ///
    /// Binders call this before touching kind-specific properties.
    pub fn expect_kind(&self, id: WidgetId, expected: &str) -> BindingResult<()> {
        let data = self
            .get(id)
            .ok_or_else(|| BindingError::StaleWidget(id.to_string()))?;
        if data.kind == expected {
            Ok(())
        } else {
            Err(BindingError::WidgetTypeMismatch {
                expected: expected.to_string(),
                actual: data.kind.clone(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn append_child(&mut self, parent: WidgetId, child: WidgetId) -> BindingResult<()> {
        if parent == child {
            return Err(BindingError::StaleWidget(child.to_string()));
        }
        if !self.is_alive(parent) {
            return Err(BindingError::StaleWidget(parent.to_string()));
        }
        let previous = self.live_mut(child)?.parent.take();
        if let Some(previous) = previous {
            if let Some(data) = self.get_mut(previous) {
                data.children.retain(|c| *c != child);
            }
        }
        self.live_mut(child)?.parent = Some(parent);
        self.live_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Direct children in insertion order
    #[must_use]
    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.get(id).map(|w| w.children.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.get(id).and_then(|w| w.parent)
    }

    /// Widgets without a parent
    #[must_use]
    pub fn roots(&self) -> Vec<WidgetId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let data = slot.widget.as_ref()?;
                if data.parent.is_some() {
                    return None;
                }
                Some(WidgetId {
                    index: u32::try_from(index).ok()?,
                    generation: slot.generation,
                })
            })
            .collect()
    }

    /// First descendant of `root` with the given name, breadth first
    #[must_use]
    pub fn find_by_name(&self, root: WidgetId, name: &str) -> Option<WidgetId> {
        let mut queue: VecDeque<WidgetId> = self.children(root).into();
        while let Some(current) = queue.pop_front() {
            if self.name(current) == Some(name) {
                return Some(current);
            }
            queue.extend(self.children(current));
        }
        None
    }

    // ------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------

    #[must_use]
    pub fn visibility(&self, id: WidgetId) -> Option<Visibility> {
        self.get(id).map(|w| w.visibility)
    }

    pub fn set_visibility(&mut self, id: WidgetId, visibility: Visibility) -> bool {
        match self.get_mut(id) {
            Some(data) => {
                data.visibility = visibility;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn prop(&self, id: WidgetId, key: &str) -> Option<&ParamValue> {
        self.get(id).and_then(|w| w.props.get(key))
    }

    /// All properties, in insertion order
    #[must_use]
    pub fn props(&self, id: WidgetId) -> Option<&IndexMap<String, ParamValue>> {
        self.get(id).map(|w| &w.props)
    }

    pub fn set_prop(&mut self, id: WidgetId, key: impl Into<String>, value: impl Into<ParamValue>) -> bool {
        match self.get_mut(id) {
            Some(data) => {
                data.props.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn clear_prop(&mut self, id: WidgetId, key: &str) -> Option<ParamValue> {
        self.get_mut(id).and_then(|w| w.props.shift_remove(key))
    }

    // ------------------------------------------------------------------
    // Click listener
    // ------------------------------------------------------------------

    /// Install or clear the widget's single click listener
    pub fn set_click_listener(&mut self, id: WidgetId, listener: Option<ClickListener>) -> bool {
        match self.get_mut(id) {
            Some(data) => {
                data.click_listener = listener;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_click_listener(&self, id: WidgetId) -> bool {
        self.get(id).is_some_and(|w| w.click_listener.is_some())
    }

    /// Simulate a user click; returns whether a listener ran
    pub fn click(&self, id: WidgetId) -> bool {
        let Some(listener) = self.get(id).and_then(|w| w.click_listener.clone()) else {
            return false;
        };
        listener();
        true
    }

    // ------------------------------------------------------------------
    // Tag
    // ------------------------------------------------------------------

    #[must_use]
    pub fn tag(&self, id: WidgetId) -> Option<&WidgetTag> {
        self.get(id).and_then(|w| w.tag.as_ref())
    }

    /// The widget's tag, creating an empty one if needed
    pub fn ensure_tag(&mut self, id: WidgetId) -> BindingResult<&mut WidgetTag> {
        Ok(self.live_mut(id)?.tag.get_or_insert_with(WidgetTag::new))
    }

    pub fn clear_tag(&mut self, id: WidgetId) -> Option<WidgetTag> {
        self.get_mut(id).and_then(|w| w.tag.take())
    }

    #[must_use]
    pub fn tag_state(&self, id: WidgetId) -> TagState {
        self.tag(id).map_or(TagState::Untagged, WidgetTag::state)
    }
}

impl fmt::Debug for WidgetTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetTree")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .finish()
    }
}
