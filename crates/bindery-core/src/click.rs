//! Click multiplexing
//!
//! A widget has room for a single click listener. The multiplexer keeps a
//! list of actions per tag id; the widget's listener just asks it to run
//! everything registered under its tag.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::config::ClickAction;
use crate::sync::{read, write};
use crate::tag::TagId;

/// Fan-out of click actions keyed by tag id
#[derive(Default)]
pub struct ClickMultiplexer {
    actions: RwLock<IndexMap<TagId, Vec<ClickAction>>>,
}

impl ClickMultiplexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action for `tag`
    pub fn subscribe(&self, tag: TagId, action: ClickAction) {
        write(&self.actions).entry(tag).or_default().push(action);
    }

    /// Append `action` unless this very action is already subscribed
    ///
    /// Returns whether it was added.
    pub fn subscribe_once(&self, tag: TagId, action: ClickAction) -> bool {
        let mut actions = write(&self.actions);
        let list = actions.entry(tag).or_default();
        if list.iter().any(|known| Arc::ptr_eq(known, &action)) {
            return false;
        }
        list.push(action);
        true
    }

    /// Run every action registered for `tag`, in subscription order
    ///
    /// Actions run outside the lock, so they may subscribe or unsubscribe.
    /// Returns how many ran.
    pub fn execute(&self, tag: TagId) -> usize {
        let actions = read(&self.actions).get(&tag).cloned().unwrap_or_default();
        for action in &actions {
            action();
        }
        actions.len()
    }

    /// Drop every action for `tag`
    pub fn unsubscribe_all(&self, tag: TagId) -> usize {
        write(&self.actions)
            .shift_remove(&tag)
            .map_or(0, |actions| actions.len())
    }

    #[must_use]
    pub fn subscriber_count(&self, tag: TagId) -> usize {
        read(&self.actions).get(&tag).map_or(0, Vec::len)
    }

    /// Number of tags with at least one action
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.actions).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.actions).is_empty()
    }
}

impl std::fmt::Debug for ClickMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickMultiplexer").field("tags", &self.len()).finish()
    }
}
