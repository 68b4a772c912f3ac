//! Entry registry
//!
//! Maps configuration ids to their entry: the configuration node plus the
//! binder instance created for it. Lookups never fail; an unknown id yields
//! the empty entry. The map is insertion ordered and guarded by a single
//! `RwLock`, so background threads can query it while the main thread binds.

use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::binder::{Binder, NoopBinder};
use crate::config::ConfigNode;
use crate::sync::{read, write};

/// A configuration paired with its binder
#[derive(Clone)]
pub struct Entry {
    pub configuration: Arc<ConfigNode>,
    pub binder: Arc<dyn Binder>,
}

impl Entry {
    #[must_use]
    pub fn new(configuration: Arc<ConfigNode>, binder: Arc<dyn Binder>) -> Self {
        Self {
            configuration,
            binder,
        }
    }

    /// The empty entry: empty configuration and a binder that does nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ConfigNode::empty(), Arc::new(NoopBinder))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.configuration.is_valid()
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("configuration", &self.configuration.id())
            .finish_non_exhaustive()
    }
}

/// Shared handle to the entry map
#[derive(Clone, Default)]
pub struct EntryRegistry {
    entries: Arc<RwLock<IndexMap<String, Entry>>>,
}

impl EntryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `id`, or the empty entry
    #[must_use]
    pub fn get(&self, id: &str) -> Entry {
        self.lookup(id).unwrap_or_else(Entry::empty)
    }

    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Entry> {
        read(&self.entries).get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        read(&self.entries).contains_key(id)
    }

    /// Create the entry for `configuration` unless its id is already known
    ///
    /// `make_binder` runs outside the lock. If another caller inserted the
    /// same id in the meantime, that entry wins and the new binder is
    /// dropped. Returns whether a new entry was stored.
    pub fn insert_if_absent(
        &self,
        configuration: &Arc<ConfigNode>,
        make_binder: impl FnOnce() -> Arc<dyn Binder>,
    ) -> bool {
        if self.contains(configuration.id()) {
            return false;
        }
        let binder = make_binder();
        let mut entries = write(&self.entries);
        if entries.contains_key(configuration.id()) {
            return false;
        }
        entries.insert(
            configuration.id().to_string(),
            Entry::new(Arc::clone(configuration), binder),
        );
        true
    }

    /// Drop the entry for `id`, keeping the order of the others
    pub fn remove(&self, id: &str) -> Option<Entry> {
        write(&self.entries).shift_remove(id)
    }

    /// Known ids in insertion order
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        read(&self.entries).keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }
}

impl fmt::Debug for EntryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRegistry").field("ids", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_unknown_id_yields_empty_entry() {
        let registry = EntryRegistry::new();
        let entry = registry.get("missing");
        assert!(entry.is_empty());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_insert_if_absent_keeps_first_binder() {
        let registry = EntryRegistry::new();
        let config = ConfigNode::new("a", "Text");
        let first: Arc<dyn Binder> = Arc::new(NoopBinder);

        assert!(registry.insert_if_absent(&config, || Arc::clone(&first)));
        assert!(!registry.insert_if_absent(&config, || Arc::new(NoopBinder)));
        assert!(Arc::ptr_eq(&registry.get("a").binder, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let registry = EntryRegistry::new();
        for id in ["a", "b", "c"] {
            registry.insert_if_absent(&ConfigNode::new(id, "Text"), || Arc::new(NoopBinder));
        }
        assert!(registry.remove("b").is_some());
        assert!(registry.remove("b").is_none());
        assert_eq!(registry.ids(), vec!["a", "c"]);
    }

    #[test]
    fn test_concurrent_inserts_store_one_entry_per_id() {
        let registry = EntryRegistry::new();
        let config = ConfigNode::new("shared", "Text");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let config = Arc::clone(&config);
                thread::spawn(move || registry.insert_if_absent(&config, || Arc::new(NoopBinder)))
            })
            .collect();
        let stored = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(stored, 1);
        assert_eq!(registry.len(), 1);
    }
}
