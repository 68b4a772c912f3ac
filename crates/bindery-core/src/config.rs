//! Configuration tree
//!
//! A [`ConfigNode`] describes what to bind to one widget: the widget kind it
//! expects, an optional binder override, typed parameters, an optional click
//! action and keyed children. Nodes are shared as `Arc<ConfigNode>`; a child
//! holds only a weak link back to its parent, and a node can be attached to a
//! single parent exactly once, so the tree cannot form cycles.
//!
//! Children and parameters sit behind one lock each. Every mutating call
//! takes that lock for its whole duration, and traversals read snapshots
//! taken under the same lock.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};

use indexmap::IndexMap;

use crate::error::{BindingError, BindingResult};
use crate::sync::{lock, read, write};
use crate::value::ParamValue;

/// Reserved id of the empty configuration
pub const EMPTY_ID: &str = "commonId";

/// View type of the empty configuration
pub const EMPTY_VIEW_TYPE: &str = "commonView";

/// Binder type used for synthetic list roots without an explicit binder
pub const COMMON_BINDER: &str = "commonBinder";

/// Key under which list items are attached to a synthetic list root
pub const COMMON_KEY: &str = "commonKey";

/// Action fired when a bound widget is clicked
pub type ClickAction = Arc<dyn Fn() + Send + Sync>;

/// Derive a stable configuration id from a hashable value
///
/// Used when a source object carries no id field of its own.
pub fn derive_id<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// One node of the configuration tree
pub struct ConfigNode {
    id: String,
    view_type: String,
    binder_type: Option<String>,
    key: OnceLock<String>,
    parent: OnceLock<Weak<ConfigNode>>,
    children: Arc<Mutex<Vec<Arc<ConfigNode>>>>,
    action: Arc<RwLock<Option<ClickAction>>>,
    params: Arc<RwLock<IndexMap<String, ParamValue>>>,
}

impl ConfigNode {
    /// Create a root node
    ///
    /// # Panics
    /// Panics if `id` is empty. Use [`ConfigNode::try_new`] for ids that
    /// come from untrusted input.
    pub fn new(id: impl Into<String>, view_type: impl Into<String>) -> Arc<Self> {
        match Self::try_new(id, view_type) {
            Ok(node) => node,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a root node, failing on an empty id
    pub fn try_new(id: impl Into<String>, view_type: impl Into<String>) -> BindingResult<Arc<Self>> {
        Self::builder(id, view_type).build()
    }

    /// Start building a node
    pub fn builder(id: impl Into<String>, view_type: impl Into<String>) -> ConfigNodeBuilder {
        ConfigNodeBuilder::new(id, view_type)
    }

    /// The empty configuration returned for unknown ids
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::raw(
            EMPTY_ID.to_string(),
            EMPTY_VIEW_TYPE.to_string(),
            Some(COMMON_BINDER.to_string()),
        ))
    }

    fn raw(id: String, view_type: String, binder_type: Option<String>) -> Self {
        Self {
            id,
            view_type,
            binder_type,
            key: OnceLock::new(),
            parent: OnceLock::new(),
            children: Arc::new(Mutex::new(Vec::new())),
            action: Arc::new(RwLock::new(None)),
            params: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Copy this node under a new id
    ///
    /// Only the scalar identity fields are duplicated. Children, parameters
    /// and the action are shared with the original, so edits through either
    /// node are visible through both.
    ///
    /// # Panics
    /// Panics if `id` is empty.
    #[must_use]
    pub fn clone_with_id(&self, id: impl Into<String>) -> Arc<Self> {
        match self.try_clone_with_id(id) {
            Ok(node) => node,
            Err(err) => panic!("{err}"),
        }
    }

    /// Copy this node under a new id, failing on an empty id
    pub fn try_clone_with_id(&self, id: impl Into<String>) -> BindingResult<Arc<Self>> {
        let id = id.into();
        if id.is_empty() {
            return Err(BindingError::MissingId);
        }
        Ok(Arc::new(Self {
            id,
            view_type: self.view_type.clone(),
            binder_type: self.binder_type.clone(),
            key: self.key.clone(),
            parent: self.parent.clone(),
            children: Arc::clone(&self.children),
            action: Arc::clone(&self.action),
            params: Arc::clone(&self.params),
        }))
    }

    /// The node id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The widget kind this node expects
    #[must_use]
    pub fn view_type(&self) -> &str {
        &self.view_type
    }

    /// The explicit binder override, if any
    #[must_use]
    pub fn binder_type(&self) -> Option<&str> {
        self.binder_type.as_deref()
    }

    /// Name used to look up this node's binder
    #[must_use]
    pub fn binder_key(&self) -> &str {
        self.binder_type.as_deref().unwrap_or(&self.view_type)
    }

    /// The slot name under which this node hangs from its parent
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.get().map(String::as_str)
    }

    /// Whether this node is a real configuration rather than the empty one
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id != EMPTY_ID
    }

    /// The parent node, if attached and still alive
    #[must_use]
    pub fn parent(&self) -> Option<Arc<ConfigNode>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// Whether this node has been attached to a parent
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.get().is_some()
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Attach `child` under `key`
    ///
    /// Sets the child's parent and key. Fails if the child already has a
    /// parent or if the attachment would create a cycle.
    pub fn add_child(self: &Arc<Self>, key: impl Into<String>, child: Arc<ConfigNode>) -> BindingResult<()> {
        let mut children = lock(&self.children);
        self.attach(key.into(), &child)?;
        children.push(child);
        Ok(())
    }

    /// Attach every node in `list` under the same `key`
    ///
    /// Nodes that cannot be attached are skipped; the first failure is
    /// returned after the others have been attached.
    pub fn add_children(
        self: &Arc<Self>,
        key: impl Into<String>,
        list: impl IntoIterator<Item = Arc<ConfigNode>>,
    ) -> BindingResult<()> {
        let key = key.into();
        let mut children = lock(&self.children);
        let mut first_error = None;
        for child in list {
            match self.attach(key.clone(), &child) {
                Ok(()) => children.push(child),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn attach(self: &Arc<Self>, key: String, child: &Arc<ConfigNode>) -> BindingResult<()> {
        if child.has_parent() {
            return Err(BindingError::AlreadyAttached {
                child: child.id.clone(),
                parent: child.parent().map_or_else(|| "<dropped>".to_string(), |p| p.id.clone()),
            });
        }

        // The child must not be this node, one of its ancestors, or a clone
        // sharing a child list with any of them.
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if Arc::ptr_eq(&node, child) || Arc::ptr_eq(&node.children, &child.children) {
                return Err(BindingError::CyclicAttachment(child.id.clone()));
            }
            current = node.parent();
        }

        if child.parent.set(Arc::downgrade(self)).is_err() {
            return Err(BindingError::AlreadyAttached {
                child: child.id.clone(),
                parent: self.id.clone(),
            });
        }
        let _ = child.key.set(key);
        Ok(())
    }

    /// Snapshot of the children, in insertion order
    #[must_use]
    pub fn children(&self) -> Vec<Arc<ConfigNode>> {
        lock(&self.children).clone()
    }

    /// Number of children
    #[must_use]
    pub fn child_count(&self) -> usize {
        lock(&self.children).len()
    }

    /// Children attached under `key`
    #[must_use]
    pub fn children_with_key(&self, key: &str) -> Vec<Arc<ConfigNode>> {
        self.children_where(|child| child.key() == Some(key))
    }

    /// Children matching `filter`
    #[must_use]
    pub fn children_where(&self, filter: impl Fn(&ConfigNode) -> bool) -> Vec<Arc<ConfigNode>> {
        lock(&self.children)
            .iter()
            .filter(|child| filter(child))
            .cloned()
            .collect()
    }

    /// First child attached under `key`
    #[must_use]
    pub fn child_by_key(&self, key: &str) -> Option<Arc<ConfigNode>> {
        lock(&self.children)
            .iter()
            .find(|child| child.key() == Some(key))
            .cloned()
    }

    /// Child with the given id
    #[must_use]
    pub fn child_by_id(&self, id: &str) -> Option<Arc<ConfigNode>> {
        lock(&self.children).iter().find(|child| child.id == id).cloned()
    }

    /// Whether any child is attached under `key`
    #[must_use]
    pub fn has_child(&self, key: &str) -> bool {
        lock(&self.children).iter().any(|child| child.key() == Some(key))
    }

    /// Remove the first child matching `filter`
    ///
    /// The removed node keeps its key and its parent link: attaching it again
    /// fails with `AlreadyAttached`, and ancestor lookups from it still reach
    /// this node.
    pub fn remove_child_where(&self, filter: impl Fn(&ConfigNode) -> bool) -> Option<Arc<ConfigNode>> {
        let mut children = lock(&self.children);
        let index = children.iter().position(|child| filter(child))?;
        Some(children.remove(index))
    }

    /// Remove the `position`-th child among those matching `filter`
    ///
    /// Like [`remove_child_where`](Self::remove_child_where), the removed node
    /// stays tied to this parent.
    pub fn remove_child_at(
        &self,
        position: usize,
        filter: impl Fn(&ConfigNode) -> bool,
    ) -> Option<Arc<ConfigNode>> {
        let mut children = lock(&self.children);
        let index = children
            .iter()
            .enumerate()
            .filter(|(_, child)| filter(child))
            .nth(position)
            .map(|(index, _)| index)?;
        Some(children.remove(index))
    }

    // ------------------------------------------------------------------
    // Action
    // ------------------------------------------------------------------

    /// The click action, if any
    #[must_use]
    pub fn action(&self) -> Option<ClickAction> {
        read(&self.action).clone()
    }

    /// Replace the click action
    pub fn set_action(&self, action: impl Fn() + Send + Sync + 'static) {
        *write(&self.action) = Some(Arc::new(action));
    }

    /// Remove the click action
    pub fn clear_action(&self) {
        *write(&self.action) = None;
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Store a parameter
    pub fn put_param(&self, key: impl Into<String>, value: impl Into<ParamValue>) {
        write(&self.params).insert(key.into(), value.into());
    }

    /// Store a parameter when one is present; `None` leaves the map untouched
    pub fn put_optional_param<V: Into<ParamValue>>(&self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.put_param(key, value);
        }
    }

    /// Raw parameter lookup
    #[must_use]
    pub fn param(&self, key: &str) -> Option<ParamValue> {
        read(&self.params).get(key).cloned()
    }

    /// Raw parameter lookup with a default
    #[must_use]
    pub fn param_or(&self, key: &str, default: ParamValue) -> ParamValue {
        self.param(key).unwrap_or(default)
    }

    /// Snapshot of all parameters, in insertion order
    #[must_use]
    pub fn params(&self) -> IndexMap<String, ParamValue> {
        read(&self.params).clone()
    }

    /// String parameter; numbers and booleans are not converted
    #[must_use]
    pub fn string_param(&self, key: &str) -> Option<String> {
        read(&self.params).get(key).and_then(ParamValue::as_str).map(str::to_string)
    }

    #[must_use]
    pub fn string_param_or(&self, key: &str, default: &str) -> String {
        self.string_param(key).unwrap_or_else(|| default.to_string())
    }

    /// Integer parameter, coercing numeric strings
    #[must_use]
    pub fn int_param(&self, key: &str) -> Option<i64> {
        read(&self.params).get(key).and_then(ParamValue::to_int)
    }

    #[must_use]
    pub fn int_param_or(&self, key: &str, default: i64) -> i64 {
        self.int_param(key).unwrap_or(default)
    }

    /// Float parameter, coercing integers and numeric strings
    #[must_use]
    pub fn float_param(&self, key: &str) -> Option<f64> {
        read(&self.params).get(key).and_then(ParamValue::to_float)
    }

    #[must_use]
    pub fn float_param_or(&self, key: &str, default: f64) -> f64 {
        self.float_param(key).unwrap_or(default)
    }

    /// Boolean parameter, coercing `"true"` / `"false"`
    #[must_use]
    pub fn bool_param_or(&self, key: &str, default: bool) -> bool {
        read(&self.params)
            .get(key)
            .and_then(ParamValue::to_bool)
            .unwrap_or(default)
    }
}

impl fmt::Debug for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigNode")
            .field("id", &self.id)
            .field("view_type", &self.view_type)
            .field("binder_type", &self.binder_type)
            .field("key", &self.key())
            .field("children", &self.child_count())
            .field("params", &*read(&self.params))
            .field("has_action", &read(&self.action).is_some())
            .finish()
    }
}

/// Builder for [`ConfigNode`]
#[must_use]
pub struct ConfigNodeBuilder {
    id: String,
    view_type: String,
    binder_type: Option<String>,
    params: IndexMap<String, ParamValue>,
    action: Option<ClickAction>,
    children: Vec<(String, Arc<ConfigNode>)>,
}

impl ConfigNodeBuilder {
    fn new(id: impl Into<String>, view_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            view_type: view_type.into(),
            binder_type: None,
            params: IndexMap::new(),
            action: None,
            children: Vec::new(),
        }
    }

    /// Override the binder lookup key
    pub fn binder_type(mut self, binder_type: impl Into<String>) -> Self {
        self.binder_type = Some(binder_type.into());
        self
    }

    /// Add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the click action
    pub fn action(mut self, action: impl Fn() + Send + Sync + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// Add a child under `key`
    pub fn child(mut self, key: impl Into<String>, child: Arc<ConfigNode>) -> Self {
        self.children.push((key.into(), child));
        self
    }

    /// Add several children under the same `key`
    pub fn children(mut self, key: impl Into<String>, children: impl IntoIterator<Item = Arc<ConfigNode>>) -> Self {
        let key = key.into();
        self.children
            .extend(children.into_iter().map(|child| (key.clone(), child)));
        self
    }

    /// Build the node and attach its children
    pub fn build(self) -> BindingResult<Arc<ConfigNode>> {
        if self.id.is_empty() {
            return Err(BindingError::MissingId);
        }
        let node = Arc::new(ConfigNode::raw(self.id, self.view_type, self.binder_type));
        *write(&node.params) = self.params;
        *write(&node.action) = self.action;
        for (key, child) in self.children {
            node.add_child(key, child)?;
        }
        Ok(node)
    }
}
