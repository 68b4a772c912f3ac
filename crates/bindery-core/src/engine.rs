//! The binding engine
//!
//! [`BindingEngine`] owns the entry registry and the click multiplexer and
//! walks configuration trees against widget trees:
//!
//! - `bind` tags the widget, creates missing entries for the whole
//!   configuration subtree, runs the binder, recurses into composite slots
//!   and installs the multiplexed click listener.
//! - `unbind` walks (widget, configuration) pairs breadth first, reaching
//!   children through composite slots and through tagged native children.
//!   Entries survive unless removal is requested.
//! - `remove` walks the configuration subtree alone and destroys entries.
//!
//! None of these return errors. Failures are reported to the injected
//! [`Diagnostics`] and the affected node is skipped.

use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::binder::{downcast_binder, Binder, ListenerBinder, NoopBinder};
use crate::click::ClickMultiplexer;
use crate::composite::{Composite, CompositeFactory, CompositeRegistry};
use crate::config::{ClickAction, ConfigNode, COMMON_BINDER, COMMON_KEY};
use crate::diagnostics::Diagnostics;
use crate::dispatch::{MainThread, PostHandle};
use crate::error::BindingError;
use crate::factory::{
    BinderFactory, BinderRegistry, ConfigurationFactory, ConfigurationRegistry, WidgetFactory,
    WidgetRegistry,
};
use crate::registry::EntryRegistry;
use crate::settings::EngineSettings;
use crate::sync::lock;
use crate::tag::TagId;
use crate::widget::{WidgetId, WidgetTree};

/// Keeps configuration trees and widget trees in sync
pub struct BindingEngine {
    entries: EntryRegistry,
    clicks: Arc<ClickMultiplexer>,
    configurations: Arc<dyn ConfigurationFactory>,
    binders: Arc<dyn BinderFactory>,
    widgets: Arc<dyn WidgetFactory>,
    composites: Arc<dyn CompositeFactory>,
    diagnostics: Diagnostics,
    settings: EngineSettings,
    history: Mutex<VecDeque<String>>,
    main_thread: MainThread,
}

impl BindingEngine {
    /// An engine with empty factories and default settings
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BindingEngineBuilder {
        BindingEngineBuilder::default()
    }

    // ------------------------------------------------------------------
    // Bind
    // ------------------------------------------------------------------

    /// Bind `config` to `widget` and remember it as a root
    ///
    /// Returns the bound configuration, or `None` when there was nothing to
    /// bind (dead widget or empty configuration).
    pub fn bind(&self, tree: &mut WidgetTree, widget: WidgetId, config: &Arc<ConfigNode>) -> Option<Arc<ConfigNode>> {
        if !tree.is_alive(widget) {
            self.diagnostics
                .info(format_args!("Cannot bind {} to dead widget {widget}", config.id()));
            return None;
        }
        if !config.is_valid() {
            self.diagnostics
                .info(format_args!("Cannot bind empty configuration to widget {widget}"));
            return None;
        }

        self.record_root(config.id());
        self.configure(tree, widget, config);
        Some(Arc::clone(config))
    }

    /// Bind a copy of `config` that carries `id` instead of its own id
    pub fn bind_with_id(
        &self,
        tree: &mut WidgetTree,
        widget: WidgetId,
        config: &Arc<ConfigNode>,
        id: &str,
    ) -> Option<Arc<ConfigNode>> {
        if !config.is_valid() {
            self.diagnostics
                .info(format_args!("Cannot bind empty configuration as {id}"));
            return None;
        }
        match config.try_clone_with_id(id) {
            Ok(clone) => self.bind(tree, widget, &clone),
            Err(err) => {
                self.diagnostics.error(err);
                None
            }
        }
    }

    /// Convert `object` through the configuration factory and bind the result
    pub fn bind_object<T: Any>(&self, tree: &mut WidgetTree, widget: WidgetId, object: &T) -> Option<Arc<ConfigNode>> {
        let config = self.configuration_for_object(object)?;
        self.bind(tree, widget, &config)
    }

    /// Like [`bind_object`](Self::bind_object) with an id override
    pub fn bind_object_with_id<T: Any>(
        &self,
        tree: &mut WidgetTree,
        widget: WidgetId,
        object: &T,
        id: &str,
    ) -> Option<Arc<ConfigNode>> {
        let config = self.configuration_for_object(object)?;
        self.bind_with_id(tree, widget, &config, id)
    }

    /// Bind a list of objects under a synthetic root
    ///
    /// Every object is converted by the configuration factory and attached
    /// to the root under [`COMMON_KEY`]. The root takes the widget's kind as
    /// its view type and `binder` (or [`COMMON_BINDER`]) as its binder type.
    /// Objects that cannot be converted are skipped.
    pub fn bind_list<T: Any>(
        &self,
        tree: &mut WidgetTree,
        widget: WidgetId,
        objects: &[T],
        binder: Option<&str>,
        id: &str,
    ) -> Option<Arc<ConfigNode>> {
        let Some(kind) = tree.kind(widget).map(str::to_string) else {
            self.diagnostics
                .info(format_args!("Cannot bind list {id} to dead widget {widget}"));
            return None;
        };

        let items: Vec<Arc<ConfigNode>> = objects
            .iter()
            .filter_map(|object| self.configuration_for_object(object))
            .collect();

        let root = match ConfigNode::builder(id, kind)
            .binder_type(binder.unwrap_or(COMMON_BINDER))
            .build()
        {
            Ok(root) => root,
            Err(err) => {
                self.diagnostics.error(err);
                return None;
            }
        };
        if let Err(err) = root.add_children(COMMON_KEY, items) {
            self.diagnostics.error(format_args!("List {id}: {err}"));
        }

        self.bind(tree, widget, &root)
    }

    /// Bind `config` to `widget` without recording it as a root
    ///
    /// Binders use this to bind children they materialize themselves, such
    /// as list rows. Returns whether anything was bound.
    pub fn configure(&self, tree: &mut WidgetTree, widget: WidgetId, config: &Arc<ConfigNode>) -> bool {
        if !tree.is_alive(widget) || !config.is_valid() {
            return false;
        }

        self.tag_widget(tree, widget, config);
        self.build_entries(config);
        self.bind_entry(tree, widget, config);
        self.bind_composite(tree, widget, config);
        self.attach_action(tree, widget, config);
        true
    }

    fn configuration_for_object<T: Any>(&self, object: &T) -> Option<Arc<ConfigNode>> {
        match self.configurations.build(object) {
            Ok(config) if config.is_valid() => Some(config),
            Ok(_) => {
                self.diagnostics.info(format_args!(
                    "Configuration for {} is empty",
                    std::any::type_name::<T>()
                ));
                None
            }
            Err(err) => {
                self.diagnostics
                    .error(format_args!("{err} ({})", std::any::type_name::<T>()));
                None
            }
        }
    }

    fn tag_widget(&self, tree: &mut WidgetTree, widget: WidgetId, config: &ConfigNode) {
        match tree.ensure_tag(widget) {
            Ok(tag) => {
                tag.fill_configuration_id(config.id());
            }
            Err(err) => self.diagnostics.error(err),
        }
    }

    /// Create an entry for every node of the subtree that lacks one
    fn build_entries(&self, root: &Arc<ConfigNode>) {
        let mut queue = VecDeque::from([Arc::clone(root)]);
        while let Some(current) = queue.pop_front() {
            if !current.is_valid() {
                continue;
            }
            self.entries
                .insert_if_absent(&current, || self.make_binder(&current));
            queue.extend(current.children());
        }
    }

    fn make_binder(&self, config: &ConfigNode) -> Arc<dyn Binder> {
        match self.binders.build(config.binder_key()) {
            Ok(binder) => binder,
            Err(err) => {
                self.diagnostics
                    .info(format_args!("{err}; {} gets a no-op binder", config.id()));
                Arc::new(NoopBinder)
            }
        }
    }

    fn bind_entry(&self, tree: &mut WidgetTree, widget: WidgetId, config: &Arc<ConfigNode>) {
        let entry = self.entries.get(config.id());
        if let Err(err) = entry.binder.bind_view(self, tree, config, widget) {
            self.diagnostics
                .error(format_args!("Binding {} to {widget} failed: {err}", config.id()));
        }
    }

    fn composite_of(&self, tree: &WidgetTree, widget: WidgetId) -> Composite {
        match self.composites.build(tree, widget) {
            Ok(composite) => composite,
            Err(BindingError::NoComposite(_)) => Composite::new(),
            Err(err) => {
                self.diagnostics.info(err);
                Composite::new()
            }
        }
    }

    fn bind_composite(&self, tree: &mut WidgetTree, widget: WidgetId, config: &Arc<ConfigNode>) {
        for slot in self.composite_of(tree, widget).into_slots() {
            if !tree.is_alive(slot.widget) {
                continue;
            }
            match config.child_by_key(&slot.key) {
                Some(child) if child.is_valid() => {
                    self.configure(tree, slot.widget, &child);
                }
                _ => {
                    tree.set_visibility(slot.widget, slot.fallback.visibility());
                }
            }
        }
    }

    fn attach_action(&self, tree: &mut WidgetTree, widget: WidgetId, config: &ConfigNode) {
        let Some(action) = config.action() else {
            return;
        };
        let Some(tag_id) = tree.tag(widget).map(|tag| tag.id()) else {
            return;
        };
        self.clicks.subscribe_once(tag_id, action);
        self.install_click_listener(tree, widget, tag_id);
    }

    fn install_click_listener(&self, tree: &mut WidgetTree, widget: WidgetId, tag_id: TagId) {
        let clicks = Arc::clone(&self.clicks);
        tree.set_click_listener(
            widget,
            Some(Arc::new(move || {
                clicks.execute(tag_id);
            })),
        );
    }

    // ------------------------------------------------------------------
    // Unbind
    // ------------------------------------------------------------------

    /// Unbind the configuration recorded in the widget's tag
    ///
    /// Entries survive, so the configuration can be restored later.
    pub fn unbind(&self, tree: &mut WidgetTree, widget: WidgetId) {
        self.unbind_with(tree, widget, None, false);
    }

    /// Unbind `widget`, optionally purging entries and tags on the way
    ///
    /// Without an explicit `config` the one recorded in the widget's tag is
    /// used.
    pub fn unbind_with(&self, tree: &mut WidgetTree, widget: WidgetId, config: Option<&Arc<ConfigNode>>, remove: bool) {
        if !tree.is_alive(widget) {
            self.diagnostics
                .info(format_args!("Cannot unbind dead widget {widget}"));
            return;
        }
        let root = match config {
            Some(config) => Arc::clone(config),
            None => self.configuration_for_widget(tree, widget),
        };
        if !root.is_valid() {
            self.diagnostics
                .info(format_args!("Widget {widget} has no configuration to unbind"));
            self.release_clicks(tree, widget);
            return;
        }

        let mut queue = VecDeque::from([(widget, root)]);
        let mut visited = HashSet::new();

        while let Some((current, node)) = queue.pop_front() {
            if !tree.is_alive(current) || !visited.insert(current) {
                continue;
            }

            let entry = self.entries.get(node.id());
            if let Err(err) = entry.binder.unbind_view(self, tree, &node, current) {
                self.diagnostics
                    .error(format_args!("Unbinding {} from {current} failed: {err}", node.id()));
            }
            if let Some(tag) = tree.tag(current) {
                self.clicks.unsubscribe_all(tag.id());
            }

            // Children declared through the composite
            let mut reached = HashSet::new();
            for slot in self.composite_of(tree, current).into_slots() {
                if let Some(child) = node.child_by_key(&slot.key).filter(|c| c.is_valid()) {
                    reached.insert(slot.widget);
                    queue.push_back((slot.widget, child));
                }
            }

            // Tagged native children the composite does not know about
            for child_widget in tree.children(current) {
                if reached.contains(&child_widget) {
                    continue;
                }
                let child = tree
                    .tag(child_widget)
                    .and_then(|tag| tag.configuration_id())
                    .and_then(|id| node.child_by_id(id));
                if let Some(child) = child {
                    queue.push_back((child_widget, child));
                }
            }

            if remove {
                self.purge(&node);
                tree.clear_tag(current);
                tree.set_click_listener(current, None);
            }
        }
    }

    /// Drop the widget's multiplexed actions and its click listener
    fn release_clicks(&self, tree: &mut WidgetTree, widget: WidgetId) {
        if let Some(tag) = tree.tag(widget) {
            self.clicks.unsubscribe_all(tag.id());
        }
        tree.set_click_listener(widget, None);
    }

    /// Destroy `widget` and its subtree, dropping their click subscriptions
    ///
    /// Entries are kept; use [`remove`](Self::remove) to discard them.
    pub fn destroy_widget(&self, tree: &mut WidgetTree, widget: WidgetId) -> bool {
        if !tree.is_alive(widget) {
            return false;
        }
        let mut queue = VecDeque::from([widget]);
        while let Some(current) = queue.pop_front() {
            if let Some(tag) = tree.tag(current) {
                self.clicks.unsubscribe_all(tag.id());
            }
            queue.extend(tree.children(current));
        }
        tree.destroy(widget)
    }

    // ------------------------------------------------------------------
    // Remove / restore
    // ------------------------------------------------------------------

    /// Destroy the entries of the configuration subtree rooted at `id`
    ///
    /// Each binder's `remove_view` runs first so it can cancel background
    /// work. Removing an unknown id does nothing. Returns the number of
    /// entries destroyed.
    pub fn remove(&self, id: &str) -> usize {
        self.forget_root(id);
        let Some(root) = self.entries.lookup(id) else {
            self.diagnostics.info(format_args!("Nothing to remove for {id}"));
            return 0;
        };

        let mut removed = 0;
        let mut queue = VecDeque::from([root.configuration]);
        while let Some(current) = queue.pop_front() {
            if self.purge(&current) {
                removed += 1;
            }
            queue.extend(current.children());
        }
        removed
    }

    fn purge(&self, config: &Arc<ConfigNode>) -> bool {
        self.forget_root(config.id());
        let Some(entry) = self.entries.remove(config.id()) else {
            return false;
        };
        if let Err(err) = entry.binder.remove_view(self, &entry.configuration) {
            self.diagnostics
                .error(format_args!("Removing {} failed: {err}", config.id()));
        }
        true
    }

    /// Bind the stored configuration `id` to a new widget
    pub fn restore(&self, tree: &mut WidgetTree, widget: WidgetId, id: &str) -> Option<Arc<ConfigNode>> {
        let Some(entry) = self.entries.lookup(id) else {
            self.diagnostics.info(format_args!("Cannot restore unknown id {id}"));
            return None;
        };
        self.bind(tree, widget, &entry.configuration)
    }

    /// Restore the most recently bound root
    pub fn restore_last(&self, tree: &mut WidgetTree, widget: WidgetId) -> Option<Arc<ConfigNode>> {
        let Some(id) = lock(&self.history).back().cloned() else {
            self.diagnostics.info("No root to restore");
            return None;
        };
        self.restore(tree, widget, &id)
    }

    /// Root ids in bind order, most recent last
    #[must_use]
    pub fn root_history(&self) -> Vec<String> {
        lock(&self.history).iter().cloned().collect()
    }

    fn record_root(&self, id: &str) {
        if !self.settings.root_history {
            return;
        }
        let mut history = lock(&self.history);
        history.retain(|known| known != id);
        history.push_back(id.to_string());
        let limit = self.settings.history_limit;
        while limit > 0 && history.len() > limit {
            history.pop_front();
        }
    }

    fn forget_root(&self, id: &str) {
        lock(&self.history).retain(|known| known != id);
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Configuration stored for `id`, or the empty configuration
    #[must_use]
    pub fn configuration_by_id(&self, id: &str) -> Arc<ConfigNode> {
        self.entries.get(id).configuration
    }

    /// Configuration recorded in the widget's tag, or the empty configuration
    #[must_use]
    pub fn configuration_for_widget(&self, tree: &WidgetTree, widget: WidgetId) -> Arc<ConfigNode> {
        match tree.tag(widget).and_then(|tag| tag.configuration_id()) {
            Some(id) => self.configuration_by_id(id),
            None => ConfigNode::empty(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    /// Binder stored for `id`, or the no-op binder
    #[must_use]
    pub fn binder(&self, id: &str) -> Arc<dyn Binder> {
        self.entries.get(id).binder
    }

    /// Binder stored for `id`, if it has type `T`
    #[must_use]
    pub fn binder_as<T: Binder>(&self, id: &str) -> Option<Arc<T>> {
        downcast_binder(self.entries.lookup(id)?.binder)
    }

    #[must_use]
    pub fn binder_for_widget<T: Binder>(&self, tree: &WidgetTree, widget: WidgetId) -> Option<Arc<T>> {
        let id = tree.tag(widget)?.configuration_id()?;
        self.binder_as(id)
    }

    /// Nearest binder of type `T` above the configuration `id`
    ///
    /// A root is its own candidate; other nodes start at their parent.
    #[must_use]
    pub fn ancestor_binder<T: Binder>(&self, id: &str) -> Option<Arc<T>> {
        let entry = self.entries.lookup(id)?;
        if !entry.configuration.has_parent() {
            if let Some(binder) = downcast_binder(entry.binder) {
                return Some(binder);
            }
        }

        let mut parent = entry.configuration.parent();
        while let Some(node) = parent {
            if let Some(binder) = self.binder_as::<T>(node.id()) {
                return Some(binder);
            }
            parent = node.parent();
        }
        None
    }

    #[must_use]
    pub fn ancestor_binder_for_widget<T: Binder>(&self, tree: &WidgetTree, widget: WidgetId) -> Option<Arc<T>> {
        let id = tree.tag(widget)?.configuration_id()?;
        self.ancestor_binder(id)
    }

    /// Shared handle to the entry registry, usable from other threads
    #[must_use]
    pub fn entries(&self) -> EntryRegistry {
        self.entries.clone()
    }

    // ------------------------------------------------------------------
    // Listeners and clicks
    // ------------------------------------------------------------------

    /// Hand `listener` to the binder of `id` if it is a `B`
    pub fn subscribe_listener<B: ListenerBinder>(&self, id: &str, listener: B::Listener) -> bool {
        match self.binder_as::<B>(id) {
            Some(binder) => {
                binder.listener_slot().set(listener);
                true
            }
            None => {
                self.diagnostics
                    .info(format_args!("No listener binder for {id}"));
                false
            }
        }
    }

    /// Take back the listener of the binder of `id`
    pub fn unsubscribe_listener<B: ListenerBinder>(&self, id: &str) -> Option<B::Listener> {
        self.binder_as::<B>(id)?.listener_slot().take()
    }

    /// Subscribe a click action to a widget without binding a configuration
    ///
    /// An untagged widget is tagged without an id.
    pub fn subscribe_click(&self, tree: &mut WidgetTree, widget: WidgetId, action: impl Fn() + Send + Sync + 'static) -> bool {
        let tag_id = match tree.ensure_tag(widget) {
            Ok(tag) => tag.id(),
            Err(err) => {
                self.diagnostics.info(err);
                return false;
            }
        };
        let action: ClickAction = Arc::new(action);
        self.clicks.subscribe(tag_id, action);
        self.install_click_listener(tree, widget, tag_id);
        true
    }

    #[must_use]
    pub fn click_multiplexer(&self) -> Arc<ClickMultiplexer> {
        Arc::clone(&self.clicks)
    }

    // ------------------------------------------------------------------
    // Widgets and dispatch
    // ------------------------------------------------------------------

    /// Build a widget through the widget factory
    pub fn build_widget(&self, tree: &mut WidgetTree, kind: &str) -> Option<WidgetId> {
        match self.widgets.build(tree, kind) {
            Ok(widget) => Some(widget),
            Err(err) => {
                self.diagnostics.info(err);
                None
            }
        }
    }

    /// Handle for posting work back to the main thread
    #[must_use]
    pub fn post_handle(&self) -> PostHandle {
        self.main_thread.handle()
    }

    /// Run every posted callback; returns how many ran
    pub fn run_pending(&self, tree: &mut WidgetTree) -> usize {
        let tasks = self.main_thread.drain();
        let count = tasks.len();
        for task in tasks {
            task(self, tree);
        }
        count
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Default for BindingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingEngine")
            .field("entries", &self.entries.len())
            .field("clicks", &self.clicks.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BindingEngine`]
#[derive(Default)]
#[must_use]
pub struct BindingEngineBuilder {
    configurations: Option<Arc<dyn ConfigurationFactory>>,
    binders: Option<Arc<dyn BinderFactory>>,
    widgets: Option<Arc<dyn WidgetFactory>>,
    composites: Option<Arc<dyn CompositeFactory>>,
    diagnostics: Option<Diagnostics>,
    settings: EngineSettings,
}

impl BindingEngineBuilder {
    pub fn configuration_factory(mut self, factory: impl ConfigurationFactory + 'static) -> Self {
        self.configurations = Some(Arc::new(factory));
        self
    }

    pub fn binder_factory(mut self, factory: impl BinderFactory + 'static) -> Self {
        self.binders = Some(Arc::new(factory));
        self
    }

    pub fn widget_factory(mut self, factory: impl WidgetFactory + 'static) -> Self {
        self.widgets = Some(Arc::new(factory));
        self
    }

    pub fn composite_factory(mut self, factory: impl CompositeFactory + 'static) -> Self {
        self.composites = Some(Arc::new(factory));
        self
    }

    /// Diagnostics sink; defaults to one at the settings' log level
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn build(self) -> BindingEngine {
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Diagnostics::new(self.settings.log_level));
        BindingEngine {
            entries: EntryRegistry::new(),
            clicks: Arc::new(ClickMultiplexer::new()),
            configurations: self
                .configurations
                .unwrap_or_else(|| Arc::new(ConfigurationRegistry::new())),
            binders: self.binders.unwrap_or_else(|| Arc::new(BinderRegistry::new())),
            widgets: self.widgets.unwrap_or_else(|| Arc::new(WidgetRegistry::new())),
            composites: self
                .composites
                .unwrap_or_else(|| Arc::new(CompositeRegistry::new())),
            diagnostics,
            settings: self.settings,
            history: Mutex::new(VecDeque::new()),
            main_thread: MainThread::new(),
        }
    }
}
