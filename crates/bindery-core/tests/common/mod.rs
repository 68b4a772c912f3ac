//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bindery_core::{
    derive_id, Binder, BinderRegistry, BindingEngine, BindingError, BindingResult, CompositeRegistry,
    ConfigNode, ConfigurationRegistry, Diagnostics, EngineSettings, Fallback, ListenerBinder,
    ListenerSlot, LogLevel, ParamValue, WidgetId, WidgetRegistry, WidgetTree, COMMON_BINDER,
    COMMON_KEY,
};
use indexmap::IndexMap;

/// One binder invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub id: String,
    pub widget: Option<WidgetId>,
    pub params: IndexMap<String, ParamValue>,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

fn record(log: &CallLog, op: &'static str, config: &ConfigNode, widget: Option<WidgetId>) {
    log.lock().unwrap().push(Call {
        op,
        id: config.id().to_string(),
        widget,
        params: config.params(),
    });
}

/// Records every call; copies the `text` param onto the widget
pub struct RecordingBinder {
    log: CallLog,
    kind: Option<&'static str>,
    cancelled: AtomicBool,
}

impl RecordingBinder {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            kind: None,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Only accepts widgets of `kind`
    pub fn for_kind(log: CallLog, kind: &'static str) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(log)
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Binder for RecordingBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        if let Some(kind) = self.kind {
            tree.expect_kind(widget, kind)?;
        }
        record(&self.log, "bind", config, Some(widget));
        if let Some(text) = config.string_param("text") {
            tree.set_prop(widget, "text", text);
        }
        Ok(())
    }

    fn unbind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        record(&self.log, "unbind", config, Some(widget));
        tree.clear_prop(widget, "text");
        Ok(())
    }

    fn remove_view(&self, _engine: &BindingEngine, config: &Arc<ConfigNode>) -> BindingResult<()> {
        record(&self.log, "remove", config, None);
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Inflates one native child per list item and binds it
pub struct ListBinder {
    log: CallLog,
}

impl Binder for ListBinder {
    fn bind_view(
        &self,
        engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        record(&self.log, "bind", config, Some(widget));
        let rows = tree.children(widget);
        for (index, item) in config.children_with_key(COMMON_KEY).iter().enumerate() {
            let row = match rows.get(index) {
                Some(row) => *row,
                None => {
                    let row = engine
                        .build_widget(tree, item.view_type())
                        .ok_or_else(|| BindingError::UnknownWidgetType(item.view_type().to_string()))?;
                    tree.append_child(widget, row)?;
                    row
                }
            };
            engine.configure(tree, row, item);
        }
        Ok(())
    }
}

pub type ToggleListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Reports the `checked` param to its listener on every bind
#[derive(Default)]
pub struct ToggleBinder {
    listener: ListenerSlot<ToggleListener>,
}

impl Binder for ToggleBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.expect_kind(widget, "Toggle")?;
        let checked = config.bool_param_or("checked", false);
        tree.set_prop(widget, "checked", checked);
        self.listener.with(|listener| listener(checked));
        Ok(())
    }
}

impl ListenerBinder for ToggleBinder {
    type Listener = ToggleListener;

    fn listener_slot(&self) -> &ListenerSlot<ToggleListener> {
        &self.listener
    }
}

/// Raw object turned into a `Text` configuration by the configuration factory
#[derive(Debug, Clone)]
pub struct Contact {
    pub name: String,
}

impl Contact {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

/// Engine plus tree plus recorded calls and diagnostics
pub struct Harness {
    pub engine: BindingEngine,
    pub tree: WidgetTree,
    pub calls: CallLog,
    pub messages: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let calls: CallLog = Arc::default();
        let messages: Arc<Mutex<Vec<(LogLevel, String)>>> = Arc::default();

        let mut binders = BinderRegistry::new();
        {
            let log = Arc::clone(&calls);
            binders.register("Text", move || RecordingBinder::for_kind(Arc::clone(&log), "Text"));
        }
        {
            let log = Arc::clone(&calls);
            binders.register("Card", move || RecordingBinder::new(Arc::clone(&log)));
        }
        for name in ["List", COMMON_BINDER] {
            let log = Arc::clone(&calls);
            binders.register(name, move || ListBinder { log: Arc::clone(&log) });
        }
        binders.register_default::<ToggleBinder>("Toggle");

        let mut configurations = ConfigurationRegistry::new();
        configurations.register::<Contact, _>(|contact| {
            let node = ConfigNode::new(derive_id(&contact.name), "Text");
            node.put_param("text", contact.name.clone());
            node
        });

        let mut composites = CompositeRegistry::new();
        composites.register_named(
            "Card",
            &[
                ("title", Fallback::Gone),
                ("subtitle", Fallback::Invisible),
                ("footer", Fallback::Visible),
            ],
        );

        let mut widgets = WidgetRegistry::new();
        widgets.register_plain("Text").register_plain("Toggle").register_plain("List");
        widgets.register("Card", |tree| {
            let card = tree.create("Card");
            for slot in ["title", "subtitle", "footer"] {
                let child = tree.create_named("Text", slot);
                let _ = tree.append_child(card, child);
            }
            card
        });

        let sink = Arc::clone(&messages);
        let diagnostics = Diagnostics::new(LogLevel::Info)
            .with_sink(move |level, message| sink.lock().unwrap().push((level, message.to_string())));

        let engine = BindingEngine::builder()
            .configuration_factory(configurations)
            .binder_factory(binders)
            .composite_factory(composites)
            .widget_factory(widgets)
            .diagnostics(diagnostics)
            .settings(settings)
            .build();

        Self {
            engine,
            tree: WidgetTree::new(),
            calls,
            messages,
        }
    }

    pub fn widget(&mut self, kind: &str) -> WidgetId {
        self.engine.build_widget(&mut self.tree, kind).unwrap()
    }

    pub fn slot(&self, root: WidgetId, name: &str) -> WidgetId {
        self.tree.find_by_name(root, name).unwrap()
    }

    /// Ids passed to the binders for `op`, in call order
    pub fn ids_for(&self, op: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.op == op)
            .map(|call| call.id.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

/// `root: Card` with a single `title: Text` child
pub fn card_config() -> Arc<ConfigNode> {
    ConfigNode::builder("root", "Card")
        .child(
            "title",
            ConfigNode::builder("c1", "Text").param("text", "Hi").build().unwrap(),
        )
        .build()
        .unwrap()
}

/// A list root with `n` text items
pub fn list_config(id: &str, n: usize) -> Arc<ConfigNode> {
    let items = (0..n).map(|i| {
        ConfigNode::builder(format!("{id}-item-{i}"), "Text")
            .param("text", format!("row {i}"))
            .build()
            .unwrap()
    });
    ConfigNode::builder(id, "List").children(COMMON_KEY, items).build().unwrap()
}
