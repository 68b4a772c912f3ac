//! Demonstration widgets and binders for the `bindery` command.
//!
//! Four widget kinds are available to documents:
//!
//! - `Text`: shows the `text` param
//! - `Checkbox`: shows `label` and `checked`
//! - `Card`: composite with `title` and `subtitle` slots
//! - `List`: inflates one row per child configuration
//!
//! A node's `on_click` param becomes its click action; firing it records the
//! message in [`Session::clicked`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use bindery_core::{
    Binder, BinderRegistry, BindingEngine, BindingError, BindingResult, CompositeRegistry, ConfigDocument,
    ConfigNode, EngineSettings, Fallback, WidgetId, WidgetRegistry, WidgetTree, COMMON_BINDER,
};

#[derive(Debug, Default)]
struct TextBinder;

impl Binder for TextBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.expect_kind(widget, "Text")?;
        tree.set_prop(widget, "text", config.string_param_or("text", ""));
        if let Some(size) = config.int_param("size") {
            tree.set_prop(widget, "size", size);
        }
        Ok(())
    }

    fn unbind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        _config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.clear_prop(widget, "text");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CheckboxBinder;

impl Binder for CheckboxBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.expect_kind(widget, "Checkbox")?;
        tree.set_prop(widget, "label", config.string_param_or("label", ""));
        tree.set_prop(widget, "checked", config.bool_param_or("checked", false));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CardBinder;

impl Binder for CardBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.expect_kind(widget, "Card")?;
        tree.set_prop(widget, "elevation", config.int_param_or("elevation", 1));
        Ok(())
    }
}

/// Inflates a row per child and binds it; rows are reused on rebind
#[derive(Debug, Default)]
struct ListBinder;

impl Binder for ListBinder {
    fn bind_view(
        &self,
        engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()> {
        tree.expect_kind(widget, "List")?;
        let rows = tree.children(widget);
        for (index, item) in config.children().iter().enumerate() {
            let row = if let Some(row) = rows.get(index) {
                *row
            } else {
                let row = engine
                    .build_widget(tree, item.view_type())
                    .ok_or_else(|| BindingError::UnknownWidgetType(item.view_type().to_string()))?;
                tree.append_child(widget, row)?;
                row
            };
            engine.configure(tree, row, item);
        }
        tree.set_prop(widget, "rows", i64::try_from(config.child_count()).unwrap_or(i64::MAX));
        Ok(())
    }
}

fn binders() -> BinderRegistry {
    let mut binders = BinderRegistry::new();
    binders
        .register_default::<TextBinder>("Text")
        .register_default::<CheckboxBinder>("Checkbox")
        .register_default::<CardBinder>("Card")
        .register_default::<ListBinder>("List")
        .register_default::<ListBinder>(COMMON_BINDER);
    binders
}

fn widgets() -> WidgetRegistry {
    let mut widgets = WidgetRegistry::new();
    widgets
        .register_plain("Text")
        .register_plain("Checkbox")
        .register_plain("List")
        .register("Card", |tree| {
            let card = tree.create("Card");
            for slot in ["title", "subtitle"] {
                let text = tree.create_named("Text", slot);
                let _ = tree.append_child(card, text);
            }
            card
        });
    widgets
}

fn composites() -> CompositeRegistry {
    let mut composites = CompositeRegistry::new();
    composites.register_named("Card", &[("title", Fallback::Gone), ("subtitle", Fallback::Invisible)]);
    composites
}

/// A bound document: engine, widget tree and the root widget
pub struct Session {
    pub engine: BindingEngine,
    pub tree: WidgetTree,
    pub root: WidgetId,
    clicked: Arc<Mutex<Vec<String>>>,
}

impl Session {
    /// Build the configuration tree, materialize the root widget and bind
    pub fn open(document: &ConfigDocument, settings: EngineSettings) -> Result<Self> {
        let config = document.build().context("Failed to build configuration tree")?;
        let clicked = Arc::new(Mutex::new(Vec::new()));
        install_click_actions(&config, &clicked);

        let engine = BindingEngine::builder()
            .binder_factory(binders())
            .widget_factory(widgets())
            .composite_factory(composites())
            .settings(settings)
            .build();

        let mut tree = WidgetTree::new();
        let root = engine
            .build_widget(&mut tree, config.view_type())
            .with_context(|| format!("No widget kind `{}`", config.view_type()))?;
        engine
            .bind(&mut tree, root, &config)
            .with_context(|| format!("Nothing was bound for `{}`", config.id()))?;
        tracing::debug!(id = config.id(), widgets = tree.len(), "bound document");

        Ok(Self {
            engine,
            tree,
            root,
            clicked,
        })
    }

    /// Find a widget by name or by the id of the configuration bound to it
    pub fn find(&self, needle: &str) -> Option<WidgetId> {
        let mut queue = VecDeque::from([self.root]);
        while let Some(widget) = queue.pop_front() {
            let tagged = self.tree.tag(widget).and_then(|tag| tag.configuration_id());
            if self.tree.name(widget) == Some(needle) || tagged == Some(needle) {
                return Some(widget);
            }
            queue.extend(self.tree.children(widget));
        }
        None
    }

    /// Messages recorded by fired click actions, oldest first
    pub fn clicked(&self) -> Vec<String> {
        self.clicked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Turn every `on_click` param in the tree into a click action
fn install_click_actions(root: &Arc<ConfigNode>, clicked: &Arc<Mutex<Vec<String>>>) {
    let mut queue = VecDeque::from([Arc::clone(root)]);
    while let Some(node) = queue.pop_front() {
        if let Some(message) = node.string_param("on_click") {
            let clicked = Arc::clone(clicked);
            node.set_action(move || {
                clicked
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.clone());
            });
        }
        queue.extend(node.children());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{ParamValue, Visibility};

    const PROFILE: &str = r#"
id = "profile"
view = "Card"
params = { elevation = 3 }

[[children]]
id = "name"
key = "title"
view = "Text"
params = { text = "Ada Lovelace", on_click = "name tapped" }
"#;

    fn open(source: &str) -> Session {
        let document = ConfigDocument::from_toml_str(source).unwrap();
        Session::open(&document, EngineSettings::default()).unwrap()
    }

    #[test]
    fn test_card_document_binds_title_slot() {
        let session = open(PROFILE);
        let title = session.find("title").unwrap();

        assert_eq!(session.tree.prop(title, "text"), Some(&ParamValue::from("Ada Lovelace")));
        assert_eq!(session.tree.prop(session.root, "elevation"), Some(&ParamValue::Int(3)));
        let subtitle = session.find("subtitle").unwrap();
        assert_eq!(session.tree.visibility(subtitle), Some(Visibility::Invisible));
    }

    #[test]
    fn test_on_click_param_becomes_action() {
        let session = open(PROFILE);
        let title = session.find("name").unwrap();
        assert!(session.tree.click(title));
        assert_eq!(session.clicked(), vec!["name tapped"]);
    }

    #[test]
    fn test_list_document_inflates_rows() {
        let session = open(
            r#"
id = "todo"
view = "List"

[[children]]
key = "item"
view = "Checkbox"
params = { label = "Write tests", checked = "true" }

[[children]]
key = "item"
view = "Text"
params = { text = "Ship it" }
"#,
        );
        let rows = session.tree.children(session.root);
        assert_eq!(rows.len(), 2);
        assert_eq!(session.tree.prop(rows[0], "checked"), Some(&ParamValue::Bool(true)));
        assert_eq!(session.tree.prop(session.root, "rows"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn test_unknown_root_kind_is_an_error() {
        let document = ConfigDocument::from_toml_str("id = \"x\"\nview = \"Slider\"").unwrap();
        assert!(Session::open(&document, EngineSettings::default()).is_err());
    }
}
