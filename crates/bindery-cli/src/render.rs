//! Plain-text rendering of a widget tree

use std::fmt::Write;

use bindery_core::{TagState, Visibility, WidgetId, WidgetTree};

/// Render `root` and its descendants, one widget per line
pub fn render(tree: &WidgetTree, root: WidgetId) -> String {
    let mut out = String::new();
    render_into(tree, root, 0, &mut out);
    out
}

fn render_into(tree: &WidgetTree, widget: WidgetId, depth: usize, out: &mut String) {
    let Some(kind) = tree.kind(widget) else {
        return;
    };

    let _ = write!(out, "{:indent$}{kind}", "", indent = depth * 2);
    if let Some(name) = tree.name(widget) {
        let _ = write!(out, " \"{name}\"");
    }

    match tree.tag_state(widget) {
        TagState::Bound => {
            let id = tree.tag(widget).and_then(|tag| tag.configuration_id()).unwrap_or_default();
            let _ = write!(out, " <{id}>");
        }
        TagState::Idless => out.push_str(" <->"),
        TagState::Untagged => {}
    }

    if let Some(props) = tree.props(widget) {
        for (key, value) in props {
            let _ = write!(out, " {key}={value}");
        }
    }

    match tree.visibility(widget) {
        Some(Visibility::Invisible) => out.push_str(" [invisible]"),
        Some(Visibility::Gone) => out.push_str(" [gone]"),
        _ => {}
    }
    if tree.has_click_listener(widget) {
        out.push_str(" (clickable)");
    }
    out.push('\n');

    for child in tree.children(widget) {
        render_into(tree, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shows_hierarchy_and_state() {
        let mut tree = WidgetTree::new();
        let card = tree.create("Card");
        let title = tree.create_named("Text", "title");
        tree.append_child(card, title).unwrap();
        tree.set_prop(title, "text", "Hi");
        tree.set_visibility(title, Visibility::Gone);
        tree.ensure_tag(card).unwrap().fill_configuration_id("root");

        assert_eq!(render(&tree, card), "Card <root>\n  Text \"title\" text=Hi [gone]\n");
    }
}
