//! Integration tests for binding through composite slots

mod common;

use bindery_core::{ConfigNode, ParamValue, Visibility};
use common::{card_config, Harness};

#[test]
fn test_card_title_scenario() {
    let mut h = Harness::new();
    let card = h.widget("Card");
    let title = h.slot(card, "title");
    let subtitle = h.slot(card, "subtitle");

    h.engine.bind(&mut h.tree, card, &card_config()).unwrap();

    let calls = h.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].id, "root");
    assert_eq!(calls[1].id, "c1");
    assert_eq!(calls[1].widget, Some(title));
    assert_eq!(calls[1].params.get("text"), Some(&ParamValue::from("Hi")));

    assert!(h.tree.tag(subtitle).is_none());
    assert!(h.tree.prop(subtitle, "text").is_none());
}

#[test]
fn test_missing_children_take_their_fallback() {
    let mut h = Harness::new();
    let card = h.widget("Card");
    for slot in ["title", "subtitle", "footer"] {
        let widget = h.slot(card, slot);
        h.tree.set_visibility(widget, Visibility::Invisible);
    }

    h.engine
        .bind(&mut h.tree, card, &ConfigNode::new("bare", "Card"))
        .unwrap();

    assert_eq!(h.tree.visibility(h.slot(card, "title")), Some(Visibility::Gone));
    assert_eq!(h.tree.visibility(h.slot(card, "subtitle")), Some(Visibility::Invisible));
    assert_eq!(h.tree.visibility(h.slot(card, "footer")), Some(Visibility::Visible));
}

#[test]
fn test_children_under_other_keys_do_not_fill_slots() {
    let mut h = Harness::new();
    let card = h.widget("Card");
    let config = ConfigNode::builder("root", "Card")
        .child("badge", ConfigNode::new("b", "Text"))
        .build()
        .unwrap();

    h.engine.bind(&mut h.tree, card, &config).unwrap();

    assert_eq!(h.ids_for("bind"), vec!["root"]);
    assert_eq!(h.tree.visibility(h.slot(card, "title")), Some(Visibility::Gone));
    // The unmatched child still gets an entry so it can be looked up later
    assert!(h.engine.contains("b"));
}

#[test]
fn test_slots_bind_in_declaration_order() {
    let mut h = Harness::new();
    let outer = h.widget("Card");
    let config = ConfigNode::builder("outer", "Card")
        .child(
            "title",
            ConfigNode::builder("t", "Text").param("text", "Outer").build().unwrap(),
        )
        .child("footer", ConfigNode::builder("f", "Text").param("text", "End").build().unwrap())
        .build()
        .unwrap();

    h.engine.bind(&mut h.tree, outer, &config).unwrap();

    assert_eq!(h.ids_for("bind"), vec!["outer", "t", "f"]);
    let footer = h.slot(outer, "footer");
    assert_eq!(h.tree.prop(footer, "text"), Some(&ParamValue::from("End")));
    assert_eq!(h.tree.visibility(h.slot(outer, "subtitle")), Some(Visibility::Invisible));

    h.engine.unbind(&mut h.tree, outer);
    assert_eq!(h.ids_for("unbind"), vec!["outer", "t", "f"]);
    assert!(h.tree.prop(footer, "text").is_none());
}
