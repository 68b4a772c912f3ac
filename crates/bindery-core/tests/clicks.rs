//! Integration tests for multiplexed click handling

mod common;

use std::sync::{Arc, Mutex};

use bindery_core::ConfigNode;
use common::Harness;

type Log = Arc<Mutex<Vec<&'static str>>>;

fn push(log: &Log, label: &'static str) -> impl Fn() + Send + Sync + 'static {
    let log = Arc::clone(log);
    move || log.lock().unwrap().push(label)
}

#[test]
fn test_two_subscribers_fire_in_order() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    let config = ConfigNode::builder("t", "Text").action(push(&log, "config")).build().unwrap();

    h.engine.bind(&mut h.tree, widget, &config).unwrap();
    assert!(h.engine.subscribe_click(&mut h.tree, widget, push(&log, "extra")));

    assert!(h.tree.click(widget));
    assert_eq!(*log.lock().unwrap(), vec!["config", "extra"]);
}

#[test]
fn test_unbind_unsubscribes_everything() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    let config = ConfigNode::builder("t", "Text").action(push(&log, "config")).build().unwrap();
    h.engine.bind(&mut h.tree, widget, &config).unwrap();
    h.engine.subscribe_click(&mut h.tree, widget, push(&log, "extra"));

    h.engine.unbind(&mut h.tree, widget);
    h.tree.click(widget);
    assert!(log.lock().unwrap().is_empty());

    // Binding again brings the configured action back
    h.engine.bind(&mut h.tree, widget, &config).unwrap();
    h.tree.click(widget);
    assert_eq!(*log.lock().unwrap(), vec!["config"]);
}

#[test]
fn test_actions_on_composite_slots() {
    let mut h = Harness::new();
    let card = h.widget("Card");
    let log: Log = Arc::default();
    let config = ConfigNode::builder("root", "Card")
        .action(push(&log, "card"))
        .child(
            "footer",
            ConfigNode::builder("f", "Text").action(push(&log, "footer")).build().unwrap(),
        )
        .build()
        .unwrap();

    h.engine.bind(&mut h.tree, card, &config).unwrap();

    h.tree.click(h.slot(card, "footer"));
    assert_eq!(*log.lock().unwrap(), vec!["footer"]);
    h.tree.click(card);
    assert_eq!(*log.lock().unwrap(), vec!["footer", "card"]);
    assert!(!h.tree.click(h.slot(card, "title")));
}

#[test]
fn test_remove_drops_the_listener() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    let config = ConfigNode::builder("t", "Text").action(push(&log, "config")).build().unwrap();
    h.engine.bind(&mut h.tree, widget, &config).unwrap();

    h.engine.unbind_with(&mut h.tree, widget, None, true);
    assert!(!h.tree.click(widget));
    assert!(h.engine.click_multiplexer().is_empty());
}

#[test]
fn test_action_edits_are_seen_on_next_bind() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    let config = ConfigNode::new("t", "Text");

    h.engine.bind(&mut h.tree, widget, &config).unwrap();
    assert!(!h.tree.click(widget));

    config.set_action(push(&log, "late"));
    h.engine.bind(&mut h.tree, widget, &config).unwrap();
    h.tree.click(widget);
    assert_eq!(*log.lock().unwrap(), vec!["late"]);
}

#[test]
fn test_unbind_after_remove_drops_actions() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    let config = ConfigNode::builder("t", "Text").action(push(&log, "config")).build().unwrap();
    h.engine.bind(&mut h.tree, widget, &config).unwrap();

    h.engine.remove("t");
    h.engine.unbind(&mut h.tree, widget);

    assert!(!h.tree.click(widget));
    assert!(log.lock().unwrap().is_empty());
    assert!(h.engine.click_multiplexer().is_empty());
}

#[test]
fn test_unbind_releases_action_only_widgets() {
    let mut h = Harness::new();
    let widget = h.widget("Text");
    let log: Log = Arc::default();
    assert!(h.engine.subscribe_click(&mut h.tree, widget, push(&log, "extra")));

    h.engine.unbind(&mut h.tree, widget);
    assert!(!h.tree.click(widget));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_destroyed_widgets_release_their_actions() {
    let mut h = Harness::new();
    let log: Log = Arc::default();

    for round in 0..20 {
        let card = h.widget("Card");
        let id = format!("card-{round}");
        let config = ConfigNode::builder(id.clone(), "Card")
            .action(push(&log, "card"))
            .child(
                "footer",
                ConfigNode::builder(format!("{id}-footer"), "Text")
                    .action(push(&log, "footer"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        h.engine.bind(&mut h.tree, card, &config).unwrap();
        assert_eq!(h.engine.click_multiplexer().len(), 2);

        assert!(h.engine.destroy_widget(&mut h.tree, card));
        assert!(!h.engine.destroy_widget(&mut h.tree, card));
        h.engine.remove(&id);
    }

    assert!(h.tree.is_empty());
    assert!(h.engine.entries().is_empty());
    assert!(h.engine.click_multiplexer().is_empty());
}
