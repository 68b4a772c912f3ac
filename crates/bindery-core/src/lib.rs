//! Bindery Core - binding engine for configuration trees and widget trees
//!
//! This crate keeps a tree of immutable-by-convention configuration nodes in
//! sync with a live tree of stateful widgets. Binding happens in three phases:
//!
//! 1. **bind** - tag the widget, create entries for the configuration subtree,
//!    run the binders and propagate into composite slots.
//! 2. **unbind** - detach data and click actions; entries survive so the tree
//!    can be restored onto a new widget later.
//! 3. **remove** - destroy the entries of a configuration subtree and let
//!    binders cancel any background work they started.
//!
//! # Core Components
//!
//! - [`BindingEngine`]: Orchestrates bind / unbind / remove / restore
//! - [`ConfigNode`]: Configuration tree node with typed parameters
//! - [`EntryRegistry`]: Configuration id to (configuration, binder) entries
//! - [`WidgetTree`]: Arena of widgets; each slot carries its [`WidgetTag`]
//! - [`ClickMultiplexer`]: Several independent click actions per widget
//! - [`CompositeRegistry`]: Named sub-widget slots per widget kind
//! - [`MainThread`]: Queue for work posted back from background threads

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for binding operations
pub mod error;

/// Typed parameter values
pub mod value;

/// Configuration tree
pub mod config;

/// Serializable configuration documents
pub mod document;

/// Widget arena
pub mod widget;

/// Widget tags and their lifecycle
pub mod tag;

/// Click multiplexing
pub mod click;

/// Composite adapters and visibility fallbacks
pub mod composite;

/// Binder strategies
pub mod binder;

/// Factories and their dispatch tables
pub mod factory;

/// Entry registry
pub mod registry;

/// Main-thread dispatch
pub mod dispatch;

/// Diagnostics sink
pub mod diagnostics;

/// Engine settings
pub mod settings;

/// The binding engine
pub mod engine;

mod sync;

// Re-exports for convenience
pub use binder::{Binder, ListenerBinder, ListenerSlot, NoopBinder};
pub use click::ClickMultiplexer;
pub use composite::{Composite, CompositeFactory, CompositeRegistry, CompositeSlot, Fallback};
pub use config::{derive_id, ClickAction, ConfigNode, ConfigNodeBuilder, COMMON_BINDER, COMMON_KEY, EMPTY_ID};
pub use diagnostics::{Diagnostics, LogLevel};
pub use dispatch::{MainThread, PostHandle};
pub use document::ConfigDocument;
pub use engine::{BindingEngine, BindingEngineBuilder};
pub use error::{BindingError, BindingResult};
pub use factory::{
    BinderFactory, BinderRegistry, ConfigurationFactory, ConfigurationRegistry, WidgetFactory,
    WidgetRegistry,
};
pub use registry::{Entry, EntryRegistry};
pub use settings::EngineSettings;
pub use tag::{TagId, TagState, WidgetTag};
pub use value::ParamValue;
pub use widget::{ClickListener, Visibility, WidgetId, WidgetTree};
