//! Binder strategies
//!
//! A binder moves data from a configuration node onto a widget. One binder
//! instance is created per configuration id and lives in the entry registry
//! until the id is removed, so binders take `&self` and keep any state of
//! their own behind interior mutability.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::config::ConfigNode;
use crate::engine::BindingEngine;
use crate::error::BindingResult;
use crate::sync::lock;
use crate::widget::{WidgetId, WidgetTree};

/// Upcast to `Arc<dyn Any>` so shared binders can be downcast to their
/// concrete type.
pub trait AsAnyArc: Any + Send + Sync {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Binds one kind of configuration to one kind of widget
pub trait Binder: AsAnyArc {
    /// Push the configuration's data onto the widget
    fn bind_view(
        &self,
        engine: &BindingEngine,
        tree: &mut WidgetTree,
        config: &Arc<ConfigNode>,
        widget: WidgetId,
    ) -> BindingResult<()>;

    /// Detach the configuration from the widget
    ///
    /// The binder keeps its state; the same configuration may be bound again.
    fn unbind_view(
        &self,
        _engine: &BindingEngine,
        _tree: &mut WidgetTree,
        _config: &Arc<ConfigNode>,
        _widget: WidgetId,
    ) -> BindingResult<()> {
        Ok(())
    }

    /// The configuration is being discarded for good
    ///
    /// Must synchronously request cancellation of any background work the
    /// binder started.
    fn remove_view(&self, _engine: &BindingEngine, _config: &Arc<ConfigNode>) -> BindingResult<()> {
        Ok(())
    }
}

/// Downcast a shared binder to its concrete type
pub(crate) fn downcast_binder<T: Binder>(binder: Arc<dyn Binder>) -> Option<Arc<T>> {
    binder.as_any_arc().downcast::<T>().ok()
}

/// Binder that does nothing; used when no binder is registered
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBinder;

impl Binder for NoopBinder {
    fn bind_view(
        &self,
        _engine: &BindingEngine,
        _tree: &mut WidgetTree,
        _config: &Arc<ConfigNode>,
        _widget: WidgetId,
    ) -> BindingResult<()> {
        Ok(())
    }
}

/// Holder for a single listener owned by a binder
pub struct ListenerSlot<L> {
    listener: Mutex<Option<L>>,
}

impl<L> ListenerSlot<L> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listener: Mutex::new(None),
        }
    }

    /// Install a listener, returning the previous one
    pub fn set(&self, listener: L) -> Option<L> {
        lock(&self.listener).replace(listener)
    }

    pub fn take(&self) -> Option<L> {
        lock(&self.listener).take()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        lock(&self.listener).is_some()
    }

    /// Run `f` against the listener, if one is installed
    pub fn with<R>(&self, f: impl FnOnce(&L) -> R) -> Option<R> {
        lock(&self.listener).as_ref().map(f)
    }
}

impl<L: Clone> ListenerSlot<L> {
    #[must_use]
    pub fn get(&self) -> Option<L> {
        lock(&self.listener).clone()
    }
}

impl<L> Default for ListenerSlot<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for ListenerSlot<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot").field("set", &self.is_set()).finish()
    }
}

/// A binder that reports events to one external listener
pub trait ListenerBinder: Binder {
    type Listener: Send + 'static;

    fn listener_slot(&self) -> &ListenerSlot<Self::Listener>;
}
