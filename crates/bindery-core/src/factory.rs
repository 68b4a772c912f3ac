//! Factories consumed by the engine
//!
//! Each factory is a trait so hosts can plug in their own, and each has a
//! registry implementation: a dispatch table filled once at startup and keyed
//! by type name or [`TypeId`].

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::binder::Binder;
use crate::config::ConfigNode;
use crate::error::{BindingError, BindingResult};
use crate::widget::{WidgetId, WidgetTree};

/// Converts raw objects into configuration trees
pub trait ConfigurationFactory: Send + Sync {
    fn build(&self, object: &dyn Any) -> BindingResult<Arc<ConfigNode>>;
}

/// Builds a binder for a binder type name
pub trait BinderFactory: Send + Sync {
    fn build(&self, type_name: &str) -> BindingResult<Arc<dyn Binder>>;
}

/// Materializes widgets by kind
pub trait WidgetFactory: Send + Sync {
    fn build(&self, tree: &mut WidgetTree, kind: &str) -> BindingResult<WidgetId>;
}

type Converter = Arc<dyn Fn(&dyn Any) -> Option<Arc<ConfigNode>> + Send + Sync>;

/// Converters keyed by the source object's type
#[derive(Default, Clone)]
pub struct ConfigurationRegistry {
    converters: IndexMap<TypeId, (&'static str, Converter)>,
}

impl ConfigurationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the conversion for objects of type `T`
    pub fn register<T, F>(&mut self, convert: F) -> &mut Self
    where
        T: Any,
        F: Fn(&T) -> Arc<ConfigNode> + Send + Sync + 'static,
    {
        let converter: Converter = Arc::new(move |object: &dyn Any| object.downcast_ref::<T>().map(&convert));
        self.converters
            .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), converter));
        self
    }

    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }
}

impl ConfigurationFactory for ConfigurationRegistry {
    fn build(&self, object: &dyn Any) -> BindingResult<Arc<ConfigNode>> {
        let type_id = object.type_id();
        let (name, converter) = self
            .converters
            .get(&type_id)
            .ok_or_else(|| BindingError::UnregisteredObjectType(format!("{type_id:?}")))?;
        converter(object).ok_or_else(|| BindingError::UnregisteredObjectType((*name).to_string()))
    }
}

impl fmt::Debug for ConfigurationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationRegistry")
            .field("types", &self.converters.values().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}

type BinderCtor = Arc<dyn Fn() -> Arc<dyn Binder> + Send + Sync>;

/// Binder constructors keyed by binder type name
#[derive(Default, Clone)]
pub struct BinderRegistry {
    ctors: IndexMap<String, BinderCtor>,
}

impl BinderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<B, F>(&mut self, type_name: impl Into<String>, ctor: F) -> &mut Self
    where
        B: Binder,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.ctors
            .insert(type_name.into(), Arc::new(move || Arc::new(ctor()) as Arc<dyn Binder>));
        self
    }

    pub fn register_default<B: Binder + Default>(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.register(type_name, B::default)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.ctors.contains_key(type_name)
    }
}

impl BinderFactory for BinderRegistry {
    fn build(&self, type_name: &str) -> BindingResult<Arc<dyn Binder>> {
        self.ctors
            .get(type_name)
            .map(|ctor| ctor())
            .ok_or_else(|| BindingError::UnknownBinderType(type_name.to_string()))
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("types", &self.ctors.keys().collect::<Vec<_>>())
            .finish()
    }
}

type WidgetBuilder = Arc<dyn Fn(&mut WidgetTree) -> WidgetId + Send + Sync>;

/// Widget builders keyed by kind
#[derive(Default, Clone)]
pub struct WidgetRegistry {
    builders: IndexMap<String, WidgetBuilder>,
}

impl WidgetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder that may assemble a whole sub-tree
    pub fn register<F>(&mut self, kind: impl Into<String>, build: F) -> &mut Self
    where
        F: Fn(&mut WidgetTree) -> WidgetId + Send + Sync + 'static,
    {
        self.builders.insert(kind.into(), Arc::new(build));
        self
    }

    /// Register a kind that builds a single bare widget
    pub fn register_plain(&mut self, kind: impl Into<String>) -> &mut Self {
        let kind = kind.into();
        let name = kind.clone();
        self.register(kind, move |tree| tree.create(name.clone()))
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }
}

impl WidgetFactory for WidgetRegistry {
    fn build(&self, tree: &mut WidgetTree, kind: &str) -> BindingResult<WidgetId> {
        let build = self
            .builders
            .get(kind)
            .ok_or_else(|| BindingError::UnknownWidgetType(kind.to_string()))?;
        Ok(build(tree))
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("kinds", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}
