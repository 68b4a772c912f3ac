//! Error types for the binding engine

use thiserror::Error;

/// Binding-related errors
///
/// Factories and binders report failures with this type. The engine's public
/// bind / unbind / remove surface never returns it: failures there are
/// logged and replaced by a safe default.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The configuration factory has no converter for the object's type
    #[error("No configuration registered for object type {0}")]
    UnregisteredObjectType(String),

    /// The binder factory has no binder for the type name
    #[error("No binder registered for type {0}")]
    UnknownBinderType(String),

    /// The widget factory cannot build the type name
    #[error("No widget registered for type {0}")]
    UnknownWidgetType(String),

    /// The widget kind declares no composite slots
    #[error("Widget type {0} declares no composite")]
    NoComposite(String),

    /// A binder was invoked against a widget of the wrong kind
    #[error("Binder expected a {expected} widget, got {actual}")]
    WidgetTypeMismatch { expected: String, actual: String },

    /// The widget handle refers to a freed arena slot
    #[error("Widget {0} is no longer alive")]
    StaleWidget(String),

    /// A configuration node can only be attached to one parent
    #[error("Configuration {child} is already attached to {parent}")]
    AlreadyAttached { child: String, parent: String },

    /// Attaching the node would make it its own ancestor
    #[error("Configuration {0} cannot be attached below itself")]
    CyclicAttachment(String),

    /// Configuration ids cannot be empty
    #[error("Configuration id cannot be empty")]
    MissingId,

    /// Engine settings could not be parsed
    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    /// A configuration document could not be parsed or converted
    #[error("Invalid configuration document: {0}")]
    InvalidDocument(String),

    /// Reading a settings file or document failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for binding operations
pub type BindingResult<T> = Result<T, BindingError>;
