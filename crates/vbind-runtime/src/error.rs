#![forbid(unsafe_code)]

//! Errors surfaced by compilation and by the view-model facade.
//!
//! Everything that can go wrong while constructing a [`ViewModel`] is
//! returned from [`ViewModel::new`]. Failures during later reactive updates
//! are logged and isolated per subscriber (see `vbind_reactive::Dep`).
//!
//! [`ViewModel`]: crate::ViewModel
//! [`ViewModel::new`]: crate::ViewModel::new

use vbind_reactive::ReactiveError;
use vbind_view::NodeId;

/// Errors raised while installing bindings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// `v-on` names a method the view model does not define.
    #[error("`v-on:{event}` on {node} references unknown method `{method}`")]
    MissingMethod {
        method: String,
        event: String,
        node: NodeId,
    },
    /// `v-on` without the `:<event>` suffix.
    #[error("`{attribute}` on {node} needs an event name (`v-on:<event>`)")]
    MissingEventName { attribute: String, node: NodeId },
    /// The first evaluation of a binding failed (strict paths only).
    #[error("binding `{expression}` on {node} failed: {source}")]
    Binding {
        expression: String,
        node: NodeId,
        #[source]
        source: ReactiveError,
    },
}

/// Errors from the view-model facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("view root `{selector}` not found")]
    ViewRootNotFound { selector: String },
    #[error("view root {node} is not an element")]
    ViewRootNotElement { node: NodeId },
    /// `get`/`set` on a key that was not a data key at construction time.
    #[error("`{key}` is not a proxied data key")]
    NotProxied { key: String },
    #[error("unknown method `{name}`")]
    UnknownMethod { name: String },
    /// JSON data given to the facade was not an object.
    #[error("view-model data must be an object, got {kind}")]
    DataNotObject { kind: &'static str },
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

/// Errors from loading a [`RuntimeConfig`](crate::RuntimeConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid runtime config: {0}")]
    Parse(String),
}
