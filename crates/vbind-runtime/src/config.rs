#![forbid(unsafe_code)]

//! Construction options and runtime tuning.
//!
//! [`Options`] is what a caller hands to [`ViewModel::new`](crate::ViewModel::new):
//! the view root (a tree plus a node or selector), the data object, methods,
//! and computed definitions. [`RuntimeConfig`] carries the knobs that are not
//! part of the view itself and can be loaded from the environment or, with
//! the `config-file` feature, from TOML.
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `VBIND_STRICT_PATHS` | `1`/`true`/`yes`/`on` enables strict path resolution |
//! | `VBIND_MAX_NOTIFY_DEPTH` | Positive integer nesting limit for notifications |
//!
//! Unparseable values are logged and ignored.

use std::fmt;
use std::rc::Rc;

use tracing::warn;
use vbind_reactive::{DEFAULT_MAX_NOTIFY_DEPTH, Object, ResolveMode, Value};
use vbind_view::{Event, NodeId, ViewTree};

use crate::view_model::ViewModel;

/// A user method. Invoked with the view model as receiver and the
/// triggering event.
pub type Method = Rc<dyn Fn(&ViewModel, &Event)>;

/// A computed definition. Evaluated lazily on every read of its key.
pub type ComputedFn = Rc<dyn Fn(&ViewModel) -> Value>;

pub const ENV_STRICT_PATHS: &str = "VBIND_STRICT_PATHS";
pub const ENV_MAX_NOTIFY_DEPTH: &str = "VBIND_MAX_NOTIFY_DEPTH";

/// How the view root is located inside the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewRoot {
    Node(NodeId),
    /// Resolved through [`ViewTree::query_selector`].
    Selector(String),
}

impl From<NodeId> for ViewRoot {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for ViewRoot {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<String> for ViewRoot {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Runtime tuning shared by every binding of a view model.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-file",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct RuntimeConfig {
    /// Fail on unresolvable paths instead of yielding `undefined`.
    pub strict_paths: bool,
    /// Nesting limit for re-entrant notifications on this thread.
    pub max_notify_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strict_paths: false,
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn resolve_mode(&self) -> ResolveMode {
        if self.strict_paths {
            ResolveMode::Strict
        } else {
            ResolveMode::Lenient
        }
    }

    /// Defaults overridden by `VBIND_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = get_env(ENV_STRICT_PATHS) {
            match parse_flag(&raw) {
                Some(flag) => config.strict_paths = flag,
                None => warn!(var = ENV_STRICT_PATHS, value = %raw, "ignoring unparseable flag"),
            }
        }
        if let Some(raw) = get_env(ENV_MAX_NOTIFY_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_notify_depth = depth,
                _ => warn!(var = ENV_MAX_NOTIFY_DEPTH, value = %raw, "ignoring invalid depth"),
            }
        }
        config
    }

    /// Parse a TOML document with optional `strict_paths` and
    /// `max_notify_depth` keys.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, crate::ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| crate::ConfigError::Parse(err.to_string()))?;
        if config.max_notify_depth == 0 {
            return Err(crate::ConfigError::Parse(
                "max_notify_depth must be positive".to_owned(),
            ));
        }
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Everything needed to build a [`ViewModel`].
///
/// ```
/// use std::rc::Rc;
/// use vbind_reactive::obj;
/// use vbind_runtime::Options;
/// use vbind_view::MemoryTree;
///
/// let tree = Rc::new(MemoryTree::parse(r#"<div id="app">{{ name }}</div>"#).unwrap());
/// let options = Options::new()
///     .el(tree.clone(), "#app")
///     .data(obj! { "name" => "vbind" });
/// assert!(options.is_mounted());
/// ```
#[derive(Clone, Default)]
pub struct Options {
    pub(crate) tree: Option<Rc<dyn ViewTree>>,
    pub(crate) root: Option<ViewRoot>,
    pub(crate) data: Object,
    pub(crate) methods: Vec<(String, Method)>,
    pub(crate) computed: Vec<(String, ComputedFn)>,
    pub(crate) config: RuntimeConfig,
    pub(crate) registry: Option<crate::DirectiveRegistry>,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount into `tree` at `root`. Without a root the view model is
    /// headless.
    #[must_use]
    pub fn el<T>(mut self, tree: Rc<T>, root: impl Into<ViewRoot>) -> Self
    where
        T: ViewTree + 'static,
    {
        self.tree = Some(tree);
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn data(mut self, data: Object) -> Self {
        self.data = data;
        self
    }

    /// Use a JSON object document as the data object.
    #[cfg(feature = "json")]
    pub fn data_json(mut self, json: serde_json::Value) -> Result<Self, crate::VmError> {
        match json {
            serde_json::Value::Object(map) => {
                self.data = Object::from_json(map);
                Ok(self)
            }
            other => Err(crate::VmError::DataNotObject {
                kind: Value::from_json(other).kind(),
            }),
        }
    }

    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&ViewModel, &Event) + 'static,
    {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    #[must_use]
    pub fn computed<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&ViewModel) -> Value + 'static,
    {
        self.computed.push((name.into(), Rc::new(getter)));
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Compile with a custom directive registry instead of the built-ins.
    #[must_use]
    pub fn directives(mut self, registry: crate::DirectiveRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("root", &self.root)
            .field("data", &self.data)
            .field(
                "methods",
                &self.methods.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field(
                "computed",
                &self.computed.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}
