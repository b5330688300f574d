#![forbid(unsafe_code)]

//! Directive dispatch.
//!
//! An attribute named `v-<name>` or `v-<name>:<event>` is a directive. The
//! compiler looks `<name>` up in a [`DirectiveRegistry`] and calls the
//! registered [`Installer`] with the node, the attribute value, and the
//! optional event name. Names with no installer are ignored.
//!
//! Installers do their work through a [`Binder`], which owns the two
//! resources every binding needs: watchers that live as long as the view
//! model, and event listeners that hold the view model weakly.
//!
//! # Example
//!
//! ```
//! use vbind_runtime::directive::{DirectiveRegistry, parse_directive};
//!
//! let attr = parse_directive("v-on:click").unwrap();
//! assert_eq!((attr.name, attr.event), ("on", Some("click")));
//! assert!(parse_directive("class").is_none());
//! assert!(DirectiveRegistry::with_builtins().contains("model"));
//! ```

pub mod builtins;
pub mod updater;

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use vbind_reactive::{ExpressionPath, ResolveMode, Value, Watcher};
use vbind_view::{Event, NodeId, ViewTree};

use crate::error::CompileError;
use crate::view_model::ViewModel;

pub use updater::Updater;

/// Attribute prefix that marks a directive.
pub const DIRECTIVE_PREFIX: &str = "v-";

/// Install one directive on one node.
///
/// Arguments: binder, node, attribute value, event name (the part after
/// `:`, if any).
pub type Installer = fn(&Binder<'_>, NodeId, &str, Option<&str>) -> Result<(), CompileError>;

/// A parsed directive attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectiveAttr<'a> {
    pub name: &'a str,
    pub event: Option<&'a str>,
}

/// Split `v-name[:event]`. Returns `None` for ordinary attributes.
#[must_use]
pub fn parse_directive(attribute: &str) -> Option<DirectiveAttr<'_>> {
    let rest = attribute.strip_prefix(DIRECTIVE_PREFIX)?;
    let (name, event) = match rest.split_once(':') {
        Some((name, event)) => (name, Some(event)),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(DirectiveAttr { name, event })
}

/// The directives every view model understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `v-model="path"`: two-way binding of a control's value.
    Model,
    /// `v-html="path"`: element content as markup.
    Html,
    /// `v-on:<event>="method"`: event handler.
    On,
    /// Text interpolation. Installed by the compiler on text nodes; also
    /// reachable as `v-text="template"`.
    Text,
}

impl Builtin {
    pub const ALL: [Self; 4] = [Self::Model, Self::Html, Self::On, Self::Text];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Html => "html",
            Self::On => "on",
            Self::Text => "text",
        }
    }

    #[must_use]
    pub fn installer(self) -> Installer {
        match self {
            Self::Model => builtins::model,
            Self::Html => builtins::html,
            Self::On => builtins::on,
            Self::Text => builtins::text,
        }
    }
}

/// Name to installer table.
#[derive(Clone)]
pub struct DirectiveRegistry {
    installers: AHashMap<String, Installer>,
}

impl DirectiveRegistry {
    /// A registry with no directives at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            installers: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for builtin in Builtin::ALL {
            registry.register(builtin.name(), builtin.installer());
        }
        registry
    }

    /// Add or replace the installer for `name`.
    pub fn register(&mut self, name: impl Into<String>, installer: Installer) -> &mut Self {
        self.installers.insert(name.into(), installer);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Installer> {
        self.installers.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.installers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.installers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Handle given to installers while a view model compiles.
pub struct Binder<'a> {
    vm: &'a ViewModel,
    tree: &'a Rc<dyn ViewTree>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(vm: &'a ViewModel, tree: &'a Rc<dyn ViewTree>) -> Self {
        Self { vm, tree }
    }

    #[must_use]
    pub fn vm(&self) -> &ViewModel {
        self.vm
    }

    #[must_use]
    pub fn tree(&self) -> &Rc<dyn ViewTree> {
        self.tree
    }

    #[must_use]
    pub fn mode(&self) -> ResolveMode {
        self.vm.config().resolve_mode()
    }

    /// Watch `path` on the view model's data; `on_change` runs with each
    /// new value. The watcher lives as long as the view model. Returns the
    /// current value.
    pub fn watch<F>(
        &self,
        node: NodeId,
        path: &ExpressionPath,
        on_change: F,
    ) -> Result<Value, CompileError>
    where
        F: Fn(&Value) + 'static,
    {
        let watcher = Watcher::on_path(self.vm.data(), path.clone(), self.mode(), on_change)
            .map_err(|source| CompileError::Binding {
                expression: path.to_string(),
                node,
                source,
            })?;
        let value = watcher.value();
        self.vm.adopt(watcher);
        Ok(value)
    }

    /// Subscribe `handler` to `event` on `node`. The handler holds the view
    /// model weakly and does nothing once it is dropped or disposed. It runs
    /// under the view model's notification limit.
    pub fn listen<F>(&self, node: NodeId, event: &str, handler: F)
    where
        F: Fn(&ViewModel, &Event) + 'static,
    {
        let vm = self.vm.downgrade();
        self.tree.subscribe(
            node,
            event,
            Rc::new(move |event: &Event| {
                if let Some(vm) = vm.upgrade()
                    && !vm.is_disposed()
                {
                    let _limit = vm.pin_notify_depth();
                    handler(&vm, event);
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Binder<'_>, _: NodeId, _: &str, _: Option<&str>) -> Result<(), CompileError> {
        Ok(())
    }

    #[test]
    fn parses_names() {
        assert_eq!(
            parse_directive("v-model"),
            Some(DirectiveAttr {
                name: "model",
                event: None
            })
        );
        assert_eq!(
            parse_directive("v-on:keyup"),
            Some(DirectiveAttr {
                name: "on",
                event: Some("keyup")
            })
        );
        assert_eq!(
            parse_directive("v-on:").map(|d| d.event),
            Some(Some(""))
        );
        assert_eq!(parse_directive("v-"), None);
        assert_eq!(parse_directive("id"), None);
        assert_eq!(parse_directive("xv-model"), None);
    }

    #[test]
    fn builtins_are_registered() {
        let registry = DirectiveRegistry::default();
        assert_eq!(registry.names(), vec!["html", "model", "on", "text"]);
        assert!(registry.get("bind").is_none());
    }

    #[test]
    fn register_adds_and_replaces() {
        let mut registry = DirectiveRegistry::empty();
        assert!(registry.names().is_empty());
        registry.register("show", noop).register("model", noop);
        assert!(registry.contains("show"));
        assert_eq!(registry.names(), vec!["model", "show"]);
    }
}
