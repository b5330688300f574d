#![forbid(unsafe_code)]

//! The reactive store: wrapping plain data so its properties are observed.
//!
//! [`make_reactive`] walks a value and gives every data property it reaches
//! a [`Dep`](crate::Dep). It runs once over the root at construction and
//! again over every object written into a reactive property.
//!
//! Wrapping is idempotent: properties that already own a `Dep` keep it, and
//! objects reachable through themselves are visited once per call.

use ahash::AHashSet;

use crate::error::ReactiveError;
use crate::object::Object;
use crate::path::{ExpressionPath, ResolveMode};
use crate::value::Value;
use crate::watcher::Watcher;

/// Make every data property reachable from `value` reactive.
///
/// Primitives are left untouched.
pub fn make_reactive(value: &Value) {
    let mut visited = AHashSet::new();
    wrap(value, &mut visited);
}

fn wrap(value: &Value, visited: &mut AHashSet<u64>) {
    let Value::Object(object) = value else {
        return;
    };
    if !visited.insert(object.id()) {
        return;
    }
    object.mark_reactive();
    for property in object.properties() {
        if let Some(current) = property.intercept() {
            wrap(&current, visited);
        }
    }
}

/// Owns a wrapped data root and offers path-level access to it.
#[derive(Clone, Debug)]
pub struct ReactiveStore {
    root: Object,
    mode: ResolveMode,
}

impl ReactiveStore {
    /// Wrap `root` and keep it as the store's data.
    #[must_use]
    pub fn new(root: Object) -> Self {
        make_reactive(&Value::Object(root.clone()));
        Self {
            root,
            mode: ResolveMode::default(),
        }
    }

    /// Use `mode` for path resolution and assignment.
    #[must_use]
    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Object {
        &self.root
    }

    #[must_use]
    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Resolve a dot path against the root.
    pub fn get_path(&self, path: &str) -> Result<Value, ReactiveError> {
        ExpressionPath::parse(path).resolve(&self.root, self.mode)
    }

    /// Assign a value at a dot path.
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<bool, ReactiveError> {
        ExpressionPath::parse(path).assign(&self.root, value.into(), self.mode)
    }

    /// Watch a dot path; `callback` runs with each new value.
    pub fn watch(
        &self,
        path: &str,
        callback: impl Fn(&Value) + 'static,
    ) -> Result<Watcher, ReactiveError> {
        Watcher::on_path(&self.root, ExpressionPath::parse(path), self.mode, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj;

    #[test]
    fn wraps_nested_objects() {
        let inner = obj! { "b" => 1 };
        let root = obj! { "a" => inner.clone(), "n" => 2 };
        make_reactive(&Value::from(root.clone()));
        assert!(root.is_reactive());
        assert!(inner.is_reactive());
        assert!(root.dep("a").is_some());
        assert!(inner.dep("b").is_some());
    }

    #[test]
    fn primitives_are_left_alone() {
        make_reactive(&Value::from(5));
        make_reactive(&Value::Null);
    }

    #[test]
    fn rewrapping_keeps_existing_deps() {
        let root = obj! { "a" => 1 };
        make_reactive(&Value::from(root.clone()));
        let before = root.dep("a").map(|d| d.id());
        make_reactive(&Value::from(root.clone()));
        assert_eq!(root.dep("a").map(|d| d.id()), before);
    }

    #[test]
    fn self_referencing_object_terminates() {
        let root = obj! { "a" => 1 };
        root.insert("me", root.clone());
        make_reactive(&Value::from(root.clone()));
        assert!(root.dep("me").is_some());
    }

    #[test]
    fn store_paths() {
        let store = ReactiveStore::new(obj! { "user" => obj! { "name" => "A" } });
        assert_eq!(store.get_path("user.name"), Ok(Value::from("A")));
        assert_eq!(store.set_path("user.name", "B"), Ok(true));
        assert_eq!(store.get_path("user.name"), Ok(Value::from("B")));
        assert_eq!(store.get_path("user.missing.deep"), Ok(Value::Undefined));
    }
}
