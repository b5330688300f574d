#![forbid(unsafe_code)]

//! Reactive computations.
//!
//! A [`Watcher`] evaluates a getter, remembers the result, and re-runs the
//! getter whenever a [`Dep`] it read from notifies. The callback fires only
//! when the new result is not [`same`](Value::same) as the remembered one.
//!
//! # Invariants
//!
//! 1. Every evaluation (the first one and each update) runs with this watcher
//!    pinned in the active slot, and the slot is restored on every exit path.
//! 2. A watcher registers with a given `Dep` at most once; re-evaluation can
//!    add new dependencies (e.g. after a parent object was replaced) but never
//!    duplicates an old one.
//! 3. The remembered value is updated before the callback runs, so a
//!    re-entrant update compares against the newest value.
//! 4. After [`dispose`](Watcher::dispose) the watcher is gone from every
//!    `Dep` it registered with and further updates are no-ops.
//!
//! # Ownership
//!
//! Dependencies hold weak references. A watcher stays subscribed while at
//! least one [`Watcher`] handle is alive; the owner (usually a view model's
//! binding list) decides its lifetime.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashSet;

use crate::active;
use crate::dep::{Dep, WeakDep};
use crate::error::ReactiveError;
use crate::object::Object;
use crate::path::{ExpressionPath, ResolveMode};
use crate::value::Value;

type GetterFn = dyn Fn() -> Result<Value, ReactiveError>;
type CallbackFn = dyn Fn(&Value);

/// Handle to a reactive computation.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

pub(crate) struct WatcherInner {
    label: String,
    getter: Box<GetterFn>,
    callback: Rc<CallbackFn>,
    old_value: RefCell<Value>,
    deps: RefCell<Vec<WeakDep>>,
    dep_ids: RefCell<AHashSet<u64>>,
    disposed: Cell<bool>,
}

impl WatcherInner {
    /// Register with `dep` unless already registered.
    pub(crate) fn add_dep(self: &Rc<Self>, dep: &Dep) {
        if self.disposed.get() {
            return;
        }
        if self.dep_ids.borrow_mut().insert(dep.id()) {
            self.deps.borrow_mut().push(dep.downgrade());
            dep.push(Rc::downgrade(self));
        }
    }
}

impl Watcher {
    /// Create a watcher and run its first evaluation.
    ///
    /// The first result is remembered without invoking `callback`.
    pub fn new(
        label: impl Into<String>,
        getter: impl Fn() -> Result<Value, ReactiveError> + 'static,
        callback: impl Fn(&Value) + 'static,
    ) -> Result<Self, ReactiveError> {
        let watcher = Self {
            inner: Rc::new(WatcherInner {
                label: label.into(),
                getter: Box::new(getter),
                callback: Rc::new(callback),
                old_value: RefCell::new(Value::Undefined),
                deps: RefCell::new(Vec::new()),
                dep_ids: RefCell::new(AHashSet::new()),
                disposed: Cell::new(false),
            }),
        };
        let first = watcher.evaluate()?;
        *watcher.inner.old_value.borrow_mut() = first;
        tracing::trace!(
            watcher = %watcher.inner.label,
            deps = watcher.dependency_count(),
            "watcher created"
        );
        Ok(watcher)
    }

    /// Watch `path` resolved against `root`.
    pub fn on_path(
        root: &Object,
        path: ExpressionPath,
        mode: ResolveMode,
        callback: impl Fn(&Value) + 'static,
    ) -> Result<Self, ReactiveError> {
        let root = root.clone();
        let label = path.to_string();
        Self::new(label, move || path.resolve(&root, mode), callback)
    }

    pub(crate) fn from_inner(inner: Rc<WatcherInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<WatcherInner> {
        Rc::downgrade(&self.inner)
    }

    /// Human-readable label (the watched path for path watchers).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The last observed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.old_value.borrow().clone()
    }

    /// Number of dependencies this watcher registered with.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    fn evaluate(&self) -> Result<Value, ReactiveError> {
        let _guard = active::enter(Rc::clone(&self.inner));
        (self.inner.getter)()
    }

    /// Re-evaluate and invoke the callback if the result changed.
    pub fn update(&self) -> Result<(), ReactiveError> {
        if self.is_disposed() {
            return Ok(());
        }
        let new_value = self.evaluate()?;
        if self.inner.old_value.borrow().same(&new_value) {
            return Ok(());
        }
        *self.inner.old_value.borrow_mut() = new_value.clone();
        tracing::trace!(watcher = %self.inner.label, value = %new_value, "watcher changed");
        let callback = Rc::clone(&self.inner.callback);
        callback(&new_value);
        Ok(())
    }

    /// Unsubscribe from every dependency and stop reacting.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let deps = std::mem::take(&mut *self.inner.deps.borrow_mut());
        for dep in deps.iter().filter_map(WeakDep::upgrade) {
            dep.remove(&self.inner);
        }
        self.inner.dep_ids.borrow_mut().clear();
        tracing::trace!(watcher = %self.inner.label, "watcher disposed");
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("label", &self.inner.label)
            .field("value", &*self.inner.old_value.borrow())
            .field("deps", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
