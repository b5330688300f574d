#![forbid(unsafe_code)]

//! Shared objects whose properties take part in dependency tracking.
//!
//! An [`Object`] is an ordered list of properties behind an `Rc`. Each
//! property is either a data slot or a derived (computed) getter. A data slot
//! becomes reactive when [`make_reactive`](crate::make_reactive) first visits
//! it: at that point it receives its own [`Dep`], created exactly once.
//!
//! # Invariants
//!
//! 1. A property's `Dep` is created at most once and never replaced, so
//!    re-wrapping an object leaves existing subscribers in place.
//! 2. Reading a reactive slot while a watcher is evaluating registers that
//!    watcher with the slot's `Dep`.
//! 3. Writing a value that is [`same`](Value::same) as the current one is a
//!    no-op: no replacement, no notification.
//! 4. Keys added to a reactive object after wrapping are plain (untracked)
//!    until the object is wrapped again.
//! 5. No `RefCell` borrow is held while subscribers run.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dep::Dep;
use crate::error::ReactiveError;
use crate::store::make_reactive;
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Derived getter installed on an object (a computed property).
pub type Getter = Rc<dyn Fn() -> Value>;

/// A shared, ordered set of named properties.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    id: u64,
    reactive: Cell<bool>,
    props: RefCell<Vec<Rc<Property>>>,
}

pub(crate) struct Property {
    key: String,
    slot: Slot,
}

enum Slot {
    Data {
        value: RefCell<Value>,
        dep: OnceCell<Dep>,
    },
    Computed(Getter),
}

impl Property {
    fn data(key: String, value: Value) -> Self {
        Self {
            key,
            slot: Slot::Data {
                value: RefCell::new(value),
                dep: OnceCell::new(),
            },
        }
    }

    fn read(&self) -> Value {
        match &self.slot {
            Slot::Data { value, dep } => {
                if let Some(dep) = dep.get() {
                    dep.depend();
                }
                value.borrow().clone()
            }
            Slot::Computed(getter) => getter(),
        }
    }

    fn peek(&self) -> Value {
        match &self.slot {
            Slot::Data { value, .. } => value.borrow().clone(),
            Slot::Computed(getter) => getter(),
        }
    }

    fn write(&self, new: Value) -> Result<bool, ReactiveError> {
        match &self.slot {
            Slot::Computed(_) => {
                tracing::trace!(key = %self.key, "write to computed property ignored");
                Ok(false)
            }
            Slot::Data { value, dep } => {
                if value.borrow().same(&new) {
                    return Ok(false);
                }
                match dep.get() {
                    Some(dep) => {
                        make_reactive(&new);
                        *value.borrow_mut() = new;
                        tracing::trace!(key = %self.key, dep = dep.id(), "reactive property changed");
                        dep.notify()?;
                    }
                    None => *value.borrow_mut() = new,
                }
                Ok(true)
            }
        }
    }

    /// Ensure the slot owns a `Dep`; returns the current value for recursion.
    pub(crate) fn intercept(&self) -> Option<Value> {
        match &self.slot {
            Slot::Data { value, dep } => {
                dep.get_or_init(Dep::new);
                Some(value.borrow().clone())
            }
            Slot::Computed(_) => None,
        }
    }

    fn dep(&self) -> Option<Dep> {
        match &self.slot {
            Slot::Data { dep, .. } => dep.get().cloned(),
            Slot::Computed(_) => None,
        }
    }
}

impl Object {
    /// Create an empty, plain object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                reactive: Cell::new(false),
                props: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Build a plain object from a JSON map.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn from_json(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let object = Self::new();
        for (key, value) in map {
            object.insert(key, Value::from_json(value));
        }
        object
    }

    /// Process-unique identity of this object.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether [`make_reactive`](crate::make_reactive) has wrapped this object.
    #[must_use]
    pub fn is_reactive(&self) -> bool {
        self.inner.reactive.get()
    }

    pub(crate) fn mark_reactive(&self) {
        self.inner.reactive.set(true);
    }

    /// Property names in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .props
            .borrow()
            .iter()
            .map(|p| p.key.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.props.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.props.borrow().is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Whether `key` is a computed (derived) property.
    #[must_use]
    pub fn is_computed(&self, key: &str) -> bool {
        self.property(key)
            .is_some_and(|p| matches!(p.slot, Slot::Computed(_)))
    }

    fn property(&self, key: &str) -> Option<Rc<Property>> {
        self.inner
            .props
            .borrow()
            .iter()
            .find(|p| p.key == key)
            .cloned()
    }

    pub(crate) fn properties(&self) -> Vec<Rc<Property>> {
        self.inner.props.borrow().clone()
    }

    /// Read a property, registering the evaluating watcher (if any) with it.
    ///
    /// Missing keys read as [`Value::Undefined`].
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.property(key).map_or(Value::Undefined, |p| p.read())
    }

    /// Read a property without registering any dependency.
    #[must_use]
    pub fn peek(&self, key: &str) -> Value {
        self.property(key).map_or(Value::Undefined, |p| p.peek())
    }

    /// Write a property.
    ///
    /// Returns `Ok(true)` when the stored value changed. A reactive slot
    /// re-wraps the new value and notifies its subscribers synchronously; the
    /// error, if any, comes from that notification. Writing a missing key
    /// appends a plain, untracked property. Writes to computed properties are
    /// ignored.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool, ReactiveError> {
        let value = value.into();
        match self.property(key) {
            Some(property) => property.write(value),
            None => {
                self.inner
                    .props
                    .borrow_mut()
                    .push(Rc::new(Property::data(key.to_owned(), value)));
                Ok(true)
            }
        }
    }

    /// Add or overwrite a property.
    ///
    /// Meant for building a data model before it is wrapped. On an object that
    /// is already reactive the inserted value is wrapped, but a new key stays
    /// untracked. Overwriting an existing data slot goes through the same path
    /// as [`set`](Self::set): the slot keeps its `Dep` and its subscribers are
    /// notified. A notification failure is logged.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if self.is_reactive() {
            make_reactive(&value);
        }
        if let Some(property) = self.property(&key)
            && matches!(property.slot, Slot::Data { .. })
        {
            if let Err(err) = property.write(value) {
                tracing::warn!(key = %key, error = %err, "insert over reactive property failed to notify");
            }
            return;
        }
        let mut props = self.inner.props.borrow_mut();
        let property = Rc::new(Property::data(key, value));
        match props.iter_mut().find(|p| p.key == property.key) {
            Some(slot) => *slot = property,
            None => props.push(property),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Install a derived getter under `key`, replacing any existing property.
    ///
    /// The getter runs on every read; its own reads are tracked against the
    /// watcher that is evaluating at the time.
    pub fn define_computed(&self, key: impl Into<String>, getter: Getter) {
        let property = Rc::new(Property {
            key: key.into(),
            slot: Slot::Computed(getter),
        });
        let mut props = self.inner.props.borrow_mut();
        match props.iter_mut().find(|p| p.key == property.key) {
            Some(slot) => *slot = property,
            None => props.push(property),
        }
    }

    /// The dependency attached to `key`, if the property is reactive.
    #[must_use]
    pub fn dep(&self, key: &str) -> Option<Dep> {
        self.property(key).and_then(|p| p.dep())
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("reactive", &self.is_reactive())
            .field("keys", &self.keys())
            .finish()
    }
}
