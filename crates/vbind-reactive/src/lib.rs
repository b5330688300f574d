#![forbid(unsafe_code)]

//! Property-level reactivity for vbind.
//!
//! This crate makes a plain data model observable:
//!
//! - [`Value`] / [`Object`]: the dynamic data model. Objects are shared
//!   handles with ordered properties.
//! - [`make_reactive`] / [`ReactiveStore`]: wrap a model so each data property
//!   owns a [`Dep`].
//! - [`Watcher`]: a computation that records every `Dep` it reads while
//!   evaluating and re-runs when one of them notifies.
//! - [`ExpressionPath`]: dot paths resolved leniently (or strictly, on
//!   request) against an object.
//!
//! # Architecture
//!
//! Dependency discovery is automatic. While a watcher evaluates, it sits in
//! a thread-local active slot (see [`active`]); every reactive property read
//! during that window registers the watcher with the property's `Dep`. A
//! write that changes a value re-wraps it and calls [`Dep::notify`], which
//! re-evaluates each subscriber synchronously, in registration order.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use vbind_reactive::{obj, ReactiveStore, Value};
//!
//! let store = ReactiveStore::new(obj! { "user" => obj! { "name" => "A" } });
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let s = Rc::clone(&seen);
//! let _w = store.watch("user.name", move |v| s.borrow_mut().push(v.to_string())).unwrap();
//!
//! store.set_path("user.name", "B").unwrap();
//! store.set_path("user.name", "B").unwrap(); // same value: suppressed
//! assert_eq!(*seen.borrow(), vec!["B"]);
//! ```
//!
//! # Known hazards
//!
//! Callbacks that write each other's sources with ever-new values never
//! settle. Such chains are cut at [`active::max_notify_depth`] nested
//! notifications and reported as [`ReactiveError::DependencyCycle`] to the
//! outermost writer.
//!
//! Nothing here is `Send`; a model and its watchers belong to one thread.

pub mod active;
pub mod dep;
pub mod error;
pub mod object;
pub mod path;
pub mod store;
pub mod value;
pub mod watcher;

pub use active::{DEFAULT_MAX_NOTIFY_DEPTH, untracked};
pub use dep::Dep;
pub use error::ReactiveError;
pub use object::{Getter, Object};
pub use path::{ExpressionPath, ResolveMode};
pub use store::{ReactiveStore, make_reactive};
pub use value::Value;
pub use watcher::Watcher;

/// Build a plain [`Object`] from `key => value` pairs.
///
/// Values go through `Into<Value>`, so nested `obj!` calls, strings, numbers
/// and booleans can be mixed freely.
///
/// ```
/// use vbind_reactive::{obj, Value};
///
/// let data = obj! { "name" => "x", "user" => obj! { "age" => 3 } };
/// assert_eq!(data.get("name"), Value::from("x"));
/// ```
#[macro_export]
macro_rules! obj {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let object = $crate::Object::new();
        $( object.insert($key, $value); )+
        object
    }};
}
