#![forbid(unsafe_code)]

//! Per-property subscriber lists.
//!
//! A [`Dep`] holds weak references to the watchers that read its property.
//! Dead entries (watchers whose last handle was dropped) are pruned lazily
//! during [`notify`](Dep::notify).
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Every live subscriber is notified even when an earlier one fails; the
//!    first failure is returned once all of them ran.
//! 3. Notification is synchronous and may nest. Nesting deeper than the
//!    thread's configured limit trips the cycle guard instead of recursing.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::active;
use crate::error::ReactiveError;
use crate::watcher::{Watcher, WatcherInner};

static NEXT_DEP_ID: AtomicU64 = AtomicU64::new(1);

/// The subscriber list of one reactive property.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

pub(crate) struct DepInner {
    id: u64,
    subscribers: RefCell<Vec<Weak<WatcherInner>>>,
}

/// Non-owning handle kept by watchers for unsubscription.
#[derive(Clone)]
pub(crate) struct WeakDep(Weak<DepInner>);

impl WeakDep {
    pub(crate) fn upgrade(&self) -> Option<Dep> {
        self.0.upgrade().map(|inner| Dep { inner })
    }
}

impl Dep {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: NEXT_DEP_ID.fetch_add(1, Ordering::Relaxed),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Append `watcher` to the subscriber list.
    ///
    /// No deduplication happens here; watchers that track automatically go
    /// through [`depend`](Self::depend), which registers each pair once.
    pub fn add_subscriber(&self, watcher: &Watcher) {
        self.push(watcher.downgrade());
    }

    pub(crate) fn push(&self, watcher: Weak<WatcherInner>) {
        self.inner.subscribers.borrow_mut().push(watcher);
    }

    pub(crate) fn downgrade(&self) -> WeakDep {
        WeakDep(Rc::downgrade(&self.inner))
    }

    /// Register the currently evaluating watcher, if there is one.
    pub fn depend(&self) {
        if let Some(watcher) = active::current() {
            watcher.add_dep(self);
        }
    }

    /// Remove every entry that refers to `watcher`.
    pub(crate) fn remove(&self, watcher: &Rc<WatcherInner>) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|w| !std::ptr::eq(w.as_ptr(), Rc::as_ptr(watcher)));
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Run `update()` on every subscriber, in registration order.
    pub fn notify(&self) -> Result<(), ReactiveError> {
        let depth = match active::enter_notify() {
            Ok(guard) => guard,
            Err(err) => {
                tracing::error!(dep = self.id(), error = %err, "notify refused");
                return Err(err);
            }
        };

        let snapshot: Vec<Weak<WatcherInner>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.clone()
        };
        tracing::trace!(dep = self.id(), subscribers = snapshot.len(), "notify");

        let mut first_error = None;
        for watcher in snapshot.iter().filter_map(Weak::upgrade) {
            let watcher = Watcher::from_inner(watcher);
            if let Err(err) = watcher.update() {
                tracing::error!(
                    dep = self.id(),
                    watcher = watcher.label(),
                    error = %err,
                    "subscriber update failed"
                );
                first_error.get_or_insert(err);
            }
        }
        if let Some(limit) = depth.take_cycle() {
            tracing::error!(dep = self.id(), limit, "dependency cycle detected");
            return Err(ReactiveError::DependencyCycle { depth: limit });
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
