#![forbid(unsafe_code)]

//! Thread-local evaluation state.
//!
//! Two pieces of state live here:
//!
//! - the **active evaluation** slot: the watcher whose getter is running.
//!   Property reads consult it to know whom to register. It is only ever set
//!   through [`EvaluationGuard`], which restores the previous occupant on
//!   every exit path, unwinding included.
//! - the **notify depth** counter that backs the cycle guard. A chain of
//!   nested notifications deeper than [`max_notify_depth`] is refused, and
//!   the outermost notification reports [`ReactiveError::DependencyCycle`].
//!
//! Everything is per thread. The reactive graph is `!Send`, so a graph and
//! the state that tracks it always live on the same thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::ReactiveError;
use crate::watcher::WatcherInner;

/// Default limit for nested notifications.
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 256;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<WatcherInner>>> = const { RefCell::new(None) };
    static NOTIFY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static MAX_NOTIFY_DEPTH: Cell<usize> = const { Cell::new(DEFAULT_MAX_NOTIFY_DEPTH) };
    static CYCLE_TRIPPED: Cell<Option<usize>> = const { Cell::new(None) };
}

/// RAII guard that pins a watcher into the active slot.
#[must_use = "dropping this guard ends the evaluation"]
pub(crate) struct EvaluationGuard {
    previous: Option<Rc<WatcherInner>>,
}

/// Pin `watcher` as the active evaluation until the guard drops.
pub(crate) fn enter(watcher: Rc<WatcherInner>) -> EvaluationGuard {
    let previous = ACTIVE.with(|slot| slot.replace(Some(watcher)));
    EvaluationGuard { previous }
}

impl Drop for EvaluationGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|slot| {
            *slot.borrow_mut() = previous;
        });
    }
}

/// The watcher currently evaluating, if any.
pub(crate) fn current() -> Option<Rc<WatcherInner>> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

/// Whether a watcher is evaluating on this thread.
#[must_use]
pub fn is_evaluating() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

/// Run `f` with the active slot cleared, so its reads register nothing.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|slot| slot.borrow_mut().take());
    let _restore = EvaluationGuard { previous };
    f()
}

/// Set the nested-notification limit for this thread.
pub fn set_max_notify_depth(depth: usize) {
    MAX_NOTIFY_DEPTH.with(|max| max.set(depth.max(1)));
}

/// The nested-notification limit for this thread.
#[must_use]
pub fn max_notify_depth() -> usize {
    MAX_NOTIFY_DEPTH.with(Cell::get)
}

/// Restores the previous nested-notification limit when dropped.
#[must_use = "dropping this guard restores the previous limit"]
pub struct DepthLimitGuard {
    previous: usize,
}

/// Pin the nested-notification limit for this thread until the guard drops.
pub fn pin_max_notify_depth(depth: usize) -> DepthLimitGuard {
    let previous = max_notify_depth();
    set_max_notify_depth(depth);
    DepthLimitGuard { previous }
}

impl Drop for DepthLimitGuard {
    fn drop(&mut self) {
        set_max_notify_depth(self.previous);
    }
}

/// One level of notification nesting.
pub(crate) struct NotifyGuard {
    outermost: bool,
}

pub(crate) fn enter_notify() -> Result<NotifyGuard, ReactiveError> {
    let depth = NOTIFY_DEPTH.with(Cell::get);
    let max = max_notify_depth();
    if depth >= max {
        CYCLE_TRIPPED.with(|tripped| tripped.set(Some(max)));
        return Err(ReactiveError::DependencyCycle { depth: max });
    }
    NOTIFY_DEPTH.with(|d| d.set(depth + 1));
    Ok(NotifyGuard {
        outermost: depth == 0,
    })
}

impl NotifyGuard {
    /// For the outermost notification, take the cycle report left by any
    /// nested level.
    pub(crate) fn take_cycle(&self) -> Option<usize> {
        if self.outermost {
            CYCLE_TRIPPED.with(Cell::take)
        } else {
            None
        }
    }
}

impl Drop for NotifyGuard {
    fn drop(&mut self) {
        NOTIFY_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        if self.outermost {
            CYCLE_TRIPPED.with(|tripped| tripped.set(None));
        }
    }
}
