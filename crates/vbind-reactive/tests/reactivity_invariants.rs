#![forbid(unsafe_code)]

//! Integration tests: dependency discovery and change propagation.

use std::cell::RefCell;
use std::rc::Rc;

use vbind_reactive::active;
use vbind_reactive::{ReactiveError, ReactiveStore, Value, Watcher, obj};

fn log() -> (Rc<RefCell<Vec<String>>>, impl Fn(&Value) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    (seen, move |v: &Value| s.borrow_mut().push(v.to_string()))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn write_notifies_only_readers_of_that_property() {
    let store = ReactiveStore::new(obj! { "a" => 1, "b" => 1, "c" => obj! { "d" => 1 } });
    let (seen_a, cb_a) = log();
    let (seen_b, cb_b) = log();
    let (seen_ad, cb_ad) = log();
    let _wa = store.watch("a", cb_a).unwrap();
    let _wb = store.watch("b", cb_b).unwrap();
    let _wcd = store.watch("c.d", cb_ad).unwrap();

    store.set_path("a", 2).unwrap();
    assert_eq!(*seen_a.borrow(), vec!["2"]);
    assert!(seen_b.borrow().is_empty());
    assert!(seen_ad.borrow().is_empty());

    store.set_path("c.d", 5).unwrap();
    assert_eq!(*seen_ad.borrow(), vec!["5"]);
    assert_eq!(seen_a.borrow().len(), 1);
}

#[test]
fn equal_write_is_suppressed() {
    let store = ReactiveStore::new(obj! { "name" => "x" });
    let (seen, cb) = log();
    let _w = store.watch("name", cb).unwrap();

    assert_eq!(store.set_path("name", "x"), Ok(false));
    assert!(seen.borrow().is_empty());
}

#[test]
fn same_object_written_back_is_suppressed() {
    let inner = obj! { "b" => 1 };
    let store = ReactiveStore::new(obj! { "a" => inner.clone() });
    let (seen, cb) = log();
    let _w = store.watch("a", cb).unwrap();

    assert_eq!(store.root().set("a", inner), Ok(false));
    assert!(seen.borrow().is_empty());
}

// ============================================================================
// Nested reactivity
// ============================================================================

#[test]
fn nested_write_and_parent_replacement() {
    let store = ReactiveStore::new(obj! { "a" => obj! { "b" => 1 } });
    let old_a = store.root().get("a").as_object().cloned().unwrap();
    let (seen, cb) = log();
    let _w = store.watch("a.b", cb).unwrap();

    store.set_path("a.b", 5).unwrap();
    assert_eq!(*seen.borrow(), vec!["5"]);

    // Replace the whole parent: the watcher re-resolves against the new object.
    store.root().set("a", obj! { "b" => 2 }).unwrap();
    assert_eq!(*seen.borrow(), vec!["5", "2"]);

    // The replacement was wrapped on write and the watcher subscribed to it.
    store.set_path("a.b", 3).unwrap();
    assert_eq!(*seen.borrow(), vec!["5", "2", "3"]);

    // The abandoned subtree no longer affects the resolved value.
    old_a.set("b", 100).unwrap();
    assert_eq!(*seen.borrow(), vec!["5", "2", "3"]);
}

#[test]
fn replacement_object_is_reactive() {
    let store = ReactiveStore::new(obj! { "a" => 1 });
    let fresh = obj! { "x" => obj! { "y" => 1 } };
    store.root().set("a", fresh.clone()).unwrap();
    assert!(fresh.is_reactive());
    assert!(fresh.get("x").as_object().is_some_and(|x| x.is_reactive()));
}

// ============================================================================
// Computed getters
// ============================================================================

#[test]
fn computed_getter_tracks_its_reads() {
    let store = ReactiveStore::new(obj! { "first" => "A", "last" => "B" });
    let root = store.root().clone();
    store.root().define_computed(
        "full",
        Rc::new(move || Value::from(format!("{}{}", root.get("first"), root.get("last")))),
    );
    let (seen, cb) = log();
    let _w = store.watch("full", cb).unwrap();

    store.set_path("last", "C").unwrap();
    assert_eq!(*seen.borrow(), vec!["AC"]);
}

// ============================================================================
// Cycle guard
// ============================================================================

#[test]
fn diverging_cycle_is_reported_not_overflowed() {
    init_tracing();
    active::set_max_notify_depth(32);
    let store = ReactiveStore::new(obj! { "a" => 0, "b" => 0 });

    let root = store.root().clone();
    let _ab = store
        .watch("a", move |v| {
            let n = v.as_f64().unwrap_or(0.0);
            let _ = root.set("b", n + 1.0);
        })
        .unwrap();
    let root = store.root().clone();
    let _ba = store
        .watch("b", move |v| {
            let n = v.as_f64().unwrap_or(0.0);
            let _ = root.set("a", n + 1.0);
        })
        .unwrap();

    let result = store.set_path("a", 1);
    assert_eq!(result, Err(ReactiveError::DependencyCycle { depth: 32 }));
    assert!(!active::is_evaluating());

    // The guard resets for the next, acyclic write.
    drop(_ab);
    drop(_ba);
    assert_eq!(store.set_path("a", -1), Ok(true));
    active::set_max_notify_depth(active::DEFAULT_MAX_NOTIFY_DEPTH);
}

// ============================================================================
// Manual subscription
// ============================================================================

#[test]
fn manual_watcher_over_plain_getter() {
    let store = ReactiveStore::new(obj! { "n" => 1 });
    let root = store.root().clone();
    let (seen, cb) = log();
    let _w = Watcher::new(
        "double",
        move || Ok(Value::from(root.get("n").as_f64().unwrap_or(0.0) * 2.0)),
        cb,
    )
    .unwrap();
    store.set_path("n", 4).unwrap();
    assert_eq!(*seen.borrow(), vec!["8"]);
}
