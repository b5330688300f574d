#![forbid(unsafe_code)]

//! Integration tests: templates compiled against a `MemoryTree`.

use std::cell::Cell;
use std::rc::Rc;

use vbind_reactive::{ExpressionPath, Value, obj};
use vbind_runtime::directive::Binder;
use vbind_runtime::{
    CompileError, DirectiveRegistry, Options, RuntimeConfig, Updater, ViewModel, VmError,
};
use vbind_view::{Event, MemoryTree, NodeId, ViewTree};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn tree(markup: &str) -> Rc<MemoryTree> {
    Rc::new(MemoryTree::parse(markup).unwrap())
}

fn app(tree: &MemoryTree) -> NodeId {
    tree.query_selector("#app").unwrap()
}

// ============================================================================
// v-model
// ============================================================================

#[test]
fn model_binds_both_ways() {
    init_tracing();
    let tree = tree(r#"<div id="app"><input v-model="user.name"><p>{{ user.name }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "user" => obj! { "name" => "Ada" } }),
    )
    .unwrap();
    let root = app(&tree);
    let input = tree.children(root)[0];
    assert_eq!(tree.value(input), "Ada");
    assert_eq!(tree.text_content(root), "Ada");

    tree.input(input, "Grace");
    assert_eq!(vm.get_path("user.name").unwrap(), Value::from("Grace"));
    assert_eq!(tree.text_content(root), "Grace");

    vm.set_path("user.name", "Linus").unwrap();
    assert_eq!(tree.value(input), "Linus");
    assert_eq!(tree.text_content(root), "Linus");
}

#[test]
fn model_writes_back_raw_strings() {
    let tree = tree(r#"<div id="app"><input v-model="age"></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "age" => 3 }),
    )
    .unwrap();
    let input = tree.children(app(&tree))[0];
    assert_eq!(tree.value(input), "3");
    tree.input(input, "4");
    assert_eq!(vm.get("age").unwrap(), Value::from("4"));
}

#[test]
fn model_ignores_input_without_a_value() {
    let tree = tree(r#"<div id="app"><input v-model="name"></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "name" => "Ada" }),
    )
    .unwrap();
    let input = tree.children(app(&tree))[0];
    assert_eq!(tree.fire(input, "input"), 1);
    assert_eq!(vm.get("name").unwrap(), Value::from("Ada"));
    assert_eq!(tree.value(input), "Ada");
}

// ============================================================================
// Interpolation
// ============================================================================

#[test]
fn text_follows_key_after_insert_over_it() {
    let tree = tree(r#"<div id="app"><p>{{ a }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "a" => 1 }),
    )
    .unwrap();
    let root = app(&tree);

    vm.data().insert("a", 2);
    assert_eq!(tree.text_content(root), "2");
    vm.set("a", 3).unwrap();
    assert_eq!(tree.text_content(root), "3");
    assert_eq!(vm.data().dep("a").map(|d| d.subscriber_count()), Some(1));
}

#[test]
fn text_node_rerenders_whole_template() {
    let tree = tree(r#"<div id="app"><p>{{ a }} + {{ b }} = {{ sum }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "a" => 1, "b" => 2 })
            .computed("sum", |vm| {
                let a = vm.get("a").ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                let b = vm.get("b").ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                Value::from(a + b)
            }),
    )
    .unwrap();
    let root = app(&tree);
    assert_eq!(tree.text_content(root), "1 + 2 = 3");

    vm.set("a", 10).unwrap();
    assert_eq!(tree.text_content(root), "10 + 2 = 12");

    vm.set("b", 0.5).unwrap();
    assert_eq!(tree.text_content(root), "10 + 0.5 = 10.5");
    assert_eq!(vm.computed("sum"), Some(Value::from(10.5)));
}

#[test]
fn replacing_a_parent_object_updates_the_view() {
    let tree = tree(r#"<div id="app"><p>{{ user.name }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "user" => obj! { "name" => "Ada" } }),
    )
    .unwrap();
    let root = app(&tree);

    vm.set("user", obj! { "name" => "Bob" }).unwrap();
    assert_eq!(tree.text_content(root), "Bob");

    vm.set_path("user.name", "Eve").unwrap();
    assert_eq!(tree.text_content(root), "Eve");
}

#[test]
fn unresolved_paths_render_undefined_when_lenient() {
    let tree = tree(r#"<div id="app"><p>[{{ nope.deeper }}]</p></div>"#);
    let _vm = ViewModel::new(Options::new().el(Rc::clone(&tree), "#app")).unwrap();
    assert_eq!(tree.text_content(app(&tree)), "[undefined]");
}

#[test]
fn unresolved_paths_fail_when_strict() {
    let tree = tree(r#"<div id="app"><p>{{ nope }}</p></div>"#);
    let err = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .config(RuntimeConfig {
                strict_paths: true,
                ..RuntimeConfig::default()
            }),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        VmError::Compile(CompileError::Binding { ref expression, .. }) if expression == "nope"
    ));
    // The template is left in place.
    assert_eq!(tree.inner_html(app(&tree)), "<p>{{ nope }}</p>");
}

// ============================================================================
// v-html
// ============================================================================

#[test]
fn html_directive_replaces_content() {
    let tree = tree(r#"<div id="app"><div v-html="body"></div></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "body" => "<b>hi</b>" }),
    )
    .unwrap();
    let host = tree.children(app(&tree))[0];
    assert_eq!(tree.inner_html(host), "<b>hi</b>");

    vm.set("body", "<i>bye</i>").unwrap();
    assert_eq!(tree.inner_html(host), "<i>bye</i>");
}

// ============================================================================
// v-on
// ============================================================================

fn counter(tree: &Rc<MemoryTree>) -> Result<ViewModel, VmError> {
    ViewModel::new(
        Options::new()
            .el(Rc::clone(tree), "#app")
            .data(obj! { "count" => 0 })
            .method("inc", |vm, event| {
                assert_eq!(event.name(), "click");
                let n = vm.get("count").ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                vm.set("count", n + 1.0).unwrap();
            }),
    )
}

#[test]
fn event_handler_calls_method() {
    let tree = tree(r#"<div id="app"><button v-on:click="inc">+</button><span>{{ count }}</span></div>"#);
    let vm = counter(&tree).unwrap();
    let button = tree.children(app(&tree))[0];
    assert_eq!(tree.listener_count(button, "click"), 1);

    tree.fire(button, "click");
    tree.fire(button, "click");
    assert_eq!(vm.get("count").unwrap(), Value::from(2));
    assert_eq!(tree.text_content(app(&tree)), "+2");

    vm.call("inc", &Event::new("click", button)).unwrap();
    assert_eq!(tree.text_content(app(&tree)), "+3");
}

#[test]
fn missing_method_fails_fast_and_keeps_structure() {
    let markup = r#"<div id="app"><p>{{ count }}</p><button v-on:click="nope">x</button></div>"#;
    let tree = tree(markup);
    let err = counter(&tree).unwrap_err();
    assert_eq!(
        err,
        VmError::Compile(CompileError::MissingMethod {
            method: "nope".into(),
            event: "click".into(),
            node: tree.children(app(&tree))[1],
        })
    );
    assert_eq!(tree.children(app(&tree)).len(), 2);
}

#[test]
fn event_name_is_required() {
    let tree = tree(r#"<div id="app"><button v-on="inc">x</button></div>"#);
    assert!(matches!(
        counter(&tree),
        Err(VmError::Compile(CompileError::MissingEventName { .. }))
    ));
}

#[test]
fn handlers_are_inert_after_drop_or_dispose() {
    let tree = tree(r#"<div id="app"><button v-on:click="inc"></button><input v-model="count"></div>"#);
    let vm = counter(&tree).unwrap();
    let children = tree.children(app(&tree));
    let (button, input) = (children[0], children[1]);

    vm.dispose();
    tree.fire(button, "click");
    assert_eq!(vm.get("count").unwrap(), Value::from(0));

    let data = vm.data().clone();
    drop(vm);
    tree.input(input, "9");
    assert_eq!(data.peek("count"), Value::from(0));
}

// ============================================================================
// View root and headless mode
// ============================================================================

#[test]
fn selector_must_match() {
    let tree = tree(r#"<div id="other"></div>"#);
    assert_eq!(
        ViewModel::new(Options::new().el(tree, "#app")).unwrap_err(),
        VmError::ViewRootNotFound {
            selector: "#app".into()
        }
    );
}

#[test]
fn headless_model_binds_nothing() {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let vm = ViewModel::new(
        Options::new()
            .data(obj! { "a" => 1 })
            .computed("double", |_| Value::from(2))
            .method("ping", move |_, _| h.set(h.get() + 1)),
    )
    .unwrap();

    assert!(!vm.is_mounted());
    assert_eq!(vm.el(), None);
    assert!(!vm.data().is_reactive());
    assert_eq!(vm.binding_count(), 0);
    assert_eq!(vm.stats(), None);
    assert_eq!(vm.computed("double"), None);
    assert!(matches!(vm.get("a"), Err(VmError::NotProxied { .. })));
    assert_eq!(vm.get_path("a").unwrap(), Value::from(1));

    vm.call("ping", &Event::new("manual", NodeId::new(0))).unwrap();
    assert_eq!(hits.get(), 1);
}

// ============================================================================
// Directive dispatch
// ============================================================================

#[test]
fn unknown_directives_are_ignored_and_counted() {
    let tree = tree(r#"<div id="app"><p v-show="x" v-bind:title="y" class="c">{{ x }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "x" => "ok" }),
    )
    .unwrap();
    let stats = vm.stats().unwrap();
    assert_eq!(stats.unknown_directives, 2);
    assert_eq!(stats.directives, 0);
    assert_eq!(stats.interpolations, 1);
    assert_eq!(stats.elements, 1);
    assert_eq!(stats.text_nodes, 1);
    assert_eq!(tree.text_content(app(&tree)), "ok");
}

fn shout(
    binder: &Binder<'_>,
    node: NodeId,
    expression: &str,
    _event: Option<&str>,
) -> Result<(), CompileError> {
    let tree = Rc::clone(binder.tree());
    let initial = binder.watch(node, &ExpressionPath::parse(expression), move |value| {
        Updater::Value.apply_str(tree.as_ref(), node, &value.to_string().to_uppercase());
    })?;
    Updater::Value.apply_str(binder.tree().as_ref(), node, &initial.to_string().to_uppercase());
    Ok(())
}

#[test]
fn custom_directive_is_dispatched() {
    let tree = tree(r#"<div id="app"><input v-shout="word"></div>"#);
    let mut registry = DirectiveRegistry::with_builtins();
    registry.register("shout", shout);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "word" => "hey" })
            .directives(registry),
    )
    .unwrap();
    let input = tree.children(app(&tree))[0];
    assert_eq!(tree.value(input), "HEY");
    vm.set("word", "quiet").unwrap();
    assert_eq!(tree.value(input), "QUIET");
    assert_eq!(vm.stats().map(|s| s.directives), Some(1));
}

#[test]
fn writes_reach_only_bindings_of_that_path() {
    let tree = tree(r#"<div id="app"><p>{{ a }}</p><p>{{ b }}</p></div>"#);
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(obj! { "a" => 1, "b" => 1 }),
    )
    .unwrap();
    let b_hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&b_hits);
    let _watch_b = vm.watch("b", move |_| h.set(h.get() + 1)).unwrap();

    vm.set("a", 2).unwrap();
    vm.set("a", 2).unwrap();
    assert_eq!(b_hits.get(), 0);
    assert_eq!(tree.text_content(app(&tree)), "21");
    assert_eq!(vm.data().dep("a").map(|d| d.subscriber_count()), Some(1));
}

#[cfg(feature = "json")]
#[test]
fn json_data() {
    let tree = tree(r#"<div id="app"><p>{{ user.tags.1 }}</p></div>"#);
    let options = Options::new()
        .el(Rc::clone(&tree), "#app")
        .data_json(serde_json::json!({ "user": { "tags": ["a", "b"] } }))
        .unwrap();
    let _vm = ViewModel::new(options).unwrap();
    assert_eq!(tree.text_content(app(&tree)), "b");

    assert!(matches!(
        Options::new().data_json(serde_json::json!([1, 2])),
        Err(VmError::DataNotObject { .. })
    ));
}
