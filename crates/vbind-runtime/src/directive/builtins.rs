#![forbid(unsafe_code)]

//! Installers for the built-in directives.
//!
//! | Directive | Watches | Writes | Listens |
//! |-----------|---------|--------|---------|
//! | `v-model="p"` | `p` | control value | `input`: assigns the raw string, if any, to `p` |
//! | `v-html="p"` | `p` | element markup | - |
//! | `v-on:e="m"` | - | - | `e`: calls method `m` |
//! | text `{{ p }}...` | each `p` | whole re-rendered template | - |
//!
//! Every installer writes the current value once after registering, so the
//! view is correct before any change happens.

use std::rc::Rc;

use tracing::{debug, warn};
use vbind_reactive::{ExpressionPath, Value, untracked};
use vbind_view::{INPUT_EVENT, NodeId};

use super::{Binder, Updater};
use crate::error::CompileError;
use crate::interpolate::Template;

/// `v-model`: value slot follows the path; `input` events write back the
/// raw control value as a string. An event that carries no value writes
/// nothing.
pub fn model(
    binder: &Binder<'_>,
    node: NodeId,
    expression: &str,
    _event: Option<&str>,
) -> Result<(), CompileError> {
    let path = ExpressionPath::parse(expression);
    let tree = Rc::clone(binder.tree());
    let initial = binder.watch(node, &path, move |value| {
        Updater::Value.apply(tree.as_ref(), node, value);
    })?;

    binder.listen(node, INPUT_EVENT, move |vm, event| {
        let Some(raw) = event.value() else {
            debug!(node = %node, path = %path, "input event without a value, nothing written");
            return;
        };
        if let Err(err) = path.assign(vm.data(), Value::from(raw), vm.config().resolve_mode()) {
            warn!(node = %node, path = %path, error = %err, "v-model write-back failed");
        }
    });

    Updater::Value.apply(binder.tree().as_ref(), node, &initial);
    Ok(())
}

/// `v-html`: element content follows the path, parsed as markup.
pub fn html(
    binder: &Binder<'_>,
    node: NodeId,
    expression: &str,
    _event: Option<&str>,
) -> Result<(), CompileError> {
    let path = ExpressionPath::parse(expression);
    let tree = Rc::clone(binder.tree());
    let initial = binder.watch(node, &path, move |value| {
        Updater::Html.apply(tree.as_ref(), node, value);
    })?;
    Updater::Html.apply(binder.tree().as_ref(), node, &initial);
    Ok(())
}

/// `v-on:<event>`: call the named method with the triggering event.
///
/// The method must exist when the view model is built.
pub fn on(
    binder: &Binder<'_>,
    node: NodeId,
    method: &str,
    event: Option<&str>,
) -> Result<(), CompileError> {
    let event = match event {
        Some(event) if !event.is_empty() => event,
        _ => {
            return Err(CompileError::MissingEventName {
                attribute: format!("v-on:{}", event.unwrap_or_default()),
                node,
            });
        }
    };
    let method = method.trim();
    if binder.vm().method(method).is_none() {
        return Err(CompileError::MissingMethod {
            method: method.to_owned(),
            event: event.to_owned(),
            node,
        });
    }

    let name = method.to_owned();
    binder.listen(node, event, move |vm, event| match vm.method(&name) {
        Some(method) => {
            debug!(method = %name, event = event.name(), "dispatching handler");
            method(vm, event);
        }
        None => warn!(method = %name, "handler method disappeared"),
    });
    Ok(())
}

/// Text interpolation: one watcher per `{{ }}` segment, each re-rendering
/// the whole template into the node.
pub fn text(
    binder: &Binder<'_>,
    node: NodeId,
    content: &str,
    _event: Option<&str>,
) -> Result<(), CompileError> {
    let template = Rc::new(Template::parse(content));
    let mode = binder.mode();

    for path in template.expressions() {
        let template = Rc::clone(&template);
        let tree = Rc::clone(binder.tree());
        let data = binder.vm().data().clone();
        binder.watch(node, path, move |_| {
            match untracked(|| template.render(&data, mode)) {
                Ok(text) => Updater::Text.apply_str(tree.as_ref(), node, &text),
                Err(err) => warn!(node = %node, error = %err, "interpolation failed"),
            }
        })?;
    }

    let initial = template
        .render(binder.vm().data(), mode)
        .map_err(|source| CompileError::Binding {
            expression: template.source().to_owned(),
            node,
            source,
        })?;
    Updater::Text.apply_str(binder.tree().as_ref(), node, &initial);
    Ok(())
}
