#![forbid(unsafe_code)]

//! Writers that push a rendered value into one slot of a view node.

use vbind_reactive::Value;
use vbind_view::{NodeId, ViewTree};

/// The node slot a binding writes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Updater {
    /// The editable value of a control (`v-model`).
    Value,
    /// An element's content, parsed as markup (`v-html`).
    Html,
    /// A text node's content (interpolation).
    Text,
}

impl Updater {
    /// Write the display form of `value` (`undefined` for unresolved paths).
    pub fn apply(self, tree: &dyn ViewTree, node: NodeId, value: &Value) {
        self.apply_str(tree, node, &value.to_string());
    }

    pub fn apply_str(self, tree: &dyn ViewTree, node: NodeId, text: &str) {
        tracing::trace!(node = %node, slot = ?self, "view update");
        match self {
            Self::Value => tree.set_value(node, text),
            Self::Html => tree.set_inner_html(node, text),
            Self::Text => tree.set_text(node, text),
        }
    }
}
