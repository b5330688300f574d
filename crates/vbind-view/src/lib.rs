#![forbid(unsafe_code)]

//! The view tree that vbind binds against.
//!
//! The runtime never owns nodes. It talks to a [`ViewTree`] implementation
//! through opaque [`NodeId`]s: walk children, move nodes in and out of an
//! offline buffer, read attributes, write text/value/markup slots, and
//! subscribe to events.
//!
//! [`MemoryTree`] is a complete in-memory implementation with a small markup
//! reader and writer. It backs the test suites and headless demos.
//!
//! # Contract
//!
//! 1. All methods take `&self`; implementations use interior mutability
//!    because bindings write into the tree long after compilation.
//! 2. Unknown node ids are tolerated: reads return empty results and writes
//!    are ignored.
//! 3. Handlers registered through [`ViewTree::subscribe`] are invoked with no
//!    tree borrow held, so a handler may read and write the tree.

pub mod markup;
pub mod memory;

use std::fmt;
use std::rc::Rc;

pub use markup::MarkupError;
pub use memory::MemoryTree;

/// Opaque handle to a node in a [`ViewTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    /// Anything else (comments, processing nodes). Never bound.
    Other,
}

/// An event delivered to a subscribed handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    name: String,
    target: NodeId,
    value: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    /// Attach the control's current raw value (input-change events).
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Raw value carried by the event, if the source control has one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Event handler stored by a tree.
pub type Handler = Rc<dyn Fn(&Event)>;

/// Name of the event a control fires when its editable value changes.
pub const INPUT_EVENT: &str = "input";

/// The view-tree collaborator.
pub trait ViewTree {
    /// Classify `node`.
    fn kind(&self, node: NodeId) -> NodeKind;

    /// Children of `node`, in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Detach every child of `node` and hand them back in order.
    ///
    /// Detached nodes keep their own subtrees and stay addressable.
    fn detach_children(&self, node: NodeId) -> Vec<NodeId>;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Attributes of an element as `(name, value)` pairs, in source order.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    /// Text content of a text node.
    fn text(&self, node: NodeId) -> String;

    fn set_text(&self, node: NodeId, text: &str);

    /// Write the editable-value slot of a control.
    fn set_value(&self, node: NodeId, value: &str);

    /// Replace an element's content with raw markup.
    fn set_inner_html(&self, node: NodeId, markup: &str);

    /// Register `handler` for `event` on `node`.
    fn subscribe(&self, node: NodeId, event: &str, handler: Handler);

    /// Find the first node matching `selector`. Trees without selector
    /// support return `None`.
    fn query_selector(&self, _selector: &str) -> Option<NodeId> {
        None
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == NodeKind::Element
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.kind(node) == NodeKind::Text
    }
}
