#![forbid(unsafe_code)]

//! Arena-backed in-memory [`ViewTree`].
//!
//! Nodes live in a `Vec` and are never freed; a [`NodeId`] is an index into
//! it. Event handlers are kept per `(node, event)` pair and invoked in
//! registration order by [`MemoryTree::dispatch`].
//!
//! Memory only grows. Nodes replaced by [`ViewTree::set_inner_html`] stay in
//! the arena along with their listener entries, so a `v-html` binding that
//! keeps changing grows the tree without bound. The tree is meant for tests
//! and short-lived documents.

use std::cell::RefCell;
use std::fmt;

use ahash::AHashMap;

use crate::markup::{self, MarkupError};
use crate::{Event, Handler, INPUT_EVENT, NodeId, NodeKind, ViewTree};

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// In-memory view tree.
pub struct MemoryTree {
    root: NodeId,
    nodes: RefCell<Vec<NodeData>>,
    listeners: RefCell<AHashMap<(NodeId, String), Vec<Handler>>>,
}

impl MemoryTree {
    /// Create a tree holding a single empty `root` element.
    #[must_use]
    pub fn new() -> Self {
        let mut root = NodeData::new(NodeKind::Element);
        root.tag = "root".to_owned();
        Self {
            root: NodeId::new(0),
            nodes: RefCell::new(vec![root]),
            listeners: RefCell::new(AHashMap::new()),
        }
    }

    /// Create a tree whose root holds the nodes described by `source`.
    pub fn parse(source: &str) -> Result<Self, MarkupError> {
        let tree = Self::new();
        for node in markup::parse_fragment(&tree, source)? {
            tree.append_child(tree.root, node);
        }
        Ok(tree)
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes ever created.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    fn push(&self, data: NodeData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::new(u32::try_from(nodes.len()).unwrap_or(u32::MAX));
        nodes.push(data);
        id
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag.to_owned();
        self.push(data)
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.to_owned();
        self.push(data)
    }

    /// Create a detached comment node.
    pub fn create_comment(&self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Other);
        data.text = text.to_owned();
        self.push(data)
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    /// Create a text node and append it to `parent`.
    pub fn text_node(&self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text(text);
        self.append_child(parent, node);
        node
    }

    /// Set or replace an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(data) = nodes.get_mut(node.index()) else {
            return;
        };
        match data.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => data.attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow().get(node.index()).and_then(|data| {
            data.attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Tag name of an element; empty for other nodes.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> String {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|d| d.tag.clone())
            .unwrap_or_default()
    }

    /// Current editable value of a control.
    #[must_use]
    pub fn value(&self, node: NodeId) -> String {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|d| d.value.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.index()).and_then(|d| d.parent)
    }

    /// Concatenated text of `node` and all its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            NodeKind::Text => out.push_str(&self.text(node)),
            NodeKind::Element => {
                for child in self.children(node) {
                    self.collect_text(child, out);
                }
            }
            NodeKind::Other => {}
        }
    }

    /// Serialized content of `node` (its children), as markup.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            markup::write_node(self, child, &mut out);
        }
        out
    }

    /// Serialized `node` including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        markup::write_node(self, node, &mut out);
        out
    }

    /// Number of handlers for `event` on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners
            .borrow()
            .get(&(node, event.to_owned()))
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to the handlers registered on its target.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&self, event: &Event) -> usize {
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .get(&(event.target(), event.name().to_owned()))
            .cloned()
            .unwrap_or_default();
        tracing::trace!(node = %event.target(), event = event.name(), handlers = handlers.len(), "dispatch");
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Simulate user input: store `value` in the control and fire `input`.
    pub fn input(&self, node: NodeId, value: &str) -> usize {
        self.set_value(node, value);
        self.dispatch(&Event::new(INPUT_EVENT, node).with_value(value))
    }

    /// Fire a bare event (e.g. `click`) at `node`.
    pub fn fire(&self, node: NodeId, event: &str) -> usize {
        self.dispatch(&Event::new(event, node))
    }

    fn detach(&self, child: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes.get_mut(child.index()).and_then(|d| d.parent.take()) else {
            return;
        };
        if let Some(parent) = nodes.get_mut(parent.index()) {
            parent.children.retain(|c| *c != child);
        }
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        if !self.is_element(node) {
            return false;
        }
        if let Some(id) = selector.strip_prefix('#') {
            self.attribute(node, "id").as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.attribute(node, "class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
        } else {
            self.tag(node).eq_ignore_ascii_case(selector)
        }
    }

    fn find(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        if self.matches(node, selector) {
            return Some(node);
        }
        self.children(node)
            .into_iter()
            .find_map(|child| self.find(child, selector))
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree for MemoryTree {
    fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes
            .borrow()
            .get(node.index())
            .map_or(NodeKind::Other, |d| d.kind)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn detach_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut nodes = self.nodes.borrow_mut();
        let Some(data) = nodes.get_mut(node.index()) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut data.children);
        for child in &children {
            if let Some(c) = nodes.get_mut(child.index()) {
                c.parent = None;
            }
        }
        children
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        if parent == child || self.nodes.borrow().get(parent.index()).is_none() {
            return;
        }
        self.detach(child);
        let mut nodes = self.nodes.borrow_mut();
        if let Some(c) = nodes.get_mut(child.index()) {
            c.parent = Some(parent);
        } else {
            return;
        }
        if let Some(p) = nodes.get_mut(parent.index()) {
            p.children.push(child);
        }
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|d| d.attributes.clone())
            .unwrap_or_default()
    }

    fn text(&self, node: NodeId) -> String {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|d| d.text.clone())
            .unwrap_or_default()
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(d) = self.nodes.borrow_mut().get_mut(node.index()) {
            d.text = text.to_owned();
        }
    }

    fn set_value(&self, node: NodeId, value: &str) {
        if let Some(d) = self.nodes.borrow_mut().get_mut(node.index()) {
            d.value = value.to_owned();
        }
    }

    /// Parses `markup` into new children. Markup that does not parse is
    /// inserted as a single text node.
    fn set_inner_html(&self, node: NodeId, markup: &str) {
        if !self.is_element(node) {
            return;
        }
        self.detach_children(node);
        let children = match markup::parse_fragment(self, markup) {
            Ok(children) => children,
            Err(err) => {
                tracing::debug!(node = %node, error = %err, "inner html kept as text");
                vec![self.create_text(markup)]
            }
        };
        for child in children {
            self.append_child(node, child);
        }
    }

    fn subscribe(&self, node: NodeId, event: &str, handler: Handler) {
        self.listeners
            .borrow_mut()
            .entry((node, event.to_owned()))
            .or_default()
            .push(handler);
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        self.find(self.root, selector)
    }
}

impl fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTree")
            .field("nodes", &self.node_count())
            .field("markup", &self.inner_html(self.root))
            .finish()
    }
}
