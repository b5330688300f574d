#![forbid(unsafe_code)]

//! Template compilation.
//!
//! The root's children are moved into an offline buffer, walked depth-first
//! in document order, and moved back in their previous order. Elements get
//! their directive attributes dispatched through the [`DirectiveRegistry`]
//! before their children are visited; text nodes containing `{{ }}` get a
//! text binding.
//!
//! # Invariants
//!
//! 1. After compilation the root has exactly the children it had before, in
//!    the same order, whether or not an installer failed.
//! 2. Every element and text node in the subtree is visited exactly once.
//!    Children produced by a directive (for example `v-html` markup) are
//!    visited as part of their parent.
//! 3. Unknown directive names are counted and skipped.

use tracing::{debug, trace};
use vbind_view::{NodeId, NodeKind};

use crate::directive::{Binder, Builtin, DirectiveRegistry, parse_directive};
use crate::error::CompileError;
use crate::interpolate::has_interpolation;

/// Counters from one compilation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub elements: usize,
    pub text_nodes: usize,
    /// Directive attributes handed to an installer.
    pub directives: usize,
    /// Text nodes that received an interpolation binding.
    pub interpolations: usize,
    /// `v-*` attributes with no registered installer.
    pub unknown_directives: usize,
}

pub struct Compiler<'r> {
    registry: &'r DirectiveRegistry,
}

impl<'r> Compiler<'r> {
    #[must_use]
    pub fn new(registry: &'r DirectiveRegistry) -> Self {
        Self { registry }
    }

    /// Bind everything below `root`.
    pub fn compile(&self, binder: &Binder<'_>, root: NodeId) -> Result<CompileStats, CompileError> {
        let tree = binder.tree();
        let fragment = tree.detach_children(root);
        debug!(root = %root, nodes = fragment.len(), "compiling fragment");

        let mut stats = CompileStats::default();
        let result = self.compile_nodes(binder, &fragment, &mut stats);

        for node in fragment {
            tree.append_child(root, node);
        }
        result.map(|()| stats)
    }

    fn compile_nodes(
        &self,
        binder: &Binder<'_>,
        nodes: &[NodeId],
        stats: &mut CompileStats,
    ) -> Result<(), CompileError> {
        for &node in nodes {
            match binder.tree().kind(node) {
                NodeKind::Element => {
                    stats.elements += 1;
                    self.compile_element(binder, node, stats)?;
                    let children = binder.tree().children(node);
                    self.compile_nodes(binder, &children, stats)?;
                }
                NodeKind::Text => {
                    stats.text_nodes += 1;
                    self.compile_text(binder, node, stats)?;
                }
                NodeKind::Other => {}
            }
        }
        Ok(())
    }

    fn compile_element(
        &self,
        binder: &Binder<'_>,
        node: NodeId,
        stats: &mut CompileStats,
    ) -> Result<(), CompileError> {
        for (attribute, value) in binder.tree().attributes(node) {
            let Some(directive) = parse_directive(&attribute) else {
                continue;
            };
            match self.registry.get(directive.name) {
                Some(install) => {
                    trace!(node = %node, directive = directive.name, expression = %value, "installing");
                    install(binder, node, &value, directive.event)?;
                    stats.directives += 1;
                }
                None => {
                    debug!(node = %node, attribute = %attribute, "unknown directive ignored");
                    stats.unknown_directives += 1;
                }
            }
        }
        Ok(())
    }

    fn compile_text(
        &self,
        binder: &Binder<'_>,
        node: NodeId,
        stats: &mut CompileStats,
    ) -> Result<(), CompileError> {
        let content = binder.tree().text(node);
        if !has_interpolation(&content) {
            return Ok(());
        }
        let Some(install) = self.registry.get(Builtin::Text.name()) else {
            return Ok(());
        };
        install(binder, node, &content, None)?;
        stats.interpolations += 1;
        Ok(())
    }
}
