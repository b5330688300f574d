#![forbid(unsafe_code)]

//! vbind: reactive data bound to a view tree.
//!
//! This crate re-exports the three layers and a prelude:
//!
//! - [`reactive`]: dynamic values, reactive objects, dependencies, watchers.
//! - [`view`]: the [`ViewTree`](view::ViewTree) interface and the in-memory
//!   [`MemoryTree`](view::MemoryTree).
//! - [`runtime`]: template compilation, directives, and the
//!   [`ViewModel`](runtime::ViewModel) facade.
//!
//! ```
//! use std::rc::Rc;
//! use vbind::prelude::*;
//!
//! let tree = Rc::new(MemoryTree::parse(r#"<div id="app"><b>{{ greeting }}</b></div>"#).unwrap());
//! let vm = ViewModel::new(
//!     Options::new()
//!         .el(tree.clone(), "#app")
//!         .data(obj! { "greeting" => "hello" }),
//! )
//! .unwrap();
//!
//! vm.set("greeting", "bonjour").unwrap();
//! assert_eq!(tree.inner_html(vm.el().unwrap()), "<b>bonjour</b>");
//! ```

pub use vbind_reactive as reactive;
pub use vbind_runtime as runtime;
pub use vbind_view as view;

pub use vbind_reactive::obj;

pub mod prelude {
    pub use vbind_reactive::{
        Object, ReactiveError, ReactiveStore, ResolveMode, Value, Watcher, obj,
    };
    pub use vbind_runtime::{
        CompileError, DirectiveRegistry, Options, RuntimeConfig, ViewModel, ViewRoot, VmError,
    };
    pub use vbind_view::{Event, MemoryTree, NodeId, ViewTree};
}
