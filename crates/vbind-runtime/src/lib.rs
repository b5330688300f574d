#![forbid(unsafe_code)]

//! Template compilation and the view-model facade.
//!
//! A [`ViewModel`] is built from [`Options`]: a view tree with a root node,
//! a data [`Object`](vbind_reactive::Object), methods, and computed
//! definitions. Building it compiles every directive and `{{ }}`
//! interpolation under the root into watchers that keep the view in sync
//! with the data.
//!
//! ```
//! use std::rc::Rc;
//! use vbind_reactive::obj;
//! use vbind_runtime::{Options, ViewModel};
//! use vbind_view::{MemoryTree, ViewTree};
//!
//! let tree = Rc::new(
//!     MemoryTree::parse(r#"<div id="app"><input v-model="name"><p>Hi {{ name }}</p></div>"#)
//!         .unwrap(),
//! );
//! let vm = ViewModel::new(
//!     Options::new()
//!         .el(tree.clone(), "#app")
//!         .data(obj! { "name" => "Ada" }),
//! )
//! .unwrap();
//!
//! let app = vm.el().unwrap();
//! let input = tree.children(app)[0];
//! tree.input(input, "Grace");
//! assert_eq!(vm.get("name").unwrap().to_string(), "Grace");
//! assert_eq!(tree.inner_html(app), r#"<input v-model="name"><p>Hi Grace</p>"#);
//! ```

pub mod compiler;
pub mod config;
pub mod directive;
pub mod error;
pub mod interpolate;
pub mod view_model;

pub use compiler::{CompileStats, Compiler};
pub use config::{ComputedFn, Method, Options, RuntimeConfig, ViewRoot};
pub use directive::{Binder, Builtin, DirectiveRegistry, Installer, Updater};
pub use error::{CompileError, ConfigError, VmError};
pub use interpolate::{Template, render_template};
pub use view_model::{ViewModel, WeakViewModel};
