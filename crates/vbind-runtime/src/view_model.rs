#![forbid(unsafe_code)]

//! The view-model facade.
//!
//! Construction follows one of two paths:
//!
//! - **Mounted** (options name a view root): the data object is made
//!   reactive, computed definitions are installed as derived properties,
//!   every data key present now is proxied through [`ViewModel::get`] and
//!   [`ViewModel::set`], and the template under the root is compiled.
//! - **Headless** (no view root): data stays plain, nothing is computed,
//!   proxied, or bound. Methods remain callable.
//!
//! # Ownership
//!
//! The view model owns its binding watchers. Event handlers and computed
//! getters hold it weakly, so dropping the last [`ViewModel`] handle tears
//! everything down; handlers that fire afterwards do nothing.
//!
//! # Notification depth
//!
//! [`RuntimeConfig::max_notify_depth`] applies to notifications started by
//! this view model: [`ViewModel::set`], [`ViewModel::set_path`],
//! [`ViewModel::call`], and event handlers installed by its directives. The
//! limit is pinned on the thread for the duration of the write and restored
//! afterwards. Writes made straight through [`Object`] use the thread's
//! limit.
//!
//! # Failure Modes
//!
//! | Failure | Result |
//! |---------|--------|
//! | Selector matches nothing | [`VmError::ViewRootNotFound`] |
//! | Root node is not an element | [`VmError::ViewRootNotElement`] |
//! | `v-on` names an unknown method | [`VmError::Compile`] with [`CompileError::MissingMethod`](crate::CompileError::MissingMethod) |
//! | Strict mode and a binding path does not resolve | [`VmError::Compile`] |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tracing::{debug, info};
use vbind_reactive::{ExpressionPath, Object, Value, Watcher, active, make_reactive};
use vbind_view::{Event, NodeId, ViewTree};

use crate::compiler::{CompileStats, Compiler};
use crate::config::{Method, Options, RuntimeConfig, ViewRoot};
use crate::directive::Binder;
use crate::error::VmError;

/// A bound view model. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ViewModel {
    inner: Rc<VmInner>,
}

/// Non-owning handle to a [`ViewModel`].
#[derive(Clone)]
pub struct WeakViewModel(Weak<VmInner>);

impl WeakViewModel {
    #[must_use]
    pub fn upgrade(&self) -> Option<ViewModel> {
        self.0.upgrade().map(|inner| ViewModel { inner })
    }
}

struct VmInner {
    data: Object,
    tree: Option<Rc<dyn ViewTree>>,
    el: Option<NodeId>,
    methods: AHashMap<String, Method>,
    computed: Vec<String>,
    proxied: Vec<String>,
    config: RuntimeConfig,
    bindings: RefCell<Vec<Watcher>>,
    stats: Cell<Option<CompileStats>>,
    disposed: Cell<bool>,
}

fn resolve_root(tree: &dyn ViewTree, root: &ViewRoot) -> Result<NodeId, VmError> {
    let node = match root {
        ViewRoot::Node(node) => *node,
        ViewRoot::Selector(selector) => {
            tree.query_selector(selector)
                .ok_or_else(|| VmError::ViewRootNotFound {
                    selector: selector.clone(),
                })?
        }
    };
    if !tree.is_element(node) {
        return Err(VmError::ViewRootNotElement { node });
    }
    Ok(node)
}

impl ViewModel {
    /// Build a view model, compiling the template when mounted.
    pub fn new(options: Options) -> Result<Self, VmError> {
        let Options {
            tree,
            root,
            data,
            methods,
            computed,
            config,
            registry,
        } = options;
        let methods: AHashMap<String, Method> = methods.into_iter().collect();

        let (Some(tree), Some(root)) = (tree, root) else {
            debug!(methods = methods.len(), "headless view model");
            return Ok(Self {
                inner: Rc::new(VmInner {
                    data,
                    tree: None,
                    el: None,
                    methods,
                    computed: Vec::new(),
                    proxied: Vec::new(),
                    config,
                    bindings: RefCell::new(Vec::new()),
                    stats: Cell::new(None),
                    disposed: Cell::new(false),
                }),
            });
        };

        let el = resolve_root(tree.as_ref(), &root)?;
        make_reactive(&Value::Object(data.clone()));

        let computed_names: Vec<String> = computed.iter().map(|(name, _)| name.clone()).collect();
        let proxied: Vec<String> = data
            .keys()
            .into_iter()
            .filter(|key| !computed_names.contains(key))
            .collect();

        let inner = Rc::new_cyclic(|weak: &Weak<VmInner>| {
            for (name, getter) in &computed {
                let weak = weak.clone();
                let getter = Rc::clone(getter);
                data.define_computed(
                    name.clone(),
                    Rc::new(move || match weak.upgrade() {
                        Some(inner) => getter(&ViewModel { inner }),
                        None => Value::Undefined,
                    }),
                );
            }
            VmInner {
                data,
                tree: Some(tree),
                el: Some(el),
                methods,
                computed: computed_names,
                proxied,
                config,
                bindings: RefCell::new(Vec::new()),
                stats: Cell::new(None),
                disposed: Cell::new(false),
            }
        });
        let vm = Self { inner };

        let registry = registry.unwrap_or_default();
        if let Some(tree) = vm.inner.tree.as_ref() {
            let binder = Binder::new(&vm, tree);
            let stats = Compiler::new(&registry).compile(&binder, el)?;
            vm.inner.stats.set(Some(stats));
            info!(
                root = %el,
                bindings = vm.binding_count(),
                directives = stats.directives,
                interpolations = stats.interpolations,
                "view model mounted"
            );
        }
        Ok(vm)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakViewModel {
        WeakViewModel(Rc::downgrade(&self.inner))
    }

    /// The resolved view root, when mounted.
    #[must_use]
    pub fn el(&self) -> Option<NodeId> {
        self.inner.el
    }

    #[must_use]
    pub fn tree(&self) -> Option<&Rc<dyn ViewTree>> {
        self.inner.tree.as_ref()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.el.is_some()
    }

    /// The data object (reactive when mounted).
    #[must_use]
    pub fn data(&self) -> &Object {
        &self.inner.data
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Data keys reachable through [`get`](Self::get) and [`set`](Self::set).
    #[must_use]
    pub fn proxied_keys(&self) -> &[String] {
        &self.inner.proxied
    }

    #[must_use]
    pub fn computed_names(&self) -> &[String] {
        &self.inner.computed
    }

    /// Read a proxied data key. Inside a getter this is tracked.
    pub fn get(&self, key: &str) -> Result<Value, VmError> {
        self.check_proxied(key)?;
        Ok(self.inner.data.get(key))
    }

    /// Write a proxied data key; returns whether the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool, VmError> {
        self.check_proxied(key)?;
        let _limit = self.pin_notify_depth();
        Ok(self.inner.data.set(key, value)?)
    }

    fn check_proxied(&self, key: &str) -> Result<(), VmError> {
        if self.inner.proxied.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(VmError::NotProxied {
                key: key.to_owned(),
            })
        }
    }

    /// Resolve a dotted path against the data object.
    pub fn get_path(&self, path: &str) -> Result<Value, VmError> {
        let path = ExpressionPath::parse(path);
        Ok(path.resolve(&self.inner.data, self.inner.config.resolve_mode())?)
    }

    /// Assign through a dotted path; returns whether the value changed.
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<bool, VmError> {
        let path = ExpressionPath::parse(path);
        let _limit = self.pin_notify_depth();
        Ok(path.assign(
            &self.inner.data,
            value.into(),
            self.inner.config.resolve_mode(),
        )?)
    }

    /// Current value of a computed property. `None` when `name` is not a
    /// computed definition of this view model.
    #[must_use]
    pub fn computed(&self, name: &str) -> Option<Value> {
        self.inner
            .computed
            .iter()
            .any(|c| c == name)
            .then(|| self.inner.data.get(name))
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<Method> {
        self.inner.methods.get(name).cloned()
    }

    /// Invoke a method directly.
    pub fn call(&self, name: &str, event: &Event) -> Result<(), VmError> {
        let method = self.method(name).ok_or_else(|| VmError::UnknownMethod {
            name: name.to_owned(),
        })?;
        let _limit = self.pin_notify_depth();
        method(self, event);
        Ok(())
    }

    /// Watch a path on the data object. The returned watcher is owned by
    /// the caller and stops when dropped or disposed. Headless data is not
    /// reactive, so such a watcher never fires.
    pub fn watch<F>(&self, path: &str, callback: F) -> Result<Watcher, VmError>
    where
        F: Fn(&Value) + 'static,
    {
        Ok(Watcher::on_path(
            &self.inner.data,
            ExpressionPath::parse(path),
            self.inner.config.resolve_mode(),
            callback,
        )?)
    }

    /// Live binding watchers owned by this view model.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().len()
    }

    /// Counters from compilation, when mounted.
    #[must_use]
    pub fn stats(&self) -> Option<CompileStats> {
        self.inner.stats.get()
    }

    /// Unsubscribe every binding. Data stays usable; the view stops
    /// following it and event handlers become no-ops.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let bindings = std::mem::take(&mut *self.inner.bindings.borrow_mut());
        for watcher in &bindings {
            watcher.dispose();
        }
        debug!(bindings = bindings.len(), "view model disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Pin this view model's notification limit until the guard drops.
    pub(crate) fn pin_notify_depth(&self) -> active::DepthLimitGuard {
        active::pin_max_notify_depth(self.inner.config.max_notify_depth)
    }

    pub(crate) fn adopt(&self, watcher: Watcher) {
        self.inner.bindings.borrow_mut().push(watcher);
    }
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.inner.methods.keys().collect();
        methods.sort_unstable();
        f.debug_struct("ViewModel")
            .field("el", &self.inner.el)
            .field("proxied", &self.inner.proxied)
            .field("computed", &self.inner.computed)
            .field("methods", &methods)
            .field("bindings", &self.binding_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
