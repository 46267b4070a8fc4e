//! View - a binding that owns a scope of descendant bindings
//!
//! A View's scope holds every binding below its node that no nearer View
//! claims. The scope is computed wholesale when the View is attached
//! (see [`Scene::add_binding`](crate::scene::Scene::add_binding)) and then
//! patched one entry at a time when views move between parents.
//!
//! Applying a View narrows the model through its optional selector and
//! re-applies every scope entry with the narrowed model; nested Views in the
//! scope recurse into their own scopes.

use std::borrow::Cow;

use tracing::trace;

use crate::binding::{BindingId, Context};
use crate::selector::Selector;
use crate::value::Value;

/// Scope manager embedded by plain views and templates
#[derive(Debug, Clone, Default)]
pub struct View {
    selector: Option<Selector>,
    scope: Vec<BindingId>,
    parent: Option<BindingId>,
}

impl View {
    /// View applying the model unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// View narrowing the model through `selector` before applying its scope
    pub fn narrowed(selector: impl Into<Selector>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Bindings owned by this view, in discovery order
    pub fn scope(&self) -> &[BindingId] {
        &self.scope
    }

    /// Nearest enclosing view, if any
    pub fn parent(&self) -> Option<BindingId> {
        self.parent
    }

    pub fn contains(&self, binding: BindingId) -> bool {
        self.scope.contains(&binding)
    }

    /// The model this view's scope receives
    pub fn narrow<'a>(&self, model: &'a Value) -> Cow<'a, Value> {
        match &self.selector {
            Some(selector) => Cow::Owned(selector.resolve(model)),
            None => Cow::Borrowed(model),
        }
    }

    /// Idempotent insert: `scope = (scope \ {child}) ∪ {child}`
    pub fn branch(&mut self, child: BindingId) {
        self.scope.retain(|b| *b != child);
        self.scope.push(child);
    }

    /// Remove `child` as a unit; returns whether it was present
    pub fn prune(&mut self, child: BindingId) -> bool {
        let before = self.scope.len();
        self.scope.retain(|b| *b != child);
        self.scope.len() != before
    }

    /// Structural message: this view now sits under `parent`
    pub fn on_attach(&mut self, parent: Option<BindingId>) {
        self.parent = parent;
    }

    /// Structural message: this view left its parent
    pub fn on_detach(&mut self) {
        self.parent = None;
    }

    pub(crate) fn reset_scope(&mut self, scope: Vec<BindingId>) {
        self.scope = scope;
    }

    pub(crate) fn release(&mut self, bindings: &[BindingId]) {
        self.scope.retain(|b| !bindings.contains(b));
    }

    pub(crate) fn apply(&self, cx: &mut Context<'_>, model: &Value) {
        let narrowed = self.narrow(model);
        trace!(scope = self.scope.len(), "applying view scope");
        for &binding in &self.scope {
            cx.apply(binding, &narrowed);
        }
    }
}
