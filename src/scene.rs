//! Scene - minimal host tree with binding storage
//!
//! Nodes and bindings live in arenas addressed by [`NodeId`] and
//! [`BindingId`]; ids are never reused. The scene owns scope partitioning:
//!
//! - **attach** ([`add_binding`](Scene::add_binding)): a View's scope is
//!   computed by walking its sub-tree (inactive nodes included, own node
//!   excluded) and stopping at nodes that carry a nearer View
//! - **reparent** ([`set_parent`](Scene::set_parent)): only bindings whose
//!   owner changes are patched, one prune on the old owner and one branch on
//!   the new owner each; no re-walk
//! - **destroy** ([`destroy`](Scene::destroy)): the sub-tree's exposed
//!   bindings are pruned from their owner
//!
//! The owner of a binding on node `n` is the first View found on a strict
//! ancestor of `n`.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::binding::{Binding, BindingId};
use crate::error::{BinderyError, Result};
use crate::view::View;

/// Handle to a node in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A host tree node
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
    bindings: Vec<BindingId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bindings(&self) -> &[BindingId] {
        &self.bindings
    }
}

/// Binding storage; `binding` is `None` while the binding is applying
#[derive(Debug)]
struct Slot {
    node: NodeId,
    is_view: bool,
    binding: Option<Binding>,
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Option<Node>>,
    bindings: Vec<Option<Slot>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────

    /// Create a node, optionally under `parent`
    pub fn create_node(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(parent) = parent {
            self.node_checked(parent)?;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            name: name.into(),
            parent,
            children: Vec::new(),
            active: true,
            bindings: Vec::new(),
        }));
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<()> {
        self.node_mut(id)?.active = active;
        Ok(())
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).and_then(Node::parent);
        while let Some(node) = current {
            out.push(node);
            current = self.node(node).and_then(Node::parent);
        }
        out
    }

    /// Strict descendants in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_rev(id);
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children_rev(node));
        }
        out
    }

    /// Move `id` under `new_parent` (or make it a root).
    ///
    /// Views whose owner changes receive detach/attach messages; the old
    /// owner loses them and the new owner gains them. No other scope changes.
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<()> {
        let old_parent = self.node_checked(id)?.parent;
        if let Some(parent) = new_parent {
            self.node_checked(parent)?;
            if parent == id || self.ancestors(parent).contains(&id) {
                return Err(BinderyError::ParentCycle {
                    node: id.0,
                    parent: parent.0,
                });
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        let exposed = self.exposed_bindings(id);
        let old_owner = self.nearest_view_above(id);

        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|c| *c != id);
        }
        if let Some(new) = new_parent {
            self.node_mut(new)?.children.push(id);
        }
        self.node_mut(id)?.parent = new_parent;

        let new_owner = self.nearest_view_above(id);
        if old_owner == new_owner {
            return Ok(());
        }

        for &binding in &exposed {
            if let Some(old) = old_owner {
                self.patch_view(old, |view| {
                    view.prune(binding);
                });
            }
            self.patch_view(binding, |view| view.on_detach());
            if let Some(new) = new_owner {
                self.patch_view(new, |view| view.branch(binding));
            }
            self.patch_view(binding, |view| view.on_attach(new_owner));
        }
        debug!(
            node = %id,
            moved = exposed.len(),
            from = ?old_owner,
            to = ?new_owner,
            "patched scopes after reparent"
        );
        Ok(())
    }

    /// Destroy `id` and its sub-tree, dropping every binding on them
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node_checked(id)?.parent;

        let exposed = self.exposed_bindings(id);
        if let Some(owner) = self.nearest_view_above(id) {
            self.patch_view(owner, |view| view.release(&exposed));
        }
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            if let Some(node) = self.nodes.get_mut(node.0).and_then(Option::take) {
                for binding in node.bindings {
                    if let Some(slot) = self.bindings.get_mut(binding.0) {
                        *slot = None;
                    }
                }
            }
        }
        trace!(node = %id, "destroyed sub-tree");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Bindings
    // ─────────────────────────────────────────────────────────────

    /// Attach `binding` to `node`.
    ///
    /// A View computes its scope here (the attach-time full walk) and takes
    /// over the bindings it now owns from the enclosing View. Every binding
    /// joins the enclosing View's scope.
    pub fn add_binding(&mut self, node: NodeId, binding: impl Into<Binding>) -> Result<BindingId> {
        let binding = binding.into();
        let is_view = binding.is_view();
        let claimed = is_view && self.view_on(node).is_none();

        let id = BindingId(self.bindings.len());
        self.node_mut(node)?.bindings.push(id);
        self.bindings.push(Some(Slot {
            node,
            is_view,
            binding: Some(binding),
        }));

        let owner = self.nearest_view_above(node);
        if is_view {
            // Only the first View on a node owns the sub-tree below it
            let scope = if claimed { self.collect_scope(node) } else { Vec::new() };
            if let Some(owner) = owner {
                self.patch_view(owner, |view| view.release(&scope));
            }
            for &child in &scope {
                self.patch_view(child, |view| view.on_attach(Some(id)));
            }
            debug!(binding = %id, node = %node, scope = scope.len(), "view attached");
            self.patch_view(id, |view| {
                view.reset_scope(scope);
                view.on_attach(owner);
            });
        }
        if let Some(owner) = owner {
            self.patch_view(owner, |view| view.branch(id));
        }
        Ok(id)
    }

    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.slot(id)?.binding.as_ref()
    }

    pub fn binding_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(id.0)?.as_mut()?.binding.as_mut()
    }

    /// Host node of a binding
    pub fn binding_node(&self, id: BindingId) -> Option<NodeId> {
        self.slot(id).map(|slot| slot.node)
    }

    pub fn view(&self, id: BindingId) -> Option<&View> {
        self.binding(id)?.as_view()
    }

    /// Scope of a View (empty for anything else)
    pub fn scope(&self, id: BindingId) -> &[BindingId] {
        self.view(id).map(View::scope).unwrap_or(&[])
    }

    /// The View whose scope this binding belongs to
    pub fn owner_of(&self, id: BindingId) -> Option<BindingId> {
        self.nearest_view_above(self.binding_node(id)?)
    }

    /// First View on `node`
    pub fn view_on(&self, node: NodeId) -> Option<BindingId> {
        let node = self.node(node)?;
        node.bindings
            .iter()
            .copied()
            .find(|b| self.slot(*b).is_some_and(|slot| slot.is_view))
    }

    /// Every live View id, in creation order
    pub fn views(&self) -> Vec<BindingId> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|s| s.is_view))
            .map(|(i, _)| BindingId(i))
            .collect()
    }

    /// Every live binding id, in creation order
    pub fn binding_ids(&self) -> Vec<BindingId> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| BindingId(i))
            .collect()
    }

    pub fn is_view(&self, id: BindingId) -> bool {
        self.slot(id).is_some_and(|slot| slot.is_view)
    }

    /// Lend a binding out for `apply`
    pub(crate) fn take_binding(&mut self, id: BindingId) -> Option<Binding> {
        let Some(slot) = self.bindings.get_mut(id.0).and_then(Option::as_mut) else {
            debug!(binding = %id, "binding no longer exists, skipped");
            return None;
        };
        let taken = slot.binding.take();
        if taken.is_none() {
            warn!(binding = %id, "binding is already applying, skipped");
        }
        taken
    }

    /// Return a lent binding; dropped if its node was destroyed meanwhile
    pub(crate) fn restore_binding(&mut self, id: BindingId, binding: Binding) {
        if let Some(slot) = self.bindings.get_mut(id.0).and_then(Option::as_mut) {
            slot.binding = Some(binding);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scope partitioning
    // ─────────────────────────────────────────────────────────────

    /// Bindings below `node` (own node excluded) not claimed by a nearer View
    fn collect_scope(&self, node: NodeId) -> Vec<BindingId> {
        let mut scope = Vec::new();
        let mut stack = self.children_rev(node);
        while let Some(current) = stack.pop() {
            let Some(n) = self.node(current) else {
                continue;
            };
            scope.extend_from_slice(&n.bindings);
            if self.view_on(current).is_none() {
                stack.extend(self.children_rev(current));
            }
        }
        scope
    }

    /// Bindings in `node`'s sub-tree whose owner lies outside it
    pub(crate) fn exposed_bindings(&self, node: NodeId) -> Vec<BindingId> {
        let mut exposed = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(n) = self.node(current) else {
                continue;
            };
            exposed.extend_from_slice(&n.bindings);
            if self.view_on(current).is_none() {
                stack.extend(self.children_rev(current));
            }
        }
        exposed
    }

    fn nearest_view_above(&self, node: NodeId) -> Option<BindingId> {
        self.ancestors(node)
            .into_iter()
            .find_map(|ancestor| self.view_on(ancestor))
    }

    /// Run `f` on a View; no-op for non-views and views that are applying
    fn patch_view(&mut self, id: BindingId, f: impl FnOnce(&mut View)) -> bool {
        match self.binding_mut(id).and_then(Binding::as_view_mut) {
            Some(view) => {
                f(view);
                true
            }
            None => {
                trace!(binding = %id, "scope patch skipped");
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────

    fn slot(&self, id: BindingId) -> Option<&Slot> {
        self.bindings.get(id.0)?.as_ref()
    }

    fn node_checked(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(BinderyError::NodeNotFound { node: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(BinderyError::NodeNotFound { node: id.0 })
    }

    /// Children reversed, so popping a stack visits them in order
    fn children_rev(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default()
    }
}
