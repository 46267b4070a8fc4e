//! Prefabs - kind key → child sub-tree builder
//!
//! A builder creates a sub-tree under the given host node and returns its
//! root. The root must carry a View (or Template) so the child can receive
//! its item; with `implicit_view` a plain View is attached when it does not.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::binding::BindingId;
use crate::error::{BinderyError, Result};
use crate::scene::{NodeId, Scene};
use crate::view::View;

type Builder = Box<dyn Fn(&mut Scene, NodeId) -> Result<NodeId>>;

#[derive(Default)]
pub struct Prefabs {
    builders: FxHashMap<String, Builder>,
}

impl Prefabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the builder for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, build: F) -> &mut Self
    where
        F: Fn(&mut Scene, NodeId) -> Result<NodeId> + 'static,
    {
        self.builders.insert(kind.into(), Box::new(build));
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build a `kind` child under `host`; returns its root node and root View
    pub fn instantiate(
        &self,
        scene: &mut Scene,
        kind: &str,
        host: NodeId,
        implicit_view: bool,
    ) -> Result<(NodeId, BindingId)> {
        let build = self
            .builders
            .get(kind)
            .ok_or_else(|| BinderyError::UnknownKind { kind: kind.to_string() })?;
        let root = build(scene, host)?;

        let view = match scene.view_on(root) {
            Some(view) => view,
            None if implicit_view => scene.add_binding(root, View::new())?,
            None => {
                scene.destroy(root)?;
                return Err(BinderyError::MissingView { kind: kind.to_string() });
            }
        };
        trace!(kind, node = %root, view = %view, "instantiated prefab");
        Ok((root, view))
    }
}

impl std::fmt::Debug for Prefabs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefabs").field("kinds", &self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_an_error() {
        let mut scene = Scene::new();
        let host = scene.create_node("host", None).unwrap();
        let err = Prefabs::new()
            .instantiate(&mut scene, "row", host, true)
            .unwrap_err();
        assert!(matches!(err, BinderyError::UnknownKind { .. }));
    }

    #[test]
    fn implicit_view_is_attached_to_bare_roots() {
        let mut scene = Scene::new();
        let host = scene.create_node("host", None).unwrap();
        let mut prefabs = Prefabs::new();
        prefabs.register("row", |scene: &mut Scene, host| scene.create_node("row", Some(host)));

        let (root, view) = prefabs.instantiate(&mut scene, "row", host, true).unwrap();
        assert_eq!(scene.view_on(root), Some(view));
        assert_eq!(scene.node(root).unwrap().parent(), Some(host));
    }

    #[test]
    fn bare_root_without_implicit_view_is_rolled_back() {
        let mut scene = Scene::new();
        let host = scene.create_node("host", None).unwrap();
        let mut prefabs = Prefabs::new();
        prefabs.register("row", |scene: &mut Scene, host| scene.create_node("row", Some(host)));

        let err = prefabs.instantiate(&mut scene, "row", host, false).unwrap_err();
        assert!(err.to_string().starts_with("BIND-044"));
        assert!(scene.node(host).unwrap().children().is_empty());
    }

    #[test]
    fn builder_keeps_its_own_view() {
        let mut scene = Scene::new();
        let host = scene.create_node("host", None).unwrap();
        let mut prefabs = Prefabs::new();
        prefabs.register("card", |scene: &mut Scene, host| {
            let root = scene.create_node("card", Some(host))?;
            scene.add_binding(root, View::narrowed("card"))?;
            Ok(root)
        });

        let (root, view) = prefabs.instantiate(&mut scene, "card", host, false).unwrap();
        assert_eq!(scene.node(root).unwrap().bindings(), [view]);
        assert_eq!(prefabs.kinds(), vec!["card"]);
    }
}
