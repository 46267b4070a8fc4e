//! Template - a View that reconciles a sequence against a pool of children
//!
//! Each apply derives `items` from the narrowed model, then walks the pool
//! positionally:
//!
//! ```text
//! i < min(N, C)   kind matches  → reuse pool[i]
//!                 kind differs  → destroy pool[i], create wanted kind
//! i ≥ C           (N > C)       → create and append
//! i ≥ N           (C > N)       → destroy and truncate
//! ```
//!
//! An item without a usable kind leaves a hole (`None`) at its index.
//! Reuse is by position and kind only: reordering same-kind items re-applies
//! children in place instead of moving them.

use tracing::{debug, warn};

use crate::binding::{BindingId, Context};
use crate::scene::NodeId;
use crate::selector::Selector;
use crate::value::Value;
use crate::view::View;

/// Where a pooled child's kind key comes from
#[derive(Debug, Clone, PartialEq)]
pub enum KindSource {
    /// Resolved against each item (`Value::kind_key`)
    Selector(Selector),
    /// Same prefab for every item
    Fixed(String),
}

impl KindSource {
    pub fn resolve(&self, item: &Value) -> Option<String> {
        match self {
            KindSource::Selector(selector) => selector.resolve(item).kind_key(),
            KindSource::Fixed(kind) if kind.is_empty() => None,
            KindSource::Fixed(kind) => Some(kind.clone()),
        }
    }
}

/// A live pooled child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    kind: String,
    node: NodeId,
    view: BindingId,
}

impl PoolEntry {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Root node of the instantiated prefab
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// View on the prefab root that receives the item
    pub fn view(&self) -> BindingId {
        self.view
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    view: View,
    items: Selector,
    kind: KindSource,
    pool: Vec<Option<PoolEntry>>,
}

impl Template {
    /// Template whose children's kind is read from each item through `kind`
    pub fn new(items: impl Into<Selector>, kind: impl Into<Selector>) -> Self {
        Self::with_kind(items, KindSource::Selector(kind.into()))
    }

    /// Template instantiating the same prefab for every item
    pub fn fixed(items: impl Into<Selector>, kind: impl Into<String>) -> Self {
        Self::with_kind(items, KindSource::Fixed(kind.into()))
    }

    pub fn with_kind(items: impl Into<Selector>, kind: KindSource) -> Self {
        Self {
            view: View::new(),
            items: items.into(),
            kind,
            pool: Vec::new(),
        }
    }

    /// Narrow the model before selecting items
    pub fn with_selector(mut self, selector: impl Into<Selector>) -> Self {
        self.view = View::narrowed(selector);
        self
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn items(&self) -> &Selector {
        &self.items
    }

    pub fn kind(&self) -> &KindSource {
        &self.kind
    }

    /// Pool slots by item index; `None` is a hole
    pub fn pool(&self) -> &[Option<PoolEntry>] {
        &self.pool
    }

    /// Number of live children
    pub fn len(&self) -> usize {
        self.pool.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items for one pass: a sequence as-is, anything else as a single item
    fn select_items(&self, model: &Value) -> Vec<Value> {
        match self.items.resolve(&self.view.narrow(model)) {
            Value::Sequence(items) => items.into_vec(),
            other => vec![other],
        }
    }

    pub(crate) fn apply(&mut self, cx: &mut Context<'_>, id: BindingId, model: &Value) {
        let items = self.select_items(model);
        let wanted: Vec<Option<String>> = items.iter().map(|item| self.kind.resolve(item)).collect();
        let (n, c) = (items.len(), self.pool.len());
        let (mut created, mut destroyed) = (0usize, 0usize);

        for (i, kind) in wanted.iter().enumerate().take(n.min(c)) {
            let reusable = matches!(
                (&self.pool[i], kind),
                (Some(entry), Some(kind)) if entry.kind == *kind
            );
            if reusable {
                continue;
            }
            if let Some(stale) = self.pool[i].take() {
                self.release(cx, stale);
                destroyed += 1;
            }
            if let Some(kind) = kind {
                self.pool[i] = self.create(cx, id, kind);
                created += usize::from(self.pool[i].is_some());
            }
        }

        for kind in wanted.iter().skip(c) {
            let entry = kind.as_deref().and_then(|kind| self.create(cx, id, kind));
            created += usize::from(entry.is_some());
            self.pool.push(entry);
        }

        if c > n {
            let stale: Vec<PoolEntry> = self.pool.drain(n..).flatten().collect();
            destroyed += stale.len();
            for entry in stale {
                self.release(cx, entry);
            }
        }

        if created > 0 || destroyed > 0 {
            debug!(template = %id, items = n, created, destroyed, "reconciled pool");
        }

        for (entry, item) in self.pool.iter().zip(&items) {
            if let Some(entry) = entry {
                cx.apply(entry.view, item);
            }
        }
    }

    fn create(&mut self, cx: &mut Context<'_>, id: BindingId, kind: &str) -> Option<PoolEntry> {
        let host = cx.scene.binding_node(id)?;
        let implicit_view = cx.config.template.implicit_view;
        match cx.prefabs.instantiate(cx.scene, kind, host, implicit_view) {
            Ok((node, view)) => {
                // The scene cannot patch this scope while the template is applying
                for binding in cx.scene.exposed_bindings(node) {
                    self.view.branch(binding);
                }
                Some(PoolEntry {
                    kind: kind.to_string(),
                    node,
                    view,
                })
            }
            Err(e) => {
                warn!(template = %id, kind, error = %e, "cannot instantiate child, leaving a hole");
                None
            }
        }
    }

    fn release(&mut self, cx: &mut Context<'_>, entry: PoolEntry) {
        for binding in cx.scene.exposed_bindings(entry.node) {
            self.view.prune(binding);
        }
        if let Err(e) = cx.scene.destroy(entry.node) {
            debug!(node = %entry.node, error = %e, "pooled child was already gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Converters;
    use crate::config::Config;
    use crate::prefab::Prefabs;
    use crate::scene::Scene;
    use serde_json::json;

    fn prefabs() -> Prefabs {
        let mut prefabs = Prefabs::new();
        prefabs.register("row", |scene: &mut Scene, host| scene.create_node("row", Some(host)));
        prefabs.register("header", |scene: &mut Scene, host| {
            scene.create_node("header", Some(host))
        });
        prefabs
    }

    fn run(scene: &mut Scene, prefabs: &Prefabs, id: BindingId, model: serde_json::Value) {
        let config = Config::default();
        let mut cx = Context::new(scene, prefabs, Converters::global(), &config);
        cx.apply(id, &model.into());
    }

    fn pool_kinds(scene: &Scene, id: BindingId) -> Vec<Option<String>> {
        scene
            .binding(id)
            .and_then(|b| b.as_template())
            .map(|t| {
                t.pool()
                    .iter()
                    .map(|e| e.as_ref().map(|e| e.kind().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn kind_source_resolution() {
        let by_type = KindSource::Selector("type".into());
        assert_eq!(by_type.resolve(&json!({"type": "row"}).into()), Some("row".into()));
        assert_eq!(by_type.resolve(&json!({"type": ""}).into()), None);
        assert_eq!(by_type.resolve(&json!({}).into()), None);

        assert_eq!(KindSource::Fixed("row".into()).resolve(&Value::Null), Some("row".into()));
        assert_eq!(KindSource::Fixed(String::new()).resolve(&Value::Null), None);
    }

    #[test]
    fn scalar_is_promoted_to_one_item() {
        let template = Template::fixed("title", "row");
        let items = template.select_items(&json!({"title": "hello"}).into());
        assert_eq!(items, vec![Value::from("hello")]);
    }

    #[test]
    fn kind_change_replaces_in_place() {
        let mut scene = Scene::new();
        let prefabs = prefabs();
        let host = scene.create_node("list", None).unwrap();
        let id = scene.add_binding(host, Template::new("items", "type")).unwrap();

        run(&mut scene, &prefabs, id, json!({"items": [{"type": "row"}, {"type": "row"}]}));
        let first = scene.binding(id).unwrap().as_template().unwrap().pool()[1].clone();

        run(&mut scene, &prefabs, id, json!({"items": [{"type": "row"}, {"type": "header"}]}));
        assert_eq!(pool_kinds(&scene, id), vec![Some("row".into()), Some("header".into())]);
        assert!(!scene.contains(first.unwrap().node()));
    }

    #[test]
    fn unknown_kind_leaves_a_hole() {
        let mut scene = Scene::new();
        let prefabs = prefabs();
        let host = scene.create_node("list", None).unwrap();
        let id = scene.add_binding(host, Template::new("items", "type")).unwrap();

        run(
            &mut scene,
            &prefabs,
            id,
            json!({"items": [{"type": "row"}, {"type": "ghost"}, {}, {"type": "row"}]}),
        );
        assert_eq!(
            pool_kinds(&scene, id),
            vec![Some("row".into()), None, None, Some("row".into())]
        );
        let template = scene.binding(id).unwrap().as_template().unwrap();
        assert_eq!(template.len(), 2);
        assert_eq!(template.view().scope().len(), 2);
    }

    #[test]
    fn empty_sequence_clears_the_pool() {
        let mut scene = Scene::new();
        let prefabs = prefabs();
        let host = scene.create_node("list", None).unwrap();
        let id = scene.add_binding(host, Template::fixed("items", "row")).unwrap();

        run(&mut scene, &prefabs, id, json!({"items": [1, 2, 3]}));
        assert_eq!(scene.node(host).unwrap().children().len(), 3);

        run(&mut scene, &prefabs, id, json!({"items": []}));
        let template = scene.binding(id).unwrap().as_template().unwrap();
        assert!(template.is_empty());
        assert!(template.view().scope().is_empty());
        assert!(scene.node(host).unwrap().children().is_empty());
    }
}
