//! Template reconciliation tests
//!
//! Prefabs here record `(root node, applied model)` so tests can check both
//! pool identity (reuse vs. replace) and positional application.

use std::cell::RefCell;
use std::rc::Rc;

use bindery::{Binder, BinderyError, Binding, BindingId, NodeId, Template, Value, View};
use pretty_assertions::assert_eq;
use serde_json::json;

type Log = Rc<RefCell<Vec<(NodeId, Value)>>>;

/// Binder with `row` and `header` prefabs that log what they receive
fn binder_with_log() -> (Binder, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut binder = Binder::new();
    for kind in ["row", "header"] {
        let log = Rc::clone(&log);
        binder.prefabs_mut().register(kind, move |scene, host| {
            let root = scene.create_node(kind, Some(host))?;
            let label = scene.create_node("label", Some(root))?;
            let log = Rc::clone(&log);
            scene.add_binding(
                label,
                Binding::custom(move |m: &Value| log.borrow_mut().push((root, m.clone()))),
            )?;
            Ok(root)
        });
    }
    (binder, log)
}

fn template(binder: &Binder, id: BindingId) -> &Template {
    binder
        .scene()
        .binding(id)
        .and_then(Binding::as_template)
        .expect("template binding")
}

fn roots(binder: &Binder, id: BindingId) -> Vec<Option<NodeId>> {
    template(binder, id)
        .pool()
        .iter()
        .map(|entry| entry.as_ref().map(|e| e.node()))
        .collect()
}

fn rows(n: i64) -> Value {
    let items: Vec<serde_json::Value> = (0..n).map(|i| json!({"type": "row", "n": i})).collect();
    json!({ "items": items }).into()
}

#[test]
fn scenario_c_grow_shrink_grow() {
    let (mut binder, log) = binder_with_log();
    let host = binder.scene_mut().create_node("list", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::new("items", "type"))
        .unwrap();

    binder.apply(id, &rows(0)).unwrap();
    assert!(template(&binder, id).pool().is_empty());
    assert!(log.borrow().is_empty());

    binder.apply(id, &rows(3)).unwrap();
    let first = roots(&binder, id);
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(Option::is_some));

    binder.apply(id, &rows(1)).unwrap();
    assert_eq!(roots(&binder, id), vec![first[0]]);
    assert!(!binder.scene().contains(first[1].unwrap()));
    assert!(!binder.scene().contains(first[2].unwrap()));

    log.borrow_mut().clear();
    binder.apply(id, &rows(4)).unwrap();
    let last = roots(&binder, id);
    assert_eq!(last.len(), 4);
    assert_eq!(last[0], first[0]);
    assert_eq!(binder.scene().node(host).unwrap().children().len(), 4);

    let applied: Vec<Value> = log.borrow().iter().map(|(_, m)| m.clone()).collect();
    let expected: Vec<Value> = (0..4)
        .map(|i| Value::from(json!({"type": "row", "n": i})))
        .collect();
    assert_eq!(applied, expected);
    let applied_roots: Vec<Option<NodeId>> = log.borrow().iter().map(|(r, _)| Some(*r)).collect();
    assert_eq!(applied_roots, last);
}

#[test]
fn kind_mismatch_replaces_only_that_slot() {
    let (mut binder, _log) = binder_with_log();
    let host = binder.scene_mut().create_node("list", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::new("items", "type"))
        .unwrap();

    binder.apply(id, &rows(2)).unwrap();
    let before = roots(&binder, id);

    let mixed: Value = json!({"items": [{"type": "header"}, {"type": "row"}]}).into();
    binder.apply(id, &mixed).unwrap();
    let after = roots(&binder, id);

    assert_ne!(after[0], before[0]);
    assert_eq!(after[1], before[1]);
    assert_eq!(template(&binder, id).pool()[0].as_ref().unwrap().kind(), "header");
}

#[test]
fn reorder_reuses_positionally() {
    let (mut binder, log) = binder_with_log();
    let host = binder.scene_mut().create_node("list", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::fixed("items", "row"))
        .unwrap();

    binder.apply(id, &json!({"items": ["a", "b"]}).into()).unwrap();
    let before = roots(&binder, id);
    log.borrow_mut().clear();

    binder.apply(id, &json!({"items": ["b", "a"]}).into()).unwrap();
    assert_eq!(roots(&binder, id), before);
    let first = log.borrow()[0].clone();
    assert_eq!(first, (before[0].unwrap(), Value::from("b")));
}

#[test]
fn missing_kind_leaves_hole_without_applying() {
    let (mut binder, log) = binder_with_log();
    let host = binder.scene_mut().create_node("list", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::new("items", "type"))
        .unwrap();

    let model: Value = json!({"items": [{"type": "row"}, {"type": null}, {"type": "ghost"}]}).into();
    binder.apply(id, &model).unwrap();

    let pool = roots(&binder, id);
    assert!(pool[0].is_some());
    assert!(pool[1].is_none() && pool[2].is_none());
    assert_eq!(log.borrow().len(), 1);

    // A hole fills in once its kind shows up
    let model: Value = json!({"items": [{"type": "row"}, {"type": "row"}]}).into();
    binder.apply(id, &model).unwrap();
    assert!(roots(&binder, id).iter().all(Option::is_some));
}

#[test]
fn scalar_selection_makes_one_child() {
    let (mut binder, log) = binder_with_log();
    let host = binder.scene_mut().create_node("title", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::fixed("title", "header"))
        .unwrap();

    binder.apply(id, &json!({"title": "Inbox"}).into()).unwrap();
    assert_eq!(template(&binder, id).len(), 1);
    assert_eq!(log.borrow()[0].1, Value::from("Inbox"));
}

#[test]
fn template_inside_view_is_reached_and_narrowed() {
    let (mut binder, log) = binder_with_log();
    let scene = binder.scene_mut();
    let root = scene.create_node("root", None).unwrap();
    let list = scene.create_node("list", Some(root)).unwrap();
    let root_view = scene.add_binding(root, View::narrowed("page")).unwrap();
    let id = scene
        .add_binding(list, Template::fixed("items", "row").with_selector("inbox"))
        .unwrap();

    assert_eq!(binder.scene().scope(root_view), [id]);
    let model: Value = json!({"page": {"inbox": {"items": [1, 2]}}}).into();
    binder.apply(root_view, &model).unwrap();

    let applied: Vec<Value> = log.borrow().iter().map(|(_, m)| m.clone()).collect();
    assert_eq!(applied, vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(template(&binder, id).view().scope().len(), 2);
}

#[test]
fn prefab_errors_do_not_stop_other_slots() {
    let (mut binder, log) = binder_with_log();
    binder
        .prefabs_mut()
        .register("broken", |_scene, _host| {
            Err(BinderyError::UnknownKind {
                kind: "nested".into(),
            })
        });
    let host = binder.scene_mut().create_node("list", None).unwrap();
    let id = binder
        .scene_mut()
        .add_binding(host, Template::new("items", "type"))
        .unwrap();

    let model: Value = json!({"items": [{"type": "broken"}, {"type": "row"}]}).into();
    binder.apply(id, &model).unwrap();
    assert_eq!(roots(&binder, id)[0], None);
    assert_eq!(log.borrow().len(), 1);
}
