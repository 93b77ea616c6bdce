use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use scene_data::{DataSchema, DataWrapper, DependencyRegistry, DeriveOptions, ParamRef};
use serde_json::json;

struct Scene {
    registry: Rc<DependencyRegistry>,
    root: DataWrapper,
}

impl Scene {
    fn new() -> Self {
        let registry = Rc::new(DependencyRegistry::new());
        let root = DataWrapper::root_with_registry(
            Rc::new(DataSchema::new()),
            Rc::clone(&registry),
            json!({}),
        );
        Scene { registry, root }
    }

    fn instance(&self, id: &str) -> DataWrapper {
        self.root.derive(json!({"id": id}), DeriveOptions::new())
    }
}

fn counter(wrapper: &DataWrapper) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let inner = Rc::clone(&hits);
    wrapper.on_change(move || inner.set(inner.get() + 1));
    hits
}

#[test]
fn dependency_propagation_matrix_notify_reaches_dependents_once() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let b = scene.instance("B");
    b.add_to_dependencies("A");
    let hits = counter(&b);

    a.notify();
    assert_eq!(hits.get(), 1);
    assert_eq!(*b.own_data(), json!({"id": "B"}));
}

#[test]
fn dependency_propagation_matrix_is_one_hop() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let b = scene.instance("B");
    let c = scene.instance("C");
    b.add_to_dependencies("A");
    c.add_to_dependencies("B");
    let b_hits = counter(&b);
    let c_hits = counter(&c);

    a.set("intensity", json!(2)).unwrap();
    assert_eq!(b_hits.get(), 1);
    assert_eq!(c_hits.get(), 0);
}

#[test]
fn dependency_propagation_matrix_bound_markers_register_automatically() {
    let scene = Scene::new();
    let light = scene.instance("light-1");
    let mesh = scene.instance("mesh-1");
    mesh.set("material.emissive", ParamRef::bind("light-1").into())
        .unwrap();
    assert!(scene.registry.contains("light-1"));
    let hits = counter(&mesh);

    light.set("intensity", json!(3)).unwrap();
    assert_eq!(hits.get(), 1);

    mesh.set("material.emissive", json!("#000000")).unwrap();
    assert!(!scene.registry.contains("light-1"));
    light.set("intensity", json!(4)).unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn dependency_propagation_matrix_prefab_map_resolves_ids() {
    let scene = Scene::new();
    let concrete = scene.instance("light-7");
    let mesh = scene.instance("mesh-1");
    mesh.set_prefab_map(HashMap::from([("light".to_string(), "light-7".to_string())]));
    mesh.set("color", ParamRef::bind("light").into()).unwrap();
    assert!(scene.registry.contains("light-7"));
    assert!(!scene.registry.contains("light"));

    let hits = counter(&mesh);
    concrete.notify();
    assert_eq!(hits.get(), 1);
}

#[test]
fn dependency_propagation_matrix_dispose_unregisters() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let b = scene.instance("B");
    b.add_to_dependencies("A");
    b.set("tint", ParamRef::bind("A").into()).unwrap();
    let hits = counter(&b);
    b.dispose();
    assert!(!scene.registry.contains("A"));
    a.notify();
    assert_eq!(hits.get(), 0);
}

#[test]
fn dependency_propagation_matrix_mutual_bindings_terminate() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let b = scene.instance("B");
    a.add_to_dependencies("B");
    b.add_to_dependencies("A");
    let a_hits = counter(&a);
    let b_hits = counter(&b);

    a.notify();
    assert_eq!(a_hits.get(), 1);
    assert_eq!(b_hits.get(), 1);
}

#[test]
fn dependency_propagation_matrix_paused_wrapper_swallows_fan_out() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let b = scene.instance("B");
    b.add_to_dependencies("A");
    let hits = counter(&b);

    a.pause_notifications();
    a.set("x", json!(1)).unwrap();
    a.set("y", json!(2)).unwrap();
    assert_eq!(hits.get(), 0);
    a.resume_notifications(true);
    assert_eq!(hits.get(), 1);
}

#[test]
fn dependency_propagation_matrix_nested_write_reaches_every_dependent() {
    let scene = Scene::new();
    let a = scene.instance("A");
    let c = scene.instance("C");
    let b = scene.instance("B");
    c.add_to_dependencies("A");
    b.add_to_dependencies("A");

    let seen_by_c = Rc::new(Cell::new(0));
    let sink = Rc::clone(&seen_by_c);
    let source = a.clone();
    c.on_change(move || {
        let v = source.get("v").and_then(|v| v.as_i64()).unwrap_or(0);
        sink.set(v);
    });
    let source = a.clone();
    b.on_change(move || {
        if source.get("v") == Some(json!(1)) {
            source.set("v", json!(2)).unwrap();
        }
    });

    a.set("v", json!(1)).unwrap();
    assert_eq!(a.get("v"), Some(json!(2)));
    assert_eq!(seen_by_c.get(), 2);
}

#[test]
fn dependency_propagation_matrix_prefab_map_change_rekeys_bindings() {
    let scene = Scene::new();
    let generic = scene.instance("light");
    let concrete = scene.instance("light-7");
    let mesh = scene.instance("mesh-1");
    mesh.set("color", ParamRef::bind("light").into()).unwrap();
    assert!(scene.registry.contains("light"));

    mesh.set_prefab_map(HashMap::from([("light".to_string(), "light-7".to_string())]));
    assert!(scene.registry.contains("light-7"));
    assert!(!scene.registry.contains("light"));
    let hits = counter(&mesh);
    generic.notify();
    assert_eq!(hits.get(), 0);
    concrete.notify();
    assert_eq!(hits.get(), 1);

    mesh.unset("color").unwrap();
    assert!(!scene.registry.contains("light-7"));
    assert!(mesh.dependencies().is_empty());
}
