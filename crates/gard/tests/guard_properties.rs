//! End-to-end behaviour of guarded views.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gard::{
    Access, Forbidden, Function, Object, ObjectRef, Operation, PermissionSpec, PolicyConfig,
    PropertyAccess, Value, guard,
};
use proptest::prelude::*;

type Calls = Rc<RefCell<Vec<(String, Operation)>>>;

fn recording(result: i64) -> (Forbidden, Calls) {
    let calls: Calls = Rc::default();
    let log = Rc::clone(&calls);
    let forbidden = Forbidden::new(move |property, _, operation, _| {
        log.borrow_mut().push((property.to_string(), operation));
        Ok(Value::from(result))
    });
    (forbidden, calls)
}

fn build(props: &BTreeMap<String, (u8, i64)>) -> (ObjectRef, PermissionSpec) {
    let object: Object = props
        .iter()
        .map(|(name, (_, value))| (name.clone(), Value::from(*value)))
        .collect();
    let spec = PermissionSpec::grants(
        props
            .iter()
            .map(|(name, (bits, _))| (name.clone(), Access::from_bits_truncate(*bits))),
    );
    (ObjectRef::new(object), spec)
}

fn props() -> impl Strategy<Value = BTreeMap<String, (u8, i64)>> {
    prop::collection::btree_map("[a-f]{1,3}", (0u8..8, any::<i64>()), 0..8)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_allowlist_scenario() {
    let source = ObjectRef::new(Object::new().with("a", 1).with("b", 2));
    let view = guard(&source, ["a"], Forbidden::noop()).unwrap();

    assert_eq!(view.get("a").unwrap(), Value::from(1));
    assert_eq!(view.get("b").unwrap(), Value::Undefined);
    assert!(!view.has("b"));
    assert_eq!(view.keys(), vec!["a"]);
}

#[test]
fn test_allowlist_scenario_with_callback() {
    let (forbidden, calls) = recording(-1);
    let source = ObjectRef::new(Object::new().with("a", 1).with("b", 2));
    let view = guard(&source, ["a"], forbidden).unwrap();

    assert_eq!(view.get("b").unwrap(), Value::from(-1));
    assert_eq!(*calls.borrow(), vec![("b".to_string(), Operation::Get)]);
}

#[test]
fn test_readwrite_scenario() {
    let source = ObjectRef::new(Object::new().with("a", 1));
    let view = guard(&source, [("a", Access::READ | Access::WRITE)], Forbidden::noop()).unwrap();

    assert!(view.set("a", 5).unwrap());
    assert_eq!(view.get("a").unwrap(), Value::from(5));
    assert!(!view.delete("a").unwrap());
    assert!(source.has("a"));
}

#[test]
fn test_method_rebinding_scenario() {
    let source = ObjectRef::new(
        Object::new()
            .with("val", 1)
            .with("getVal", Function::new(|this, _| this.get("val"))),
    );
    let view = guard(&source, ["getVal"], Forbidden::noop()).unwrap();

    assert_eq!(view.call("getVal", &[]).unwrap(), Value::from(1));
    assert_eq!(view.get("val").unwrap(), Value::Undefined);
    assert!(!view.has("val"));
}

#[test]
fn test_producer_scenario() {
    let source = ObjectRef::new(Object::new().with("a", 1).with("b", 2));
    let spec = PermissionSpec::producer(|| Ok(PermissionSpec::allow(["b"])));
    let view = guard(&source, spec, Forbidden::noop()).unwrap();

    assert_eq!(view.keys(), vec!["b"]);
}

#[test]
fn test_policy_file_scenario() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("policy.toml");
    std::fs::write(
        &path,
        r#"
            [grants]
            name = "READ"
            "*" = "READ|WRITE"
        "#,
    )
    .unwrap();

    let spec = PolicyConfig::from_file(&path).unwrap().into_spec().unwrap();
    let source = ObjectRef::new(Object::new().with("name", "ada").with("age", 36));
    let view = guard(&source, spec, Forbidden::noop()).unwrap();

    view.set("name", "eve").unwrap();
    view.set("age", 37).unwrap();
    assert_eq!(source.get("name").unwrap(), Value::from("ada"));
    assert_eq!(source.get("age").unwrap(), Value::from(37));
    assert!(!view.delete("age").unwrap());
}

#[test]
fn test_json_spec_scenario() {
    let spec = PermissionSpec::from_json_str(r#"["a"]"#).unwrap();
    let source = ObjectRef::new(Object::new().with("a", 1).with("b", 2));
    let view = guard(&source, spec, Forbidden::noop()).unwrap();
    assert_eq!(view.keys(), vec!["a"]);

    assert!(PermissionSpec::from_json_str("17").is_err());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_unreadable_properties_are_hidden(props in props()) {
        let (source, spec) = build(&props);
        let (forbidden, _calls) = recording(-999_999);
        let view = guard(&source, spec, forbidden).unwrap();
        let keys = view.keys();

        for (name, (bits, value)) in &props {
            let readable = bits & Access::READ.bits() != 0;
            let expected = if readable { *value } else { -999_999 };
            prop_assert_eq!(view.get(name).unwrap(), Value::from(expected));
            prop_assert_eq!(view.has(name), readable);
            prop_assert_eq!(keys.contains(name), readable);
        }
    }

    #[test]
    fn prop_keys_preserve_source_order(props in props()) {
        let (source, spec) = build(&props);
        let view = guard(&source, spec, Forbidden::noop()).unwrap();

        let expected: Vec<String> = source
            .keys()
            .into_iter()
            .filter(|name| props[name].0 & Access::READ.bits() != 0)
            .collect();
        prop_assert_eq!(view.keys(), expected);
    }

    #[test]
    fn prop_set_respects_write(props in props(), replacement in any::<i64>()) {
        let (source, spec) = build(&props);
        let (forbidden, calls) = recording(0);
        let view = guard(&source, spec, forbidden).unwrap();

        for (name, (bits, original)) in &props {
            calls.borrow_mut().clear();
            prop_assert!(view.set(name, replacement).unwrap());

            if bits & Access::WRITE.bits() != 0 {
                prop_assert_eq!(source.get(name).unwrap(), Value::from(replacement));
                let seen = calls.borrow().len();
                prop_assert_eq!(seen, 0);
            } else {
                prop_assert_eq!(source.get(name).unwrap(), Value::from(*original));
                let seen = calls.borrow().clone();
                prop_assert_eq!(seen, vec![(name.clone(), Operation::Set)]);
            }
        }
    }

    #[test]
    fn prop_delete_respects_delete(props in props()) {
        let (source, spec) = build(&props);
        let (forbidden, calls) = recording(0);
        let view = guard(&source, spec, forbidden).unwrap();

        for (name, (bits, _)) in &props {
            calls.borrow_mut().clear();
            let deletable = bits & Access::DELETE.bits() != 0;

            prop_assert_eq!(view.delete(name).unwrap(), deletable);
            prop_assert_eq!(source.has(name), !deletable);
            if !deletable {
                let seen = calls.borrow().clone();
                prop_assert_eq!(seen, vec![(name.clone(), Operation::Delete)]);
            }
        }
    }

    #[test]
    fn prop_identical_specs_behave_identically(props in props(), probe in "[a-f]{1,3}") {
        let (first_source, first_spec) = build(&props);
        let (second_source, second_spec) = build(&props);
        let first = guard(&first_source, first_spec, Forbidden::noop()).unwrap();
        let second = guard(&second_source, second_spec, Forbidden::noop()).unwrap();

        prop_assert_eq!(first.policy(), second.policy());
        prop_assert_eq!(first.keys(), second.keys());
        prop_assert_eq!(first.get(&probe).unwrap(), second.get(&probe).unwrap());
        prop_assert_eq!(first.has(&probe), second.has(&probe));
        prop_assert_eq!(first.set(&probe, 1).unwrap(), second.set(&probe, 1).unwrap());
        prop_assert_eq!(first.delete(&probe).unwrap(), second.delete(&probe).unwrap());
    }
}
