//! Shared variants for kernel tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use objcore_model::{ANY, Entity, FieldSpec, FieldType, Value, Variant, shared};

static VALUE_FIELDS: [FieldSpec; 1] = [FieldSpec::new("value", FieldType::Int)];

/// `A { value: int }`, declaring `AChild` as a sub-variant.
pub static A: Variant = Variant::derived("A", &ANY, &VALUE_FIELDS).with_subvariants(&A_SUBVARIANTS);

static A_SUBVARIANTS: [&Variant; 1] = [&A_CHILD];

/// `B { value: int }`, same shape as `A` but a different variant.
pub static B: Variant = Variant::derived("B", &ANY, &VALUE_FIELDS);

static A_CHILD_FIELDS: [FieldSpec; 1] = [FieldSpec::new("extra", FieldType::Text)];

/// Sub-variant of `A`.
pub static A_CHILD: Variant = Variant::derived("AChild", &A, &A_CHILD_FIELDS);

/// Derives from `A` but is not declared by it.
pub static A_DETACHED: Variant = Variant::derived("ADetached", &A, &[]);

static BAG_FIELDS: [FieldSpec; 8] = [
    FieldSpec::new("flag", FieldType::Bool),
    FieldSpec::new("count", FieldType::Int),
    FieldSpec::new("ratio", FieldType::Float),
    FieldSpec::new("label", FieldType::Text),
    FieldSpec::new("items", FieldType::List),
    FieldSpec::new("attrs", FieldType::Map),
    FieldSpec::new("inner", FieldType::Object(&A)),
    FieldSpec::new("extra", FieldType::Any),
];

/// Composite variant covering every field type.
pub static BAG: Variant = Variant::derived("Bag", &ANY, &BAG_FIELDS);

pub fn a(value: i64) -> Entity {
    Entity::with_fields(&A, [("value", value)]).unwrap()
}

pub fn b(value: i64) -> Entity {
    Entity::with_fields(&B, [("value", value)]).unwrap()
}

pub fn a_child(value: i64, extra: &str) -> Entity {
    let mut entity = Entity::new(&A_CHILD);
    entity.set("value", value).unwrap();
    entity.set("extra", extra).unwrap();
    entity
}

pub fn a_detached(value: i64) -> Entity {
    Entity::with_fields(&A_DETACHED, [("value", value)]).unwrap()
}

/// A list that contains itself.
pub fn self_referencing_list(head: Value) -> Value {
    let list = shared(vec![head]);
    let value = Value::List(Rc::clone(&list));
    list.borrow_mut().push(value.clone());
    value
}

pub fn text_map(entries: &[(&str, Value)]) -> Value {
    let map: BTreeMap<String, Value> = entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect();
    Value::map(map)
}

pub fn bag() -> Entity {
    let mut bag = Entity::new(&BAG);
    bag.set("flag", true).unwrap();
    bag.set("count", 3).unwrap();
    bag.set("ratio", 0.5).unwrap();
    bag.set("label", "bag").unwrap();
    bag.set("items", vec![Value::Int(1), Value::from("two")]).unwrap();
    bag.set("attrs", text_map(&[("color", Value::from("red"))])).unwrap();
    bag.set("inner", a(9)).unwrap();
    bag.set("extra", Value::Null).unwrap();
    bag
}

/// Runs `f` against the list stored in `field`.
pub fn with_list<R>(entity: &Entity, field: &str, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
    match entity.get(field) {
        Some(Value::List(items)) => f(&mut items.borrow_mut()),
        other => panic!("field {field} is not a list: {other:?}"),
    }
}
