//! Property-based tests for the object kernel.
//!
//! These verify the laws every entity must satisfy:
//! - A clone equals its source and shares no storage with it
//! - Decoding an encoding yields a deep-equal entity
//! - Casting to an incompatible variant yields Void and never fails
//!
//! Generated entities include nested sub-variants, entities inside `any`
//! fields, and aliased or self-referencing lists.

mod common;

use std::collections::BTreeMap;

use common::{A, A_CHILD, B, BAG, a, a_child};
use objcore_model::{ANY, Entity, General, KernelError, Value, Variant, safe_cast};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::Text),
    ]
}

fn nested_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::map),
        ]
    })
}

/// How the `items` list relates to the rest of the entity.
#[derive(Debug, Clone, Copy)]
enum Sharing {
    Plain,
    /// `extra` holds the same list as `items`.
    Aliased,
    /// `items` contains itself.
    Cyclic,
}

fn sharing_strategy() -> impl Strategy<Value = Sharing> {
    prop_oneof![Just(Sharing::Plain), Just(Sharing::Aliased), Just(Sharing::Cyclic)]
}

/// `None`, an `A`, or an `AChild` when the text is present.
fn inner_strategy() -> impl Strategy<Value = Option<(i64, Option<String>)>> {
    prop::option::of((any::<i64>(), prop::option::of("[a-z]{0,8}")))
}

fn extra_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        nested_strategy(),
        any::<i64>().prop_map(|value| Value::from(a(value))),
        (any::<i64>(), "[a-z]{0,8}").prop_map(|(value, extra)| Value::from(a_child(value, &extra))),
    ]
}

fn bag_strategy() -> impl Strategy<Value = Entity> {
    (
        (any::<bool>(), any::<i64>(), any::<f64>(), "[ -~]{0,24}"),
        prop::collection::vec(nested_strategy(), 0..4),
        prop::collection::btree_map("[a-z]{1,6}", nested_strategy(), 0..4),
        inner_strategy(),
        extra_strategy(),
        sharing_strategy(),
    )
        .prop_map(|((flag, count, ratio, label), items, attrs, inner, extra, sharing)| {
            let mut bag = Entity::new(&BAG);
            bag.set("flag", flag).unwrap();
            bag.set("count", count).unwrap();
            bag.set("ratio", ratio).unwrap();
            bag.set("label", label).unwrap();
            bag.set("items", items).unwrap();
            bag.set("attrs", attrs.into_iter().collect::<BTreeMap<String, Value>>()).unwrap();
            match inner {
                Some((value, None)) => bag.set("inner", a(value)).unwrap(),
                Some((value, Some(extra))) => bag.set("inner", a_child(value, &extra)).unwrap(),
                None => {}
            }
            bag.set("extra", extra).unwrap();

            let items = bag.get("items").unwrap().clone();
            match sharing {
                Sharing::Plain => {}
                Sharing::Aliased => bag.set("extra", items).unwrap(),
                Sharing::Cyclic => {
                    if let Value::List(list) = &items {
                        list.borrow_mut().push(items.clone());
                    }
                }
            }
            bag
        })
}

fn variant_strategy() -> impl Strategy<Value = &'static Variant> {
    prop_oneof![Just(&A), Just(&B), Just(&A_CHILD), Just(&BAG), Just(&ANY)]
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// A clone equals its source under both equalities.
    #[test]
    fn clone_equals_source(bag in bag_strategy()) {
        let copy = bag.clone();
        prop_assert!(copy.equals(&bag));
        prop_assert!(copy.deep_equals(&bag));
        prop_assert_ne!(copy.id(), bag.id());
    }

    /// Mutating a clone's containers never touches the source.
    #[test]
    fn clone_is_independent(bag in bag_strategy()) {
        let snapshot = bag.clone();
        let copy = bag.clone();
        if let Some(Value::List(items)) = copy.get("items") {
            items.borrow_mut().push(Value::from("mutated"));
        }
        if let Some(Value::Map(attrs)) = copy.get("attrs") {
            attrs.borrow_mut().insert("__mutated".to_string(), Value::Int(1));
        }
        prop_assert!(bag.equals(&snapshot));
        prop_assert!(!bag.equals(&copy));
    }

    /// Decoding an encoding yields a deep-equal entity. Only cyclic values
    /// have no encoding.
    #[test]
    fn roundtrip_is_deep_equal(bag in bag_strategy()) {
        match bag.serialize() {
            Ok(text) => {
                let decoded = Entity::deserialize(&BAG, &text).unwrap();
                prop_assert!(decoded.deep_equals(&bag));
                prop_assert_eq!(decoded.serialize().unwrap(), text);
            }
            Err(e) => prop_assert!(matches!(e, KernelError::DepthExceeded { .. }), "{}", e),
        }
    }

    /// Encoding is a pure function of variant and fields.
    #[test]
    fn encoding_is_deterministic(bag in bag_strategy()) {
        let copy = bag.clone();
        prop_assert_eq!(bag.serialize().ok(), copy.serialize().ok());
    }

    /// Casting yields the source exactly when the variants are compatible.
    #[test]
    fn cast_matches_subvariant_relation(source in variant_strategy(), target in variant_strategy()) {
        let entity = Entity::new(source);
        let cast = safe_cast(Some(&entity), target);
        prop_assert_eq!(cast.is_truthy(), source.is_subvariant_of(target));
        prop_assert_eq!(entity.is_type(target), source.is_subvariant_of(target));
    }

    /// Deserializing arbitrary text never panics; the safe form never errors.
    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,64}") {
        let _ = Entity::deserialize(&BAG, &text);
        let _ = Entity::safe_deserialize(&A, &text);
    }
}
