mod common;

use std::rc::Rc;

use common::{A, A_CHILD, A_DETACHED, B, BAG, a, a_child, a_detached, bag, text_map};
use objcore_model::{
    ANY, Codec, CodecConfig, Entity, General, KernelError, OrVoid, Registry, VOID_ENCODING, Value,
    shared,
};
use pretty_assertions::assert_eq;

// ── Encoding ─────────────────────────────────────────────────────

#[test]
fn encoding_is_canonical() {
    assert_eq!(a(1).serialize().unwrap(), r#"{"fields":{"value":1},"variant":"A"}"#);
}

#[test]
fn encoding_sorts_keys_at_every_level() {
    let mut entity = Entity::new(&BAG);
    entity
        .set("attrs", text_map(&[("zeta", Value::Int(1)), ("alpha", Value::Int(2))]))
        .unwrap();
    let text = entity.serialize().unwrap();
    assert_eq!(
        text,
        r#"{"fields":{"attrs":{"alpha":2,"zeta":1},"count":0,"extra":null,"flag":false,"inner":null,"items":[],"label":"","ratio":0.0},"variant":"Bag"}"#
    );
}

#[test]
fn equal_entities_encode_identically() {
    assert_eq!(bag().serialize().unwrap(), bag().serialize().unwrap());
}

#[test]
fn non_finite_floats_are_written_as_text() {
    let mut entity = Entity::new(&BAG);
    entity.set("ratio", f64::NAN).unwrap();
    entity.set("extra", vec![Value::Float(f64::INFINITY), Value::Float(f64::NEG_INFINITY)]).unwrap();
    let text = entity.serialize().unwrap();
    assert!(text.contains(r#""ratio":"NaN""#));
    assert!(text.contains(r#""extra":["inf","-inf"]"#));

    let decoded = Entity::deserialize(&BAG, &text).unwrap();
    assert!(decoded.get("ratio").unwrap().as_float().unwrap().is_nan());
    assert!(decoded.deep_equals(&entity));
}

#[test]
fn pretty_output_decodes_to_same_entity() {
    let codec = Codec::new(CodecConfig {
        pretty: true,
        ..CodecConfig::default()
    });
    let original = bag();
    let text = original.serialize_with(&codec).unwrap();
    assert!(text.contains('\n'));
    let decoded = Entity::deserialize(&BAG, &text).unwrap();
    assert!(decoded.deep_equals(&original));
}

#[test]
fn reference_cycle_exceeds_depth() {
    let list = shared(Vec::new());
    let value = Value::List(Rc::clone(&list));
    list.borrow_mut().push(value.clone());

    let mut entity = Entity::new(&BAG);
    entity.set("items", value).unwrap();

    let err = entity.serialize().unwrap_err();
    assert!(matches!(err, KernelError::DepthExceeded { max_depth: 64 }));
    assert!(entity.safe_serialize().is_void());
    // Falls back to field-wise comparison.
    assert!(entity.deep_equals(&entity));
    assert!(entity.clone().deep_equals(&entity));
}

#[test]
fn depth_limit_is_configurable() {
    let codec = Codec::new(CodecConfig {
        max_depth: 2,
        ..CodecConfig::default()
    });
    let mut entity = Entity::new(&BAG);
    entity.set("extra", vec![Value::list(vec![Value::Int(1)])]).unwrap();
    assert!(matches!(
        entity.serialize_with(&codec).unwrap_err(),
        KernelError::DepthExceeded { max_depth: 2 }
    ));
    assert!(entity.serialize().is_ok());
}

// ── Decoding ─────────────────────────────────────────────────────

#[test]
fn roundtrip_composite() {
    let original = bag();
    let decoded = Entity::deserialize(&BAG, &original.serialize().unwrap()).unwrap();
    assert!(decoded.deep_equals(&original));
    assert!(decoded.equals(&original));
    assert_eq!(decoded.describe(), original.describe());
}

#[test]
fn missing_fields_keep_defaults() {
    let decoded = Entity::deserialize(&BAG, r#"{"fields":{"count":7},"variant":"Bag"}"#).unwrap();
    assert_eq!(decoded.get("count"), Some(&Value::Int(7)));
    assert_eq!(decoded.get("label"), Some(&Value::from("")));
}

#[test]
fn malformed_text_fails() {
    for text in ["", "not json", "{", "[1,2]", r#"{"variant":"A"}"#, r#"{"fields":{},"variant":1}"#] {
        let err = Entity::deserialize(&A, text).unwrap_err();
        assert!(
            matches!(err, KernelError::Deserialization(_)),
            "{text:?} gave {err}"
        );
    }
}

#[test]
fn extra_envelope_keys_fail() {
    let err = Entity::deserialize(&A, r#"{"fields":{},"id":1,"variant":"A"}"#).unwrap_err();
    assert!(matches!(err, KernelError::Deserialization(_)));
}

#[test]
fn fields_must_be_an_object() {
    let err = Entity::deserialize(&A, r#"{"fields":[],"variant":"A"}"#).unwrap_err();
    assert!(err.to_string().contains("is not an object"));
}

#[test]
fn undeclared_field_fails() {
    let err = Entity::deserialize(&A, r#"{"fields":{"nope":1},"variant":"A"}"#).unwrap_err();
    assert!(err.to_string().contains("has no field `nope`"));
}

#[test]
fn wrong_field_kind_fails() {
    let err = Entity::deserialize(&A, r#"{"fields":{"value":"1"},"variant":"A"}"#).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("field `value`"), "{msg}");
    assert!(msg.contains("expected int, got string"), "{msg}");
}

#[test]
fn float_field_rejects_finite_text() {
    let text = r#"{"fields":{"ratio":"1.5"},"variant":"Bag"}"#;
    assert!(Entity::deserialize(&BAG, text).is_err());
}

#[test]
fn float_field_accepts_integer_literal() {
    let decoded = Entity::deserialize(&BAG, r#"{"fields":{"ratio":2},"variant":"Bag"}"#).unwrap();
    assert_eq!(decoded.get("ratio"), Some(&Value::Float(2.0)));
}

#[test]
fn tag_mismatch_fails() {
    let err = Entity::deserialize(&B, &a(1).serialize().unwrap()).unwrap_err();
    assert!(err.to_string().contains("not compatible with `B`"));
}

#[test]
fn declared_sub_variant_payload_decodes() {
    let text = a_child(1, "c").serialize().unwrap();
    let decoded = Entity::deserialize(&A, &text).unwrap();
    assert_eq!(decoded.variant(), &A_CHILD);
    assert_eq!(decoded.get("extra"), Some(&Value::from("c")));
}

#[test]
fn undeclared_sub_variant_payload_needs_registry() {
    let text = a_detached(1).serialize().unwrap();
    assert!(Entity::deserialize(&A, &text).is_err());

    let registry = Registry::with_variants([&A_DETACHED]);
    let decoded = registry.codec(CodecConfig::default()).decode(&A, &text).unwrap();
    assert_eq!(decoded.variant(), &A_DETACHED);
}

#[test]
fn nested_sub_variant_roundtrip() {
    let mut original = Entity::new(&BAG);
    original.set("inner", a_child(2, "nested")).unwrap();
    let text = original.serialize().unwrap();

    let decoded = Entity::deserialize(&BAG, &text).unwrap();
    assert!(decoded.deep_equals(&original));
    assert!(decoded.equals(&original));
    let Some(Value::Object(inner)) = decoded.get("inner") else {
        panic!("inner is an object");
    };
    assert_eq!(inner.borrow().variant(), &A_CHILD);
}

#[test]
fn nested_undeclared_tag_fails_even_with_registry() {
    let text = r#"{"fields":{"inner":{"fields":{"value":1},"variant":"ADetached"}},"variant":"Bag"}"#;
    let registry = Registry::with_variants([&BAG, &A_DETACHED]);
    let err = registry.codec(CodecConfig::default()).decode(&BAG, text).unwrap_err();
    assert!(matches!(err, KernelError::Deserialization(_)), "{err}");
}

#[test]
fn input_nested_too_deep_is_a_deserialization_error() {
    let nested = format!("{}{}", "[".repeat(70), "]".repeat(70));
    let text = format!(r#"{{"fields":{{"extra":{nested}}},"variant":"Bag"}}"#);
    let err = Entity::deserialize(&BAG, &text).unwrap_err();
    assert!(matches!(err, KernelError::Deserialization(_)), "{err}");
    assert!(err.to_string().contains("deeper than 64"));
    assert!(Entity::safe_deserialize(&BAG, &text).is_void());
}

#[test]
fn any_field_restores_registered_entities() {
    let mut original = Entity::new(&BAG);
    original.set("extra", a(5)).unwrap();
    let text = original.serialize().unwrap();

    let plain = Entity::deserialize(&BAG, &text).unwrap();
    assert!(matches!(plain.get("extra"), Some(Value::Map(_))));

    let registry = Registry::with_variants([&BAG, &A]);
    let restored = registry.codec(CodecConfig::default()).decode(&BAG, &text).unwrap();
    assert!(matches!(restored.get("extra"), Some(Value::Object(_))));
    assert!(restored.equals(&original));
}

#[test]
fn safe_deserialize_yields_void_on_failure() {
    assert!(Entity::safe_deserialize(&A, "garbage").is_void());
    let ok = Entity::safe_deserialize(&A, r#"{"fields":{"value":3},"variant":"A"}"#);
    assert!(ok.value().unwrap().equals(&a(3)));
}

// ── Registry ─────────────────────────────────────────────────────

#[test]
fn registry_registers_lineage() {
    let registry = Registry::with_variants([&A_CHILD]);
    assert!(registry.contains("AChild"));
    assert!(registry.contains("A"));
    assert!(registry.contains("Any"));
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["A", "AChild", "Any"]);
    assert_eq!(registry.resolve("A"), Some(&A));
    assert_eq!(registry.resolve("B"), None);
}

#[test]
fn deserialize_any_resolves_tags() {
    let registry = Registry::with_variants([&A, &B]);
    let decoded = registry.deserialize_any(&a(4).serialize().unwrap()).unwrap();
    let entity = decoded.value().unwrap();
    assert_eq!(entity.variant(), &A);
    assert!(entity.equals(&a(4)));
}

#[test]
fn deserialize_any_void_encoding() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    let decoded = registry.deserialize_any(VOID_ENCODING).unwrap();
    assert!(matches!(decoded, OrVoid::Void(_)));
}

#[test]
fn deserialize_any_unknown_tag_fails() {
    let registry = Registry::with_variants([&ANY]);
    let err = registry.deserialize_any(&a(1).serialize().unwrap()).unwrap_err();
    assert!(err.to_string().contains("unknown variant `A`"));
}

#[test]
fn codec_config_from_json() {
    let config: CodecConfig = serde_json::from_str(r#"{"pretty":true}"#).unwrap();
    assert!(config.pretty);
    assert_eq!(config.max_depth, objcore_model::DEFAULT_MAX_DEPTH);
}
