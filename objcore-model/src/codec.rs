//! Canonical text encoding.
//!
//! Every entity encodes as a JSON object with exactly two keys:
//!
//! ```text
//! {"fields":{"age":30,"name":"Anna"},"variant":"Person"}
//! ```
//!
//! Keys are ordered lexicographically at every level, so equal entities
//! always produce byte-identical text. Floats that JSON cannot represent
//! (`NaN`, `inf`, `-inf`) are written as their textual form.
//!
//! Decoding is driven by the target variant's declared field types. There
//! is exactly one format; anything that does not match it, including text
//! nested deeper than the configured limit, is a `Deserialization` error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use crate::entity::Entity;
use crate::error::{KernelError, KernelResult};
use crate::registry::Registry;
use crate::value::Value;
use crate::variant::{FieldType, Variant};

/// Envelope key holding the variant tag.
pub const TAG_KEY: &str = "variant";

/// Envelope key holding the field map.
pub const FIELDS_KEY: &str = "fields";

/// Default nesting limit for encoding and decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Codec configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Indent output. Pretty text is still deterministic and decodable.
    pub pretty: bool,
    /// Maximum value nesting; deeper values (or reference cycles) fail
    /// with `DepthExceeded`.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encoder/decoder for the canonical format.
///
/// Payloads and nested objects may carry the declared variant or any
/// sub-variant it declares. With a [`Registry`] attached, the payload may
/// also carry any registered sub-variant, and `any` fields decode envelopes
/// of registered variants back into entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec<'r> {
    config: CodecConfig,
    registry: Option<&'r Registry>,
}

impl Codec<'static> {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }
}

impl<'r> Codec<'r> {
    #[must_use]
    pub fn with_registry(config: CodecConfig, registry: &'r Registry) -> Self {
        Self {
            config,
            registry: Some(registry),
        }
    }

    /// Encodes `entity` as canonical text.
    pub fn encode(&self, entity: &Entity) -> KernelResult<String> {
        let json = self.entity_to_json(entity, 0)?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }

    /// Decodes canonical text into an instance of `variant`.
    pub fn decode(&self, variant: &'static Variant, text: &str) -> KernelResult<Entity> {
        let json: Json = serde_json::from_str(text)
            .map_err(|e| KernelError::Deserialization(format!("malformed text: {e}")))?;
        self.from_json(variant, &json)
    }

    /// Decodes a JSON tree into an instance of `variant`.
    pub fn from_json(&self, variant: &'static Variant, json: &Json) -> KernelResult<Entity> {
        self.decode_entity(variant, json, 0, false).map_err(|e| match e {
            KernelError::DepthExceeded { max_depth } => {
                KernelError::Deserialization(format!("input nested deeper than {max_depth} levels"))
            }
            other => other,
        })
    }

    fn check_depth(&self, depth: usize) -> KernelResult<()> {
        if depth > self.config.max_depth {
            Err(KernelError::DepthExceeded {
                max_depth: self.config.max_depth,
            })
        } else {
            Ok(())
        }
    }

    fn entity_to_json(&self, entity: &Entity, depth: usize) -> KernelResult<Json> {
        self.check_depth(depth)?;
        let mut fields = Map::new();
        for (name, value) in entity.fields() {
            fields.insert(name.to_string(), self.value_to_json(value, depth + 1)?);
        }
        let mut envelope = Map::new();
        envelope.insert(FIELDS_KEY.to_string(), Json::Object(fields));
        envelope.insert(TAG_KEY.to_string(), Json::String(entity.variant().name().to_string()));
        Ok(Json::Object(envelope))
    }

    fn value_to_json(&self, value: &Value, depth: usize) -> KernelResult<Json> {
        self.check_depth(depth)?;
        let json = match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(x) => Number::from_f64(*x).map_or_else(|| Json::String(x.to_string()), Json::Number),
            Value::Text(s) => Json::String(s.clone()),
            Value::List(items) => {
                let items = items.try_borrow().map_err(|_| KernelError::BorrowConflict("list"))?;
                Json::Array(
                    items
                        .iter()
                        .map(|item| self.value_to_json(item, depth + 1))
                        .collect::<KernelResult<Vec<_>>>()?,
                )
            }
            Value::Map(entries) => {
                let entries = entries.try_borrow().map_err(|_| KernelError::BorrowConflict("map"))?;
                Json::Object(
                    entries
                        .iter()
                        .map(|(key, item)| Ok((key.clone(), self.value_to_json(item, depth + 1)?)))
                        .collect::<KernelResult<Map<_, _>>>()?,
                )
            }
            Value::Object(entity) => {
                let entity = entity.try_borrow().map_err(|_| KernelError::BorrowConflict("object"))?;
                self.entity_to_json(&entity, depth + 1)?
            }
        };
        Ok(json)
    }

    fn decode_entity(
        &self,
        expected: &'static Variant,
        json: &Json,
        depth: usize,
        nested: bool,
    ) -> KernelResult<Entity> {
        self.check_depth(depth)?;
        let (tag, fields) = split_envelope(json)?;
        let variant = self.resolve(tag, expected, nested)?;
        let fields = fields.as_object().ok_or_else(|| {
            KernelError::Deserialization(format!("`{FIELDS_KEY}` of `{tag}` is not an object"))
        })?;

        let mut entity = Entity::new(variant);
        for (name, raw) in fields {
            let spec = variant.field(name).ok_or_else(|| {
                KernelError::Deserialization(format!("variant `{}` has no field `{name}`", variant.name()))
            })?;
            let value = self
                .decode_value(spec.field_type, raw, depth + 1)
                .map_err(|e| match e {
                    KernelError::Deserialization(msg) => {
                        KernelError::Deserialization(format!("field `{name}`: {msg}"))
                    }
                    other => other,
                })?;
            entity.set(name, value)?;
        }
        Ok(entity)
    }

    /// Nested objects only accept declared sub-variants, the ones their
    /// field can hold. The payload may also use the registry.
    fn resolve(&self, tag: &str, expected: &'static Variant, nested: bool) -> KernelResult<&'static Variant> {
        if tag == expected.name() {
            return Ok(expected);
        }
        expected
            .find_declared(tag)
            .or_else(|| {
                self.registry
                    .filter(|_| !nested)
                    .and_then(|registry| registry.resolve(tag))
                    .filter(|variant| variant.is_subvariant_of(expected))
            })
            .ok_or_else(|| {
                KernelError::Deserialization(format!(
                    "encoded variant `{tag}` is not compatible with `{}`",
                    expected.name()
                ))
            })
    }

    fn decode_value(&self, field_type: FieldType, raw: &Json, depth: usize) -> KernelResult<Value> {
        self.check_depth(depth)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let decoded = match field_type {
            FieldType::Bool => raw.as_bool().map(Value::Bool),
            FieldType::Int => raw.as_i64().map(Value::Int),
            FieldType::Float => match raw {
                Json::Number(n) => n.as_f64().map(Value::Float),
                Json::String(s) => parse_non_finite(s).map(Value::Float),
                _ => None,
            },
            FieldType::Text => raw.as_str().map(Value::from),
            FieldType::List => match raw.as_array() {
                Some(items) => Some(Value::list(
                    items
                        .iter()
                        .map(|item| self.decode_any(item, depth + 1))
                        .collect::<KernelResult<_>>()?,
                )),
                None => None,
            },
            FieldType::Map => match raw.as_object() {
                Some(entries) => Some(self.decode_map(entries, depth)?),
                None => None,
            },
            FieldType::Object(variant) => {
                if !raw.is_object() {
                    None
                } else {
                    Some(Value::object(self.decode_entity(variant, raw, depth + 1, true)?))
                }
            }
            FieldType::Any => Some(self.decode_any(raw, depth)?),
        };
        decoded.ok_or_else(|| {
            KernelError::Deserialization(format!("expected {field_type}, got {}", json_kind(raw)))
        })
    }

    fn decode_map(&self, entries: &Map<String, Json>, depth: usize) -> KernelResult<Value> {
        let entries: BTreeMap<String, Value> = entries
            .iter()
            .map(|(key, item)| Ok((key.clone(), self.decode_any(item, depth + 1)?)))
            .collect::<KernelResult<_>>()?;
        Ok(Value::map(entries))
    }

    /// Schema-free reading used for `any` fields and container elements.
    fn decode_any(&self, raw: &Json, depth: usize) -> KernelResult<Value> {
        self.check_depth(depth)?;
        let value = match raw {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::list(
                items
                    .iter()
                    .map(|item| self.decode_any(item, depth + 1))
                    .collect::<KernelResult<_>>()?,
            ),
            Json::Object(entries) => match self.registered_envelope(raw) {
                Some(variant) => Value::object(self.decode_entity(variant, raw, depth + 1, false)?),
                None => self.decode_map(entries, depth)?,
            },
        };
        Ok(value)
    }

    fn registered_envelope(&self, raw: &Json) -> Option<&'static Variant> {
        let registry = self.registry?;
        let (tag, fields) = split_envelope(raw).ok()?;
        if !fields.is_object() {
            return None;
        }
        registry.resolve(tag)
    }
}

/// Splits an envelope into its tag and raw field map.
pub(crate) fn split_envelope(json: &Json) -> KernelResult<(&str, &Json)> {
    let malformed = || {
        KernelError::Deserialization(format!(
            "expected an object with exactly `{FIELDS_KEY}` and `{TAG_KEY}`"
        ))
    };
    let envelope = json.as_object().ok_or_else(malformed)?;
    if envelope.len() != 2 {
        return Err(malformed());
    }
    let tag = envelope.get(TAG_KEY).and_then(Json::as_str).ok_or_else(malformed)?;
    let fields = envelope.get(FIELDS_KEY).ok_or_else(malformed)?;
    Ok((tag, fields))
}

fn parse_non_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|x| !x.is_finite())
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
