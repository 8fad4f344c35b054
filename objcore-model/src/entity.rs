use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::codec::Codec;
use crate::error::{KernelError, KernelResult};
use crate::general::General;
use crate::ids::EntityId;
use crate::or_void::OrVoid;
use crate::value::{DeepCloner, Value, fields_eq};
use crate::variant::{FieldType, Variant};

/// The kernel root: an identity-bearing instance of a [`Variant`].
///
/// The field set is fixed by the variant at construction. Every declared
/// field is always present; writes to undeclared fields or with a value of
/// the wrong kind are rejected.
///
/// `Clone` is the kernel's deep clone: the result has a fresh id and shares
/// no storage with the source.
///
/// # Panics
///
/// Like `RefCell`'s own `Clone`, cloning panics if a nested container is
/// mutably borrowed at the time. [`General::try_clone`] yields Void instead.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    variant: &'static Variant,
    fields: BTreeMap<&'static str, Value>,
    metadata: BTreeMap<String, Value>,
}

impl Entity {
    /// Allocates a blank instance: every declared field holds its type's
    /// default value.
    #[must_use]
    pub fn new(variant: &'static Variant) -> Self {
        let fields = variant
            .field_specs()
            .into_iter()
            .map(|spec| (spec.name, spec.field_type.default_value()))
            .collect();
        Self::from_parts(variant, fields, BTreeMap::new())
    }

    /// Allocates an instance and assigns each `(name, value)` pair.
    pub fn with_fields<I, K, V>(variant: &'static Variant, fields: I) -> KernelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut entity = Self::new(variant);
        for (name, value) in fields {
            entity.set(name.as_ref(), value)?;
        }
        Ok(entity)
    }

    pub(crate) fn from_parts(
        variant: &'static Variant,
        fields: BTreeMap<&'static str, Value>,
        metadata: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            variant,
            fields,
            metadata,
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    /// Returns the value of a declared field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assigns a declared field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> KernelResult<()> {
        let spec = self.variant.field(name).ok_or_else(|| KernelError::UnknownField {
            variant: self.variant.name(),
            field: name.to_string(),
        })?;
        let value = value.into();
        if !spec.field_type.admits(&value) {
            return Err(KernelError::FieldType {
                field: name.to_string(),
                expected: spec.field_type.to_string(),
                actual: value.kind(),
            });
        }
        self.fields.insert(spec.name, value);
        Ok(())
    }

    /// Declared fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub(crate) fn field_map(&self) -> &BTreeMap<&'static str, Value> {
        &self.fields
    }

    pub(crate) fn metadata_map(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    fn check_same_variant(&self, target: &Entity) -> KernelResult<()> {
        if self.variant == target.variant {
            Ok(())
        } else {
            Err(KernelError::TypeMismatch {
                expected: self.variant.name(),
                actual: target.variant.name(),
            })
        }
    }

    /// Encodes with an explicit codec instead of the default one.
    pub fn serialize_with(&self, codec: &Codec<'_>) -> KernelResult<String> {
        codec.encode(self)
    }

    /// Rebuilds an instance of `variant` from canonical text.
    pub fn deserialize(variant: &'static Variant, text: &str) -> KernelResult<Self> {
        Codec::default().decode(variant, text)
    }

    /// Like [`Entity::deserialize`], yielding Void on any failure.
    #[must_use]
    pub fn safe_deserialize(variant: &'static Variant, text: &str) -> OrVoid<Self> {
        match Self::deserialize(variant, text) {
            Ok(entity) => OrVoid::Value(entity),
            Err(e) => {
                debug!(variant = variant.name(), error = %e, "safe_deserialize yielded Void");
                OrVoid::void()
            }
        }
    }

    // ── Metadata ────────────────────────────────────────────────

    /// Attaches a metadata entry. Metadata sits outside the declared field
    /// set: it is ignored by copy, equality and serialization, and carried
    /// by clone.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> KernelResult<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(KernelError::InvalidMetadataKey(key));
        }
        self.metadata.insert(key, value.into());
        Ok(())
    }

    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Returns false instead of failing.
    pub fn safe_set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.set_metadata(key, value) {
            Ok(()) => true,
            Err(e) => {
                debug!(entity = %self.id, error = %e, "safe_set_metadata failed");
                false
            }
        }
    }

    /// Returns the entry only if present, non-null and of the expected kind.
    #[must_use]
    pub fn try_get_metadata(&self, key: &str, expected: FieldType) -> OrVoid<&Value> {
        match self.metadata.get(key) {
            Some(value) if !value.is_null() && expected.admits(value) => OrVoid::Value(value),
            _ => OrVoid::void(),
        }
    }
}

impl Clone for Entity {
    fn clone(&self) -> Self {
        match DeepCloner::default().entity(self) {
            Ok(copy) => copy,
            Err(e) => panic!("cannot clone `{}`: {e}", self.variant.name()),
        }
    }
}

impl General for Entity {
    fn real_type(&self) -> &'static Variant {
        self.variant
    }

    fn copy_to(&self, target: &mut Entity) -> KernelResult<()> {
        self.check_same_variant(target)?;
        for (name, value) in &self.fields {
            target.fields.insert(*name, value.clone());
        }
        Ok(())
    }

    fn deep_copy_to(&self, target: &mut Entity) -> KernelResult<()> {
        self.check_same_variant(target)?;
        let mut cloner = DeepCloner::default();
        // Target stays untouched if any value cannot be copied.
        let copied = self
            .fields
            .iter()
            .map(|(name, value)| Ok((*name, cloner.value(value)?)))
            .collect::<KernelResult<Vec<_>>>()?;
        target.fields.extend(copied);
        Ok(())
    }

    fn clone_object(&self) -> OrVoid<Entity> {
        match DeepCloner::default().entity(self) {
            Ok(copy) => OrVoid::Value(copy),
            Err(e) => {
                debug!(entity = %self.id, error = %e, "clone yielded Void");
                OrVoid::void()
            }
        }
    }

    fn equals(&self, other: &dyn General) -> bool {
        other
            .as_entity()
            .is_some_and(|other| self.variant == other.variant && fields_eq(&self.fields, &other.fields))
    }

    fn deep_equals(&self, other: &dyn General) -> bool {
        let Some(other) = other.as_entity() else {
            return false;
        };
        if self.variant != other.variant {
            return false;
        }
        match (self.serialize(), other.serialize()) {
            (Ok(a), Ok(b)) => a == b,
            (a, b) => {
                debug!(
                    variant = self.variant.name(),
                    left_ok = a.is_ok(),
                    right_ok = b.is_ok(),
                    "serialization unavailable, comparing fields"
                );
                fields_eq(&self.fields, &other.fields)
            }
        }
    }

    fn serialize(&self) -> KernelResult<String> {
        Codec::default().encode(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn as_entity(&self) -> Option<&Entity> {
        Some(self)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{} {{ (no attributes) }}", self.variant.name());
        }
        writeln!(f, "{} {{", self.variant.name())?;
        for (name, value) in &self.fields {
            writeln!(f, "  {name}: {value}")?;
        }
        f.write_str("}")
    }
}
