//! Variant descriptors.
//!
//! A variant is the closed shape of an entity: its tag, the variant it
//! derives from, and the fields it declares. Variants are declared once as
//! `static` items and referenced by `&'static Variant` everywhere else.
//!
//! An `object<V>` field holds `V` or one of the sub-variants `V` declares
//! with [`Variant::with_subvariants`]; those are the tags a decoder can
//! rebuild without outside help.
//!
//! ```
//! use objcore_model::{ANY, FieldSpec, FieldType, Variant};
//!
//! static POINT_FIELDS: [FieldSpec; 2] = [
//!     FieldSpec::new("x", FieldType::Int),
//!     FieldSpec::new("y", FieldType::Int),
//! ];
//! static POINT: Variant =
//!     Variant::derived("Point", &ANY, &POINT_FIELDS).with_subvariants(&POINT_SUBVARIANTS);
//! static POINT_SUBVARIANTS: [&Variant; 1] = [&POINT3];
//!
//! static POINT3_FIELDS: [FieldSpec; 1] = [FieldSpec::new("z", FieldType::Int)];
//! static POINT3: Variant = Variant::derived("Point3", &POINT, &POINT3_FIELDS);
//!
//! assert!(POINT.is_subvariant_of(&ANY));
//! assert_eq!(POINT.field_names(), vec!["x", "y"]);
//! assert_eq!(POINT.find_declared("Point3"), Some(&POINT3));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ptr;

use crate::value::Value;

/// Root of every variant hierarchy. Declares no fields.
pub static ANY: Variant = Variant::root("Any", &[]);

/// Declared type of a field.
///
/// `Value::Null` is admitted by every field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Text,
    /// Shared list of dynamically typed values.
    List,
    /// Shared string-keyed map of dynamically typed values.
    Map,
    /// Nested entity of the given variant or one of its declared
    /// sub-variants.
    Object(&'static Variant),
    /// Any value kind.
    Any,
}

impl FieldType {
    /// The value a blank entity holds for a field of this type.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Text => Value::Text(String::new()),
            Self::List => Value::list(Vec::new()),
            Self::Map => Value::map(BTreeMap::new()),
            Self::Object(_) | Self::Any => Value::Null,
        }
    }

    /// Returns true if `value` may be stored in a field of this type.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::Object(expected), Value::Object(entity)) => entity
                .try_borrow()
                .map(|e| expected.declares(e.variant()))
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Text => f.write_str("text"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
            Self::Object(variant) => write!(f, "object<{}>", variant.name()),
            Self::Any => f.write_str("any"),
        }
    }
}

/// One declared field of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

/// A closed entity shape.
///
/// Descriptors compare by identity: two statics with the same tag are
/// different variants.
pub struct Variant {
    name: &'static str,
    parent: Option<&'static Variant>,
    fields: &'static [FieldSpec],
    subvariants: &'static [&'static Variant],
}

impl Variant {
    /// Declares a variant with no parent.
    #[must_use]
    pub const fn root(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            parent: None,
            fields,
            subvariants: &[],
        }
    }

    /// Declares a sub-variant. It inherits every field of `parent`.
    #[must_use]
    pub const fn derived(
        name: &'static str,
        parent: &'static Variant,
        fields: &'static [FieldSpec],
    ) -> Self {
        Self {
            name,
            parent: Some(parent),
            fields,
            subvariants: &[],
        }
    }

    /// Declares the sub-variants that may stand in for this variant inside
    /// `object` fields. Entries that do not derive from this variant are
    /// ignored.
    #[must_use]
    pub const fn with_subvariants(self, subvariants: &'static [&'static Variant]) -> Self {
        Self {
            subvariants,
            ..self
        }
    }

    /// The variant tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&'static Variant> {
        self.parent
    }

    /// Declared sub-variants that really derive from this variant.
    fn declared_children(&self) -> impl Iterator<Item = &'static Variant> + '_ {
        self.subvariants
            .iter()
            .copied()
            .filter(move |child| !ptr::eq(*child, self) && child.is_subvariant_of(self))
    }

    /// Finds `tag` among the sub-variants declared by this variant and,
    /// transitively, by them.
    #[must_use]
    pub fn find_declared(&self, tag: &str) -> Option<&'static Variant> {
        self.declared_children()
            .find_map(|child| if child.name == tag { Some(child) } else { child.find_declared(tag) })
    }

    /// True if `variant` is this variant or reachable through declared
    /// sub-variants.
    #[must_use]
    pub fn declares(&self, variant: &Variant) -> bool {
        ptr::eq(self, variant) || self.declared_children().any(|child| child.declares(variant))
    }

    /// This variant followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &Variant> + '_ {
        std::iter::successors(Some(self), |v| v.parent)
    }

    /// Looks up a field, own declarations shadowing inherited ones.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.lineage()
            .find_map(|v| v.fields.iter().find(|spec| spec.name == name))
    }

    /// The full field set, ordered by name.
    #[must_use]
    pub fn field_specs(&self) -> Vec<&'static FieldSpec> {
        let mut specs: BTreeMap<&'static str, &'static FieldSpec> = BTreeMap::new();
        for variant in self.lineage() {
            for spec in variant.fields {
                specs.entry(spec.name).or_insert(spec);
            }
        }
        specs.into_values().collect()
    }

    /// Names of the full field set, ordered by name.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.field_specs().into_iter().map(|spec| spec.name).collect()
    }

    /// Reflexive: every variant is a sub-variant of itself.
    #[must_use]
    pub fn is_subvariant_of(&self, other: &Variant) -> bool {
        self.lineage().any(|v| v == other)
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for Variant {}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variant({})", self.name)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
