//! Dynamic field values.
//!
//! Scalars are stored inline. Containers and nested entities live behind
//! [`Shared`] handles, so cloning a [`Value`] shares storage (the shallow
//! copy the kernel's `copy_to` relies on) while [`Value::deep_clone`]
//! duplicates it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::entity::Entity;
use crate::error::{KernelError, KernelResult};

/// Shared, interior-mutable storage for container values.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `value` in a fresh [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Nesting bound for rendering.
const MAX_NESTING: usize = 64;

/// A field value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Shared<Vec<Value>>),
    Map(Shared<BTreeMap<String, Value>>),
    Object(Shared<Entity>),
}

impl Value {
    /// Builds a list value with fresh storage.
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(shared(items))
    }

    /// Builds a map value with fresh storage.
    #[must_use]
    pub fn map(entries: BTreeMap<String, Value>) -> Self {
        Self::Map(shared(entries))
    }

    /// Builds a nested object value with fresh storage.
    #[must_use]
    pub fn object(entity: Entity) -> Self {
        Self::Object(shared(entity))
    }

    /// Short name of the value kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if both values point at the same container storage.
    ///
    /// Scalars never share storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Recursively duplicates every container, so the result shares no
    /// storage with `self`. Aliasing and cycles inside the value are
    /// reproduced in the copy.
    ///
    /// Fails with `BorrowConflict` if a container is mutably borrowed.
    pub fn deep_clone(&self) -> KernelResult<Value> {
        DeepCloner::default().value(self)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth == 0 {
            return f.write_str("...");
        }
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                let Ok(items) = items.try_borrow() else {
                    return f.write_str("[<borrowed>]");
                };
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f, depth - 1)?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                let Ok(entries) = entries.try_borrow() else {
                    return f.write_str("{<borrowed>}");
                };
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    item.render(f, depth - 1)?;
                }
                f.write_str("}")
            }
            Self::Object(entity) => {
                let Ok(entity) = entity.try_borrow() else {
                    return f.write_str("<borrowed object>");
                };
                write!(f, "{} {{", entity.variant().name())?;
                for (i, (name, item)) in entity.fields().enumerate() {
                    f.write_str(if i > 0 { ", " } else { " " })?;
                    write!(f, "{name}: ")?;
                    item.render(f, depth - 1)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Field-wise comparison of two declared field maps.
pub(crate) fn fields_eq(a: &BTreeMap<&'static str, Value>, b: &BTreeMap<&'static str, Value>) -> bool {
    Equality::default().fields(a, b)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Equality::default().values(self, other)
    }
}

/// Structural comparison that terminates on cycles.
///
/// A pair of containers already under comparison is assumed equal when it
/// is reached again, so two cyclic values of the same shape compare equal.
/// A container that is mutably borrowed compares unequal to anything but
/// itself.
#[derive(Default)]
struct Equality {
    assumed: HashSet<(*const (), *const ())>,
}

impl Equality {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        if a.shares_storage_with(b) {
            return true;
        }
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            // Bitwise match keeps NaN equal to itself.
            (Value::Float(x), Value::Float(y)) => x == y || x.to_bits() == y.to_bits(),
            (Value::Text(x), Value::Text(y)) => x == y,
            (Value::List(x), Value::List(y)) => {
                if !self.enter(Rc::as_ptr(x).cast(), Rc::as_ptr(y).cast()) {
                    return true;
                }
                let (Ok(x), Ok(y)) = (x.try_borrow(), y.try_borrow()) else {
                    return false;
                };
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| self.values(p, q))
            }
            (Value::Map(x), Value::Map(y)) => {
                if !self.enter(Rc::as_ptr(x).cast(), Rc::as_ptr(y).cast()) {
                    return true;
                }
                let (Ok(x), Ok(y)) = (x.try_borrow(), y.try_borrow()) else {
                    return false;
                };
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((kp, p), (kq, q))| kp == kq && self.values(p, q))
            }
            (Value::Object(x), Value::Object(y)) => {
                if !self.enter(Rc::as_ptr(x).cast(), Rc::as_ptr(y).cast()) {
                    return true;
                }
                let (Ok(x), Ok(y)) = (x.try_borrow(), y.try_borrow()) else {
                    return false;
                };
                x.variant() == y.variant() && self.fields(x.field_map(), y.field_map())
            }
            _ => false,
        }
    }

    fn fields(&mut self, a: &BTreeMap<&'static str, Value>, b: &BTreeMap<&'static str, Value>) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && self.values(va, vb))
    }

    /// Records the pair; false if it was already being compared.
    fn enter(&mut self, a: *const (), b: *const ()) -> bool {
        self.assumed.insert((a, b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, MAX_NESTING)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, MAX_NESTING)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::map(entries)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Self::object(entity)
    }
}

/// Recursive duplicator with a memo keyed by source storage address.
///
/// One cloner spans a whole copy operation so that two fields aliasing the
/// same container still alias a single container in the copy.
#[derive(Default)]
pub(crate) struct DeepCloner {
    seen: HashMap<*const (), Value>,
}

impl DeepCloner {
    pub(crate) fn value(&mut self, value: &Value) -> KernelResult<Value> {
        let copy = match value {
            Value::List(items) => {
                let key = Rc::as_ptr(items).cast::<()>();
                if let Some(done) = self.seen.get(&key) {
                    return Ok(done.clone());
                }
                let items = items.try_borrow().map_err(|_| KernelError::BorrowConflict("list"))?;
                let copy = shared(Vec::new());
                self.seen.insert(key, Value::List(Rc::clone(&copy)));
                let cloned = items
                    .iter()
                    .map(|v| self.value(v))
                    .collect::<KernelResult<Vec<_>>>()?;
                *copy.borrow_mut() = cloned;
                Value::List(copy)
            }
            Value::Map(entries) => {
                let key = Rc::as_ptr(entries).cast::<()>();
                if let Some(done) = self.seen.get(&key) {
                    return Ok(done.clone());
                }
                let entries = entries.try_borrow().map_err(|_| KernelError::BorrowConflict("map"))?;
                let copy = shared(BTreeMap::new());
                self.seen.insert(key, Value::Map(Rc::clone(&copy)));
                let cloned = entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.value(v)?)))
                    .collect::<KernelResult<BTreeMap<_, _>>>()?;
                *copy.borrow_mut() = cloned;
                Value::Map(copy)
            }
            Value::Object(entity) => {
                let key = Rc::as_ptr(entity).cast::<()>();
                if let Some(done) = self.seen.get(&key) {
                    return Ok(done.clone());
                }
                let source = entity.try_borrow().map_err(|_| KernelError::BorrowConflict("object"))?;
                let copy = shared(Entity::new(source.variant()));
                self.seen.insert(key, Value::Object(Rc::clone(&copy)));
                let cloned = self.entity(&source)?;
                *copy.borrow_mut() = cloned;
                Value::Object(copy)
            }
            scalar => scalar.clone(),
        };
        Ok(copy)
    }

    pub(crate) fn entity(&mut self, entity: &Entity) -> KernelResult<Entity> {
        let fields = entity
            .field_map()
            .iter()
            .map(|(name, v)| Ok((*name, self.value(v)?)))
            .collect::<KernelResult<BTreeMap<_, _>>>()?;
        let metadata = entity
            .metadata_map()
            .iter()
            .map(|(key, v)| Ok((key.clone(), self.value(v)?)))
            .collect::<KernelResult<BTreeMap<_, _>>>()?;
        Ok(Entity::from_parts(entity.variant(), fields, metadata))
    }
}
