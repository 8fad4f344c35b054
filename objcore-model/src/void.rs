//! The Void sentinel.
//!
//! A single immutable instance marks "no valid value" across the safe API.
//! It equals only itself, refuses to be copied into a target, clones to
//! itself, and serializes to a fixed encoding.

use std::fmt;

use crate::entity::Entity;
use crate::error::{KernelError, KernelResult};
use crate::general::General;
use crate::or_void::OrVoid;
use crate::variant::{ANY, Variant};

/// Variant tag carried by the sentinel.
pub static VOID_VARIANT: Variant = Variant::derived("Void", &ANY, &[]);

/// The process-wide sentinel.
pub static VOID: Void = Void { _sealed: () };

/// Canonical encoding of the sentinel.
pub const VOID_ENCODING: &str = r#"{"fields":null,"variant":"Void"}"#;

/// Marker type of [`VOID`]. It cannot be constructed outside this module,
/// so every `&Void` points at the one static instance.
#[derive(PartialEq, Eq)]
pub struct Void {
    _sealed: (),
}

impl Void {
    #[must_use]
    pub fn instance() -> &'static Void {
        &VOID
    }
}

impl General for Void {
    fn real_type(&self) -> &'static Variant {
        &VOID_VARIANT
    }

    fn copy_to(&self, _target: &mut Entity) -> KernelResult<()> {
        Err(KernelError::UnsupportedOperation {
            operation: "copy_to",
            variant: VOID_VARIANT.name(),
        })
    }

    fn deep_copy_to(&self, _target: &mut Entity) -> KernelResult<()> {
        Err(KernelError::UnsupportedOperation {
            operation: "deep_copy_to",
            variant: VOID_VARIANT.name(),
        })
    }

    fn clone_object(&self) -> OrVoid<Entity> {
        OrVoid::void()
    }

    fn equals(&self, other: &dyn General) -> bool {
        other.is_void()
    }

    fn deep_equals(&self, other: &dyn General) -> bool {
        other.is_void()
    }

    fn serialize(&self) -> KernelResult<String> {
        Ok(VOID_ENCODING.to_string())
    }

    fn describe(&self) -> String {
        "Void { (empty) }".to_string()
    }

    fn as_entity(&self) -> Option<&Entity> {
        None
    }

    fn is_void(&self) -> bool {
        true
    }
}

impl fmt::Display for Void {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Void")
    }
}

impl fmt::Debug for Void {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Void")
    }
}
