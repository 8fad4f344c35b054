//! The shared capability interface.

use std::fmt;

use tracing::debug;

use crate::entity::Entity;
use crate::error::KernelResult;
use crate::or_void::OrVoid;
use crate::variant::Variant;

/// Operations every kernel object supports.
///
/// Implemented by [`Entity`] and by the [`Void`](crate::Void) sentinel. The
/// required methods form the strict surface; the provided `safe_*` and
/// `try_*` methods wrap them and never return an error.
pub trait General: fmt::Display {
    /// The concrete variant this object was created as.
    fn real_type(&self) -> &'static Variant;

    /// Overwrites every declared field of `target` with this object's
    /// values. Containers stay shared with the source.
    ///
    /// Fails with `TypeMismatch` unless `target` is the same variant.
    fn copy_to(&self, target: &mut Entity) -> KernelResult<()>;

    /// Like [`General::copy_to`], but containers are duplicated so nothing
    /// is shared afterwards.
    fn deep_copy_to(&self, target: &mut Entity) -> KernelResult<()>;

    /// A new object of the same variant with deep-copied fields.
    fn clone_object(&self) -> OrVoid<Entity>;

    /// Same variant and field-wise equal values. Never fails.
    fn equals(&self, other: &dyn General) -> bool;

    /// Same variant and identical canonical encodings. Falls back to
    /// field-wise equality when either side cannot be encoded.
    fn deep_equals(&self, other: &dyn General) -> bool;

    /// Canonical text encoding.
    fn serialize(&self) -> KernelResult<String>;

    /// Human-readable dump for diagnostics.
    fn describe(&self) -> String;

    /// The entity view of this object, `None` for Void.
    fn as_entity(&self) -> Option<&Entity>;

    fn is_void(&self) -> bool {
        false
    }

    fn is_truthy(&self) -> bool {
        !self.is_void()
    }

    /// True if this object's variant is `target` or one of its sub-variants.
    fn is_type(&self, target: &Variant) -> bool {
        self.real_type().is_subvariant_of(target)
    }

    /// Views this object as `target`, or yields Void.
    fn try_as(&self, target: &Variant) -> OrVoid<&Entity> {
        match self.as_entity() {
            Some(entity) if entity.variant().is_subvariant_of(target) => OrVoid::Value(entity),
            _ => OrVoid::void(),
        }
    }

    fn safe_copy_to(&self, target: &mut Entity) -> bool {
        match self.copy_to(target) {
            Ok(()) => true,
            Err(e) => {
                debug!(source = self.real_type().name(), error = %e, "safe_copy_to failed");
                false
            }
        }
    }

    fn safe_deep_copy_to(&self, target: &mut Entity) -> bool {
        match self.deep_copy_to(target) {
            Ok(()) => true,
            Err(e) => {
                debug!(source = self.real_type().name(), error = %e, "safe_deep_copy_to failed");
                false
            }
        }
    }

    fn safe_serialize(&self) -> OrVoid<String> {
        match self.serialize() {
            Ok(text) => OrVoid::Value(text),
            Err(e) => {
                debug!(source = self.real_type().name(), error = %e, "safe_serialize yielded Void");
                OrVoid::void()
            }
        }
    }

    fn try_clone(&self) -> OrVoid<Entity> {
        self.clone_object()
    }
}

/// Views `source` as `target`.
///
/// Returns the very same entity when its variant is `target` or a
/// sub-variant of it; a missing source, the Void sentinel, or an
/// incompatible variant all yield Void.
pub fn safe_cast<'a, G>(source: Option<&'a G>, target: &Variant) -> OrVoid<&'a Entity>
where
    G: General + ?Sized,
{
    match source {
        Some(source) => source.try_as(target),
        None => OrVoid::void(),
    }
}
