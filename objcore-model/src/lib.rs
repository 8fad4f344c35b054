//! Generic object kernel.
//!
//! Defines the root object model that every project type builds on:
//! - [`Variant`] — a closed, statically declared shape (tag, parent, fields)
//! - [`Entity`] — an identity-bearing instance of a variant holding [`Value`]s
//! - [`General`] — the shared capability interface (copy, clone, equality,
//!   serialization, runtime type tests, safe casts)
//! - [`Void`] — the process-wide sentinel returned by the safe API instead
//!   of an error or a null
//! - [`Codec`] — the single canonical text encoding used for round-trips and
//!   deep equality
//!
//! Two failure channels exist side by side. Strict operations return
//! [`KernelResult`]; their `safe_*` / `try_*` counterparts never return an
//! error and yield `false` or [`OrVoid::Void`] instead.

mod codec;
mod entity;
mod error;
mod general;
mod ids;
mod or_void;
mod registry;
mod value;
mod variant;
mod void;

pub use codec::{Codec, CodecConfig, DEFAULT_MAX_DEPTH, FIELDS_KEY, TAG_KEY};
pub use entity::Entity;
pub use error::{KernelError, KernelResult};
pub use general::{General, safe_cast};
pub use ids::EntityId;
pub use or_void::OrVoid;
pub use registry::Registry;
pub use value::{Shared, Value, shared};
pub use variant::{ANY, FieldSpec, FieldType, Variant};
pub use void::{VOID, VOID_ENCODING, VOID_VARIANT, Void};
