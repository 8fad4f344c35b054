//! Tag-to-variant lookup.

use std::collections::BTreeMap;
use std::ptr;

use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::codec::{Codec, CodecConfig, split_envelope};
use crate::entity::Entity;
use crate::error::{KernelError, KernelResult};
use crate::or_void::OrVoid;
use crate::variant::Variant;
use crate::void::VOID_VARIANT;

/// Known variants, keyed by tag.
///
/// Registering a variant also registers its ancestors. Needed only when
/// the decoder must accept a tag it was not told about up front.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    variants: BTreeMap<&'static str, &'static Variant>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variants(variants: impl IntoIterator<Item = &'static Variant>) -> Self {
        let mut registry = Self::new();
        for variant in variants {
            registry.register(variant);
        }
        registry
    }

    /// Adds `variant` and its ancestors.
    pub fn register(&mut self, variant: &'static Variant) -> &mut Self {
        let mut current = Some(variant);
        while let Some(v) = current {
            if let Some(previous) = self.variants.insert(v.name(), v) {
                if !ptr::eq(previous, v) {
                    warn!(tag = v.name(), "variant tag registered by two descriptors, keeping the latest");
                }
            }
            current = v.parent();
        }
        self
    }

    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<&'static Variant> {
        self.variants.get(tag).copied()
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.variants.contains_key(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Registered tags in lexicographic order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.keys().copied()
    }

    /// A codec that resolves tags through this registry.
    #[must_use]
    pub fn codec(&self, config: CodecConfig) -> Codec<'_> {
        Codec::with_registry(config, self)
    }

    /// Decodes canonical text of any registered variant.
    ///
    /// The Void encoding decodes to the sentinel.
    pub fn deserialize_any(&self, text: &str) -> KernelResult<OrVoid<Entity>> {
        let json: Json = serde_json::from_str(text)
            .map_err(|e| KernelError::Deserialization(format!("malformed text: {e}")))?;
        let (tag, fields) = split_envelope(&json)?;
        if tag == VOID_VARIANT.name() && fields.is_null() {
            return Ok(OrVoid::void());
        }
        let variant = self
            .resolve(tag)
            .ok_or_else(|| KernelError::Deserialization(format!("unknown variant `{tag}`")))?;
        debug!(tag, "decoding registered variant");
        self.codec(CodecConfig::default())
            .from_json(variant, &json)
            .map(OrVoid::Value)
    }
}
