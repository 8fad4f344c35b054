//! Entity identity.

use std::fmt;

use uuid::Uuid;

/// Identity of a live entity, a time-ordered UUID v7.
///
/// Ids are never part of an entity's fields: two entities with different
/// ids can still be equal, and a clone always receives a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
