//! Entity definitions and their registration.

mod monster;
mod thing;

pub use monster::*;
pub use thing::*;

use attributed_core::{Result, SignatureRegistry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for all entities in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a nil/empty entity ID.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Register every entity type, bases before derived types.
pub fn register_entities(registry: &mut SignatureRegistry) -> Result<()> {
    registry.register_signatures::<Thing>()?;
    registry.register_derived_signatures::<Monster, Thing>()?;
    Ok(())
}

/// Remove every entity type, derived types first.
pub fn unregister_entities(registry: &mut SignatureRegistry) {
    registry.unregister_signatures::<Monster>();
    registry.unregister_signatures::<Thing>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
        assert_eq!(EntityId::nil(), EntityId::nil());
    }

    #[test]
    fn test_registration_is_repeatable() {
        let mut registry = SignatureRegistry::new();
        register_entities(&mut registry).unwrap();
        register_entities(&mut registry).unwrap();
        assert_eq!(registry.len(), 2);

        unregister_entities(&mut registry);
        assert!(registry.is_empty());
    }
}
