//! Alias-keyed registry of variation definitions.
//!
//! The registry preserves registration order, so iteration and the
//! resolver's reverse lookup both see definitions in the order they were
//! configured.

use crate::variation::{VariationDefinition, check_identifier};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Variation \"{0}\" already registered")]
    DuplicateAlias(String),
    #[error("Invalid variation id \"{id}\": {reason}")]
    InvalidIdentifier { id: String, reason: String },
    #[error("Variation \"{alias}\" has a zero {side}")]
    ZeroSide { alias: String, side: &'static str },
    #[error("Variation \"{0}\" is not registered")]
    NotRegistered(String),
}

#[derive(Debug, Clone, Default)]
pub struct VariationRegistry {
    entries: IndexMap<String, VariationDefinition>,
}

impl VariationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under `alias`.
    ///
    /// On error the registry is left unchanged.
    pub fn register(
        &mut self,
        alias: impl Into<String>,
        definition: VariationDefinition,
    ) -> Result<(), RegistryError> {
        let alias = alias.into();
        if self.entries.contains_key(&alias) {
            return Err(RegistryError::DuplicateAlias(alias));
        }
        check_identifier(&definition.identifier).map_err(|reason| {
            RegistryError::InvalidIdentifier {
                id: definition.identifier.clone(),
                reason,
            }
        })?;
        for (side, value) in [("width", definition.width), ("height", definition.height)] {
            if value == Some(0) {
                return Err(RegistryError::ZeroSide { alias, side });
            }
        }
        self.entries.insert(alias, definition);
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Result<&VariationDefinition, RegistryError> {
        self.entries
            .get(alias)
            .ok_or_else(|| RegistryError::NotRegistered(alias.to_string()))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// First alias, in registration order, whose definition uses `id`.
    pub fn alias_for_identifier(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, def)| def.identifier == id)
            .map(|(alias, _)| alias.as_str())
    }

    /// All `(alias, definition)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariationDefinition)> {
        self.entries.iter().map(|(alias, def)| (alias.as_str(), def))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &VariationDefinition> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
