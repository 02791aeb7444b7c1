//! Alias and derived-filename resolution.
//!
//! [`VariationResolver`] owns the [`VariationRegistry`] and the process-wide
//! [`FilenameCodec`]. Forward lookups go alias → definition. Reverse lookups
//! parse a derived filename and map the parsed identifier back to an alias.
//!
//! The reverse map is filled lazily. A miss scans the registry in
//! registration order and memoizes the first alias with that identifier.
//! Registration only ever appends, so a memoized answer stays the first
//! match forever, and identifiers registered after earlier lookups are
//! still found on their first miss.

use crate::naming::{FilenameCodec, ParsedName};
use crate::registry::{RegistryError, VariationRegistry};
use crate::variation::VariationDefinition;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct VariationResolver {
    registry: VariationRegistry,
    codec: FilenameCodec,
    alias_by_id: Mutex<HashMap<String, String>>,
}

impl VariationResolver {
    pub fn new(codec: FilenameCodec) -> Self {
        Self {
            registry: VariationRegistry::new(),
            codec,
            alias_by_id: Mutex::new(HashMap::new()),
        }
    }

    pub fn codec(&self) -> &FilenameCodec {
        &self.codec
    }

    pub fn registry(&self) -> &VariationRegistry {
        &self.registry
    }

    /// Register a definition under `alias`.
    ///
    /// Besides the registry's own checks, the identifier must not contain
    /// any character of the naming pattern's literal separators.
    pub fn register(
        &mut self,
        alias: impl Into<String>,
        definition: VariationDefinition,
    ) -> Result<(), RegistryError> {
        let alias = alias.into();
        if self.registry.contains(&alias) {
            return Err(RegistryError::DuplicateAlias(alias));
        }

        let separator = self
            .codec
            .separator_chars()
            .find(|c| definition.identifier.contains(*c));
        if let Some(c) = separator {
            return Err(RegistryError::InvalidIdentifier {
                id: definition.identifier.clone(),
                reason: format!(
                    "contains {c:?}, a separator of naming pattern {:?}",
                    self.codec.pattern()
                ),
            });
        }

        if let Some(existing) = self.registry.alias_for_identifier(&definition.identifier) {
            if existing != alias {
                warn!(
                    id = %definition.identifier,
                    alias = %alias,
                    existing = %existing,
                    "identifier already used, reverse lookups resolve to the first alias"
                );
            }
        }

        self.registry.register(alias, definition)
    }

    pub fn resolve(&self, alias: &str) -> Result<&VariationDefinition, RegistryError> {
        self.registry.get(alias)
    }

    /// Derived filename of `source` for the variation registered as `alias`.
    pub fn derive(&self, source: &str, alias: &str) -> Result<String, RegistryError> {
        let definition = self.resolve(alias)?;
        Ok(self.derive_with(source, definition))
    }

    /// Derived filename of `source` for an already resolved definition.
    pub fn derive_with(&self, source: &str, definition: &VariationDefinition) -> String {
        self.codec
            .derive(source, &definition.identifier, &definition.extension)
    }

    pub fn parse(&self, derived: &str) -> Option<ParsedName> {
        self.codec.parse(derived)
    }

    /// Alias of the variation that produced `derived`, if any.
    pub fn alias_from_derived(&self, derived: &str) -> Option<String> {
        let parsed = self.codec.parse(derived)?;
        self.alias_for_identifier(&parsed.id)
    }

    /// Original stem recovered from `derived`.
    pub fn stem_from_derived(&self, derived: &str) -> Option<String> {
        self.codec.parse(derived).map(|parsed| parsed.stem)
    }

    fn alias_for_identifier(&self, id: &str) -> Option<String> {
        let mut memo = self.alias_by_id.lock();
        if let Some(alias) = memo.get(id) {
            return Some(alias.clone());
        }
        let alias = self.registry.alias_for_identifier(id)?.to_string();
        debug!(id, alias = %alias, "memoized identifier");
        memo.insert(id.to_string(), alias.clone());
        Some(alias)
    }
}
