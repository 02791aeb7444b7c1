//! Public links to derived files.

use crate::registry::RegistryError;
use crate::resolver::VariationResolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UriOptions {
    /// Base put in front of every derived name, e.g. `https://cdn.example.com`.
    pub prefix: String,
    /// Joins prefix and derived name.
    pub glue: String,
}

impl Default for UriOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            glue: "/".to_string(),
        }
    }
}

/// Builds the public URI of one variation for any source name.
pub struct VariationUriStrategy<'a> {
    resolver: &'a VariationResolver,
    alias: String,
    options: UriOptions,
}

impl<'a> VariationUriStrategy<'a> {
    pub fn new(
        resolver: &'a VariationResolver,
        alias: impl Into<String>,
        options: UriOptions,
    ) -> Self {
        Self {
            resolver,
            alias: alias.into(),
            options,
        }
    }

    /// `prefix + glue + derived`, with no doubled glue at the seam.
    pub fn apply(&self, resource: &str) -> Result<String, RegistryError> {
        let derived = self.resolver.derive(resource, &self.alias)?;
        Ok(join(&self.options.prefix, &derived, &self.options.glue))
    }
}

fn join(prefix: &str, name: &str, glue: &str) -> String {
    if glue.is_empty() {
        return format!("{prefix}{name}");
    }
    format!(
        "{}{glue}{}",
        prefix.trim_end_matches(glue),
        name.trim_start_matches(glue)
    )
}
