//! CLI output formatting.
//!
//! # Output Format
//!
//! ## list
//!
//! ```text
//! 001 thumb
//!     id t1 → jpg, 200x200 crop, quality 80
//! 002 preview
//!     id t2 → webp, fit 1200x?, sharpen 10
//! ```
//!
//! ## create
//!
//! ```text
//! photos/cat.png
//!     → photos/cat__t1.jpg
//!     → photos/cat__t2.webp
//! ```
//!
//! `meta` and `parse` print one JSON object per line instead, so their
//! output can be piped straight into other tools.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, with no I/O.

use crate::meta::ImageMeta;
use crate::registry::VariationRegistry;
use crate::resolver::VariationResolver;
use crate::variation::VariationDefinition;
use serde::Serialize;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn side(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// One-line summary of what a definition does.
fn describe(def: &VariationDefinition) -> String {
    let mut parts = vec![def.extension.clone()];
    if def.has_box() {
        let (w, h) = (side(def.width), side(def.height));
        parts.push(if def.crop {
            format!("{w}x{h} crop")
        } else {
            format!("fit {w}x{h}")
        });
    }
    if let Some(q) = def.quality {
        parts.push(format!("quality {q}"));
    }
    if let Some(amount) = def.sharpen_amount() {
        parts.push(format!("sharpen {amount}"));
    }
    format!("id {} → {}", def.identifier, parts.join(", "))
}

pub fn format_variation_list(registry: &VariationRegistry) -> Vec<String> {
    if registry.is_empty() {
        return vec!["No variations registered".to_string()];
    }
    let mut lines = Vec::new();
    for (pos, (alias, def)) in registry.iter().enumerate() {
        lines.push(format!("{} {}", format_index(pos + 1), alias));
        lines.push(format!("{}{}", indent(1), describe(def)));
    }
    lines
}

pub fn print_variation_list(registry: &VariationRegistry) {
    for line in format_variation_list(registry) {
        println!("{line}");
    }
}

pub fn format_created(source: &str, derived: &[String]) -> Vec<String> {
    let mut lines = vec![source.to_string()];
    lines.extend(derived.iter().map(|name| format!("{}→ {name}", indent(1))));
    lines
}

pub fn print_created(source: &str, derived: &[String]) {
    for line in format_created(source, derived) {
        println!("{line}");
    }
}

/// JSON line for `meta`: the source name followed by its metadata.
#[derive(Debug, Serialize)]
pub struct MetaReport<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub meta: &'a ImageMeta,
}

pub fn format_meta(name: &str, meta: &ImageMeta) -> Result<String, serde_json::Error> {
    serde_json::to_string(&MetaReport { name, meta })
}

/// JSON line for `parse`. Every field is `null` for unrecognized names.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub alias: Option<String>,
    pub stem: Option<String>,
    pub id: Option<String>,
    pub extension: Option<String>,
}

impl ParseReport {
    pub fn new(resolver: &VariationResolver, derived: &str) -> Self {
        match resolver.parse(derived) {
            Some(parsed) => Self {
                alias: resolver.alias_from_derived(derived),
                stem: Some(parsed.stem),
                id: Some(parsed.id),
                extension: Some(parsed.extension),
            },
            None => Self::default(),
        }
    }
}

pub fn format_parse(report: &ParseReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}
