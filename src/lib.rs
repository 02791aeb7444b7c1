//! # image-variations
//!
//! Named, reproducible image variants with reversible filenames.
//!
//! A *variation* is a recipe (output format, optional box, crop or fit,
//! quality, sharpening) registered under an alias such as `thumb`. Applying
//! it to a source file produces a *derived* file whose name encodes the
//! source stem and the variation's short identifier:
//!
//! ```text
//! photos/cat.png  +  thumb (id t1, jpg)  →  photos/cat__t1.jpg
//! ```
//!
//! The name can be parsed back into `{stem, id, extension}` and the id
//! mapped back to its alias, so derived files never need a side table.
//!
//! # Architecture
//!
//! ```text
//! alias ─▶ VariationResolver ─▶ definition ─▶ VariationPipeline
//!                │                                   │
//!                └─ FilenameCodec                    ├─▶ Storage::copy (pass-through)
//!                   (derive / parse)                 └─▶ ImageBackend ─▶ Storage::writer
//! ```
//!
//! The pipeline talks to pixels and bytes only through two traits:
//! [`imaging::ImageBackend`] and [`storage::Storage`]. Tests drive it with
//! recording mocks; the binary wires in [`imaging::RustBackend`] and
//! [`storage::LocalStorage`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`variation`] | `VariationDefinition` and identifier rules |
//! | [`registry`] | Alias → definition map in registration order |
//! | [`naming`] | `FilenameCodec`: pattern-driven derive and parse |
//! | [`resolver`] | Alias lookup plus memoized reverse lookup from derived names |
//! | [`meta`] | `ImageMeta`: dimensions, placeholder, average color |
//! | [`pipeline`] | Create, create-all, delete and metadata use-cases |
//! | [`uri`] | Public links to derived files |
//! | [`imaging`] | Backend trait, parameters, dimension math, `image`-crate backend |
//! | [`storage`] | Storage trait and local-directory implementation |
//! | [`config`] | Layered `image-variations.toml` loading and validation |
//! | [`logging`] | `tracing-subscriber` setup for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Pattern, Three Placeholders
//!
//! A naming pattern must use `%filename%`, `%id%` and `%ext%` exactly once,
//! with literal text between neighbours. Identifiers may not contain the
//! pattern's literal characters. Together these keep derive and parse
//! inverse to each other for every registered identifier. Stems are free
//! text, so a stem that repeats the separators can still split more than
//! one way; parsing then takes the leftmost, shortest match.
//!
//! ## Pass-Through Is Decided by the Source
//!
//! Sources in a pass-through format (`gif`, `svg`) are copied unchanged and
//! keep their own extension, whatever the variation asks for. Animated GIFs
//! and vector files survive intact.
//!
//! ## No Globals
//!
//! The registry, naming pattern and reverse-lookup memo all live on a
//! [`resolver::VariationResolver`] value. Registration takes `&mut self`, so
//! it is finished before the resolver is shared across threads.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod meta;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod storage;
pub mod uri;
pub mod variation;

#[cfg(test)]
pub(crate) mod test_helpers;
