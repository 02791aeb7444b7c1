//! Reversible filename generation for image variations.
//!
//! A [`FilenameCodec`] owns one naming pattern, a template with exactly three
//! placeholders:
//!
//! - `%filename%`: the source stem (no directory, no extension)
//! - `%id%`: the variation identifier
//! - `%ext%`: the resolved extension
//!
//! The default pattern `%filename%__%id%.%ext%` turns `photos/cat.png` plus
//! identifier `t1` into `photos/cat__t1.jpg`.
//!
//! ## Generating
//!
//! The source is split into directory prefix, stem and extension. The
//! extension written into the name is the *source* extension when it is a
//! pass-through format (`gif`, `svg` by default) and the variation's own
//! extension otherwise. The directory prefix is put back in front.
//!
//! ## Parsing
//!
//! The pattern is split into literal and placeholder segments once, at
//! construction. Parsing matches an anchored expression where every literal
//! is escaped and every placeholder is a lazy `.+?` capture. Captures are
//! taken over the whole input, so any directory prefix ends up in the stem.
//!
//! When a stem contains the pattern's own separators there is more than one
//! valid split and the engine's leftmost-first, shortest-capture policy
//! decides: `a__b__t1.jpg` parses as stem `a`, identifier `b__t1`.

use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

/// The process-wide default naming pattern.
pub const DEFAULT_PATTERN: &str = "%filename%__%id%.%ext%";

/// Source extensions copied verbatim by default.
pub const DEFAULT_PASS_THROUGH: &[&str] = &["gif", "svg"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("naming pattern {pattern:?} is missing placeholder {placeholder}")]
    MissingPlaceholder {
        pattern: String,
        placeholder: &'static str,
    },
    #[error("naming pattern {pattern:?} repeats placeholder {placeholder}")]
    RepeatedPlaceholder {
        pattern: String,
        placeholder: &'static str,
    },
    #[error("naming pattern {pattern:?} cannot be compiled: {reason}")]
    Compile { pattern: String, reason: String },
    #[error("naming pattern {pattern:?} needs a literal between {left} and {right}")]
    AdjacentPlaceholders {
        pattern: String,
        left: &'static str,
        right: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Filename,
    Id,
    Ext,
}

impl Placeholder {
    const ALL: [Placeholder; 3] = [Placeholder::Filename, Placeholder::Id, Placeholder::Ext];

    fn token(self) -> &'static str {
        match self {
            Placeholder::Filename => "%filename%",
            Placeholder::Id => "%id%",
            Placeholder::Ext => "%ext%",
        }
    }

    fn group(self) -> &'static str {
        match self {
            Placeholder::Filename => "filename",
            Placeholder::Id => "id",
            Placeholder::Ext => "ext",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Split a pattern into literal and placeholder segments.
fn split_pattern(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    'scan: while !rest.is_empty() {
        for placeholder in Placeholder::ALL {
            if let Some(after) = rest.strip_prefix(placeholder.token()) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(placeholder));
                rest = after;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            literal.push(c);
        }
        rest = chars.as_str();
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    for placeholder in Placeholder::ALL {
        let count = segments
            .iter()
            .filter(|s| **s == Segment::Placeholder(placeholder))
            .count();
        match count {
            0 => {
                return Err(PatternError::MissingPlaceholder {
                    pattern: pattern.to_string(),
                    placeholder: placeholder.token(),
                });
            }
            1 => {}
            _ => {
                return Err(PatternError::RepeatedPlaceholder {
                    pattern: pattern.to_string(),
                    placeholder: placeholder.token(),
                });
            }
        }
    }

    // Two lazy captures side by side would always split after one character.
    for pair in segments.windows(2) {
        if let [Segment::Placeholder(left), Segment::Placeholder(right)] = pair {
            return Err(PatternError::AdjacentPlaceholders {
                pattern: pattern.to_string(),
                left: left.token(),
                right: right.token(),
            });
        }
    }

    Ok(segments)
}

/// A source filename broken into the parts the pattern needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParts<'a> {
    /// Everything before the basename, including the trailing `/`.
    pub prefix: &'a str,
    /// Basename up to its last `.`.
    pub stem: &'a str,
    /// Text after the basename's last `.`, if any.
    pub extension: Option<&'a str>,
}

/// Split `photos/cat.png` into `("photos/", "cat", Some("png"))`.
pub fn split_source(source: &str) -> SourceParts<'_> {
    let base_start = source.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (prefix, basename) = source.split_at(base_start);
    match basename.rsplit_once('.') {
        Some((stem, ext)) => SourceParts {
            prefix,
            stem,
            extension: Some(ext),
        },
        None => SourceParts {
            prefix,
            stem: basename,
            extension: None,
        },
    }
}

/// Extension of a source filename, `None` when it has none.
pub fn source_extension(source: &str) -> Option<&str> {
    split_source(source).extension
}

/// Parts recovered from a derived filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub id: String,
    /// Original stem. Includes the directory prefix, if the input had one.
    pub stem: String,
    pub extension: String,
}

/// Generates and parses variation filenames for one naming pattern.
#[derive(Debug, Clone)]
pub struct FilenameCodec {
    pattern: String,
    segments: Vec<Segment>,
    matcher: Regex,
    pass_through: HashSet<String>,
}

impl FilenameCodec {
    /// Build a codec for `pattern` with the default pass-through formats.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let segments = split_pattern(pattern)?;

        let mut expr = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => expr.push_str(&regex::escape(text)),
                Segment::Placeholder(p) => {
                    expr.push_str(&format!("(?P<{}>.+?)", p.group()));
                }
            }
        }
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(|e| PatternError::Compile {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            matcher,
            pass_through: DEFAULT_PASS_THROUGH.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the pass-through format set.
    pub fn with_pass_through<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pass_through = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_pass_through(&self, extension: &str) -> bool {
        self.pass_through.contains(extension)
    }

    /// Characters that appear in the pattern's literal separators.
    pub fn separator_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.segments.iter().flat_map(|s| match s {
            Segment::Literal(text) => text.chars().collect::<Vec<_>>(),
            Segment::Placeholder(_) => Vec::new(),
        })
    }

    /// Generate the derived filename for `source` and a variation.
    ///
    /// `variation_ext` is used unless the source extension is pass-through.
    pub fn derive(&self, source: &str, id: &str, variation_ext: &str) -> String {
        let parts = split_source(source);
        let ext = match parts.extension {
            Some(ext) if self.is_pass_through(ext) => ext,
            _ => variation_ext,
        };

        let mut out = String::from(parts.prefix);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(Placeholder::Filename) => out.push_str(parts.stem),
                Segment::Placeholder(Placeholder::Id) => out.push_str(id),
                Segment::Placeholder(Placeholder::Ext) => out.push_str(ext),
            }
        }
        out
    }

    /// Recover `{id, stem, extension}` from a derived filename.
    ///
    /// Returns `None` when the name does not match the pattern.
    pub fn parse(&self, derived: &str) -> Option<ParsedName> {
        let caps = self.matcher.captures(derived)?;
        Some(ParsedName {
            id: caps.name("id")?.as_str().to_string(),
            stem: caps.name("filename")?.as_str().to_string(),
            extension: caps.name("ext")?.as_str().to_string(),
        })
    }
}

impl Default for FilenameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN).expect("default pattern is valid")
    }
}
