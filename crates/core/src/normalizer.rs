//! Name normalization: noisy folder or archive names to a canonical title guess.
//!
//! The transform is pure and idempotent. Removed fragments are replaced by a
//! space rather than deleted, so that removing one fragment can never glue its
//! neighbours into a new removable fragment on a second pass.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::config::{default_blocklist, ScannerConfig};

/// `[...]` segments, usually release-group tags. `(?s)` so a segment spanning
/// a line break is removed as a whole.
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").unwrap());

/// Dotted versions such as `v1.2.3`, removed before dots become separators.
static DOTTED_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)v\d+(?:\.\d+)+").unwrap());

/// A release year in parentheses, e.g. `(1999)`.
static PAREN_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((?:19|20)\d{2}\)").unwrap());

/// A whole token that is a bare version, e.g. `v2`.
static BARE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^v\d+(?:\.\d+)*$").unwrap());

const SEPARATORS: [char; 3] = ['.', '_', '-'];

/// Derives a search-friendly title from a raw on-disk name.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    blocklist: HashSet<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(default_blocklist())
    }
}

impl NameNormalizer {
    /// Create a normalizer with the given noise words (case-insensitive).
    pub fn new<I, S>(blocklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocklist: blocklist
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(&config.blocklist)
    }

    /// Normalize a raw name into a title-cased guess.
    ///
    /// Returns `raw_name` unchanged when every token is filtered out, so the
    /// result is never empty for non-empty input.
    pub fn normalize(&self, raw_name: &str) -> String {
        let name = BRACKETED.replace_all(raw_name, " ");
        let name = DOTTED_VERSION.replace_all(&name, " ");
        let name = name.replace(SEPARATORS, " ");
        let name = PAREN_YEAR.replace_all(&name, " ");

        let tokens: Vec<String> = name
            .split_whitespace()
            .filter(|token| !self.is_noise(token))
            .map(title_case)
            .collect();

        if tokens.is_empty() {
            return raw_name.to_string();
        }

        tokens.join(" ")
    }

    /// A token is noise if it or its title-cased form is blocklisted.
    ///
    /// Both forms are checked because case mapping does not round-trip for
    /// every character (`ı` uppercases to `I`, which lowercases to `i`), so
    /// a surviving token must not become blocklisted once title-cased.
    fn is_noise(&self, token: &str) -> bool {
        let titled = title_case(token);
        self.blocklist.contains(&token.to_lowercase())
            || self.blocklist.contains(&titled.to_lowercase())
            || BARE_VERSION.is_match(token)
            || BARE_VERSION.is_match(&titled)
    }
}

/// Uppercase the first character, lowercase the rest.
///
/// A first character whose uppercase form expands to several characters
/// (e.g. `ß`) is kept as-is, otherwise a second pass would lowercase the
/// expansion and break idempotence.
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(word.len());
    let upper = first.to_uppercase();
    if upper.len() == 1 {
        out.extend(upper);
    } else {
        out.push(first);
    }
    for c in chars {
        out.extend(c.to_lowercase());
    }
    out
}
