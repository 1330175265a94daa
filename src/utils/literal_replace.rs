//! Single-pass literal substitution.
//!
//! All needles are compiled into one alternation, longest first, and the
//! haystack is scanned once. A position consumed by one substitution is never
//! revisited, so replacement text can't be rewritten again by a later rule.
//! Needles that begin or end with an identifier character only match on
//! identifier boundaries: `meta_x.meta_value` must not fire inside
//! `parent_meta_x.meta_value`.

use regex::{Captures, Regex};
use std::collections::HashMap;

use super::sql_quoting::is_identifier_char;

#[derive(Debug, Clone)]
pub struct LiteralReplacer {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl LiteralReplacer {
    /// Build a replacer from `(needle, replacement)` pairs.
    ///
    /// Empty needles are ignored; when a needle appears twice the first
    /// replacement wins.
    pub fn new<I, K, V>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut replacements: HashMap<String, String> = HashMap::new();
        for (needle, replacement) in pairs {
            let needle = needle.into();
            if needle.is_empty() {
                continue;
            }
            replacements.entry(needle).or_insert_with(|| replacement.into());
        }

        if replacements.is_empty() {
            return Ok(Self {
                pattern: None,
                replacements,
            });
        }

        let mut needles: Vec<&String> = replacements.keys().collect();
        // Longest first so the alternation prefers the widest literal at a position
        needles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = needles
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            pattern: Some(Regex::new(&alternation)?),
            replacements,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Apply every substitution to `text` in one scan.
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &Captures| {
                let Some(m) = caps.get(0) else {
                    return String::new();
                };
                let needle = m.as_str();
                if !on_identifier_boundary(text, m.start(), m.end(), needle) {
                    return needle.to_string();
                }
                self.replacements
                    .get(needle)
                    .cloned()
                    .unwrap_or_else(|| needle.to_string())
            })
            .into_owned()
    }
}

fn on_identifier_boundary(text: &str, start: usize, end: usize, needle: &str) -> bool {
    let starts_with_ident = needle.chars().next().is_some_and(is_identifier_char);
    let ends_with_ident = needle.chars().last().is_some_and(is_identifier_char);

    if starts_with_ident && text[..start].chars().last().is_some_and(is_identifier_char) {
        return false;
    }
    if ends_with_ident && text[end..].chars().next().is_some_and(is_identifier_char) {
        return false;
    }
    true
}
