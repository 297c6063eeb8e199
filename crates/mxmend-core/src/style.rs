//! Cell style strings.
//!
//! A style is a semicolon-delimited list of `key=value` tokens, for example
//! `rounded=1;whiteSpace=wrap;html=1;`. Tokens without `=` name a stylesheet
//! entry (`ellipse;`) and are kept as value-less keys.
//!
//! Parsing normalizes into a sorted map with one entry per key, so the
//! serialized form never contains duplicates and is stable across runs.

use std::{collections::BTreeMap, fmt};

/// A parsed, de-duplicated style map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    entries: BTreeMap<String, Option<String>>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a style string. Empty tokens are ignored; when a key repeats,
    /// the later token wins.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for token in text.split(';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        continue;
                    }
                    entries.insert(key.to_string(), Some(value.trim().to_string()));
                }
                None => {
                    entries.insert(token.to_string(), None);
                }
            }
        }
        Self { entries }
    }

    /// Returns the value for `key`. Value-less tokens yield `Some("")`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|value| value.as_deref().unwrap_or(""))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets `key=value` and reports whether the stored value changed.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let next = Some(value.to_string());
        match self.entries.get_mut(key) {
            Some(current) if *current == next => false,
            Some(current) => {
                *current = next;
                true
            }
            None => {
                self.entries.insert(key.to_string(), next);
                true
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Style {
    /// Writes every token terminated by `;` in sorted key order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            match value {
                Some(value) => write!(f, "{key}={value};")?,
                None => write!(f, "{key};")?,
            }
        }
        Ok(())
    }
}
