//! Column addressing
//!
//! A column can be named four ways: a 1-based index, a spreadsheet letter name
//! (`A`..`ZZ`), a title from the header row, or a configured alias of that
//! title. Everything resolves to one 1-based position. An unknown name is
//! `None`, never an error.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Upper bound of the two-letter column grammar (`ZZ`)
pub const MAX_LETTER_COLUMN: usize = 702;

fn letter_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z]{1,2}$").ok())
        .as_ref()
}

/// Any of the accepted ways to name a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'a> {
    /// Already a 1-based position, returned as-is
    Index(usize),
    /// Letter name, title text or alias
    Name(&'a str),
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(name: &'a str) -> Self {
        ColumnKey::Name(name)
    }
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

/// Decode a spreadsheet letter name: `A` → 1, `Z` → 26, `AA` → 27, `ZZ` → 702
pub fn column_name_to_index(name: &str) -> Option<usize> {
    if !letter_pattern().is_some_and(|pattern| pattern.is_match(name)) {
        return None;
    }
    let value = |b: u8| (b - b'A' + 1) as usize;
    match name.as_bytes() {
        [single] => Some(value(*single)),
        [first, second] => Some(value(*first) * 26 + value(*second)),
        _ => None,
    }
}

/// Encode a 1-based position as a letter name: 1 → `A`, 27 → `AA`, 702 → `ZZ`.
/// Position 0 has no name.
pub fn column_index_to_name(index: usize) -> String {
    let mut name = String::new();
    let mut n = index;
    while n > 0 {
        let remainder = (n - 1) % 26;
        name.insert(0, (b'A' + remainder as u8) as char);
        n = (n - 1) / 26;
    }
    name
}

/// A1-style cell reference, e.g. `cell_name(3, 2)` → `B3`
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_index_to_name(col), row)
}

/// Lookup table from title text and aliases to 1-based column positions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleIndexes {
    positions: HashMap<String, usize>,
}

impl TitleIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, position: usize) {
        self.positions.insert(name.into(), position);
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Entries sorted by position, then name
    pub fn entries(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .positions
            .iter()
            .map(|(name, pos)| (name.as_str(), *pos))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Resolve a column key to a 1-based position.
    ///
    /// Letter names win over titles, so a title spelled like a column
    /// (`ID`, `X`) addresses that column rather than itself.
    pub fn column_index<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<usize> {
        match key.into() {
            ColumnKey::Index(index) => Some(index),
            ColumnKey::Name(name) => column_name_to_index(name).or_else(|| self.get(name)),
        }
    }

    /// Normalize any column key to its letter name (`"Student No"` → `"A"`)
    pub fn column_name<'a>(&self, key: impl Into<ColumnKey<'a>>) -> Option<String> {
        self.column_index(key)
            .filter(|index| *index > 0)
            .map(column_index_to_name)
    }
}

impl FromIterator<(String, usize)> for TitleIndexes {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
