//! Dynamic record schemas
//!
//! Record shapes are built at runtime from header text. A schema is an
//! ordered list of (field name, source title) pairs: the field name is the
//! serialized key, the title is used to find the column again.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

/// Compact identifier for a title: `"student_no"` → `"studentNo"`,
/// `"Student No"` → `"studentNo"`, `"ID"` → `"id"`.
pub fn to_camel_case(title: &str) -> String {
    let mut words = title
        .trim()
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty());
    let mut result = String::with_capacity(title.len());

    if let Some(first) = words.next() {
        if first.chars().any(char::is_lowercase) {
            let mut chars = first.chars();
            if let Some(c) = chars.next() {
                result.extend(c.to_lowercase());
                result.push_str(chars.as_str());
            }
        } else {
            result.push_str(&first.to_lowercase());
        }
    }

    for word in words {
        let mut chars = word.chars();
        if let Some(c) = chars.next() {
            result.extend(c.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    result
}

/// One field of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    /// Normalized identifier, the key in serialized records
    pub name: String,
    /// Title text the field was derived from
    pub title: String,
}

/// Ordered field list describing one record shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    /// Build a schema from candidate titles.
    ///
    /// Blank candidates are dropped. If two candidates normalize to the same
    /// field name, the first one is kept.
    pub fn from_titles<S: AsRef<str>>(titles: &[S]) -> Self {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(titles.len());

        for candidate in titles {
            let title = candidate.as_ref().trim();
            if title.is_empty() {
                continue;
            }
            let name = to_camel_case(title);
            if !seen.insert(name.clone()) {
                warn!(field = %name, title, "duplicate field name, keeping the first column");
                continue;
            }
            fields.push(SchemaField {
                name,
                title: title.to_string(),
            });
        }

        Self { fields }
    }

    /// Build a schema from a comma-separated list: `"studentNo, name"`
    pub fn from_field_list(list: &str) -> Self {
        let candidates: Vec<&str> = list.split(',').map(str::trim).collect();
        Self::from_titles(&candidates)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
