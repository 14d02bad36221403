//! Records - one dynamic instance of a [`Schema`] per data row

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::loader::SheetData;
use super::schema::Schema;
use crate::types::RawRow;

/// Field name → string value, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.push((field.into(), value.into()));
    }

    /// Value of `field`, `None` when the record has no such field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy the fields named by `schema` into a new record. Fields this record
    /// lacks come out as empty strings.
    pub fn project(&self, schema: &Schema) -> Record {
        let mut projected = Record::with_capacity(schema.len());
        for field in schema.fields() {
            projected.push(field.name.clone(), self.get(&field.name).unwrap_or_default());
        }
        projected
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Build one record: each schema field reads the cell its title resolves to
pub fn materialize(schema: &Schema, row: &RawRow, sheet: &SheetData) -> Record {
    let mut record = Record::with_capacity(schema.len());
    for field in schema.fields() {
        record.push(field.name.clone(), sheet.value(row, &field.title));
    }
    record
}

/// Materialize every data row of `sheet`
pub fn materialize_all(schema: &Schema, sheet: &SheetData) -> Vec<Record> {
    sheet
        .rows
        .iter()
        .map(|row| materialize(schema, row, sheet))
        .collect()
}
