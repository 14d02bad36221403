//! Query cache
//!
//! One entry per (file, sheet) holding the fully materialized records. Entries
//! are built outside the lock and inserted whole, so readers never see a
//! partial record list. Two callers racing on the same uncached key may both
//! load; the first insertion is kept.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::QueryResult;
use crate::excel::{materialize_all, to_camel_case, Record, Schema, WorkbookLoader};

/// Materialized rows of one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub file: String,
    pub sheet: String,
    /// Field used by [`CacheEntry::find_by_key`]
    pub key_field: String,
    /// Schema over every titled column
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl CacheEntry {
    /// Re-project every record through a brief schema
    pub fn project_brief(&self, brief: &Schema) -> Vec<Record> {
        self.records.iter().map(|r| r.project(brief)).collect()
    }

    /// First record whose key field equals `key`. Later duplicates are ignored.
    pub fn find_by_key(&self, key: &str) -> Option<&Record> {
        self.find_by_field(&self.key_field, key)
    }

    /// First record whose `field` equals `value` exactly
    pub fn find_by_field(&self, field: &str, value: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.get(field) == Some(value))
    }
}

/// Process-wide result cache, keyed `"file#sheet"`
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_key(file: &str, sheet: &str) -> String {
        format!("{}#{}", file, sheet)
    }

    pub fn get(&self, file: &str, sheet: &str) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(&Self::cache_key(file, sheet)).cloned()
    }

    /// Return the cached entry for (file, sheet), loading it from `path` on a
    /// miss. A sheet missing from the workbook comes back as an empty entry
    /// and is not cached.
    pub fn get_or_load(
        &self,
        loader: &WorkbookLoader,
        file: &str,
        path: &Path,
        sheet: &str,
        key_field: &str,
    ) -> QueryResult<Arc<CacheEntry>> {
        let key = Self::cache_key(file, sheet);
        if let Some(entry) = self.entries.read().get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(Arc::clone(entry));
        }

        let data = loader.load(path, sheet)?;
        let schema = data.full_schema();
        let records = materialize_all(&schema, &data);
        let entry = Arc::new(CacheEntry {
            file: file.to_string(),
            sheet: sheet.to_string(),
            key_field: to_camel_case(key_field),
            schema,
            records,
        });

        if !data.found {
            return Ok(entry);
        }

        info!(key = %key, records = entry.records.len(), "cached sheet");
        let mut entries = self.entries.write();
        Ok(Arc::clone(entries.entry(key).or_insert(entry)))
    }

    /// Drop every entry; the next query reloads from the workbook
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        info!(entries = entries.len(), "clearing query cache");
        entries.clear();
    }

    /// Drop the entries of one file, whatever the sheet
    pub fn evict_file(&self, file: &str) {
        let prefix = format!("{}#", file);
        self.entries.write().retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
