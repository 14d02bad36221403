//! Spreadsheet-to-record engine
//!
//! - Column addressing: index, letter name, title or alias → 1-based position
//! - Title resolution: header titles + alias groups → lookup table
//! - Loading: sheet rows → titles, header rows, data rows
//! - Schemas and records: dynamic record shapes built from header text

mod address;
pub(crate) mod loader;
mod record;
mod schema;
mod titles;

pub use address::{
    cell_name, column_index_to_name, column_name_to_index, ColumnKey, TitleIndexes,
    MAX_LETTER_COLUMN,
};
pub use loader::{CalamineSource, SheetData, SheetRows, WorkbookLoader, WorkbookSource};
pub use record::{materialize, materialize_all, Record};
pub use schema::{to_camel_case, Schema, SchemaField};
pub use titles::{extract_titles, resolve_titles, ResolvedTitles};
