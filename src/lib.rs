//! Excel Query - spreadsheet rows as dynamically-shaped records
//!
//! Reads a sheet, resolves its header titles (plus configured aliases) to
//! column positions, derives a record schema from the title text and serves
//! the rows as ordered field → string records. Results are cached per
//! (file, sheet) until the cache is cleared.
//!
//! # Example
//!
//! ```no_run
//! use excel_query::config::EngineConfig;
//! use excel_query::engine::ExcelQueryEngine;
//!
//! let engine = ExcelQueryEngine::new(&EngineConfig::default())?;
//!
//! let brief = engine.list_brief("students", "Sheet1", "studentNo,name", "studentNo")?;
//! println!("{} records", brief.len());
//!
//! if let Some(record) = engine.get_by_key("students", "Sheet1", "studentNo", "S001")? {
//!     println!("{}", serde_json::to_string(&record).unwrap_or_default());
//! }
//! # Ok::<(), excel_query::error::QueryError>(())
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheEntry, QueryCache};
pub use config::{EngineConfig, ParseOptions};
pub use engine::ExcelQueryEngine;
pub use error::{QueryError, QueryResult};
pub use excel::{Record, Schema, TitleIndexes};
pub use types::{AliasConfig, CellValue, RawRow};
