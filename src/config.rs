//! Engine configuration
//!
//! Parse options are fixed when the engine is built and never re-read per call.
//! They can be loaded from a YAML file:
//!
//! ```yaml
//! upload_dir: Upload
//! extension: .xlsx
//! parse:
//!   title_row_count: 1
//!   title_row_index: 1
//!   invalid_col_count: 0
//!   aliases:
//!     - ["Student No", studentNo, 学号]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::types::{AliasConfig, CellValue};

/// Turns the header row's cells into the ordered title list
pub type TitleExtractor = Arc<dyn Fn(&[CellValue]) -> QueryResult<Vec<String>> + Send + Sync>;

/// How a sheet is split into header and data rows
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Title aliases: `[["A", "field1", "字段一"], ["B", "field2", "字段二"]]`
    pub aliases: AliasConfig,
    /// Number of leading non-data rows
    pub title_row_count: usize,
    /// 1-based row holding the column titles
    pub title_row_index: usize,
    /// Leading columns dropped from every row (row-number gutters and the like)
    pub invalid_col_count: usize,
    #[serde(skip)]
    pub title_extractor: Option<TitleExtractor>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            aliases: AliasConfig::default(),
            title_row_count: 1,
            title_row_index: 1,
            invalid_col_count: 0,
            title_extractor: None,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("aliases", &self.aliases)
            .field("title_row_count", &self.title_row_count)
            .field("title_row_index", &self.title_row_index)
            .field("invalid_col_count", &self.invalid_col_count)
            .field("title_extractor", &self.title_extractor.is_some())
            .finish()
    }
}

impl ParseOptions {
    pub fn with_aliases(mut self, aliases: AliasConfig) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_title_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&[CellValue]) -> QueryResult<Vec<String>> + Send + Sync + 'static,
    {
        self.title_extractor = Some(Arc::new(extractor));
        self
    }

    /// The title row must be one of the header rows
    pub fn validate(&self) -> QueryResult<()> {
        if self.title_row_count > 0
            && (self.title_row_index == 0 || self.title_row_index > self.title_row_count)
        {
            return Err(QueryError::Config(format!(
                "title_row_index {} must be within 1..={}",
                self.title_row_index, self.title_row_count
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the queryable workbooks
    pub upload_dir: PathBuf,
    /// Appended to file identifiers that carry no extension
    pub extension: String,
    pub parse: ParseOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("Upload"),
            extension: ".xlsx".to_string(),
            parse: ParseOptions::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> QueryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> QueryResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.parse.validate()?;
        Ok(config)
    }
}
