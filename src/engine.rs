//! Query engine - the operations exposed to the CLI and the HTTP API

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheEntry, QueryCache};
use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::excel::{column_index_to_name, Record, Schema, SheetData, WorkbookLoader};

/// Workbook formats calamine can open
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "xla", "xlam", "ods"];

/// A workbook in the upload directory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub key: usize,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub time_of_upload: String,
}

/// A stored upload: the client's name and where it landed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    /// File name as sent by the client
    pub name: String,
    pub size: u64,
    /// File name inside the upload directory, made unique
    pub filename: String,
    pub path: String,
}

/// Maps file identifiers to workbook paths inside one directory
#[derive(Debug, Clone)]
pub struct WorkbookStore {
    dir: PathBuf,
    extension: String,
}

impl WorkbookStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `students` → `<dir>/students.xlsx`; `students.ods` is kept as is.
    /// Identifiers that would leave the directory are rejected.
    pub fn resolve(&self, file: &str) -> QueryResult<PathBuf> {
        Ok(self.dir.join(self.relative(file)?))
    }

    /// Canonical name of a workbook inside the directory: `students` and
    /// `students.xlsx` both name `students.xlsx`.
    pub fn canonical_name(&self, file: &str) -> QueryResult<String> {
        Ok(self.relative(file)?.to_string_lossy().into_owned())
    }

    fn relative(&self, file: &str) -> QueryResult<PathBuf> {
        let file = file.trim();
        if file.is_empty() {
            return Err(QueryError::InvalidRequest("file is required".to_string()));
        }

        let relative = Path::new(file);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(QueryError::InvalidRequest(format!(
                "file '{}' must name a workbook inside the upload directory",
                file
            )));
        }

        let has_extension = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                WORKBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
            });
        if has_extension {
            Ok(relative.to_path_buf())
        } else {
            Ok(PathBuf::from(format!("{}{}", file, self.extension)))
        }
    }

    /// Workbooks in the directory, sorted by name. A missing directory is empty.
    pub fn list(&self) -> QueryResult<Vec<FileItem>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                let modified: DateTime<Utc> = metadata.modified()?.into();
                files.push((entry.path(), metadata.len(), modified));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(files
            .into_iter()
            .enumerate()
            .map(|(i, (path, size, modified))| FileItem {
                id: (i + 1).to_string(),
                key: i + 1,
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                file_path: path.display().to_string(),
                file_size: size,
                time_of_upload: modified.to_rfc3339(),
            })
            .collect())
    }

    /// Delete a workbook. Returns false when it did not exist.
    pub fn delete(&self, file: &str) -> QueryResult<bool> {
        let path = self.resolve(file)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Store uploaded bytes under the client's file name. An existing file is
    /// never overwritten: `students.xlsx` becomes `students_1.xlsx`, then
    /// `students_2.xlsx` and so on.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> QueryResult<UploadResult> {
        let name = Path::new(file_name.trim())
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                QueryError::InvalidRequest(format!("'{}' is not a valid file name", file_name))
            })?;
        fs::create_dir_all(&self.dir)?;

        let path = Path::new(name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut candidate = name.to_string();
        let mut attempt = 0;
        loop {
            let target = self.dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(mut out) => {
                    out.write_all(bytes)?;
                    return Ok(UploadResult {
                        name: name.to_string(),
                        size: bytes.len() as u64,
                        filename: candidate,
                        path: target.display().to_string(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                    candidate = format!("{}_{}{}", stem, attempt, extension);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Contents of a workbook with its file name, for download
    pub fn read(&self, file: &str) -> QueryResult<(String, Vec<u8>)> {
        let name = self.canonical_name(file)?;
        let bytes = fs::read(self.dir.join(&name))?;
        let file_name = Path::new(&name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);
        Ok((file_name, bytes))
    }
}

/// Title layout of one sheet, for inspection
#[derive(Debug, Clone, Serialize)]
pub struct SheetDescription {
    pub sheet: String,
    pub found: bool,
    pub column_titles: Vec<String>,
    /// (name, column letter) pairs for every title and alias
    pub columns: Vec<(String, String)>,
    pub schema: Schema,
    pub rows: usize,
}

impl From<&SheetData> for SheetDescription {
    fn from(data: &SheetData) -> Self {
        Self {
            sheet: data.sheet.clone(),
            found: data.found,
            column_titles: data.column_titles.clone(),
            columns: data
                .titles
                .indexes
                .entries()
                .into_iter()
                .map(|(name, pos)| (name.to_string(), column_index_to_name(pos)))
                .collect(),
            schema: data.full_schema(),
            rows: data.rows.len(),
        }
    }
}

/// Spreadsheet query engine: loader, workbook store and result cache
#[derive(Clone)]
pub struct ExcelQueryEngine {
    loader: WorkbookLoader,
    store: WorkbookStore,
    cache: Arc<QueryCache>,
}

impl ExcelQueryEngine {
    pub fn new(config: &EngineConfig) -> QueryResult<Self> {
        let loader = WorkbookLoader::new(config.parse.clone())?;
        let store = WorkbookStore::new(config.upload_dir.clone(), config.extension.clone());
        Ok(Self::with_parts(loader, store, Arc::new(QueryCache::new())))
    }

    pub fn with_parts(loader: WorkbookLoader, store: WorkbookStore, cache: Arc<QueryCache>) -> Self {
        Self {
            loader,
            store,
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn store(&self) -> &WorkbookStore {
        &self.store
    }

    pub fn loader(&self) -> &WorkbookLoader {
        &self.loader
    }

    /// Cache entries are keyed by the canonical workbook name, so every
    /// identifier of one workbook shares its entries.
    fn load_entry(&self, file: &str, sheet: &str, key_field: &str) -> QueryResult<Arc<CacheEntry>> {
        let name = self.store.canonical_name(file)?;
        let path = self.store.resolve(file)?;
        self.cache
            .get_or_load(&self.loader, &name, &path, sheet, key_field)
    }

    /// Every record of the sheet, projected onto the comma-separated `fields`
    pub fn list_brief(
        &self,
        file: &str,
        sheet: &str,
        fields: &str,
        key_field: &str,
    ) -> QueryResult<Vec<Record>> {
        let brief = Schema::from_field_list(fields);
        if brief.is_empty() {
            return Err(QueryError::InvalidRequest("fields are required".to_string()));
        }

        let entry = self.load_entry(file, sheet, key_field)?;
        debug!(file, sheet, fields = brief.len(), "brief list");
        Ok(entry.project_brief(&brief))
    }

    /// Full record whose key field equals `key`.
    ///
    /// Matching always uses the key field stored in the cache entry.
    /// `key_field` only seeds that entry when the sheet is not cached yet;
    /// once a sheet is cached under one key field, lookups naming another
    /// field still match on the cached one. Takes no field list: the whole
    /// record is returned, so a brief field list sent by a caller is unused.
    pub fn get_by_key(
        &self,
        file: &str,
        sheet: &str,
        key_field: &str,
        key: &str,
    ) -> QueryResult<Option<Record>> {
        let entry = self.load_entry(file, sheet, key_field)?;
        Ok(entry.find_by_key(key).cloned())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn has_sheet(&self, file: &str, sheet: &str) -> QueryResult<bool> {
        self.loader.has_sheet(&self.store.resolve(file)?, sheet)
    }

    pub fn sheet_names(&self, file: &str) -> QueryResult<Vec<String>> {
        self.loader.sheet_names(&self.store.resolve(file)?)
    }

    /// Parse a sheet's titles without touching the cache
    pub fn describe(&self, file: &str, sheet: &str) -> QueryResult<SheetDescription> {
        let data = self.loader.load(&self.store.resolve(file)?, sheet)?;
        Ok(SheetDescription::from(&data))
    }

    pub fn list_files(&self) -> QueryResult<Vec<FileItem>> {
        self.store.list()
    }

    /// Delete a workbook and drop its cached sheets
    pub fn delete_file(&self, file: &str) -> QueryResult<bool> {
        let name = self.store.canonical_name(file)?;
        let deleted = self.store.delete(file)?;
        self.cache.evict_file(&name);
        info!(file = %name, deleted, "delete workbook");
        Ok(deleted)
    }

    /// Store an uploaded workbook under a name no other file uses
    pub fn upload_file(&self, file_name: &str, bytes: &[u8]) -> QueryResult<UploadResult> {
        let upload = self.store.save(file_name, bytes)?;
        self.cache.evict_file(&upload.filename);
        info!(file = %upload.filename, size = upload.size, "upload workbook");
        Ok(upload)
    }

    /// File name and bytes of a stored workbook
    pub fn download_file(&self, file: &str) -> QueryResult<(String, Vec<u8>)> {
        self.store.read(file)
    }
}
