//! Workbook loader - sheet rows → titles, header rows and data rows

use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, info, warn};

use super::schema::Schema;
use super::titles::{extract_titles, resolve_titles, ResolvedTitles};
use crate::config::ParseOptions;
use crate::error::QueryResult;
use crate::types::{CellValue, RawRow};

/// All physical rows of one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// Something that can open a workbook and hand out raw rows
pub trait WorkbookSource: Send + Sync {
    /// Sheet names in workbook order
    fn sheet_names(&self, path: &Path) -> QueryResult<Vec<String>>;

    /// Rows of the named sheet, or of the first sheet when `sheet` is `None`.
    /// `Ok(None)` when there is no such sheet.
    fn read_sheet(&self, path: &Path, sheet: Option<&str>) -> QueryResult<Option<SheetRows>>;
}

/// Reads .xlsx/.xlsm/.xlsb/.xls/.ods files through calamine
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineSource;

impl WorkbookSource for CalamineSource {
    fn sheet_names(&self, path: &Path) -> QueryResult<Vec<String>> {
        let workbook = open_workbook_auto(path)?;
        Ok(workbook.sheet_names())
    }

    fn read_sheet(&self, path: &Path, sheet: Option<&str>) -> QueryResult<Option<SheetRows>> {
        let mut workbook = open_workbook_auto(path)?;
        let names = workbook.sheet_names();

        let name = match sheet {
            Some(wanted) => names.into_iter().find(|name| name == wanted),
            None => names.into_iter().next(),
        };
        let Some(name) = name else {
            return Ok(None);
        };

        let range = workbook.worksheet_range(&name)?;
        Ok(Some(SheetRows {
            rows: range_to_rows(&range),
            name,
        }))
    }
}

/// calamine trims leading empty rows and columns from a range; put them back
/// so row numbers and column positions match the sheet.
fn range_to_rows(range: &Range<Data>) -> Vec<RawRow> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<RawRow> = (0..start_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(CellValue::from));
        rows.push(cells);
    }
    rows
}

/// One parsed sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    /// Resolved sheet name, empty when the sheet was not found
    pub sheet: String,
    pub found: bool,
    /// Titles of the data region, leading invalid columns excluded
    pub column_titles: Vec<String>,
    /// Header rows as read, leading invalid columns excluded
    pub title_rows: Vec<RawRow>,
    /// Data rows, leading invalid columns excluded
    pub rows: Vec<RawRow>,
    pub titles: ResolvedTitles,
    pub invalid_col_count: usize,
}

impl SheetData {
    /// Cell text of `row` at any column key; unresolved or out-of-range
    /// columns read as an empty string.
    pub fn value(&self, row: &RawRow, column: &str) -> String {
        self.titles
            .indexes
            .column_index(column)
            .and_then(|position| position.checked_sub(self.invalid_col_count + 1))
            .and_then(|offset| row.get(offset))
            .map(CellValue::to_text)
            .unwrap_or_default()
    }

    /// Schema over every titled column
    pub fn full_schema(&self) -> Schema {
        Schema::from_titles(&self.column_titles)
    }
}

/// Splits sheets into header and data rows according to [`ParseOptions`]
#[derive(Clone)]
pub struct WorkbookLoader {
    options: ParseOptions,
    source: Arc<dyn WorkbookSource>,
}

impl WorkbookLoader {
    /// Loader reading real workbook files
    pub fn new(options: ParseOptions) -> QueryResult<Self> {
        Self::with_source(options, Arc::new(CalamineSource))
    }

    pub fn with_source(options: ParseOptions, source: Arc<dyn WorkbookSource>) -> QueryResult<Self> {
        options.validate()?;
        Ok(Self { options, source })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn sheet_names(&self, path: &Path) -> QueryResult<Vec<String>> {
        self.source.sheet_names(path)
    }

    /// Whether the workbook has a sheet with this exact name
    pub fn has_sheet(&self, path: &Path, sheet: &str) -> QueryResult<bool> {
        Ok(self.sheet_names(path)?.iter().any(|name| name == sheet))
    }

    /// Load a sheet. An empty `sheet` selects the first sheet; a sheet that
    /// does not exist loads as empty data with `found == false`.
    pub fn load(&self, path: &Path, sheet: &str) -> QueryResult<SheetData> {
        let selector = (!sheet.is_empty()).then_some(sheet);
        let invalid = self.options.invalid_col_count;

        let Some(sheet_rows) = self.source.read_sheet(path, selector)? else {
            warn!(path = %path.display(), sheet, "sheet not found");
            return Ok(SheetData {
                invalid_col_count: invalid,
                ..Default::default()
            });
        };

        let width = sheet_rows.rows.iter().map(Vec::len).max().unwrap_or(0);
        info!(
            path = %path.display(),
            sheet = %sheet_rows.name,
            "{} x {}",
            sheet_rows.rows.len(),
            width
        );

        let mut data = SheetData {
            sheet: sheet_rows.name,
            found: true,
            invalid_col_count: invalid,
            ..Default::default()
        };

        for (i, row) in sheet_rows.rows.into_iter().enumerate() {
            let row_number = i + 1;
            let cells: RawRow = row.into_iter().skip(invalid).collect();

            if row_number > self.options.title_row_count {
                data.rows.push(cells);
            } else {
                if row_number == self.options.title_row_index {
                    data.column_titles = extract_titles(&cells, &self.options)?;
                }
                data.title_rows.push(cells);
            }
        }

        data.titles = resolve_titles(&data.column_titles, &self.options);
        debug!(
            sheet = %data.sheet,
            titles = ?data.column_titles,
            rows = data.rows.len(),
            "split header and data rows"
        );

        Ok(data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::types::AliasConfig;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory workbooks keyed by path, counting reads
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub workbooks: HashMap<String, Vec<SheetRows>>,
        pub reads: AtomicUsize,
    }

    impl MemorySource {
        pub fn with_sheet(mut self, path: &str, name: &str, rows: &[&[&str]]) -> Self {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(|s| CellValue::from(*s)).collect())
                .collect();
            self.workbooks
                .entry(path.to_string())
                .or_default()
                .push(SheetRows {
                    name: name.to_string(),
                    rows,
                });
            self
        }

        fn workbook(&self, path: &Path) -> QueryResult<&Vec<SheetRows>> {
            self.workbooks
                .get(&*path.to_string_lossy())
                .ok_or_else(|| QueryError::Workbook(format!("cannot open {}", path.display())))
        }
    }

    impl WorkbookSource for MemorySource {
        fn sheet_names(&self, path: &Path) -> QueryResult<Vec<String>> {
            Ok(self.workbook(path)?.iter().map(|s| s.name.clone()).collect())
        }

        fn read_sheet(&self, path: &Path, sheet: Option<&str>) -> QueryResult<Option<SheetRows>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let sheets = self.workbook(path)?;
            Ok(match sheet {
                Some(name) => sheets.iter().find(|s| s.name == name).cloned(),
                None => sheets.first().cloned(),
            })
        }
    }

    pub(crate) fn students() -> MemorySource {
        MemorySource::default().with_sheet(
            "students.xlsx",
            "Sheet1",
            &[
                &["Student No", "Name"],
                &["S001", "Alice"],
                &["S002", "Bob"],
            ],
        )
    }

    fn loader(source: MemorySource, options: ParseOptions) -> WorkbookLoader {
        WorkbookLoader::with_source(options, Arc::new(source)).unwrap()
    }

    #[test]
    fn test_load_splits_header_and_data() {
        let loader = loader(students(), ParseOptions::default());
        let data = loader.load(Path::new("students.xlsx"), "Sheet1").unwrap();

        assert!(data.found);
        assert_eq!(data.sheet, "Sheet1");
        assert_eq!(data.column_titles, vec!["Student No", "Name"]);
        assert_eq!(data.title_rows.len(), 1);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.value(&data.rows[1], "Name"), "Bob");
    }

    #[test]
    fn test_empty_selector_loads_first_sheet() {
        let source = students().with_sheet("students.xlsx", "Other", &[&["X"]]);
        let data = loader(source, ParseOptions::default())
            .load(Path::new("students.xlsx"), "")
            .unwrap();
        assert_eq!(data.sheet, "Sheet1");
    }

    #[test]
    fn test_missing_sheet_is_empty_not_error() {
        let data = loader(students(), ParseOptions::default())
            .load(Path::new("students.xlsx"), "Nope")
            .unwrap();
        assert!(!data.found);
        assert!(data.rows.is_empty());
        assert!(data.column_titles.is_empty());
    }

    #[test]
    fn test_missing_workbook_is_error() {
        let result = loader(students(), ParseOptions::default()).load(Path::new("gone.xlsx"), "");
        assert!(matches!(result, Err(QueryError::Workbook(_))));
    }

    #[test]
    fn test_has_sheet() {
        let loader = loader(students(), ParseOptions::default());
        assert!(loader.has_sheet(Path::new("students.xlsx"), "Sheet1").unwrap());
        assert!(!loader.has_sheet(Path::new("students.xlsx"), "sheet1").unwrap());
        assert!(loader.has_sheet(Path::new("gone.xlsx"), "Sheet1").is_err());
    }

    #[test]
    fn test_invalid_columns_and_multiple_header_rows() {
        let source = MemorySource::default().with_sheet(
            "gutter.xlsx",
            "Sheet1",
            &[
                &["", "Roster 2024", ""],
                &["#", "Student No", "Name"],
                &["1", "S001", "Alice"],
            ],
        );
        let options = ParseOptions {
            title_row_count: 2,
            title_row_index: 2,
            invalid_col_count: 1,
            aliases: AliasConfig::from_slices(&[&["Student No", "studentNo"]]),
            ..Default::default()
        };
        let data = loader(source, options)
            .load(Path::new("gutter.xlsx"), "Sheet1")
            .unwrap();

        assert_eq!(data.column_titles, vec!["Student No", "Name"]);
        assert_eq!(data.title_rows.len(), 2);
        assert_eq!(data.title_rows[0][0], CellValue::from("Roster 2024"));
        assert_eq!(data.rows, vec![vec![CellValue::from("S001"), CellValue::from("Alice")]]);

        let row = &data.rows[0];
        assert_eq!(data.titles.indexes.get("studentNo"), Some(2));
        assert_eq!(data.value(row, "studentNo"), "S001");
        assert_eq!(data.value(row, "C"), "Alice");
        // Column A is the dropped gutter
        assert_eq!(data.value(row, "A"), "");
    }

    #[test]
    fn test_value_out_of_range_is_empty() {
        let data = loader(students(), ParseOptions::default())
            .load(Path::new("students.xlsx"), "Sheet1")
            .unwrap();
        let row = &data.rows[0];
        assert_eq!(data.value(row, "Z"), "");
        assert_eq!(data.value(row, "Unknown Title"), "");
        assert_eq!(data.value(row, "A"), "S001");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ParseOptions {
            title_row_index: 5,
            ..Default::default()
        };
        assert!(WorkbookLoader::with_source(options, Arc::new(students())).is_err());
    }

    #[test]
    fn test_range_to_rows_restores_offsets() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("Name".to_string()));
        range.set_value((2, 3), Data::Float(3.0));

        let rows = range_to_rows(&range);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1][2], CellValue::from("Name"));
        assert_eq!(rows[1][3], CellValue::Empty);
        assert_eq!(rows[2][3], CellValue::Float(3.0));
    }

    #[test]
    fn test_range_to_rows_empty() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_rows(&range).is_empty());
    }
}
