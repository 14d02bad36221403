use crate::config::{EngineConfig, ParseOptions};
use crate::engine::ExcelQueryEngine;
use crate::error::{QueryError, QueryResult};
use crate::types::AliasConfig;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Parse settings gathered from CLI flags
#[derive(Debug, Clone, Default)]
pub struct ParseArgs {
    /// YAML config file; its `parse` section is the base
    pub config: Option<PathBuf>,
    /// Extra alias groups, `"Student No|studentNo|学号"`
    pub aliases: Vec<String>,
    pub title_row_count: Option<usize>,
    pub title_row_index: Option<usize>,
    pub invalid_col_count: Option<usize>,
}

impl ParseArgs {
    /// Config file settings first, then flag overrides
    pub fn to_options(&self) -> QueryResult<ParseOptions> {
        let mut options = match &self.config {
            Some(path) => EngineConfig::from_file(path)?.parse,
            None => ParseOptions::default(),
        };

        options
            .aliases
            .groups
            .extend(self.aliases.iter().map(|group| AliasConfig::parse_group(group)));
        if let Some(count) = self.title_row_count {
            options.title_row_count = count;
        }
        if let Some(index) = self.title_row_index {
            options.title_row_index = index;
        }
        if let Some(count) = self.invalid_col_count {
            options.invalid_col_count = count;
        }

        options.validate()?;
        Ok(options)
    }
}

/// Engine rooted at the workbook's directory, plus the file identifier in it
fn open_engine(workbook: &Path, args: &ParseArgs) -> QueryResult<(ExcelQueryEngine, String)> {
    let file = workbook
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            QueryError::InvalidRequest(format!("'{}' is not a workbook file", workbook.display()))
        })?;
    let dir = workbook
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let config = EngineConfig {
        upload_dir: dir,
        parse: args.to_options()?,
        ..Default::default()
    };
    Ok((ExcelQueryEngine::new(&config)?, file))
}

fn print_json<T: Serialize>(value: &T) -> QueryResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QueryError::Io(std::io::Error::other(e)))?;
    println!("{}", json);
    Ok(())
}

/// Execute the list command
pub fn list(
    workbook: PathBuf,
    sheet: String,
    fields: String,
    key: String,
    json: bool,
    args: &ParseArgs,
) -> QueryResult<()> {
    let (engine, file) = open_engine(&workbook, args)?;
    let records = engine.list_brief(&file, &sheet, &fields, &key)?;

    if !json {
        println!("{}", "📋 Excel Query - Brief list".bold().green());
        println!("   File:   {}", workbook.display());
        println!("   Sheet:  {}", display_sheet(&sheet));
        println!("   Fields: {}", fields.bright_blue());
        println!("   {} records\n", records.len());
    }
    print_json(&records)
}

/// Execute the get command
pub fn get(
    workbook: PathBuf,
    sheet: String,
    key_name: String,
    key: String,
    json: bool,
    args: &ParseArgs,
) -> QueryResult<()> {
    let (engine, file) = open_engine(&workbook, args)?;
    let record = engine.get_by_key(&file, &sheet, &key_name, &key)?;

    if json {
        return print_json(&record);
    }

    println!("{}", "🔎 Excel Query - Record".bold().green());
    println!("   File:  {}", workbook.display());
    println!("   Sheet: {}", display_sheet(&sheet));
    println!("   Key:   {} = {}\n", key_name.bright_blue(), key.bright_yellow());

    match record {
        Some(record) => print_json(&record),
        None => {
            println!(
                "{}",
                format!("⚠️  No record with {} = {}", key_name, key).yellow()
            );
            Ok(())
        }
    }
}

/// Execute the titles command
pub fn titles(workbook: PathBuf, sheet: String, args: &ParseArgs) -> QueryResult<()> {
    let (engine, file) = open_engine(&workbook, args)?;
    let description = engine.describe(&file, &sheet)?;

    println!("{}", "🏷️  Excel Query - Column titles".bold().green());
    println!("   File: {}", workbook.display());

    if !description.found {
        println!(
            "{}",
            format!("⚠️  Sheet '{}' not found", sheet).yellow()
        );
        return Ok(());
    }
    println!("   Sheet: {} ({} data rows)\n", description.sheet, description.rows);

    println!("{}", "   Columns:".bold());
    for (name, letter) in &description.columns {
        println!("   {:>4}  {}", letter.cyan(), name);
    }

    println!("\n{}", "   Fields:".bold());
    for field in description.schema.fields() {
        println!("   {:<20} ← {}", field.name.bright_blue(), field.title);
    }
    println!();

    Ok(())
}

/// Execute the sheets command
pub fn sheets(workbook: PathBuf, check: Option<String>, args: &ParseArgs) -> QueryResult<()> {
    let (engine, file) = open_engine(&workbook, args)?;

    if let Some(sheet) = check {
        if engine.has_sheet(&file, &sheet)? {
            println!("{}", format!("✅ Sheet '{}' exists", sheet).green());
            return Ok(());
        }
        println!("{}", format!("❌ Sheet '{}' not found", sheet).red());
        return Err(QueryError::InvalidRequest(format!(
            "sheet '{}' not found in {}",
            sheet,
            workbook.display()
        )));
    }

    println!("{}", "📑 Excel Query - Sheets".bold().green());
    println!("   File: {}\n", workbook.display());
    for (i, name) in engine.sheet_names(&file)?.iter().enumerate() {
        println!("   {}. {}", i + 1, name);
    }
    println!();

    Ok(())
}

fn display_sheet(sheet: &str) -> String {
    if sheet.is_empty() {
        "(first sheet)".to_string()
    } else {
        sheet.to_string()
    }
}
