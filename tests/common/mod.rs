//! Shared fixtures: small workbooks written with rust_xlsxwriter

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A sheet as rows of cell text; empty strings leave the cell blank
pub type SheetSpec<'a> = (&'a str, &'a [&'a [&'a str]]);

pub fn write_workbook(path: &Path, sheets: &[SheetSpec]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

pub const STUDENTS: &[&[&str]] = &[
    &["Student No", "Name", "Class"],
    &["S001", "Alice", "1A"],
    &["S002", "Bob", "1B"],
    &["S003", "Carol", "1A"],
];

/// Upload dir holding `students.xlsx` with sheets `Sheet1` (students) and `Teachers`
pub fn students_dir() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("students.xlsx");
    write_workbook(
        &path,
        &[
            ("Sheet1", STUDENTS),
            ("Teachers", &[&["Teacher Name", "Subject"], &["Mr. Lee", "Math"]]),
        ],
    );
    (temp, path)
}
