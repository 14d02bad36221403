use calamine::Data;
use serde::{Deserialize, Serialize};

//==============================================================================
// Cell Values
//==============================================================================

/// A raw cell value as read from the workbook
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Cell holding an error code such as `#DIV/0!`
    Error(String),
}

/// One physical row of cells, left to right
pub type RawRow = Vec<CellValue>;

impl CellValue {
    /// Best-effort string representation used when materializing records
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Error(code) => code.clone(),
        }
    }

    /// Strict coercion for header cells. Error cells cannot name a column.
    pub fn as_title(&self) -> Option<String> {
        match self {
            CellValue::Error(_) => None,
            other => Some(other.to_text()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Whole numbers print without a fractional part ("42", not "42.0")
fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            // Dates and durations keep the text calamine renders for them
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

//==============================================================================
// Column Aliases
//==============================================================================

/// Interchangeable names for one logical column, e.g. `["Student No", "studentNo", "学号"]`
pub type AliasGroup = Vec<String>;

/// All configured alias groups, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasConfig {
    pub groups: Vec<AliasGroup>,
}

impl AliasConfig {
    pub fn new(groups: Vec<AliasGroup>) -> Self {
        Self { groups }
    }

    /// Build from string slices, mostly for tests and CLI flags
    pub fn from_slices(groups: &[&[&str]]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    /// Parse a CLI alias flag: `"Student No|studentNo|学号"`
    pub fn parse_group(text: &str) -> AliasGroup {
        text.split('|')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}
