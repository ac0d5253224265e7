//! Cell types shared by the spreadsheet clients and the extractor

use serde::Deserialize;

/// Effective background color of a cell.
///
/// Channel intensities are in `0.0..=1.0`. The Sheets API omits channels
/// that are zero, so every channel defaults to `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct CellColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[cfg(test)]
impl CellColor {
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Effective value of a cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula error, holding the API error type (e.g. `DIVIDE_BY_ZERO`)
    Error(String),
}

impl CellValue {
    /// Whether the value counts as "present".
    ///
    /// Empty text, zero, `false` and absent values are not present. The
    /// table walk and the header scan both stop on a value that is not present.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(text) => !text.is_empty(),
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Bool(b) => *b,
            CellValue::Error(_) => true,
        }
    }

    /// Text content, only for text cells
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// String form used for record fields and header labels.
    ///
    /// Absent values become an empty string. Numbers print in their shortest
    /// round-trip form and every formula error prints as `#ERROR!`.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(_) => FORMULA_ERROR_TEXT.to_string(),
        }
    }
}

/// Display text shared by all formula errors
pub const FORMULA_ERROR_TEXT: &str = "#ERROR!";

/// Number formatting used by spreadsheet front ends: plain decimal notation
/// for magnitudes in `1e-6..1e21`, exponent notation with an explicit sign
/// outside it.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }

    let scientific = format!("{:e}", n);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => scientific,
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

/// A single materialized cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub background: Option<CellColor>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        value: CellValue::Empty,
        background: None,
    };
}
