//! Cell regions: open-ended requests and the concrete grid ranges they resolve to

use crate::error::SheetError;

/// Region of a worksheet to materialize.
///
/// Bounds are zero-based and half-open. An end of `None` extends to the
/// worksheet's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRegion {
    pub start_row: u32,
    pub end_row: Option<u32>,
    pub start_column: u32,
    pub end_column: Option<u32>,
}

impl CellRegion {
    /// Region with explicit bounds
    pub fn bounded(start_row: u32, end_row: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            start_row,
            end_row: Some(end_row),
            start_column,
            end_column: Some(end_column),
        }
    }

    /// Parse an A1 range such as `A1:L100`, `A5:5`, `B:D` or `C3`
    pub fn parse_a1(range: &str) -> Result<Self, SheetError> {
        let invalid = || SheetError::InvalidRange(range.to_string());

        let (start, end) = match range.split_once(':') {
            Some((start, end)) => (parse_ref(start).ok_or_else(invalid)?, Some(parse_ref(end).ok_or_else(invalid)?)),
            None => (parse_ref(range).ok_or_else(invalid)?, None),
        };

        let region = match end {
            Some(end) => Self {
                start_row: start.row.unwrap_or(0),
                end_row: end.row.map(|r| r + 1),
                start_column: start.column.unwrap_or(0),
                end_column: end.column.map(|c| c + 1),
            },
            None => {
                // A lone reference must name a single cell
                let (Some(row), Some(column)) = (start.row, start.column) else {
                    return Err(invalid());
                };
                Self::bounded(row, row + 1, column, column + 1)
            }
        };

        if region.end_row.is_some_and(|end| end <= region.start_row)
            || region.end_column.is_some_and(|end| end <= region.start_column)
        {
            return Err(invalid());
        }

        Ok(region)
    }

    /// Clamp the region to the worksheet's extents
    pub fn resolve(&self, row_count: u32, column_count: u32) -> GridRange {
        let end_row = self.end_row.unwrap_or(row_count).min(row_count);
        let end_column = self.end_column.unwrap_or(column_count).min(column_count);
        GridRange {
            start_row: self.start_row.min(end_row),
            end_row,
            start_column: self.start_column.min(end_column),
            end_column,
        }
    }
}

/// Concrete half-open range of cells inside a worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl GridRange {
    pub fn contains(&self, row: u32, column: u32) -> bool {
        (self.start_row..self.end_row).contains(&row)
            && (self.start_column..self.end_column).contains(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.start_row >= self.end_row || self.start_column >= self.end_column
    }
}

struct CellRef {
    column: Option<u32>,
    row: Option<u32>,
}

/// `B12` → column 1, row 11; `B` → column only; `12` → row only
fn parse_ref(reference: &str) -> Option<CellRef> {
    let reference = reference.trim().replace('$', "");
    let split = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(split);

    if letters.is_empty() && digits.is_empty() {
        return None;
    }

    let column = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters)?)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits.parse().ok()?;
        Some(row.checked_sub(1)?)
    };

    Some(CellRef { column, row })
}

/// Bijective base-26: `A` → 0, `Z` → 25, `AA` → 26
fn column_index(letters: &str) -> Option<u32> {
    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    index.checked_sub(1)
}

/// Column letters for a zero-based index, used in log messages
pub fn column_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
