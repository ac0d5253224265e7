//! In-memory spreadsheet service for tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{FetchedCell, GridRange, SpreadsheetService, WorksheetProperties};
use crate::error::SheetError;
use crate::types::{Cell, CellColor, CellValue};

/// Hand-built worksheet
#[derive(Debug, Clone)]
pub struct MemorySheet {
    row_count: u32,
    column_count: u32,
    cells: HashMap<(u32, u32), Cell>,
}

impl MemorySheet {
    pub fn new(row_count: u32, column_count: u32) -> Self {
        Self {
            row_count,
            column_count,
            cells: HashMap::new(),
        }
    }

    pub fn with_value(mut self, row: u32, column: u32, value: CellValue) -> Self {
        self.cells.entry((row, column)).or_default().value = value;
        self
    }

    pub fn with_text(self, row: u32, column: u32, text: &str) -> Self {
        self.with_value(row, column, CellValue::from(text))
    }

    /// Fill a row from column 0; empty strings leave the cell blank
    pub fn with_row(mut self, row: u32, values: &[&str]) -> Self {
        for (column, text) in values.iter().enumerate() {
            if !text.is_empty() {
                self = self.with_text(row, column as u32, text);
            }
        }
        self
    }

    pub fn with_background(mut self, row: u32, column: u32, color: CellColor) -> Self {
        self.cells.entry((row, column)).or_default().background = Some(color);
        self
    }
}

/// Serves `MemorySheet`s and records every fetched range
#[derive(Default)]
pub struct MemorySpreadsheetService {
    sheets: HashMap<(String, String), MemorySheet>,
    fetched: Mutex<Vec<GridRange>>,
}

impl MemorySpreadsheetService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, spreadsheet_id: &str, sheet_id: &str, sheet: MemorySheet) -> Self {
        self.sheets
            .insert((spreadsheet_id.to_string(), sheet_id.to_string()), sheet);
        self
    }

    pub fn fetched_ranges(&self) -> Vec<GridRange> {
        self.fetched.lock().clone()
    }

    fn sheet(&self, spreadsheet_id: &str, sheet_id: &str) -> Result<&MemorySheet, SheetError> {
        self.sheets
            .get(&(spreadsheet_id.to_string(), sheet_id.to_string()))
            .ok_or_else(|| SheetError::WorksheetNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                sheet_id: sheet_id.to_string(),
            })
    }
}

#[async_trait]
impl SpreadsheetService for MemorySpreadsheetService {
    async fn worksheet_properties(
        &self,
        spreadsheet_id: &str,
        sheet_id: &str,
    ) -> Result<WorksheetProperties, SheetError> {
        let sheet = self.sheet(spreadsheet_id, sheet_id)?;
        Ok(WorksheetProperties {
            sheet_id: sheet_id.to_string(),
            title: format!("Sheet {}", sheet_id),
            row_count: sheet.row_count,
            column_count: sheet.column_count,
        })
    }

    async fn fetch_cells(
        &self,
        spreadsheet_id: &str,
        properties: &WorksheetProperties,
        range: &GridRange,
    ) -> Result<Vec<FetchedCell>, SheetError> {
        let sheet = self.sheet(spreadsheet_id, &properties.sheet_id)?;
        self.fetched.lock().push(*range);

        Ok(sheet
            .cells
            .iter()
            .filter(|((row, column), _)| range.contains(*row, *column))
            .map(|(&(row, column), cell)| FetchedCell {
                row,
                column,
                cell: cell.clone(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
