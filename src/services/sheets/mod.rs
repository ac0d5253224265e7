//! Spreadsheet service abstraction
//!
//! `SpreadsheetService` is the boundary to the document store. It resolves
//! worksheet metadata and fetches raw cells for a grid range. `Worksheet` sits
//! on top and keeps track of which regions were loaded. Reading a cell outside
//! every loaded region is an error.
//!
//! - `GoogleSheetsClient` talks to the Sheets v4 REST API (production)
//! - `MemorySpreadsheetService` serves hand-built grids (tests)

mod auth;
mod google;
#[cfg(test)]
pub mod memory;
mod range;

pub use auth::GoogleCredentials;
pub use google::{GoogleSheetsClient, GoogleSheetsConfig};
pub use range::{column_letters, CellRegion, GridRange};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SheetError;
use crate::types::Cell;

/// Worksheet metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetProperties {
    pub sheet_id: String,
    pub title: String,
    pub row_count: u32,
    pub column_count: u32,
}

/// A cell returned by the service together with its coordinates
#[derive(Debug, Clone)]
pub struct FetchedCell {
    pub row: u32,
    pub column: u32,
    pub cell: Cell,
}

/// Spreadsheet service trait for abstraction (Google Sheets, in-memory)
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Look up a worksheet by its sheet id
    async fn worksheet_properties(
        &self,
        spreadsheet_id: &str,
        sheet_id: &str,
    ) -> Result<WorksheetProperties, SheetError>;

    /// Fetch every non-blank cell inside `range`.
    /// Cells missing from the result are empty.
    async fn fetch_cells(
        &self,
        spreadsheet_id: &str,
        sheet: &WorksheetProperties,
        range: &GridRange,
    ) -> Result<Vec<FetchedCell>, SheetError>;

    /// Get service name for logging
    fn name(&self) -> &'static str;
}

static EMPTY_CELL: Cell = Cell::EMPTY;

/// Read-only view over one worksheet with explicit cell loading
pub struct Worksheet {
    service: Arc<dyn SpreadsheetService>,
    spreadsheet_id: String,
    properties: WorksheetProperties,
    loaded: Vec<GridRange>,
    cells: HashMap<(u32, u32), Cell>,
}

impl Worksheet {
    /// Resolve the worksheet; no cells are loaded yet
    pub async fn open(
        service: Arc<dyn SpreadsheetService>,
        spreadsheet_id: &str,
        sheet_id: &str,
    ) -> Result<Self, SheetError> {
        let properties = service.worksheet_properties(spreadsheet_id, sheet_id).await?;
        debug!(
            "Opened worksheet '{}' ({} rows x {} columns) via {}",
            properties.title,
            properties.row_count,
            properties.column_count,
            service.name()
        );

        Ok(Self {
            service,
            spreadsheet_id: spreadsheet_id.to_string(),
            properties,
            loaded: Vec::new(),
            cells: HashMap::new(),
        })
    }

    pub fn properties(&self) -> &WorksheetProperties {
        &self.properties
    }

    pub fn row_count(&self) -> u32 {
        self.properties.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.properties.column_count
    }

    /// Materialize a region; later loads overwrite overlapping cells
    pub async fn load_cells(&mut self, region: &CellRegion) -> Result<(), SheetError> {
        let range = region.resolve(self.properties.row_count, self.properties.column_count);
        if range.is_empty() {
            return Ok(());
        }

        let fetched = self
            .service
            .fetch_cells(&self.spreadsheet_id, &self.properties, &range)
            .await?;

        for cell in fetched {
            if range.contains(cell.row, cell.column) {
                self.cells.insert((cell.row, cell.column), cell.cell);
            }
        }
        // Blank cells inside the range are absent from the fetch result
        self.loaded.push(range);

        Ok(())
    }

    /// Materialize a region given in A1 notation
    pub async fn load_a1(&mut self, range: &str) -> Result<(), SheetError> {
        let region = CellRegion::parse_a1(range)?;
        self.load_cells(&region).await
    }

    /// Read a loaded cell
    pub fn cell(&self, row: u32, column: u32) -> Result<&Cell, SheetError> {
        if !self.loaded.iter().any(|range| range.contains(row, column)) {
            return Err(SheetError::CellNotLoaded { row, column });
        }
        Ok(self.cells.get(&(row, column)).unwrap_or(&EMPTY_CELL))
    }
}
