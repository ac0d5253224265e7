//! Grid-to-record extraction
//!
//! Contact sheets have no fixed layout. The header row is found by scanning
//! the top-left `A1:L100` window for the `company_name` marker. Headers run
//! from column A until the first blank cell. Data rows follow directly below
//! and end at the first row whose marker column is blank.

use tracing::debug;

use super::classifier::classify;
use super::sheets::{column_letters, CellRegion, Worksheet};
use crate::error::SheetError;
use crate::types::ContactRecord;

/// Header text marking the header row and the key column
pub const HEADER_SENTINEL: &str = "company_name";

/// Window searched for the sentinel
pub const HEADER_SCAN_RANGE: &str = "A1:L100";
const HEADER_SCAN_ROWS: u32 = 100;
const HEADER_SCAN_COLUMNS: u32 = 12;

/// Hard cap on header columns read from the header row
pub const MAX_HEADER_COLUMNS: u32 = 200;

/// Result of the sentinel scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLocation {
    Found { column: u32, row: u32 },
    NotFound,
}

/// Header labels with a dedicated record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactField {
    FirstName,
    LastName,
    CompanyName,
    JobTitle,
    Email,
    Domain,
}

impl ContactField {
    fn from_header(label: &str) -> Option<Self> {
        match label {
            "First Name" => Some(Self::FirstName),
            "Last Name" => Some(Self::LastName),
            HEADER_SENTINEL => Some(Self::CompanyName),
            "Job Title" => Some(Self::JobTitle),
            "Email Address" => Some(Self::Email),
            "Company Website" => Some(Self::Domain),
            _ => None,
        }
    }
}

/// Find the first sentinel cell, scanning rows top to bottom and each row
/// left to right
pub async fn locate_header(sheet: &mut Worksheet) -> Result<HeaderLocation, SheetError> {
    sheet.load_a1(HEADER_SCAN_RANGE).await?;

    let rows = HEADER_SCAN_ROWS.min(sheet.row_count());
    let columns = HEADER_SCAN_COLUMNS.min(sheet.column_count());

    for row in 0..rows {
        for column in 0..columns {
            if sheet.cell(row, column)?.value.as_text() == Some(HEADER_SENTINEL) {
                debug!("Found header marker at {}{}", column_letters(column), row + 1);
                return Ok(HeaderLocation::Found { column, row });
            }
        }
    }

    Ok(HeaderLocation::NotFound)
}

/// Read header labels from column A until the first blank cell
pub async fn read_headers(sheet: &mut Worksheet, header_row: u32) -> Result<Vec<String>, SheetError> {
    let a1_row = header_row + 1;
    sheet.load_a1(&format!("A{}:{}", a1_row, a1_row)).await?;

    let mut headers = Vec::new();
    for column in 0..MAX_HEADER_COLUMNS.min(sheet.column_count()) {
        let cell = sheet.cell(header_row, column)?;
        if !cell.value.is_truthy() {
            break;
        }
        headers.push(cell.value.to_display_string());
    }

    Ok(headers)
}

/// Build one record per row from `start_row` until the key column runs blank
pub async fn extract_records(
    sheet: &mut Worksheet,
    headers: &[String],
    key_column: u32,
    start_row: u32,
    row_count: u32,
) -> Result<Vec<ContactRecord>, SheetError> {
    let column_span = (headers.len() as u32).max(key_column + 1);
    sheet
        .load_cells(&CellRegion::bounded(start_row, row_count, 0, column_span))
        .await?;

    let fields: Vec<Option<ContactField>> = headers
        .iter()
        .map(|label| ContactField::from_header(label))
        .collect();

    let mut records = Vec::new();
    for row in start_row..row_count {
        if !sheet.cell(row, key_column)?.value.is_truthy() {
            break;
        }

        let mut record = ContactRecord::default();
        for (column, (label, field)) in headers.iter().zip(&fields).enumerate() {
            let cell = sheet.cell(row, column as u32)?;
            let text = cell.value.to_display_string();

            match field {
                Some(ContactField::FirstName) => record.first_name = text,
                Some(ContactField::LastName) => record.last_name = text,
                Some(ContactField::CompanyName) => record.company_name = text,
                Some(ContactField::JobTitle) => record.job_title = text,
                Some(ContactField::Email) => {
                    record.email = text;
                    record.email_status = Some(classify(cell.background));
                }
                Some(ContactField::Domain) => record.domain = text,
                None => {
                    let value = cell.value.is_truthy().then_some(text);
                    record.extra.insert(label.clone(), value);
                }
            }
        }
        records.push(record);
    }

    Ok(records)
}
