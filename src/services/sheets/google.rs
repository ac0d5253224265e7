//! Google Sheets v4 REST client
//!
//! API documentation:
//! https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::auth::{GoogleCredentials, ServiceAccountAuth};
use super::{FetchedCell, GridRange, SpreadsheetService, WorksheetProperties};
use crate::error::SheetError;
use crate::types::{Cell, CellColor, CellValue};

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const PROPERTIES_FIELDS: &str = "sheets.properties(sheetId,title,gridProperties(rowCount,columnCount))";
const GRID_DATA_FIELDS: &str =
    "sheets(data(startRow,startColumn,rowData(values(effectiveValue,effectiveFormat/backgroundColor))))";

/// Google Sheets client configuration
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    /// Base URL of the Sheets API
    pub api_url: String,
    /// OAuth2 token endpoint
    pub token_url: String,
    pub credentials: GoogleCredentials,
}

impl GoogleSheetsConfig {
    pub fn new(credentials: GoogleCredentials) -> Self {
        Self {
            api_url: DEFAULT_SHEETS_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            credentials,
        }
    }
}

/// Google Sheets client authenticated as a service account
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    api_url: String,
    auth: ServiceAccountAuth,
}

impl GoogleSheetsClient {
    pub fn new(config: GoogleSheetsConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sheet-relay-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        let auth = ServiceAccountAuth::new(http.clone(), config.token_url, config.credentials);

        Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!("{}/v4/spreadsheets/{}", self.api_url, urlencoding::encode(spreadsheet_id))
    }

    async fn read_response(response: reqwest::Response) -> Result<SpreadsheetDto, SheetError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SheetError::Api { status, message });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    async fn worksheet_properties(
        &self,
        spreadsheet_id: &str,
        sheet_id: &str,
    ) -> Result<WorksheetProperties, SheetError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(self.spreadsheet_url(spreadsheet_id))
            .query(&[("fields", PROPERTIES_FIELDS)])
            .bearer_auth(token)
            .send()
            .await?;

        let spreadsheet = Self::read_response(response).await?;
        find_worksheet(spreadsheet, spreadsheet_id, sheet_id)
    }

    async fn fetch_cells(
        &self,
        spreadsheet_id: &str,
        sheet: &WorksheetProperties,
        range: &GridRange,
    ) -> Result<Vec<FetchedCell>, SheetError> {
        let numeric_id: i64 = sheet.sheet_id.parse().map_err(|_| SheetError::WorksheetNotFound {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id: sheet.sheet_id.clone(),
        })?;

        let body = json!({
            "dataFilters": [{
                "gridRange": {
                    "sheetId": numeric_id,
                    "startRowIndex": range.start_row,
                    "endRowIndex": range.end_row,
                    "startColumnIndex": range.start_column,
                    "endColumnIndex": range.end_column,
                }
            }],
            "includeGridData": true,
        });

        debug!(
            "Loading rows {}..{} columns {}..{} of '{}'",
            range.start_row, range.end_row, range.start_column, range.end_column, sheet.title
        );

        let token = self.auth.access_token().await?;
        let response = self
            .http
            .post(format!("{}:getByDataFilter", self.spreadsheet_url(spreadsheet_id)))
            .query(&[("fields", GRID_DATA_FIELDS)])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let spreadsheet = Self::read_response(response).await?;
        Ok(collect_cells(spreadsheet))
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}

// ==========================================================================
// API response types
// ==========================================================================

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetDto {
    #[serde(default)]
    sheets: Vec<SheetDto>,
}

#[derive(Debug, Deserialize)]
struct SheetDto {
    #[serde(default)]
    properties: Option<SheetPropertiesDto>,
    #[serde(default)]
    data: Vec<GridDataDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesDto {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    grid_properties: GridPropertiesDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridPropertiesDto {
    #[serde(default)]
    row_count: u32,
    #[serde(default)]
    column_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridDataDto {
    #[serde(default)]
    start_row: u32,
    #[serde(default)]
    start_column: u32,
    #[serde(default)]
    row_data: Vec<RowDataDto>,
}

#[derive(Debug, Default, Deserialize)]
struct RowDataDto {
    #[serde(default)]
    values: Vec<CellDataDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellDataDto {
    effective_value: Option<ExtendedValueDto>,
    effective_format: Option<CellFormatDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedValueDto {
    string_value: Option<String>,
    number_value: Option<f64>,
    bool_value: Option<bool>,
    error_value: Option<ErrorValueDto>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorValueDto {
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellFormatDto {
    background_color: Option<CellColor>,
}

impl From<CellDataDto> for Cell {
    fn from(dto: CellDataDto) -> Self {
        let value = match dto.effective_value {
            Some(ExtendedValueDto { string_value: Some(s), .. }) => CellValue::Text(s),
            Some(ExtendedValueDto { number_value: Some(n), .. }) => CellValue::Number(n),
            Some(ExtendedValueDto { bool_value: Some(b), .. }) => CellValue::Bool(b),
            Some(ExtendedValueDto { error_value: Some(e), .. }) => CellValue::Error(e.kind),
            _ => CellValue::Empty,
        };

        Cell {
            value,
            background: dto.effective_format.and_then(|f| f.background_color),
        }
    }
}

fn find_worksheet(
    spreadsheet: SpreadsheetDto,
    spreadsheet_id: &str,
    sheet_id: &str,
) -> Result<WorksheetProperties, SheetError> {
    spreadsheet
        .sheets
        .into_iter()
        .filter_map(|sheet| sheet.properties)
        .find(|properties| properties.sheet_id.to_string() == sheet_id.trim())
        .map(|properties| WorksheetProperties {
            sheet_id: properties.sheet_id.to_string(),
            title: properties.title,
            row_count: properties.grid_properties.row_count,
            column_count: properties.grid_properties.column_count,
        })
        .ok_or_else(|| SheetError::WorksheetNotFound {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id: sheet_id.to_string(),
        })
}

fn collect_cells(spreadsheet: SpreadsheetDto) -> Vec<FetchedCell> {
    let mut cells = Vec::new();
    for grid in spreadsheet.sheets.into_iter().flat_map(|sheet| sheet.data) {
        for (row_offset, row) in grid.row_data.into_iter().enumerate() {
            for (column_offset, cell) in row.values.into_iter().enumerate() {
                cells.push(FetchedCell {
                    row: grid.start_row + row_offset as u32,
                    column: grid.start_column + column_offset as u32,
                    cell: Cell::from(cell),
                });
            }
        }
    }
    cells
}
