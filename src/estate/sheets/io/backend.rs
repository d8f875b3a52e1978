//! Spreadsheet backend adapter.
//!
//! Sheets are read by exporting them as delimited text through their numeric
//! handle and written back through the authenticated update call, either as
//! a whole-sheet replacement or as an append. All calls block; the manager
//! is synchronous request/response end to end.

use tracing::{debug, info};

use crate::estate::sheets::config::BackendConfig;
use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::model::{CellValue, ListingRow, ListingTable, SheetKind};

/// Storage seam for the read and mutation paths. Implemented by
/// [`SheetsClient`] for the live document and by in-memory stores in tests.
pub trait SheetStore {
    /// Reads the current contents of a sheet.
    fn fetch(&self, sheet: SheetKind) -> Result<ListingTable>;

    /// Replaces the whole contents of a sheet, header row included.
    fn replace(&mut self, sheet: SheetKind, table: &ListingTable) -> Result<()>;

    /// Appends rows to a sheet, aligned to the given column order.
    fn append(&mut self, sheet: SheetKind, columns: &[String], rows: &[ListingRow]) -> Result<()>;
}

/// HTTP client for the spreadsheet backend.
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    config: BackendConfig,
}

impl SheetsClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }

    fn export_url(&self, sheet: SheetKind) -> String {
        format!(
            "{}/export?format=csv&gid={}",
            self.config.base_url,
            self.config.handles.get(sheet)
        )
    }

    fn update_url(&self, sheet: SheetKind, mode: &str) -> String {
        format!(
            "{}/sheets/{}?mode={mode}",
            self.config.base_url,
            self.config.handles.get(sheet)
        )
    }

    fn push(&self, sheet: SheetKind, mode: &str, values: Vec<Vec<String>>) -> Result<()> {
        let endpoint = self.update_url(sheet, mode);
        let row_count = values.len();
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({ "values": values }))
            .send()?;

        if !response.status().is_success() {
            return Err(SheetError::Backend {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        info!(sheet = %sheet, mode, rows = row_count, "sheet updated");
        Ok(())
    }
}

impl SheetStore for SheetsClient {
    fn fetch(&self, sheet: SheetKind) -> Result<ListingTable> {
        let endpoint = self.export_url(sheet);
        let response = self.http.get(&endpoint).send()?;
        if !response.status().is_success() {
            return Err(SheetError::Backend {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        let payload = response.text()?;
        let table = parse_export(sheet, &payload)?;
        debug!(sheet = %sheet, rows = table.len(), "sheet exported");
        Ok(table)
    }

    fn replace(&mut self, sheet: SheetKind, table: &ListingTable) -> Result<()> {
        let mut values = vec![table.columns.clone()];
        values.extend(render_rows(&table.columns, &table.rows));
        self.push(sheet, "replace", values)
    }

    fn append(&mut self, sheet: SheetKind, columns: &[String], rows: &[ListingRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.push(sheet, "append", render_rows(columns, rows))
    }
}

/// Parses a delimited-text export into a table. The first record is the raw
/// header row; blank fields are dropped so rows stay sparse.
pub fn parse_export(sheet: SheetKind, payload: &str) -> Result<ListingTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(payload.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut table = ListingTable::with_columns(sheet, headers.clone());
    for record in reader.records() {
        let record = record?;
        let mut row = ListingRow::new();
        for (index, column) in headers.iter().enumerate() {
            let value = CellValue::from_field(record.get(index).unwrap_or(""));
            if !value.is_empty() {
                row.set(column.clone(), value);
            }
        }
        table.rows.push(row);
    }
    Ok(table)
}

/// Renders rows in the given column order; absent cells become empty fields.
fn render_rows(columns: &[String], rows: &[ListingRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| columns.iter().map(|column| row.display(column)).collect())
        .collect()
}
