/// Google Sheets store
///
/// Reads and writes the log through the Sheets API v4 `values` endpoints.
/// The spreadsheet is addressed by id, or looked up once by file name through
/// the Drive API when only a name is configured.
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, AppResult},
    models::{
        entry::{FIRST_DATA_ROW, LAST_COLUMN},
        MediaEntry, SheetRows, StoredEntry,
    },
    services::store::{credentials::TokenSource, EntryStore},
};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

pub struct GoogleSheetsStore {
    http_client: HttpClient,
    tokens: TokenSource,
    spreadsheet_id: OnceCell<String>,
    spreadsheet_name: String,
    worksheet: String,
}

impl GoogleSheetsStore {
    /// Creates a store. Without `spreadsheet_id` the id is resolved from
    /// `spreadsheet_name` on first use.
    pub fn new(
        http_client: HttpClient,
        tokens: TokenSource,
        spreadsheet_id: Option<String>,
        spreadsheet_name: String,
        worksheet: String,
    ) -> Self {
        let id_cell = match spreadsheet_id {
            Some(id) => OnceCell::new_with(Some(id)),
            None => OnceCell::new(),
        };

        Self {
            http_client,
            tokens,
            spreadsheet_id: id_cell,
            spreadsheet_name,
            worksheet,
        }
    }

    async fn spreadsheet_id(&self) -> AppResult<&str> {
        self.spreadsheet_id
            .get_or_try_init(|| self.resolve_spreadsheet_id())
            .await
            .map(String::as_str)
    }

    async fn resolve_spreadsheet_id(&self) -> AppResult<String> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            self.spreadsheet_name.replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let token = self.tokens.access_token().await?;
        let request = self
            .http_client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")]);

        let list: DriveFileList = serde_json::from_value(send(request).await?)
            .map_err(|e| AppError::ExternalApi(format!("Invalid Drive response: {}", e)))?;

        let id = list.files.into_iter().next().map(|f| f.id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Spreadsheet '{}' not found. Share it with {} as an editor.",
                self.spreadsheet_name,
                self.tokens.client_email()
            ))
        })?;

        tracing::info!(
            spreadsheet = %self.spreadsheet_name,
            spreadsheet_id = %id,
            "Resolved spreadsheet by name"
        );

        Ok(id)
    }

    /// A1 range inside the configured worksheet
    fn range(&self, cells: &str) -> String {
        format!("'{}'!{}", self.worksheet.replace('\'', "''"), cells)
    }

    fn log_range(&self) -> String {
        self.range(&format!("A:{}", LAST_COLUMN))
    }

    /// Every column of the worksheet, including any past the log's own
    fn sheet_range(&self) -> String {
        format!("'{}'", self.worksheet.replace('\'', "''"))
    }

    async fn values_url(&self, range: &str, suffix: &str) -> AppResult<String> {
        let id = self.spreadsheet_id().await?;
        Ok(format!(
            "{}/{}/values/{}{}",
            SHEETS_API_URL,
            id,
            urlencoding::encode(range),
            suffix
        ))
    }

    async fn read_range(&self, range: &str) -> AppResult<Vec<Vec<Value>>> {
        let url = self.values_url(range, "").await?;
        let token = self.tokens.access_token().await?;
        let request = self.http_client.get(&url).bearer_auth(token).query(&[
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "SERIAL_NUMBER"),
        ]);

        let range: ValueRange = serde_json::from_value(send(request).await?)
            .map_err(|e| AppError::ExternalApi(format!("Invalid Sheets response: {}", e)))?;
        Ok(range.values)
    }

    async fn write_range(&self, range: &str, values: Vec<Vec<Value>>) -> AppResult<()> {
        let url = self.values_url(range, "").await?;
        let token = self.tokens.access_token().await?;
        let request = self
            .http_client
            .put(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": values,
            }));

        send(request).await?;
        Ok(())
    }
}

/// Sends a request and returns the JSON body, mapping non-2xx to `ExternalApi`
async fn send(request: RequestBuilder) -> AppResult<Value> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalApi(format!(
            "Google API returned status {}: {}",
            status, body
        )));
    }

    Ok(response.json().await?)
}

#[async_trait::async_trait]
impl EntryStore for GoogleSheetsStore {
    async fn list_entries(&self) -> AppResult<Vec<StoredEntry>> {
        let entries = self.read_rows().await?.entries();

        tracing::debug!(
            worksheet = %self.worksheet,
            rows = entries.len(),
            "Read spreadsheet rows"
        );

        Ok(entries)
    }

    async fn append_entry(&self, entry: &MediaEntry) -> AppResult<()> {
        let url = self.values_url(&self.log_range(), ":append").await?;
        let token = self.tokens.access_token().await?;
        let request = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [entry.to_row()] }));

        send(request).await?;

        tracing::info!(title = %entry.title, "Appended spreadsheet row");
        Ok(())
    }

    async fn update_entry(&self, row: usize, entry: &MediaEntry) -> AppResult<()> {
        if row < FIRST_DATA_ROW {
            return Err(AppError::InvalidInput(format!(
                "Row {} is not a data row",
                row
            )));
        }

        let range = self.range(&format!("A{row}:{col}{row}", row = row, col = LAST_COLUMN));
        self.write_range(&range, vec![entry.to_row()]).await?;

        tracing::info!(title = %entry.title, row, "Updated spreadsheet row");
        Ok(())
    }

    async fn read_rows(&self) -> AppResult<SheetRows> {
        let values = self.read_range(&self.sheet_range()).await?;
        Ok(SheetRows::from_values(values))
    }

    async fn write_rows(&self, sheet: &SheetRows) -> AppResult<()> {
        let url = self.values_url(&self.sheet_range(), ":clear").await?;
        let token = self.tokens.access_token().await?;
        send(self.http_client.post(&url).bearer_auth(token).json(&json!({}))).await?;

        self.write_range(&self.range("A1"), sheet.to_values()).await?;

        tracing::info!(rows = sheet.rows.len(), "Rewrote spreadsheet");
        Ok(())
    }

    async fn check_access(&self) -> AppResult<String> {
        let values = self.read_range(&self.range("A1")).await?;
        Ok(values
            .first()
            .and_then(|row| row.first())
            .map(|cell| match cell {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "google_sheets"
    }
}
