//! Google Sheets API HTTP client
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use super::api::{AppendValuesResponse, ValueRange};
use crate::error::SyncError;
use crate::google::{self, ApiError, GoogleAuth};
use crate::models::SheetRow;
use crate::retry::RetryPolicy;
use crate::sync::RecordSink;

/// Sheets API client bound to one destination tab
pub struct SheetsClient {
    auth: Arc<GoogleAuth>,
    spreadsheet_id: String,
    sheet_name: String,
    retry: RetryPolicy,
}

impl SheetsClient {
    /// Sheets API base URL
    const BASE_URL: &'static str = "https://sheets.googleapis.com/v4/spreadsheets";

    /// Create a client appending to `sheet_name` in `spreadsheet_id`
    pub fn new(
        auth: Arc<GoogleAuth>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            auth,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            retry,
        }
    }

    /// A1 range covering the four destination columns
    pub fn range(&self) -> String {
        format!("{}!A:D", self.sheet_name)
    }

    /// Append rows after the last row of the tab in one request
    pub fn append_values(&self, rows: &[SheetRow]) -> Result<AppendValuesResponse> {
        let access_token = self
            .auth
            .get_access_token()
            .map_err(ApiError::Auth)?;

        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            Self::BASE_URL,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range()),
        );

        let body = ValueRange {
            values: rows.iter().map(SheetRow::values).collect(),
        };

        let mut response = ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(&body)
            .map_err(|e| ApiError::from_ureq("sheets.values.append", e))
            .context("Failed to send append values request")?;

        let appended: AppendValuesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse append values response")?;

        Ok(appended)
    }
}

impl RecordSink for SheetsClient {
    fn append_batch(&self, rows: &[SheetRow]) -> Result<(), SyncError> {
        if rows.is_empty() {
            return Ok(());
        }

        let appended = self
            .retry
            .run(|| self.append_values(rows), google::is_transient)
            .map_err(SyncError::SinkUnavailable)?;

        let updated_range = appended
            .updates
            .as_ref()
            .and_then(|u| u.updated_range.as_deref())
            .or(appended.table_range.as_deref())
            .unwrap_or("?");
        info!("Appended {} rows to {}", rows.len(), updated_range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleCredentials;

    fn client(sheet_name: &str) -> SheetsClient {
        let auth = GoogleAuth::new(
            GoogleCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            std::env::temp_dir().join("mailsheet-test-unused-tokens.json"),
        );
        SheetsClient::new(Arc::new(auth), "sheet-123", sheet_name, RetryPolicy::default())
    }

    #[test]
    fn test_range() {
        assert_eq!(client("Sheet1").range(), "Sheet1!A:D");
        assert_eq!(client("Mail Log").range(), "Mail Log!A:D");
    }

    #[test]
    fn test_empty_batch_is_noop() {
        // No request is made, so no token is needed
        assert!(client("Sheet1").append_batch(&[]).is_ok());
    }

    #[test]
    fn test_value_range_shape() {
        let row = SheetRow {
            sender: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            date: String::new(),
            body: "Body".to_string(),
        };
        let body = ValueRange {
            values: vec![row.values()],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "values": [["a@example.com", "Hi", "", "Body"]] })
        );
    }
}
