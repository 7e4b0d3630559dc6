//! Google Sheets integration
//!
//! Appends message rows to one tab of one spreadsheet.

mod client;

pub use client::SheetsClient;

/// Sheets API request/response types
pub mod api {
    use serde::{Deserialize, Serialize};

    use crate::models::SheetRow;

    /// Body of a `values:append` request
    #[derive(Debug, Serialize)]
    pub struct ValueRange<'a> {
        pub values: Vec<[&'a str; SheetRow::COLUMNS]>,
    }

    /// Response from `values:append`
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AppendValuesResponse {
        pub table_range: Option<String>,
        pub updates: Option<UpdateValuesResponse>,
    }

    /// Summary of the cells written by an append
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateValuesResponse {
        pub updated_range: Option<String>,
        pub updated_rows: Option<u32>,
    }
}
