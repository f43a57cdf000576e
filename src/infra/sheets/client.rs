use anyhow::{Context, Result};
use async_trait::async_trait;

use fare_tracker::classify::RawRow;
use fare_tracker::fetch::{ApiKey, BasicClient, HttpClient, UrlParam, fetch_json};

use crate::services::sheet_source::{SheetRange, SheetSource};

/// Reads journey rows from the Google Sheets values API.
///
/// Public sheets are read with an API key in the `key` query parameter;
/// private sheets need an OAuth bearer token in the `Authorization` header.
pub struct GoogleSheetsClient<C> {
    base_url: String,
    http: C,
}

impl GoogleSheetsClient<UrlParam<BasicClient>> {
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            base_url: "https://sheets.googleapis.com".to_string(),
            http: UrlParam {
                inner: BasicClient::new(),
                param_name: "key".to_string(),
                key: api_key,
            },
        }
    }
}

impl GoogleSheetsClient<ApiKey<BasicClient>> {
    pub fn with_oauth_token(token: String) -> Self {
        Self {
            base_url: "https://sheets.googleapis.com".to_string(),
            http: ApiKey::bearer(BasicClient::new(), token),
        }
    }
}

#[async_trait]
impl<C: HttpClient> SheetSource for GoogleSheetsClient<C> {
    async fn fetch_rows(&self, range: &SheetRange) -> Result<Vec<RawRow>> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?majorDimension=ROWS",
            self.base_url, range.spreadsheet_id, range.range
        );

        let json = fetch_json(&self.http, &url)
            .await
            .with_context(|| format!("fetching sheet range {}", range.range))?;

        Ok(rows_from_values(&json))
    }
}

/// Extracts the `values` array of a Sheets values response into raw rows.
/// Non-string cells are stringified; a response with no `values` key (an
/// empty range) yields no rows.
fn rows_from_values(json: &serde_json::Value) -> Vec<RawRow> {
    let Some(rows) = json["values"].as_array() else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| RawRow {
            fields: row
                .as_array()
                .map(|cells| cells.iter().map(cell_to_string).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn cell_to_string(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_values_extracts_cells() {
        let body = json!({
            "range": "Journeys!A1:E2",
            "values": [
                ["Date", "Start Time", "End Time", "Journey/Action", "Charge"],
                ["14-Mar-2024", "08:00", "08:25", "Angel to Bank", 3.10],
            ]
        });

        let rows = rows_from_values(&body);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].fields[0], "14-Mar-2024");
        assert_eq!(rows[1].fields[4], "3.1");
    }

    #[test]
    fn test_empty_range_yields_no_rows() {
        let body = json!({ "range": "Journeys!A1:E1" });
        assert!(rows_from_values(&body).is_empty());
    }
}
