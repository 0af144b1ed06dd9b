use std::sync::Arc;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error, info};

use super::ExportError;
use super::credentials::CredentialProvider;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Turns key/value records into a header row followed by one row per record.
///
/// Headers come from the first record's keys, in order. Keys missing from
/// later records produce blank cells; nested values are written as JSON text.
pub fn to_grid(records: &[Map<String, Value>]) -> Vec<Vec<Value>> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let headers: Vec<&String> = first.keys().collect();
    let mut grid = Vec::with_capacity(records.len() + 1);
    grid.push(headers.iter().map(|h| Value::String((*h).clone())).collect());

    for record in records {
        let row = headers
            .iter()
            .map(|h| match record.get(*h) {
                None | Some(Value::Null) => Value::String(String::new()),
                Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => v.clone(),
                Some(other) => Value::String(other.to_string()),
            })
            .collect();
        grid.push(row);
    }

    grid
}

pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id)
}

async fn ensure_success(response: Response) -> Result<Response, ExportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(ExportError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Creates a spreadsheet in Drive, fills it and shares it.
pub struct SheetsExporter {
    credentials: Arc<dyn CredentialProvider>,
    http: Client,
    folder_id: Option<String>,
}

impl SheetsExporter {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        http: Client,
        folder_id: Option<String>,
    ) -> Self {
        Self {
            credentials,
            http,
            folder_id,
        }
    }

    /// Returns the URL of the new spreadsheet.
    pub async fn export(
        &self,
        title: &str,
        records: &[Map<String, Value>],
        share_with: Option<&str>,
    ) -> Result<String, ExportError> {
        let token = self.credentials.access_token().await?;

        let spreadsheet_id = self.create_file(&token, title).await?;
        info!(%spreadsheet_id, title, "Spreadsheet created");

        let grid = to_grid(records);
        if !grid.is_empty() {
            self.append_rows(&token, &spreadsheet_id, grid).await?;
            debug!(%spreadsheet_id, rows = records.len(), "Report rows written");
        }

        if let Some(email) = share_with {
            if let Err(e) = self.share(&token, &spreadsheet_id, email).await {
                // the sheet already exists; the caller still gets its URL
                error!(error = %e, %spreadsheet_id, email, "Failed to share spreadsheet");
            }
        }

        Ok(spreadsheet_url(&spreadsheet_id))
    }

    async fn create_file(&self, token: &str, title: &str) -> Result<String, ExportError> {
        let mut metadata = json!({
            "name": title,
            "mimeType": SPREADSHEET_MIME_TYPE,
        });
        if let Some(folder) = &self.folder_id {
            metadata["parents"] = json!([folder]);
        }

        let response = self
            .http
            .post(DRIVE_FILES_URL)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await?;

        let file = ensure_success(response).await?.json::<CreatedFile>().await?;
        Ok(file.id)
    }

    async fn append_rows(
        &self,
        token: &str,
        spreadsheet_id: &str,
        grid: Vec<Vec<Value>>,
    ) -> Result<(), ExportError> {
        let url = format!("{}/{}/values/A1:append", SHEETS_URL, spreadsheet_id);
        let response = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&json!({ "values": grid }))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn share(&self, token: &str, spreadsheet_id: &str, email: &str) -> Result<(), ExportError> {
        let url = format!("{}/{}/permissions", DRIVE_FILES_URL, spreadsheet_id);
        let response = self
            .http
            .post(url)
            .query(&[("supportsAllDrives", "true"), ("sendNotificationEmail", "false")])
            .bearer_auth(token)
            .json(&json!({
                "type": "user",
                "role": "writer",
                "emailAddress": email,
            }))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn empty_report_writes_nothing() {
        assert!(to_grid(&[]).is_empty());
    }

    #[test]
    fn headers_follow_first_record_key_order() {
        let grid = to_grid(&records(json!([
            { "user_id": 1, "full_name": "Ana", "status": "Late", "delay_minutes": 10 },
            { "user_id": 2, "full_name": "Luis", "status": "Present", "delay_minutes": 0 }
        ])));

        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid[0],
            vec![json!("user_id"), json!("full_name"), json!("status"), json!("delay_minutes")]
        );
        assert_eq!(grid[1], vec![json!(1), json!("Ana"), json!("Late"), json!(10)]);
    }

    #[test]
    fn missing_and_nested_values_are_flattened() {
        let grid = to_grid(&records(json!([
            { "a": "x", "b": "y" },
            { "b": { "nested": true }, "extra": 5 },
            { "a": null, "b": [1, 2] }
        ])));

        assert_eq!(grid[2], vec![json!(""), json!("{\"nested\":true}")]);
        assert_eq!(grid[3], vec![json!(""), json!("[1,2]")]);
    }

    #[test]
    fn url_points_at_spreadsheet() {
        assert_eq!(
            spreadsheet_url("abc123"),
            "https://docs.google.com/spreadsheets/d/abc123"
        );
    }
}
