//! Export of report data to Google Sheets.

pub mod credentials;
pub mod sheets;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, From};
use serde_json::json;

#[derive(Debug, Display, From)]
pub enum ExportError {
    #[display(fmt = "Spreadsheet request failed: {}", _0)]
    Http(reqwest::Error),

    #[display(fmt = "Spreadsheet API error (status {}): {}", status, message)]
    #[from(ignore)]
    Api { status: u16, message: String },

    #[display(fmt = "Could not obtain spreadsheet credentials: {}", _0)]
    #[from(ignore)]
    Token(String),
}

impl std::error::Error for ExportError {}

impl ResponseError for ExportError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
