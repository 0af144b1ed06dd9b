use crate::auth::auth::AuthUser;
use crate::export::sheets::SheetsExporter;
use crate::report::source::ReportSource;
use crate::report::generate_daily_report;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    #[param(value_type = String, format = "date", example = "2025-07-31")]
    pub report_date: NaiveDate,
    /// Narrows the report to one cost center unless it is a privileged one
    #[param(example = "CC_X")]
    pub cost_center: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExportRequest {
    #[schema(example = "2025-07-31", value_type = String, format = "date")]
    pub report_date: NaiveDate,
    /// Rows as returned by the attendance report, or any flat objects
    #[schema(value_type = Vec<Object>)]
    pub report_data: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    #[schema(example = "Report exported successfully")]
    pub message: String,
    #[schema(example = "https://docs.google.com/spreadsheets/d/abc123")]
    pub sheet_url: String,
}

pub fn export_title(date: NaiveDate) -> String {
    format!("Attendance report - {}", date.format("%Y-%m-%d"))
}

/// Daily attendance report
#[utoipa::path(
    get,
    path = "/api/reports/attendance",
    params(ReportQuery),
    responses(
        (status = 200, description = "One row per employee", body = [crate::report::ReportRow]),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_report(
    _auth: AuthUser,
    source: web::Data<dyn ReportSource>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let rows = generate_daily_report(
        source.get_ref(),
        query.report_date,
        query.cost_center.as_deref(),
    )
        .await
        .map_err(|e| {
            error!(error = %e, date = %query.report_date, "Failed to generate attendance report");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Export report rows to a new Google spreadsheet shared with the caller
#[utoipa::path(
    post,
    path = "/api/reports/export-to-sheets",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Spreadsheet created", body = ExportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Export failed", body = Object, example = json!({
            "message": "Spreadsheet API error (status 403): insufficient permissions"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn export_to_sheets(
    auth: AuthUser,
    exporter: web::Data<SheetsExporter>,
    payload: web::Json<ExportRequest>,
) -> actix_web::Result<impl Responder> {
    let title = export_title(payload.report_date);
    info!(%title, rows = payload.report_data.len(), "Exporting report");

    let sheet_url = exporter
        .export(&title, &payload.report_data, Some(auth.email.as_str()))
        .await
        .map_err(|e| {
            error!(error = %e, %title, "Report export failed");
            e
        })?;

    Ok(HttpResponse::Ok().json(ExportResponse {
        message: "Report exported successfully".to_string(),
        sheet_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_session_token;
    use crate::config::test_config;
    use crate::model::attendance::AttendanceRecord;
    use crate::report::source::{AssignedShift, DirectoryEntry};
    use actix_web::{App, test};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSource {
        filters: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl ReportSource for RecordingSource {
        async fn list_employees(
            &self,
            cost_center: Option<&str>,
        ) -> Result<Vec<DirectoryEntry>, sqlx::Error> {
            self.filters.lock().unwrap().push(cost_center.map(String::from));
            Ok(Vec::new())
        }

        async fn assignments_for(&self, _: NaiveDate) -> Result<Vec<AssignedShift>, sqlx::Error> {
            Ok(Vec::new())
        }

        async fn attendance_for(&self, _: NaiveDate) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
            Ok(Vec::new())
        }
    }

    #[actix_web::test]
    async fn cost_center_reaches_the_source_verbatim() {
        let config = test_config();
        let (token, _) = generate_session_token(
            1,
            "ana@company.com".into(),
            None,
            &config.jwt_secret,
            600,
        )
        .unwrap();

        let recorder = Arc::new(RecordingSource::default());
        let source: Arc<dyn ReportSource> = recorder.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::from(source))
                .route("/api/reports/attendance", web::get().to(attendance_report)),
        )
        .await;

        for query in [
            "report_date=2025-07-31&cost_center=%20CC_X%20",
            "report_date=2025-07-31&cost_center=",
            "report_date=2025-07-31&cost_center=CC_X",
            "report_date=2025-07-31",
        ] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/reports/attendance?{query}"))
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "{query}");
        }

        assert_eq!(
            *recorder.filters.lock().unwrap(),
            vec![
                Some(" CC_X ".to_string()),
                Some(String::new()),
                Some("CC_X".to_string()),
                None,
            ]
        );
    }

    #[::core::prelude::v1::test]
    fn title_carries_iso_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert_eq!(export_title(date), "Attendance report - 2025-07-31");
    }

    #[::core::prelude::v1::test]
    fn export_request_keeps_row_key_order() {
        let req: ExportRequest = serde_json::from_value(serde_json::json!({
            "report_date": "2025-07-31",
            "report_data": [{ "z": 1, "a": 2 }]
        }))
        .unwrap();
        let keys: Vec<&String> = req.report_data[0].keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
