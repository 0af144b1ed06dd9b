use crate::api::attendance::{AttendanceAction, AttendanceOutcome, AttendanceRange};
use crate::api::biometric::{
    FaceCheck, FaceCheckResponse, FaceEnrollment, FingerprintAttendance, FingerprintEnrollment,
    FingerprintTemplate,
};
use crate::api::department::CreateDepartment;
use crate::api::employee::{CreateEmployee, UserWithDepartment};
use crate::api::leave_request::{CreateEvent, EventFilter, UpdateEventStatus};
use crate::api::report::{ExportRequest, ExportResponse};
use crate::api::role::CreateRole;
use crate::api::shift::{CreateAssignment, CreateShiftType};
use crate::model::attendance::AttendanceRecord;
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::leave_request::AdditionalEvent;
use crate::model::role::Role;
use crate::model::shift::{ShiftAssignment, ShiftType};
use crate::models::{SessionReq, SessionResponse};
use crate::report::{AttendanceStatus, ReportRow};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Time Clock API",
        version = "1.0.0",
        description = r#"
## Time clock and attendance

Backend for the attendance kiosks and the HR back office.

### 🔹 Key Features
- **Check-in / check-out** from the app, by fingerprint or by face
- **Shift management**: shift types and daily assignments
- **Events**: vacation and permission requests with HR approval
- **Daily report** reconciling assigned shifts with actual attendance
- **Export** of any report to Google Sheets

### 🔐 Security
Clients sign in with Firebase and exchange the ID token at `/auth/session`
for a **Bearer** session token used on every `/api` endpoint.
Roles listed in `ADMIN_ROLES` can manage other employees' data.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::create_session,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::today_attendance,

        crate::api::shift::create_shift_type,
        crate::api::shift::list_shift_types,
        crate::api::shift::create_assignment,
        crate::api::shift::employee_assignments,

        crate::api::leave_request::create_event,
        crate::api::leave_request::my_events,
        crate::api::leave_request::update_event_status,
        crate::api::leave_request::list_events,

        crate::api::role::create_role,
        crate::api::role::list_roles,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_users,
        crate::api::employee::list_users_with_department,
        crate::api::department::list_departments,
        crate::api::department::create_department,

        crate::api::report::attendance_report,
        crate::api::report::export_to_sheets,

        crate::api::biometric::enroll_fingerprint,
        crate::api::biometric::fingerprint_template,
        crate::api::biometric::fingerprint_attendance,
        crate::api::biometric::enroll_face,
        crate::api::biometric::face_check
    ),
    components(
        schemas(
            SessionReq,
            SessionResponse,
            AttendanceRecord,
            AttendanceAction,
            AttendanceOutcome,
            AttendanceRange,
            ShiftType,
            ShiftAssignment,
            CreateShiftType,
            CreateAssignment,
            AdditionalEvent,
            CreateEvent,
            UpdateEventStatus,
            EventFilter,
            Role,
            CreateRole,
            Employee,
            CreateEmployee,
            UserWithDepartment,
            Department,
            CreateDepartment,
            ReportRow,
            AttendanceStatus,
            ExportRequest,
            ExportResponse,
            FingerprintEnrollment,
            FingerprintTemplate,
            FingerprintAttendance,
            FaceEnrollment,
            FaceCheck,
            FaceCheckResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Session exchange"),
        (name = "Attendance", description = "Check-in and check-out"),
        (name = "Management", description = "Shifts, assignments and events"),
        (name = "Admin", description = "Roles, employees and departments"),
        (name = "Reports", description = "Daily attendance report and export"),
        (name = "Biometrics", description = "Fingerprint and face flows"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_report_path_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/reports/attendance"));
        assert!(doc.paths.paths.contains_key("/auth/session"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
