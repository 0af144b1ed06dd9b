use crate::{
    api::{attendance, biometric, department, employee, leave_request, report, role, shift},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let auth_limiter = Arc::new(build_limiter(config.rate_auth_per_min));
    let kiosk_limiter = Arc::new(build_limiter(config.rate_kiosk_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes, authenticated by the Firebase token in the body
    cfg.service(
        web::scope("/auth")
            .wrap(auth_limiter.clone())
            .service(web::resource("/session").route(web::post().to(handlers::create_session)))
            .service(
                web::resource("/enroll-face").route(web::post().to(biometric::enroll_face)),
            ),
    );

    cfg.service(
        web::scope("/fingerprint")
            .wrap(kiosk_limiter.clone())
            .service(
                web::resource("/enroll").route(web::post().to(biometric::enroll_fingerprint)),
            ),
    );

    cfg.service(
        web::scope("/vision")
            .wrap(kiosk_limiter.clone())
            .service(web::resource("/face-check").route(web::post().to(biometric::face_check))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::put().to(attendance::check_out)),
                    )
                    .service(web::resource("/mine").route(web::get().to(attendance::my_attendance)))
                    .service(
                        web::resource("/today").route(web::get().to(attendance::today_attendance)),
                    ),
            )
            .service(
                web::scope("/management")
                    // /management/shifts
                    .service(
                        web::resource("/shifts")
                            .route(web::post().to(shift::create_shift_type))
                            .route(web::get().to(shift::list_shift_types)),
                    )
                    .service(
                        web::resource("/assignments").route(web::post().to(shift::create_assignment)),
                    )
                    // /management/assignments/employee/{id}
                    .service(
                        web::resource("/assignments/employee/{employee_id}")
                            .route(web::get().to(shift::employee_assignments)),
                    )
                    // /management/events
                    .service(
                        web::resource("/events")
                            .route(web::post().to(leave_request::create_event))
                            .route(web::get().to(leave_request::list_events)),
                    )
                    .service(
                        web::resource("/events/mine").route(web::get().to(leave_request::my_events)),
                    )
                    // /management/events/{id}/status
                    .service(
                        web::resource("/events/{event_id}/status")
                            .route(web::put().to(leave_request::update_event_status)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/roles")
                            .route(web::post().to(role::create_role))
                            .route(web::get().to(role::list_roles)),
                    )
                    .service(
                        web::resource("/employees").route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/employees/{employee_id}")
                            .route(web::get().to(employee::get_employee)),
                    ),
            )
            .service(
                web::resource("/departments")
                    .route(web::get().to(department::list_departments))
                    .route(web::post().to(department::create_department)),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(employee::list_users)))
                    .service(
                        web::resource("/with-dept")
                            .route(web::get().to(employee::list_users_with_department)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/attendance").route(web::get().to(report::attendance_report)),
                    )
                    .service(
                        web::resource("/export-to-sheets")
                            .route(web::post().to(report::export_to_sheets)),
                    ),
            )
            .service(
                web::scope("/fingerprint")
                    .service(
                        web::resource("/template/{employee_number}")
                            .route(web::get().to(biometric::fingerprint_template)),
                    )
                    .service(
                        web::resource("/record-attendance")
                            .route(web::post().to(biometric::fingerprint_attendance)),
                    ),
            ),
    );
}

// KIOSK / APP
//  └─ Firebase ID token
//       └─ POST /auth/session
//            └─ session token (8 h)

// API REQUEST
//  └─ Authorization: Bearer session token
