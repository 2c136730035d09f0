//! HTTP surface. Routes live under `/api/v1`, grouped by the role allowed to call them.

pub mod analytics;
pub mod caller;
pub mod coordination;
pub mod deadline;
pub mod drives;
pub mod reports;

use std::str::FromStr;
use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::sync::watch;

use crate::analytics::AnalyticsEngine;
use crate::config::DeadlineConfig;
use crate::coordinator::{Coordinator, ReadMarker};
use crate::domain::Role;
use crate::drives::DriveService;
use crate::error::ServiceError;
use crate::reports::ReportService;
use crate::store::EntityStore;

pub use caller::{Caller, CallerRejection, USER_ID_HEADER, USER_ROLE_HEADER};
pub use deadline::run_blocking;

const STUDENTS: &[Role] = &[Role::Student];
const TPOS: &[Role] = &[Role::Tpo];
const RECRUITERS: &[Role] = &[Role::Rec];
const ADMINS: &[Role] = &[Role::Admin];

/// Services shared by every handler.
pub struct ApiState<S: EntityStore> {
    pub analytics: Arc<AnalyticsEngine<S>>,
    pub coordinator: Arc<Coordinator<S>>,
    pub reports: Arc<ReportService<S>>,
    pub drives: Arc<DriveService<S>>,
    pub read_marker: ReadMarker<S>,
    pub deadlines: DeadlineConfig,
}

impl<S: EntityStore + 'static> ApiState<S> {
    pub fn new(store: Arc<S>, deadlines: DeadlineConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            analytics: Arc::new(AnalyticsEngine::new(Arc::clone(&store))),
            coordinator: Arc::new(Coordinator::new(Arc::clone(&store))),
            reports: Arc::new(ReportService::new(Arc::clone(&store))),
            drives: Arc::new(DriveService::new(Arc::clone(&store))),
            read_marker: ReadMarker::new(store, deadlines.background, shutdown),
            deadlines,
        }
    }
}

pub type SharedState<S> = Arc<ApiState<S>>;

pub(crate) fn path_id<T: FromStr>(raw: &str, message: &'static str) -> Result<T, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::validation(message))
}

/// Router builder exposing every role-scoped endpoint.
pub fn api_router<S>(state: SharedState<S>) -> Router
where
    S: EntityStore + 'static,
{
    let student = Router::new()
        .route(
            "/student/notifications",
            get(coordination::student_notifications::<S>),
        )
        .route("/student/jobs/:job_id/apply", post(drives::apply::<S>))
        .route_layer(from_fn_with_state(STUDENTS, caller::require_roles));

    let tpo = Router::new()
        .route("/tpo/analytics", get(analytics::tpo_analytics::<S>))
        .route(
            "/tpo/analytics/placements",
            get(analytics::placement_stats::<S>),
        )
        .route(
            "/tpo/analytics/company-placements",
            get(analytics::company_placements::<S>),
        )
        .route("/tpo/analytics/trends", get(analytics::placement_trends::<S>))
        .route(
            "/tpo/analytics/salary",
            get(analytics::salary_by_department::<S>),
        )
        .route("/tpo/companies", get(drives::companies::<S>))
        .route(
            "/tpo/drives",
            get(drives::list_drives::<S>).post(drives::create_drive::<S>),
        )
        .route("/tpo/drives/:drive_id", get(drives::drive_details::<S>))
        .route(
            "/tpo/drives/:drive_id/applications",
            get(drives::drive_applications::<S>),
        )
        .route("/tpo/drives/:drive_id/status", put(drives::set_status::<S>))
        .route("/tpo/reports", post(reports::generate::<S>))
        .route("/tpo/reports/export", get(reports::export::<S>))
        .route(
            "/tpo/notifications",
            get(coordination::notification_history::<S>)
                .post(coordination::send_notification::<S>),
        )
        .route(
            "/tpo/notifications/preview",
            post(coordination::preview_notification::<S>),
        )
        .route_layer(from_fn_with_state(TPOS, caller::require_roles));

    let recruiter = Router::new()
        .route(
            "/rec/job-drives/:job_id/students/status",
            put(coordination::bulk_status::<S>),
        )
        .route(
            "/rec/students/:student_id/status",
            put(coordination::single_status::<S>),
        )
        .route(
            "/rec/notifications",
            get(coordination::recruiter_notifications::<S>),
        )
        .route("/rec/stats", get(analytics::recruiter_stats::<S>))
        .route_layer(from_fn_with_state(RECRUITERS, caller::require_roles));

    let admin = Router::new()
        .route("/admin/announcements", post(coordination::announce::<S>))
        .route(
            "/admin/analytics/placements",
            get(analytics::placement_stats::<S>),
        )
        .route(
            "/admin/analytics/companies",
            get(analytics::company_analytics::<S>),
        )
        .route(
            "/admin/drives",
            get(drives::list_drives::<S>).post(drives::create_drive::<S>),
        )
        .route("/admin/drives/:drive_id", get(drives::drive_details::<S>))
        .route(
            "/admin/drives/:drive_id/applications",
            get(drives::drive_applications::<S>),
        )
        .route("/admin/reports", post(reports::generate::<S>))
        .route("/admin/reports/export", get(reports::export::<S>))
        .route("/admin/companies", get(drives::companies::<S>))
        .route(
            "/admin/companies/:company_id",
            put(drives::rename_company::<S>),
        )
        .route_layer(from_fn_with_state(ADMINS, caller::require_roles));

    let shared = Router::new().route("/dashboard/:role", get(analytics::dashboard::<S>));

    Router::new()
        .nest(
            "/api/v1",
            student
                .merge(tpo)
                .merge(recruiter)
                .merge(admin)
                .merge(shared),
        )
        .with_state(state)
}
