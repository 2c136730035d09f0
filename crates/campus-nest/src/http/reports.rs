use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::reports::{render_csv, Report, ReportRequest};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{run_blocking, SharedState};

/// Query string of the export endpoint; `type` selects the report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    #[serde(rename = "type", default)]
    pub report_type: String,
    pub department: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<ExportParams> for ReportRequest {
    fn from(params: ExportParams) -> Self {
        Self {
            report_type: params.report_type,
            department: params.department,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

pub async fn generate<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<Report>, ServiceError> {
    let reports = Arc::clone(&state.reports);
    run_blocking(state.deadlines.long, move || {
        reports.generate(request, Utc::now())
    })
    .await
    .map(Json)
}

/// Same reports as [`generate`], rendered as a CSV attachment.
pub async fn export<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ServiceError> {
    let reports = Arc::clone(&state.reports);
    let (label, body) = run_blocking(state.deadlines.long, move || {
        let report = reports.generate(params.into(), Utc::now())?;
        let body = render_csv(&report)?;
        Ok((report.kind().label(), body))
    })
    .await?;

    let disposition = format!("attachment; filename=\"{label}-report.csv\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
