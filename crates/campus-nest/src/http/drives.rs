use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Company, CompanyId, JobId};
use crate::drives::{CompanyRename, DriveApplicant, DriveDetails, DriveDraft, DriveListing};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{path_id, run_blocking, Caller, SharedState};

const INVALID_DRIVE_ID: &str = "Invalid drive ID";

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeBody {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyBody {
    #[serde(alias = "resumeId")]
    pub resume_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameBody {
    pub name: String,
}

pub async fn companies<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<Vec<Company>>, ServiceError> {
    let drives = Arc::clone(&state.drives);
    run_blocking(state.deadlines.short, move || drives.companies())
        .await
        .map(Json)
}

pub async fn create_drive<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
    Json(draft): Json<DriveDraft>,
) -> Result<Response, ServiceError> {
    let drives = Arc::clone(&state.drives);
    let drive = run_blocking(state.deadlines.short, move || {
        drives.create_drive(caller.id, draft, Utc::now())
    })
    .await?;
    let payload = json!({
        "message": "Drive created successfully",
        "driveId": drive.id,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

pub async fn list_drives<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<Vec<DriveListing>>, ServiceError> {
    let drives = Arc::clone(&state.drives);
    run_blocking(state.deadlines.short, move || drives.list_drives())
        .await
        .map(Json)
}

pub async fn drive_details<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(drive_id): Path<String>,
) -> Result<Json<DriveDetails>, ServiceError> {
    let drive_id: JobId = path_id(&drive_id, INVALID_DRIVE_ID)?;
    let drives = Arc::clone(&state.drives);
    run_blocking(state.deadlines.short, move || drives.drive_details(drive_id))
        .await
        .map(Json)
}

pub async fn drive_applications<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(drive_id): Path<String>,
) -> Result<Json<Vec<DriveApplicant>>, ServiceError> {
    let drive_id: JobId = path_id(&drive_id, INVALID_DRIVE_ID)?;
    let drives = Arc::clone(&state.drives);
    run_blocking(state.deadlines.short, move || {
        drives.drive_applications(drive_id)
    })
    .await
    .map(Json)
}

pub async fn set_status<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(drive_id): Path<String>,
    Json(body): Json<StatusChangeBody>,
) -> Result<Response, ServiceError> {
    let drive_id: JobId = path_id(&drive_id, INVALID_DRIVE_ID)?;
    let drives = Arc::clone(&state.drives);
    let status = run_blocking(state.deadlines.short, move || {
        drives.set_status(drive_id, &body.status)
    })
    .await?;
    let payload = json!({
        "message": "Drive status updated successfully",
        "status": status.label(),
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub async fn apply<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
    Path(job_id): Path<String>,
    Json(body): Json<ApplyBody>,
) -> Result<Response, ServiceError> {
    let job_id: JobId = path_id(&job_id, "Invalid job ID")?;
    let drives = Arc::clone(&state.drives);
    let application = run_blocking(state.deadlines.short, move || {
        drives.apply(caller.id, job_id, &body.resume_id, Utc::now())
    })
    .await?;
    let payload = json!({
        "message": "Application submitted successfully",
        "application": application,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

pub async fn rename_company<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(company_id): Path<String>,
    Json(body): Json<RenameBody>,
) -> Result<Json<CompanyRename>, ServiceError> {
    let company_id: CompanyId = path_id(&company_id, "Invalid company ID")?;
    let drives = Arc::clone(&state.drives);
    run_blocking(state.deadlines.short, move || {
        drives.rename_company(company_id, &body.name)
    })
    .await
    .map(Json)
}
