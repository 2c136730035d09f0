use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::coordinator::status::parse_job_id;
use crate::coordinator::{
    Announcement, AnnouncementOutcome, BulkStatusBody, BulkStatusSummary, DirectNotification,
    NotificationHistory, NotificationList, NotificationPreview, RecruiterNotifications,
    SendOutcome, SingleStatusResult, SingleStatusUpdate,
};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{run_blocking, Caller, SharedState};

pub async fn bulk_status<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
    Path(job_id): Path<String>,
    Json(body): Json<BulkStatusBody>,
) -> Result<Json<BulkStatusSummary>, ServiceError> {
    let job_id = parse_job_id(&job_id)?;
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || {
        coordinator.bulk_update(caller.id, job_id, body.into_updates(), Utc::now())
    })
    .await
    .map(Json)
}

pub async fn single_status<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
    Path(student_id): Path<String>,
    Json(update): Json<SingleStatusUpdate>,
) -> Result<Json<SingleStatusResult>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || {
        coordinator.update_single(caller.id, &student_id, update, Utc::now())
    })
    .await
    .map(Json)
}

pub async fn send_notification<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Json(request): Json<DirectNotification>,
) -> Result<Json<SendOutcome>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || {
        coordinator.send_direct(request, Utc::now())
    })
    .await
    .map(Json)
}

pub async fn preview_notification<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Json(request): Json<DirectNotification>,
) -> Result<Json<NotificationPreview>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || coordinator.preview(request))
        .await
        .map(Json)
}

pub async fn notification_history<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<NotificationHistory>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || coordinator.history())
        .await
        .map(Json)
}

pub async fn announce<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Json(announcement): Json<Announcement>,
) -> Result<Json<AnnouncementOutcome>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || {
        coordinator.announce(announcement, Utc::now())
    })
    .await
    .map(Json)
}

/// Lists the caller's notifications as stored, then schedules marking them read.
pub async fn student_notifications<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
) -> Result<Json<NotificationList>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    let list = run_blocking(state.deadlines.short, move || {
        coordinator.student_notifications(caller.id)
    })
    .await?;
    if list.notifications.iter().any(|notification| !notification.is_read) {
        // Detached; the response already carries the pre-update flags.
        drop(state.read_marker.schedule(caller.id));
    }
    Ok(Json(list))
}

pub async fn recruiter_notifications<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
) -> Result<Json<RecruiterNotifications>, ServiceError> {
    let coordinator = Arc::clone(&state.coordinator);
    run_blocking(state.deadlines.short, move || {
        coordinator.recruiter_notifications(caller.id)
    })
    .await
    .map(Json)
}
