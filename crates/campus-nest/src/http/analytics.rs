use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;

use crate::analytics::{
    CompanyAnalytics, CompanyAnalyticsParams, CompanyPlacements, DashboardView, DepartmentSalary,
    MonthlyPlacements, PlacementStats, PlacementStatsParams, PlacementStatsQuery,
    RecruiterStats, TpoAnalytics,
};
use crate::domain::Role;
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{run_blocking, Caller, SharedState};

/// Role dashboard. The path role must be the caller's own.
pub async fn dashboard<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
    Path(role): Path<String>,
) -> Result<Json<DashboardView>, ServiceError> {
    let requested = Role::parse(&role)
        .ok_or_else(|| ServiceError::not_found(format!("Unknown dashboard: {role}")))?;
    caller.require(&[requested])?;
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.dashboard(caller.id, Utc::now())
    })
    .await
    .map(Json)
}

pub async fn placement_stats<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<PlacementStatsParams>,
) -> Result<Json<PlacementStats>, ServiceError> {
    let query = PlacementStatsQuery::try_from(params)?;
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.placement_stats(&query, Utc::now())
    })
    .await
    .map(Json)
}

pub async fn company_analytics<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Query(params): Query<CompanyAnalyticsParams>,
) -> Result<Json<CompanyAnalytics>, ServiceError> {
    let limit = params.limit()?;
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.company_analytics(limit)
    })
    .await
    .map(Json)
}

pub async fn company_placements<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<Vec<CompanyPlacements>>, ServiceError> {
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.company_wise_placements()
    })
    .await
    .map(Json)
}

pub async fn salary_by_department<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<Vec<DepartmentSalary>>, ServiceError> {
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.salary_by_department()
    })
    .await
    .map(Json)
}

pub async fn placement_trends<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<Vec<MonthlyPlacements>>, ServiceError> {
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || analytics.placement_trends())
        .await
        .map(Json)
}

pub async fn tpo_analytics<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<TpoAnalytics>, ServiceError> {
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || analytics.tpo_analytics())
        .await
        .map(Json)
}

pub async fn recruiter_stats<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    caller: Caller,
) -> Result<Json<RecruiterStats>, ServiceError> {
    let analytics = Arc::clone(&state.analytics);
    run_blocking(state.deadlines.standard, move || {
        analytics.recruiter_stats(caller.id, Utc::now())
    })
    .await
    .map(Json)
}
