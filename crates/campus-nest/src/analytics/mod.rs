//! Aggregation engine. Each view is built from typed store queries followed by in-memory
//! grouping, rate derivation, and top-N selection.

pub mod company;
pub mod dashboard;
pub mod pipeline;
pub mod placement;
pub mod recruiter;
pub mod tpo;


use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::UserId;
use crate::error::ServiceError;
use crate::store::EntityStore;

pub use company::{CompanyAnalytics, CompanyAnalyticsParams, CompanyPlacements, DepartmentSalary};
pub use dashboard::{DashboardProducer, DashboardRegistry, DashboardView};
pub use pipeline::TrendInterval;
pub use placement::{PlacementStats, PlacementStatsParams, PlacementStatsQuery};
pub use recruiter::RecruiterStats;
pub use tpo::{MonthlyPlacements, TpoAnalytics};

/// Read-only analytics over an entity store.
pub struct AnalyticsEngine<S: EntityStore> {
    store: Arc<S>,
    dashboards: DashboardRegistry<S>,
}

impl<S: EntityStore> AnalyticsEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_registry(store, DashboardRegistry::standard())
    }

    pub fn with_registry(store: Arc<S>, dashboards: DashboardRegistry<S>) -> Self {
        Self { store, dashboards }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn dashboard(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        let caller = self
            .store
            .find_user(user_id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        self.dashboards.produce(self.store.as_ref(), &caller, now)
    }
}
