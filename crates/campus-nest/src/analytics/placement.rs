use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ApplicationStatus, JobId, PlacementStatus, User};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, UserFilter};

use super::pipeline::{count_by, end_of_day, parse_day, rate, start_of_day, TrendInterval};
use super::AnalyticsEngine;

const DEFAULT_DEPARTMENT_LIMIT: usize = 10;
const DEFAULT_RECENT_DRIVES: usize = 6;
const TREND_LOOKBACK_MONTHS: u32 = 11;

/// Raw query string as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStatsParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub department: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<usize>,
    pub drives: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementStatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub department: Option<String>,
    pub interval: TrendInterval,
    pub department_limit: usize,
    pub recent_drives: usize,
}

impl Default for PlacementStatsQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            department: None,
            interval: TrendInterval::Month,
            department_limit: DEFAULT_DEPARTMENT_LIMIT,
            recent_drives: DEFAULT_RECENT_DRIVES,
        }
    }
}

impl TryFrom<PlacementStatsParams> for PlacementStatsQuery {
    type Error = ServiceError;

    fn try_from(params: PlacementStatsParams) -> Result<Self, Self::Error> {
        let from = non_empty(params.from)
            .map(|raw| parse_day("from", &raw))
            .transpose()?;
        let to = non_empty(params.to)
            .map(|raw| parse_day("to", &raw))
            .transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ServiceError::validation("from must not be after to"));
            }
        }

        let interval = match non_empty(params.interval) {
            Some(raw) => TrendInterval::parse(&raw)?,
            None => TrendInterval::Month,
        };

        Ok(Self {
            from,
            to,
            department: non_empty(params.department),
            interval,
            department_limit: positive(params.limit, "limit")?.unwrap_or(DEFAULT_DEPARTMENT_LIMIT),
            recent_drives: positive(params.drives, "drives")?.unwrap_or(DEFAULT_RECENT_DRIVES),
        })
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

pub(crate) fn positive(value: Option<usize>, field: &str) -> Result<Option<usize>, ServiceError> {
    match value {
        Some(0) => Err(ServiceError::validation(format!(
            "{field} must be a positive number"
        ))),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStats {
    pub overview: PlacementOverview,
    pub trend: PlacementTrend,
    pub departments: Vec<DepartmentPlacement>,
    pub recent_drives: Vec<DriveActivity>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementOverview {
    pub total_students: u64,
    pub by_status: Vec<StatusCount>,
}

impl PlacementOverview {
    pub fn count(&self, status: PlacementStatus) -> u64 {
        self.by_status
            .iter()
            .find(|entry| entry.status == status.label())
            .map_or(0, |entry| entry.count)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementTrend {
    pub interval: TrendInterval,
    pub data: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub total: u64,
    pub placed: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentPlacement {
    pub department: String,
    pub total: u64,
    pub placed: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveActivity {
    pub job_id: JobId,
    pub title: String,
    pub company: String,
    pub posted_at: DateTime<Utc>,
    pub applicants: u64,
    pub shortlisted: u64,
    pub interviewed: u64,
    pub offers: u64,
}

pub(crate) fn department_label(user: &User) -> String {
    user.department
        .as_deref()
        .map(str::trim)
        .filter(|department| !department.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

impl<S: EntityStore> AnalyticsEngine<S> {
    pub fn placement_stats(
        &self,
        query: &PlacementStatsQuery,
        now: DateTime<Utc>,
    ) -> Result<PlacementStats, ServiceError> {
        let overview = self.placement_overview(query)?;
        let trend = self.placement_trend(query, now)?;
        let departments = self.department_placements(query.department_limit)?;
        let recent_drives = self.recent_drives(query.recent_drives)?;

        debug!(
            total_students = overview.total_students,
            periods = trend.data.len(),
            departments = departments.len(),
            "placement stats aggregated"
        );

        Ok(PlacementStats {
            overview,
            trend,
            departments,
            recent_drives,
        })
    }

    fn placement_overview(
        &self,
        query: &PlacementStatsQuery,
    ) -> Result<PlacementOverview, ServiceError> {
        let filter = UserFilter::students()
            .department(query.department.clone())
            .created_between(query.from.map(start_of_day), query.to.map(end_of_day));
        let students = self.store.find_users(&filter)?;
        let counts = count_by(&students, |student| student.placed_status);

        let by_status = PlacementStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status: status.label(),
                count: counts.get(&status).copied().unwrap_or(0),
            })
            .collect();

        Ok(PlacementOverview {
            total_students: students.len() as u64,
            by_status,
        })
    }

    fn placement_trend(
        &self,
        query: &PlacementStatsQuery,
        now: DateTime<Utc>,
    ) -> Result<PlacementTrend, ServiceError> {
        let from = match query.from {
            Some(date) => start_of_day(date),
            None => now
                .checked_sub_months(Months::new(TREND_LOOKBACK_MONTHS))
                .unwrap_or(now),
        };
        // `to` narrows the overview only; the trend always runs up to now.
        let filter = UserFilter::students()
            .department(query.department.clone())
            .created_between(Some(from), Some(now));
        let students = self.store.find_users(&filter)?;

        let mut periods: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for student in &students {
            let entry = periods
                .entry(query.interval.period_key(student.created_at))
                .or_insert((0, 0));
            entry.0 += 1;
            if student.placed_status == PlacementStatus::Placed {
                entry.1 += 1;
            }
        }

        let data = periods
            .into_iter()
            .map(|(period, (total, placed))| TrendPoint {
                period,
                total,
                placed,
                rate: rate(placed, total),
            })
            .collect();

        Ok(PlacementTrend {
            interval: query.interval,
            data,
        })
    }

    fn department_placements(&self, limit: usize) -> Result<Vec<DepartmentPlacement>, ServiceError> {
        let students = self.store.find_users(&UserFilter::students())?;

        let mut departments: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for student in &students {
            let entry = departments
                .entry(department_label(student))
                .or_insert((0, 0));
            entry.0 += 1;
            if student.placed_status == PlacementStatus::Placed {
                entry.1 += 1;
            }
        }

        let mut rows: Vec<DepartmentPlacement> = departments
            .into_iter()
            .map(|(department, (total, placed))| DepartmentPlacement {
                department,
                total,
                placed,
                rate: rate(placed, total),
            })
            .collect();
        rows.sort_by(|left, right| right.total.cmp(&left.total));
        rows.truncate(limit);
        Ok(rows)
    }

    pub(crate) fn recent_drives(&self, limit: usize) -> Result<Vec<DriveActivity>, ServiceError> {
        let mut jobs = self.store.find_jobs(&JobFilter::all())?;
        jobs.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        jobs.truncate(limit);
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let job_ids: Vec<JobId> = jobs.iter().map(|job| job.id).collect();
        let applications = self
            .store
            .find_applications(&ApplicationFilter::for_jobs(job_ids))?;
        let mut counts: HashMap<(JobId, ApplicationStatus), u64> = HashMap::new();
        for application in &applications {
            *counts
                .entry((application.job_id, application.status))
                .or_insert(0) += 1;
        }
        let count = |job: JobId, status: ApplicationStatus| {
            counts.get(&(job, status)).copied().unwrap_or(0)
        };

        Ok(jobs
            .into_iter()
            .map(|job| DriveActivity {
                job_id: job.id,
                applicants: count(job.id, ApplicationStatus::Applied),
                shortlisted: count(job.id, ApplicationStatus::Shortlisted),
                interviewed: count(job.id, ApplicationStatus::Interviewed),
                offers: count(job.id, ApplicationStatus::Selected),
                title: job.position,
                company: job.company.name,
                posted_at: job.created_at,
            })
            .collect())
    }
}
