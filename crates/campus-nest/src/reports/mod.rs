//! Report façade: one request shape dispatched to the placement, applications, or companies
//! generator, plus CSV rendering of any of them.

pub mod export;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::pipeline::{end_of_day, parse_day, rate, start_of_day};
use crate::analytics::placement::non_empty;
use crate::domain::{
    ApplicationId, ApplicationStatus, CompanyId, JobId, JobStatus, UserId,
};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, UserFilter};

pub use export::{render_csv, ExportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Placement,
    Applications,
    Companies,
}

impl ReportKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placement => "placement",
            Self::Applications => "applications",
            Self::Companies => "companies",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "placement" => Ok(Self::Placement),
            "applications" => Ok(Self::Applications),
            "companies" => Ok(Self::Companies),
            _ => Err(ServiceError::validation("Invalid report type")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ReportRequest {
    pub fn of(kind: ReportKind) -> Self {
        Self {
            report_type: kind.label().to_string(),
            ..Self::default()
        }
    }
}

/// Validated request. The date window exists only when both ends were supplied.
#[derive(Debug, Clone, PartialEq)]
struct ReportQuery {
    kind: ReportKind,
    department: Option<String>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl TryFrom<ReportRequest> for ReportQuery {
    type Error = ServiceError;

    fn try_from(request: ReportRequest) -> Result<Self, Self::Error> {
        let kind = ReportKind::parse(&request.report_type)?;
        let start = non_empty(request.start_date)
            .map(|raw| parse_day("startDate", &raw))
            .transpose()?;
        let end = non_empty(request.end_date)
            .map(|raw| parse_day("endDate", &raw))
            .transpose()?;
        let window = match (start, end) {
            (Some(start), Some(end)) => Some((start_of_day(start), end_of_day(end))),
            _ => None,
        };
        Ok(Self {
            kind,
            department: non_empty(request.department),
            window,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reportType", rename_all = "lowercase")]
pub enum Report {
    Placement(PlacementReport),
    Applications(ApplicationsReport),
    Companies(CompaniesReport),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Placement(_) => ReportKind::Placement,
            Report::Applications(_) => ReportKind::Applications,
            Report::Companies(_) => ReportKind::Companies,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedStudent {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub cgpa: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub department: Option<String>,
    pub total_students: u64,
    pub placed_students: u64,
    pub placement_rate: f64,
    pub placed_students_list: Vec<PlacedStudent>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRef {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveRef {
    pub id: JobId,
    pub position: String,
    pub company: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub student: ApplicantRef,
    pub job: DriveRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsReport {
    pub department: Option<String>,
    pub total_applications: usize,
    pub applications: Vec<ApplicationRow>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub id: CompanyId,
    pub name: String,
    pub industry: Option<String>,
    pub total_jobs: u64,
    pub active_jobs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompaniesReport {
    pub total_companies: usize,
    pub companies: Vec<CompanyRow>,
    pub generated_at: DateTime<Utc>,
}

/// Report generator over the entity store.
pub struct ReportService<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> ReportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn generate(
        &self,
        request: ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<Report, ServiceError> {
        let query = ReportQuery::try_from(request)?;
        debug!(report = query.kind.label(), "generating report");
        match query.kind {
            ReportKind::Placement => self.placement(query.department, now).map(Report::Placement),
            ReportKind::Applications => self
                .applications(query.department, query.window, now)
                .map(Report::Applications),
            ReportKind::Companies => self.companies(now).map(Report::Companies),
        }
    }

    /// A student counts as placed when any of their applications is `selected`.
    fn placement(
        &self,
        department: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PlacementReport, ServiceError> {
        let students = self
            .store
            .find_users(&UserFilter::students().department(department.clone()))?;
        let ids = students.iter().map(|student| student.id).collect();
        let selected = self.store.find_applications(
            &ApplicationFilter::all()
                .students(ids)
                .status(ApplicationStatus::Selected),
        )?;

        let placed_students_list: Vec<PlacedStudent> = students
            .iter()
            .filter(|student| {
                selected
                    .iter()
                    .any(|application| application.student_id == student.id)
            })
            .map(|student| PlacedStudent {
                name: student.full_name(),
                email: student.email.clone(),
                department: student.department.clone(),
                cgpa: student.cgpa,
            })
            .collect();

        let total_students = students.len() as u64;
        let placed_students = placed_students_list.len() as u64;
        Ok(PlacementReport {
            department,
            total_students,
            placed_students,
            placement_rate: rate(placed_students, total_students),
            placed_students_list,
            generated_at: now,
        })
    }

    /// Applications joined with student and job; rows missing either side are dropped.
    fn applications(
        &self,
        department: Option<String>,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationsReport, ServiceError> {
        let (from, until) = match window {
            Some((from, until)) => (Some(from), Some(until)),
            None => (None, None),
        };
        let applications = self
            .store
            .find_applications(&ApplicationFilter::all().applied_between(from, until))?;
        let students: HashMap<UserId, _> = self
            .store
            .find_users(&UserFilter::students().department(department.clone()))?
            .into_iter()
            .map(|student| (student.id, student))
            .collect();
        let jobs: HashMap<JobId, _> = self
            .store
            .find_jobs(&JobFilter::all())?
            .into_iter()
            .map(|job| (job.id, job))
            .collect();

        let rows: Vec<ApplicationRow> = applications
            .into_iter()
            .filter_map(|application| {
                let student = students.get(&application.student_id)?;
                let job = jobs.get(&application.job_id)?;
                Some(ApplicationRow {
                    id: application.id,
                    status: application.status,
                    applied_on: application.applied_on,
                    student: ApplicantRef {
                        id: student.id,
                        name: student.full_name(),
                        email: student.email.clone(),
                        department: student.department.clone(),
                    },
                    job: DriveRef {
                        id: job.id,
                        position: job.position.clone(),
                        company: job.company.name.clone(),
                    },
                })
            })
            .collect();

        Ok(ApplicationsReport {
            department,
            total_applications: rows.len(),
            applications: rows,
            generated_at: now,
        })
    }

    fn companies(&self, now: DateTime<Utc>) -> Result<CompaniesReport, ServiceError> {
        let companies = self.store.find_companies()?;
        let jobs = self.store.find_jobs(&JobFilter::all())?;
        let rows: Vec<CompanyRow> = companies
            .into_iter()
            .map(|company| {
                let owned = jobs
                    .iter()
                    .filter(|job| job.company_id() == Some(company.id));
                let (total_jobs, active_jobs) = owned.fold((0, 0), |(total, active), job| {
                    (total + 1, active + u64::from(job.status == JobStatus::Open))
                });
                CompanyRow {
                    id: company.id,
                    name: company.name,
                    industry: company.industry,
                    total_jobs,
                    active_jobs,
                }
            })
            .collect();
        Ok(CompaniesReport {
            total_companies: rows.len(),
            companies: rows,
            generated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::test_support::{
        add_company, add_job, add_user, apply, at, job, now, set_status, staff, store, student,
    };

    #[test]
    fn unknown_report_type_is_rejected() {
        let service = ReportService::new(store());
        let request = ReportRequest {
            report_type: "salary".to_string(),
            ..ReportRequest::default()
        };
        let err = service.generate(request, now()).expect_err("invalid type");
        assert_eq!(err.to_string(), "Invalid report type");
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let service = ReportService::new(store());
        let request = ReportRequest {
            start_date: Some("2025-13-01".to_string()),
            ..ReportRequest::of(ReportKind::Applications)
        };
        let err = service.generate(request, now()).expect_err("bad date");
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn empty_store_yields_empty_applications_report() {
        let service = ReportService::new(store());
        let request = ReportRequest {
            start_date: Some("2025-01-01".to_string()),
            end_date: Some("2025-01-31".to_string()),
            ..ReportRequest::of(ReportKind::Applications)
        };
        match service.generate(request, now()).expect("report") {
            Report::Applications(report) => {
                assert_eq!(report.total_applications, 0);
                assert!(report.applications.is_empty());
            }
            other => panic!("unexpected report: {:?}", other.kind()),
        }
    }

    #[test]
    fn applications_window_is_inclusive_and_needs_both_dates() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let drive = add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        let early = add_user(store.as_ref(), student("Asha", "CS", 8.0));
        let late = add_user(store.as_ref(), student("Bilal", "EE", 7.0));
        apply(store.as_ref(), drive.id, early.id, at(3));
        apply(store.as_ref(), drive.id, late.id, at(10));
        let service = ReportService::new(store);

        let bounded = ReportRequest {
            start_date: Some("2025-03-01".to_string()),
            end_date: Some("2025-03-03".to_string()),
            ..ReportRequest::of(ReportKind::Applications)
        };
        let Report::Applications(report) = service.generate(bounded, now()).expect("report")
        else {
            panic!("expected applications report");
        };
        assert_eq!(report.total_applications, 1);
        assert_eq!(report.applications[0].student.id, early.id);

        let open_ended = ReportRequest {
            start_date: Some("2025-03-05".to_string()),
            ..ReportRequest::of(ReportKind::Applications)
        };
        let Report::Applications(report) = service.generate(open_ended, now()).expect("report")
        else {
            panic!("expected applications report");
        };
        assert_eq!(report.total_applications, 2);

        let by_department = ReportRequest {
            department: Some("EE".to_string()),
            ..ReportRequest::of(ReportKind::Applications)
        };
        let Report::Applications(report) =
            service.generate(by_department, now()).expect("report")
        else {
            panic!("expected applications report");
        };
        assert_eq!(report.total_applications, 1);
        assert_eq!(report.applications[0].job.company, "Acme");
    }

    #[test]
    fn placement_report_counts_selected_students() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let drive = add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        let placed = add_user(store.as_ref(), student("Asha", "CS", 9.1));
        let waiting = add_user(store.as_ref(), student("Bilal", "CS", 7.4));
        add_user(store.as_ref(), staff(Role::Tpo, "Tara"));
        apply(store.as_ref(), drive.id, placed.id, at(2));
        apply(store.as_ref(), drive.id, waiting.id, at(2));
        set_status(store.as_ref(), drive.id, placed.id, ApplicationStatus::Selected);
        let service = ReportService::new(store);

        let Report::Placement(report) = service
            .generate(ReportRequest::of(ReportKind::Placement), now())
            .expect("report")
        else {
            panic!("expected placement report");
        };
        assert_eq!(report.total_students, 2);
        assert_eq!(report.placed_students, 1);
        assert_eq!(report.placement_rate, 50.0);
        assert_eq!(report.placed_students_list[0].email, placed.email);
    }

    #[test]
    fn companies_report_counts_open_jobs() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        add_company(store.as_ref(), "Initech");
        let mut closed = job(&acme, "QA", at(1));
        closed.status = JobStatus::Closed;
        add_job(store.as_ref(), closed);
        add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        let service = ReportService::new(store);

        let Report::Companies(report) = service
            .generate(ReportRequest::of(ReportKind::Companies), now())
            .expect("report")
        else {
            panic!("expected companies report");
        };
        assert_eq!(report.total_companies, 2);
        let acme_row = report
            .companies
            .iter()
            .find(|row| row.name == "Acme")
            .expect("acme row");
        assert_eq!((acme_row.total_jobs, acme_row.active_jobs), (2, 1));
    }
}
