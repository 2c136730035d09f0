//! Role dashboards. Each role has one producer, looked up through a registry keyed by role.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    ApplicationStatus, Company, CompanyId, Job, JobId, JobStatus, PlacementStatus, Role, User,
    UserId,
};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, ResumeFilter, UserFilter};

use super::pipeline::{count_by, index_by, rate, round_to};

pub const NO_COMPANY_MESSAGE: &str =
    "No company associated. Please contact admin to associate your account with a company.";
pub const COMPANY_NOT_FOUND_MESSAGE: &str = "Company details not found. Please contact admin.";
const COMPANY_NOT_FOUND_NAME: &str = "Company Not Found";

const STUDENT_DEADLINES: usize = 3;
const STUDENT_RECOMMENDATIONS: usize = 3;
const TPO_RECENT_ACTIVITIES: usize = 5;
const RECRUITER_RECENT_DRIVES: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardView {
    Admin(AdminDashboard),
    Tpo(TpoDashboard),
    Rec(RecruiterDashboard),
    Student(StudentDashboard),
}

/// Builds the dashboard for one role.
pub trait DashboardProducer<S: EntityStore>: Send + Sync {
    fn role(&self) -> Role;
    fn produce(
        &self,
        store: &S,
        caller: &User,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError>;
}

pub struct DashboardRegistry<S: EntityStore> {
    producers: HashMap<Role, Box<dyn DashboardProducer<S>>>,
}

impl<S: EntityStore> DashboardRegistry<S> {
    pub fn empty() -> Self {
        Self {
            producers: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(AdminDashboardProducer));
        registry.register(Box::new(TpoDashboardProducer));
        registry.register(Box::new(RecruiterDashboardProducer));
        registry.register(Box::new(StudentDashboardProducer));
        registry
    }

    pub fn register(&mut self, producer: Box<dyn DashboardProducer<S>>) {
        self.producers.insert(producer.role(), producer);
    }

    pub fn produce(
        &self,
        store: &S,
        caller: &User,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        let producer = self.producers.get(&caller.role).ok_or_else(|| {
            ServiceError::Forbidden(format!(
                "no dashboard available for role '{}'",
                caller.role.label()
            ))
        })?;
        debug!(role = caller.role.label(), "producing dashboard");
        producer.produce(store, caller, now)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl Identity {
    fn of(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_students: u64,
    pub placed_students: u64,
    pub total_companies: u64,
    pub total_jobs: u64,
    pub active_jobs: u64,
    pub total_applications: u64,
    pub admin: Identity,
}

pub struct AdminDashboardProducer;

impl<S: EntityStore> DashboardProducer<S> for AdminDashboardProducer {
    fn role(&self) -> Role {
        Role::Admin
    }

    fn produce(
        &self,
        store: &S,
        caller: &User,
        _now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        Ok(DashboardView::Admin(AdminDashboard {
            total_students: store.count_users(&UserFilter::students())?,
            placed_students: store
                .count_users(&UserFilter::students().placed_status(PlacementStatus::Placed))?,
            total_companies: store.count_companies()?,
            total_jobs: store.count_jobs(&JobFilter::all())?,
            active_jobs: store.count_jobs(&JobFilter::all().status(JobStatus::Open))?,
            total_applications: store.count_applications(&ApplicationFilter::all())?,
            admin: Identity::of(caller),
        }))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpoOverview {
    pub total_students: u64,
    pub active_drives: u64,
    pub companies_onboarded: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpoApplicationStats {
    pub total_applications: u64,
    pub shortlisted_students: u64,
    pub offers_released: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentOfferRate {
    pub department: String,
    pub total_students: u64,
    pub placed_students: u64,
    pub placement_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub student_name: String,
    pub company_name: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpoDashboard {
    pub overview: TpoOverview,
    pub application_stats: TpoApplicationStats,
    pub placement_rate_by_department: Vec<DepartmentOfferRate>,
    pub recent_activities: Vec<RecentActivity>,
}

pub struct TpoDashboardProducer;

impl TpoDashboardProducer {
    /// Students count as placed here when they hold at least one selected application.
    fn department_rates<S: EntityStore>(
        store: &S,
    ) -> Result<Vec<DepartmentOfferRate>, ServiceError> {
        let students = store.find_users(&UserFilter::students())?;
        let with_offer: HashSet<UserId> = store
            .find_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?
            .into_iter()
            .map(|application| application.student_id)
            .collect();

        let mut departments: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for student in &students {
            let Some(department) = student
                .department
                .as_deref()
                .filter(|department| !department.trim().is_empty())
            else {
                continue;
            };
            let entry = departments.entry(department.to_string()).or_insert((0, 0));
            entry.0 += 1;
            if with_offer.contains(&student.id) {
                entry.1 += 1;
            }
        }

        let mut rows: Vec<DepartmentOfferRate> = departments
            .into_iter()
            .map(|(department, (total, placed))| DepartmentOfferRate {
                department,
                total_students: total,
                placed_students: placed,
                placement_rate: round_to(rate(placed, total), 1),
            })
            .collect();
        rows.sort_by(|left, right| right.placement_rate.total_cmp(&left.placement_rate));
        Ok(rows)
    }

    fn recent_activities<S: EntityStore>(store: &S) -> Result<Vec<RecentActivity>, ServiceError> {
        let mut applications = store.find_applications(&ApplicationFilter::all())?;
        applications.sort_by(|left, right| right.applied_on.cmp(&left.applied_on));

        let student_ids: Vec<UserId> = applications.iter().map(|a| a.student_id).collect();
        let job_ids: Vec<JobId> = applications.iter().map(|a| a.job_id).collect();
        let students = store.find_users(&UserFilter::default().ids(student_ids))?;
        let jobs = store.find_jobs(&JobFilter::all().ids(job_ids))?;
        let students = index_by(&students, |student| student.id);
        let jobs = index_by(&jobs, |job| job.id);

        Ok(applications
            .iter()
            .filter_map(|application| {
                let student = students.get(&application.student_id)?;
                let job = jobs.get(&application.job_id)?;
                Some(RecentActivity {
                    student_name: student.full_name(),
                    company_name: job.company.name.clone(),
                    position: job.position.clone(),
                    status: application.status,
                    applied_on: application.applied_on,
                })
            })
            .take(TPO_RECENT_ACTIVITIES)
            .collect())
    }
}

impl<S: EntityStore> DashboardProducer<S> for TpoDashboardProducer {
    fn role(&self) -> Role {
        Role::Tpo
    }

    fn produce(
        &self,
        store: &S,
        _caller: &User,
        _now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        let overview = TpoOverview {
            total_students: store.count_users(&UserFilter::students())?,
            active_drives: store.count_jobs(&JobFilter::all().status(JobStatus::Open))?,
            companies_onboarded: store.count_companies()?,
        };
        let application_stats = TpoApplicationStats {
            total_applications: store.count_applications(&ApplicationFilter::all())?,
            shortlisted_students: store.count_applications(
                &ApplicationFilter::all().status(ApplicationStatus::Shortlisted),
            )?,
            offers_released: store
                .count_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?,
        };

        Ok(DashboardView::Tpo(TpoDashboard {
            overview,
            application_stats,
            placement_rate_by_department: Self::department_rates(store)?,
            recent_activities: Self::recent_activities(store)?,
        }))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySnapshot {
    pub id: CompanyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl From<Company> for CompanySnapshot {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            industry: company.industry,
            website: company.website,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterOverview {
    pub total_job_drives: u64,
    pub active_job_drives: u64,
    pub total_applications: u64,
    pub total_shortlisted: u64,
    pub total_rejected: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterDrive {
    pub job_id: JobId,
    pub position: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub application_deadline: DateTime<Utc>,
    pub total_applications: u64,
    pub shortlisted: u64,
    pub rejected: u64,
    pub selected: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterDashboard {
    pub recruiter_name: String,
    pub company: Option<CompanySnapshot>,
    pub overview: RecruiterOverview,
    pub recent_job_drives: Vec<RecruiterDrive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecruiterDashboard {
    fn degraded(caller: &User, company: Option<CompanySnapshot>, message: &str) -> Self {
        Self {
            recruiter_name: caller.full_name(),
            company,
            overview: RecruiterOverview::default(),
            recent_job_drives: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

pub struct RecruiterDashboardProducer;

impl<S: EntityStore> DashboardProducer<S> for RecruiterDashboardProducer {
    fn role(&self) -> Role {
        Role::Rec
    }

    fn produce(
        &self,
        store: &S,
        caller: &User,
        _now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        let Some(company_id) = caller.company_id else {
            return Ok(DashboardView::Rec(RecruiterDashboard::degraded(
                caller,
                None,
                NO_COMPANY_MESSAGE,
            )));
        };
        let Some(company) = store.find_company(company_id)? else {
            let placeholder = CompanySnapshot {
                id: company_id,
                name: COMPANY_NOT_FOUND_NAME.to_string(),
                industry: None,
                website: None,
            };
            return Ok(DashboardView::Rec(RecruiterDashboard::degraded(
                caller,
                Some(placeholder),
                COMPANY_NOT_FOUND_MESSAGE,
            )));
        };

        let mut jobs = store.find_jobs(&JobFilter::for_company(company_id))?;
        let job_ids: Vec<JobId> = jobs.iter().map(|job| job.id).collect();
        let applications = store.find_applications(&ApplicationFilter::for_jobs(job_ids))?;
        let by_status = count_by(&applications, |application| application.status);
        let status_total =
            |status: ApplicationStatus| by_status.get(&status).copied().unwrap_or(0);

        let overview = RecruiterOverview {
            total_job_drives: jobs.len() as u64,
            active_job_drives: jobs
                .iter()
                .filter(|job| job.status == JobStatus::Open)
                .count() as u64,
            total_applications: applications.len() as u64,
            total_shortlisted: status_total(ApplicationStatus::Shortlisted),
            total_rejected: status_total(ApplicationStatus::Rejected),
        };

        let per_job = count_by(&applications, |application| {
            (application.job_id, application.status)
        });
        let job_count = |job: JobId, status: ApplicationStatus| {
            per_job.get(&(job, status)).copied().unwrap_or(0)
        };
        let totals = count_by(&applications, |application| application.job_id);

        jobs.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        let recent_job_drives = jobs
            .into_iter()
            .take(RECRUITER_RECENT_DRIVES)
            .map(|job| RecruiterDrive {
                job_id: job.id,
                total_applications: totals.get(&job.id).copied().unwrap_or(0),
                shortlisted: job_count(job.id, ApplicationStatus::Shortlisted),
                rejected: job_count(job.id, ApplicationStatus::Rejected),
                selected: job_count(job.id, ApplicationStatus::Selected),
                position: job.position,
                status: job.status,
                created_at: job.created_at,
                application_deadline: job.application_deadline,
            })
            .collect();

        Ok(DashboardView::Rec(RecruiterDashboard {
            recruiter_name: caller.full_name(),
            company: Some(company.into()),
            overview,
            recent_job_drives,
            message: None,
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub applied: u64,
    pub shortlisted: u64,
    pub offered: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSummary {
    pub job_id: JobId,
    pub position: String,
    pub company: String,
    pub location: String,
    pub application_deadline: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
}

impl From<Job> for DriveSummary {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            position: job.position,
            company: job.company.name,
            location: job.location,
            application_deadline: job.application_deadline,
            salary_range: job.salary_range,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub user_name: String,
    pub summary: StudentSummary,
    pub deadlines: Vec<DriveSummary>,
    pub recommendations: Vec<DriveSummary>,
}

pub struct StudentDashboardProducer;

impl StudentDashboardProducer {
    /// Active resume skills first, then profile skills not already listed.
    fn known_skills<S: EntityStore>(store: &S, student: &User) -> Result<Vec<String>, ServiceError> {
        let mut skills: Vec<String> = match student.active_resume() {
            Some(resume_id) => store
                .find_resumes(&ResumeFilter::ids(vec![resume_id]))?
                .into_iter()
                .next()
                .map(|resume| resume.parsed_skills().to_vec())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let mut seen: BTreeSet<String> = skills.iter().map(|s| s.to_ascii_lowercase()).collect();
        for skill in &student.skills {
            if seen.insert(skill.to_ascii_lowercase()) {
                skills.push(skill.clone());
            }
        }
        Ok(skills)
    }

    fn is_recommended(job: &Job, student: &User, skills: &[String]) -> bool {
        let course_ok = student
            .department
            .as_deref()
            .map_or(true, |department| job.eligibility.allows_course(department));
        let skills_ok = skills.is_empty()
            || skills
                .iter()
                .any(|skill| job.eligibility.requires_skill(skill));
        let cgpa_ok = student
            .cgpa
            .map_or(true, |cgpa| job.eligibility.min_cgpa <= cgpa);
        course_ok && skills_ok && cgpa_ok
    }
}

impl<S: EntityStore> DashboardProducer<S> for StudentDashboardProducer {
    fn role(&self) -> Role {
        Role::Student
    }

    fn produce(
        &self,
        store: &S,
        caller: &User,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, ServiceError> {
        let applications = store.find_applications(&ApplicationFilter::for_student(caller.id))?;
        let by_status = count_by(&applications, |application| application.status);
        let summary = StudentSummary {
            applied: applications.len() as u64,
            shortlisted: by_status
                .get(&ApplicationStatus::Shortlisted)
                .copied()
                .unwrap_or(0),
            offered: by_status
                .get(&ApplicationStatus::Selected)
                .copied()
                .unwrap_or(0),
        };

        let mut upcoming = store.find_jobs(
            &JobFilter::all()
                .status(JobStatus::Open)
                .deadline_after(now),
        )?;
        upcoming.sort_by(|left, right| {
            left.application_deadline
                .cmp(&right.application_deadline)
        });
        let deadlines = upcoming
            .into_iter()
            .take(STUDENT_DEADLINES)
            .map(DriveSummary::from)
            .collect();

        let skills = Self::known_skills(store, caller)?;
        let applied: HashSet<JobId> = applications
            .iter()
            .map(|application| application.job_id)
            .collect();
        let mut open = store.find_jobs(&JobFilter::all().status(JobStatus::Open))?;
        open.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        let recommendations = open
            .into_iter()
            .filter(|job| !applied.contains(&job.id))
            .filter(|job| Self::is_recommended(job, caller, &skills))
            .take(STUDENT_RECOMMENDATIONS)
            .map(DriveSummary::from)
            .collect();

        Ok(DashboardView::Student(StudentDashboard {
            user_name: caller.full_name(),
            summary,
            deadlines,
            recommendations,
        }))
    }
}
