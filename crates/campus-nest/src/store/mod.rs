//! Entity store access. Every query the engine issues goes through a typed filter so
//! request parameters are validated once and translated to store predicates in one place.

pub mod memory;
pub mod seed;

use chrono::{DateTime, Utc};

use crate::domain::{
    Application, ApplicationStatus, Company, CompanyId, Job, JobId, JobStatus, Notification,
    PlacementStatus, Resume, ResumeId, Role, User, UserId,
};

pub use memory::InMemoryEntityStore;
pub use seed::{SeedData, SeedError};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub roles: Option<Vec<Role>>,
    pub ids: Option<Vec<UserId>>,
    pub department: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
    pub placed_status: Option<PlacementStatus>,
}

impl UserFilter {
    pub fn students() -> Self {
        Self {
            role: Some(Role::Student),
            ..Self::default()
        }
    }

    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            roles: Some(roles),
            ..Self::default()
        }
    }

    pub fn ids(mut self, ids: Vec<UserId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_until = until;
        self
    }

    pub fn placed_status(mut self, status: PlacementStatus) -> Self {
        self.placed_status = Some(status);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self
                .roles
                .as_ref()
                .map_or(true, |roles| roles.contains(&user.role))
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&user.id))
            && self
                .department
                .as_ref()
                .map_or(true, |department| user.department.as_ref() == Some(department))
            && self.created_from.map_or(true, |from| user.created_at >= from)
            && self
                .created_until
                .map_or(true, |until| user.created_at <= until)
            && self
                .placed_status
                .map_or(true, |status| user.placed_status == status)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub ids: Option<Vec<JobId>>,
    pub company: Option<CompanyId>,
    pub status: Option<JobStatus>,
    pub deadline_after: Option<DateTime<Utc>>,
}

impl JobFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_company(company: CompanyId) -> Self {
        Self {
            company: Some(company),
            ..Self::default()
        }
    }

    pub fn ids(mut self, ids: Vec<JobId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn deadline_after(mut self, at: DateTime<Utc>) -> Self {
        self.deadline_after = Some(at);
        self
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&job.id))
            && self
                .company
                .map_or(true, |company| job.company.id == Some(company))
            && self.status.map_or(true, |status| job.status == status)
            && self
                .deadline_after
                .map_or(true, |at| job.application_deadline > at)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFilter {
    pub jobs: Option<Vec<JobId>>,
    pub students: Option<Vec<UserId>>,
    pub statuses: Option<Vec<ApplicationStatus>>,
    pub applied_from: Option<DateTime<Utc>>,
    pub applied_until: Option<DateTime<Utc>>,
}

impl ApplicationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_jobs(jobs: Vec<JobId>) -> Self {
        Self {
            jobs: Some(jobs),
            ..Self::default()
        }
    }

    pub fn for_student(student: UserId) -> Self {
        Self {
            students: Some(vec![student]),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: ApplicationStatus) -> Self {
        self.statuses = Some(vec![status]);
        self
    }

    pub fn students(mut self, students: Vec<UserId>) -> Self {
        self.students = Some(students);
        self
    }

    pub fn applied_between(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.applied_from = from;
        self.applied_until = until;
        self
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.jobs
            .as_ref()
            .map_or(true, |jobs| jobs.contains(&application.job_id))
            && self
                .students
                .as_ref()
                .map_or(true, |students| students.contains(&application.student_id))
            && self
                .statuses
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&application.status))
            && self
                .applied_from
                .map_or(true, |from| application.applied_on >= from)
            && self
                .applied_until
                .map_or(true, |until| application.applied_on <= until)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeFilter {
    pub ids: Option<Vec<ResumeId>>,
    pub students: Option<Vec<UserId>>,
}

impl ResumeFilter {
    pub fn ids(ids: Vec<ResumeId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn for_student(student: UserId) -> Self {
        Self {
            students: Some(vec![student]),
            ..Self::default()
        }
    }

    pub fn matches(&self, resume: &Resume) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&resume.id))
            && self
                .students
                .as_ref()
                .map_or(true, |students| students.contains(&resume.student_id))
    }
}

/// Field changes applied to a single application matched by (job, student).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub remarks: Option<String>,
    pub at: DateTime<Utc>,
}

/// Storage abstraction so the engine, coordinator, and façade can be exercised in isolation.
///
/// Calls are blocking; the HTTP layer bounds them with a per-request deadline.
pub trait EntityStore: Send + Sync {
    fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn insert_user(&self, user: User) -> Result<User, StoreError>;
    fn count_users(&self, filter: &UserFilter) -> Result<u64, StoreError>;
    /// Appends the notification to every matching user, returning the modified count.
    fn push_notification(
        &self,
        filter: &UserFilter,
        notification: &Notification,
    ) -> Result<u64, StoreError>;
    /// Flags every unread notification of the user as read, returning how many changed.
    fn mark_notifications_read(&self, id: UserId) -> Result<u64, StoreError>;

    fn find_companies(&self) -> Result<Vec<Company>, StoreError>;
    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    fn insert_company(&self, company: Company) -> Result<Company, StoreError>;
    fn update_company(&self, company: Company) -> Result<(), StoreError>;
    fn count_companies(&self) -> Result<u64, StoreError>;

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;
    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
    fn insert_job(&self, job: Job) -> Result<Job, StoreError>;
    fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StoreError>;
    /// Rewrites the embedded company name on every job of the company.
    fn sync_job_company_name(&self, company: CompanyId, name: &str) -> Result<u64, StoreError>;
    fn count_jobs(&self, filter: &JobFilter) -> Result<u64, StoreError>;

    fn find_applications(&self, filter: &ApplicationFilter)
        -> Result<Vec<Application>, StoreError>;
    /// Rejects a second application for the same (student, job) pair with `Conflict`.
    fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    /// Returns `None` when no application exists for the pair.
    fn update_application_status(
        &self,
        job: JobId,
        student: UserId,
        change: &StatusChange,
    ) -> Result<Option<Application>, StoreError>;
    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError>;
    fn distinct_resume_ids(&self, filter: &ApplicationFilter) -> Result<Vec<ResumeId>, StoreError>;

    fn find_resumes(&self, filter: &ResumeFilter) -> Result<Vec<Resume>, StoreError>;
    fn insert_resume(&self, resume: Resume) -> Result<Resume, StoreError>;
}
