use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{
    Application, ApplicationStatus, Company, CompanyId, Eligibility, EmbeddedCompany, Job, JobId,
    JobStatus, Role, User, UserId,
};
use crate::store::{EntityStore, InMemoryEntityStore, StatusChange};

/// 2025-03-`day` 09:00 UTC.
pub(crate) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0)
        .single()
        .expect("valid fixture date")
}

pub(crate) fn now() -> DateTime<Utc> {
    at(20)
}

fn email(first: &str, last: &str) -> String {
    format!("{}.{}@campus.test", first.to_lowercase(), last.to_lowercase())
}

pub(crate) fn student(first: &str, department: &str, cgpa: f64) -> User {
    let mut user = User::new(Role::Student, first, "Student", email(first, "student"), at(1));
    user.department = Some(department.to_string());
    user.cgpa = Some(cgpa);
    user
}

pub(crate) fn recruiter(first: &str, company: Option<CompanyId>) -> User {
    let mut user = User::new(Role::Rec, first, "Recruiter", email(first, "recruiter"), at(1));
    user.company_id = company;
    user
}

pub(crate) fn staff(role: Role, first: &str) -> User {
    User::new(role, first, "Staff", email(first, role.label()), at(1))
}

pub(crate) fn job(company: &Company, position: &str, created: DateTime<Utc>) -> Job {
    Job {
        id: JobId::new(),
        company: EmbeddedCompany {
            id: Some(company.id),
            name: company.name.clone(),
        },
        position: position.to_string(),
        description: format!("{position} role"),
        eligibility: Eligibility::default(),
        salary_range: Some("8-10 LPA".to_string()),
        application_deadline: created + Duration::days(30),
        location: "Pune".to_string(),
        status: JobStatus::Open,
        posted_by: None,
        created_at: created,
    }
}

pub(crate) fn store() -> Arc<InMemoryEntityStore> {
    Arc::new(InMemoryEntityStore::new())
}

pub(crate) fn add_user<S: EntityStore>(store: &S, user: User) -> User {
    store.insert_user(user).expect("insert user")
}

pub(crate) fn add_company<S: EntityStore>(store: &S, name: &str) -> Company {
    store.insert_company(Company::new(name)).expect("insert company")
}

pub(crate) fn add_job<S: EntityStore>(store: &S, job: Job) -> Job {
    store.insert_job(job).expect("insert job")
}

pub(crate) fn apply<S: EntityStore>(
    store: &S,
    job: JobId,
    student: UserId,
    applied: DateTime<Utc>,
) -> Application {
    store
        .insert_application(Application::new(job, student, None, applied))
        .expect("insert application")
}

pub(crate) fn set_status<S: EntityStore>(
    store: &S,
    job: JobId,
    student: UserId,
    status: ApplicationStatus,
) {
    let change = StatusChange {
        status,
        remarks: None,
        at: now(),
    };
    store
        .update_application_status(job, student, &change)
        .expect("update status")
        .expect("application exists");
}
