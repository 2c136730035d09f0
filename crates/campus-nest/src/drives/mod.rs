//! Drive lifecycle: creation with eligibility validation, status toggles, listings,
//! student applications, and company renames.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::placement::non_empty;
use crate::domain::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Eligibility,
    EmbeddedCompany, Job, JobId, JobStatus, ResumeId, UserId,
};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, ResumeFilter, StoreError, UserFilter};

const GRADUATION_YEAR_HORIZON: i32 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDraft {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default)]
    pub salary_range: Option<String>,
    pub application_deadline: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveListing {
    #[serde(flatten)]
    pub drive: Job,
    pub applicant_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveStats {
    pub total_applications: usize,
    pub by_status: Vec<StatusTally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub status: ApplicationStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriveDetails {
    pub drive: Job,
    pub applications: Vec<Application>,
    pub stats: DriveStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<String>,
    pub cgpa: Option<f64>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeLink {
    pub id: ResumeId,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveApplicant {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub remarks: Option<String>,
    pub student: ApplicantProfile,
    pub resume: Option<ResumeLink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRename {
    pub company: Company,
    pub jobs_updated: u64,
}

fn parse_id<T: std::str::FromStr>(raw: &str, message: &'static str) -> Result<T, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::validation(message))
}

fn required(value: &str, message: &'static str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(message));
    }
    Ok(())
}

fn check_eligibility(eligibility: &Eligibility, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if !(0.0..=10.0).contains(&eligibility.min_cgpa) {
        return Err(ServiceError::validation(
            "Minimum CGPA must be between 0 and 10",
        ));
    }
    if let Some(year) = eligibility.graduation_year.filter(|year| *year != 0) {
        let current = now.year();
        let latest = current + GRADUATION_YEAR_HORIZON;
        if year < current || year > latest {
            return Err(ServiceError::validation(format!(
                "Graduation year must be between {current} and {latest}"
            )));
        }
    }
    if eligibility.max_backlogs < 0 {
        return Err(ServiceError::validation(
            "Maximum backlogs cannot be negative",
        ));
    }
    Ok(())
}

pub struct DriveService<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> DriveService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn companies(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.store.find_companies()?)
    }

    /// Validates and inserts a new open drive posted by `poster`.
    pub fn create_drive(
        &self,
        poster: UserId,
        draft: DriveDraft,
        now: DateTime<Utc>,
    ) -> Result<Job, ServiceError> {
        required(&draft.position, "Position is required")?;

        let company = match non_empty(draft.company_id) {
            Some(raw) => {
                let id: CompanyId = parse_id(&raw, "Invalid company ID - company not found")?;
                let company = self.store.find_company(id)?.ok_or_else(|| {
                    ServiceError::validation("Invalid company ID - company not found")
                })?;
                EmbeddedCompany {
                    id: Some(company.id),
                    name: company.name,
                }
            }
            None => {
                required(&draft.company_name, "Company name is required")?;
                EmbeddedCompany {
                    id: None,
                    name: draft.company_name.trim().to_string(),
                }
            }
        };

        required(&draft.description, "Job description is required")?;
        if draft.application_deadline <= now {
            return Err(ServiceError::validation(
                "Application deadline must be in the future",
            ));
        }
        check_eligibility(&draft.eligibility, now)?;
        required(&draft.location, "Job location is required")?;

        let job = Job {
            id: JobId::new(),
            company,
            position: draft.position.trim().to_string(),
            description: draft.description,
            eligibility: draft.eligibility,
            salary_range: non_empty(draft.salary_range),
            application_deadline: draft.application_deadline,
            location: draft.location.trim().to_string(),
            status: JobStatus::Open,
            posted_by: Some(poster),
            created_at: now,
        };
        let job = self.store.insert_job(job)?;
        info!(drive = %job.id, company = %job.company.name, "drive created");
        Ok(job)
    }

    pub fn set_status(&self, job_id: JobId, raw_status: &str) -> Result<JobStatus, ServiceError> {
        let status = JobStatus::parse(raw_status)
            .ok_or_else(|| ServiceError::validation("Status must be 'open' or 'closed'"))?;
        if !self.store.set_job_status(job_id, status)? {
            return Err(ServiceError::not_found("Drive not found"));
        }
        info!(drive = %job_id, status = status.label(), "drive status updated");
        Ok(status)
    }

    /// Every drive with its applicant count, newest first.
    pub fn list_drives(&self) -> Result<Vec<DriveListing>, ServiceError> {
        let mut jobs = self.store.find_jobs(&JobFilter::all())?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let applications = self.store.find_applications(&ApplicationFilter::all())?;
        let mut counts: HashMap<JobId, usize> = HashMap::new();
        for application in &applications {
            *counts.entry(application.job_id).or_default() += 1;
        }
        Ok(jobs
            .into_iter()
            .map(|drive| DriveListing {
                applicant_count: counts.get(&drive.id).copied().unwrap_or(0),
                drive,
            })
            .collect())
    }

    pub fn drive_details(&self, job_id: JobId) -> Result<DriveDetails, ServiceError> {
        let drive = self
            .store
            .find_job(job_id)?
            .ok_or_else(|| ServiceError::not_found("Drive not found"))?;
        let applications = self
            .store
            .find_applications(&ApplicationFilter::for_jobs(vec![job_id]))?;
        let by_status = ApplicationStatus::ordered()
            .into_iter()
            .map(|status| StatusTally {
                status,
                count: applications
                    .iter()
                    .filter(|application| application.status == status)
                    .count(),
            })
            .collect();
        Ok(DriveDetails {
            stats: DriveStats {
                total_applications: applications.len(),
                by_status,
            },
            drive,
            applications,
        })
    }

    /// Applications for one drive joined with the student and resume, newest first.
    /// Applications whose student no longer exists are skipped.
    pub fn drive_applications(&self, job_id: JobId) -> Result<Vec<DriveApplicant>, ServiceError> {
        let mut applications = self
            .store
            .find_applications(&ApplicationFilter::for_jobs(vec![job_id]))?;
        applications.sort_by(|a, b| b.applied_on.cmp(&a.applied_on));

        let student_ids = applications.iter().map(|application| application.student_id).collect();
        let students: HashMap<UserId, _> = self
            .store
            .find_users(&UserFilter::default().ids(student_ids))?
            .into_iter()
            .map(|student| (student.id, student))
            .collect();
        let resume_ids = applications
            .iter()
            .filter_map(|application| application.resume_id)
            .collect();
        let resumes: HashMap<ResumeId, _> = self
            .store
            .find_resumes(&ResumeFilter::ids(resume_ids))?
            .into_iter()
            .map(|resume| (resume.id, resume))
            .collect();

        Ok(applications
            .into_iter()
            .filter_map(|application| {
                let student = students.get(&application.student_id)?;
                let resume = application
                    .resume_id
                    .and_then(|id| resumes.get(&id))
                    .map(|resume| ResumeLink {
                        id: resume.id,
                        file_url: resume.file_url.clone(),
                    });
                Some(DriveApplicant {
                    id: application.id,
                    status: application.status,
                    applied_on: application.applied_on,
                    remarks: application.remarks,
                    student: ApplicantProfile {
                        id: student.id,
                        first_name: student.first_name.clone(),
                        last_name: student.last_name.clone(),
                        email: student.email.clone(),
                        department: student.department.clone(),
                        cgpa: student.cgpa,
                        skills: student.skills.clone(),
                    },
                    resume,
                })
            })
            .collect())
    }

    /// Submits a student's application with one of their own resumes.
    pub fn apply(
        &self,
        student_id: UserId,
        job_id: JobId,
        resume_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Application, ServiceError> {
        let resume_id: ResumeId = parse_id(resume_id, "Invalid resume_id format")?;
        let drive = self
            .store
            .find_job(job_id)?
            .ok_or_else(|| ServiceError::not_found("Job not found"))?;
        if !drive.is_accepting(now) {
            return Err(ServiceError::validation(
                "This drive is not accepting applications",
            ));
        }
        let existing = self.store.count_applications(
            &ApplicationFilter::for_jobs(vec![job_id]).students(vec![student_id]),
        )?;
        if existing > 0 {
            return Err(already_applied());
        }
        let student = self
            .store
            .find_user(student_id)?
            .ok_or_else(|| ServiceError::not_found("Could not find your user profile"))?;
        if !student.resume_ids.contains(&resume_id) {
            return Err(ServiceError::validation(
                "The provided resume does not belong to you",
            ));
        }

        let application = Application::new(job_id, student_id, Some(resume_id), now);
        let application = self
            .store
            .insert_application(application)
            .map_err(|err| match err {
                StoreError::Conflict => already_applied(),
                other => ServiceError::Store(other),
            })?;
        info!(drive = %job_id, student = %student_id, "application submitted");
        Ok(application)
    }

    /// Renames a company and re-syncs the name embedded in each of its jobs.
    pub fn rename_company(
        &self,
        company_id: CompanyId,
        name: &str,
    ) -> Result<CompanyRename, ServiceError> {
        required(name, "Company name is required")?;
        let mut company = self
            .store
            .find_company(company_id)?
            .ok_or_else(|| ServiceError::not_found("Company not found"))?;
        company.name = name.trim().to_string();
        self.store.update_company(company.clone())?;
        let jobs_updated = self.store.sync_job_company_name(company.id, &company.name)?;
        info!(company = %company.id, jobs_updated, "company renamed");
        Ok(CompanyRename {
            company,
            jobs_updated,
        })
    }
}

fn already_applied() -> ServiceError {
    ServiceError::Conflict("You have already applied for this job".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::{Resume, Role};
    use crate::test_support::{
        add_company, add_job, add_user, apply, at, job, now, staff, store, student,
    };

    fn draft(deadline: DateTime<Utc>) -> DriveDraft {
        DriveDraft {
            company_id: None,
            company_name: "Acme".to_string(),
            position: "Backend Engineer".to_string(),
            description: "Rust services".to_string(),
            eligibility: Eligibility::default(),
            salary_range: Some("12 LPA".to_string()),
            application_deadline: deadline,
            location: "Bengaluru".to_string(),
        }
    }

    #[test]
    fn create_drive_opens_with_poster_and_company_name_from_entity() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme Corp");
        let tpo = add_user(store.as_ref(), staff(Role::Tpo, "Tara"));
        let service = DriveService::new(store);

        let mut request = draft(now() + Duration::days(10));
        request.company_id = Some(acme.id.to_string());
        request.company_name = String::new();
        let drive = service.create_drive(tpo.id, request, now()).expect("created");

        assert_eq!(drive.status, JobStatus::Open);
        assert_eq!(drive.posted_by, Some(tpo.id));
        assert_eq!(drive.company.name, "Acme Corp");
        assert_eq!(drive.created_at, now());
    }

    #[test]
    fn create_drive_enforces_validation_rules() {
        let service = DriveService::new(store());
        let poster = UserId::new();
        let future = now() + Duration::days(10);

        let cases: Vec<(DriveDraft, &str)> = vec![
            (draft(now()), "Application deadline must be in the future"),
            (
                DriveDraft {
                    position: " ".to_string(),
                    ..draft(future)
                },
                "Position is required",
            ),
            (
                DriveDraft {
                    location: String::new(),
                    ..draft(future)
                },
                "Job location is required",
            ),
            (
                DriveDraft {
                    eligibility: Eligibility {
                        min_cgpa: 10.5,
                        ..Eligibility::default()
                    },
                    ..draft(future)
                },
                "Minimum CGPA must be between 0 and 10",
            ),
            (
                DriveDraft {
                    eligibility: Eligibility {
                        graduation_year: Some(2024),
                        ..Eligibility::default()
                    },
                    ..draft(future)
                },
                "Graduation year must be between 2025 and 2035",
            ),
            (
                DriveDraft {
                    eligibility: Eligibility {
                        max_backlogs: -1,
                        ..Eligibility::default()
                    },
                    ..draft(future)
                },
                "Maximum backlogs cannot be negative",
            ),
            (
                DriveDraft {
                    company_id: Some(CompanyId::new().to_string()),
                    ..draft(future)
                },
                "Invalid company ID - company not found",
            ),
        ];

        for (request, expected) in cases {
            let err = service
                .create_drive(poster, request, now())
                .expect_err(expected);
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn set_status_accepts_open_and_closed_only() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let drive = add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        let service = DriveService::new(store.clone());

        assert_eq!(
            service.set_status(drive.id, "Closed").expect("closed"),
            JobStatus::Closed
        );
        assert!(matches!(
            service.set_status(drive.id, "paused"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.set_status(JobId::new(), "open"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn listing_counts_applicants_newest_first() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let older = add_job(store.as_ref(), job(&acme, "QA", at(1)));
        let newer = add_job(store.as_ref(), job(&acme, "SDE", at(4)));
        let asha = add_user(store.as_ref(), student("Asha", "CS", 8.0));
        apply(store.as_ref(), older.id, asha.id, at(5));
        let service = DriveService::new(store);

        let listing = service.list_drives().expect("drives");
        assert_eq!(listing[0].drive.id, newer.id);
        assert_eq!(listing[0].applicant_count, 0);
        assert_eq!(listing[1].applicant_count, 1);
    }

    #[test]
    fn apply_checks_resume_ownership_and_duplicates() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let drive = add_job(store.as_ref(), job(&acme, "SDE", at(10)));
        let resume = Resume {
            id: ResumeId::new(),
            student_id: UserId::new(),
            resume_name: None,
            file_url: "https://files.campus.test/asha.pdf".to_string(),
            parsed_data: None,
            uploaded_at: at(2),
        };
        let mut asha = student("Asha", "CS", 8.0);
        asha.resume_ids = vec![resume.id];
        let asha = add_user(store.as_ref(), asha);
        store.insert_resume(Resume { student_id: asha.id, ..resume.clone() }).expect("resume");
        let service = DriveService::new(store);

        let foreign = service
            .apply(asha.id, drive.id, &ResumeId::new().to_string(), at(12))
            .expect_err("foreign resume");
        assert_eq!(foreign.to_string(), "The provided resume does not belong to you");

        let application = service
            .apply(asha.id, drive.id, &resume.id.to_string(), at(12))
            .expect("applied");
        assert_eq!(application.status, ApplicationStatus::Applied);
        assert_eq!(application.resume_id, Some(resume.id));

        let duplicate = service
            .apply(asha.id, drive.id, &resume.id.to_string(), at(12))
            .expect_err("duplicate");
        assert!(matches!(duplicate, ServiceError::Conflict(_)));

        let applicants = service.drive_applications(drive.id).expect("applicants");
        assert_eq!(applicants.len(), 1);
        assert_eq!(
            applicants[0].resume.as_ref().map(|link| link.file_url.as_str()),
            Some("https://files.campus.test/asha.pdf")
        );
    }

    #[test]
    fn closed_or_expired_drives_reject_applications() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let drive = add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        let asha = add_user(store.as_ref(), student("Asha", "CS", 8.0));
        let service = DriveService::new(store);

        let after_deadline = drive.application_deadline + Duration::days(1);
        let err = service
            .apply(asha.id, drive.id, &ResumeId::new().to_string(), after_deadline)
            .expect_err("expired");
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn rename_company_resyncs_embedded_names() {
        let store = store();
        let acme = add_company(store.as_ref(), "Acme");
        let first = add_job(store.as_ref(), job(&acme, "SDE", at(1)));
        add_job(store.as_ref(), job(&acme, "QA", at(2)));
        let service = DriveService::new(store.clone());

        let renamed = service
            .rename_company(acme.id, "Acme Global")
            .expect("renamed");
        assert_eq!(renamed.jobs_updated, 2);
        let stored = store.find_job(first.id).expect("lookup").expect("job");
        assert_eq!(stored.company.name, "Acme Global");
        assert!(matches!(
            service.rename_company(CompanyId::new(), "Ghost"),
            Err(ServiceError::NotFound(_))
        ));
    }
}
