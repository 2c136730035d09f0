use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{ApplicationId, ApplicationStatus, Job, JobId, Notification, User, UserId};
use crate::error::ServiceError;
use crate::store::{EntityStore, StatusChange, UserFilter};

use super::templates::status_template;
use super::Coordinator;

pub const INVALID_STUDENT_ID: &str = "Invalid student ID";
pub const APPLICATION_NOT_UPDATED: &str = "Application not found or update failed";

/// One requested transition. The compact body form names the student `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateItem {
    #[serde(alias = "id")]
    pub student_id: String,
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Accepts both `{"updates": [...]}` and a bare array of items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BulkStatusBody {
    Wrapped { updates: Vec<StatusUpdateItem> },
    Compact(Vec<StatusUpdateItem>),
}

impl BulkStatusBody {
    pub fn into_updates(self) -> Vec<StatusUpdateItem> {
        match self {
            BulkStatusBody::Wrapped { updates } => updates,
            BulkStatusBody::Compact(updates) => updates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub student_id: String,
    pub status: ItemOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    fn success(student_id: String, status: ApplicationStatus) -> Self {
        Self {
            student_id,
            status: ItemOutcome::Success,
            new_status: Some(status),
            error: None,
        }
    }

    fn failed(student_id: String, error: &str) -> Self {
        Self {
            student_id,
            status: ItemOutcome::Failed,
            new_status: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReference {
    pub id: JobId,
    pub position: String,
    pub company: String,
}

impl JobReference {
    fn from_job(job: &Job) -> Self {
        Self {
            id: job.id,
            position: job.position.clone(),
            company: job.company.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedBy {
    pub recruiter_id: UserId,
    pub recruiter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusSummary {
    pub message: &'static str,
    pub total_updates: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub notifications_sent: u64,
    pub results: Vec<ItemResult>,
    pub job: JobReference,
    pub updated_by: UpdatedBy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStatusUpdate {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReference {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedApplication {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub updated_on: DateTime<Utc>,
    pub remarks: Option<String>,
    pub student: Option<StudentReference>,
    pub job: JobReference,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStatusResult {
    pub message: &'static str,
    pub application: UpdatedApplication,
    pub updated_by: UpdatedBy,
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, ServiceError> {
    ApplicationStatus::parse(raw).ok_or_else(|| {
        ServiceError::validation(format!(
            "Invalid application status: {}. Valid statuses: {}",
            raw.trim().to_lowercase(),
            ApplicationStatus::valid_labels()
        ))
    })
}

pub(crate) fn parse_job_id(raw: &str) -> Result<JobId, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::validation("Invalid job ID"))
}

impl<S: EntityStore> Coordinator<S> {
    /// Resolves the recruiter and a job owned by the recruiter's company.
    fn recruiter_job(
        &self,
        recruiter_id: UserId,
        job_id: JobId,
    ) -> Result<(User, Job), ServiceError> {
        let recruiter = self
            .store
            .find_user(recruiter_id)?
            .ok_or_else(|| ServiceError::not_found("Recruiter not found"))?;
        let company = recruiter.company_id.ok_or_else(|| {
            ServiceError::validation("No company associated. Cannot update application status.")
        })?;
        let job = self
            .store
            .find_job(job_id)?
            .filter(|job| job.company_id() == Some(company))
            .ok_or_else(|| ServiceError::not_found("Job not found or not accessible"))?;
        Ok((recruiter, job))
    }

    /// Applies status transitions for one job in input order, then notifies each status group.
    ///
    /// Every status is validated before the first write, so an invalid entry leaves the
    /// store untouched. Item failures are reported inline and never abort the batch.
    pub fn bulk_update(
        &self,
        recruiter_id: UserId,
        job_id: JobId,
        updates: Vec<StatusUpdateItem>,
        now: DateTime<Utc>,
    ) -> Result<BulkStatusSummary, ServiceError> {
        if updates.is_empty() {
            return Err(ServiceError::validation(
                "At least one student update is required",
            ));
        }
        let statuses = updates
            .iter()
            .map(|item| parse_status(&item.status))
            .collect::<Result<Vec<_>, _>>()?;

        let (recruiter, job) = self.recruiter_job(recruiter_id, job_id)?;

        let total_updates = updates.len();
        let mut results = Vec::with_capacity(total_updates);
        let mut groups: BTreeMap<ApplicationStatus, Vec<UserId>> = BTreeMap::new();
        for (item, status) in updates.into_iter().zip(statuses) {
            let Ok(student_id) = item.student_id.trim().parse::<UserId>() else {
                results.push(ItemResult::failed(item.student_id, INVALID_STUDENT_ID));
                continue;
            };
            let change = StatusChange {
                status,
                remarks: item.remarks,
                at: now,
            };
            match self
                .store
                .update_application_status(job.id, student_id, &change)
            {
                Ok(Some(_)) => {
                    groups.entry(status).or_default().push(student_id);
                    results.push(ItemResult::success(item.student_id, status));
                }
                Ok(None) => {
                    results.push(ItemResult::failed(item.student_id, APPLICATION_NOT_UPDATED));
                }
                Err(err) => {
                    warn!(error = %err, student = %student_id, "application status write failed");
                    results.push(ItemResult::failed(item.student_id, APPLICATION_NOT_UPDATED));
                }
            }
        }

        let notifications_sent = self.notify_groups(&job, groups, now);
        let success_count = results
            .iter()
            .filter(|result| result.status == ItemOutcome::Success)
            .count();

        info!(
            job = %job.id,
            total = total_updates,
            succeeded = success_count,
            notified = notifications_sent,
            "bulk status update completed"
        );

        Ok(BulkStatusSummary {
            message: "Bulk status update completed",
            total_updates,
            success_count,
            failed_count: total_updates - success_count,
            notifications_sent,
            results,
            job: JobReference::from_job(&job),
            updated_by: UpdatedBy {
                recruiter_id: recruiter.id,
                recruiter_name: recruiter.full_name(),
                company: Some(job.company.name.clone()),
            },
        })
    }

    /// One push per templated status; a failed push is logged and the batch result stands.
    fn notify_groups(
        &self,
        job: &Job,
        groups: BTreeMap<ApplicationStatus, Vec<UserId>>,
        now: DateTime<Utc>,
    ) -> u64 {
        let mut sent = 0;
        for (status, students) in groups {
            let Some(template) = status_template(status, &job.position, &job.company.name) else {
                debug!(status = status.label(), "no notification template for status");
                continue;
            };
            let notification = Notification::new(template.subject, template.message, now);
            let filter = UserFilter::students().ids(students);
            match self.store.push_notification(&filter, &notification) {
                Ok(modified) => sent += modified,
                Err(err) => {
                    warn!(error = %err, status = status.label(), "status notification push failed");
                }
            }
        }
        sent
    }

    /// Updates one (student, job) application; no notification is sent.
    pub fn update_single(
        &self,
        recruiter_id: UserId,
        student_id: &str,
        update: SingleStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<SingleStatusResult, ServiceError> {
        let student_id: UserId = student_id
            .trim()
            .parse()
            .map_err(|_| ServiceError::validation(INVALID_STUDENT_ID))?;
        let job_id = parse_job_id(&update.job_id)?;
        let status = parse_status(&update.status)?;

        let (recruiter, job) = self.recruiter_job(recruiter_id, job_id)?;
        let change = StatusChange {
            status,
            remarks: update.remarks,
            at: now,
        };
        let application = self
            .store
            .update_application_status(job.id, student_id, &change)?
            .ok_or_else(|| ServiceError::not_found("Application not found"))?;

        let student = self
            .store
            .find_user(student_id)?
            .map(|student| StudentReference {
                id: student.id,
                first_name: student.first_name,
                last_name: student.last_name,
                email: student.email,
            });

        info!(job = %job.id, student = %student_id, status = status.label(), "application status updated");

        Ok(SingleStatusResult {
            message: "Application status updated successfully",
            application: UpdatedApplication {
                id: application.id,
                status: application.status,
                updated_on: application.updated_on,
                remarks: application.remarks,
                student,
                job: JobReference::from_job(&job),
            },
            updated_by: UpdatedBy {
                recruiter_id: recruiter.id,
                recruiter_name: recruiter.full_name(),
                company: Some(job.company.name),
            },
        })
    }
}
