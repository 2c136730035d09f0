use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{CompanyId, Notification, NotificationId, Role, User, UserId};
use crate::error::ServiceError;
use crate::store::{EntityStore, UserFilter};

use super::Coordinator;

const HISTORY_LIMIT: usize = 50;
const PARTIAL_DELIVERY_WARNING: &str = "Some student IDs were not found or are not students";

/// TPO-authored message addressed to explicit students.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectNotification {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub message: &'static str,
    pub recipients_count: u64,
    pub requested_count: usize,
    pub notification_id: NotificationId,
    pub partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roll_number: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreview {
    pub subject: String,
    pub message: String,
    pub recipient_count: u64,
    pub requested_count: usize,
    pub students: Vec<RecipientSummary>,
    pub estimated_delivery: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementOutcome {
    pub message: &'static str,
    pub recipients_count: u64,
    pub notification_id: NotificationId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecipient {
    pub student_id: UserId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: NotificationId,
    pub subject: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub recipients: Vec<HistoryRecipient>,
    pub recipient_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationHistory {
    pub notifications: Vec<HistoryEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub count: usize,
}

impl NotificationList {
    fn from_user(user: User) -> Self {
        let count = user.notifications.len();
        Self {
            notifications: user.notifications,
            count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecruiterIdentity {
    pub id: UserId,
    pub name: String,
    pub company: Option<CompanyId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecruiterNotifications {
    pub notifications: Vec<Notification>,
    pub count: usize,
    pub recruiter: RecruiterIdentity,
}

fn require_text(subject: &str, message: &str) -> Result<(), ServiceError> {
    if subject.trim().is_empty() || message.trim().is_empty() {
        return Err(ServiceError::validation(
            "Both subject and message are required",
        ));
    }
    Ok(())
}

fn parse_student_ids(raw: &[String]) -> Result<Vec<UserId>, ServiceError> {
    if raw.is_empty() {
        return Err(ServiceError::validation(
            "At least one student ID must be provided",
        ));
    }
    let ids = raw
        .iter()
        .map(|id| {
            id.trim().parse().map_err(|_| {
                ServiceError::validation(format!("Invalid student ID format: {id}"))
            })
        })
        .collect::<Result<BTreeSet<UserId>, _>>()?;
    Ok(ids.into_iter().collect())
}

impl<S: EntityStore> Coordinator<S> {
    /// Pushes one notification to every listed id that belongs to a student.
    pub fn send_direct(
        &self,
        request: DirectNotification,
        now: DateTime<Utc>,
    ) -> Result<SendOutcome, ServiceError> {
        require_text(&request.subject, &request.message)?;
        let ids = parse_student_ids(&request.student_ids)?;
        let requested_count = ids.len();

        let notification = Notification::new(request.subject, request.message, now);
        let recipients_count = self
            .store
            .push_notification(&UserFilter::students().ids(ids), &notification)?;

        let partial = recipients_count != requested_count as u64;
        if partial {
            warn!(
                requested = requested_count,
                delivered = recipients_count,
                "notification delivered to a subset of requested students"
            );
        } else {
            info!(delivered = recipients_count, "notification sent");
        }

        Ok(SendOutcome {
            message: if partial {
                "Notification sent with warnings"
            } else {
                "Notification sent successfully"
            },
            recipients_count,
            requested_count,
            notification_id: notification.id,
            partial,
            warning: partial.then_some(PARTIAL_DELIVERY_WARNING),
        })
    }

    /// Resolves the recipients a direct send would reach without writing anything.
    pub fn preview(&self, request: DirectNotification) -> Result<NotificationPreview, ServiceError> {
        require_text(&request.subject, &request.message)?;
        let ids = parse_student_ids(&request.student_ids)?;
        let requested_count = ids.len();
        let students = self.store.find_users(&UserFilter::students().ids(ids))?;

        Ok(NotificationPreview {
            recipient_count: students.len() as u64,
            requested_count,
            subject: request.subject,
            message: request.message,
            students: students
                .into_iter()
                .map(|student| RecipientSummary {
                    id: student.id,
                    first_name: student.first_name,
                    last_name: student.last_name,
                    email: student.email,
                    roll_number: student.roll_number,
                    department: student.department,
                })
                .collect(),
            estimated_delivery: "Immediate",
        })
    }

    /// Admin broadcast to every student and TPO.
    pub fn announce(
        &self,
        announcement: Announcement,
        now: DateTime<Utc>,
    ) -> Result<AnnouncementOutcome, ServiceError> {
        require_text(&announcement.subject, &announcement.message)?;
        let notification = Notification::new(announcement.subject, announcement.message, now);
        let audience = UserFilter::with_roles(vec![Role::Student, Role::Tpo]);
        let recipients_count = self.store.push_notification(&audience, &notification)?;
        if recipients_count == 0 {
            return Err(ServiceError::not_found(
                "No users found to send announcement",
            ));
        }
        info!(delivered = recipients_count, "announcement sent");
        Ok(AnnouncementOutcome {
            message: "Announcement sent to all students and TPOs",
            recipients_count,
            notification_id: notification.id,
        })
    }

    /// Student notifications grouped by notification id, newest first.
    pub fn history(&self) -> Result<NotificationHistory, ServiceError> {
        let students = self.store.find_users(&UserFilter::students())?;

        let mut entries: Vec<HistoryEntry> = Vec::new();
        let mut positions: HashMap<NotificationId, usize> = HashMap::new();
        for student in &students {
            for notification in &student.notifications {
                let index = *positions.entry(notification.id).or_insert_with(|| {
                    entries.push(HistoryEntry {
                        id: notification.id,
                        subject: notification.subject.clone(),
                        message: notification.message.clone(),
                        sent_at: notification.created_at,
                        recipients: Vec::new(),
                        recipient_count: 0,
                    });
                    entries.len() - 1
                });
                let entry = &mut entries[index];
                entry.recipients.push(HistoryRecipient {
                    student_id: student.id,
                    name: student.full_name(),
                    email: student.email.clone(),
                    department: student.department.clone(),
                    is_read: notification.is_read,
                });
                entry.recipient_count += 1;
            }
        }

        entries.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        entries.truncate(HISTORY_LIMIT);
        Ok(NotificationHistory {
            total: entries.len(),
            notifications: entries,
        })
    }

    /// Returns the caller's notifications with the read flags as currently stored.
    ///
    /// Marking them read is a separate step, see [`ReadMarker::schedule`].
    pub fn student_notifications(&self, student_id: UserId) -> Result<NotificationList, ServiceError> {
        let student = self
            .store
            .find_user(student_id)?
            .filter(|user| user.role == Role::Student)
            .ok_or_else(|| ServiceError::not_found("Student not found"))?;
        Ok(NotificationList::from_user(student))
    }

    pub fn recruiter_notifications(
        &self,
        recruiter_id: UserId,
    ) -> Result<RecruiterNotifications, ServiceError> {
        let recruiter = self
            .store
            .find_user(recruiter_id)?
            .filter(|user| user.role == Role::Rec)
            .ok_or_else(|| ServiceError::not_found("Recruiter not found"))?;
        let identity = RecruiterIdentity {
            id: recruiter.id,
            name: recruiter.full_name(),
            company: recruiter.company_id,
        };
        let list = NotificationList::from_user(recruiter);
        Ok(RecruiterNotifications {
            notifications: list.notifications,
            count: list.count,
            recruiter: identity,
        })
    }
}

/// Marks notifications read after a list response, off the request path.
///
/// Each run is bounded by `timeout` and abandoned once the shutdown signal flips to `true`.
/// Failures are logged and never reach the caller.
pub struct ReadMarker<S: EntityStore> {
    store: Arc<S>,
    timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<S: EntityStore> Clone for ReadMarker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: EntityStore + 'static> ReadMarker<S> {
    pub fn new(store: Arc<S>, timeout: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            store,
            timeout,
            shutdown,
        }
    }

    /// Spawns the mark-read task. Resolves to the number of flags changed, or `None` when
    /// the run failed, timed out, or was cancelled.
    pub fn schedule(&self, student_id: UserId) -> JoinHandle<Option<u64>> {
        let store = Arc::clone(&self.store);
        let timeout = self.timeout;
        let mut shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let cancelled = async move {
                // A dropped sender means no shutdown will ever be signalled.
                let closed = shutdown.wait_for(|stop| *stop).await.is_err();
                if closed {
                    std::future::pending::<()>().await;
                }
            };
            let work = tokio::task::spawn_blocking(move || store.mark_notifications_read(student_id));

            tokio::select! {
                biased;
                _ = cancelled => {
                    debug!(student = %student_id, "mark-read cancelled by shutdown");
                    None
                }
                outcome = tokio::time::timeout(timeout, work) => match outcome {
                    Ok(Ok(Ok(changed))) => {
                        debug!(student = %student_id, changed, "notifications marked read");
                        Some(changed)
                    }
                    Ok(Ok(Err(err))) => {
                        warn!(student = %student_id, error = %err, "failed to mark notifications read");
                        None
                    }
                    Ok(Err(err)) => {
                        warn!(student = %student_id, error = %err, "mark-read worker panicked");
                        None
                    }
                    Err(_) => {
                        warn!(
                            student = %student_id,
                            timeout_secs = timeout.as_secs(),
                            "mark-read timed out"
                        );
                        None
                    }
                },
            }
        })
    }
}
