use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::{
    Application, Company, CompanyId, Job, JobId, JobStatus, Notification, Resume, ResumeId, User,
    UserId,
};
use crate::store::{
    ApplicationFilter, EntityStore, InMemoryEntityStore, JobFilter, ResumeFilter, StatusChange,
    StoreError, UserFilter,
};

/// Delegates to the in-memory store while recording notification pushes.
#[derive(Default)]
pub(super) struct RecordingStore {
    pub(super) inner: InMemoryEntityStore,
    pub(super) pushes: Mutex<Vec<(UserFilter, Notification)>>,
    pub(super) status_writes: AtomicUsize,
    pub(super) fail_pushes: AtomicBool,
}

impl RecordingStore {
    pub(super) fn push_count(&self) -> usize {
        self.pushes.lock().expect("pushes mutex poisoned").len()
    }

    pub(super) fn pushed_subjects(&self) -> Vec<String> {
        self.pushes
            .lock()
            .expect("pushes mutex poisoned")
            .iter()
            .map(|(_, notification)| notification.subject.clone())
            .collect()
    }
}

impl EntityStore for RecordingStore {
    fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        self.inner.find_users(filter)
    }

    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.find_user(id)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.inner.insert_user(user)
    }

    fn count_users(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        self.inner.count_users(filter)
    }

    fn push_notification(
        &self,
        filter: &UserFilter,
        notification: &Notification,
    ) -> Result<u64, StoreError> {
        self.pushes
            .lock()
            .expect("pushes mutex poisoned")
            .push((filter.clone(), notification.clone()));
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("push rejected".to_string()));
        }
        self.inner.push_notification(filter, notification)
    }

    fn mark_notifications_read(&self, id: UserId) -> Result<u64, StoreError> {
        self.inner.mark_notifications_read(id)
    }

    fn find_companies(&self) -> Result<Vec<Company>, StoreError> {
        self.inner.find_companies()
    }

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        self.inner.find_company(id)
    }

    fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        self.inner.insert_company(company)
    }

    fn update_company(&self, company: Company) -> Result<(), StoreError> {
        self.inner.update_company(company)
    }

    fn count_companies(&self) -> Result<u64, StoreError> {
        self.inner.count_companies()
    }

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        self.inner.find_jobs(filter)
    }

    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.inner.find_job(id)
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.insert_job(job)
    }

    fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StoreError> {
        self.inner.set_job_status(id, status)
    }

    fn sync_job_company_name(&self, company: CompanyId, name: &str) -> Result<u64, StoreError> {
        self.inner.sync_job_company_name(company, name)
    }

    fn count_jobs(&self, filter: &JobFilter) -> Result<u64, StoreError> {
        self.inner.count_jobs(filter)
    }

    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        self.inner.find_applications(filter)
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.insert_application(application)
    }

    fn update_application_status(
        &self,
        job: JobId,
        student: UserId,
        change: &StatusChange,
    ) -> Result<Option<Application>, StoreError> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_application_status(job, student, change)
    }

    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError> {
        self.inner.count_applications(filter)
    }

    fn distinct_resume_ids(&self, filter: &ApplicationFilter) -> Result<Vec<ResumeId>, StoreError> {
        self.inner.distinct_resume_ids(filter)
    }

    fn find_resumes(&self, filter: &ResumeFilter) -> Result<Vec<Resume>, StoreError> {
        self.inner.find_resumes(filter)
    }

    fn insert_resume(&self, resume: Resume) -> Result<Resume, StoreError> {
        self.inner.insert_resume(resume)
    }
}
