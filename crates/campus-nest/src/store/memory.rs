use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{
    Application, Company, CompanyId, Job, JobId, JobStatus, Notification, Resume, ResumeId, User,
    UserId,
};

use super::{
    ApplicationFilter, EntityStore, JobFilter, ResumeFilter, SeedData, StatusChange, StoreError,
    UserFilter,
};

/// Process-local store keyed by entity id. Ordered maps keep query results deterministic.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    users: RwLock<BTreeMap<UserId, User>>,
    companies: RwLock<BTreeMap<CompanyId, Company>>,
    jobs: RwLock<BTreeMap<JobId, Job>>,
    applications: RwLock<Vec<Application>>,
    resumes: RwLock<BTreeMap<ResumeId, Resume>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Result<Self, StoreError> {
        let store = Self::new();
        for company in seed.companies {
            store.insert_company(company)?;
        }
        for user in seed.users {
            store.insert_user(user)?;
        }
        for job in seed.jobs {
            store.insert_job(job)?;
        }
        for resume in seed.resumes {
            store.insert_resume(resume)?;
        }
        for application in seed.applications {
            store.insert_application(application)?;
        }
        Ok(store)
    }
}

impl EntityStore for InMemoryEntityStore {
    fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let guard = read(&self.users)?;
        Ok(guard
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect())
    }

    fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut guard = write(&self.users)?;
        let duplicate_email = guard
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email));
        if guard.contains_key(&user.id) || duplicate_email {
            return Err(StoreError::Conflict);
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    fn count_users(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let guard = read(&self.users)?;
        Ok(guard.values().filter(|user| filter.matches(user)).count() as u64)
    }

    fn push_notification(
        &self,
        filter: &UserFilter,
        notification: &Notification,
    ) -> Result<u64, StoreError> {
        let mut guard = write(&self.users)?;
        let mut modified = 0;
        for user in guard.values_mut().filter(|user| filter.matches(user)) {
            user.notifications.push(notification.clone());
            modified += 1;
        }
        Ok(modified)
    }

    fn mark_notifications_read(&self, id: UserId) -> Result<u64, StoreError> {
        let mut guard = write(&self.users)?;
        let user = guard.get_mut(&id).ok_or(StoreError::NotFound)?;
        let mut changed = 0;
        for notification in user.notifications.iter_mut().filter(|n| !n.is_read) {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    fn find_companies(&self) -> Result<Vec<Company>, StoreError> {
        Ok(read(&self.companies)?.values().cloned().collect())
    }

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(read(&self.companies)?.get(&id).cloned())
    }

    fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut guard = write(&self.companies)?;
        if guard.contains_key(&company.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(company.id, company.clone());
        Ok(company)
    }

    fn update_company(&self, company: Company) -> Result<(), StoreError> {
        let mut guard = write(&self.companies)?;
        match guard.get_mut(&company.id) {
            Some(existing) => {
                *existing = company;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn count_companies(&self) -> Result<u64, StoreError> {
        Ok(read(&self.companies)?.len() as u64)
    }

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let guard = read(&self.jobs)?;
        Ok(guard
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect())
    }

    fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(read(&self.jobs)?.get(&id).cloned())
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut guard = write(&self.jobs)?;
        if guard.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(job.id, job.clone());
        Ok(job)
    }

    fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StoreError> {
        let mut guard = write(&self.jobs)?;
        Ok(match guard.get_mut(&id) {
            Some(job) => {
                job.status = status;
                true
            }
            None => false,
        })
    }

    fn sync_job_company_name(&self, company: CompanyId, name: &str) -> Result<u64, StoreError> {
        let mut guard = write(&self.jobs)?;
        let mut modified = 0;
        for job in guard
            .values_mut()
            .filter(|job| job.company.id == Some(company))
        {
            job.company.name = name.to_string();
            modified += 1;
        }
        Ok(modified)
    }

    fn count_jobs(&self, filter: &JobFilter) -> Result<u64, StoreError> {
        let guard = read(&self.jobs)?;
        Ok(guard.values().filter(|job| filter.matches(job)).count() as u64)
    }

    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        let guard = read(&self.applications)?;
        Ok(guard
            .iter()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut guard = write(&self.applications)?;
        let duplicate = guard.iter().any(|existing| {
            existing.id == application.id
                || (existing.job_id == application.job_id
                    && existing.student_id == application.student_id)
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        guard.push(application.clone());
        Ok(application)
    }

    fn update_application_status(
        &self,
        job: JobId,
        student: UserId,
        change: &StatusChange,
    ) -> Result<Option<Application>, StoreError> {
        let mut guard = write(&self.applications)?;
        let Some(application) = guard
            .iter_mut()
            .find(|application| application.job_id == job && application.student_id == student)
        else {
            return Ok(None);
        };

        application.status = change.status;
        application.updated_on = change.at;
        if let Some(remarks) = &change.remarks {
            application.remarks = Some(remarks.clone());
        }
        Ok(Some(application.clone()))
    }

    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError> {
        let guard = read(&self.applications)?;
        Ok(guard
            .iter()
            .filter(|application| filter.matches(application))
            .count() as u64)
    }

    fn distinct_resume_ids(&self, filter: &ApplicationFilter) -> Result<Vec<ResumeId>, StoreError> {
        let guard = read(&self.applications)?;
        let ids: BTreeSet<ResumeId> = guard
            .iter()
            .filter(|application| filter.matches(application))
            .filter_map(|application| application.resume_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn find_resumes(&self, filter: &ResumeFilter) -> Result<Vec<Resume>, StoreError> {
        let guard = read(&self.resumes)?;
        Ok(guard
            .values()
            .filter(|resume| filter.matches(resume))
            .cloned()
            .collect())
    }

    fn insert_resume(&self, resume: Resume) -> Result<Resume, StoreError> {
        let mut guard = write(&self.resumes)?;
        if guard.contains_key(&resume.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(resume.id, resume.clone());
        Ok(resume)
    }
}
