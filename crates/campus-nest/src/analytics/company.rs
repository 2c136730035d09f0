use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{ApplicationStatus, CompanyId, Job, JobId, UserId};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, UserFilter};

use super::pipeline::{index_by, top_n};
use super::placement::{department_label, positive};
use super::AnalyticsEngine;

const DEFAULT_COMPANY_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyAnalyticsParams {
    pub limit: Option<usize>,
}

impl CompanyAnalyticsParams {
    pub fn limit(&self) -> Result<usize, ServiceError> {
        Ok(positive(self.limit, "limit")?.unwrap_or(DEFAULT_COMPANY_LIMIT))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAnalytics {
    pub top_by_hires: Vec<CompanyHires>,
    pub top_by_drives: Vec<CompanyDrives>,
    pub summary: CompanySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHires {
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub hires: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDrives {
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub drives: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub total_companies: u64,
    pub total_jobs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPlacements {
    pub company: String,
    pub placements: u64,
    pub positions: Vec<String>,
    pub salary_ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSalary {
    pub department: String,
    pub average_salary: f64,
    pub max_salary: f64,
    pub min_salary: f64,
    pub placement_count: u64,
}

/// Leading number of a free-text range: `"8-10 LPA"` gives 8, `"TBD"` gives nothing.
fn leading_amount(salary_range: &str) -> Option<f64> {
    let trimmed = salary_range.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

impl<S: EntityStore> AnalyticsEngine<S> {
    pub fn company_analytics(&self, limit: usize) -> Result<CompanyAnalytics, ServiceError> {
        let names: HashMap<CompanyId, String> = self
            .store
            .find_companies()?
            .into_iter()
            .map(|company| (company.id, company.name))
            .collect();
        let resolve = |id: Option<CompanyId>| {
            id.and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| "Unknown".to_string())
        };

        let jobs = self.store.find_jobs(&JobFilter::all())?;
        let jobs_by_id = index_by(&jobs, |job| job.id);

        let selected = self
            .store
            .find_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?;
        let mut hires: BTreeMap<Option<CompanyId>, u64> = BTreeMap::new();
        for application in &selected {
            // Hires whose job vanished are dropped, the join has no row to group on.
            if let Some(job) = jobs_by_id.get(&application.job_id) {
                *hires.entry(job.company_id()).or_insert(0) += 1;
            }
        }

        let mut drives: BTreeMap<Option<CompanyId>, u64> = BTreeMap::new();
        for job in &jobs {
            *drives.entry(job.company_id()).or_insert(0) += 1;
        }

        let top_by_hires = top_n(hires, limit)
            .into_iter()
            .map(|(company_id, hires)| CompanyHires {
                company_id,
                name: resolve(company_id),
                hires,
            })
            .collect();
        let top_by_drives = top_n(drives, limit)
            .into_iter()
            .map(|(company_id, drives)| CompanyDrives {
                company_id,
                name: resolve(company_id),
                drives,
            })
            .collect();

        Ok(CompanyAnalytics {
            top_by_hires,
            top_by_drives,
            summary: CompanySummary {
                total_companies: self.store.count_companies()?,
                total_jobs: jobs.len() as u64,
            },
        })
    }

    /// Selected applications grouped by the company name embedded in each job.
    pub fn company_wise_placements(&self) -> Result<Vec<CompanyPlacements>, ServiceError> {
        let selected = self
            .store
            .find_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?;
        let job_ids: Vec<JobId> = selected.iter().map(|application| application.job_id).collect();
        let jobs = self.store.find_jobs(&JobFilter::all().ids(job_ids))?;
        let jobs_by_id: HashMap<JobId, &Job> = index_by(&jobs, |job| job.id);

        let mut grouped: BTreeMap<String, (u64, BTreeSet<String>, BTreeSet<String>)> =
            BTreeMap::new();
        for application in &selected {
            let Some(job) = jobs_by_id.get(&application.job_id) else {
                continue;
            };
            let entry = grouped.entry(job.company.name.clone()).or_default();
            entry.0 += 1;
            entry.1.insert(job.position.clone());
            if let Some(salary) = &job.salary_range {
                entry.2.insert(salary.clone());
            }
        }

        let mut rows: Vec<CompanyPlacements> = grouped
            .into_iter()
            .map(
                |(company, (placements, positions, salary_ranges))| CompanyPlacements {
                    company,
                    placements,
                    positions: positions.into_iter().collect(),
                    salary_ranges: salary_ranges.into_iter().collect(),
                },
            )
            .collect();
        rows.sort_by(|left, right| right.placements.cmp(&left.placements));
        Ok(rows)
    }

    /// Salary of each selected application's drive, grouped by the student's department,
    /// highest average first. Drives without a parseable salary are skipped.
    pub fn salary_by_department(&self) -> Result<Vec<DepartmentSalary>, ServiceError> {
        let selected = self
            .store
            .find_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?;
        let job_ids: Vec<JobId> = selected.iter().map(|application| application.job_id).collect();
        let student_ids: Vec<UserId> = selected
            .iter()
            .map(|application| application.student_id)
            .collect();
        let jobs = self.store.find_jobs(&JobFilter::all().ids(job_ids))?;
        let students = self
            .store
            .find_users(&UserFilter::students().ids(student_ids))?;
        let jobs_by_id = index_by(&jobs, |job| job.id);
        let students_by_id = index_by(&students, |student| student.id);

        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for application in &selected {
            let (Some(job), Some(student)) = (
                jobs_by_id.get(&application.job_id),
                students_by_id.get(&application.student_id),
            ) else {
                continue;
            };
            let Some(amount) = job.salary_range.as_deref().and_then(leading_amount) else {
                continue;
            };
            grouped
                .entry(department_label(student))
                .or_default()
                .push(amount);
        }

        let mut rows: Vec<DepartmentSalary> = grouped
            .into_iter()
            .map(|(department, amounts)| {
                let total: f64 = amounts.iter().sum();
                DepartmentSalary {
                    department,
                    average_salary: total / amounts.len() as f64,
                    max_salary: amounts.iter().copied().fold(f64::MIN, f64::max),
                    min_salary: amounts.iter().copied().fold(f64::MAX, f64::min),
                    placement_count: amounts.len() as u64,
                }
            })
            .collect();
        rows.sort_by(|left, right| right.average_salary.total_cmp(&left.average_salary));
        Ok(rows)
    }
}
