use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{Application, ApplicationStatus, CompanyId, Job, JobId, User, UserId};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, JobFilter, ResumeFilter, UserFilter};

use super::pipeline::{count_by, index_by, rate, round_to, top_n, CgpaBand, TrendInterval};
use super::placement::department_label;
use super::AnalyticsEngine;

const TOP_SKILLS: usize = 5;
const TOP_DEPARTMENTS: usize = 5;
const VELOCITY_DAYS: usize = 7;
const UPLOAD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterStats {
    pub company_id: CompanyId,
    pub cgpa_bands: Vec<BandCount>,
    pub top_departments: Vec<DepartmentCount>,
    pub funnel: Funnel,
    pub availability: BTreeMap<&'static str, u64>,
    pub skill_fit: Vec<SkillFit>,
    pub application_velocity: Vec<DailyCount>,
    pub pipeline_aging: PipelineAging,
    pub resume_recency: ResumeRecency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub band: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funnel {
    pub total: u64,
    pub series: Vec<FunnelStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub status: ApplicationStatus,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillFit {
    pub skill: String,
    pub jobs_requesting: u64,
    pub applicants_applied: u64,
    pub applicants_having_skill: u64,
    pub match_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineAging {
    pub stale7: u64,
    pub stale14: u64,
    pub stale30: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecency {
    pub total_resumes: u64,
    pub parsed_complete: u64,
    pub parsed_complete_pct: f64,
    pub recent_uploads: Vec<DailyCount>,
}

/// Percentages keep two decimals.
pub fn funnel(applications: &[Application]) -> Funnel {
    let counts = count_by(applications, |application| application.status);
    let total = applications.len() as u64;
    let series = ApplicationStatus::ordered()
        .into_iter()
        .map(|status| {
            let count = counts.get(&status).copied().unwrap_or(0);
            FunnelStage {
                status,
                count,
                percent: round_to(rate(count, total), 2),
            }
        })
        .collect();
    Funnel { total, series }
}

/// Top requested skills across the company's jobs. For each skill, `applicantsApplied`
/// counts applications to jobs requiring it and `applicantsHavingSkill` is the subset
/// whose student lists the skill, so the match rate stays within 0-100.
pub fn skill_fit(
    jobs: &[Job],
    applications: &[Application],
    students: &HashMap<UserId, &User>,
) -> Vec<SkillFit> {
    let mut requesting: BTreeMap<String, u64> = BTreeMap::new();
    let mut display: HashMap<String, String> = HashMap::new();
    for job in jobs {
        let distinct: BTreeSet<String> = job
            .eligibility
            .skills
            .iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .collect();
        for skill in distinct {
            let key = skill.to_ascii_lowercase();
            display.entry(key.clone()).or_insert(skill);
            *requesting.entry(key).or_insert(0) += 1;
        }
    }

    top_n(requesting, TOP_SKILLS)
        .into_iter()
        .map(|(key, jobs_requesting)| {
            let skill_jobs: BTreeSet<JobId> = jobs
                .iter()
                .filter(|job| job.eligibility.requires_skill(&key))
                .map(|job| job.id)
                .collect();
            let applied: Vec<&Application> = applications
                .iter()
                .filter(|application| skill_jobs.contains(&application.job_id))
                .collect();
            let having = applied
                .iter()
                .filter(|application| {
                    students
                        .get(&application.student_id)
                        .is_some_and(|student| student.has_skill(&key))
                })
                .count() as u64;
            let applicants_applied = applied.len() as u64;

            SkillFit {
                skill: display.get(&key).cloned().unwrap_or(key),
                jobs_requesting,
                applicants_applied,
                applicants_having_skill: having,
                match_rate: round_to(rate(having, applicants_applied), 2),
            }
        })
        .collect()
}

pub fn pipeline_aging(applications: &[Application], now: DateTime<Utc>) -> PipelineAging {
    let open: Vec<&Application> = applications
        .iter()
        .filter(|application| !application.status.is_terminal())
        .collect();
    let stale = |days: i64| {
        let cutoff = now - Duration::days(days);
        open.iter()
            .filter(|application| application.updated_on < cutoff)
            .count() as u64
    };
    PipelineAging {
        stale7: stale(7),
        stale14: stale(14),
        stale30: stale(30),
    }
}

fn daily(counts: BTreeMap<String, u64>) -> Vec<DailyCount> {
    counts
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

impl<S: EntityStore> AnalyticsEngine<S> {
    pub fn recruiter_stats(
        &self,
        recruiter_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<RecruiterStats, ServiceError> {
        let recruiter = self
            .store
            .find_user(recruiter_id)?
            .ok_or_else(|| ServiceError::not_found("Recruiter not found"))?;
        let company_id = recruiter
            .company_id
            .ok_or_else(|| ServiceError::validation("No company associated"))?;

        let jobs = self.store.find_jobs(&JobFilter::for_company(company_id))?;
        let job_ids: Vec<JobId> = jobs.iter().map(|job| job.id).collect();
        let applications = if job_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .find_applications(&ApplicationFilter::for_jobs(job_ids.clone()))?
        };

        let student_ids: Vec<UserId> = applications
            .iter()
            .map(|application| application.student_id)
            .collect();
        let students = if student_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .find_users(&UserFilter::default().ids(student_ids))?
        };
        let students_by_id = index_by(&students, |student| student.id);
        let applicants: Vec<&User> = applications
            .iter()
            .filter_map(|application| students_by_id.get(&application.student_id).copied())
            .collect();

        let bands = count_by(applicants.iter().copied(), |student| {
            CgpaBand::for_cgpa(student.cgpa)
        });
        let cgpa_bands = bands
            .into_iter()
            .map(|(band, count)| BandCount {
                band: band.label(),
                count,
            })
            .collect();

        let top_departments = top_n(
            count_by(applicants.iter().copied(), department_label),
            TOP_DEPARTMENTS,
        )
        .into_iter()
        .map(|(department, count)| DepartmentCount { department, count })
        .collect();

        let availability = count_by(applicants.iter().copied(), |student| {
            student.placed_status.label()
        });

        let mut per_day = count_by(&applications, |application| {
            TrendInterval::Day.period_key(application.applied_on)
        });
        while per_day.len() > VELOCITY_DAYS {
            per_day.pop_first();
        }

        let resume_recency = self.resume_recency(&job_ids, now)?;

        debug!(
            %company_id,
            jobs = jobs.len(),
            applications = applications.len(),
            "recruiter stats aggregated"
        );

        Ok(RecruiterStats {
            company_id,
            cgpa_bands,
            top_departments,
            funnel: funnel(&applications),
            availability,
            skill_fit: skill_fit(&jobs, &applications, &students_by_id),
            application_velocity: daily(per_day),
            pipeline_aging: pipeline_aging(&applications, now),
            resume_recency,
        })
    }

    fn resume_recency(
        &self,
        job_ids: &[JobId],
        now: DateTime<Utc>,
    ) -> Result<ResumeRecency, ServiceError> {
        if job_ids.is_empty() {
            return Ok(ResumeRecency {
                total_resumes: 0,
                parsed_complete: 0,
                parsed_complete_pct: 0.0,
                recent_uploads: Vec::new(),
            });
        }

        let resume_ids = self
            .store
            .distinct_resume_ids(&ApplicationFilter::for_jobs(job_ids.to_vec()))?;
        let total_resumes = resume_ids.len() as u64;
        let resumes = if resume_ids.is_empty() {
            Vec::new()
        } else {
            self.store.find_resumes(&ResumeFilter::ids(resume_ids))?
        };

        let parsed_complete = resumes.iter().filter(|resume| resume.is_parsed()).count() as u64;
        let window_start = now - Duration::days(UPLOAD_WINDOW_DAYS);
        let uploads = count_by(
            resumes
                .iter()
                .filter(|resume| resume.uploaded_at >= window_start),
            |resume| TrendInterval::Day.period_key(resume.uploaded_at),
        );

        Ok(ResumeRecency {
            total_resumes,
            parsed_complete,
            parsed_complete_pct: rate(parsed_complete, total_resumes),
            recent_uploads: daily(uploads),
        })
    }
}
