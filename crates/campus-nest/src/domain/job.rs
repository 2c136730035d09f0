use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CompanyId, JobId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            industry: None,
            website: None,
            description: None,
        }
    }
}

/// Company reference copied into each job. The name is re-synced on company renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedCompany {
    #[serde(default)]
    pub id: Option<CompanyId>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    #[serde(default)]
    pub min_cgpa: f64,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub max_backlogs: i32,
}

impl Eligibility {
    pub fn requires_skill(&self, skill: &str) -> bool {
        self.skills
            .iter()
            .any(|required| required.eq_ignore_ascii_case(skill))
    }

    pub fn allows_course(&self, department: &str) -> bool {
        self.courses
            .iter()
            .any(|course| course.eq_ignore_ascii_case(department))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub company: EmbeddedCompany,
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
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub posted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn company_id(&self) -> Option<CompanyId> {
        self.company.id
    }

    pub fn is_accepting(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Open && self.application_deadline > now
    }
}
