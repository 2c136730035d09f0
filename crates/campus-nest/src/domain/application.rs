use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ApplicationId, JobId, ResumeId, UserId};

/// Application lifecycle. `offered` is a legacy stored label for `selected`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    #[serde(alias = "")]
    Applied,
    Shortlisted,
    Interviewed,
    #[serde(alias = "offered")]
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Shortlisted => "shortlisted",
            Self::Interviewed => "interviewed",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
        }
    }

    /// Funnel order.
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Applied,
            Self::Shortlisted,
            Self::Interviewed,
            Self::Selected,
            Self::Rejected,
        ]
    }

    /// Parses a request-supplied status after lowercasing. The legacy label is not accepted here.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == normalized)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selected | Self::Rejected)
    }

    pub fn valid_labels() -> String {
        Self::ordered()
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: UserId,
    #[serde(default)]
    pub resume_id: Option<ResumeId>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub applied_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Application {
    pub fn new(
        job_id: JobId,
        student_id: UserId,
        resume_id: Option<ResumeId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            job_id,
            student_id,
            resume_id,
            status: ApplicationStatus::Applied,
            applied_on: now,
            updated_on: now,
            remarks: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: ResumeId,
    pub student_id: UserId,
    #[serde(default)]
    pub resume_name: Option<String>,
    pub file_url: String,
    #[serde(default)]
    pub parsed_data: Option<ParsedResume>,
    pub uploaded_at: DateTime<Utc>,
}

impl Resume {
    pub fn parsed_skills(&self) -> &[String] {
        self.parsed_data
            .as_ref()
            .map(|parsed| parsed.skills.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_parsed(&self) -> bool {
        !self.parsed_skills().is_empty()
    }
}
