use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{CompanyId, NotificationId, ResumeId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tpo,
    Rec,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tpo => "tpo",
            Self::Rec => "rec",
            Self::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "tpo" => Some(Self::Tpo),
            "rec" | "recruiter" => Some(Self::Rec),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Student placement flag. Only the stored label `Placed` counts as placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum PlacementStatus {
    Placed,
    #[default]
    Unplaced,
}

impl PlacementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Unplaced => "Unplaced",
        }
    }

    pub const fn ordered() -> [Self; 2] {
        [Self::Placed, Self::Unplaced]
    }

    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            Some("Placed") => Self::Placed,
            _ => Self::Unplaced,
        }
    }
}

impl<'de> Deserialize<'de> for PlacementStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::decode(raw.as_deref()))
    }
}

/// In-document notification record. Delivery beyond the user document is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            subject: subject.into(),
            message: message.into(),
            is_read: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub placed_status: PlacementStatus,
    /// Uploaded resumes, the first entry is the active one.
    #[serde(default)]
    pub resume_ids: Vec<ResumeId>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl User {
    pub fn new(
        role: Role,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            role,
            created_at,
            department: None,
            roll_number: None,
            cgpa: None,
            skills: Vec::new(),
            placed_status: PlacementStatus::Unplaced,
            resume_ids: Vec::new(),
            company_id: None,
            gender: None,
            graduation_year: None,
            notifications: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn active_resume(&self) -> Option<ResumeId> {
        self.resume_ids.first().copied()
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills
            .iter()
            .any(|owned| owned.eq_ignore_ascii_case(skill))
    }
}
