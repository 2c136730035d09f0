//! Entities shared by the analytics, coordination, and reporting layers.

pub mod application;
pub mod ids;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationStatus, ParsedResume, Resume};
pub use ids::{ApplicationId, CompanyId, JobId, NotificationId, ResumeId, UserId};
pub use job::{Company, Eligibility, EmbeddedCompany, Job, JobStatus};
pub use user::{Notification, PlacementStatus, Role, User};
