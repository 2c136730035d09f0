//! Placement analytics and coordination for campus recruitment drives.

pub mod analytics;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod drives;
pub mod error;
pub mod http;
pub mod reports;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::AnalyticsEngine;
pub use coordinator::Coordinator;
pub use drives::DriveService;
pub use error::{AppError, ServiceError};
pub use http::{api_router, ApiState};
pub use reports::ReportService;
pub use store::{EntityStore, InMemoryEntityStore};
