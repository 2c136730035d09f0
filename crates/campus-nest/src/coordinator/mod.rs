//! Application status transitions and the notifications they fan out to.

pub mod notifications;
pub mod status;
pub mod templates;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::store::EntityStore;

pub use notifications::{
    Announcement, AnnouncementOutcome, DirectNotification, NotificationHistory, NotificationList,
    NotificationPreview, ReadMarker, RecruiterNotifications, SendOutcome,
};
pub use status::{
    BulkStatusBody, BulkStatusSummary, ItemOutcome, ItemResult, SingleStatusResult,
    SingleStatusUpdate, StatusUpdateItem,
};
pub use templates::{status_template, StatusTemplate};

/// Write-side service over the entity store.
pub struct Coordinator<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> Coordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}
