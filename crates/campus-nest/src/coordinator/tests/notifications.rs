use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::common::RecordingStore;
use crate::coordinator::{Announcement, Coordinator, DirectNotification, ReadMarker};
use crate::domain::{Role, User, UserId};
use crate::error::ServiceError;
use crate::store::EntityStore;
use crate::test_support::{add_user, at, now, recruiter, staff, student};

fn campus() -> (Arc<RecordingStore>, Vec<User>) {
    let store = Arc::new(RecordingStore::default());
    let students = ["Asha", "Bilal"]
        .into_iter()
        .map(|first| add_user(store.as_ref(), student(first, "CS", 8.0)))
        .collect();
    (store, students)
}

fn direct(ids: Vec<String>) -> DirectNotification {
    DirectNotification {
        subject: "Pre-placement talk".to_string(),
        message: "Auditorium at 10".to_string(),
        student_ids: ids,
    }
}

#[test]
fn direct_send_flags_partial_delivery() {
    let (store, students) = campus();
    let tpo = add_user(store.as_ref(), staff(Role::Tpo, "Tara"));
    let coordinator = Coordinator::new(store.clone());

    let outcome = coordinator
        .send_direct(
            direct(vec![students[0].id.to_string(), tpo.id.to_string()]),
            now(),
        )
        .expect("sent");

    assert!(outcome.partial);
    assert_eq!(outcome.recipients_count, 1);
    assert_eq!(outcome.requested_count, 2);
    assert!(outcome.warning.is_some());

    let full = coordinator
        .send_direct(direct(vec![students[1].id.to_string()]), now())
        .expect("sent");
    assert!(!full.partial);
    assert_eq!(full.message, "Notification sent successfully");
}

#[test]
fn repeated_ids_count_once_toward_the_request() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());
    let id = students[0].id.to_string();

    let outcome = coordinator
        .send_direct(direct(vec![id.clone(), format!(" {id} ")]), now())
        .expect("sent");

    assert!(!outcome.partial);
    assert_eq!(outcome.requested_count, 1);
    assert_eq!(outcome.recipients_count, 1);
    assert!(outcome.warning.is_none());

    let preview = coordinator
        .preview(direct(vec![id.clone(), id]))
        .expect("preview");
    assert_eq!(preview.requested_count, 1);
}

#[test]
fn direct_send_validates_ids_before_writing() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());

    let err = coordinator
        .send_direct(direct(Vec::new()), now())
        .expect_err("no ids");
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = coordinator
        .send_direct(
            direct(vec![students[0].id.to_string(), "bogus".to_string()]),
            now(),
        )
        .expect_err("bad id");
    assert_eq!(err.to_string(), "Invalid student ID format: bogus");
    assert_eq!(store.push_count(), 0);
}

#[test]
fn preview_counts_recipients_without_writing() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());

    let preview = coordinator
        .preview(direct(vec![
            students[0].id.to_string(),
            UserId::new().to_string(),
        ]))
        .expect("preview");

    assert_eq!(preview.recipient_count, 1);
    assert_eq!(preview.requested_count, 2);
    assert_eq!(preview.students[0].email, students[0].email);
    assert_eq!(store.push_count(), 0);
}

#[test]
fn announcement_reaches_students_and_tpos_only() {
    let (store, _) = campus();
    add_user(store.as_ref(), staff(Role::Tpo, "Tara"));
    let rec = add_user(store.as_ref(), recruiter("Rhea", None));
    let coordinator = Coordinator::new(store.clone());

    let outcome = coordinator
        .announce(
            Announcement {
                subject: "Holiday".to_string(),
                message: "Campus closed Friday".to_string(),
            },
            now(),
        )
        .expect("announced");

    assert_eq!(outcome.recipients_count, 3);
    let rec = store.find_user(rec.id).expect("lookup").expect("recruiter");
    assert!(rec.notifications.is_empty());
}

#[test]
fn announcement_without_audience_is_an_error() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = Coordinator::new(store);
    let err = coordinator
        .announce(
            Announcement {
                subject: "Holiday".to_string(),
                message: "Campus closed".to_string(),
            },
            now(),
        )
        .expect_err("nobody to notify");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test]
fn history_groups_recipients_newest_first() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());
    let everyone = students.iter().map(|s| s.id.to_string()).collect();

    coordinator
        .send_direct(direct(everyone), at(5))
        .expect("first send");
    let mut later = direct(vec![students[0].id.to_string()]);
    later.subject = "Results".to_string();
    coordinator.send_direct(later, at(9)).expect("second send");

    let history = coordinator.history().expect("history");
    assert_eq!(history.total, 2);
    assert_eq!(history.notifications[0].subject, "Results");
    assert_eq!(history.notifications[0].recipient_count, 1);
    assert_eq!(history.notifications[1].recipient_count, 2);
}

#[test]
fn recruiter_notifications_require_recruiter_role() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());
    let err = coordinator
        .recruiter_notifications(students[0].id)
        .expect_err("student is not a recruiter");
    assert_eq!(err.to_string(), "Recruiter not found");
}

#[tokio::test]
async fn listing_returns_stored_flags_then_marks_read_in_background() {
    let (store, students) = campus();
    let coordinator = Coordinator::new(store.clone());
    coordinator
        .send_direct(direct(vec![students[0].id.to_string()]), now())
        .expect("sent");

    let first = coordinator
        .student_notifications(students[0].id)
        .expect("list");
    assert_eq!(first.count, 1);
    assert!(!first.notifications[0].is_read);

    // The listing itself never flips flags; only the scheduled task does.
    let second = coordinator
        .student_notifications(students[0].id)
        .expect("list");
    assert!(!second.notifications[0].is_read);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let marker = ReadMarker::new(store.clone(), Duration::from_secs(5), shutdown_rx);
    let changed = marker
        .schedule(students[0].id)
        .await
        .expect("task joined");
    assert_eq!(changed, Some(1));

    let after = coordinator
        .student_notifications(students[0].id)
        .expect("list");
    assert!(after.notifications[0].is_read);
}

#[tokio::test]
async fn shutdown_signal_cancels_pending_mark_read() {
    let (store, students) = campus();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).expect("receiver alive");

    let marker = ReadMarker::new(store, Duration::from_secs(5), shutdown_rx);
    let outcome = marker
        .schedule(students[0].id)
        .await
        .expect("task joined");
    assert_eq!(outcome, None);
}

#[test]
fn student_list_rejects_non_students() {
    let (store, _) = campus();
    let tpo = add_user(store.as_ref(), staff(Role::Tpo, "Tara"));
    let coordinator = Coordinator::new(store);
    let err = coordinator
        .student_notifications(tpo.id)
        .expect_err("not a student");
    assert_eq!(err.to_string(), "Student not found");
}
