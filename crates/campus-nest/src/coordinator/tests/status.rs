use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::common::RecordingStore;
use crate::coordinator::{BulkStatusBody, Coordinator, ItemOutcome, SingleStatusUpdate, StatusUpdateItem};
use crate::domain::{ApplicationStatus, Job, JobId, User, UserId};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore};
use crate::test_support::{add_company, add_job, add_user, apply, at, job, now, recruiter, student};

struct Hiring {
    store: Arc<RecordingStore>,
    recruiter: User,
    job: Job,
    students: Vec<User>,
}

fn hiring() -> Hiring {
    let store = Arc::new(RecordingStore::default());
    let acme = add_company(store.as_ref(), "Acme");
    let recruiter = add_user(store.as_ref(), recruiter("Rhea", Some(acme.id)));
    let job = add_job(store.as_ref(), job(&acme, "Data Analyst", at(2)));
    let students: Vec<User> = ["Asha", "Bilal", "Chen"]
        .into_iter()
        .map(|first| add_user(store.as_ref(), student(first, "CS", 8.1)))
        .collect();
    for student in &students {
        apply(store.as_ref(), job.id, student.id, at(3));
    }
    Hiring {
        store,
        recruiter,
        job,
        students,
    }
}

fn item(student: impl ToString, status: &str) -> StatusUpdateItem {
    StatusUpdateItem {
        student_id: student.to_string(),
        status: status.to_string(),
        remarks: None,
    }
}

fn status_of(store: &RecordingStore, job: JobId, student: UserId) -> ApplicationStatus {
    store
        .find_applications(&ApplicationFilter::for_student(student))
        .expect("applications")
        .into_iter()
        .find(|application| application.job_id == job)
        .expect("application exists")
        .status
}

#[test]
fn mixed_batch_reports_inline_failures_and_groups_notifications() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());
    let outsider = UserId::new();

    let summary = coordinator
        .bulk_update(
            world.recruiter.id,
            world.job.id,
            vec![
                item(world.students[0].id, "Shortlisted"),
                item(world.students[1].id, "shortlisted"),
                item(outsider, "rejected"),
            ],
            now(),
        )
        .expect("batch accepted");

    assert_eq!(summary.total_updates, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.results[2].status, ItemOutcome::Failed);
    assert_eq!(
        summary.results[2].error.as_deref(),
        Some("Application not found or update failed")
    );
    assert_eq!(summary.notifications_sent, 2);
    assert_eq!(world.store.push_count(), 1);
    assert_eq!(
        world.store.pushed_subjects(),
        vec!["Congratulations! You've been shortlisted".to_string()]
    );
    assert_eq!(summary.job.company, "Acme");
    assert_eq!(summary.updated_by.recruiter_name, "Rhea Recruiter");
    assert_eq!(
        status_of(&world.store, world.job.id, world.students[0].id),
        ApplicationStatus::Shortlisted
    );
}

#[test]
fn invalid_status_rejects_batch_before_any_write() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());

    let err = coordinator
        .bulk_update(
            world.recruiter.id,
            world.job.id,
            vec![
                item(world.students[0].id, "selected"),
                item(world.students[1].id, "hired"),
            ],
            now(),
        )
        .expect_err("invalid status");

    match err {
        ServiceError::Validation(message) => {
            assert!(message.contains("hired"));
            assert!(message.contains("applied, shortlisted, interviewed, selected, rejected"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(world.store.status_writes.load(Ordering::SeqCst), 0);
    assert_eq!(world.store.push_count(), 0);
}

#[test]
fn malformed_student_id_fails_only_that_item() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());

    let summary = coordinator
        .bulk_update(
            world.recruiter.id,
            world.job.id,
            vec![item("not-an-id", "selected"), item(world.students[2].id, "SELECTED")],
            now(),
        )
        .expect("batch accepted");

    assert_eq!(summary.results[0].error.as_deref(), Some("Invalid student ID"));
    assert_eq!(summary.results[1].new_status, Some(ApplicationStatus::Selected));
    assert_eq!(summary.success_count + summary.failed_count, 2);
}

#[test]
fn applied_transitions_push_nothing() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());

    let summary = coordinator
        .bulk_update(
            world.recruiter.id,
            world.job.id,
            vec![item(world.students[0].id, "applied")],
            now(),
        )
        .expect("batch accepted");

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(world.store.push_count(), 0);
}

#[test]
fn failed_push_keeps_committed_updates() {
    let world = hiring();
    world.store.fail_pushes.store(true, Ordering::SeqCst);
    let coordinator = Coordinator::new(world.store.clone());

    let summary = coordinator
        .bulk_update(
            world.recruiter.id,
            world.job.id,
            vec![item(world.students[1].id, "interviewed")],
            now(),
        )
        .expect("batch accepted");

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(world.store.push_count(), 1);
    assert_eq!(
        status_of(&world.store, world.job.id, world.students[1].id),
        ApplicationStatus::Interviewed
    );
}

#[test]
fn empty_batch_is_rejected() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());
    let err = coordinator
        .bulk_update(world.recruiter.id, world.job.id, Vec::new(), now())
        .expect_err("empty batch");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn job_of_another_company_is_not_accessible() {
    let world = hiring();
    let rival = add_company(world.store.as_ref(), "Rival");
    let rival_job = add_job(world.store.as_ref(), job(&rival, "SDE", at(2)));
    let coordinator = Coordinator::new(world.store.clone());

    let err = coordinator
        .bulk_update(
            world.recruiter.id,
            rival_job.id,
            vec![item(world.students[0].id, "selected")],
            now(),
        )
        .expect_err("foreign job");
    match err {
        ServiceError::NotFound(message) => assert_eq!(message, "Job not found or not accessible"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn recruiter_without_company_cannot_update() {
    let world = hiring();
    let loner = add_user(world.store.as_ref(), recruiter("Lone", None));
    let coordinator = Coordinator::new(world.store.clone());

    let err = coordinator
        .bulk_update(
            loner.id,
            world.job.id,
            vec![item(world.students[0].id, "selected")],
            now(),
        )
        .expect_err("no company");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn compact_and_wrapped_bodies_decode_to_the_same_items() {
    let compact: BulkStatusBody =
        serde_json::from_str(r#"[{"id":"abc","status":"Selected","remarks":"strong"}]"#)
            .expect("compact body");
    let wrapped: BulkStatusBody = serde_json::from_str(
        r#"{"updates":[{"studentId":"abc","status":"Selected","remarks":"strong"}]}"#,
    )
    .expect("wrapped body");
    assert_eq!(compact.into_updates(), wrapped.into_updates());
}

#[test]
fn single_update_returns_joined_view_and_sends_nothing() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());
    let target = &world.students[0];

    let result = coordinator
        .update_single(
            world.recruiter.id,
            &target.id.to_string(),
            SingleStatusUpdate {
                job_id: world.job.id.to_string(),
                status: "Interviewed".to_string(),
                remarks: Some("panel round".to_string()),
            },
            now(),
        )
        .expect("updated");

    assert_eq!(result.application.status, ApplicationStatus::Interviewed);
    assert_eq!(result.application.remarks.as_deref(), Some("panel round"));
    assert_eq!(result.application.updated_on, now());
    let student = result.application.student.expect("student joined");
    assert_eq!(student.email, target.email);
    assert_eq!(result.updated_by.company.as_deref(), Some("Acme"));
    assert_eq!(world.store.push_count(), 0);
}

#[test]
fn single_update_rejects_malformed_ids() {
    let world = hiring();
    let coordinator = Coordinator::new(world.store.clone());

    let err = coordinator
        .update_single(
            world.recruiter.id,
            "nope",
            SingleStatusUpdate {
                job_id: world.job.id.to_string(),
                status: "selected".to_string(),
                remarks: None,
            },
            now(),
        )
        .expect_err("bad student id");
    assert_eq!(err.to_string(), "Invalid student ID");

    let err = coordinator
        .update_single(
            world.recruiter.id,
            &world.students[0].id.to_string(),
            SingleStatusUpdate {
                job_id: "nope".to_string(),
                status: "selected".to_string(),
                remarks: None,
            },
            now(),
        )
        .expect_err("bad job id");
    assert_eq!(err.to_string(), "Invalid job ID");
}

#[test]
fn single_update_without_application_is_not_found() {
    let world = hiring();
    let stranger = add_user(world.store.as_ref(), student("Dev", "EE", 7.0));
    let coordinator = Coordinator::new(world.store.clone());

    let err = coordinator
        .update_single(
            world.recruiter.id,
            &stranger.id.to_string(),
            SingleStatusUpdate {
                job_id: world.job.id.to_string(),
                status: "selected".to_string(),
                remarks: None,
            },
            now(),
        )
        .expect_err("no application");
    assert_eq!(err.to_string(), "Application not found");
}
