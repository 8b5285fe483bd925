//! Integration tests for the schedule store.
//!
//! Covers validation ordering, the per-subject aggregation, partial
//! updates and the day-ordering setting.

use std::sync::Arc;

use serde_json::json;
use studyplan_core::remote::MemoryBackend;
use studyplan_core::schedule::SCHEDULES_TABLE;
use studyplan_core::stats::WeekPlan;
use studyplan_core::{ClientError, Day, DayOrder, Identity, Phase, SchedulePatch, ScheduleStore, ValidationError};

fn u1() -> Identity {
    Identity::new("u1", None)
}

fn entry_row(id: i64, user: &str, day: &str, subject: &str, hours: f64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user,
        "day": day,
        "subject": subject,
        "study_hours": hours,
        "created_at": "2025-01-06T08:00:00Z"
    })
}

#[tokio::test]
async fn test_subject_hours_scenario() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(
        SCHEDULES_TABLE,
        [
            entry_row(1, "u1", "Monday", "Math", 2.0),
            entry_row(2, "u1", "Monday", "Math", 1.5),
        ],
    );

    let store = ScheduleStore::open(backend, Some(u1()), DayOrder::Calendar).await;

    let hours = store.subject_hours();
    assert_eq!(hours.len(), 1);
    assert_eq!(hours["Math"], 3.5);
    assert_eq!(store.total_hours(), 3.5);
}

#[tokio::test]
async fn test_subjects_are_matched_exactly() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(
        SCHEDULES_TABLE,
        [
            entry_row(1, "u1", "Monday", "Math", 2.0),
            entry_row(2, "u1", "Tuesday", "math", 1.0),
            entry_row(3, "u1", "Wednesday", "Math", 0.5),
        ],
    );

    let store = ScheduleStore::open(backend, Some(u1()), DayOrder::Calendar).await;
    let hours = store.subject_hours();
    assert_eq!(hours["Math"], 2.5);
    assert_eq!(hours["math"], 1.0);
}

#[tokio::test]
async fn test_add_validates_before_any_call() {
    let backend = Arc::new(MemoryBackend::new());
    let mut store = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;
    let calls = backend.calls();

    assert_eq!(
        store.add_schedule_item("", "Math", 2.0).await,
        Err(ClientError::Validation(ValidationError::DayRequired))
    );
    assert_eq!(
        store.add_schedule_item("Monday", "", 2.0).await,
        Err(ClientError::Validation(ValidationError::SubjectRequired))
    );
    assert_eq!(
        store.add_schedule_item("Monday", "Math", 0.0).await,
        Err(ClientError::Validation(ValidationError::HoursNotPositive))
    );
    assert_eq!(backend.calls(), calls);

    let entry = store.add_schedule_item("Monday", "Math", 2.0).await.unwrap();
    assert_eq!(entry.study_hours, 2.0);
    assert_eq!(entry.day, Day::Monday);
    assert_eq!(store.entries(), &[entry]);
}

#[tokio::test]
async fn test_add_without_identity_is_rejected_first() {
    let backend = Arc::new(MemoryBackend::new());
    let mut store = ScheduleStore::new(Arc::clone(&backend), None);

    // The identity check wins over the invalid arguments.
    assert_eq!(
        store.add_schedule_item("", "", 0.0).await,
        Err(ClientError::NotAuthenticated)
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_update_merges_patch() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(SCHEDULES_TABLE, [entry_row(7, "u1", "Tuesday", "Physics", 1.0)]);
    let mut store = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;

    let patch = SchedulePatch {
        study_hours: Some(2.5),
        ..SchedulePatch::default()
    };
    let updated = store.update_schedule_item(7, patch).await.unwrap().unwrap();

    assert_eq!(updated.study_hours, 2.5);
    assert_eq!(updated.subject, "Physics");
    assert_eq!(store.entries()[0].study_hours, 2.5);
    assert_eq!(store.entries()[0].day, Day::Tuesday);
    assert_eq!(backend.rows(SCHEDULES_TABLE)[0]["study_hours"], json!(2.5));
}

#[tokio::test]
async fn test_failed_delete_keeps_entry() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(SCHEDULES_TABLE, [entry_row(3, "u1", "Friday", "History", 1.0)]);
    let mut store = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;

    backend.fail_next("permission denied for table schedules");
    let err = store.delete_schedule_item(3).await.unwrap_err();

    assert_eq!(err.to_string(), "permission denied for table schedules");
    assert_eq!(store.entries().len(), 1);
    assert_eq!(store.error(), Some("permission denied for table schedules"));
}

#[tokio::test]
async fn test_delete_of_unknown_id_is_harmless() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(SCHEDULES_TABLE, [entry_row(3, "u1", "Friday", "History", 1.0)]);
    let mut store = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;

    store.delete_schedule_item(99).await.unwrap();
    assert_eq!(store.entries().len(), 1);
}

#[tokio::test]
async fn test_day_order_setting() {
    let rows = [
        entry_row(1, "u1", "Saturday", "Art", 1.0),
        entry_row(2, "u1", "Monday", "Math", 1.0),
        entry_row(3, "u1", "Friday", "Music", 1.0),
    ];

    let backend = Arc::new(MemoryBackend::new());
    backend.seed(SCHEDULES_TABLE, rows.clone());
    let calendar = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;
    let ids: Vec<i64> = calendar.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    let stored = ScheduleStore::open(backend, Some(u1()), DayOrder::Stored).await;
    let ids: Vec<i64> = stored.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_sign_out_clears_without_fetch() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(SCHEDULES_TABLE, [entry_row(1, "u1", "Monday", "Math", 2.0)]);
    let mut store = ScheduleStore::open(Arc::clone(&backend), Some(u1()), DayOrder::Calendar).await;
    let calls = backend.calls();

    store.set_identity(None).await;

    assert!(store.entries().is_empty());
    assert_eq!(store.phase(), Phase::Idle);
    assert_eq!(store.total_hours(), 0.0);
    assert_eq!(backend.calls(), calls);
}

#[tokio::test]
async fn test_week_plan_from_store() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(
        SCHEDULES_TABLE,
        [
            entry_row(1, "u1", "Monday", "Math", 2.0),
            entry_row(2, "u1", "Thursday", "Biology", 1.5),
            entry_row(3, "u1", "Monday", "Physics", 1.0),
        ],
    );
    let store = ScheduleStore::open(backend, Some(u1()), DayOrder::Calendar).await;

    let week = WeekPlan::from_entries(store.entries());
    assert_eq!(week.day(Day::Monday).total_hours, 3.0);
    assert_eq!(week.day(Day::Thursday).entries.len(), 1);
    assert_eq!(week.total_hours, 4.5);
}
