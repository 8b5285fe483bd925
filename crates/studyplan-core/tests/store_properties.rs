//! Property tests for the stores and the derived statistics.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use serde_json::json;
use studyplan_core::remote::MemoryBackend;
use studyplan_core::schedule::{Day, SCHEDULES_TABLE};
use studyplan_core::stats::TaskSummary;
use studyplan_core::task::Task;
use studyplan_core::{DayOrder, Identity, ScheduleStore, TaskStore};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn owner() -> Identity {
    Identity::new("u1", None)
}

fn arb_day() -> impl Strategy<Value = Day> {
    prop::sample::select(Day::ALL.to_vec())
}

fn arb_entry() -> impl Strategy<Value = (Day, &'static str, f64)> {
    (
        arb_day(),
        prop::sample::select(vec!["Math", "math", "Physics", "History ", "Art"]),
        // Half-hour steps keep the sums exact.
        (1u32..=48).prop_map(|halves| f64::from(halves) / 2.0),
    )
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

proptest! {
    #[test]
    fn add_task_appends_one_incomplete_entry(
        name in "[A-Za-z][A-Za-z0-9 ]{0,30}",
        offset in 0i64..365,
    ) {
        let due = base_date() + Duration::days(offset);
        block_on(async {
            let backend = Arc::new(MemoryBackend::new());
            let mut store = TaskStore::open(backend, Some(owner())).await;
            let before = store.tasks().len();

            store.add_task(&name, due).await.unwrap();

            prop_assert_eq!(store.tasks().len(), before + 1);
            let added = store.tasks().last().unwrap();
            prop_assert!(!added.completed);
            prop_assert_eq!(added.task_name.as_str(), name.trim());
            prop_assert_eq!(added.due_date, due);
            Ok(())
        })?;
    }

    #[test]
    fn toggling_twice_restores_completion(initial in any::<bool>()) {
        block_on(async {
            let backend = Arc::new(MemoryBackend::new());
            backend.seed("tasks", [json!({
                "user_id": "u1",
                "task_name": "Essay",
                "due_date": "2025-03-01",
                "completed": initial,
                "created_at": "2025-01-01T00:00:00Z"
            })]);
            let mut store = TaskStore::open(Arc::clone(&backend), Some(owner())).await;
            let id = store.tasks()[0].id;

            let current = store.tasks()[0].completed;
            store.toggle_completion(id, current).await.unwrap();
            let current = store.tasks()[0].completed;
            store.toggle_completion(id, current).await.unwrap();

            prop_assert_eq!(store.tasks()[0].completed, initial);
            let rows = backend.rows("tasks");
            prop_assert_eq!(&rows[0]["completed"], &json!(initial));
            Ok(())
        })?;
    }

    #[test]
    fn subject_hours_sums_exact_matches(entries in prop::collection::vec(arb_entry(), 0..20)) {
        block_on(async {
            let backend = Arc::new(MemoryBackend::new());
            backend.seed(
                SCHEDULES_TABLE,
                entries.iter().map(|(day, subject, hours)| json!({
                    "user_id": "u1",
                    "day": day.as_str(),
                    "subject": subject,
                    "study_hours": hours,
                    "created_at": "2025-01-01T00:00:00Z"
                })),
            );
            let store = ScheduleStore::open(backend, Some(owner()), DayOrder::Calendar).await;

            let totals = store.subject_hours();
            for (subject, total) in &totals {
                let expected: f64 = entries
                    .iter()
                    .filter(|(_, s, _)| *s == subject.as_str())
                    .map(|(_, _, h)| h)
                    .sum();
                prop_assert_eq!(*total, expected);
            }
            let distinct: std::collections::HashSet<&str> =
                entries.iter().map(|(_, s, _)| *s).collect();
            prop_assert_eq!(totals.len(), distinct.len());

            let all: f64 = entries.iter().map(|(_, _, h)| h).sum();
            prop_assert_eq!(store.total_hours(), all);
            Ok(())
        })?;
    }

    #[test]
    fn summary_counts_are_consistent(flags in prop::collection::vec(any::<bool>(), 0..50)) {
        let tasks: Vec<Task> = flags
            .iter()
            .enumerate()
            .map(|(i, &completed)| Task {
                id: i as i64 + 1,
                user_id: "u1".into(),
                task_name: format!("task {i}"),
                due_date: base_date(),
                completed,
                created_at: Utc::now(),
            })
            .collect();

        let summary = TaskSummary::from_tasks(&tasks);
        prop_assert_eq!(summary.completed + summary.pending, summary.total);
        prop_assert!(summary.completion_rate <= 100);
        if summary.total > 0 && summary.completed == summary.total {
            prop_assert_eq!(summary.completion_rate, 100);
        }
        if summary.completed == 0 {
            prop_assert_eq!(summary.completion_rate, 0);
        }
    }
}
