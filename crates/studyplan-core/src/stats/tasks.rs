//! Task completion statistics
//!
//! Completion rate is a whole percentage, rounded half-up, and 0 when
//! there are no tasks at all.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Completion figures over a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Number of tasks
    pub total: usize,
    /// Tasks marked completed
    pub completed: usize,
    /// Tasks not yet completed
    pub pending: usize,
    /// Completed share as a whole percentage (0 to 100)
    pub completion_rate: u32,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
        }
    }

    pub fn tier(&self) -> ProgressTier {
        ProgressTier::from_summary(self)
    }
}

/// Coarse progress band used to pick an encouragement message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTier {
    /// Every task done
    AllDone,
    /// 75% or more
    AlmostThere,
    /// 50% or more
    Halfway,
    /// 25% or more
    GoodStart,
    /// Above zero
    Started,
    /// Tasks exist but none are done
    NotStarted,
    /// The list is empty
    NoTasks,
}

impl ProgressTier {
    /// Band for `percent`; `has_tasks` separates an empty list from one
    /// with nothing completed yet.
    pub fn from_percent(percent: u32, has_tasks: bool) -> Self {
        match percent {
            100.. => ProgressTier::AllDone,
            75.. => ProgressTier::AlmostThere,
            50.. => ProgressTier::Halfway,
            25.. => ProgressTier::GoodStart,
            1.. => ProgressTier::Started,
            0 if has_tasks => ProgressTier::NotStarted,
            0 => ProgressTier::NoTasks,
        }
    }

    pub fn from_summary(summary: &TaskSummary) -> Self {
        Self::from_percent(summary.completion_rate, summary.total > 0)
    }

    pub fn message(&self) -> &'static str {
        match self {
            ProgressTier::AllDone => "Amazing job! All tasks completed! 🎉",
            ProgressTier::AlmostThere => "Great progress! Keep it up! 👍",
            ProgressTier::Halfway => "Halfway there! You're doing well! 💪",
            ProgressTier::GoodStart => "Good start! Keep working on those tasks! ✨",
            ProgressTier::Started => "You've made a start! Keep going! 🌱",
            ProgressTier::NotStarted => "Time to start working on your tasks! 📝",
            ProgressTier::NoTasks => "Add some tasks to get started! ✅",
        }
    }
}

/// Where a task stands relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Completed,
    /// Incomplete and due before today
    Overdue,
    DueToday,
    Upcoming,
}

impl DueStatus {
    pub fn classify(task: &Task, today: NaiveDate) -> Self {
        if task.completed {
            DueStatus::Completed
        } else if task.due_date < today {
            DueStatus::Overdue
        } else if task.due_date == today {
            DueStatus::DueToday
        } else {
            DueStatus::Upcoming
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DueStatus::Completed => "completed",
            DueStatus::Overdue => "overdue",
            DueStatus::DueToday => "due today",
            DueStatus::Upcoming => "upcoming",
        }
    }
}

/// Incomplete tasks due on `today`, in list order.
pub fn due_today(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| DueStatus::classify(t, today) == DueStatus::DueToday)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: i64, due: &str, completed: bool) -> Task {
        Task {
            id,
            user_id: "u1".into(),
            task_name: format!("task {id}"),
            due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
            completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_list_has_zero_rate() {
        let summary = TaskSummary::from_tasks(&[]);
        assert_eq!(summary, TaskSummary::default());
        assert_eq!(summary.tier(), ProgressTier::NoTasks);
    }

    #[test]
    fn rate_rounds_half_up() {
        // 1 of 8 = 12.5%
        let mut tasks: Vec<Task> = (0..8).map(|i| task(i, "2025-01-01", false)).collect();
        tasks[0].completed = true;
        assert_eq!(TaskSummary::from_tasks(&tasks).completion_rate, 13);

        // 2 of 3 = 66.67%
        let tasks = vec![
            task(1, "2025-01-01", true),
            task(2, "2025-01-01", true),
            task(3, "2025-01-01", false),
        ];
        let summary = TaskSummary::from_tasks(&tasks);
        assert_eq!(summary.completion_rate, 67);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.tier(), ProgressTier::Halfway);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(ProgressTier::from_percent(100, true), ProgressTier::AllDone);
        assert_eq!(ProgressTier::from_percent(75, true), ProgressTier::AlmostThere);
        assert_eq!(ProgressTier::from_percent(74, true), ProgressTier::Halfway);
        assert_eq!(ProgressTier::from_percent(25, true), ProgressTier::GoodStart);
        assert_eq!(ProgressTier::from_percent(1, true), ProgressTier::Started);
        assert_eq!(ProgressTier::from_percent(0, true), ProgressTier::NotStarted);
        assert_eq!(ProgressTier::from_percent(0, false), ProgressTier::NoTasks);
    }

    #[test]
    fn classify_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(DueStatus::classify(&task(1, "2025-03-09", false), today), DueStatus::Overdue);
        assert_eq!(DueStatus::classify(&task(2, "2025-03-10", false), today), DueStatus::DueToday);
        assert_eq!(DueStatus::classify(&task(3, "2025-03-11", false), today), DueStatus::Upcoming);
        assert_eq!(DueStatus::classify(&task(4, "2025-03-09", true), today), DueStatus::Completed);
    }

    #[test]
    fn due_today_skips_completed() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let tasks = vec![
            task(1, "2025-03-10", false),
            task(2, "2025-03-10", true),
            task(3, "2025-03-11", false),
        ];
        let ids: Vec<i64> = due_today(&tasks, today).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
