//! Derived statistics for the dashboard.
//!
//! Everything here is a pure function over a store's current list:
//! task completion figures and due-date classification, plus a
//! day-by-day view of the weekly schedule.

mod tasks;
mod week;

pub use tasks::{due_today, DueStatus, ProgressTier, TaskSummary};
pub use week::{DayPlan, WeekPlan};
