use serde::Serialize;

use crate::schedule::{Day, ScheduleEntry};

/// Entries planned for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub day: Day,
    pub entries: Vec<ScheduleEntry>,
    pub total_hours: f64,
}

/// The week laid out Monday through Sunday. Days without entries are
/// still present, with no entries and zero hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPlan {
    pub days: Vec<DayPlan>,
    pub total_hours: f64,
}

impl WeekPlan {
    pub fn from_entries(entries: &[ScheduleEntry]) -> Self {
        let mut days: Vec<DayPlan> = Day::ALL
            .iter()
            .map(|&day| DayPlan {
                day,
                entries: Vec::new(),
                total_hours: 0.0,
            })
            .collect();

        for entry in entries {
            let plan = &mut days[entry.day.index()];
            plan.total_hours += entry.study_hours;
            plan.entries.push(entry.clone());
        }

        let total_hours = days.iter().map(|d| d.total_hours).sum();
        Self { days, total_hours }
    }

    pub fn day(&self, day: Day) -> &DayPlan {
        &self.days[day.index()]
    }

    /// Days with at least one entry.
    pub fn busy_days(&self) -> impl Iterator<Item = &DayPlan> {
        self.days.iter().filter(|d| !d.entries.is_empty())
    }
}
