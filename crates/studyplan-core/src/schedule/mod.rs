//! Weekly study schedule: hours per subject per weekday.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Remote table holding schedule entries.
pub const SCHEDULES_TABLE: &str = "schedules";

pub const SUBJECT_MAX_LEN: usize = 50;
pub const MIN_STUDY_HOURS: f64 = 0.5;
pub const MAX_STUDY_HOURS: f64 = 24.0;

/// Day of the week, stored by its English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Calendar order, Monday first.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    /// Position in the week, Monday = 0.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::DayRequired);
        }
        Day::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidDay(trimmed.to_string()))
    }
}

/// A schedule row as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub user_id: String,
    pub day: Day,
    pub subject: String,
    pub study_hours: f64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the service assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewScheduleEntry {
    pub user_id: String,
    pub day: Day,
    pub subject: String,
    pub study_hours: f64,
    pub created_at: DateTime<Utc>,
}

impl NewScheduleEntry {
    /// Validate in order: day, subject, hours. Only `hours > 0` is
    /// enforced here; the upper bound is the caller's job
    /// ([`validate_study_hours`]).
    pub fn new(
        user_id: &str,
        day: &str,
        subject: &str,
        study_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let day: Day = day.parse()?;

        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::SubjectRequired);
        }

        if !study_hours.is_finite() || study_hours <= 0.0 {
            return Err(ValidationError::HoursNotPositive);
        }

        Ok(Self {
            user_id: user_id.to_string(),
            day,
            subject: subject.to_string(),
            study_hours,
            created_at: now,
        })
    }
}

/// Partial update of a schedule entry. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Day>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_hours: Option<f64>,
}

impl SchedulePatch {
    pub fn is_empty(&self) -> bool {
        self.day.is_none() && self.subject.is_none() && self.study_hours.is_none()
    }

    /// Merge the patch into `entry`.
    pub fn apply(&self, entry: &mut ScheduleEntry) {
        if let Some(day) = self.day {
            entry.day = day;
        }
        if let Some(subject) = &self.subject {
            entry.subject = subject.clone();
        }
        if let Some(hours) = self.study_hours {
            entry.study_hours = hours;
        }
    }
}

/// How fetched entries are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOrder {
    /// Monday through Sunday.
    #[default]
    Calendar,
    /// The backend's order: weekday names compared as strings.
    Stored,
}

impl DayOrder {
    pub fn apply(&self, entries: &mut [ScheduleEntry]) {
        match self {
            DayOrder::Calendar => entries.sort_by_key(|e| e.day.index()),
            DayOrder::Stored => entries.sort_by(|a, b| a.day.as_str().cmp(b.day.as_str())),
        }
    }
}

impl FromStr for DayOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(DayOrder::Calendar),
            "stored" => Ok(DayOrder::Stored),
            other => Err(ValidationError::InvalidValue {
                field: "day_order".into(),
                message: format!("expected 'calendar' or 'stored', got '{other}'"),
            }),
        }
    }
}

/// Full range check for hours typed by a user: a number, above zero,
/// at most [`MAX_STUDY_HOURS`].
pub fn validate_study_hours(input: &str) -> Result<f64, ValidationError> {
    let hours: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::HoursNotANumber)?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(ValidationError::HoursNotANumber);
    }
    if hours > MAX_STUDY_HOURS {
        return Err(ValidationError::HoursTooHigh { max: MAX_STUDY_HOURS });
    }
    Ok(hours)
}

/// Subject as typed by a user: non-empty after trimming, at most
/// [`SUBJECT_MAX_LEN`] characters.
pub fn validate_subject(input: &str) -> Result<&str, ValidationError> {
    let subject = input.trim();
    if subject.is_empty() {
        return Err(ValidationError::SubjectRequired);
    }
    if subject.chars().count() > SUBJECT_MAX_LEN {
        return Err(ValidationError::SubjectTooLong { max: SUBJECT_MAX_LEN });
    }
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, day: Day) -> ScheduleEntry {
        ScheduleEntry {
            id,
            user_id: "u1".into(),
            day,
            subject: "Math".into(),
            study_hours: 1.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn day_parses_case_insensitively() {
        assert_eq!("monday".parse::<Day>(), Ok(Day::Monday));
        assert_eq!(" Sunday ".parse::<Day>(), Ok(Day::Sunday));
        assert_eq!("".parse::<Day>(), Err(ValidationError::DayRequired));
        assert!(matches!("Funday".parse::<Day>(), Err(ValidationError::InvalidDay(_))));
    }

    #[test]
    fn day_serializes_as_full_name() {
        assert_eq!(serde_json::to_value(Day::Wednesday).unwrap(), "Wednesday");
    }

    #[test]
    fn new_entry_checks_day_then_subject_then_hours() {
        let now = Utc::now();
        assert_eq!(
            NewScheduleEntry::new("u1", "", "", 0.0, now),
            Err(ValidationError::DayRequired)
        );
        assert_eq!(
            NewScheduleEntry::new("u1", "Monday", "  ", 0.0, now),
            Err(ValidationError::SubjectRequired)
        );
        assert_eq!(
            NewScheduleEntry::new("u1", "Monday", "Math", 0.0, now),
            Err(ValidationError::HoursNotPositive)
        );
        assert_eq!(
            NewScheduleEntry::new("u1", "Monday", "Math", f64::NAN, now),
            Err(ValidationError::HoursNotPositive)
        );
        let ok = NewScheduleEntry::new("u1", "Monday", " Math ", 30.0, now).unwrap();
        assert_eq!(ok.subject, "Math");
        assert_eq!(ok.study_hours, 30.0);
    }

    #[test]
    fn calendar_order_differs_from_stored_order() {
        let mut entries = vec![entry(1, Day::Monday), entry(2, Day::Friday), entry(3, Day::Sunday)];
        DayOrder::Stored.apply(&mut entries);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        DayOrder::Calendar.apply(&mut entries);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut e = entry(1, Day::Monday);
        let patch = SchedulePatch {
            study_hours: Some(2.5),
            ..SchedulePatch::default()
        };
        patch.apply(&mut e);
        assert_eq!(e.study_hours, 2.5);
        assert_eq!(e.day, Day::Monday);
        assert_eq!(e.subject, "Math");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"study_hours": 2.5})
        );
    }

    #[test]
    fn validate_study_hours_range() {
        assert_eq!(validate_study_hours("2.5"), Ok(2.5));
        assert_eq!(validate_study_hours("24"), Ok(24.0));
        assert_eq!(validate_study_hours("abc"), Err(ValidationError::HoursNotANumber));
        assert_eq!(validate_study_hours("0"), Err(ValidationError::HoursNotANumber));
        assert_eq!(
            validate_study_hours("24.5"),
            Err(ValidationError::HoursTooHigh { max: 24.0 })
        );
    }

    #[test]
    fn validate_subject_length() {
        assert_eq!(validate_subject(" Physics "), Ok("Physics"));
        assert_eq!(validate_subject(""), Err(ValidationError::SubjectRequired));
        let long = "x".repeat(51);
        assert_eq!(
            validate_subject(&long),
            Err(ValidationError::SubjectTooLong { max: 50 })
        );
    }
}
