use clap::Subcommand;
use studyplan_core::schedule::{validate_study_hours, validate_subject};
use studyplan_core::stats::WeekPlan;
use studyplan_core::{Day, SchedulePatch};

use crate::commands::{format_hours, print_json};
use crate::context::{AppContext, CmdResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Plan study hours for a subject on a weekday
    Add {
        /// Weekday, e.g. Monday
        day: String,
        /// Subject name (up to 50 characters)
        subject: String,
        /// Hours, above 0 and at most 24
        hours: String,
    },
    /// Show the week, day by day
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a schedule entry
    Update {
        /// Entry ID
        id: i64,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        hours: Option<String>,
    },
    /// Delete a schedule entry
    Delete {
        /// Entry ID
        id: i64,
    },
    /// Weekly hours per subject
    Hours {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Checked arguments, ready for the store.
enum Checked {
    Add { day: Day, subject: String, hours: f64 },
    Update { id: i64, patch: SchedulePatch },
    Delete { id: i64 },
    List { json: bool },
    Hours { json: bool },
}

/// Apply the form rules: weekday name, subject length, hours range.
fn check(action: ScheduleAction) -> Result<Checked, Box<dyn std::error::Error>> {
    Ok(match action {
        ScheduleAction::Add { day, subject, hours } => Checked::Add {
            day: day.parse::<Day>()?,
            subject: validate_subject(&subject)?.to_string(),
            hours: validate_study_hours(&hours)?,
        },
        ScheduleAction::Update {
            id,
            day,
            subject,
            hours,
        } => {
            let patch = SchedulePatch {
                day: day.map(|d| d.parse::<Day>()).transpose()?,
                subject: subject
                    .map(|s| validate_subject(&s).map(str::to_string))
                    .transpose()?,
                study_hours: hours.map(|h| validate_study_hours(&h)).transpose()?,
            };
            if patch.is_empty() {
                return Err("nothing to update: pass --day, --subject or --hours".into());
            }
            Checked::Update { id, patch }
        }
        ScheduleAction::Delete { id } => Checked::Delete { id },
        ScheduleAction::List { json } => Checked::List { json },
        ScheduleAction::Hours { json } => Checked::Hours { json },
    })
}

pub async fn run(action: ScheduleAction) -> CmdResult {
    let checked = check(action)?;

    let ctx = AppContext::connect().await?;
    let result = dispatch(&ctx, checked).await;
    ctx.persist().await;
    result
}

async fn dispatch(ctx: &AppContext, checked: Checked) -> CmdResult {
    let mut store = ctx.schedule().await?;

    match checked {
        Checked::Add { day, subject, hours } => {
            let entry = store.add_schedule_item(day.as_str(), &subject, hours).await?;
            println!(
                "Added #{}: {} {} {}",
                entry.id,
                entry.day,
                entry.subject,
                format_hours(entry.study_hours)
            );
        }
        Checked::Update { id, patch } => {
            if !store.entries().iter().any(|e| e.id == id) {
                return Err(format!("schedule entry #{id} not found").into());
            }
            store.update_schedule_item(id, patch).await?;
            println!("Updated #{id}");
        }
        Checked::Delete { id } => {
            store.delete_schedule_item(id).await?;
            println!("Deleted #{id}");
        }
        Checked::List { json } => {
            let week = WeekPlan::from_entries(store.entries());
            if json {
                print_json(&week)?;
            } else if week.busy_days().next().is_none() {
                println!("Nothing planned yet");
            } else {
                for plan in week.busy_days() {
                    println!("{} ({})", plan.day, format_hours(plan.total_hours));
                    for entry in &plan.entries {
                        println!("  #{} {} {}", entry.id, entry.subject, format_hours(entry.study_hours));
                    }
                }
                println!("Total: {}", format_hours(week.total_hours));
            }
        }
        Checked::Hours { json } => {
            let hours = store.subject_hours();
            if json {
                print_json(&serde_json::json!({
                    "subjects": hours,
                    "total": store.total_hours(),
                }))?;
            } else {
                for (subject, total) in &hours {
                    println!("{subject}: {}", format_hours(*total));
                }
                println!("Total: {}", format_hours(store.total_hours()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(day: &str, subject: &str, hours: &str) -> ScheduleAction {
        ScheduleAction::Add {
            day: day.into(),
            subject: subject.into(),
            hours: hours.into(),
        }
    }

    #[test]
    fn check_add_applies_form_rules() {
        let err = check(add("Monday", "Math", "0")).err().unwrap();
        assert_eq!(err.to_string(), "Please enter valid study hours (greater than 0)");

        let err = check(add("Monday", "Math", "25")).err().unwrap();
        assert_eq!(err.to_string(), "Hours cannot exceed 24 per subject");

        let err = check(add("", "Math", "2")).err().unwrap();
        assert_eq!(err.to_string(), "Day is required");

        assert!(matches!(
            check(add("monday", " Math ", "2.5")).unwrap(),
            Checked::Add { day: Day::Monday, ref subject, hours } if subject == "Math" && hours == 2.5
        ));
    }

    #[test]
    fn check_update_requires_a_field() {
        let action = ScheduleAction::Update {
            id: 4,
            day: None,
            subject: None,
            hours: None,
        };
        assert!(check(action).is_err());

        let action = ScheduleAction::Update {
            id: 4,
            day: None,
            subject: None,
            hours: Some("3".into()),
        };
        match check(action).unwrap() {
            Checked::Update { id, patch } => {
                assert_eq!(id, 4);
                assert_eq!(patch.study_hours, Some(3.0));
                assert_eq!(patch.day, None);
            }
            _ => panic!("expected an update"),
        }
    }
}
