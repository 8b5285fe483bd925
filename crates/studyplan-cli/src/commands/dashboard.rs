use chrono::Local;
use serde::Serialize;
use studyplan_core::stats::{due_today, ProgressTier, TaskSummary, WeekPlan};
use studyplan_core::Task;

use crate::commands::{format_hours, print_json};
use crate::context::{AppContext, CmdResult};

#[derive(Serialize)]
struct Dashboard<'a> {
    email: Option<&'a str>,
    summary: TaskSummary,
    tier: ProgressTier,
    message: &'static str,
    due_today: Vec<&'a Task>,
    week: WeekPlan,
}

pub async fn run(json: bool) -> CmdResult {
    let ctx = AppContext::connect().await?;
    let result = show(&ctx, json).await;
    ctx.persist().await;
    result
}

async fn show(ctx: &AppContext, json: bool) -> CmdResult {
    let identity = ctx.require_identity()?;
    let tasks = ctx.tasks().await?;
    let schedule = ctx.schedule().await?;

    let today = Local::now().date_naive();
    let summary = TaskSummary::from_tasks(tasks.tasks());
    let tier = summary.tier();
    let dashboard = Dashboard {
        email: identity.email.as_deref(),
        summary,
        tier,
        message: tier.message(),
        due_today: due_today(tasks.tasks(), today),
        week: WeekPlan::from_entries(schedule.entries()),
    };

    if json {
        print_json(&dashboard)?;
        return Ok(());
    }

    match dashboard.email {
        Some(email) => println!("Hello, {email}! Here's your study progress at a glance."),
        None => println!("Hello! Here's your study progress at a glance."),
    }
    println!();
    println!(
        "Tasks: {} total, {} completed, {} pending ({}%)",
        summary.total, summary.completed, summary.pending, summary.completion_rate
    );
    println!("{}", dashboard.message);

    println!();
    if dashboard.due_today.is_empty() {
        println!("Nothing due today");
    } else {
        println!("Due today:");
        for task in &dashboard.due_today {
            println!("  #{} {}", task.id, task.task_name);
        }
    }

    println!();
    println!("This week: {}", format_hours(dashboard.week.total_hours));
    for plan in dashboard.week.busy_days() {
        println!("  {}: {}", plan.day, format_hours(plan.total_hours));
    }
    Ok(())
}
