use chrono::Local;
use clap::Subcommand;
use studyplan_core::stats::{DueStatus, TaskSummary};
use studyplan_core::task::parse_due_date;
use studyplan_core::{Task, ValidationError};

use crate::commands::print_json;
use crate::context::{AppContext, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task name
        name: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,
    },
    /// List tasks by due date
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip a task between pending and completed
    Toggle {
        /// Task ID
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
    /// Completion summary
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: TaskAction) -> CmdResult {
    // Form checks happen before anything touches the backend.
    if let TaskAction::Add { name, due } = &action {
        if name.trim().is_empty() {
            return Err(ValidationError::TaskNameRequired.into());
        }
        parse_due_date(due)?;
    }

    let ctx = AppContext::connect().await?;
    let result = dispatch(&ctx, action).await;
    ctx.persist().await;
    result
}

async fn dispatch(ctx: &AppContext, action: TaskAction) -> CmdResult {
    let mut store = ctx.tasks().await?;

    match action {
        TaskAction::Add { name, due } => {
            let task = store.add_task(&name, parse_due_date(&due)?).await?;
            println!("Task added: #{} {} (due {})", task.id, task.task_name, task.due_date);
        }
        TaskAction::List { json } => {
            if json {
                print_json(store.tasks())?;
            } else if store.tasks().is_empty() {
                println!("No tasks yet");
            } else {
                let today = Local::now().date_naive();
                for task in store.tasks() {
                    println!("{}", task_line(task, DueStatus::classify(task, today)));
                }
            }
        }
        TaskAction::Toggle { id } => {
            let current = store
                .tasks()
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.completed)
                .ok_or_else(|| format!("task #{id} not found"))?;
            store.toggle_completion(id, current).await?;
            println!(
                "Task #{id} marked {}",
                if current { "pending" } else { "completed" }
            );
        }
        TaskAction::Delete { id } => {
            store.delete_task(id).await?;
            println!("Task #{id} deleted");
        }
        TaskAction::Summary { json } => {
            let summary = TaskSummary::from_tasks(store.tasks());
            if json {
                print_json(&summary)?;
            } else {
                println!(
                    "{} tasks, {} completed, {} pending ({}%)",
                    summary.total, summary.completed, summary.pending, summary.completion_rate
                );
                println!("{}", summary.tier().message());
            }
        }
    }
    Ok(())
}

fn task_line(task: &Task, status: DueStatus) -> String {
    let mark = if task.completed { "x" } else { " " };
    let note = match status {
        DueStatus::Overdue | DueStatus::DueToday => format!(", {}", status.label()),
        DueStatus::Completed | DueStatus::Upcoming => String::new(),
    };
    format!(
        "[{mark}] #{} {} (due {}{note})",
        task.id, task.task_name, task.due_date
    )
}
