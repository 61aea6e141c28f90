use anyhow::{bail, Result};
use clap::Subcommand;
use tasknotify_core::{Priority, PrioritySummary, Task};
use tasknotify_engine::TaskEdit;

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        title: String,

        #[arg(long, short, default_value = "")]
        description: String,

        /// high | medium | low
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
    },

    /// List tasks (active only unless --all)
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Change a task's title, description, or priority
    Edit {
        id: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long, short)]
        priority: Option<Priority>,
    },

    /// Mark a task completed
    Done { id: u64 },

    /// Mark a completed task active again
    Reopen { id: u64 },

    /// Delete a task
    Delete { id: u64 },
}

pub async fn run(app: &App, cmd: TaskCommand) -> Result<()> {
    let svc = app.task_service();
    match cmd {
        TaskCommand::Add {
            title,
            description,
            priority,
        } => {
            let t = svc.create(&title, &description, priority).await?;
            println!("Added #{} [{}] {}", t.id, t.priority, t.title);
        }
        TaskCommand::List { all } => {
            let tasks = svc.list(all).await?;
            print!("{}", render_tasks(&tasks));
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            priority,
        } => {
            let edit = TaskEdit {
                title,
                description,
                priority,
            };
            if edit.is_empty() {
                bail!("nothing to change (pass --title, --description or --priority)");
            }
            let t = svc.update(id, edit).await?;
            println!("Updated #{} [{}] {}", t.id, t.priority, t.title);
        }
        TaskCommand::Done { id } => {
            let t = svc.set_completed(id, true).await?;
            println!("Completed #{} {}", t.id, t.title);
        }
        TaskCommand::Reopen { id } => {
            let t = svc.set_completed(id, false).await?;
            println!("Reopened #{} {}", t.id, t.title);
        }
        TaskCommand::Delete { id } => {
            svc.delete(id).await?;
            println!("Deleted #{id}");
        }
    }
    Ok(())
}

pub fn render_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks.\n".to_string();
    }
    let mut out = String::new();
    for t in tasks {
        let mark = if t.is_completed { "x" } else { " " };
        out.push_str(&format!("[{mark}] #{:<4} {:<6} {}\n", t.id, t.priority.as_str(), t.title));
        if !t.description.is_empty() {
            out.push_str(&format!("           {}\n", t.description));
        }
    }
    let counts = PrioritySummary::from_tasks(tasks.iter().filter(|t| t.is_active()));
    out.push_str(&format!(
        "\n{} active (high {}, medium {}, low {})\n",
        counts.total, counts.high, counts.medium, counts.low
    ));
    out
}
