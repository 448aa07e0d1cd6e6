use crate::error::Result;
use crate::kanban_board::KanbanBoard;
use crate::storage::Storage;
use crate::task::{TaskDraft, TaskStatus};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "taskboard")]
#[command(version)]
#[command(about = "Three-column task board for the terminal")]
pub struct Cli {
    /// Directory the board is saved in
    #[arg(long, env = "TASKBOARD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print tasks grouped by column
    List {
        /// Only show one column
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Add a task and print its id
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Local date and time, e.g. 2024-06-30T12:00
        #[arg(long, default_value = "")]
        deadline: String,
    },
    /// Move a task to another column
    Move { id: String, status: TaskStatus },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Delete a task
    Delete { id: String },
}

/// Runs one non-interactive command against the board.
pub fn execute<S: Storage, W: Write>(
    command: Commands,
    board: &mut KanbanBoard<S>,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::List { status } => {
            let statuses = match status {
                Some(status) => vec![status],
                None => TaskStatus::ALL.to_vec(),
            };
            for status in statuses {
                writeln!(out, "{}:", status.title())?;
                for task in board.get_tasks_by_status(status) {
                    writeln!(out, "- [{}] {} (Due: {})", task.id, task.title, task.deadline)?;
                }
            }
        }
        Commands::Add {
            title,
            description,
            status,
            deadline,
        } => {
            let draft = TaskDraft {
                title,
                description,
                status,
                deadline,
            };
            let id = board.add_task(draft)?;
            writeln!(out, "{id}")?;
        }
        Commands::Move { id, status } => {
            if !board.move_task(&id, status)? {
                writeln!(out, "No task with id {id}")?;
            }
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
            deadline,
        } => {
            let Some(mut task) = board.get(&id).cloned() else {
                writeln!(out, "No task with id {id}")?;
                return Ok(());
            };
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(status) = status {
                task.status = status;
            }
            if let Some(deadline) = deadline {
                task.deadline = deadline;
            }
            board.update_task(task)?;
        }
        Commands::Delete { id } => {
            if !board.delete_task(&id)? {
                writeln!(out, "No task with id {id}")?;
            }
        }
    }
    Ok(())
}
