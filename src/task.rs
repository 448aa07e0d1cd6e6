use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Column order on the board.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading.
    pub fn title(self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    /// The column to the right, if any.
    pub fn next(self) -> Option<TaskStatus> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The column to the left, if any.
    pub fn previous(self) -> Option<TaskStatus> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}' (expected todo, inprogress or done)")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "inprogress" | "in-progress" | "doing" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Local date and time as entered, e.g. `2024-06-30T12:00`.
    pub deadline: String,
}

/// A task as entered by the user, before the store assigns it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub deadline: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = deadline.into();
        self
    }

    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or_default(),
            deadline: self.deadline,
        }
    }
}

/// Tasks shown on a board that has never been saved.
pub fn seed_tasks() -> Vec<Task> {
    [
        ("seed-1", TaskStatus::Todo, "2024-06-30T12:00"),
        ("seed-2", TaskStatus::InProgress, "2024-07-01T14:00"),
        ("seed-3", TaskStatus::Done, "2024-07-02T16:00"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (id, status, deadline))| Task {
        id: id.to_string(),
        title: format!("Task {}", i + 1),
        description: format!("This is Task {}", i + 1),
        status,
        deadline: deadline.to_string(),
    })
    .collect()
}
