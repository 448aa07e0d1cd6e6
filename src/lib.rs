//! A three-column task board (Todo, In Progress, Done) whose task
//! collection is written through to local storage after every change.

pub mod cli;
pub mod config;
pub mod error;
pub mod kanban_board;
pub mod storage;
pub mod task;
pub mod ui;

pub use error::{KanbanError, Result};
pub use kanban_board::KanbanBoard;
pub use storage::{FileStorage, MemoryStorage, Storage, TASKS_KEY};
pub use task::{Task, TaskDraft, TaskStatus};
