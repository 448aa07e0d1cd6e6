use crate::error::Result;
use crate::storage::{Storage, TASKS_KEY};
use crate::task::{seed_tasks, Task, TaskDraft, TaskStatus};
use std::collections::HashSet;
use uuid::Uuid;

/// The board's task collection, mirrored to storage after every change.
///
/// Tasks keep their insertion order. Moving or editing a task leaves it
/// where it is; deleting removes it in place.
#[derive(Debug)]
pub struct KanbanBoard<S: Storage> {
    tasks: Vec<Task>,
    storage: S,
}

impl<S: Storage> KanbanBoard<S> {
    /// Restores the saved board, or starts from the seed tasks when nothing
    /// usable is stored.
    pub fn load(storage: S) -> Self {
        let (tasks, write_back) = match storage.get_item(TASKS_KEY) {
            Ok(Some(data)) => match parse_tasks(&data) {
                Ok(tasks) => (tasks, true),
                Err(reason) => {
                    tracing::warn!("Stored tasks are unreadable, using seed tasks: {}", reason);
                    (seed_tasks(), true)
                }
            },
            Ok(None) => {
                tracing::debug!("No stored tasks, using seed tasks");
                (seed_tasks(), true)
            }
            // Whatever is stored may still be intact, so leave it alone.
            Err(err) => {
                tracing::warn!("Failed to read stored tasks, using seed tasks: {}", err);
                (seed_tasks(), false)
            }
        };

        let mut board = Self { tasks, storage };
        if write_back {
            if let Err(err) = board.save() {
                tracing::warn!("Failed to save tasks: {}", err);
            }
        }
        tracing::info!("Loaded {} tasks", board.tasks.len());
        board
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Appends a new task and returns its id.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let task = draft.into_task(id.clone());
        tracing::info!(id = %id, status = %task.status, "Adding task");
        self.tasks.push(task);
        self.save()?;
        Ok(id)
    }

    /// Sets the status of task `id`. Returns `false` if there is no such task.
    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(id, "Move ignored, no such task");
            return Ok(false);
        };
        tracing::info!(id, from = %task.status, to = %status, "Moving task");
        task.status = status;
        self.save()?;
        Ok(true)
    }

    /// Replaces the task with the same id as `edited`, every field included.
    pub fn update_task(&mut self, edited: Task) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == edited.id) else {
            tracing::debug!(id = %edited.id, "Update ignored, no such task");
            return Ok(false);
        };
        tracing::info!(id = %edited.id, "Updating task");
        *task = edited;
        self.save()?;
        Ok(true)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            tracing::debug!(id, "Delete ignored, no such task");
            return Ok(false);
        };
        tracing::info!(id, "Deleting task");
        self.tasks.remove(index);
        self.save()?;
        Ok(true)
    }

    fn save(&mut self) -> Result<()> {
        let data = serde_json::to_string(&self.tasks)?;
        self.storage.set_item(TASKS_KEY, &data)
    }
}

/// Decodes a stored collection, rejecting one that repeats an id.
fn parse_tasks(data: &str) -> std::result::Result<Vec<Task>, String> {
    let tasks: Vec<Task> = serde_json::from_str(data).map_err(|err| err.to_string())?;
    let mut seen = HashSet::new();
    if let Some(dup) = tasks.iter().find(|t| !seen.insert(t.id.as_str())) {
        return Err(format!("duplicate task id '{}'", dup.id));
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KanbanError;
    use crate::storage::{FileStorage, MemoryStorage};
    use std::io;
    use tempfile::TempDir;

    fn empty_board() -> KanbanBoard<MemoryStorage> {
        KanbanBoard::load(MemoryStorage::with_item(TASKS_KEY, "[]"))
    }

    fn stored_tasks<S: Storage>(board: &KanbanBoard<S>) -> Vec<Task> {
        let data = board.storage().get_item(TASKS_KEY).unwrap().unwrap();
        serde_json::from_str(&data).unwrap()
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title)
            .description("Y")
            .deadline("2024-01-01T10:00")
    }

    #[test]
    fn empty_storage_loads_seed_tasks() {
        let board = KanbanBoard::load(MemoryStorage::new());
        let statuses: Vec<_> = board.tasks().iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done]
        );
        assert_eq!(stored_tasks(&board), board.tasks());
    }

    #[test]
    fn malformed_storage_loads_seed_tasks() {
        for bad in ["not json", "{\"id\":1}", "null", ""] {
            let board = KanbanBoard::load(MemoryStorage::with_item(TASKS_KEY, bad));
            assert_eq!(board.tasks(), seed_tasks().as_slice(), "input: {bad:?}");
        }
    }

    #[test]
    fn unknown_status_in_storage_loads_seed_tasks() {
        let data = r#"[{"id":"a","title":"t","description":"","status":"blocked","deadline":""}]"#;
        let board = KanbanBoard::load(MemoryStorage::with_item(TASKS_KEY, data));
        assert_eq!(board.tasks(), seed_tasks().as_slice());
    }

    #[test]
    fn duplicate_ids_in_storage_load_seed_tasks() {
        let data = r#"[
            {"id":"a","title":"first","description":"","status":"todo","deadline":""},
            {"id":"a","title":"second","description":"","status":"done","deadline":""}
        ]"#;
        let mut board = KanbanBoard::load(MemoryStorage::with_item(TASKS_KEY, data));
        assert_eq!(board.tasks(), seed_tasks().as_slice());
        assert!(board.get("a").is_none());
        assert!(!board.delete_task("a").unwrap());
    }

    /// Storage whose reads always fail, counting attempted writes.
    struct UnreadableStorage {
        writes: usize,
    }

    impl Storage for UnreadableStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(KanbanError::Io(io::Error::new(io::ErrorKind::InvalidData, "bad bytes")))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn read_error_keeps_stored_data_untouched() {
        let board = KanbanBoard::load(UnreadableStorage { writes: 0 });
        assert_eq!(board.tasks(), seed_tasks().as_slice());
        assert_eq!(board.storage().writes, 0);
    }

    #[test]
    fn stored_empty_list_is_kept() {
        let board = empty_board();
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn adds_grow_collection_with_unique_ids() {
        let mut board = empty_board();
        let mut ids = HashSet::new();
        for i in 0..25 {
            ids.insert(board.add_task(draft(&format!("task {i}"))).unwrap());
        }
        assert_eq!(board.tasks().len(), 25);
        assert_eq!(ids.len(), 25);
        assert_eq!(board.tasks()[0].title, "task 0");
        assert_eq!(board.tasks()[24].title, "task 24");
    }

    #[test]
    fn add_allows_empty_title_and_defaults_status() {
        let mut board = empty_board();
        let id = board.add_task(TaskDraft::default()).unwrap();
        let task = board.get(&id).unwrap();
        assert_eq!(task.title, "");
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn move_sets_any_status_from_any_status() {
        let mut board = empty_board();
        let id = board.add_task(draft("X")).unwrap();
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert!(board.move_task(&id, from).unwrap());
                assert!(board.move_task(&id, to).unwrap());
                assert_eq!(board.get(&id).unwrap().status, to);
            }
        }
    }

    #[test]
    fn move_keeps_position_and_other_fields() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        let before = board.tasks().to_vec();

        assert!(board.move_task("seed-1", TaskStatus::Done).unwrap());

        assert_eq!(board.tasks()[0].id, "seed-1");
        assert_eq!(board.tasks()[0].status, TaskStatus::Done);
        assert_eq!(board.tasks()[0].title, before[0].title);
        assert_eq!(board.tasks()[0].deadline, before[0].deadline);
        assert_eq!(&board.tasks()[1..], &before[1..]);
    }

    #[test]
    fn move_unknown_id_is_noop() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        assert!(!board.move_task("missing", TaskStatus::Done).unwrap());
        assert_eq!(board.tasks(), seed_tasks().as_slice());
    }

    #[test]
    fn update_replaces_every_field_of_one_task() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        let edited = Task {
            id: "seed-2".into(),
            title: "Renamed".into(),
            description: "New text".into(),
            status: TaskStatus::Todo,
            deadline: "2025-02-02T09:30".into(),
        };

        assert!(board.update_task(edited.clone()).unwrap());

        let seed = seed_tasks();
        assert_eq!(board.tasks()[0], seed[0]);
        assert_eq!(board.tasks()[1], edited);
        assert_eq!(board.tasks()[2], seed[2]);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        let mut task = seed_tasks().remove(0);
        task.id = "missing".into();
        assert!(!board.update_task(task).unwrap());
        assert_eq!(board.tasks(), seed_tasks().as_slice());
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        assert!(board.delete_task("seed-2").unwrap());
        let ids: Vec<_> = board.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["seed-1", "seed-3"]);

        assert!(!board.delete_task("seed-2").unwrap());
        assert_eq!(board.tasks().len(), 2);
    }

    #[test]
    fn storage_mirrors_memory_after_each_mutation() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        let id = board.add_task(draft("X")).unwrap();
        assert_eq!(stored_tasks(&board), board.tasks());

        board.move_task(&id, TaskStatus::InProgress).unwrap();
        assert_eq!(stored_tasks(&board), board.tasks());

        let mut edited = board.get(&id).unwrap().clone();
        edited.title = "Z".into();
        board.update_task(edited).unwrap();
        assert_eq!(stored_tasks(&board), board.tasks());

        board.delete_task("seed-1").unwrap();
        assert_eq!(stored_tasks(&board), board.tasks());
    }

    #[test]
    fn add_move_update_delete_restores_previous_state() {
        let mut board = KanbanBoard::load(MemoryStorage::new());
        let before = board.tasks().to_vec();

        let id = board
            .add_task(
                TaskDraft::new("X")
                    .description("Y")
                    .status(TaskStatus::Todo)
                    .deadline("2024-01-01T10:00"),
            )
            .unwrap();
        board.move_task(&id, TaskStatus::Done).unwrap();
        let mut edited = board.get(&id).unwrap().clone();
        edited.title = "Z".into();
        board.update_task(edited).unwrap();
        board.delete_task(&id).unwrap();

        assert_eq!(board.tasks(), before.as_slice());
        assert_eq!(stored_tasks(&board), before);
    }

    #[test]
    fn file_backed_board_survives_reload() {
        let temp = TempDir::new().unwrap();
        let mut board = KanbanBoard::load(FileStorage::new(temp.path()));
        let id = board.add_task(draft("persisted")).unwrap();
        board.move_task(&id, TaskStatus::InProgress).unwrap();
        board.delete_task("seed-3").unwrap();
        let expected = board.tasks().to_vec();

        let reloaded = KanbanBoard::load(FileStorage::new(temp.path()));
        assert_eq!(reloaded.tasks(), expected.as_slice());
    }

    #[test]
    fn tasks_by_status_keeps_collection_order() {
        let mut board = empty_board();
        let a = board.add_task(draft("a")).unwrap();
        board.add_task(draft("b").status(TaskStatus::Done)).unwrap();
        let c = board.add_task(draft("c")).unwrap();

        let todo: Vec<_> = board
            .get_tasks_by_status(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(todo, vec![a, c]);
        assert_eq!(board.get_tasks_by_status(TaskStatus::InProgress).len(), 0);
    }
}
