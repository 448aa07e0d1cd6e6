use std::path::{Path, PathBuf};

const APP_DIR: &str = "taskboard";
const LOG_FILE: &str = "taskboard.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    /// Uses `data_dir` when given, otherwise the platform data directory.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        Self { data_dir }
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR}")))
}
