use std::path::PathBuf;

pub const DB_ENV: &str = "JOBTRACK_DB";
pub const JOBS_ENV: &str = "JOBTRACK_JOBS";
pub const LOG_ENV: &str = "JOBTRACK_LOG";

/// Where the store and job list live. Flags win over environment, which wins
/// over the platform data directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub jobs_path: PathBuf,
}

impl Config {
    pub fn resolve(db_flag: Option<PathBuf>, jobs_flag: Option<PathBuf>) -> Self {
        let data_dir = data_dir();
        let db_path = db_flag
            .or_else(|| env_path(DB_ENV))
            .unwrap_or_else(|| data_dir.join("jobtrack.db"));
        let jobs_path = jobs_flag
            .or_else(|| env_path(JOBS_ENV))
            .unwrap_or_else(|| data_dir.join("jobs.json"));
        Self { db_path, jobs_path }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn data_dir() -> PathBuf {
    // Use XDG data directory or fall back to the working directory
    directories::ProjectDirs::from("", "", "jobtrack")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Log filter from `JOBTRACK_LOG`, defaulting to warnings only.
pub fn log_filter() -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string())
}
