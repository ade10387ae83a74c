use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::models::Job;

/// Load the job list from a JSON array. Order is preserved.
pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job list: {}", path.display()))?;
    parse_jobs(&raw).with_context(|| format!("Invalid job list: {}", path.display()))
}

pub fn parse_jobs(raw: &str) -> Result<Vec<Job>> {
    let jobs: Vec<Job> = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    for job in &jobs {
        if !seen.insert(job.id) {
            return Err(anyhow!("Duplicate job id {}", job.id));
        }
    }

    Ok(jobs)
}

pub fn find(jobs: &[Job], id: i64) -> Option<&Job> {
    jobs.iter().find(|j| j.id == id)
}
