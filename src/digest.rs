use anyhow::Result;
use chrono::NaiveDate;
use std::cmp::Reverse;

use crate::models::{DigestEntry, DigestRecord, Job, Preferences, StatusEntry, StatusMap};
use crate::scoring::match_score;
use crate::store::Store;

pub const DIGEST_SIZE: usize = 10;
pub const RECENT_UPDATES: usize = 5;

/// Top matches for `date`: highest score first, fresher postings first on ties.
/// Jobs scoring 0 never make the list.
pub fn rank(jobs: &[Job], prefs: &Preferences, date: NaiveDate) -> DigestRecord {
    let mut scored: Vec<DigestEntry> = jobs
        .iter()
        .map(|job| DigestEntry {
            score: match_score(job, prefs),
            job: job.clone(),
        })
        .filter(|entry| entry.score > 0)
        .collect();

    scored.sort_by_key(|entry| (Reverse(entry.score), entry.job.posted_days_ago));
    scored.truncate(DIGEST_SIZE);

    DigestRecord {
        date,
        entries: scored,
    }
}

/// Generate-or-fetch: the first call for a date ranks and persists, later
/// calls for the same date return the stored record untouched.
pub fn generate(store: &Store, jobs: &[Job], prefs: &Preferences, date: NaiveDate) -> Result<DigestRecord> {
    if let Some(existing) = store.load_digest(date)? {
        tracing::debug!(%date, "digest already generated");
        return Ok(existing);
    }

    let record = rank(jobs, prefs, date);
    store.save_digest(&record)?;
    tracing::info!(%date, entries = record.entries.len(), "generated digest");
    Ok(record)
}

/// Most recent status changes for jobs still in the list, newest first.
pub fn recent_updates<'a>(statuses: &'a StatusMap, jobs: &'a [Job]) -> Vec<(&'a Job, &'a StatusEntry)> {
    let mut updates: Vec<(&Job, &StatusEntry)> = statuses
        .iter()
        .filter_map(|(id, entry)| crate::jobs::find(jobs, *id).map(|job| (job, entry)))
        .collect();
    updates.sort_by_key(|(_, entry)| Reverse(entry.date));
    updates.truncate(RECENT_UPDATES);
    updates
}
