use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkMode {
    Remote,
    Hybrid,
    Onsite,
}

impl WorkMode {
    pub const ALL: [WorkMode; 3] = [WorkMode::Remote, WorkMode::Hybrid, WorkMode::Onsite];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "Remote",
            WorkMode::Hybrid => "Hybrid",
            WorkMode::Onsite => "Onsite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    LinkedIn,
    Naukri,
    Indeed,
    #[serde(other)]
    Other,
}

impl Source {
    /// Postings from this source get a small score bonus.
    pub const PRIVILEGED: Source = Source::LinkedIn;

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::LinkedIn => "LinkedIn",
            Source::Naukri => "Naukri",
            Source::Indeed => "Indeed",
            Source::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub mode: WorkMode,
    pub experience: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub posted_days_ago: u32,
    pub source: Source,
    pub apply_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub role_keywords: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub preferred_mode: Vec<WorkMode>,
    #[serde(deserialize_with = "blank_as_none")]
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub min_match_score: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            role_keywords: Vec::new(),
            preferred_locations: Vec::new(),
            preferred_mode: Vec::new(),
            experience_level: None,
            skills: Vec::new(),
            min_match_score: 40,
        }
    }
}

impl Preferences {
    /// True once the user has moved away from the defaults.
    pub fn is_set(&self) -> bool {
        *self != Self::default()
    }
}

/// Comma-separated input as entered in preference fields: trimmed, blanks dropped.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

// Older saves store an empty string for "no experience level".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    #[serde(rename = "Not Applied")]
    NotApplied,
    Applied,
    Rejected,
    Selected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::NotApplied,
        JobStatus::Applied,
        JobStatus::Rejected,
        JobStatus::Selected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::NotApplied => "Not Applied",
            JobStatus::Applied => "Applied",
            JobStatus::Rejected => "Rejected",
            JobStatus::Selected => "Selected",
        }
    }

    /// Accepts the display name or a compact form ("not-applied", "applied", ...).
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match norm.as_str() {
            "notapplied" => Some(JobStatus::NotApplied),
            "applied" => Some(JobStatus::Applied),
            "rejected" => Some(JobStatus::Rejected),
            "selected" => Some(JobStatus::Selected),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: JobStatus,
    pub date: NaiveDate,
}

pub type StatusMap = BTreeMap<i64, StatusEntry>;

/// Stored status, or Not Applied when the job was never touched.
pub fn effective_status(statuses: &StatusMap, job_id: i64) -> JobStatus {
    statuses
        .get(&job_id)
        .map(|entry| entry.status)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub job: Job,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub date: NaiveDate,
    pub entries: Vec<DigestEntry>,
}

pub struct ChecklistItem {
    pub label: &'static str,
    pub hint: &'static str,
}

pub const CHECKLIST: [ChecklistItem; 10] = [
    ChecklistItem {
        label: "Preferences persist after refresh",
        hint: "Change settings, restart, and check if values remain.",
    },
    ChecklistItem {
        label: "Match score calculates correctly",
        hint: "Check if the score badge matches the scoring rules.",
    },
    ChecklistItem {
        label: "Show only matches toggle works",
        hint: "Toggle on the dashboard and verify the list filters by threshold.",
    },
    ChecklistItem {
        label: "Save job persists after refresh",
        hint: "Save a job, restart, and check the Saved page.",
    },
    ChecklistItem {
        label: "Apply opens in new tab",
        hint: "Press Apply and verify the posting opens in the browser.",
    },
    ChecklistItem {
        label: "Status update persists after refresh",
        hint: "Change status, restart, and verify the badge.",
    },
    ChecklistItem {
        label: "Status filter works correctly",
        hint: "Filter by 'Applied' or 'Selected' on the dashboard.",
    },
    ChecklistItem {
        label: "Digest generates top 10 by score",
        hint: "Generate the digest and verify order and count.",
    },
    ChecklistItem {
        label: "Digest persists for the day",
        hint: "Generate the digest, restart, and verify it doesn't ask to regenerate.",
    },
    ChecklistItem {
        label: "No console errors on main pages",
        hint: "Run with JOBTRACK_LOG=debug and check for errors while navigating.",
    },
];
