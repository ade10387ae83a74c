use std::cmp::Reverse;

use crate::models::{effective_status, Job, JobStatus, Preferences, StatusMap};
use crate::scoring::score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Score,
    Latest,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "score" | "match" => Some(SortKey::Score),
            "latest" | "recent" | "date" => Some(SortKey::Latest),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Score => "Match",
            SortKey::Latest => "Latest",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub only_above_threshold: bool,
    pub sort: SortKey,
}

impl FilterSpec {
    /// Short human summary of the active filters, e.g. `keyword "rust" · Pune · sort: Latest`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(k) = self.keyword() {
            parts.push(format!("keyword \"{}\"", k));
        }
        if let Some(l) = &self.location {
            parts.push(l.clone());
        }
        if let Some(s) = self.status {
            parts.push(s.to_string());
        }
        if self.only_above_threshold {
            parts.push("above threshold".to_string());
        }
        parts.push(format!("sort: {}", self.sort.label()));
        parts.join(" · ")
    }

    fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// The jobs to display, in display order, each with its match score.
/// `jobs` is never reordered; the result borrows from it.
pub fn apply<'a>(
    jobs: &'a [Job],
    prefs: &Preferences,
    statuses: &StatusMap,
    criteria: &FilterSpec,
) -> Vec<(&'a Job, u8)> {
    let prefs_set = prefs.is_set();
    let keyword = criteria.keyword().map(str::to_lowercase);

    let mut shown: Vec<(&Job, u8)> = jobs
        .iter()
        .map(|job| (job, score(job, prefs, prefs_set)))
        .filter(|(job, job_score)| {
            if criteria.only_above_threshold && prefs_set && *job_score < prefs.min_match_score {
                return false;
            }
            if let Some(k) = &keyword {
                let title = job.title.to_lowercase();
                let company = job.company.to_lowercase();
                if !title.contains(k.as_str()) && !company.contains(k.as_str()) {
                    return false;
                }
            }
            if let Some(status) = criteria.status {
                if effective_status(statuses, job.id) != status {
                    return false;
                }
            }
            if let Some(location) = &criteria.location {
                if job.location != *location {
                    return false;
                }
            }
            true
        })
        .collect();

    // Both sorts are stable: ties keep source order.
    match criteria.sort {
        SortKey::Score => shown.sort_by_key(|(_, s)| Reverse(*s)),
        SortKey::Latest => shown.sort_by_key(|(job, _)| job.posted_days_ago),
    }

    shown
}

/// Unique locations in first-seen order.
pub fn locations(jobs: &[Job]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for job in jobs {
        if !out.contains(&job.location) {
            out.push(job.location.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusEntry;
    use crate::scoring::tests::job;
    use chrono::NaiveDate;

    fn sample() -> Vec<Job> {
        vec![
            job(1, "Rust Engineer", "Remote", 5),
            job(2, "Java Developer", "Pune", 1),
            job(3, "Senior Rust Developer", "Pune", 0),
            job(4, "Designer", "Remote", 3),
        ]
    }

    fn rust_prefs() -> Preferences {
        Preferences {
            role_keywords: vec!["rust".to_string()],
            min_match_score: 25,
            ..Preferences::default()
        }
    }

    fn ids(shown: &[(&Job, u8)]) -> Vec<i64> {
        shown.iter().map(|(j, _)| j.id).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything_in_order() {
        let jobs = sample();
        let shown = apply(&jobs, &Preferences::default(), &StatusMap::new(), &FilterSpec::default());
        // Unset preferences score everything 0, so the stable sort keeps source order.
        assert_eq!(ids(&shown), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_keyword_matches_title_or_company() {
        let jobs = sample();
        let criteria = FilterSpec {
            keyword: Some("  RUST ".to_string()),
            ..FilterSpec::default()
        };
        let shown = apply(&jobs, &Preferences::default(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&shown), vec![1, 3]);

        let criteria = FilterSpec {
            keyword: Some("company 4".to_string()),
            ..FilterSpec::default()
        };
        let shown = apply(&jobs, &Preferences::default(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&shown), vec![4]);
    }

    #[test]
    fn test_location_is_exact() {
        let jobs = sample();
        let criteria = FilterSpec {
            location: Some("pune".to_string()),
            ..FilterSpec::default()
        };
        assert!(apply(&jobs, &Preferences::default(), &StatusMap::new(), &criteria).is_empty());

        let criteria = FilterSpec {
            location: Some("Pune".to_string()),
            ..FilterSpec::default()
        };
        let shown = apply(&jobs, &Preferences::default(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&shown), vec![2, 3]);
    }

    #[test]
    fn test_status_uses_effective_status() {
        let jobs = sample();
        let mut statuses = StatusMap::new();
        statuses.insert(
            2,
            StatusEntry {
                status: JobStatus::Applied,
                date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            },
        );

        let applied = FilterSpec {
            status: Some(JobStatus::Applied),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&apply(&jobs, &Preferences::default(), &statuses, &applied)), vec![2]);

        let not_applied = FilterSpec {
            status: Some(JobStatus::NotApplied),
            ..FilterSpec::default()
        };
        assert_eq!(
            ids(&apply(&jobs, &Preferences::default(), &statuses, &not_applied)),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_threshold_only_applies_when_preferences_set() {
        let jobs = sample();
        let criteria = FilterSpec {
            only_above_threshold: true,
            ..FilterSpec::default()
        };

        let unset = apply(&jobs, &Preferences::default(), &StatusMap::new(), &criteria);
        assert_eq!(unset.len(), jobs.len());

        let set = apply(&jobs, &rust_prefs(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&set), vec![3, 1]);
        assert!(set.iter().all(|(_, s)| *s >= 25));
    }

    #[test]
    fn test_sort_by_score_then_source_order() {
        let jobs = sample();
        let shown = apply(&jobs, &rust_prefs(), &StatusMap::new(), &FilterSpec::default());
        // 3 scores 30 (title + fresh), 1 scores 25, 2 only gets the recency bonus.
        assert_eq!(ids(&shown), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_sort_by_latest() {
        let jobs = sample();
        let criteria = FilterSpec {
            sort: SortKey::Latest,
            ..FilterSpec::default()
        };
        let shown = apply(&jobs, &rust_prefs(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&shown), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_filters_combine_and_leave_source_untouched() {
        let jobs = sample();
        let before = jobs.clone();
        let criteria = FilterSpec {
            keyword: Some("rust".to_string()),
            location: Some("Pune".to_string()),
            status: Some(JobStatus::NotApplied),
            only_above_threshold: true,
            sort: SortKey::Latest,
        };
        let shown = apply(&jobs, &rust_prefs(), &StatusMap::new(), &criteria);
        assert_eq!(ids(&shown), vec![3]);
        assert_eq!(jobs, before);
    }

    #[test]
    fn test_locations_are_unique_in_order() {
        assert_eq!(locations(&sample()), vec!["Remote".to_string(), "Pune".to_string()]);
    }

    #[test]
    fn test_summary() {
        let criteria = FilterSpec {
            keyword: Some("rust".to_string()),
            only_above_threshold: true,
            sort: SortKey::Latest,
            ..FilterSpec::default()
        };
        assert_eq!(criteria.summary(), "keyword \"rust\" · above threshold · sort: Latest");
    }
}
