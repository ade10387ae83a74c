use crate::models::{Job, Preferences, Source};

pub const MAX_SCORE: u8 = 100;

const TITLE_KEYWORD: u32 = 25;
const DESCRIPTION_KEYWORD: u32 = 15;
const LOCATION: u32 = 15;
const MODE: u32 = 10;
const EXPERIENCE: u32 = 10;
const SKILL: u32 = 15;
const RECENT: u32 = 5;
const PRIVILEGED_SOURCE: u32 = 5;

const RECENT_DAYS: u32 = 2;

/// Score a job against preferences, deriving the preferences-set flag.
pub fn match_score(job: &Job, prefs: &Preferences) -> u8 {
    score(job, prefs, prefs.is_set())
}

/// 0..=100. Always 0 when no preferences are configured.
pub fn score(job: &Job, prefs: &Preferences, prefs_set: bool) -> u8 {
    if !prefs_set {
        return 0;
    }
    let total: u32 = breakdown(job, prefs).iter().map(|(_, points)| points).sum();
    total.min(MAX_SCORE as u32) as u8
}

/// Rules that fired for this job, with their weights.
pub fn breakdown(job: &Job, prefs: &Preferences) -> Vec<(&'static str, u32)> {
    let mut hits = Vec::new();

    let keywords: Vec<String> = prefs
        .role_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();

    if keywords.iter().any(|k| title.contains(k.as_str())) {
        hits.push(("role keyword in title", TITLE_KEYWORD));
    }
    if keywords.iter().any(|k| description.contains(k.as_str())) {
        hits.push(("role keyword in description", DESCRIPTION_KEYWORD));
    }
    if prefs
        .preferred_locations
        .iter()
        .any(|l| l.trim().eq_ignore_ascii_case(job.location.trim()))
    {
        hits.push(("preferred location", LOCATION));
    }
    if prefs.preferred_mode.contains(&job.mode) {
        hits.push(("preferred mode", MODE));
    }
    if let Some(level) = &prefs.experience_level {
        if level.trim().eq_ignore_ascii_case(job.experience.trim()) {
            hits.push(("experience level", EXPERIENCE));
        }
    }
    let skills: Vec<String> = prefs
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if job
        .skills
        .iter()
        .any(|s| skills.contains(&s.trim().to_lowercase()))
    {
        hits.push(("matching skill", SKILL));
    }
    if job.posted_days_ago <= RECENT_DAYS {
        hits.push(("posted recently", RECENT));
    }
    if job.source == Source::PRIVILEGED {
        hits.push(("privileged source", PRIVILEGED_SOURCE));
    }

    hits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
    None,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            80..=u8::MAX => ScoreBand::High,
            60..=79 => ScoreBand::Medium,
            40..=59 => ScoreBand::Low,
            _ => ScoreBand::None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::WorkMode;

    pub(crate) fn job(id: i64, title: &str, location: &str, days: u32) -> Job {
        Job {
            id,
            title: title.to_string(),
            company: format!("Company {}", id),
            description: String::new(),
            location: location.to_string(),
            mode: WorkMode::Onsite,
            experience: "Senior".to_string(),
            skills: Vec::new(),
            posted_days_ago: days,
            source: Source::Other,
            apply_url: format!("https://jobs.example.com/{}", id),
        }
    }

    fn backend_job() -> Job {
        Job {
            id: 1,
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build APIs".to_string(),
            location: "Remote".to_string(),
            mode: WorkMode::Remote,
            experience: "Mid".to_string(),
            skills: vec!["Node".to_string()],
            posted_days_ago: 1,
            source: Source::LinkedIn,
            apply_url: "https://example.com/1".to_string(),
        }
    }

    fn backend_prefs() -> Preferences {
        Preferences {
            role_keywords: vec!["backend".to_string()],
            preferred_locations: vec!["Remote".to_string()],
            preferred_mode: vec![WorkMode::Remote],
            experience_level: Some("Mid".to_string()),
            skills: vec!["node".to_string()],
            min_match_score: 40,
        }
    }

    #[test]
    fn test_score_worked_example() {
        // 25 title + 15 location + 10 mode + 10 experience + 15 skill + 5 recent + 5 source
        assert_eq!(match_score(&backend_job(), &backend_prefs()), 85);
    }

    #[test]
    fn test_score_zero_without_preferences() {
        assert_eq!(match_score(&backend_job(), &Preferences::default()), 0);
        assert_eq!(score(&backend_job(), &backend_prefs(), false), 0);
    }

    #[test]
    fn test_score_tops_out_at_100() {
        let mut job = backend_job();
        job.description = "Senior backend role".to_string();
        // Every rule fires: the weights sum to exactly 100.
        assert_eq!(match_score(&job, &backend_prefs()), 100);
    }

    #[test]
    fn test_score_is_case_insensitive() {
        let mut prefs = backend_prefs();
        prefs.role_keywords = vec!["BACKEND".to_string()];
        prefs.preferred_locations = vec!["remote".to_string()];
        prefs.experience_level = Some("mid".to_string());
        prefs.skills = vec!["NODE".to_string()];
        assert_eq!(match_score(&backend_job(), &prefs), 85);
    }

    #[test]
    fn test_blank_keywords_never_match() {
        let prefs = Preferences {
            role_keywords: vec!["  ".to_string()],
            ..Preferences::default()
        };
        let mut job = backend_job();
        job.posted_days_ago = 10;
        job.source = Source::Other;
        assert!(prefs.is_set());
        assert_eq!(match_score(&job, &prefs), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let job = backend_job();
        let prefs = backend_prefs();
        let first = match_score(&job, &prefs);
        for _ in 0..5 {
            assert_eq!(match_score(&job, &prefs), first);
        }
    }

    #[test]
    fn test_score_stays_in_range() {
        let prefs = backend_prefs();
        for days in [0, 2, 3, 30] {
            for location in ["Remote", "Pune", ""] {
                let score = match_score(&job(9, "Backend Dev", location, days), &prefs);
                assert!(score <= MAX_SCORE);
            }
        }
    }

    #[test]
    fn test_score_band_thresholds() {
        assert_eq!(ScoreBand::of(100), ScoreBand::High);
        assert_eq!(ScoreBand::of(80), ScoreBand::High);
        assert_eq!(ScoreBand::of(79), ScoreBand::Medium);
        assert_eq!(ScoreBand::of(60), ScoreBand::Medium);
        assert_eq!(ScoreBand::of(40), ScoreBand::Low);
        assert_eq!(ScoreBand::of(39), ScoreBand::None);
        assert_eq!(ScoreBand::of(0), ScoreBand::None);
    }
}
