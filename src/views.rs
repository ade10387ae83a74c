use chrono::NaiveDate;
use std::fmt;

use crate::app::AppState;
use crate::digest;
use crate::filter::{self, FilterSpec};
use crate::models::{
    effective_status, DigestRecord, Job, JobStatus, Preferences, Source, WorkMode, CHECKLIST,
};
use crate::router::Route;
use crate::scoring::ScoreBand;

const WRAP_WIDTH: usize = 78;

/// Everything a view may read. Views never touch the store.
pub struct RenderContext<'a> {
    pub jobs: &'a [Job],
    pub state: &'a AppState,
    pub filter: &'a FilterSpec,
    /// Unsaved Settings edit, shown instead of the stored preferences.
    pub draft: Option<&'a Preferences>,
    pub today: NaiveDate,
    pub todays_digest: Option<&'a DigestRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub mode: WorkMode,
    pub experience: String,
    pub source: Source,
    /// Only shown once preferences are configured.
    pub score: Option<u8>,
    pub status: JobStatus,
    pub saved: bool,
    pub apply_url: String,
}

impl JobCard {
    fn new(job: &Job, score: u8, ctx: &RenderContext) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            mode: job.mode,
            experience: job.experience.clone(),
            source: job.source,
            score: ctx.state.preferences.is_set().then_some(score),
            status: effective_status(&ctx.state.statuses, job.id),
            saved: ctx.state.saved.contains(&job.id),
            apply_url: job.apply_url.clone(),
        }
    }

    pub fn band(&self) -> ScoreBand {
        self.score.map(ScoreBand::of).unwrap_or(ScoreBand::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    /// Banner or warning the user should act on.
    Notice(String),
    Success(String),
    Link { label: String, path: &'static str },
    Card { rank: Option<usize>, card: JobCard },
    Check {
        index: usize,
        label: &'static str,
        hint: &'static str,
        checked: bool,
    },
    /// One option of a multi-select preference.
    Toggle {
        choice: Choice,
        label: String,
        checked: bool,
    },
    Empty(String),
}

/// Multi-select preference options. Locations index into `filter::locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Location(usize),
    Mode(WorkMode),
}

/// Things the user can select and act on inside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selectable {
    Job(i64),
    Check(usize),
    Choice(Choice),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub heading: String,
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn selectables(&self) -> Vec<Selectable> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Card { card, .. } => Some(Selectable::Job(card.id)),
                Block::Check { index, .. } => Some(Selectable::Check(*index)),
                Block::Toggle { choice, .. } => Some(Selectable::Choice(*choice)),
                _ => None,
            })
            .collect()
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![self.heading.clone(), "=".repeat(self.heading.chars().count())];
        for block in &self.blocks {
            lines.push(String::new());
            match block {
                Block::Heading(text) => lines.push(text.clone()),
                Block::Paragraph(text) => {
                    lines.extend(textwrap::wrap(text, WRAP_WIDTH).into_iter().map(|l| l.into_owned()))
                }
                Block::Notice(text) => lines.push(format!("! {}", text)),
                Block::Success(text) => lines.push(format!("✓ {}", text)),
                Block::Link { label, path } => lines.push(format!("→ {} (#{})", label, path)),
                Block::Card { rank, card } => lines.extend(card_lines(*rank, card)),
                Block::Check {
                    index,
                    label,
                    hint,
                    checked,
                } => {
                    let mark = if *checked { "x" } else { " " };
                    lines.push(format!("[{}] {:>2}. {}", mark, index + 1, label));
                    lines.push(format!("        {}", hint));
                }
                Block::Toggle { label, checked, .. } => {
                    let mark = if *checked { "x" } else { " " };
                    lines.push(format!("[{}] {}", mark, label));
                }
                Block::Empty(text) => lines.push(format!("({})", text)),
            }
        }
        lines
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lines().join("\n"))
    }
}

pub fn card_lines(rank: Option<usize>, card: &JobCard) -> Vec<String> {
    let mut header = match rank {
        Some(r) => format!("{:>2}. #{} {}", r, card.id, card.title),
        None => format!("#{} {}", card.id, card.title),
    };
    if let Some(score) = card.score {
        header.push_str(&format!("  [{}%]", score));
    }
    header.push_str(&format!("  [{}]", card.source.as_str()));
    if card.saved {
        header.push_str("  ★");
    }

    vec![
        header,
        format!(
            "    {} · {} ({}) | {}",
            card.company, card.location, card.mode, card.experience
        ),
        format!("    Status: {}", card.status),
        format!("    Apply: {}", card.apply_url),
    ]
}

// --- Static pages ---

pub struct StaticPage {
    pub heading: &'static str,
    pub paragraphs: &'static [&'static str],
    pub link: Option<(&'static str, Route)>,
}

impl StaticPage {
    pub fn to_page(&self) -> Page {
        let mut page = Page::new(self.heading);
        for text in self.paragraphs {
            page.push(Block::Paragraph(text.to_string()));
        }
        if let Some((label, route)) = self.link {
            page.push(Block::Link {
                label: label.to_string(),
                path: route.path(),
            });
        }
        page
    }
}

pub static HOME: StaticPage = StaticPage {
    heading: "Stop Missing The Right Jobs.",
    paragraphs: &["Precision-matched job discovery delivered daily at 9AM."],
    link: Some(("Start Tracking", Route::Settings)),
};

pub static PROOF: StaticPage = StaticPage {
    heading: "Proof of Work",
    paragraphs: &["Placeholder"],
    link: None,
};

pub static SHIP: StaticPage = StaticPage {
    heading: "Shipment Ready",
    paragraphs: &["Congratulations! All tests passed. The application is ready for deployment."],
    link: None,
};

pub fn locked() -> Page {
    let mut page = Page::new("Shipment Locked");
    page.push(Block::Notice(
        "Please complete all items in the Test Checklist before shipping.".to_string(),
    ))
    .push(Block::Link {
        label: "Test Checklist".to_string(),
        path: Route::TestChecklist.path(),
    });
    page
}

// --- Dynamic pages ---

pub fn dashboard(ctx: &RenderContext) -> Page {
    let prefs = &ctx.state.preferences;
    let mut page = Page::new("Dashboard");

    if !prefs.is_set() {
        page.push(Block::Notice(
            "Set your preferences to activate intelligent matching.".to_string(),
        ))
        .push(Block::Link {
            label: "Settings".to_string(),
            path: Route::Settings.path(),
        });
    }
    page.push(Block::Paragraph(format!("Filters: {}", ctx.filter.summary())));

    let shown = filter::apply(ctx.jobs, prefs, &ctx.state.statuses, ctx.filter);
    if shown.is_empty() {
        page.push(Block::Empty("No roles match your criteria.".to_string()));
    }
    for (job, score) in shown {
        page.push(Block::Card {
            rank: None,
            card: JobCard::new(job, score, ctx),
        });
    }
    page
}

pub fn settings(ctx: &RenderContext) -> Page {
    let saved = &ctx.state.preferences;
    let prefs = ctx.draft.unwrap_or(saved);
    let mut page = Page::new("Settings");

    if !saved.is_set() {
        page.push(Block::Notice("Using default preferences; matching is off.".to_string()));
    }
    if prefs != saved {
        page.push(Block::Notice("Unsaved changes.".to_string()));
    }

    page.push(Block::Paragraph(format!("Role keywords: {}", list_or_none(&prefs.role_keywords))));

    page.push(Block::Heading("Preferred locations".to_string()));
    let locations = filter::locations(ctx.jobs);
    if locations.is_empty() {
        page.push(Block::Empty("No locations in the job list.".to_string()));
    }
    for (i, location) in locations.into_iter().enumerate() {
        page.push(Block::Toggle {
            choice: Choice::Location(i),
            checked: prefs.preferred_locations.contains(&location),
            label: location,
        });
    }
    // Set from the command line, not offered by the current job list
    let others: Vec<&String> = prefs
        .preferred_locations
        .iter()
        .filter(|l| !ctx.jobs.iter().any(|job| job.location == **l))
        .collect();
    if !others.is_empty() {
        page.push(Block::Paragraph(format!("Also: {}", list_or_none(&others))));
    }

    page.push(Block::Heading("Preferred mode".to_string()));
    for mode in WorkMode::ALL {
        page.push(Block::Toggle {
            choice: Choice::Mode(mode),
            label: mode.to_string(),
            checked: prefs.preferred_mode.contains(&mode),
        });
    }

    page.push(Block::Heading("Matching".to_string()))
        .push(Block::Paragraph(format!(
            "Experience level: {}",
            prefs.experience_level.as_deref().unwrap_or("(any)")
        )))
        .push(Block::Paragraph(format!("Skills: {}", list_or_none(&prefs.skills))))
        .push(Block::Paragraph(format!("Minimum match score: {}", prefs.min_match_score)));
    page
}

pub fn digest(ctx: &RenderContext) -> Page {
    let mut page = Page::new("Daily Digest");

    if !ctx.state.preferences.is_set() {
        page.push(Block::Empty(
            "Set your preferences to generate a personalized digest.".to_string(),
        ));
        return page;
    }

    let Some(record) = ctx.todays_digest else {
        page.push(Block::Paragraph(format!(
            "No digest generated for {} yet. Generate it to see your top matches.",
            ctx.today
        )));
        return page;
    };

    page.push(Block::Heading(format!(
        "Top {} Jobs For You ({})",
        digest::DIGEST_SIZE,
        record.date.format("%d %b %Y")
    )));
    if record.entries.is_empty() {
        page.push(Block::Empty("No matching roles today.".to_string()));
    }
    for (i, entry) in record.entries.iter().enumerate() {
        // Scores stay frozen at generation; status and saved flags are live.
        page.push(Block::Card {
            rank: Some(i + 1),
            card: JobCard::new(&entry.job, entry.score, ctx),
        });
    }

    let updates = digest::recent_updates(&ctx.state.statuses, ctx.jobs);
    if !updates.is_empty() {
        page.push(Block::Heading("Recent Status Updates".to_string()));
        for (job, entry) in updates {
            page.push(Block::Paragraph(format!(
                "{}: {} at {} ({})",
                entry.status, job.title, job.company, entry.date
            )));
        }
    }
    page
}

pub fn saved(ctx: &RenderContext) -> Page {
    let mut page = Page::new("Saved Jobs");
    let prefs = &ctx.state.preferences;

    let saved: Vec<&Job> = ctx
        .jobs
        .iter()
        .filter(|job| ctx.state.saved.contains(&job.id))
        .collect();
    if saved.is_empty() {
        page.push(Block::Empty("You haven't saved any jobs yet.".to_string()));
    }
    for job in saved {
        page.push(Block::Card {
            rank: None,
            card: JobCard::new(job, crate::scoring::match_score(job, prefs), ctx),
        });
    }
    page
}

pub fn checklist(ctx: &RenderContext) -> Page {
    let mut page = Page::new("Test Checklist");
    let passed = ctx.state.passed_count();

    page.push(Block::Heading(format!("Tests Passed: {} / {}", passed, CHECKLIST.len())));
    if ctx.state.checklist_complete() {
        page.push(Block::Success("Ready to ship!".to_string()));
    } else {
        page.push(Block::Notice("Resolve all issues before shipping.".to_string()));
    }

    for (index, item) in CHECKLIST.iter().enumerate() {
        page.push(Block::Check {
            index,
            label: item.label,
            hint: item.hint,
            checked: ctx.state.checklist.get(index).copied().unwrap_or(false),
        });
    }
    page
}

fn list_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
    }
}
