use anyhow::Result;
use chrono::NaiveDate;

use crate::digest;
use crate::filter::FilterSpec;
use crate::jobs;
use crate::models::{DigestRecord, Job, JobStatus, Preferences, StatusEntry, StatusMap, CHECKLIST};
use crate::router::{self, Outcome, Route, Shell};
use crate::store::Store;
use crate::views::RenderContext;

/// In-memory copy of everything persisted, loaded once and written back
/// slot by slot as it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub preferences: Preferences,
    pub statuses: StatusMap,
    pub checklist: Vec<bool>,
    pub saved: Vec<i64>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            preferences: Preferences::default(),
            statuses: StatusMap::new(),
            checklist: vec![false; CHECKLIST.len()],
            saved: Vec::new(),
        }
    }
}

impl AppState {
    pub fn load(store: &Store) -> Result<Self> {
        Ok(Self {
            preferences: store.load_preferences()?,
            statuses: store.load_statuses()?,
            checklist: store.load_checklist()?,
            saved: store.load_saved_jobs()?,
        })
    }

    pub fn passed_count(&self) -> usize {
        self.checklist.iter().filter(|passed| **passed).count()
    }

    pub fn checklist_complete(&self) -> bool {
        self.passed_count() == CHECKLIST.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(String),
    SetFilter(FilterSpec),
    /// Stage an edit on the Settings page without persisting it.
    EditPreferences(Preferences),
    SavePreferences(Preferences),
    SetStatus { job_id: i64, status: JobStatus },
    ToggleCheck(usize),
    ResetChecklist,
    GenerateDigest,
    ToggleSaved(i64),
}

pub struct App {
    store: Store,
    jobs: Vec<Job>,
    state: AppState,
    filter: FilterSpec,
    draft: Option<Preferences>,
    path: String,
    shell: Shell,
    outcome: Outcome,
    today: NaiveDate,
    todays_digest: Option<DigestRecord>,
    toasts: Vec<String>,
}

impl App {
    pub fn new(store: Store, jobs: Vec<Job>, today: NaiveDate) -> Result<Self> {
        let state = AppState::load(&store)?;
        let todays_digest = store.load_digest(today)?;
        let mut app = Self {
            store,
            jobs,
            state,
            filter: FilterSpec::default(),
            draft: None,
            path: Route::Home.path().to_string(),
            shell: Shell::default(),
            outcome: Outcome::Rendered(Route::Home),
            today,
            todays_digest,
            toasts: Vec::new(),
        };
        app.render();
        Ok(app)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Whether the last render showed the requested view or the Ship lock.
    pub fn render_outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Preferences as shown on the Settings page: the unsaved edit if any.
    pub fn preferences_draft(&self) -> &Preferences {
        self.draft.as_ref().unwrap_or(&self.state.preferences)
    }

    pub fn todays_digest(&self) -> Option<&DigestRecord> {
        self.todays_digest.as_ref()
    }

    /// The route the current path resolves to (Ship even while locked).
    pub fn route(&self) -> Route {
        Route::resolve(&self.path)
    }

    /// Toasts raised since the last call, oldest first.
    pub fn take_toasts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.toasts)
    }

    pub fn apply_url(&self, job_id: i64) -> Option<&str> {
        jobs::find(&self.jobs, job_id).map(|job| job.apply_url.as_str())
    }

    /// Roll over to a new calendar day; the cached digest follows the date.
    pub fn set_today(&mut self, today: NaiveDate) -> Result<()> {
        if today != self.today {
            self.today = today;
            self.todays_digest = self.store.load_digest(today)?;
            self.state_changed();
        }
        Ok(())
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        if self.apply(action)? {
            self.state_changed();
        }
        Ok(())
    }

    fn state_changed(&mut self) {
        self.render();
    }

    pub fn render(&mut self) -> Outcome {
        let ctx = RenderContext {
            jobs: &self.jobs,
            state: &self.state,
            filter: &self.filter,
            draft: self.draft.as_ref(),
            today: self.today,
            todays_digest: self.todays_digest.as_ref(),
        };
        self.outcome = router::render(&mut self.shell, &self.path, &ctx);
        self.outcome
    }

    /// Returns whether anything visible changed.
    fn apply(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Navigate(path) => {
                self.path = router::normalize(&path);
                tracing::debug!(path = %self.path, "navigate");
            }

            Action::SetFilter(filter) => {
                self.filter = filter;
            }

            Action::EditPreferences(prefs) => {
                self.draft = (prefs != self.state.preferences).then_some(prefs);
            }

            Action::SavePreferences(prefs) => {
                self.store.save_preferences(&prefs)?;
                self.state.preferences = prefs;
                self.draft = None;
                tracing::info!(set = self.state.preferences.is_set(), "preferences saved");
                self.toast("Preferences saved!");
            }

            Action::SetStatus { job_id, status } => {
                if jobs::find(&self.jobs, job_id).is_none() {
                    tracing::warn!(job_id, "status change for unknown job ignored");
                    return Ok(false);
                }
                let mut statuses = self.state.statuses.clone();
                statuses.insert(
                    job_id,
                    StatusEntry {
                        status,
                        date: self.today,
                    },
                );
                self.store.save_statuses(&statuses)?;
                self.state.statuses = statuses;
                tracing::info!(job_id, %status, "status updated");
                self.toast(format!("Status updated: {}", status));
            }

            Action::ToggleCheck(index) => {
                let mut checklist = self.state.checklist.clone();
                let Some(flag) = checklist.get_mut(index) else {
                    return Ok(false);
                };
                *flag = !*flag;
                self.store.save_checklist(&checklist)?;
                self.state.checklist = checklist;
            }

            Action::ResetChecklist => {
                let checklist = vec![false; CHECKLIST.len()];
                self.store.save_checklist(&checklist)?;
                self.state.checklist = checklist;
            }

            Action::GenerateDigest => {
                if !self.state.preferences.is_set() {
                    self.toast("Set your preferences to generate a personalized digest.");
                    return Ok(false);
                }
                let record =
                    digest::generate(&self.store, &self.jobs, &self.state.preferences, self.today)?;
                self.todays_digest = Some(record);
            }

            Action::ToggleSaved(job_id) => {
                if jobs::find(&self.jobs, job_id).is_none() {
                    return Ok(false);
                }
                let mut saved = self.state.saved.clone();
                let message = if let Some(pos) = saved.iter().position(|id| *id == job_id) {
                    saved.remove(pos);
                    "Job removed from saved"
                } else {
                    saved.push(job_id);
                    "Job saved"
                };
                self.store.save_saved_jobs(&saved)?;
                self.state.saved = saved;
                self.toast(message);
            }
        }
        Ok(true)
    }

    fn toast(&mut self, message: impl Into<String>) {
        self.toasts.push(message.into());
    }
}
