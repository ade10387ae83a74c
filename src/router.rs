use crate::views::{self, Page, RenderContext, StaticPage};

pub const APP_NAME: &str = "Job Tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Dashboard,
    Settings,
    Digest,
    Saved,
    Proof,
    TestChecklist,
    Ship,
}

impl Route {
    /// Navigation order.
    pub const ALL: [Route; 8] = [
        Route::Home,
        Route::Dashboard,
        Route::Settings,
        Route::Digest,
        Route::Saved,
        Route::Proof,
        Route::TestChecklist,
        Route::Ship,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Settings => "/settings",
            Route::Digest => "/digest",
            Route::Saved => "/saved",
            Route::Proof => "/proof",
            Route::TestChecklist => "/jt/07-test",
            Route::Ship => "/jt/08-ship",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Dashboard => "Dashboard",
            Route::Settings => "Settings",
            Route::Digest => "Digest",
            Route::Saved => "Saved",
            Route::Proof => "Proof",
            Route::TestChecklist => "Test Checklist",
            Route::Ship => "Ship",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Unknown paths land on Home.
    pub fn resolve(path: &str) -> Route {
        Self::from_path(path).unwrap_or(Route::Home)
    }

    /// Shows the cards of jobs that can be acted on (status, save, apply).
    pub fn lists_jobs(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Digest | Route::Saved)
    }
}

/// `#/dashboard`, `/dashboard` and `dashboard` all name the same path; empty is `/`.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches('#');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

pub enum RouteView {
    Static(&'static StaticPage),
    Dynamic(fn(&RenderContext) -> Page),
}

pub fn view(route: Route) -> RouteView {
    match route {
        Route::Home => RouteView::Static(&views::HOME),
        Route::Dashboard => RouteView::Dynamic(views::dashboard),
        Route::Settings => RouteView::Dynamic(views::settings),
        Route::Digest => RouteView::Dynamic(views::digest),
        Route::Saved => RouteView::Dynamic(views::saved),
        Route::Proof => RouteView::Static(&views::PROOF),
        Route::TestChecklist => RouteView::Dynamic(views::checklist),
        Route::Ship => RouteView::Static(&views::SHIP),
    }
}

/// What the user is looking at: the window title, the highlighted nav link
/// and the page body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shell {
    pub document_title: String,
    pub active_path: String,
    pub root: Page,
}

impl Shell {
    pub fn is_active(&self, route: Route) -> bool {
        self.active_path == route.path()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rendered(Route),
    /// Ship was requested before the checklist was complete.
    Locked,
}

pub fn render(shell: &mut Shell, path: &str, ctx: &RenderContext) -> Outcome {
    let path = normalize(path);

    if path == Route::Ship.path() && !ctx.state.checklist_complete() {
        tracing::info!(passed = ctx.state.passed_count(), "ship is locked");
        shell.root = views::locked();
        shell.active_path = path;
        return Outcome::Locked;
    }

    let route = Route::resolve(&path);
    if Route::from_path(&path).is_none() {
        tracing::debug!(%path, "unknown route, showing home");
    }

    shell.root = match view(route) {
        RouteView::Static(page) => page.to_page(),
        RouteView::Dynamic(render_fn) => render_fn(ctx),
    };
    shell.document_title = format!("{} - {}", APP_NAME, route.title());
    shell.active_path = path;
    Outcome::Rendered(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::filter::FilterSpec;
    use crate::models::{JobStatus, Preferences, StatusEntry, CHECKLIST};
    use crate::scoring::tests::job;
    use crate::views::Block;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn render_with(state: &AppState, path: &str) -> (Shell, Outcome) {
        let jobs = vec![job(1, "Rust Engineer", "Remote", 1), job(2, "Designer", "Pune", 9)];
        let filter = FilterSpec::default();
        let ctx = RenderContext {
            jobs: &jobs,
            state,
            filter: &filter,
            draft: None,
            today: today(),
            todays_digest: None,
        };
        let mut shell = Shell::default();
        let outcome = render(&mut shell, path, &ctx);
        (shell, outcome)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("#"), "/");
        assert_eq!(normalize("#/dashboard"), "/dashboard");
        assert_eq!(normalize("settings"), "/settings");
        assert_eq!(normalize(" /jt/07-test "), "/jt/07-test");
    }

    #[test]
    fn test_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_unknown_path_falls_back_to_home() {
        let (shell, outcome) = render_with(&AppState::default(), "#/nowhere");
        assert_eq!(outcome, Outcome::Rendered(Route::Home));
        assert_eq!(shell.document_title, "Job Tracker - Home");
        assert_eq!(shell.root.heading, "Stop Missing The Right Jobs.");
        assert_eq!(shell.active_path, "/nowhere");
        assert!(Route::ALL.iter().all(|r| !shell.is_active(*r)));
    }

    #[test]
    fn test_render_sets_title_and_active_link() {
        let (shell, outcome) = render_with(&AppState::default(), "#/dashboard");
        assert_eq!(outcome, Outcome::Rendered(Route::Dashboard));
        assert_eq!(shell.document_title, "Job Tracker - Dashboard");
        assert!(shell.is_active(Route::Dashboard));
        assert!(!shell.is_active(Route::Home));
    }

    #[test]
    fn test_ship_is_locked_until_checklist_complete() {
        let mut state = AppState::default();
        state.checklist = vec![true; CHECKLIST.len()];
        state.checklist[3] = false;

        let mut shell = Shell {
            document_title: "Job Tracker - Test Checklist".to_string(),
            ..Shell::default()
        };
        let jobs = Vec::new();
        let filter = FilterSpec::default();
        let ctx = RenderContext {
            jobs: &jobs,
            state: &state,
            filter: &filter,
            draft: None,
            today: today(),
            todays_digest: None,
        };
        assert_eq!(render(&mut shell, "/jt/08-ship", &ctx), Outcome::Locked);
        assert_eq!(shell.root.heading, "Shipment Locked");
        assert!(!shell.root.to_lines().iter().any(|l| l.contains("Shipment Ready")));
        assert!(shell.is_active(Route::Ship));
        // A blocked attempt leaves the title alone.
        assert_eq!(shell.document_title, "Job Tracker - Test Checklist");
    }

    #[test]
    fn test_ship_renders_when_checklist_complete() {
        let mut state = AppState::default();
        state.checklist = vec![true; CHECKLIST.len()];
        let (shell, outcome) = render_with(&state, "/jt/08-ship");
        assert_eq!(outcome, Outcome::Rendered(Route::Ship));
        assert_eq!(shell.root.heading, "Shipment Ready");
        assert_eq!(shell.document_title, "Job Tracker - Ship");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut state = AppState::default();
        state.preferences = Preferences {
            role_keywords: vec!["rust".to_string()],
            ..Preferences::default()
        };
        state.statuses.insert(
            2,
            StatusEntry {
                status: JobStatus::Rejected,
                date: today(),
            },
        );
        for route in Route::ALL {
            let (first, _) = render_with(&state, route.path());
            let (second, _) = render_with(&state, route.path());
            assert_eq!(first, second, "{}", route.path());
        }
    }

    #[test]
    fn test_dashboard_hides_scores_until_preferences_set() {
        let (shell, _) = render_with(&AppState::default(), "/dashboard");
        assert!(matches!(shell.root.blocks[0], Block::Notice(_)));
        let scores: Vec<Option<u8>> = shell
            .root
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Card { card, .. } => Some(card.score),
                _ => None,
            })
            .collect();
        assert_eq!(scores, vec![None, None]);

        let mut state = AppState::default();
        state.preferences.role_keywords = vec!["rust".to_string()];
        let (shell, _) = render_with(&state, "/dashboard");
        let first_card = shell.root.blocks.iter().find_map(|b| match b {
            Block::Card { card, .. } => Some(card.clone()),
            _ => None,
        });
        // 25 for the title keyword, 5 for being posted yesterday.
        assert_eq!(first_card.map(|c| (c.id, c.score)), Some((1, Some(30))));
    }

    #[test]
    fn test_digest_view_requires_preferences() {
        let (shell, _) = render_with(&AppState::default(), "/digest");
        assert_eq!(
            shell.root.blocks,
            vec![Block::Empty(
                "Set your preferences to generate a personalized digest.".to_string()
            )]
        );
    }

    #[test]
    fn test_checklist_view_counts_passed() {
        let mut state = AppState::default();
        state.checklist[0] = true;
        state.checklist[4] = true;
        let (shell, _) = render_with(&state, "/jt/07-test");
        assert_eq!(shell.root.blocks[0], Block::Heading("Tests Passed: 2 / 10".to_string()));
        assert_eq!(shell.root.selectables().len(), CHECKLIST.len());
    }
}
