mod app;
mod config;
mod digest;
mod filter;
mod jobs;
mod models;
mod opener;
mod router;
mod scoring;
mod store;
mod tui;
mod views;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use app::{Action, App};
use config::Config;
use filter::{FilterSpec, SortKey};
use models::{split_list, JobStatus, Preferences, WorkMode, CHECKLIST};
use router::{Outcome, Route};
use store::Store;
use views::Block;

const DEMO_JOBS: &str = include_str!("../demos/jobs.json");

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job postings, match them against your preferences, and get a daily digest")]
struct Cli {
    /// Path to the state database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to the job list (JSON array)
    #[arg(long, global = true)]
    jobs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the state database
    Init {
        /// Also write the bundled sample job list if none exists
        #[arg(long)]
        demo: bool,
    },

    /// Render a route, e.g. `/dashboard` or `#/jt/07-test`
    Show {
        #[arg(default_value = "/")]
        path: String,
    },

    /// List jobs with filters
    Dashboard {
        /// Match title or company (case-insensitive)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Exact location
        #[arg(short, long)]
        location: Option<String>,

        /// Filter by status (not-applied, applied, rejected, selected)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<JobStatus>,

        /// Only jobs at or above your minimum match score
        #[arg(short, long)]
        matches: bool,

        /// Sort order (score, latest)
        #[arg(long, default_value = "score", value_parser = parse_sort)]
        sort: SortKey,
    },

    /// Explain a job's match score
    Score {
        /// Job ID
        id: i64,
    },

    /// Manage matching preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Set a job's status
    Status {
        /// Job ID
        id: i64,

        /// New status (not-applied, applied, rejected, selected)
        #[arg(value_parser = parse_status)]
        status: JobStatus,
    },

    /// Save or unsave a job
    Save {
        /// Job ID
        id: i64,
    },

    /// Show saved jobs
    Saved,

    /// Show today's digest
    Digest {
        /// Generate today's digest if it doesn't exist yet
        #[arg(short, long)]
        generate: bool,
    },

    /// Show or update the release test checklist
    Checklist {
        #[command(subcommand)]
        command: Option<ChecklistCommands>,
    },

    /// Open the ship page (locked until every checklist item passes)
    Ship,

    /// Open a job's apply link in the browser
    Apply {
        /// Job ID
        id: i64,
    },

    /// Interactive browser
    Browse,
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show current preferences
    Show,

    /// Update preferences; omitted fields keep their current value
    Set {
        /// Comma-separated role keywords
        #[arg(long)]
        keywords: Option<String>,

        /// Comma-separated preferred locations
        #[arg(long)]
        locations: Option<String>,

        /// Comma-separated work modes (remote, hybrid, onsite)
        #[arg(long)]
        modes: Option<String>,

        /// Experience level; pass an empty string to clear
        #[arg(long)]
        experience: Option<String>,

        /// Comma-separated skills
        #[arg(long)]
        skills: Option<String>,

        /// Minimum match score for the matches filter
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        min_score: Option<u8>,
    },

    /// Restore default preferences
    Reset,
}

#[derive(Subcommand)]
enum ChecklistCommands {
    /// Flip one item (1-based)
    Toggle {
        item: usize,
    },

    /// Mark every item as not passed
    Reset,
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    JobStatus::parse(s).ok_or_else(|| {
        format!("unknown status '{}' (expected not-applied, applied, rejected, selected)", s)
    })
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    SortKey::parse(s).ok_or_else(|| format!("unknown sort '{}' (expected score or latest)", s))
}

fn parse_modes(s: &str) -> Result<Vec<WorkMode>> {
    split_list(s)
        .iter()
        .map(|m| WorkMode::parse(m).ok_or_else(|| anyhow!("Unknown work mode '{}'", m)))
        .collect()
}

fn init_logging() {
    let filter = EnvFilter::try_new(config::log_filter()).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::resolve(cli.db, cli.jobs);
    let store = Store::open(&config.db_path)?;

    if let Commands::Init { demo } = cli.command {
        let db_path = store.path().unwrap_or(&config.db_path);
        println!("State database initialized at {}", db_path.display());
        if demo && !config.jobs_path.exists() {
            if let Some(parent) = config.jobs_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config.jobs_path, DEMO_JOBS)
                .with_context(|| format!("Failed to write {}", config.jobs_path.display()))?;
            println!("Sample job list written to {}", config.jobs_path.display());
        } else {
            println!("Job list: {}", config.jobs_path.display());
        }
        return Ok(());
    }

    let jobs = jobs::load_jobs(&config.jobs_path)
        .context("Run 'jobtrack init --demo' or pass --jobs <file>")?;
    let today = chrono::Local::now().date_naive();
    let mut app = App::new(store, jobs, today)?;

    match cli.command {
        // Handled before the job list is loaded
        Commands::Init { .. } => {}

        Commands::Show { path } => {
            app.dispatch(Action::Navigate(path))?;
            print_shell(&app);
        }

        Commands::Dashboard {
            keyword,
            location,
            status,
            matches,
            sort,
        } => {
            app.dispatch(Action::SetFilter(FilterSpec {
                keyword,
                location,
                status,
                only_above_threshold: matches,
                sort,
            }))?;
            app.dispatch(Action::Navigate(Route::Dashboard.path().to_string()))?;
            print_dashboard(&app);
        }

        Commands::Score { id } => {
            let job = jobs::find(app.jobs(), id).ok_or_else(|| anyhow!("Job #{} not found", id))?;
            let prefs = &app.state().preferences;
            println!("Job #{} - {} at {}", job.id, job.title, job.company);
            if !prefs.is_set() {
                println!("No preferences set; score is 0. Run 'jobtrack prefs set'.");
            } else {
                for (rule, points) in scoring::breakdown(job, prefs) {
                    println!("  +{:<3} {}", points, rule);
                }
                println!("Score: {}%", scoring::match_score(job, prefs));
            }
        }

        Commands::Prefs { command } => match command {
            PrefsCommands::Show => {
                app.dispatch(Action::Navigate(Route::Settings.path().to_string()))?;
                println!("{}", app.shell().root);
            }

            PrefsCommands::Set {
                keywords,
                locations,
                modes,
                experience,
                skills,
                min_score,
            } => {
                let mut prefs = app.state().preferences.clone();
                if let Some(k) = keywords {
                    prefs.role_keywords = split_list(&k);
                }
                if let Some(l) = locations {
                    prefs.preferred_locations = split_list(&l);
                }
                if let Some(m) = modes {
                    prefs.preferred_mode = parse_modes(&m)?;
                }
                if let Some(e) = experience {
                    let e = e.trim().to_string();
                    prefs.experience_level = (!e.is_empty()).then_some(e);
                }
                if let Some(s) = skills {
                    prefs.skills = split_list(&s);
                }
                if let Some(min) = min_score {
                    prefs.min_match_score = min;
                }
                app.dispatch(Action::SavePreferences(prefs))?;
                print_toasts(&mut app);
            }

            PrefsCommands::Reset => {
                app.dispatch(Action::SavePreferences(Preferences::default()))?;
                print_toasts(&mut app);
            }
        },

        Commands::Status { id, status } => {
            if jobs::find(app.jobs(), id).is_none() {
                return Err(anyhow!("Job #{} not found", id));
            }
            app.dispatch(Action::SetStatus { job_id: id, status })?;
            print_toasts(&mut app);
        }

        Commands::Save { id } => {
            if jobs::find(app.jobs(), id).is_none() {
                return Err(anyhow!("Job #{} not found", id));
            }
            app.dispatch(Action::ToggleSaved(id))?;
            print_toasts(&mut app);
        }

        Commands::Saved => {
            app.dispatch(Action::Navigate(Route::Saved.path().to_string()))?;
            println!("{}", app.shell().root);
        }

        Commands::Digest { generate } => {
            app.dispatch(Action::Navigate(Route::Digest.path().to_string()))?;
            if generate {
                app.dispatch(Action::GenerateDigest)?;
                print_toasts(&mut app);
            }
            println!("{}", app.shell().root);
            if app.state().preferences.is_set() && app.todays_digest().is_none() {
                println!("\nRun 'jobtrack digest --generate' to create it.");
            }
        }

        Commands::Checklist { command } => {
            match command {
                Some(ChecklistCommands::Toggle { item }) => {
                    if item == 0 || item > CHECKLIST.len() {
                        return Err(anyhow!("Checklist item must be between 1 and {}", CHECKLIST.len()));
                    }
                    app.dispatch(Action::ToggleCheck(item - 1))?;
                }
                Some(ChecklistCommands::Reset) => app.dispatch(Action::ResetChecklist)?,
                None => {}
            }
            app.dispatch(Action::Navigate(Route::TestChecklist.path().to_string()))?;
            println!("{}", app.shell().root);
        }

        Commands::Ship => {
            app.dispatch(Action::Navigate(Route::Ship.path().to_string()))?;
            println!("{}", app.shell().root);
        }

        Commands::Apply { id } => {
            let url = app
                .apply_url(id)
                .ok_or_else(|| anyhow!("Job #{} not found", id))?;
            println!("Opening {}", url);
            opener::open_url(url)?;
        }

        Commands::Browse => {
            app.dispatch(Action::Navigate(Route::Dashboard.path().to_string()))?;
            tui::run_browse(&mut app)?;
        }
    }

    Ok(())
}

fn print_toasts(app: &mut App) {
    for toast in app.take_toasts() {
        println!("{}", toast);
    }
}

fn print_shell(app: &App) {
    let shell = app.shell();
    if app.render_outcome() == Outcome::Locked {
        println!("[{}] (locked)", shell.active_path);
    } else {
        println!("[{}] {}", shell.active_path, shell.document_title);
    }
    println!("{}", shell.root);
}

fn print_dashboard(app: &App) {
    let root = &app.shell().root;
    for block in &root.blocks {
        if let Block::Notice(text) = block {
            println!("{}\n", text);
        }
    }

    let cards: Vec<_> = root
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Card { card, .. } => Some(card),
            _ => None,
        })
        .collect();

    println!("Filters: {}", app.filter().summary());
    if cards.is_empty() {
        println!("No roles match your criteria.");
        return;
    }

    println!(
        "{:<5} {:>5} {:<12} {:<30} {:<18} {:<18}",
        "ID", "SCORE", "STATUS", "TITLE", "COMPANY", "LOCATION"
    );
    println!("{}", "-".repeat(91));
    for card in cards {
        let score = card.score.map(|s| format!("{}%", s)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<5} {:>5} {:<12} {:<30} {:<18} {:<18}",
            card.id,
            score,
            card.status.as_str(),
            truncate(&card.title, 28),
            truncate(&card.company, 16),
            truncate(&format!("{} ({})", card.location, card.mode), 18)
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
