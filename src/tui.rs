use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::stdout;

use crate::app::{Action, App};
use crate::filter::{self, SortKey};
use crate::models::{split_list, JobStatus, Preferences};
use crate::opener;
use crate::router::Route;
use crate::scoring::{ScoreBand, MAX_SCORE};
use crate::views::{Block as PageBlock, Choice, Selectable};

const SCORE_STEP: u8 = 5;

/// What an open text prompt edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Search,
    RoleKeywords,
    Skills,
    Experience,
}

impl Field {
    fn label(&self) -> &'static str {
        match self {
            Field::Search => "keyword",
            Field::RoleKeywords => "role keywords (comma-separated)",
            Field::Skills => "skills (comma-separated)",
            Field::Experience => "experience level",
        }
    }
}

struct TuiState {
    selected: usize,
    input: Option<(Field, String)>,
    toast: Option<String>,
}

impl TuiState {
    fn new() -> Self {
        Self {
            selected: 0,
            input: None,
            toast: None,
        }
    }

    fn clamp(&mut self, count: usize) {
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }
}

pub fn run_browse(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    let mut state = TuiState::new();

    loop {
        app.set_today(chrono::Local::now().date_naive())?;
        state.clamp(app.shell().root.selectables().len());
        terminal.draw(|frame| draw(frame, app, &state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if state.input.is_some() {
                handle_input(key.code, app, &mut state)?;
            } else if !handle_key(key.code, app, &mut state)? {
                break;
            }

            if let Some(last) = app.take_toasts().pop() {
                state.toast = Some(last);
            }
        }
    }
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_key(code: KeyCode, app: &mut App, state: &mut TuiState) -> Result<bool> {
    let route = app.route();
    let selected = app.shell().root.selectables().get(state.selected).copied();
    let selected_job = match selected {
        Some(Selectable::Job(id)) if route.lists_jobs() => Some(id),
        _ => None,
    };

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
        KeyCode::Char(c @ '1'..='8') => {
            let index = c as usize - '1' as usize;
            app.dispatch(Action::Navigate(Route::ALL[index].path().to_string()))?;
            state.selected = 0;
            state.toast = None;
        }
        KeyCode::Down | KeyCode::Char('j') => state.selected = state.selected.saturating_add(1),
        KeyCode::Up | KeyCode::Char('k') => state.selected = state.selected.saturating_sub(1),

        // Dashboard filters
        KeyCode::Char('/') if route == Route::Dashboard => {
            state.input = Some((Field::Search, app.filter().keyword.clone().unwrap_or_default()));
        }
        KeyCode::Char('l') if route == Route::Dashboard => {
            let mut options: Vec<Option<String>> = vec![None];
            options.extend(filter::locations(app.jobs()).into_iter().map(Some));
            let mut criteria = app.filter().clone();
            criteria.location = next_option(&options, &criteria.location);
            app.dispatch(Action::SetFilter(criteria))?;
        }
        KeyCode::Char('f') if route == Route::Dashboard => {
            let mut options: Vec<Option<JobStatus>> = vec![None];
            options.extend(JobStatus::ALL.into_iter().map(Some));
            let mut criteria = app.filter().clone();
            criteria.status = next_option(&options, &criteria.status);
            app.dispatch(Action::SetFilter(criteria))?;
        }
        KeyCode::Char('m') if route == Route::Dashboard => {
            let mut criteria = app.filter().clone();
            criteria.only_above_threshold = !criteria.only_above_threshold;
            app.dispatch(Action::SetFilter(criteria))?;
        }
        KeyCode::Char('o') if route == Route::Dashboard => {
            let mut criteria = app.filter().clone();
            criteria.sort = match criteria.sort {
                SortKey::Score => SortKey::Latest,
                SortKey::Latest => SortKey::Score,
            };
            app.dispatch(Action::SetFilter(criteria))?;
        }

        // Job cards
        KeyCode::Char(c @ ('n' | 'a' | 'x' | 'y')) => {
            if let Some(job_id) = selected_job {
                let status = match c {
                    'n' => JobStatus::NotApplied,
                    'a' => JobStatus::Applied,
                    'x' => JobStatus::Rejected,
                    _ => JobStatus::Selected,
                };
                app.dispatch(Action::SetStatus { job_id, status })?;
            }
        }
        KeyCode::Char('s') => {
            if let Some(job_id) = selected_job {
                app.dispatch(Action::ToggleSaved(job_id))?;
            }
        }
        KeyCode::Enter => {
            if let Some(url) = selected_job.and_then(|id| app.apply_url(id)) {
                state.toast = Some(match opener::open_url(url) {
                    Ok(()) => "Opened apply link".to_string(),
                    Err(e) => format!("Could not open link: {}", e),
                });
            }
        }

        // Settings editor; changes stay a draft until saved
        KeyCode::Char('/') if route == Route::Settings => {
            let current = app.preferences_draft().role_keywords.join(", ");
            state.input = Some((Field::RoleKeywords, current));
        }
        KeyCode::Char('i') if route == Route::Settings => {
            let current = app.preferences_draft().skills.join(", ");
            state.input = Some((Field::Skills, current));
        }
        KeyCode::Char('e') if route == Route::Settings => {
            let current = app.preferences_draft().experience_level.clone().unwrap_or_default();
            state.input = Some((Field::Experience, current));
        }
        KeyCode::Char(' ') if route == Route::Settings => {
            if let Some(Selectable::Choice(choice)) = selected {
                let mut draft = app.preferences_draft().clone();
                toggle_choice(&mut draft, choice, &filter::locations(app.jobs()));
                app.dispatch(Action::EditPreferences(draft))?;
            }
        }
        KeyCode::Char(c @ ('+' | '-')) if route == Route::Settings => {
            let mut draft = app.preferences_draft().clone();
            draft.min_match_score = if c == '+' {
                draft.min_match_score.saturating_add(SCORE_STEP).min(MAX_SCORE)
            } else {
                draft.min_match_score.saturating_sub(SCORE_STEP)
            };
            app.dispatch(Action::EditPreferences(draft))?;
        }
        KeyCode::Char('w') if route == Route::Settings => {
            let draft = app.preferences_draft().clone();
            app.dispatch(Action::SavePreferences(draft))?;
        }

        KeyCode::Char('g') if route == Route::Digest => app.dispatch(Action::GenerateDigest)?,

        // Checklist
        KeyCode::Char(' ') if route == Route::TestChecklist => {
            if let Some(Selectable::Check(index)) = selected {
                app.dispatch(Action::ToggleCheck(index))?;
            }
        }
        KeyCode::Char('R') if route == Route::TestChecklist => {
            app.dispatch(Action::ResetChecklist)?;
        }
        _ => {}
    }
    Ok(true)
}

fn handle_input(code: KeyCode, app: &mut App, state: &mut TuiState) -> Result<()> {
    let Some((field, buffer)) = state.input.as_mut() else {
        return Ok(());
    };
    match code {
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Enter => {
            let field = *field;
            let text = buffer.trim().to_string();
            state.input = None;
            submit_input(field, text, app, state)?;
        }
        KeyCode::Esc => state.input = None,
        _ => {}
    }
    Ok(())
}

fn submit_input(field: Field, text: String, app: &mut App, state: &mut TuiState) -> Result<()> {
    if field == Field::Search {
        let mut criteria = app.filter().clone();
        criteria.keyword = (!text.is_empty()).then_some(text);
        state.selected = 0;
        return app.dispatch(Action::SetFilter(criteria));
    }

    let mut draft = app.preferences_draft().clone();
    match field {
        Field::RoleKeywords => draft.role_keywords = split_list(&text),
        Field::Skills => draft.skills = split_list(&text),
        Field::Experience => draft.experience_level = (!text.is_empty()).then_some(text),
        Field::Search => {}
    }
    app.dispatch(Action::EditPreferences(draft))
}

fn toggle_choice(prefs: &mut Preferences, choice: Choice, locations: &[String]) {
    match choice {
        Choice::Location(index) => {
            if let Some(location) = locations.get(index) {
                toggle(&mut prefs.preferred_locations, location.clone());
            }
        }
        Choice::Mode(mode) => toggle(&mut prefs.preferred_mode, mode),
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if let Some(pos) = items.iter().position(|x| *x == item) {
        items.remove(pos);
    } else {
        items.push(item);
    }
}

fn next_option<T: PartialEq + Clone>(options: &[T], current: &T) -> T {
    let pos = options.iter().position(|o| o == current).unwrap_or(0);
    options[(pos + 1) % options.len()].clone()
}

fn draw(frame: &mut Frame, app: &App, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let shell = app.shell();

    // Top: nav links
    let mut spans: Vec<Span> = Vec::new();
    for (i, route) in Route::ALL.iter().enumerate() {
        let label = format!(" {}:{} ", i + 1, route.title());
        let style = if shell.is_active(*route) {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
    }
    let nav = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", shell.document_title)),
    );
    frame.render_widget(nav, chunks[0]);

    // Body: current page
    let (body, selected_line) = build_body(app, state);
    let height = chunks[1].height.saturating_sub(2);
    let scroll = selected_line.saturating_sub(height.saturating_sub(6));
    let body_widget = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", shell.root.heading)))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(body_widget, chunks[1]);

    // Footer help
    let help = match (&state.input, app.route()) {
        (Some((field, buffer)), _) => {
            format!(" {}: {}_   (Enter: apply  Esc: cancel)", field.label(), buffer)
        }
        (None, Route::Dashboard) => {
            " 1-8:nav j/k:select /:search l:location f:status m:matches o:sort n/a/x/y:status s:save Enter:apply q:quit"
                .to_string()
        }
        (None, Route::Saved) => {
            " 1-8:nav j/k:select n/a/x/y:status s:save Enter:apply q:quit".to_string()
        }
        (None, Route::Digest) => {
            " 1-8:nav g:generate j/k:select n/a/x/y:status s:save Enter:apply q:quit".to_string()
        }
        (None, Route::TestChecklist) => " 1-8:nav j/k:select space:toggle R:reset q:quit".to_string(),
        (None, Route::Settings) => {
            " 1-8:nav j/k:select space:toggle /:keywords i:skills e:experience +/-:min score w:save q:quit"
                .to_string()
        }
        _ => " 1-8:nav q:quit".to_string(),
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    if let Some(toast) = &state.toast {
        frame.render_widget(
            Paragraph::new(format!(" {}", toast)).style(Style::default().fg(Color::Green)),
            chunks[3],
        );
    }
}

/// Styled lines for the page and the line where the selected item starts.
fn build_body<'a>(app: &'a App, state: &TuiState) -> (Text<'a>, u16) {
    let mut lines: Vec<Line> = Vec::new();
    let mut selectable = 0;
    let mut selected_line = 0u16;

    for block in &app.shell().root.blocks {
        match block {
            PageBlock::Heading(text) => lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ))),
            PageBlock::Paragraph(text) => lines.push(Line::from(text.as_str())),
            PageBlock::Notice(text) => lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Yellow),
            ))),
            PageBlock::Success(text) => lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Green),
            ))),
            PageBlock::Link { label, path } => {
                let hint = Route::from_path(path)
                    .and_then(|r| Route::ALL.iter().position(|x| *x == r))
                    .map(|i| format!("  (press {})", i + 1))
                    .unwrap_or_default();
                lines.push(Line::from(vec![
                    Span::styled(format!("→ {}", label), Style::default().fg(Color::Cyan)),
                    Span::styled(hint, Style::default().fg(Color::DarkGray)),
                ]));
            }
            PageBlock::Card { rank, card } => {
                let is_selected = selectable == state.selected;
                if is_selected {
                    selected_line = lines.len() as u16;
                }
                selectable += 1;

                let marker = if is_selected { "> " } else { "  " };
                let title_style = if is_selected {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let mut header = vec![
                    Span::raw(marker),
                    Span::styled(
                        match rank {
                            Some(r) => format!("{}. {}", r, card.title),
                            None => card.title.clone(),
                        },
                        title_style,
                    ),
                ];
                if let Some(score) = card.score {
                    header.push(Span::styled(format!("  {}%", score), band_style(card.band())));
                }
                header.push(Span::styled(
                    format!("  [{}]", card.source.as_str()),
                    Style::default().fg(Color::DarkGray),
                ));
                if card.saved {
                    header.push(Span::styled("  ★", Style::default().fg(Color::Yellow)));
                }
                lines.push(Line::from(header));
                lines.push(Line::from(format!(
                    "    {} · {} ({}) | {}",
                    card.company, card.location, card.mode, card.experience
                )));
                lines.push(Line::from(Span::styled(
                    format!("    {}", card.status),
                    status_style(card.status),
                )));
                lines.push(Line::from(""));
            }
            PageBlock::Check {
                index,
                label,
                hint,
                checked,
            } => {
                let is_selected = selectable == state.selected;
                if is_selected {
                    selected_line = lines.len() as u16;
                }
                selectable += 1;

                let marker = if is_selected { "> " } else { "  " };
                let (mark, style) = if *checked {
                    ("[x]", Style::default().fg(Color::Green))
                } else {
                    ("[ ]", Style::default())
                };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{} {}. {}", mark, index + 1, label), style),
                ]));
                if is_selected {
                    for line in textwrap::fill(hint, 70).lines() {
                        lines.push(Line::from(Span::styled(
                            format!("      {}", line),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
            }
            PageBlock::Toggle { label, checked, .. } => {
                let is_selected = selectable == state.selected;
                if is_selected {
                    selected_line = lines.len() as u16;
                }
                selectable += 1;

                let marker = if is_selected { "> " } else { "  " };
                let (mark, style) = if *checked {
                    ("[x]", Style::default().fg(Color::Green))
                } else {
                    ("[ ]", Style::default())
                };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{} {}", mark, label), style),
                ]));
            }
            PageBlock::Empty(text) => lines.push(Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::DarkGray),
            ))),
        }
    }

    (Text::from(lines), selected_line)
}

fn band_style(band: ScoreBand) -> Style {
    match band {
        ScoreBand::High => Style::default().fg(Color::Green),
        ScoreBand::Medium => Style::default().fg(Color::Yellow),
        ScoreBand::Low => Style::default().fg(Color::LightRed),
        ScoreBand::None => Style::default().fg(Color::DarkGray),
    }
}

fn status_style(status: JobStatus) -> Style {
    match status {
        JobStatus::NotApplied => Style::default().fg(Color::DarkGray),
        JobStatus::Applied => Style::default().fg(Color::Cyan),
        JobStatus::Rejected => Style::default().fg(Color::Red),
        JobStatus::Selected => Style::default().fg(Color::Green),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkMode;
    use crate::scoring::tests::job;
    use crate::store::Store;
    use chrono::NaiveDate;

    fn app() -> App {
        let jobs = vec![job(1, "Rust Engineer", "Remote", 1), job(2, "Go Engineer", "Pune", 4)];
        let today = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        App::new(Store::open_in_memory().unwrap(), jobs, today).unwrap()
    }

    fn type_text(text: &str, app: &mut App, state: &mut TuiState) {
        for c in text.chars() {
            handle_input(KeyCode::Char(c), app, state).unwrap();
        }
        handle_input(KeyCode::Enter, app, state).unwrap();
    }

    #[test]
    fn test_settings_edit_then_save() {
        let mut app = app();
        let mut state = TuiState::new();
        assert!(handle_key(KeyCode::Char('3'), &mut app, &mut state).unwrap());
        assert_eq!(app.route(), Route::Settings);

        handle_key(KeyCode::Char('/'), &mut app, &mut state).unwrap();
        type_text("rust, go", &mut app, &mut state);
        assert!(state.input.is_none());

        // Options: Remote, Pune, then Remote/Hybrid/Onsite modes.
        handle_key(KeyCode::Char(' '), &mut app, &mut state).unwrap();
        state.selected = 3;
        handle_key(KeyCode::Char(' '), &mut app, &mut state).unwrap();
        handle_key(KeyCode::Char('+'), &mut app, &mut state).unwrap();
        assert_eq!(app.store().load_preferences().unwrap(), Preferences::default());

        handle_key(KeyCode::Char('w'), &mut app, &mut state).unwrap();
        let saved = app.store().load_preferences().unwrap();
        assert_eq!(saved.role_keywords, vec!["rust", "go"]);
        assert_eq!(saved.preferred_locations, vec!["Remote"]);
        assert_eq!(saved.preferred_mode, vec![WorkMode::Hybrid]);
        assert_eq!(saved.min_match_score, 45);
        assert_eq!(app.take_toasts(), vec!["Preferences saved!"]);
    }

    #[test]
    fn test_settings_prompts_clear_fields() {
        let mut app = app();
        let mut state = TuiState::new();
        handle_key(KeyCode::Char('3'), &mut app, &mut state).unwrap();

        handle_key(KeyCode::Char('e'), &mut app, &mut state).unwrap();
        type_text(" Mid ", &mut app, &mut state);
        assert_eq!(app.preferences_draft().experience_level.as_deref(), Some("Mid"));

        handle_key(KeyCode::Char('e'), &mut app, &mut state).unwrap();
        for _ in 0..3 {
            handle_input(KeyCode::Backspace, &mut app, &mut state).unwrap();
        }
        handle_input(KeyCode::Enter, &mut app, &mut state).unwrap();
        assert_eq!(app.preferences_draft(), &Preferences::default());
    }

    #[test]
    fn test_toggle_choice_adds_and_removes() {
        let locations = vec!["Remote".to_string(), "Pune".to_string()];
        let mut prefs = Preferences::default();
        toggle_choice(&mut prefs, Choice::Location(1), &locations);
        toggle_choice(&mut prefs, Choice::Mode(WorkMode::Onsite), &locations);
        assert_eq!(prefs.preferred_locations, vec!["Pune"]);
        assert_eq!(prefs.preferred_mode, vec![WorkMode::Onsite]);

        toggle_choice(&mut prefs, Choice::Location(1), &locations);
        toggle_choice(&mut prefs, Choice::Location(9), &locations);
        assert!(prefs.preferred_locations.is_empty());
    }

    #[test]
    fn test_next_option_cycles() {
        let options = vec![None, Some("Pune".to_string()), Some("Remote".to_string())];
        assert_eq!(next_option(&options, &None), Some("Pune".to_string()));
        assert_eq!(next_option(&options, &Some("Remote".to_string())), None);
        // A value no longer on offer restarts the cycle.
        assert_eq!(next_option(&options, &Some("Gone".to_string())), Some("Pune".to_string()));
    }

    #[test]
    fn test_tui_state_clamps_selection() {
        let mut state = TuiState::new();
        state.selected = 7;
        state.clamp(3);
        assert_eq!(state.selected, 2);
        state.clamp(0);
        assert_eq!(state.selected, 0);
    }
}
