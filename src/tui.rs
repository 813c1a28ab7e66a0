use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::api::JobSource;
use crate::error::AcquisitionError;
use crate::models::{JobRecord, JobType};
use crate::normalize::RawBatch;
use crate::retrieval::{self, RetrievalState, Ticket};
use crate::session::{SearchSession, NO_JOBS_MESSAGE};

const TICK: Duration = Duration::from_millis(100);
const THRESHOLD_STEP: f64 = 0.05;

type Outcome = (u64, Result<RawBatch, AcquisitionError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Query,
    Location,
    MinSalary,
}

struct AppState {
    session: SearchSession,
    selected: usize,
    scroll_offset: u16,
    editing: Option<Field>,
    source_cursor: Option<usize>,
}

impl AppState {
    fn new(session: SearchSession) -> Self {
        Self {
            session,
            selected: 0,
            scroll_offset: 0,
            editing: None,
            source_cursor: None,
        }
    }

    fn current_job(&self) -> Option<&JobRecord> {
        self.session.page().items.get(self.selected).copied()
    }

    fn next(&mut self) {
        let len = self.session.page().items.len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn reset_selection(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    fn edit(&mut self, field: Field, ch: Option<char>, now: Instant) {
        let draft = self.session.draft();
        let mut text = match field {
            Field::Query => draft.query.clone(),
            Field::Location => draft.location.clone(),
            Field::MinSalary => draft.min_salary.clone(),
        };
        match ch {
            Some(c) => text.push(c),
            None => {
                text.pop();
            }
        }
        match field {
            Field::Query => self.session.edit_query(text, now),
            Field::Location => self.session.edit_location(text, now),
            Field::MinSalary => self.session.edit_min_salary(text, now),
        }
    }

    fn cycle_job_type(&mut self) {
        let next = match self.session.criteria().job_type {
            None => Some(JobType::SELECTABLE[0]),
            Some(current) => JobType::SELECTABLE
                .iter()
                .position(|t| *t == current)
                .and_then(|i| JobType::SELECTABLE.get(i + 1))
                .copied(),
        };
        self.session.set_job_type(next);
        self.reset_selection();
    }

    // Walks the available sources one at a time, then back to "all".
    fn cycle_source(&mut self) {
        let options: Vec<String> = self
            .session
            .source_options()
            .into_iter()
            .map(String::from)
            .collect();
        let next = match self.source_cursor {
            None => 0,
            Some(i) => i + 1,
        };
        match options.get(next) {
            Some(source) => {
                self.source_cursor = Some(next);
                self.session.set_sources([source.clone()]);
            }
            None => {
                self.source_cursor = None;
                self.session.set_sources(Vec::new());
            }
        }
        self.reset_selection();
    }

    fn cycle_profile(&mut self) -> Option<Ticket> {
        let profiles = self.session.profiles();
        if profiles.is_empty() {
            return None;
        }
        let next = self
            .session
            .selected_profile()
            .and_then(|id| profiles.iter().position(|p| p.id == id))
            .map(|i| (i + 1) % profiles.len())
            .unwrap_or(0);
        let id = profiles[next].id;
        self.session.select_profile(id)
    }

    fn step_threshold(&mut self, delta: f64) -> Option<Ticket> {
        let stepped = ((self.session.threshold() + delta) / THRESHOLD_STEP).round() * THRESHOLD_STEP;
        self.session.set_threshold(stepped)
    }
}

fn dispatch(source: &Arc<dyn JobSource>, tx: &Sender<Outcome>, ticket: Ticket) {
    let source = Arc::clone(source);
    let tx = tx.clone();
    thread::spawn(move || {
        let outcome = retrieval::execute(source.as_ref(), &ticket.request);
        // The loop may already be gone; nothing to report to.
        let _ = tx.send((ticket.seq, outcome));
    });
}

pub fn run_browse(source: Arc<dyn JobSource>, session: SearchSession) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut state = AppState::new(session);

    let ticket = state.session.mount(source.as_ref());
    dispatch(&source, &tx, ticket);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &source, &tx, &rx);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    source: &Arc<dyn JobSource>,
    tx: &Sender<Outcome>,
    rx: &Receiver<Outcome>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        for (seq, outcome) in rx.try_iter() {
            if state.session.complete(seq, outcome) {
                state.reset_selection();
                state.source_cursor = None;
            }
        }
        if state.session.tick(Instant::now()) {
            state.reset_selection();
        }

        list_state.select(Some(state.selected));
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        let timeout = state
            .session
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()).min(TICK))
            .unwrap_or(TICK);
        if !event::poll(timeout)? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let now = Instant::now();

        if let Some(field) = state.editing {
            match key.code {
                KeyCode::Esc => {
                    state.editing = None;
                    state.session.cancel_edit();
                }
                KeyCode::Enter => {
                    state.editing = None;
                    let ticket = state.session.submit_search();
                    dispatch(source, tx, ticket);
                    state.reset_selection();
                }
                KeyCode::Backspace => state.edit(field, None, now),
                KeyCode::Char(c) => state.edit(field, Some(c), now),
                _ => {}
            }
            continue;
        }

        let ticket = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Down | KeyCode::Char('j') => {
                state.next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.prev();
                None
            }
            KeyCode::Char('J') | KeyCode::PageDown => {
                state.scroll_down();
                None
            }
            KeyCode::Char('K') | KeyCode::PageUp => {
                state.scroll_up();
                None
            }
            KeyCode::Char('/') => {
                state.editing = Some(Field::Query);
                None
            }
            KeyCode::Char('l') => {
                state.editing = Some(Field::Location);
                None
            }
            KeyCode::Char('m') => {
                state.editing = Some(Field::MinSalary);
                None
            }
            KeyCode::Char('n') | KeyCode::Right => {
                state.session.next_page();
                state.reset_selection();
                None
            }
            KeyCode::Char('b') | KeyCode::Left => {
                state.session.prev_page();
                state.reset_selection();
                None
            }
            KeyCode::Char('s') => {
                let sort = state.session.criteria().sort.next();
                state.session.set_sort(sort);
                state.reset_selection();
                None
            }
            KeyCode::Char('z') => {
                let size = state.session.criteria().page_size.next();
                state.session.set_page_size(size);
                state.reset_selection();
                None
            }
            KeyCode::Char('t') => {
                state.cycle_job_type();
                None
            }
            KeyCode::Char('f') => {
                state.cycle_source();
                None
            }
            KeyCode::Char('p') => {
                let on = !state.session.use_profile();
                Some(state.session.set_use_profile(on))
            }
            KeyCode::Char('c') => state.cycle_profile(),
            KeyCode::Char('[') => state.step_threshold(-THRESHOLD_STEP),
            KeyCode::Char(']') => state.step_threshold(THRESHOLD_STEP),
            KeyCode::Char('r') => Some(state.session.retry()),
            KeyCode::Enter => Some(state.session.submit_search()),
            _ => None,
        };

        if let Some(ticket) = ticket {
            dispatch(source, tx, ticket);
            state.reset_selection();
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(build_header(state), rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(rows[1]);

    // Left panel: current page
    let view = state.session.page();
    let items: Vec<ListItem> = if state.session.is_loading() && view.is_empty() {
        vec![ListItem::new("Loading jobs...")]
    } else if state.session.records().is_empty() {
        vec![ListItem::new(NO_JOBS_MESSAGE)]
    } else {
        view.items
            .iter()
            .map(|job| {
                let score = job
                    .match_score
                    .filter(|s| *s > 0.0)
                    .map(|s| format!(" [{}%]", s.round() as i64))
                    .unwrap_or_default();
                let title = if job.title.chars().count() > 35 {
                    format!("{}...", job.title.chars().take(32).collect::<String>())
                } else {
                    job.title.clone()
                };
                ListItem::new(format!("{} | {}{}", title, job.company_name, score))
            })
            .collect()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(page_title(
            view.page,
            view.total_pages,
            view.total_matches,
            view.has_prev,
            view.has_next,
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state.current_job());
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    let help = Paragraph::new(
        " /:query l:location m:min-salary enter:search s:sort t:type f:source z:size n/b:page p:profile c:next-profile [/]:threshold r:retry q:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn page_title(page: usize, total_pages: usize, total: usize, has_prev: bool, has_next: bool) -> String {
    let prev = if has_prev { "< b " } else { "" };
    let next = if has_next { " n >" } else { "" };
    format!(" {}Page {} of {} - {} jobs{} ", prev, page, total_pages, total, next)
}

fn build_header(state: &AppState) -> Paragraph<'_> {
    let session = &state.session;
    let criteria = session.criteria();
    let draft = session.draft();

    let status = match session.state() {
        RetrievalState::Idle => Span::raw("idle"),
        RetrievalState::Fetching => Span::styled("searching...", Style::default().fg(Color::Yellow)),
        RetrievalState::Ready => Span::styled("ready", Style::default().fg(Color::Green)),
        RetrievalState::Failed { message } => {
            Span::styled(format!("{} (r to retry)", message), Style::default().fg(Color::Red))
        }
    };
    let mode = session
        .mode()
        .map(|m| m.label())
        .unwrap_or_else(|| "-".to_string());
    let profile = match (session.use_profile(), session.selected_profile()) {
        (true, Some(id)) => session
            .profiles()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.title.clone())
            .unwrap_or_else(|| format!("#{}", id)),
        _ => "off".to_string(),
    };

    let field = |label: &str, value: &str, which: Field| {
        let style = if state.editing == Some(which) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        vec![Span::raw(format!("{}: ", label)), Span::styled(format!("[{}]", value), style), Span::raw("  ")]
    };

    let mut inputs = Vec::new();
    inputs.extend(field("Query", &draft.query, Field::Query));
    inputs.extend(field("Location", &draft.location, Field::Location));
    inputs.extend(field("Min salary", &draft.min_salary, Field::MinSalary));

    let sources = if criteria.sources.is_empty() {
        "all".to_string()
    } else {
        criteria.sources.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let refinements = format!(
        "Type: {}  Sort: {}  Sources: {}  Per page: {}  Min match: {}%",
        criteria.job_type.map(|t| t.badge()).unwrap_or("all"),
        criteria.sort.label(),
        sources,
        criteria.page_size,
        (session.threshold() * 100.0).round() as i64,
    );

    let lines = vec![
        Line::from(vec![
            Span::raw(format!("Mode: {}  Resume: {}  ", mode, profile)),
            status,
            Span::styled(
                if session.has_pending_edit() { "  typing..." } else { "" },
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(inputs),
        Line::from(refinements),
    ];
    Paragraph::new(lines).block(Block::default().borders(Borders::BOTTOM).title(" jobscout "))
}

fn build_detail(job: Option<&JobRecord>) -> Text<'_> {
    let Some(job) = job else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company_name)));
    lines.push(Line::from(format!("Location: {}", job.location)));
    lines.push(Line::from(format!("Type: {}", job.job_type.badge())));

    if let Some(source) = &job.source {
        lines.push(Line::from(format!("Source: {}", source)));
    }
    if let Some(pay) = job.salary_range() {
        lines.push(Line::from(format!("Pay: {}", pay)));
    }
    if let Some(label) = job.match_label() {
        lines.push(Line::from(Span::styled(label, Style::default().fg(Color::Green))));
    }
    lines.push(Line::from(Span::styled(
        job.posted_label(),
        Style::default().fg(Color::DarkGray),
    )));
    if let Some(url) = &job.application_url {
        lines.push(Line::from(format!("Apply: {}", url)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Description",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&job.description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }

    Text::from(lines)
}
