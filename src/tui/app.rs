//! Application state and event loop

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::{debug, error, warn};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    DefaultTerminal, Frame,
};
use tokio::runtime::Runtime;

use crate::services::{
    build_deep_link, Comparison, ComparisonService, FetchOutcome, RequestToken,
};
use crate::types::{
    Provider, ProviderFilter, Result, RideOption, Route, SortKey, SortOrder, SortState,
};

use super::theme::Theme;
use super::widgets::{help::HelpPopup, rides::RideTable, spinner::Spinner};

/// Result of a background fetch, tagged with the token it was started under
type FetchMessage = (RequestToken, Result<FetchOutcome>);

/// Application state
pub enum AppState {
    /// Fetch in flight
    Loading { spinner_frame: usize },
    /// Prices for the current route
    Ready { comparison: Box<Comparison> },
    /// Latest fetch failed; previous options are gone
    Error { message: String },
}

/// Main application
pub struct App {
    service: Arc<ComparisonService>,
    route: Route,
    theme: Theme,
    state: AppState,
    sort: SortState,
    filter: ProviderFilter,
    show_recommended: bool,
    selected: usize,
    show_help: bool,
    should_quit: bool,
    refresh_requested: bool,
    chosen_link: Option<String>,
}

impl App {
    /// Create a new app in loading state
    pub fn new(service: Arc<ComparisonService>, route: Route, theme: Theme) -> Self {
        Self {
            service,
            route,
            theme,
            state: AppState::Loading { spinner_frame: 0 },
            sort: SortState::default(),
            filter: ProviderFilter::default(),
            show_recommended: true,
            selected: 0,
            show_help: false,
            should_quit: false,
            refresh_requested: false,
            chosen_link: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Deep link of the ride picked with Enter
    pub fn chosen_link(&self) -> Option<&str> {
        self.chosen_link.as_deref()
    }

    /// Enter loading state and issue a token for the next fetch
    pub fn start_fetch(&mut self) -> RequestToken {
        self.refresh_requested = false;
        self.selected = 0;
        self.state = AppState::Loading { spinner_frame: 0 };
        self.service.begin_request()
    }

    /// Apply a finished fetch unless a newer one has been started since
    pub fn apply_fetch(&mut self, token: RequestToken, result: Result<FetchOutcome>) {
        if !self.service.is_current(token) {
            debug!("discarding result of superseded request {}", token);
            return;
        }
        match result {
            Ok(FetchOutcome::Fresh(comparison)) => {
                self.selected = 0;
                self.state = AppState::Ready { comparison };
            }
            Ok(FetchOutcome::Stale { .. }) => {}
            Err(e) => {
                error!("price fetch failed: {}", e);
                self.state = AppState::Error {
                    message: e.to_string(),
                };
            }
        }
    }

    /// Ranked options under the current sort and filter
    pub fn ranked(&self) -> Vec<RideOption> {
        match &self.state {
            AppState::Ready { comparison } => comparison.ranked(self.sort, self.filter),
            _ => Vec::new(),
        }
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Esc if self.show_help => {
                        self.show_help = false;
                    }
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        self.should_quit = true;
                    }
                    KeyCode::Char('?') => {
                        self.show_help = !self.show_help;
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.selected = self.selected.saturating_sub(1);
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        let last = self.ranked().len().saturating_sub(1);
                        self.selected = (self.selected + 1).min(last);
                    }
                    KeyCode::Char('p') => self.set_sort(self.sort.toggle(SortKey::Price)),
                    KeyCode::Char('t') => self.set_sort(self.sort.toggle(SortKey::Eta)),
                    KeyCode::Char('o') => self.set_sort(SortState {
                        order: self.sort.order.reversed(),
                        ..self.sort
                    }),
                    KeyCode::Char(c @ '1'..='3') => {
                        let provider = Provider::ALL[(c as u8 - b'1') as usize];
                        self.set_filter(self.filter.toggle(provider));
                    }
                    KeyCode::Char('0') => self.set_filter(ProviderFilter::All),
                    KeyCode::Char('s') => {
                        self.show_recommended = !self.show_recommended;
                    }
                    KeyCode::Char('r') => {
                        self.refresh_requested = true;
                    }
                    KeyCode::Char('x') => {
                        self.route = self.route.swapped();
                        self.refresh_requested = true;
                    }
                    KeyCode::Enter => self.choose_selected(),
                    _ => {}
                }
            }
        }
    }

    fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.selected = 0;
    }

    fn set_filter(&mut self, filter: ProviderFilter) {
        self.filter = filter;
        self.selected = 0;
    }

    fn choose_selected(&mut self) {
        let Some(option) = self.ranked().get(self.selected).cloned() else {
            return;
        };
        match build_deep_link(option.provider, &self.route) {
            Ok(link) => {
                self.chosen_link = Some(link);
                self.should_quit = true;
            }
            Err(e) => warn!("cannot build {} link: {}", option.provider, e),
        }
    }

    /// Returns true once per refresh request
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading { spinner_frame } = &mut self.state {
            *spinner_frame = Spinner::next_frame(*spinner_frame);
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }

    fn render_route(&self, comparison: Option<&Comparison>, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                self.route.pickup.address.clone(),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  →  ", Style::default().fg(self.theme.muted())),
            Span::styled(
                self.route.dropoff.address.clone(),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(comparison) = comparison {
            let updated = comparison.fetched_at.with_timezone(&Local);
            spans.push(Span::styled(
                format!("   updated {}", updated.format("%H:%M:%S")),
                Style::default().fg(self.theme.muted()),
            ));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let arrow = match self.sort.order {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        };
        let line = Line::from(vec![
            Span::styled("Sort: ", Style::default().fg(self.theme.muted())),
            Span::styled(
                format!("{} {}", self.sort.key, arrow),
                Style::default().fg(self.theme.accent()),
            ),
            Span::styled("   Provider: ", Style::default().fg(self.theme.muted())),
            Span::styled(
                self.filter.to_string(),
                Style::default().fg(self.theme.accent()),
            ),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_heading(&self, text: &str, color: Color, area: Rect, buf: &mut Buffer) {
        let line = Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_separator(&self, area: Rect, buf: &mut Buffer) {
        let line = "─".repeat(area.width as usize);
        buf.set_string(
            area.x,
            area.y,
            &line,
            Style::default().fg(self.theme.muted()),
        );
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let hint = "↑↓ select · Enter book · p/t sort · o order · 1-3 provider · r refresh · ? help";
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(self.theme.muted()),
        )))
        .alignment(Alignment::Center)
        .render(area, buf);
    }

    fn render_ready(&self, comparison: &Comparison, area: Rect, buf: &mut Buffer) {
        let recommended = comparison.recommended();
        let ranked = comparison.ranked(self.sort, self.filter);
        let recommended_rows = if self.show_recommended {
            recommended.len().max(1) as u16 + 1
        } else {
            0
        };

        let chunks = Layout::vertical([
            Constraint::Length(1),                       // [0] Top padding
            Constraint::Length(1),                       // [1] Route
            Constraint::Length(1),                       // [2] Sort / filter
            Constraint::Length(1),                       // [3] Separator
            Constraint::Length(recommended_rows.min(1)), // [4] Recommended heading
            Constraint::Length(recommended_rows),        // [5] Recommended table
            Constraint::Length(1),                       // [6] All rides heading
            Constraint::Min(2),                          // [7] All rides table
            Constraint::Length(1),                       // [8] Separator
            Constraint::Length(1),                       // [9] Keybindings
        ])
        .split(area);

        self.render_route(Some(comparison), chunks[1], buf);
        self.render_status(chunks[2], buf);
        self.render_separator(chunks[3], buf);

        if self.show_recommended {
            self.render_heading(
                "Recommended (cheapest per ride type)",
                self.theme.recommended(),
                chunks[4],
                buf,
            );
            RideTable::new(&recommended, self.theme).render(chunks[5], buf);
        }

        self.render_heading(
            &format!("All rides ({})", ranked.len()),
            self.theme.text(),
            chunks[6],
            buf,
        );
        let empty_message = if comparison.options.is_empty() {
            "No rides available for this route"
        } else {
            "No rides from this provider"
        };
        RideTable::new(&ranked, self.theme)
            .with_selected(Some(self.selected))
            .with_empty_message(empty_message)
            .render(chunks[7], buf);

        self.render_separator(chunks[8], buf);
        self.render_keybindings(chunks[9], buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let y = area.y + area.height / 2;
        let text = format!("Error: {}", message);
        let x = area.x + (area.width.saturating_sub(text.chars().count() as u16)) / 2;
        buf.set_string(x, y, &text, Style::default().fg(self.theme.error()));

        if area.height > 2 {
            let hint = "Press r to retry, x to swap, q to quit";
            let x = area.x + (area.width.saturating_sub(hint.len() as u16)) / 2;
            buf.set_string(x, y + 2, hint, Style::default().fg(self.theme.muted()));
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Loading { spinner_frame } => {
                Spinner::new(*spinner_frame, "Fetching prices...", self.theme).render(area, buf);
            }
            AppState::Ready { comparison } => self.render_ready(comparison, area, buf),
            AppState::Error { message } => self.render_error(message, area, buf),
        }

        if self.show_help {
            let popup_area = HelpPopup::centered_area(area);
            HelpPopup::new(self.theme).render(popup_area, buf);
        }
    }
}

/// Run the TUI application; returns the deep link of the chosen ride.
///
/// `theme` must be detected before this call, since detection cannot run in
/// raw mode.
pub fn run(
    service: Arc<ComparisonService>,
    route: Route,
    theme: Theme,
    runtime: &Runtime,
) -> anyhow::Result<Option<String>> {
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, App::new(service, route, theme), runtime);
    ratatui::restore();
    result
}

/// Start a fetch on the runtime; the result comes back over `tx`
fn spawn_fetch(app: &mut App, runtime: &Runtime, tx: &mpsc::Sender<FetchMessage>) {
    let token = app.start_fetch();
    let service = Arc::clone(&app.service);
    let route = app.route.clone();
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = service.compare_for(token, &route).await;
        let _ = tx.send((token, result));
    });
}

fn run_app(
    terminal: &mut DefaultTerminal,
    mut app: App,
    runtime: &Runtime,
) -> anyhow::Result<Option<String>> {
    let (tx, rx) = mpsc::channel();
    spawn_fetch(&mut app, runtime, &tx);

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Drain finished fetches (non-blocking)
        while let Ok((token, result)) = rx.try_recv() {
            app.apply_fetch(token, result);
        }

        if app.take_refresh_request() {
            spawn_fetch(&mut app, runtime, &tx);
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            app.handle_event(event::read()?);
        } else {
            app.tick();
        }
    }

    Ok(app.chosen_link)
}
