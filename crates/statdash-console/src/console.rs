//! Interactive terminal dashboard.
//!
//! The filter form sits on the left and the results table (or error) on the
//! right. F2 toggles a chat panel floating above the bottom-right corner; while
//! it is open, keys go to the chat input.
//!
//! Network calls run on spawned tasks that write their outcome back into the
//! shared [`DashboardState`]; the event loop only snapshots and renders, so a
//! slow backend never blocks drawing or typing.
//!
//! Launch with `statdash` or `statdash console`.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame, Terminal,
};
use tokio::sync::RwLock;

use statdash_client::{DashboardApi, HttpDashboardClient};
use statdash_protocol::{ChatMessage, FilterField, ResultTable};

use crate::chat_widget::ChatWidget;
use crate::config::DashboardConfig;
use crate::filter_panel::{FilterPanel, PanelStatus};

const FILTER_COLUMN_WIDTH: u16 = 46;
const CHAT_WIDTH: u16 = 52;
const MAX_CELL_WIDTH: u16 = 32;
const FOOTER_HEIGHT: u16 = 3;

/// Result of the start-up reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Reachable(String),
    Unreachable(String),
}

/// Everything the dashboard mutates. Shared with in-flight request tasks.
#[derive(Debug)]
pub struct DashboardState {
    pub filter: FilterPanel,
    pub chat: ChatWidget,
    pub backend: BackendStatus,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            filter: FilterPanel::new(),
            chat: ChatWidget::new(config.chat.user_id.clone(), config.chat.max_messages),
            backend: BackendStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldView {
    label: &'static str,
    value: Option<String>,
    placeholder: &'static str,
    free_text: bool,
}

/// Point-in-time copy of [`DashboardState`] for one frame.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    fields: Vec<FieldView>,
    status: PanelStatus,
    count: u64,
    table: Option<ResultTable>,
    error: Option<String>,
    chat_open: bool,
    transcript: Vec<ChatMessage>,
    chat_input: String,
    chat_cursor: usize,
    backend: BackendStatus,
}

/// The dashboard TUI.
pub struct Dashboard {
    state: Arc<RwLock<DashboardState>>,
    api: Arc<dyn DashboardApi>,
    base_url: String,
    /// Index into [`FilterField::ALL`] of the focused form field.
    focused: usize,
    /// First visible result row.
    results_scroll: usize,
}

impl Dashboard {
    pub fn new(
        state: Arc<RwLock<DashboardState>>,
        api: Arc<dyn DashboardApi>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            state,
            api,
            base_url: base_url.into(),
            focused: 0,
            results_scroll: 0,
        }
    }

    pub fn state(&self) -> Arc<RwLock<DashboardState>> {
        Arc::clone(&self.state)
    }

    pub fn focused_field(&self) -> FilterField {
        FilterField::ALL[self.focused]
    }

    /// Take a snapshot of dashboard state for rendering.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.read().await;
        let criteria = state.filter.criteria();

        DashboardSnapshot {
            fields: FilterField::ALL
                .iter()
                .map(|field| FieldView {
                    label: field.label(),
                    value: criteria.get(*field).map(str::to_string),
                    placeholder: field.placeholder(),
                    free_text: field.is_free_text(),
                })
                .collect(),
            status: state.filter.status(),
            count: state.filter.count(),
            table: state.filter.table(),
            error: state.filter.error().map(str::to_string),
            chat_open: state.chat.is_open(),
            transcript: state.chat.transcript().to_vec(),
            chat_input: state.chat.input().text().to_string(),
            chat_cursor: state.chat.input().cursor(),
            backend: state.backend.clone(),
        }
    }

    /// Probe `GET /` in the background and record the result.
    pub fn spawn_backend_probe(&self) {
        let state = Arc::clone(&self.state);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let status = match api.welcome().await {
                Ok(welcome) => BackendStatus::Reachable(welcome.message),
                Err(e) => {
                    tracing::warn!(error = %e, "Backend probe failed");
                    BackendStatus::Unreachable(e.to_string())
                }
            };
            state.write().await.backend = status;
        });
    }

    /// Submit the filter form unless a request is already in flight.
    async fn submit_filters(&mut self) {
        let pending = self.state.write().await.filter.begin_submit();
        let Some(pending) = pending else {
            return;
        };
        self.results_scroll = 0;

        let state = Arc::clone(&self.state);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let settled = pending.run(api.as_ref()).await;
            state.write().await.filter.apply(settled);
        });
    }

    /// Send the chat input line. The user message shows up immediately.
    async fn send_chat(&mut self) {
        let pending = self.state.write().await.chat.submit_input();
        let Some(pending) = pending else {
            return;
        };

        let state = Arc::clone(&self.state);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let reply = pending.resolve(api.as_ref()).await;
            state.write().await.chat.push_reply(reply);
        });
    }

    /// Handle keyboard input. Returns `true` if the dashboard should exit.
    pub async fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return true,
            (KeyCode::F(2), _) | (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                self.state.write().await.chat.toggle();
                return false;
            }
            _ => {}
        }

        let chat_open = self.state.read().await.chat.is_open();
        if chat_open {
            self.handle_chat_key(code).await;
            false
        } else {
            self.handle_filter_key(code, modifiers).await
        }
    }

    async fn handle_chat_key(&mut self, code: KeyCode) {
        if code == KeyCode::Enter {
            self.send_chat().await;
            return;
        }

        let mut state = self.state.write().await;
        let chat = &mut state.chat;
        match code {
            KeyCode::Esc => chat.toggle(),
            KeyCode::Char(c) => chat.input_mut().insert(c),
            KeyCode::Backspace => chat.input_mut().backspace(),
            KeyCode::Delete => chat.input_mut().delete(),
            KeyCode::Left => chat.input_mut().left(),
            KeyCode::Right => chat.input_mut().right(),
            KeyCode::Home => chat.input_mut().home(),
            KeyCode::End => chat.input_mut().end(),
            KeyCode::Up => chat.history_prev(),
            KeyCode::Down => chat.history_next(),
            _ => {}
        }
    }

    async fn handle_filter_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let field = self.focused_field();
        match (code, modifiers) {
            (KeyCode::Esc, _) => return true,
            (KeyCode::Enter, _) => self.submit_filters().await,
            (KeyCode::Char('x'), KeyModifiers::CONTROL) => {
                if self.state.write().await.filter.clear() {
                    self.results_scroll = 0;
                }
            }
            (KeyCode::Tab, _) | (KeyCode::Down, _) => {
                self.focused = (self.focused + 1) % FilterField::ALL.len();
            }
            (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
                self.focused = (self.focused + FilterField::ALL.len() - 1) % FilterField::ALL.len();
            }
            (KeyCode::Left, _) => {
                self.state.write().await.filter.cycle_option(field, false);
            }
            (KeyCode::Right, _) => {
                self.state.write().await.filter.cycle_option(field, true);
            }
            (KeyCode::Char(c), m) if field.is_free_text() && !m.contains(KeyModifiers::CONTROL) => {
                let mut state = self.state.write().await;
                let mut value = state.filter.criteria().get(field).unwrap_or("").to_string();
                value.push(c);
                state.filter.set_field(field, value);
            }
            (KeyCode::Backspace, _) => {
                let mut state = self.state.write().await;
                if field.is_free_text() {
                    let mut value = state.filter.criteria().get(field).unwrap_or("").to_string();
                    value.pop();
                    state.filter.set_field(field, value);
                } else {
                    state.filter.set_field(field, "");
                }
            }
            (KeyCode::Delete, _) => {
                self.state.write().await.filter.set_field(field, "");
            }
            (KeyCode::PageUp, _) => {
                self.results_scroll = self.results_scroll.saturating_sub(10);
            }
            (KeyCode::PageDown, _) => {
                self.results_scroll += 10;
            }
            _ => {}
        }
        false
    }

    /// Render the full dashboard layout.
    pub fn render(&self, frame: &mut Frame, snap: &DashboardSnapshot) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),             // Status bar
                Constraint::Min(8),                // Form + results
                Constraint::Length(FOOTER_HEIGHT), // Key hints
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0], snap);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(FILTER_COLUMN_WIDTH), Constraint::Min(20)])
            .split(outer[1]);

        self.render_filters(frame, columns[0], snap);
        self.render_results_area(frame, columns[1], snap);
        self.render_footer(frame, outer[2], snap);

        if snap.chat_open {
            self.render_chat(frame, chat_area(frame.area()), snap);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, snap: &DashboardSnapshot) {
        let block = Block::default()
            .title(" Statathon Data Filter ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let (backend_text, backend_color) = match &snap.backend {
            BackendStatus::Unknown => ("checking", Color::Yellow),
            BackendStatus::Reachable(_) => ("online", Color::Green),
            BackendStatus::Unreachable(_) => ("offline", Color::Red),
        };
        let (state_text, state_color) = match snap.status {
            PanelStatus::Idle => ("Ready", Color::Green),
            PanelStatus::Submitting => ("Loading...", Color::Yellow),
            PanelStatus::Error => ("Error", Color::Red),
        };
        let set_count = snap.fields.iter().filter(|f| f.value.is_some()).count();

        let status_line = Line::from(vec![
            Span::styled("  Backend: ", Style::default().fg(Color::Gray)),
            Span::styled(&self.base_url, Style::default().fg(Color::White)),
            Span::styled(" (", Style::default().fg(Color::Gray)),
            Span::styled(backend_text, Style::default().fg(backend_color)),
            Span::styled(")  |  Filters: ", Style::default().fg(Color::Gray)),
            Span::styled(set_count.to_string(), Style::default().fg(Color::Magenta)),
            Span::styled("  |  Records: ", Style::default().fg(Color::Gray)),
            Span::styled(snap.count.to_string(), Style::default().fg(Color::LightCyan)),
            Span::styled("  |  Status: ", Style::default().fg(Color::Gray)),
            Span::styled(state_text, Style::default().fg(state_color)),
        ]);

        frame.render_widget(Paragraph::new(status_line).block(block), area);
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect, snap: &DashboardSnapshot) {
        let block = Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let mut lines: Vec<Line> = Vec::with_capacity(snap.fields.len() + 3);
        for (i, field) in snap.fields.iter().enumerate() {
            let focused = i == self.focused && !snap.chat_open;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let value_span = match &field.value {
                Some(value) if field.free_text => {
                    Span::styled(value.clone(), Style::default().fg(Color::White))
                }
                Some(value) => {
                    Span::styled(format!("< {} >", value), Style::default().fg(Color::Cyan))
                }
                None => Span::styled(field.placeholder, Style::default().fg(Color::DarkGray)),
            };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(format!("{:<15}", format!("{}:", field.label)), label_style),
                value_span,
            ]));
        }

        lines.push(Line::from(""));
        let actions = if snap.status == PanelStatus::Submitting {
            Line::from(Span::styled(
                "  [ Loading... ]",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(vec![
                Span::styled("  [ Apply Filters ]", Style::default().fg(Color::Green)),
                Span::styled("  [ Clear Filters ]", Style::default().fg(Color::Gray)),
            ])
        };
        lines.push(actions);

        frame.render_widget(Paragraph::new(lines).block(block), area);

        if !snap.chat_open {
            if let Some(field) = snap.fields.get(self.focused).filter(|f| f.free_text) {
                let len = field.value.as_deref().map(|v| v.chars().count()).unwrap_or(0);
                let cursor_x = area.x.saturating_add(1 + 2 + 15).saturating_add(to_u16(len));
                let cursor_y = area.y.saturating_add(1).saturating_add(to_u16(self.focused));
                if cursor_x < area.x.saturating_add(area.width.saturating_sub(1)) {
                    frame.set_cursor_position((cursor_x, cursor_y));
                }
            }
        }
    }

    fn render_results_area(&self, frame: &mut Frame, area: Rect, snap: &DashboardSnapshot) {
        let (error_area, table_area) = if snap.error.is_some() {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);
            (Some(split[0]), split[1])
        } else {
            (None, area)
        };

        if let (Some(area), Some(error)) = (error_area, &snap.error) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red));
            let line = Line::from(vec![
                Span::styled(
                    " Error: ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(error.as_str(), Style::default().fg(Color::White)),
            ]);
            frame.render_widget(Paragraph::new(line).block(block), area);
        }

        match &snap.table {
            Some(table) => self.render_table(frame, table_area, snap.count, table),
            None => {
                let block = Block::default()
                    .title(" Results ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green));
                let text = vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        "  No results yet.",
                        Style::default().fg(Color::DarkGray),
                    )),
                    Line::from(Span::styled(
                        "  Set filters and press Enter to apply them.",
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                frame.render_widget(Paragraph::new(text).block(block), table_area);
            }
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, count: u64, table: &ResultTable) {
        let block = Block::default()
            .title(format!(" Results ({} records) ", count))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));

        let widths: Vec<Constraint> = table
            .column_widths()
            .into_iter()
            .map(|w| Constraint::Length(to_u16(w).min(MAX_CELL_WIDTH)))
            .collect();

        let header = Row::new(table.headers.clone())
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let scroll = self.results_scroll.min(table.rows.len().saturating_sub(1));
        let rows: Vec<Row> = table
            .rows
            .iter()
            .skip(scroll)
            .map(|row| Row::new(row.clone()).style(Style::default().fg(Color::White)))
            .collect();

        let widget = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(2);
        frame.render_widget(widget, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, snap: &DashboardSnapshot) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let hint = if snap.chat_open {
            "  Enter send  |  Up/Down history  |  F2/Esc close chat  |  Ctrl+C quit"
        } else {
            "  Tab/Up/Down move  |  Left/Right choose  |  Enter apply  |  Ctrl+X clear  |  F2 chat  |  Esc quit"
        };
        let line = Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_chat(&self, frame: &mut Frame, area: Rect, snap: &DashboardSnapshot) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Chat ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(inner);

        let visible = parts[0].height as usize;
        let skip = snap.transcript.len().saturating_sub(visible);
        let lines: Vec<Line> = snap
            .transcript
            .iter()
            .skip(skip)
            .map(|msg| {
                let stamp = Span::styled(
                    format!("{} ", msg.sent_at.with_timezone(&Local).format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                );
                if msg.is_user() {
                    Line::from(vec![
                        stamp,
                        Span::styled(msg.text.clone(), Style::default().fg(Color::LightBlue)),
                    ])
                    .alignment(Alignment::Right)
                } else {
                    Line::from(vec![
                        stamp,
                        Span::styled(msg.text.clone(), Style::default().fg(Color::White)),
                    ])
                    .alignment(Alignment::Left)
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), parts[0]);

        let input_block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray));
        let input_line = if snap.chat_input.is_empty() {
            Line::from(Span::styled(
                " Type a message...",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(vec![
                Span::styled(" ", Style::default()),
                Span::styled(snap.chat_input.as_str(), Style::default().fg(Color::White)),
            ])
        };
        frame.render_widget(Paragraph::new(input_line).block(input_block), parts[1]);

        let cursor_x = parts[1].x.saturating_add(1).saturating_add(to_u16(snap.chat_cursor));
        let cursor_y = parts[1].y.saturating_add(1);
        if cursor_x < parts[1].x.saturating_add(parts[1].width) {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

/// Terminal coordinates are `u16`; anything wider is off-screen anyway.
fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Bottom-right popup above the footer.
fn chat_area(area: Rect) -> Rect {
    let width = area.width.min(CHAT_WIDTH);
    let available = area.height.saturating_sub(FOOTER_HEIGHT);
    let height = (available * 3 / 5).max(8).min(available);
    Rect {
        x: area.x + area.width - width,
        y: area.y + available - height,
        width,
        height,
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the dashboard event loop until the user quits.
pub async fn run_console(config: &DashboardConfig) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "The dashboard requires a terminal (TTY). Use `statdash filter` or `statdash chat` instead."
        ));
    }

    let client = HttpDashboardClient::new(&config.backend.base_url, config.request_timeout())?;
    let base_url = client.base_url().to_string();
    let api: Arc<dyn DashboardApi> = Arc::new(client);
    let state = Arc::new(RwLock::new(DashboardState::new(config)));
    let mut dashboard = Dashboard::new(state, api, base_url);
    dashboard.spawn_backend_probe();

    // Set up panic hook to restore terminal.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    tracing::info!(backend = %dashboard.base_url, "Dashboard started");

    let result = drive(&mut dashboard, &mut terminal, poll_key).await;
    let restored = restore_terminal(&mut terminal);
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Dashboard loop failed");
    }
    result?;
    restored?;
    tracing::info!("Dashboard closed");
    Ok(())
}

/// Next key press within `timeout`, if any.
fn poll_key(timeout: Duration) -> io::Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press {
                return Ok(Some(key_event));
            }
        }
    }
    Ok(None)
}

/// Render and dispatch keys until the user quits or drawing/input fails.
/// The caller owns terminal teardown on both outcomes.
pub async fn drive<B, F>(
    dashboard: &mut Dashboard,
    terminal: &mut Terminal<B>,
    mut next_key: F,
) -> io::Result<()>
where
    B: Backend,
    F: FnMut(Duration) -> io::Result<Option<KeyEvent>>,
{
    let tick_rate = Duration::from_millis(100); // ~10fps

    loop {
        let snapshot = dashboard.snapshot().await;

        terminal.draw(|frame| {
            dashboard.render(frame, &snapshot);
        })?;

        if let Some(key_event) = next_key(tick_rate)? {
            if dashboard.handle_key(key_event.code, key_event.modifiers).await {
                return Ok(());
            }
        }
    }
}
