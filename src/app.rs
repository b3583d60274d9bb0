use crate::commands::outcome_verb;
use crate::ui::{AgentForm, AgentList, AuthStatus, CredentialPrompt, InputBox, ResultView, StatusBar};

use agentprobe::{invoke, AgentRegistry, Config, Credential, CredentialSources, TestResult};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, BeginSynchronizedUpdate, EndSynchronizedUpdate},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Stdout, Write};
use std::time::Duration;

const APP_NAME: &str = "agentprobe";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const SCROLL_LINES: u16 = 5;

/// Input modes determine which keybindings are active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Compose,
    AgentForm,
    Credential,
}

/// Actions that can be triggered by key events
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    InsertChar(char),
    InsertNewline,
    DeleteBack,
    DeleteForward,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    HistoryPrev,
    HistoryNext,
    SelectPrev,
    SelectNext,
    FocusCompose,
    FocusAgents,
    OpenAgentForm,
    OpenCredential,
    NextField,
    PrevField,
    DeleteAgent,
    Submit,
    Cancel,
    ClearResult,
    ClearSessionToken,
    ScrollUp,
    ScrollDown,
    Quit,
}

/// Map a key event to an action based on the current input mode
fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    // Global shortcuts (work in all modes)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') = key.code {
            return Some(Action::Quit);
        }
    }

    match mode {
        InputMode::Browse => map_key_browse(key),
        InputMode::Compose => map_key_compose(key),
        InputMode::AgentForm => map_key_form(key),
        InputMode::Credential => map_key_credential(key),
    }
}

fn map_key_browse(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
        KeyCode::Enter | KeyCode::Tab | KeyCode::Char('i') => Some(Action::FocusCompose),
        KeyCode::Char('a') => Some(Action::OpenAgentForm),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteAgent),
        KeyCode::Char('t') => Some(Action::OpenCredential),
        KeyCode::Char('T') => Some(Action::ClearSessionToken),
        KeyCode::Char('c') => Some(Action::ClearResult),
        KeyCode::PageUp => Some(Action::ScrollUp),
        KeyCode::PageDown => Some(Action::ScrollDown),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

/// Text editing keys shared by every input
fn map_key_editing(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(c) => Some(Action::InsertChar(c)),
        KeyCode::Backspace => Some(Action::DeleteBack),
        KeyCode::Delete => Some(Action::DeleteForward),
        KeyCode::Left => Some(Action::CursorLeft),
        KeyCode::Right => Some(Action::CursorRight),
        KeyCode::Home => Some(Action::CursorHome),
        KeyCode::End => Some(Action::CursorEnd),
        _ => None,
    }
}

fn map_key_compose(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('l') => Some(Action::ClearResult),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT)
                      || key.modifiers.contains(KeyModifiers::ALT) => Some(Action::InsertNewline),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc | KeyCode::Tab => Some(Action::FocusAgents),
        KeyCode::Up => Some(Action::HistoryPrev),
        KeyCode::Down => Some(Action::HistoryNext),
        KeyCode::PageUp => Some(Action::ScrollUp),
        KeyCode::PageDown => Some(Action::ScrollDown),
        _ => map_key_editing(key),
    }
}

fn map_key_form(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Cancel),
        _ => map_key_editing(key),
    }
}

fn map_key_credential(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Cancel),
        _ => map_key_editing(key),
    }
}

/// One-line message under the main area, cleared on the next action
#[derive(Debug, Clone, PartialEq, Eq)]
enum Alert {
    Info(String),
    Error(String),
}

impl Alert {
    fn text(&self) -> &str {
        match self {
            Alert::Info(text) | Alert::Error(text) => text,
        }
    }

    fn color(&self) -> Color {
        match self {
            Alert::Info(_) => Color::Green,
            Alert::Error(_) => Color::Red,
        }
    }
}

/// Work the event loop has to carry out after an action
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    Invoke {
        endpoint: String,
        model: String,
        message: String,
        credential: Credential,
    },
}

/// Everything the UI shows, independent of the terminal
struct AppState {
    config: Config,
    registry: AgentRegistry,
    credentials: CredentialSources,
    mode: InputMode,
    agents: AgentList,
    compose: InputBox,
    form: AgentForm,
    form_error: Option<String>,
    token_input: InputBox,
    result: ResultView,
    busy: bool,
    alert: Option<Alert>,
    should_quit: bool,
}

impl AppState {
    fn new(config: Config, registry: AgentRegistry, credentials: CredentialSources) -> Self {
        let mut agents = AgentList::new();
        agents.sync(&registry);

        Self {
            config,
            registry,
            credentials,
            mode: InputMode::Browse,
            agents,
            compose: InputBox::new(),
            form: AgentForm::new(),
            form_error: None,
            token_input: InputBox::masked(),
            result: ResultView::new(),
            busy: false,
            alert: None,
            should_quit: false,
        }
    }

    /// The input box receiving keystrokes in the current mode
    fn active_input(&mut self) -> Option<&mut InputBox> {
        match self.mode {
            InputMode::Browse => None,
            InputMode::Compose => Some(&mut self.compose),
            InputMode::AgentForm => Some(self.form.focused_input()),
            InputMode::Credential => Some(&mut self.token_input),
        }
    }

    fn handle_action(&mut self, action: Action) -> Option<Effect> {
        self.alert = None;

        match action {
            Action::InsertChar(c) => self.edit(|input| input.insert_char(c)),
            Action::InsertNewline => self.edit(InputBox::insert_newline),
            Action::DeleteBack => self.edit(InputBox::delete_char),
            Action::DeleteForward => self.edit(InputBox::delete_char_forward),
            Action::CursorLeft => self.edit(InputBox::move_cursor_left),
            Action::CursorRight => self.edit(InputBox::move_cursor_right),
            Action::CursorHome => self.edit(InputBox::move_cursor_start),
            Action::CursorEnd => self.edit(InputBox::move_cursor_end),
            Action::HistoryPrev => self.compose.history_prev(),
            Action::HistoryNext => self.compose.history_next(),
            Action::SelectPrev => self.agents.select_prev(&self.registry),
            Action::SelectNext => self.agents.select_next(&self.registry),
            Action::FocusCompose => {
                if self.agents.selected().is_some() {
                    self.mode = InputMode::Compose;
                } else {
                    self.alert = Some(Alert::Error(
                        "Select an agent first (press 'a' to add one)".to_string(),
                    ));
                }
            }
            Action::FocusAgents => self.mode = InputMode::Browse,
            Action::OpenAgentForm => {
                self.form.reset();
                self.form_error = None;
                self.mode = InputMode::AgentForm;
            }
            Action::OpenCredential => {
                self.token_input.clear();
                self.mode = InputMode::Credential;
            }
            Action::NextField => self.form.next_field(),
            Action::PrevField => self.form.prev_field(),
            Action::DeleteAgent => self.delete_selected(),
            Action::Submit => match self.mode {
                InputMode::Compose => return self.prepare_send(),
                InputMode::AgentForm => self.submit_form(),
                InputMode::Credential => self.submit_token(),
                InputMode::Browse => {}
            },
            Action::Cancel => {
                self.form_error = None;
                self.token_input.clear();
                self.mode = InputMode::Browse;
            }
            Action::ClearResult => {
                if self.result.result().is_some() {
                    self.result.clear();
                    self.alert = Some(Alert::Info("Response cleared".to_string()));
                }
            }
            Action::ClearSessionToken => {
                if self.credentials.has_session() {
                    self.credentials.clear_session();
                    self.alert = Some(Alert::Info("Session token cleared".to_string()));
                }
            }
            Action::ScrollUp => self.result.scroll_up(SCROLL_LINES),
            Action::ScrollDown => self.result.scroll_down(SCROLL_LINES),
            Action::Quit => self.should_quit = true,
        }

        None
    }

    fn edit(&mut self, f: impl FnOnce(&mut InputBox)) {
        if let Some(input) = self.active_input() {
            f(input);
        }
    }

    fn submit_form(&mut self) {
        let new_agent = match self.form.submit() {
            Ok(new_agent) => new_agent,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };

        match self
            .registry
            .add(&new_agent.name, &new_agent.endpoint, &new_agent.model)
        {
            Ok(outcome) => {
                self.alert = Some(Alert::Info(format!(
                    "Agent '{}' {} successfully",
                    new_agent.name,
                    outcome_verb(outcome)
                )));
                self.agents.select(Some(new_agent.name));
                self.form.reset();
                self.form_error = None;
                self.mode = InputMode::Browse;
            }
            Err(e) => {
                tracing::error!("Failed to save agent: {:#}", e);
                self.form_error = Some(format!("Failed to save agent: {}", e));
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(name) = self.agents.selected().map(str::to_string) else {
            return;
        };

        match self.registry.delete(&name) {
            Ok(_) => {
                self.agents.sync(&self.registry);
                self.result.clear();
                self.alert = Some(Alert::Info(format!("Agent '{}' deleted", name)));
            }
            Err(e) => {
                tracing::error!("Failed to delete agent: {:#}", e);
                self.alert = Some(Alert::Error(format!("Failed to delete agent: {}", e)));
            }
        }
    }

    fn submit_token(&mut self) {
        let token = self.token_input.submit();
        if token.trim().is_empty() {
            self.alert = Some(Alert::Error("Please enter a token".to_string()));
            return;
        }

        self.credentials.set_session(token.trim());
        self.mode = InputMode::Browse;
        self.alert = Some(if self.credentials.has_ambient() {
            Alert::Info(format!(
                "Token saved for this session; {} still takes precedence",
                self.credentials.env_var()
            ))
        } else {
            Alert::Info("Token saved for this session".to_string())
        });
    }

    /// Check preconditions for a send; the message is only consumed when it goes out
    fn prepare_send(&mut self) -> Option<Effect> {
        let Some(agent) = self.agents.selected().and_then(|name| self.registry.get(name)) else {
            self.alert = Some(Alert::Error("Select an agent first".to_string()));
            return None;
        };
        let (endpoint, model) = (agent.endpoint.clone(), agent.model.clone());

        if self.compose.content().trim().is_empty() {
            self.alert = Some(Alert::Error("Please enter a message to send".to_string()));
            return None;
        }

        let credential = match self.credentials.resolve() {
            Ok(credential) => credential,
            Err(e) => {
                self.alert = Some(Alert::Error(format!("{} (press Esc then 't')", e)));
                return None;
            }
        };

        let message = self.compose.submit();
        self.busy = true;
        Some(Effect::Invoke {
            endpoint,
            model,
            message,
            credential,
        })
    }

    fn finish(&mut self, result: TestResult) {
        self.busy = false;
        self.result.set(result);
    }

    fn hint(&self) -> &'static str {
        match self.mode {
            InputMode::Browse => "↑↓ select · Enter compose · a add · d delete · t token · q quit",
            InputMode::Compose => "Enter send · Alt+Enter newline · Esc agents · Ctrl+L clear",
            InputMode::AgentForm => "Tab next field · Enter add · Esc cancel",
            InputMode::Credential => "Enter save · Esc cancel",
        }
    }

    fn render(&self, frame: &mut Frame) {
        let selected = self
            .agents
            .selected()
            .and_then(|name| self.registry.get(name).map(|agent| (name, agent)));

        let area = frame.area();
        let content_width = area.width - (u32::from(area.width) * 3 / 10) as u16;
        let compose_height = self
            .compose
            .required_height(content_width)
            .min(area.height / 3)
            .max(3);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Main area
                Constraint::Length(1), // Alert line
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(rows[0]);

        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),              // Agent header
                Constraint::Length(compose_height), // Message input
                Constraint::Min(3),                 // Response
            ])
            .split(columns[1]);

        frame.render_widget(
            self.agents
                .widget(&self.registry, self.mode == InputMode::Browse),
            columns[0],
        );

        let header = match selected {
            Some((name, agent)) => vec![
                Line::from(vec![
                    Span::raw("Testing: "),
                    Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("{} · {}", agent.model, agent.endpoint),
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            None => vec![Line::styled(
                "Select an agent from the sidebar, or press 'a' to add one",
                Style::default().fg(Color::DarkGray),
            )],
        };
        frame.render_widget(
            Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
            main[0],
        );

        frame.render_widget(
            self.compose
                .widget("Message")
                .placeholder("Type a test message...")
                .focused(self.mode == InputMode::Compose),
            main[1],
        );
        frame.render_widget(
            self.result.widget(self.config.ui.show_usage, self.busy),
            main[2],
        );

        if let Some(alert) = &self.alert {
            frame.render_widget(
                Paragraph::new(alert.text()).style(Style::default().fg(alert.color())),
                rows[1],
            );
        }

        let auth = AuthStatus::from_source(self.credentials.active_source());
        frame.render_widget(
            StatusBar::new(APP_NAME, APP_VERSION, auth)
                .agent(selected.map(|(name, _)| name))
                .busy(self.busy)
                .hint(self.hint()),
            rows[2],
        );

        match self.mode {
            InputMode::AgentForm => {
                frame.render_widget(
                    self.form.widget(self.form_error.as_deref()),
                    popup_area(area, 70, 13),
                );
            }
            InputMode::Credential => {
                frame.render_widget(
                    CredentialPrompt::new(&self.token_input, self.credentials.env_var())
                        .sources(self.credentials.has_ambient(), self.credentials.has_session()),
                    popup_area(area, 60, 9),
                );
            }
            InputMode::Browse | InputMode::Compose => {}
        }
    }
}

/// Centered rectangle, `percent_x` wide and `height` rows tall
fn popup_area(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let width = width.max(40).min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Application state
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
}

impl App {
    /// Create a new application
    pub fn new(config: Config, registry: AgentRegistry, credentials: CredentialSources) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            crossterm::terminal::SetTitle(format!("{} v{}", APP_NAME, APP_VERSION)),
            crossterm::event::PushKeyboardEnhancementFlags(
                crossterm::event::KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        Ok(Self {
            terminal,
            state: AppState::new(config, registry, credentials),
        })
    }

    /// Run the main event loop - purely event-driven rendering
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            "Starting UI with {} agent(s) from {}",
            self.state.registry.len(),
            self.state.registry.storage().path().display()
        );

        // Initial render
        self.draw()?;

        loop {
            // Block until we get an event - no polling when idle
            if event::poll(Duration::from_secs(60))? {
                let needs_redraw = match event::read()? {
                    // Key releases are reported too once event types are enabled
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if let Some(action) = map_key(self.state.mode, key) {
                            if let Some(effect) = self.state.handle_action(action) {
                                self.draw()?;
                                self.perform(effect).await?;
                            }
                        }
                        true
                    }
                    Event::Resize(_, _) => true,
                    _ => false,
                };

                if needs_redraw {
                    self.draw()?;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        self.cleanup()
    }

    async fn perform(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::Invoke {
                endpoint,
                model,
                message,
                credential,
            } => {
                let result = invoke(&endpoint, &model, &message, &credential).await;
                self.state.finish(result);
            }
        }

        // Drop keys typed while the request was in flight
        while event::poll(Duration::from_millis(0))? {
            let _ = event::read()?;
        }
        Ok(())
    }

    /// Draw the UI with synchronized updates to prevent tearing
    fn draw(&mut self) -> Result<()> {
        // Begin synchronized update - terminal buffers all changes
        queue!(self.terminal.backend_mut(), BeginSynchronizedUpdate)?;

        let state = &self.state;
        self.terminal.draw(|frame| state.render(frame))?;

        // End synchronized update - terminal renders atomically
        queue!(self.terminal.backend_mut(), EndSynchronizedUpdate)?;
        self.terminal.backend_mut().flush()?;

        Ok(())
    }

    /// Cleanup terminal
    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::event::PopKeyboardEnhancementFlags
        )
        .context("Failed to cleanup terminal")?;
        self.terminal
            .show_cursor()
            .context("Failed to show cursor")?;

        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
