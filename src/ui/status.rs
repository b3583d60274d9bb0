//! Status bar component

use agentprobe::CredentialSource;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Authentication state shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated(CredentialSource),
    NotAuthenticated,
}

impl AuthStatus {
    pub fn from_source(source: Option<CredentialSource>) -> Self {
        source.map_or(AuthStatus::NotAuthenticated, AuthStatus::Authenticated)
    }

    pub fn symbol(&self) -> &str {
        match self {
            AuthStatus::Authenticated(_) => "●",
            AuthStatus::NotAuthenticated => "○",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AuthStatus::Authenticated(_) => Color::Green,
            AuthStatus::NotAuthenticated => Color::Red,
        }
    }

    pub fn text(&self) -> String {
        match self {
            AuthStatus::Authenticated(source) => format!("Authenticated ({})", source.label()),
            AuthStatus::NotAuthenticated => "Not authenticated".to_string(),
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    app_name: &'a str,
    version: &'a str,
    agent: Option<&'a str>,
    auth: AuthStatus,
    busy: bool,
    hint: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new(app_name: &'a str, version: &'a str, auth: AuthStatus) -> Self {
        Self {
            app_name,
            version,
            agent: None,
            auth,
            busy: false,
            hint: "",
        }
    }

    pub fn agent(mut self, agent: Option<&'a str>) -> Self {
        self.agent = agent;
        self
    }

    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = hint;
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);

        // Clear the area
        buf.set_style(area, style);

        let mut spans = vec![
            Span::styled(
                format!(" {} v{} ", self.app_name, self.version),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("│ "),
            Span::styled(
                format!("{} ", self.auth.symbol()),
                Style::default().fg(self.auth.color()),
            ),
            Span::styled(self.auth.text(), Style::default().fg(self.auth.color())),
        ];

        if let Some(agent) = self.agent {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(
                format!("Agent: {}", agent),
                Style::default().fg(Color::White),
            ));
        }

        if self.busy {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled("◐ Testing...", Style::default().fg(Color::Yellow)));
        }

        if !self.hint.is_empty() {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(self.hint, Style::default().fg(Color::Gray)));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
