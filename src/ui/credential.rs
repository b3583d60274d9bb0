//! Token entry popup

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::input::InputBox;

/// Popup for entering a session token
pub struct CredentialPrompt<'a> {
    input: &'a InputBox,
    env_var: &'a str,
    has_ambient: bool,
    has_session: bool,
}

impl<'a> CredentialPrompt<'a> {
    pub fn new(input: &'a InputBox, env_var: &'a str) -> Self {
        Self {
            input,
            env_var,
            has_ambient: false,
            has_session: false,
        }
    }

    pub fn sources(mut self, has_ambient: bool, has_session: bool) -> Self {
        self.has_ambient = has_ambient;
        self.has_session = has_session;
        self
    }
}

impl Widget for CredentialPrompt<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Authentication ");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner);

        let status = if self.has_ambient {
            Line::styled(
                format!("Token loaded from {} (takes precedence)", self.env_var),
                Style::default().fg(Color::Green),
            )
        } else if self.has_session {
            Line::styled(
                "Token set for this session",
                Style::default().fg(Color::Green),
            )
        } else {
            Line::styled(
                format!("No token found in {}; enter one below", self.env_var),
                Style::default().fg(Color::Yellow),
            )
        };
        Paragraph::new(status).render(chunks[0], buf);

        self.input
            .widget("Token")
            .placeholder("Enter your token...")
            .render(chunks[1], buf);

        Paragraph::new(vec![
            Line::styled(
                "Enter save for this session · Esc cancel",
                Style::default().fg(Color::DarkGray),
            ),
            Line::styled(
                format!("Or add {}=<token> to a .env file", self.env_var),
                Style::default().fg(Color::DarkGray),
            ),
        ])
        .render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(prompt: CredentialPrompt<'_>) -> String {
        let backend = TestBackend::new(70, 9);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| frame.render_widget(prompt, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..9 {
            for x in 0..70 {
                out.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_prompt_without_token() {
        let input = InputBox::masked();
        let out = render(CredentialPrompt::new(&input, "DATABRICKS_TOKEN"));
        assert!(out.contains("No token found in DATABRICKS_TOKEN"));
    }

    #[test]
    fn test_prompt_hides_typed_token() {
        let mut input = InputBox::masked();
        input.set_content("dapi-secret");
        let out = render(CredentialPrompt::new(&input, "TOKEN").sources(true, false));
        assert!(out.contains("Token loaded from TOKEN"));
        assert!(!out.contains("dapi-secret"));
    }
}
