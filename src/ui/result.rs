//! Results area: reply text and usage, or the error

use agentprobe::{TestResult, Usage};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// One-line token summary; counts the provider left out show as N/A
pub fn format_usage(usage: &Usage) -> String {
    let count = |n: Option<u64>| n.map_or_else(|| "N/A".to_string(), |n| n.to_string());
    format!(
        "Prompt tokens: {} · Completion tokens: {} · Total tokens: {}",
        count(usage.prompt_tokens),
        count(usage.completion_tokens),
        count(usage.total_tokens)
    )
}

/// Last result plus its scroll offset
#[derive(Debug, Clone, Default)]
pub struct ResultView {
    result: Option<TestResult>,
    scroll: u16,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn set(&mut self, result: TestResult) {
        self.result = Some(result);
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.result = None;
        self.scroll = 0;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn widget(&self, show_usage: bool, busy: bool) -> ResultViewWidget<'_> {
        ResultViewWidget {
            view: self,
            show_usage,
            busy,
        }
    }

    fn lines(&self, show_usage: bool, busy: bool) -> Vec<Line<'_>> {
        if busy {
            return vec![Line::styled(
                "Testing agent...",
                Style::default().fg(Color::Yellow),
            )];
        }

        match &self.result {
            None => vec![Line::styled(
                "Type a message and press Enter to test the selected agent",
                Style::default().fg(Color::DarkGray),
            )],
            Some(TestResult::Success { content, usage }) => {
                let mut lines = vec![
                    Line::styled(
                        "✓ Agent responded successfully",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Line::from(""),
                ];
                lines.extend(content.lines().map(Line::from));
                if show_usage {
                    lines.push(Line::from(""));
                    lines.push(match usage {
                        Some(usage) => Line::from(Span::styled(
                            format_usage(usage),
                            Style::default().fg(Color::Cyan),
                        )),
                        None => Line::styled(
                            "No usage information available for this response",
                            Style::default().fg(Color::DarkGray),
                        ),
                    });
                }
                lines
            }
            Some(TestResult::Failure { error }) => {
                let mut lines = vec![Line::styled(
                    "✗ Error",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )];
                lines.extend(
                    error
                        .lines()
                        .map(|l| Line::styled(l, Style::default().fg(Color::Red))),
                );
                lines
            }
        }
    }
}

pub struct ResultViewWidget<'a> {
    view: &'a ResultView,
    show_usage: bool,
    busy: bool,
}

impl Widget for ResultViewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Response ");

        Paragraph::new(self.view.lines(self.show_usage, self.busy))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.view.scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(view: &ResultView, show_usage: bool, busy: bool) -> String {
        let backend = TestBackend::new(90, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| frame.render_widget(view.widget(show_usage, busy), frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..10 {
            for x in 0..90 {
                out.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_format_usage() {
        assert_eq!(
            format_usage(&Usage::new(3, 2, 5)),
            "Prompt tokens: 3 · Completion tokens: 2 · Total tokens: 5"
        );
    }

    #[test]
    fn test_format_partial_usage() {
        let usage = Usage {
            prompt_tokens: Some(3),
            completion_tokens: None,
            total_tokens: None,
        };
        assert_eq!(
            format_usage(&usage),
            "Prompt tokens: 3 · Completion tokens: N/A · Total tokens: N/A"
        );
    }

    #[test]
    fn test_render_success_with_usage() {
        let mut view = ResultView::new();
        view.set(TestResult::success(
            "Hello",
            Some(Usage::new(3, 2, 5)),
        ));
        let out = render(&view, true, false);
        assert!(out.contains("Agent responded successfully"));
        assert!(out.contains("Hello"));
        assert!(out.contains("Total tokens: 5"));
    }

    #[test]
    fn test_render_success_without_usage() {
        let mut view = ResultView::new();
        view.set(TestResult::success("Hello", None));
        let out = render(&view, true, false);
        assert!(out.contains("No usage information available"));
        assert!(!out.contains("Total tokens"));

        let out = render(&view, false, false);
        assert!(!out.contains("No usage information available"));
    }

    #[test]
    fn test_render_failure() {
        let mut view = ResultView::new();
        view.set(TestResult::failure("API error (401 Unauthorized): bad token"));
        let out = render(&view, true, false);
        assert!(out.contains("Error"));
        assert!(out.contains("API error (401 Unauthorized): bad token"));
        assert!(!out.contains("successfully"));
    }

    #[test]
    fn test_busy_overrides_result() {
        let mut view = ResultView::new();
        view.set(TestResult::success("Hello", None));
        let out = render(&view, true, true);
        assert!(out.contains("Testing agent..."));
        assert!(!out.contains("Hello"));
    }

    #[test]
    fn test_clear_and_scroll() {
        let mut view = ResultView::new();
        view.set(TestResult::success("a\nb\nc", None));
        view.scroll_down(2);
        view.scroll_up(5);
        assert_eq!(view.scroll, 0);
        view.clear();
        assert!(view.result().is_none());
    }
}
