//! Sidebar list of registered agents

use agentprobe::AgentRegistry;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};

/// Cursor over the registry, tracked by name so it survives reloads
#[derive(Debug, Clone, Default)]
pub struct AgentList {
    selected: Option<String>,
}

impl AgentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, name: Option<String>) {
        self.selected = name;
    }

    /// Drop the selection if it no longer exists, and default to the first agent
    pub fn sync(&mut self, registry: &AgentRegistry) {
        let still_there = self
            .selected
            .as_deref()
            .is_some_and(|name| registry.get(name).is_some());
        if !still_there {
            self.selected = registry.list().next().map(|(name, _)| name.to_string());
        }
    }

    pub fn select_next(&mut self, registry: &AgentRegistry) {
        self.step(registry, 1);
    }

    pub fn select_prev(&mut self, registry: &AgentRegistry) {
        self.step(registry, -1);
    }

    fn step(&mut self, registry: &AgentRegistry, delta: isize) {
        let names: Vec<&str> = registry.list().map(|(name, _)| name).collect();
        if names.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .as_deref()
            .and_then(|sel| names.iter().position(|name| *name == sel));
        let next = match current {
            Some(i) => (i as isize + delta).rem_euclid(names.len() as isize) as usize,
            None => 0,
        };
        self.selected = Some(names[next].to_string());
    }

    fn index(&self, registry: &AgentRegistry) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        registry.list().position(|(name, _)| name == selected)
    }

    pub fn widget<'a>(&'a self, registry: &'a AgentRegistry, focused: bool) -> AgentListWidget<'a> {
        AgentListWidget {
            list: self,
            registry,
            focused,
        }
    }
}

pub struct AgentListWidget<'a> {
    list: &'a AgentList,
    registry: &'a AgentRegistry,
    focused: bool,
}

impl Widget for AgentListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" Agents ({}) ", self.registry.len()));

        if self.registry.is_empty() {
            let lines = vec![
                Line::from(""),
                Line::styled("No agents configured", Style::default().fg(Color::Gray)),
                Line::styled(
                    "Press 'a' to add one",
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .centered()
                .render(area, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .registry
            .list()
            .map(|(name, agent)| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        name.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("  {}", agent.model),
                        Style::default().fg(Color::Yellow),
                    )),
                    Line::from(Span::styled(
                        format!("  {}", agent.endpoint),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(30, 41, 59)))
            .highlight_symbol("▌");

        let mut state = ListState::default().with_selected(self.list.index(self.registry));
        StatefulWidget::render(list, area, buf, &mut state);
    }
}
