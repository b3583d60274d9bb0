//! Create-agent form

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use thiserror::Error;

use super::input::InputBox;

/// Blank required fields on the create-agent form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fill in all fields (missing: {})", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Check that name, endpoint, and model are all non-blank
pub fn validate_agent_fields(name: &str, endpoint: &str, model: &str) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = [
        (FormField::Name, name),
        (FormField::Endpoint, endpoint),
        (FormField::Model, model),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field.label())
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { missing })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Endpoint,
    Model,
}

impl FormField {
    const ALL: [FormField; 3] = [FormField::Name, FormField::Endpoint, FormField::Model];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Agent Name",
            FormField::Endpoint => "Endpoint URL",
            FormField::Model => "Model Name",
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            FormField::Name => "My Agent",
            FormField::Endpoint => "https://dbc-xxxxx.cloud.databricks.com/serving-endpoints",
            FormField::Model => "t2t-xxxxx-endpoint",
        }
    }

    fn index(&self) -> usize {
        match self {
            FormField::Name => 0,
            FormField::Endpoint => 1,
            FormField::Model => 2,
        }
    }
}

/// Validated form contents, trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub name: String,
    pub endpoint: String,
    pub model: String,
}

/// Form state: three inputs and the focused one
#[derive(Debug, Clone)]
pub struct AgentForm {
    inputs: [InputBox; 3],
    focus: FormField,
}

impl AgentForm {
    pub fn new() -> Self {
        Self {
            inputs: Default::default(),
            focus: FormField::Name,
        }
    }

    pub fn focused_input(&mut self) -> &mut InputBox {
        &mut self.inputs[self.focus.index()]
    }

    pub fn value(&self, field: FormField) -> &str {
        self.inputs[field.index()].content()
    }

    pub fn next_field(&mut self) {
        self.focus = FormField::ALL[(self.focus.index() + 1) % FormField::ALL.len()];
    }

    pub fn prev_field(&mut self) {
        let len = FormField::ALL.len();
        self.focus = FormField::ALL[(self.focus.index() + len - 1) % len];
    }

    /// Validate and return the trimmed values; the form is left untouched on error
    pub fn submit(&self) -> Result<NewAgent, ValidationError> {
        let name = self.value(FormField::Name);
        let endpoint = self.value(FormField::Endpoint);
        let model = self.value(FormField::Model);
        validate_agent_fields(name, endpoint, model)?;

        Ok(NewAgent {
            name: name.trim().to_string(),
            endpoint: endpoint.trim().to_string(),
            model: model.trim().to_string(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn widget<'a>(&'a self, error: Option<&'a str>) -> AgentFormWidget<'a> {
        AgentFormWidget { form: self, error }
    }
}

impl Default for AgentForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Popup widget for the form
pub struct AgentFormWidget<'a> {
    form: &'a AgentForm,
    error: Option<&'a str>,
}

impl Widget for AgentFormWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Create Agent ");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        for field in FormField::ALL {
            self.form.inputs[field.index()]
                .widget(field.label())
                .placeholder(field.placeholder())
                .focused(field == self.form.focus)
                .render(chunks[field.index()], buf);
        }

        let footer = match self.error {
            Some(error) => Line::styled(error, Style::default().fg(Color::Red)),
            None => Line::styled(
                "Tab next field · Enter add · Esc cancel",
                Style::default().fg(Color::DarkGray),
            ),
        };
        Paragraph::new(footer).render(chunks[3], buf);
    }
}
