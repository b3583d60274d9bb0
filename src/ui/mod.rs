//! UI components for the TUI

mod agents;
mod credential;
mod form;
mod input;
mod result;
mod status;

pub use agents::AgentList;
pub use credential::CredentialPrompt;
pub use form::{validate_agent_fields, AgentForm};
pub use input::InputBox;
pub use result::{format_usage, ResultView};
pub use status::{AuthStatus, StatusBar};
