//! agentprobe - register chat-completion agents and send them test messages
//!
//! The library holds the core: a persisted [`AgentRegistry`], credential
//! resolution, and [`invoke`], which sends one message to an OpenAI-compatible
//! endpoint and always returns a [`TestResult`].
//!
//! # Example
//!
//! ```no_run
//! use agentprobe::{invoke, AgentRegistry, CredentialSources, RegistryStorage, TestResult};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut registry = AgentRegistry::load(RegistryStorage::with_path("agents.toml"))?;
//!     registry.add("local", "http://localhost:8000/v1", "llama3")?;
//!
//!     let credential = CredentialSources::from_env("DATABRICKS_TOKEN").resolve()?;
//!     let agent = registry.require("local")?;
//!
//!     match invoke(&agent.endpoint, &agent.model, "Hello!", &credential).await {
//!         TestResult::Success { content, usage } => println!("{} ({:?})", content, usage),
//!         TestResult::Failure { error } => eprintln!("Error: {}", error),
//!     }
//!     Ok(())
//! }
//! ```

mod auth;
mod config;
mod llm;
mod registry;

pub use auth::{Credential, CredentialError, CredentialSource, CredentialSources};
pub use config::{Config, DEFAULT_TOKEN_ENV};
pub use llm::{
    invoke, invoke_with, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTransport,
    Choice, OpenAiClient, ResponseMessage, Role, TestResult, Usage,
};
pub use registry::{AddOutcome, Agent, AgentRegistry, RegistryError, RegistryStorage};
