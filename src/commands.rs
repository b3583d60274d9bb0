//! Non-interactive subcommands

use std::io::Write;

use agentprobe::{invoke, AddOutcome, AgentRegistry, CredentialSources, TestResult};
use anyhow::Result;
use clap::Subcommand;

use crate::ui::format_usage;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List registered agents
    List,

    /// Register an agent, replacing any agent with the same name
    Add {
        name: String,
        endpoint: String,
        model: String,
    },

    /// Delete an agent (no-op if it does not exist)
    Remove { name: String },

    /// Send one test message to an agent
    Send {
        name: String,
        message: String,

        /// Token for this run, used when the environment variable is unset
        #[arg(long)]
        token: Option<String>,
    },
}

/// Execute a subcommand, writing to stdout
pub async fn run(
    command: Command,
    mut registry: AgentRegistry,
    mut credentials: CredentialSources,
) -> Result<()> {
    let mut out = std::io::stdout().lock();

    match command {
        Command::List => {
            write_list(&registry, &mut out)?;
        }
        Command::Add {
            name,
            endpoint,
            model,
        } => {
            crate::ui::validate_agent_fields(&name, &endpoint, &model)?;
            let name = name.trim();
            let outcome = registry.add(name, endpoint.trim(), model.trim())?;
            writeln!(out, "Agent '{}' {}", name, outcome_verb(outcome))?;
        }
        // Names are stored trimmed, so lookups trim too
        Command::Remove { name } => {
            let name = name.trim();
            match registry.delete(name)? {
                Some(_) => writeln!(out, "Agent '{}' deleted", name)?,
                None => writeln!(out, "No agent named '{}'", name)?,
            }
        }
        Command::Send {
            name,
            message,
            token,
        } => {
            if message.trim().is_empty() {
                anyhow::bail!("Please enter a message to send");
            }
            let agent = registry.require(name.trim())?;
            if let Some(token) = token {
                credentials.set_session(token);
            }
            let credential = credentials.resolve()?;

            match invoke(&agent.endpoint, &agent.model, &message, &credential).await {
                TestResult::Success { content, usage } => {
                    writeln!(out, "{}", content)?;
                    match usage {
                        Some(usage) => writeln!(out, "\n[{}]", format_usage(&usage))?,
                        None => writeln!(out, "\n[no usage information]")?,
                    }
                }
                TestResult::Failure { error } => anyhow::bail!(error),
            }
        }
    }

    Ok(())
}

pub fn outcome_verb(outcome: AddOutcome) -> &'static str {
    match outcome {
        AddOutcome::Created => "added",
        AddOutcome::Updated => "updated",
    }
}

fn write_list(registry: &AgentRegistry, out: &mut impl Write) -> Result<()> {
    if registry.is_empty() {
        writeln!(out, "No agents configured")?;
        return Ok(());
    }
    for (name, agent) in registry.list() {
        writeln!(out, "{}", name)?;
        writeln!(out, "  model:    {}", agent.model)?;
        writeln!(out, "  endpoint: {}", agent.endpoint)?;
        writeln!(
            out,
            "  created:  {}",
            agent.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentprobe::RegistryStorage;
    use tempfile::tempdir;

    #[test]
    fn test_write_list_empty() {
        let dir = tempdir().unwrap();
        let registry =
            AgentRegistry::load(RegistryStorage::with_path(dir.path().join("a.toml"))).unwrap();
        let mut buf = Vec::new();
        write_list(&registry, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No agents configured\n");
    }

    #[test]
    fn test_write_list() {
        let dir = tempdir().unwrap();
        let mut registry =
            AgentRegistry::load(RegistryStorage::with_path(dir.path().join("a.toml"))).unwrap();
        registry.add("bot", "http://x/v1", "gpt-4o").unwrap();

        let mut buf = Vec::new();
        write_list(&registry, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("bot\n"));
        assert!(text.contains("  model:    gpt-4o\n"));
        assert!(text.contains("  endpoint: http://x/v1\n"));
    }

    #[tokio::test]
    async fn test_send_refused_without_credential() {
        let dir = tempdir().unwrap();
        let mut registry =
            AgentRegistry::load(RegistryStorage::with_path(dir.path().join("a.toml"))).unwrap();
        // Unroutable endpoint: the test fails loudly if a request were attempted
        registry.add("bot", "http://127.0.0.1:9/v1", "m").unwrap();

        let err = run(
            Command::Send {
                name: "bot".to_string(),
                message: "hi".to_string(),
                token: None,
            },
            registry,
            CredentialSources::new("SOME_TOKEN", None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Not authenticated"));
    }

    #[tokio::test]
    async fn test_send_unknown_agent() {
        let dir = tempdir().unwrap();
        let registry =
            AgentRegistry::load(RegistryStorage::with_path(dir.path().join("a.toml"))).unwrap();

        let err = run(
            Command::Send {
                name: "ghost".to_string(),
                message: "hi".to_string(),
                token: Some("t".to_string()),
            },
            registry,
            CredentialSources::new("SOME_TOKEN", None),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Agent not found: ghost");
    }

    #[tokio::test]
    async fn test_names_are_trimmed_on_every_command() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.toml");
        let load = || AgentRegistry::load(RegistryStorage::with_path(&path)).unwrap();
        let credentials = || CredentialSources::new("SOME_TOKEN", None);

        run(
            Command::Add {
                name: " bot ".to_string(),
                endpoint: "http://127.0.0.1:9/v1".to_string(),
                model: "m".to_string(),
            },
            load(),
            credentials(),
        )
        .await
        .unwrap();
        assert!(load().get("bot").is_some());

        // Found under the padded name: fails on credentials, not lookup
        let err = run(
            Command::Send {
                name: " bot ".to_string(),
                message: "hi".to_string(),
                token: None,
            },
            load(),
            credentials(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Not authenticated"));

        run(Command::Remove { name: " bot ".to_string() }, load(), credentials())
            .await
            .unwrap();
        assert!(load().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.toml");
        let registry = AgentRegistry::load(RegistryStorage::with_path(&path)).unwrap();

        let result = run(
            Command::Add {
                name: "bot".to_string(),
                endpoint: " ".to_string(),
                model: "m".to_string(),
            },
            registry,
            CredentialSources::new("SOME_TOKEN", None),
        )
        .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
