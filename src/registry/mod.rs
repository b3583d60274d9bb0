//! Agent registry
//!
//! A name-keyed collection of chat-completion endpoints. The registry is loaded
//! once, mutated in memory, and written back as a whole after every change.

mod storage;

pub use storage::RegistryStorage;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A registered chat-completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Registry key; not stored inside the record
    #[serde(skip)]
    pub name: String,
    pub endpoint: String,
    pub model: String,
    /// Written as an RFC 3339 string; a native TOML datetime is accepted on read
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match toml::Value::deserialize(deserializer)? {
        toml::Value::String(text) => text,
        toml::Value::Datetime(datetime) => datetime.to_string(),
        other => {
            return Err(D::Error::custom(format!(
                "invalid type: {}, expected a datetime",
                other.type_str()
            )))
        }
    };
    parse_timestamp(&text).ok_or_else(|| D::Error::custom(format!("invalid created_at: {}", text)))
}

/// RFC 3339, or a local date-time without offset taken as UTC
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Errors raised by the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write registry file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Agent name must not be empty")]
    EmptyName,

    #[error("Agent not found: {0}")]
    NotFound(String),
}

/// Whether `add` created a record or replaced one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    Updated,
}

/// In-memory registry backed by a single document
#[derive(Debug)]
pub struct AgentRegistry {
    storage: RegistryStorage,
    agents: BTreeMap<String, Agent>,
}

impl AgentRegistry {
    /// Load the registry from storage
    pub fn load(storage: RegistryStorage) -> Result<Self, RegistryError> {
        let agents = storage.load()?;
        tracing::info!(
            "Loaded {} agent(s) from {}",
            agents.len(),
            storage.path().display()
        );
        Ok(Self { storage, agents })
    }

    /// Insert or overwrite an agent, then persist
    pub fn add(
        &mut self,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<AddOutcome, RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let agent = Agent {
            name: name.clone(),
            endpoint: endpoint.into(),
            model: model.into(),
            created_at: Utc::now(),
        };

        let previous = self.agents.insert(name.clone(), agent);
        if let Err(e) = self.storage.save(&self.agents) {
            // Memory stays in step with the file
            match previous {
                Some(previous) => self.agents.insert(name, previous),
                None => self.agents.remove(&name),
            };
            return Err(e);
        }

        let outcome = if previous.is_some() {
            AddOutcome::Updated
        } else {
            AddOutcome::Created
        };

        tracing::info!("Agent '{}' {:?}", name, outcome);
        Ok(outcome)
    }

    /// Remove an agent if present, then persist. Absent names are a no-op.
    pub fn delete(&mut self, name: &str) -> Result<Option<Agent>, RegistryError> {
        let Some(removed) = self.agents.remove(name) else {
            return Ok(None);
        };
        if let Err(e) = self.storage.save(&self.agents) {
            self.agents.insert(name.to_string(), removed);
            return Err(e);
        }
        tracing::info!("Agent '{}' deleted", name);
        Ok(Some(removed))
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    /// Like `get`, but absence is an error
    pub fn require(&self, name: &str) -> Result<&Agent, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Iterate agents in name order
    pub fn list(&self) -> impl Iterator<Item = (&str, &Agent)> {
        self.agents.iter().map(|(name, agent)| (name.as_str(), agent))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn storage(&self) -> &RegistryStorage {
        &self.storage
    }
}
