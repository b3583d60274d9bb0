//! Whole-document storage for the agent registry

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{Agent, RegistryError};

/// Registry file handler
///
/// Each call opens, reads or writes, and closes the file. Nothing is held open
/// between operations.
#[derive(Debug, Clone)]
pub struct RegistryStorage {
    path: PathBuf,
}

impl RegistryStorage {
    /// Create storage with a custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record. A missing file is an empty registry.
    pub fn load(&self) -> Result<BTreeMap<String, Agent>, RegistryError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut agents: BTreeMap<String, Agent> =
            toml::from_str(&content).map_err(|source| RegistryError::Parse {
                path: self.path.clone(),
                source,
            })?;

        for (name, agent) in agents.iter_mut() {
            agent.name = name.clone();
        }

        Ok(agents)
    }

    /// Rewrite the whole document
    ///
    /// The document goes to a sibling temp file first and is renamed into place.
    pub fn save(&self, agents: &BTreeMap<String, Agent>) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(agents)?;

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, content).map_err(|source| RegistryError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!("Saved {} agent(s) to {}", agents.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "agents.toml".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn agent(name: &str, endpoint: &str, model: &str) -> Agent {
        Agent {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = RegistryStorage::with_path(dir.path().join("agents.toml"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let storage = RegistryStorage::with_path(dir.path().join("agents.toml"));

        let mut agents = BTreeMap::new();
        agents.insert(
            "support bot".to_string(),
            agent("support bot", "https://example.com/serving-endpoints", "t2t-support"),
        );
        agents.insert(
            "local.llama".to_string(),
            agent("local.llama", "http://localhost:11434/v1", "llama3"),
        );

        storage.save(&agents).unwrap();
        assert_eq!(storage.load().unwrap(), agents);
        assert!(!storage.tmp_path().exists());
    }

    #[test]
    fn test_empty_round_trip() {
        let dir = tempdir().unwrap();
        let storage = RegistryStorage::with_path(dir.path().join("agents.toml"));

        storage.save(&BTreeMap::new()).unwrap();
        assert!(storage.path().exists());
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let storage = RegistryStorage::with_path(dir.path().join("nested/deeper/agents.toml"));

        let mut agents = BTreeMap::new();
        agents.insert("a".to_string(), agent("a", "http://a", "m"));
        storage.save(&agents).unwrap();

        assert_eq!(storage.load().unwrap().len(), 1);
    }

    #[test]
    fn test_document_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        let storage = RegistryStorage::with_path(&path);

        let mut agents = BTreeMap::new();
        agents.insert("bot".to_string(), agent("bot", "http://x/v1", "gpt-4o"));
        storage.save(&agents).unwrap();

        let raw: toml::Table = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let bot = raw["bot"].as_table().unwrap();
        assert_eq!(bot["endpoint"].as_str(), Some("http://x/v1"));
        assert_eq!(bot["model"].as_str(), Some("gpt-4o"));
        assert!(bot.contains_key("created_at"));
        assert!(!bot.contains_key("name"));
    }

    #[test]
    fn test_reads_hand_written_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(
            &path,
            r#"
["My Agent"]
endpoint = "https://dbc-12345.cloud.databricks.com/serving-endpoints"
model = "t2t-abc-endpoint"
created_at = "2025-01-02T03:04:05Z"
"#,
        )
        .unwrap();

        let agents = RegistryStorage::with_path(&path).load().unwrap();
        let loaded = &agents["My Agent"];
        assert_eq!(loaded.name, "My Agent");
        assert_eq!(loaded.model, "t2t-abc-endpoint");
        assert_eq!(
            loaded.created_at,
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_reads_native_toml_datetimes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(
            &path,
            r#"
[offset]
endpoint = "http://a/v1"
model = "m"
created_at = 2025-01-02T03:04:05Z

[local]
endpoint = "http://b/v1"
model = "m"
created_at = 2025-01-02T03:04:05.250
"#,
        )
        .unwrap();

        let agents = RegistryStorage::with_path(&path).load().unwrap();
        assert_eq!(
            agents["offset"].created_at,
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
        );
        assert_eq!(
            agents["local"].created_at,
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
                + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_non_datetime_created_at_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(
            &path,
            "[bot]\nendpoint = \"http://x\"\nmodel = \"m\"\ncreated_at = 42\n",
        )
        .unwrap();

        let err = RegistryStorage::with_path(&path).load().unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let err = RegistryStorage::with_path(&path).load().unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
        assert!(err.to_string().contains("agents.toml"));
    }

    #[test]
    fn test_record_missing_fields_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(&path, "[bot]\nendpoint = \"http://x\"\n").unwrap();

        let err = RegistryStorage::with_path(&path).load().unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }
}
