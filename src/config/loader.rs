//! Configuration loading from a configuration store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::schema::{ClientConfig, FabricConfig, Settings};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Json(serde_json::Error),
    /// The store holds no client record.
    Empty(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Empty(source) => write!(f, "No client record found in {}", source),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Source of client configuration records.
pub trait ConfigStore: Send + Sync {
    /// Every client record in the store, in storage order.
    fn find_all(&self) -> Result<Vec<ClientConfig>, ConfigError>;

    /// Ambient settings; stores without a settings section use defaults.
    fn settings(&self) -> Result<Settings, ConfigError> {
        Ok(Settings::default())
    }

    /// Human-readable name used in errors and logs.
    fn describe(&self) -> String;
}

/// On-disk format of a [`FileConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    /// `[[client]]` tables plus an optional `[settings]` table.
    Toml,
    /// One JSON client record per line.
    JsonLines,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TomlDocument {
    client: Vec<ClientConfig>,
    settings: Settings,
}

/// Configuration store backed by a single file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    format: StoreFormat,
}

impl FileConfigStore {
    /// Open a store, picking the format from the extension (`.toml` is TOML,
    /// anything else is newline-delimited JSON).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => StoreFormat::Toml,
            _ => StoreFormat::JsonLines,
        };
        Self { path, format }
    }

    pub fn with_format(path: impl Into<PathBuf>, format: StoreFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    fn read_toml(&self) -> Result<TomlDocument, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(ConfigError::Io)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }
}

impl ConfigStore for FileConfigStore {
    fn find_all(&self) -> Result<Vec<ClientConfig>, ConfigError> {
        match self.format {
            StoreFormat::Toml => Ok(self.read_toml()?.client),
            StoreFormat::JsonLines => {
                let content = fs::read_to_string(&self.path).map_err(ConfigError::Io)?;
                content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| serde_json::from_str(line).map_err(ConfigError::Json))
                    .collect()
            }
        }
    }

    fn settings(&self) -> Result<Settings, ConfigError> {
        match self.format {
            StoreFormat::Toml => Ok(self.read_toml()?.settings),
            StoreFormat::JsonLines => Ok(Settings::default()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store, for embedding callers that already hold the record.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    records: Vec<ClientConfig>,
    settings: Settings,
}

impl MemoryConfigStore {
    pub fn new(records: Vec<ClientConfig>, settings: Settings) -> Self {
        Self { records, settings }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn find_all(&self) -> Result<Vec<ClientConfig>, ConfigError> {
        Ok(self.records.clone())
    }

    fn settings(&self) -> Result<Settings, ConfigError> {
        Ok(self.settings.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Load and validate the first client record of `store`.
///
/// Relative paths in the record are resolved against `base_dir`.
pub fn load_config(store: &dyn ConfigStore, base_dir: &Path) -> Result<FabricConfig, ConfigError> {
    let records = store.find_all()?;
    tracing::debug!(source = %store.describe(), records = records.len(), "Config records read");

    let client = records
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Empty(store.describe()))?;
    let settings = store.settings()?;

    validate_config(&client, &settings).map_err(ConfigError::Validation)?;

    let config = FabricConfig::new(client, settings, base_dir);
    tracing::info!(
        username = %config.client.username,
        peer = %config.client.peer_grpc_url,
        orderer = %config.client.orderer_url,
        secure = config.client.secure(),
        store_path = %config.store_path.display(),
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML_CONFIG: &str = r#"
[settings]
commit_timeout_ms = 5000
default_channel = "businesschannel"

[[client]]
username = "admin"
peerGrpcUrl = "grpc://localhost:7051"
peerEventUrl = "grpc://localhost:7053"
ordererUrl = "grpc://localhost:7050"
path = "hfc-key-store"
"#;

    #[test]
    fn test_load_toml_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, TOML_CONFIG).unwrap();

        let store = FileConfigStore::open(&path);
        let config = load_config(&store, dir.path()).unwrap();
        assert_eq!(config.client.username, "admin");
        assert_eq!(config.settings.commit_timeout_ms, 5000);
        assert_eq!(config.settings.default_channel, "businesschannel");
        assert_eq!(config.settings.msp_id, "Org1MSP");
        assert_eq!(config.store_path, dir.path().join("hfc-key-store"));
    }

    #[test]
    fn test_load_json_lines_store_uses_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.db");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"username":"user1","peerGrpcUrl":"grpc://localhost:7051","peerEventUrl":"grpc://localhost:7053","ordererUrl":"grpc://localhost:7050","tlsPeerPath":"","tlsOrdererPath":"","path":"store","_id":"a1"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"username":"user2","peerGrpcUrl":"grpc://other:7051","peerEventUrl":"grpc://other:7053","ordererUrl":"grpc://other:7050","path":"store2","_id":"b2"}}"#
        )
        .unwrap();

        let store = FileConfigStore::open(&path);
        assert_eq!(store.find_all().unwrap().len(), 2);

        let config = load_config(&store, dir.path()).unwrap();
        assert_eq!(config.client.username, "user1");
        assert!(!config.client.secure());
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryConfigStore::default();
        let err = load_config(&store, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
        assert_eq!(err.to_string(), "No client record found in memory");
    }

    #[test]
    fn test_invalid_record_rejected() {
        let store = MemoryConfigStore::new(vec![ClientConfig::default()], Settings::default());
        let err = load_config(&store, Path::new(".")).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert!(errors.len() >= 4),
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_single_tls_path_loads_as_plaintext() {
        let record = ClientConfig {
            username: "user1".into(),
            peer_grpc_url: "grpc://localhost:7051".into(),
            peer_event_url: "grpc://localhost:7053".into(),
            orderer_url: "grpc://localhost:7050".into(),
            tls_peer_path: "peer.pem".into(),
            tls_orderer_path: String::new(),
            path: "hfc-key-store".into(),
        };
        let store = MemoryConfigStore::new(vec![record], Settings::default());

        let config = load_config(&store, Path::new(".")).unwrap();
        assert_eq!(config.client.tls_peer_path, "peer.pem");
        assert!(!config.client.secure());
    }

    #[test]
    fn test_missing_file() {
        let store = FileConfigStore::open("/nonexistent/client.toml");
        assert!(matches!(store.find_all(), Err(ConfigError::Io(_))));
    }
}
