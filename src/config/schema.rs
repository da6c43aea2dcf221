//! Configuration schema definitions.
//!
//! The client record mirrors the document kept by the desktop front end
//! (camelCase keys). Everything else lives in [`Settings`], which has a
//! default for every field so a bare client record is a complete config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection record for a single enrolled user.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Name of the enrolled user in the credential store.
    pub username: String,

    /// Peer gRPC endpoint (e.g., "grpc://localhost:7051").
    pub peer_grpc_url: String,

    /// Peer event stream endpoint (e.g., "grpc://localhost:7053").
    pub peer_event_url: String,

    /// Orderer endpoint (e.g., "grpc://localhost:7050").
    pub orderer_url: String,

    /// PEM file for the peer's TLS CA. Empty selects plaintext.
    pub tls_peer_path: String,

    /// PEM file for the orderer's TLS CA. Empty selects plaintext.
    pub tls_orderer_path: String,

    /// Credential store root, relative to the client's base directory.
    pub path: String,
}

impl ClientConfig {
    /// True when both TLS certificate paths are configured.
    pub fn secure(&self) -> bool {
        !self.tls_peer_path.is_empty() && !self.tls_orderer_path.is_empty()
    }

    /// Resolve the credential store root against `base_dir`.
    pub fn store_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.path)
    }
}

/// Ambient client settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Membership service provider id used when importing identities.
    pub msp_id: String,

    /// Channel registered for peer-scoped operations (install, queries).
    pub default_channel: String,

    /// How long an invoke waits for the commit event, in milliseconds.
    pub commit_timeout_ms: u64,

    /// TLS server-name overrides.
    pub tls: TlsOverrideConfig,

    /// Channel artifact generator.
    pub configtxgen: ConfigTxGenConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            msp_id: "Org1MSP".to_string(),
            default_channel: "mychannel".to_string(),
            commit_timeout_ms: 3000,
            tls: TlsOverrideConfig::default(),
            configtxgen: ConfigTxGenConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Server names presented during the TLS handshake.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TlsOverrideConfig {
    pub peer_server_name: String,
    pub orderer_server_name: String,
}

impl Default for TlsOverrideConfig {
    fn default() -> Self {
        Self {
            peer_server_name: "peer0.org1.example.com".to_string(),
            orderer_server_name: "orderer.example.com".to_string(),
        }
    }
}

/// Settings for the channel configuration transaction generator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigTxGenConfig {
    /// Executable, resolved against `working_dir` when relative.
    pub binary: String,

    /// Directory the generator runs in; artifacts are written here.
    pub working_dir: String,

    /// Profile passed to `-profile`.
    pub profile: String,
}

impl Default for ConfigTxGenConfig {
    fn default() -> Self {
        Self {
            binary: "./configtxgen".to_string(),
            working_dir: "resources/key/tx".to_string(),
            profile: "OneOrgChannel".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A loaded, validated configuration.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    pub client: ClientConfig,
    pub settings: Settings,
    /// Credential store root, already resolved against the base directory.
    pub store_path: PathBuf,
    /// Directory relative paths in `settings.configtxgen` are resolved against.
    pub base_dir: PathBuf,
}

impl FabricConfig {
    pub fn new(client: ClientConfig, settings: Settings, base_dir: &Path) -> Self {
        Self {
            store_path: client.store_path(base_dir),
            base_dir: base_dir.to_path_buf(),
            client,
            settings,
        }
    }
}
