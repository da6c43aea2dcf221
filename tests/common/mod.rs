//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fabric_orchestrator::config::{ClientConfig, FabricConfig, Settings};
use fabric_orchestrator::ledger::mock::MockLedger;
use fabric_orchestrator::FabricClient;

pub const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIQ\n-----END CERTIFICATE-----\n";

/// A plaintext client record pointing at a local network.
pub fn client_config() -> ClientConfig {
    ClientConfig {
        username: "user1".into(),
        peer_grpc_url: "grpc://localhost:7051".into(),
        peer_event_url: "grpc://localhost:7053".into(),
        orderer_url: "grpc://localhost:7050".into(),
        tls_peer_path: String::new(),
        tls_orderer_path: String::new(),
        path: "hfc-key-store".into(),
    }
}

/// Build a client over `mock` rooted at `base_dir`.
pub fn build_client(mock: &Arc<MockLedger>, base_dir: &Path) -> FabricClient {
    build_client_with(mock, client_config(), Settings::default(), base_dir)
}

pub fn build_client_with(
    mock: &Arc<MockLedger>,
    client: ClientConfig,
    settings: Settings,
    base_dir: &Path,
) -> FabricClient {
    let config = FabricConfig::new(client, settings, base_dir);
    FabricClient::new(config, mock.clone()).unwrap()
}

/// Write a PEM certificate file into `dir`.
pub fn write_pem(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, PEM).unwrap();
    path
}

/// Write an executable shell script standing in for `configtxgen`.
///
/// Settings are pointed at it, with `dir` as the working directory.
#[cfg(unix)]
pub fn fake_configtxgen(dir: &Path, body: &str) -> Settings {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("configtxgen");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut settings = Settings::default();
    settings.configtxgen.working_dir = dir.display().to_string();
    settings.configtxgen.binary = "./configtxgen".into();
    settings
}

/// Index of the first call named `name`.
pub fn position(calls: &[String], name: &str) -> Option<usize> {
    calls.iter().position(|c| c == name)
}
