//! Channel creation artifacts produced by `configtxgen`.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::config::schema::ConfigTxGenConfig;
use crate::error::{FabricError, FabricResult};

/// Runs the channel configuration transaction generator.
#[derive(Debug, Clone)]
pub struct ConfigTxGen {
    binary: PathBuf,
    working_dir: PathBuf,
    profile: String,
}

impl ConfigTxGen {
    pub fn new(binary: impl Into<PathBuf>, working_dir: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
            profile: profile.into(),
        }
    }

    /// Build from settings. `working_dir` is resolved against `base_dir`,
    /// a relative `binary` against the working directory.
    pub fn from_config(config: &ConfigTxGenConfig, base_dir: &Path) -> Self {
        let working_dir = base_dir.join(&config.working_dir);
        let binary = working_dir.join(&config.binary);
        Self::new(binary, working_dir, &config.profile)
    }

    /// Path of the artifact for `channel`.
    pub fn artifact_path(&self, channel: &str) -> PathBuf {
        self.working_dir.join(format!("{}.tx", channel))
    }

    /// Generate `<channel>.tx` in the working directory.
    ///
    /// A spawn failure or a non-zero exit fails with
    /// [`FabricError::ExternalProcess`].
    pub async fn generate(&self, channel: &str) -> FabricResult<PathBuf> {
        let artifact = format!("{}.tx", channel);
        tracing::info!(
            channel = %channel,
            profile = %self.profile,
            working_dir = %self.working_dir.display(),
            "Generating channel creation transaction"
        );

        let output = Command::new(&self.binary)
            .current_dir(&self.working_dir)
            .arg("-profile")
            .arg(&self.profile)
            .arg("-outputCreateChannelTx")
            .arg(&artifact)
            .arg("-channelID")
            .arg(channel)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(binary = %self.binary.display(), error = %e, "Failed to run configtxgen");
                FabricError::ExternalProcess(format!("Failed to run {}: {}", self.binary.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(stdout = %stdout.trim(), stderr = %stderr.trim(), "configtxgen finished");

        if !output.status.success() {
            tracing::error!(channel = %channel, status = %output.status, "configtxgen failed");
            return Err(FabricError::ExternalProcess(format!(
                "configtxgen exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(self.artifact_path(channel))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("configtxgen");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_generate_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        // $4 is the output file, $6 the channel id
        let binary = script(dir.path(), r#"[ "$2" = "OneOrgChannel" ] || exit 3; echo "$6" > "$4""#);

        let generator = ConfigTxGen::new(&binary, dir.path(), "OneOrgChannel");
        let path = generator.generate("mychannel").await.unwrap();

        assert_eq!(path, dir.path().join("mychannel.tx"));
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "mychannel");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let binary = script(dir.path(), "echo 'profile not found' >&2; exit 1");

        let generator = ConfigTxGen::new(&binary, dir.path(), "OneOrgChannel");
        let err = generator.generate("mychannel").await.unwrap_err();

        assert!(matches!(err, FabricError::ExternalProcess(_)));
        assert!(err.to_string().contains("profile not found"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ConfigTxGen::new(dir.path().join("absent"), dir.path(), "OneOrgChannel");
        let err = generator.generate("mychannel").await.unwrap_err();
        assert!(matches!(err, FabricError::ExternalProcess(_)));
    }
}
