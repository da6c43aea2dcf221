//! Channel creation and join.

use std::path::Path;
use std::sync::Arc;

use crate::channel::registry::ChannelHandle;
use crate::error::{FabricError, FabricResult};
use crate::identity::EnrolledIdentity;
use crate::ledger::types::{CreateChannelRequest, GenesisBlockRequest, JoinChannelRequest};
use crate::ledger::{LedgerSdk, TransactionId};
use crate::observability::metrics;

/// Channel lifecycle operations against the orderer and the configured peer.
pub struct ChannelAdmin {
    sdk: Arc<dyn LedgerSdk>,
}

impl ChannelAdmin {
    pub fn new(sdk: Arc<dyn LedgerSdk>) -> Self {
        Self { sdk }
    }

    /// Submit a channel creation transaction built from `artifact`.
    ///
    /// Succeeds only when the orderer answers `SUCCESS`.
    pub async fn create_channel(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        artifact: &Path,
    ) -> FabricResult<()> {
        let result = self.submit_create(channel, identity, artifact).await;
        metrics::record_operation("create_channel", result.is_ok());
        result
    }

    async fn submit_create(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        artifact: &Path,
    ) -> FabricResult<()> {
        let tx_id = TransactionId::mint(identity);

        let envelope = tokio::fs::read(artifact).await.map_err(|e| {
            FabricError::Lifecycle(format!("Failed to read channel artifact {}: {}", artifact.display(), e))
        })?;
        let config = self
            .sdk
            .extract_channel_config(&envelope)
            .map_err(|e| FabricError::Lifecycle(format!("Failed to extract channel config: {}", e)))?;
        let signature = self
            .sdk
            .sign_channel_config(identity, &config)
            .map_err(|e| FabricError::Lifecycle(format!("Failed to sign channel config: {}", e)))?;

        let request = CreateChannelRequest {
            name: channel.name().to_string(),
            config,
            signatures: vec![signature],
            orderer: channel.orderer().clone(),
            tx_id,
        };

        tracing::info!(channel = %channel.name(), tx_id = %request.tx_id, "Submitting channel creation");
        let response = self
            .sdk
            .create_channel(&request)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to create channel {}: {}", channel.name(), e)))?;

        if !response.is_success() {
            tracing::error!(channel = %channel.name(), status = %response.status, info = %response.info, "Failed to create the channel");
            return Err(FabricError::Lifecycle(format!(
                "Channel {} creation returned status {}: {}",
                channel.name(),
                response.status,
                response.info
            )));
        }

        tracing::info!(channel = %channel.name(), "Channel created");
        Ok(())
    }

    /// Fetch the channel's genesis block and join the configured peer.
    ///
    /// Every join response must carry status 200.
    pub async fn join_channel(&self, channel: &ChannelHandle, identity: &EnrolledIdentity) -> FabricResult<()> {
        let result = self.submit_join(channel, identity).await;
        metrics::record_operation("join_channel", result.is_ok());
        result
    }

    async fn submit_join(&self, channel: &ChannelHandle, identity: &EnrolledIdentity) -> FabricResult<()> {
        let genesis_request = GenesisBlockRequest {
            tx_id: TransactionId::mint(identity),
        };
        let block = self
            .sdk
            .get_genesis_block(channel, &genesis_request)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to fetch genesis block for {}: {}", channel.name(), e)))?;
        tracing::debug!(channel = %channel.name(), block = block.number, "Genesis block received");

        let request = JoinChannelRequest {
            targets: vec![channel.peer().clone()],
            block,
            tx_id: TransactionId::mint(identity),
        };
        let responses = self
            .sdk
            .join_channel(channel, &request)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to join channel {}: {}", channel.name(), e)))?;

        if responses.is_empty() {
            return Err(FabricError::Lifecycle(format!(
                "Join channel {} returned no responses",
                channel.name()
            )));
        }
        if let Some(failed) = responses.iter().find(|r| !r.is_success()) {
            tracing::error!(channel = %channel.name(), endorser = %failed.endorser, status = failed.status, "Peer refused to join");
            return Err(FabricError::Lifecycle(format!(
                "Peer {} failed to join {} (status {}): {}",
                failed.endorser,
                channel.name(),
                failed.status,
                failed.message
            )));
        }

        tracing::info!(channel = %channel.name(), peer = %channel.peer().url, "Peer joined channel");
        Ok(())
    }
}
