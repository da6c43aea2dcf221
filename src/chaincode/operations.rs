//! Chaincode install, instantiate, and peer/channel introspection.

use std::sync::Arc;

use crate::channel::ChannelHandle;
use crate::error::{FabricError, FabricResult};
use crate::identity::EnrolledIdentity;
use crate::ledger::types::{
    Block, BlockchainInfo, ChaincodeInfo, ChannelInfo, InstallRequest, InstantiateRequest, Peer,
    TransactionRequest,
};
use crate::ledger::{LedgerSdk, TransactionId};
use crate::observability::metrics;
use crate::protocol::require_endorsement;

/// A chaincode package to install or instantiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeSpec {
    pub chaincode_id: String,
    pub chaincode_version: String,
    /// Source path, only used by install.
    pub chaincode_path: String,
}

impl ChaincodeSpec {
    pub fn new(
        chaincode_id: impl Into<String>,
        chaincode_version: impl Into<String>,
        chaincode_path: impl Into<String>,
    ) -> Self {
        Self {
            chaincode_id: chaincode_id.into(),
            chaincode_version: chaincode_version.into(),
            chaincode_path: chaincode_path.into(),
        }
    }
}

/// Chaincode lifecycle against the configured peer.
pub struct ChaincodeLifecycle {
    sdk: Arc<dyn LedgerSdk>,
}

impl ChaincodeLifecycle {
    pub fn new(sdk: Arc<dyn LedgerSdk>) -> Self {
        Self { sdk }
    }

    /// Install a chaincode package on `peer`.
    ///
    /// Every response must carry status 200.
    pub async fn install(&self, peer: &Peer, spec: &ChaincodeSpec) -> FabricResult<()> {
        let result = self.run_install(peer, spec).await;
        metrics::record_operation("install", result.is_ok());
        if let Err(e) = &result {
            tracing::error!(chaincode = %spec.chaincode_id, version = %spec.chaincode_version, error = %e, "Failed to install chaincode");
        }
        result
    }

    async fn run_install(&self, peer: &Peer, spec: &ChaincodeSpec) -> FabricResult<()> {
        let request = InstallRequest {
            targets: vec![peer.clone()],
            chaincode_path: spec.chaincode_path.clone(),
            chaincode_id: spec.chaincode_id.clone(),
            chaincode_version: spec.chaincode_version.clone(),
        };

        let result = self
            .sdk
            .install_chaincode(&request)
            .await
            .map_err(|e| FabricError::Install(e.to_string()))?;

        if result.responses.is_empty() {
            return Err(FabricError::Install("no install responses received".to_string()));
        }
        if let Some(failed) = result.first_failure() {
            return Err(FabricError::Install(format!(
                "peer {} returned status {}: {}",
                failed.endorser, failed.status, failed.message
            )));
        }

        tracing::info!(chaincode = %spec.chaincode_id, version = %spec.chaincode_version, peer = %peer.url, "Chaincode installed");
        Ok(())
    }

    /// Instantiate an installed chaincode on `channel`.
    ///
    /// The instantiate transaction is ordered but its commit is not awaited.
    pub async fn instantiate(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        spec: &ChaincodeSpec,
        args: Vec<String>,
    ) -> FabricResult<()> {
        let result = self.run_instantiate(channel, identity, spec, args).await;
        metrics::record_operation("instantiate", result.is_ok());
        if let Err(e) = &result {
            tracing::error!(channel = %channel.name(), chaincode = %spec.chaincode_id, error = %e, "Failed to instantiate chaincode");
        }
        result
    }

    async fn run_instantiate(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        spec: &ChaincodeSpec,
        args: Vec<String>,
    ) -> FabricResult<()> {
        let request = InstantiateRequest {
            targets: vec![channel.peer().clone()],
            chaincode_id: spec.chaincode_id.clone(),
            chaincode_version: spec.chaincode_version.clone(),
            args,
            tx_id: TransactionId::mint(identity),
        };
        tracing::info!(channel = %channel.name(), chaincode = %spec.chaincode_id, tx_id = %request.tx_id, "Sending instantiate proposal");

        let proposal = self
            .sdk
            .send_instantiate_proposal(channel, &request)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Instantiate proposal failed: {}", e)))?;
        let endorsed = require_endorsement(proposal).map_err(|e| FabricError::Lifecycle(e.to_string()))?;

        let ack = self
            .sdk
            .send_transaction(
                channel,
                &TransactionRequest {
                    proposal_responses: endorsed.responses,
                    proposal: endorsed.proposal,
                },
            )
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Instantiate transaction failed: {}", e)))?;

        if !ack.is_success() {
            return Err(FabricError::Lifecycle(format!(
                "orderer returned status {} for instantiate of {}",
                ack.status, spec.chaincode_id
            )));
        }

        tracing::info!(channel = %channel.name(), chaincode = %spec.chaincode_id, version = %spec.chaincode_version, "Chaincode instantiated");
        Ok(())
    }

    pub async fn query_installed_chaincodes(&self, peer: &Peer) -> FabricResult<Vec<ChaincodeInfo>> {
        let response = self
            .sdk
            .query_installed_chaincodes(peer)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to query installed chaincodes: {}", e)))?;
        let chaincodes = response
            .ok_or_else(|| FabricError::Lifecycle("No installed chaincode response".to_string()))?
            .chaincodes;

        tracing::debug!(peer = %peer.url, count = chaincodes.len(), "Installed chaincodes");
        Ok(chaincodes)
    }

    pub async fn query_instantiated_chaincodes(&self, channel: &ChannelHandle) -> FabricResult<Vec<ChaincodeInfo>> {
        let response = self
            .sdk
            .query_instantiated_chaincodes(channel)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to query instantiated chaincodes: {}", e)))?;
        let chaincodes = response
            .ok_or_else(|| {
                FabricError::Lifecycle(format!("No instantiated chaincode response for {}", channel.name()))
            })?
            .chaincodes;

        tracing::debug!(channel = %channel.name(), count = chaincodes.len(), "Instantiated chaincodes");
        Ok(chaincodes)
    }

    /// Channels `peer` has joined.
    pub async fn query_channels(&self, peer: &Peer) -> FabricResult<Vec<ChannelInfo>> {
        let response = self
            .sdk
            .query_channels(peer)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to query channels: {}", e)))?;
        let channels = response
            .ok_or_else(|| FabricError::Lifecycle("No channel query response".to_string()))?
            .channels;

        tracing::debug!(peer = %peer.url, count = channels.len(), "Joined channels");
        Ok(channels)
    }

    pub async fn query_block(&self, channel: &ChannelHandle, number: u64) -> FabricResult<Block> {
        self.sdk
            .query_block(channel, number)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to query block {} on {}: {}", number, channel.name(), e)))
    }

    /// Height and head hashes of the channel's chain.
    pub async fn query_info(&self, channel: &ChannelHandle) -> FabricResult<BlockchainInfo> {
        self.sdk
            .query_info(channel)
            .await
            .map_err(|e| FabricError::Lifecycle(format!("Failed to query chain info for {}: {}", channel.name(), e)))
    }
}

impl std::fmt::Debug for ChaincodeLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaincodeLifecycle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::types::{EndpointOptions, Orderer};

    fn channel() -> ChannelHandle {
        ChannelHandle::new(
            "mychannel",
            Peer {
                url: "grpc://localhost:7051".into(),
                options: EndpointOptions::Plaintext,
            },
            Orderer {
                url: "grpc://localhost:7050".into(),
                options: EndpointOptions::Plaintext,
            },
        )
    }

    fn spec() -> ChaincodeSpec {
        ChaincodeSpec::new("fabcar", "1.0", "github.com/fabcar")
    }

    #[tokio::test]
    async fn test_install_targets_configured_peer() {
        let mock = Arc::new(MockLedger::new());
        let lifecycle = ChaincodeLifecycle::new(mock.clone());
        let ch = channel();

        lifecycle.install(ch.peer(), &spec()).await.unwrap();

        let installs = mock.recorded().installs;
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].targets, vec![ch.peer().clone()]);
        assert_eq!(installs[0].chaincode_version, "1.0");
    }

    #[tokio::test]
    async fn test_install_bad_status_is_install_error() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.install_statuses = vec![200, 500]);
        let lifecycle = ChaincodeLifecycle::new(mock.clone());

        let err = lifecycle.install(channel().peer(), &spec()).await.unwrap_err();
        assert!(matches!(err, FabricError::Install(_)));
    }

    #[tokio::test]
    async fn test_install_library_error_is_install_error() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.install_error = Some("peer unreachable".into()));
        let lifecycle = ChaincodeLifecycle::new(mock.clone());

        let err = lifecycle.install(channel().peer(), &spec()).await.unwrap_err();
        assert!(matches!(err, FabricError::Install(msg) if msg.contains("peer unreachable")));
    }

    #[tokio::test]
    async fn test_query_installed_missing_response_fails() {
        let mock = Arc::new(MockLedger::new());
        mock.update(|s| s.installed = None);
        let lifecycle = ChaincodeLifecycle::new(mock.clone());

        let err = lifecycle.query_installed_chaincodes(channel().peer()).await.unwrap_err();
        assert!(matches!(err, FabricError::Lifecycle(_)));
    }

    #[tokio::test]
    async fn test_query_lists_are_unwrapped() {
        let mock = Arc::new(MockLedger::new());
        let lifecycle = ChaincodeLifecycle::new(mock.clone());
        let ch = channel();

        let installed = lifecycle.query_installed_chaincodes(ch.peer()).await.unwrap();
        assert_eq!(installed[0].name, "fabcar");

        let instantiated = lifecycle.query_instantiated_chaincodes(&ch).await.unwrap();
        assert_eq!(instantiated.len(), 1);

        let channels = lifecycle.query_channels(ch.peer()).await.unwrap();
        assert_eq!(channels[0].channel_id, "mychannel");

        let block = lifecycle.query_block(&ch, 3).await.unwrap();
        assert_eq!(block.number, 3);

        let info = lifecycle.query_info(&ch).await.unwrap();
        assert_eq!(info.height, 5);
    }
}
