//! Ledger client library capability.
//!
//! Everything that talks gRPC, signs, or hashes envelopes sits behind these
//! traits. The orchestration code only sequences calls and interprets the
//! returned statuses.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::channel::ChannelHandle;
use crate::ledger::types::{
    Block, BlockchainInfo, BroadcastResponse, ChaincodeQueryResponse, ChannelQueryResponse,
    ConfigSignature, CreateChannelRequest, CreateUserRequest, GenesisBlockRequest, Identity,
    InstallRequest, InstantiateRequest, JoinChannelRequest, LedgerResult, Peer, ProposalRequest,
    ProposalResponse, ProposalResult, QueryRequest, QueryResponse, TransactionRequest, TxEvent,
};

/// Delivery slot for a single transaction's commit event.
///
/// Resolves with `Err` when the event stream fails while the listener is
/// registered.
pub type TxEventReceiver = oneshot::Receiver<LedgerResult<TxEvent>>;

/// Operations of the ledger client library used by the orchestrator.
///
/// ## Contract
///
/// - Implementations MUST NOT retry internally.
/// - Implementations MUST NOT panic.
/// - Requests are borrowed and never modified.
#[async_trait]
pub trait LedgerSdk: Send + Sync {
    /// Open the key-value state store at `path` and bind a crypto suite
    /// whose key store uses the same location.
    async fn open_credential_store(&self, path: &Path) -> LedgerResult<()>;

    /// Look up a persisted identity by name.
    async fn user_context(&self, username: &str) -> LedgerResult<Option<Identity>>;

    /// Register an identity from a private key and signed certificate.
    async fn create_user(&self, request: &CreateUserRequest) -> LedgerResult<Identity>;

    async fn send_transaction_proposal(
        &self,
        channel: &ChannelHandle,
        request: &ProposalRequest,
    ) -> LedgerResult<ProposalResult>;

    /// Broadcast an endorsed transaction to the channel's orderer.
    async fn send_transaction(
        &self,
        channel: &ChannelHandle,
        request: &TransactionRequest,
    ) -> LedgerResult<BroadcastResponse>;

    async fn query_by_chaincode(
        &self,
        channel: &ChannelHandle,
        request: &QueryRequest,
    ) -> LedgerResult<Vec<QueryResponse>>;

    /// A disconnected event hub pointed at `peer_event_url`.
    fn new_event_hub(&self, peer_event_url: &str) -> Box<dyn EventHub>;

    async fn install_chaincode(&self, request: &InstallRequest) -> LedgerResult<ProposalResult>;

    async fn send_instantiate_proposal(
        &self,
        channel: &ChannelHandle,
        request: &InstantiateRequest,
    ) -> LedgerResult<ProposalResult>;

    async fn query_installed_chaincodes(
        &self,
        peer: &Peer,
    ) -> LedgerResult<Option<ChaincodeQueryResponse>>;

    async fn query_instantiated_chaincodes(
        &self,
        channel: &ChannelHandle,
    ) -> LedgerResult<Option<ChaincodeQueryResponse>>;

    async fn query_channels(&self, peer: &Peer) -> LedgerResult<Option<ChannelQueryResponse>>;

    async fn query_block(&self, channel: &ChannelHandle, number: u64) -> LedgerResult<Block>;

    async fn query_info(&self, channel: &ChannelHandle) -> LedgerResult<BlockchainInfo>;

    /// Pull the config update out of a channel creation envelope.
    fn extract_channel_config(&self, envelope: &[u8]) -> LedgerResult<Vec<u8>>;

    fn sign_channel_config(&self, identity: &Identity, config: &[u8]) -> LedgerResult<ConfigSignature>;

    async fn create_channel(&self, request: &CreateChannelRequest) -> LedgerResult<BroadcastResponse>;

    async fn get_genesis_block(
        &self,
        channel: &ChannelHandle,
        request: &GenesisBlockRequest,
    ) -> LedgerResult<Block>;

    async fn join_channel(
        &self,
        channel: &ChannelHandle,
        request: &JoinChannelRequest,
    ) -> LedgerResult<Vec<ProposalResponse>>;
}

/// A peer event stream subscription.
#[async_trait]
pub trait EventHub: Send {
    async fn connect(&mut self) -> LedgerResult<()>;

    /// Register interest in one transaction id.
    fn register_tx_event(&mut self, tx_id: &str) -> LedgerResult<TxEventReceiver>;

    fn unregister_tx_event(&mut self, tx_id: &str);

    fn disconnect(&mut self);

    /// Address of the peer event endpoint, for logging.
    fn peer_addr(&self) -> &str;
}
