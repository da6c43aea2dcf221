//! Value types exchanged with the ledger client library.
//!
//! Each request is its own type so the fields an operation needs are
//! enforced by the compiler rather than by convention.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::txid::TransactionId;

/// Status code of a successful endorsement or install response.
pub const STATUS_SUCCESS: i32 = 200;

/// Status string of a successful orderer broadcast.
pub const BROADCAST_SUCCESS: &str = "SUCCESS";

/// Validation code delivered by a commit event for a valid transaction.
pub const TX_VALID: &str = "VALID";

/// Errors raised by the ledger client library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Peer, orderer or event stream unreachable, or the call failed in flight.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credential or state store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Signing, hashing or envelope decoding failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The library rejected the request before sending it.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for ledger library calls.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A user identity held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub msp_id: String,
    /// PEM-encoded signing certificate.
    pub certificate: Vec<u8>,
    pub enrolled: bool,
}

impl Identity {
    pub fn is_enrolled(&self) -> bool {
        self.enrolled
    }
}

/// Request to register an identity from existing key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub username: String,
    pub msp_id: String,
    pub private_key_path: PathBuf,
    pub signed_cert_path: PathBuf,
}

/// Connection options for a peer or orderer endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointOptions {
    Plaintext,
    Tls {
        pem: String,
        server_name_override: String,
    },
}

impl EndpointOptions {
    pub fn is_tls(&self) -> bool {
        matches!(self, EndpointOptions::Tls { .. })
    }
}

/// An endorsing peer endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub url: String,
    pub options: EndpointOptions,
}

/// An ordering service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orderer {
    pub url: String,
    pub options: EndpointOptions,
}

/// Chaincode invocation sent to the endorsing peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRequest {
    pub chaincode_id: String,
    pub fcn: String,
    pub args: Vec<String>,
    pub channel_id: String,
    pub tx_id: TransactionId,
}

/// Read-only chaincode query; never ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub chaincode_id: String,
    pub fcn: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub targets: Vec<Peer>,
    pub chaincode_path: String,
    pub chaincode_id: String,
    pub chaincode_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateRequest {
    pub targets: Vec<Peer>,
    pub chaincode_id: String,
    pub chaincode_version: String,
    pub args: Vec<String>,
    pub tx_id: TransactionId,
}

/// Endorsed proposal submitted to the orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub proposal_responses: Vec<ProposalResponse>,
    pub proposal: Proposal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChannelRequest {
    pub name: String,
    pub config: Vec<u8>,
    pub signatures: Vec<ConfigSignature>,
    pub orderer: Orderer,
    pub tx_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisBlockRequest {
    pub tx_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinChannelRequest {
    pub targets: Vec<Peer>,
    pub block: Block,
    pub tx_id: TransactionId,
}

/// A single peer's answer to a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalResponse {
    pub endorser: String,
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl ProposalResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// The signed proposal as built by the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub tx_id: String,
    pub bytes: Vec<u8>,
}

/// Endorsement responses paired with the proposal they answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalResult {
    pub responses: Vec<ProposalResponse>,
    pub proposal: Proposal,
}

impl ProposalResult {
    /// Non-empty and every endorsement carries the success status.
    pub fn is_endorsed(&self) -> bool {
        !self.responses.is_empty() && self.responses.iter().all(ProposalResponse::is_success)
    }

    /// The first response that is not a success, if any.
    pub fn first_failure(&self) -> Option<&ProposalResponse> {
        self.responses.iter().find(|r| !r.is_success())
    }
}

/// One entry of a query response list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    Payload(Vec<u8>),
    Error(String),
}

/// Orderer acknowledgement for a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub status: String,
    pub info: String,
}

impl BroadcastResponse {
    pub fn is_success(&self) -> bool {
        self.status == BROADCAST_SUCCESS
    }
}

/// Commit notification for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEvent {
    pub tx_id: String,
    /// Validation code, `VALID` or the rejection reason.
    pub code: String,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeInfo {
    pub name: String,
    pub version: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChaincodeQueryResponse {
    pub chaincodes: Vec<ChaincodeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelQueryResponse {
    pub channels: Vec<ChannelInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub number: u64,
    pub previous_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
    pub data: Vec<Vec<u8>>,
}

/// Chain height and tip hashes of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockchainInfo {
    pub height: u64,
    pub current_block_hash: Vec<u8>,
    pub previous_block_hash: Vec<u8>,
}

/// Signature over a channel configuration update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSignature {
    pub signature_header: Vec<u8>,
    pub signature: Vec<u8>,
}
