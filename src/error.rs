//! Error taxonomy shared by every client operation.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::ledger::types::LedgerError;
use crate::net::tls::TlsError;

/// Errors surfaced to callers of the client.
///
/// Soft outcomes of an invoke (ordering failure, commit timeout, invalid
/// commit code) are not errors; they are returned as data in
/// [`InvokeOutcome`](crate::protocol::InvokeOutcome).
#[derive(Debug, Error)]
pub enum FabricError {
    /// No identity in the credential store, or it is not enrolled.
    #[error("Enrollment error: {0}")]
    Enrollment(String),

    /// Endorsement missing or carrying a non-success status.
    #[error("Proposal rejected: {message}")]
    ProposalRejected {
        /// Status of the first failing endorsement, if any response came back.
        status: Option<i32>,
        message: String,
    },

    /// Zero, multiple, or erroring query responses.
    #[error("Query error: {0}")]
    Query(String),

    /// The event stream failed while waiting for a commit.
    #[error("Event hub error: {0}")]
    EventHub(String),

    /// Chaincode install failed.
    #[error("Install error: {0}")]
    Install(String),

    /// Instantiate, channel create or channel join failed.
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// The channel artifact generator could not be run or exited non-zero.
    #[error("External process error: {0}")]
    ExternalProcess(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or library failure from the ledger client library.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type for client operations.
pub type FabricResult<T> = Result<T, FabricError>;

impl FabricError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FabricError::Enrollment(_) => "enrollment",
            FabricError::ProposalRejected { .. } => "proposal_rejected",
            FabricError::Query(_) => "query",
            FabricError::EventHub(_) => "event_hub",
            FabricError::Install(_) => "install",
            FabricError::Lifecycle(_) => "lifecycle",
            FabricError::ExternalProcess(_) => "external_process",
            FabricError::Config(_) => "config",
            FabricError::Tls(_) => "tls",
            FabricError::Io(_) => "io",
            FabricError::Ledger(_) => "ledger",
        }
    }
}
