//! Ledger client library boundary.
//!
//! # Data Flow
//! ```text
//! orchestration (protocol, chaincode, channel admin)
//!     → types.rs (typed requests, one per operation)
//!     → sdk.rs (LedgerSdk / EventHub traits)
//!     → concrete library (gRPC, signing, hashing; outside this crate)
//! ```
//!
//! # Security Constraints
//! - Private key material never crosses this boundary; only paths do
//! - Every transaction id is minted locally by txid.rs and used once

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod sdk;
pub mod txid;
pub mod types;

pub use sdk::{EventHub, LedgerSdk, TxEventReceiver};
pub use txid::TransactionId;
pub use types::{Identity, LedgerError, LedgerResult};
