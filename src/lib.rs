//! Ledger Client Orchestrator
//!
//! Drives identity resolution, channel registration, chaincode invocation
//! (propose, order, confirm commit), chaincode lifecycle and channel
//! lifecycle against a permissioned ledger network through a
//! [`LedgerSdk`](ledger::LedgerSdk) implementation.
//!
//! # Architecture Overview
//!
//! ```text
//!   ConfigStore ──▶ config ──▶ client::FabricClient
//!                                 │
//!        ┌────────────┬───────────┼─────────────┬──────────────┐
//!        ▼            ▼           ▼             ▼              ▼
//!    identity      channel     protocol     chaincode    channel::admin
//!    (resolve)    (registry)  (invoke/query) (lifecycle)  (create/join)
//!        │            │           │             │              │
//!        └────────────┴───────────┴──────┬──────┴──────────────┘
//!                                        ▼
//!                           ledger::LedgerSdk / EventHub
//! ```

pub mod chaincode;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod net;
pub mod observability;
pub mod protocol;

pub use client::{global, FabricClient, GlobalClient};
pub use config::FabricConfig;
pub use error::{FabricError, FabricResult};
pub use protocol::{CommitStatus, InvokeOutcome, OrderStatus, TransactionOutcome};
