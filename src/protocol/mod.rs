//! Transaction protocol subsystem.
//!
//! # State Transitions
//! ```text
//! BUILT → PROPOSED → ENDORSED → ORDERED → COMMIT_CONFIRMED
//!                  ↘ REJECTED          ↘ COMMIT_TIMEOUT
//!                                      ↘ COMMIT_INVALID
//! ```
//!
//! # Data Flow
//! ```text
//! engine.rs: mint tx id → proposal → endorsement check
//!     → commit.rs: connect hub, register tx listener
//!     → join(orderer broadcast, commit.rs wait{event | timer})
//!     → outcome.rs: InvokeOutcome (order status + commit status)
//! ```

pub mod commit;
pub mod engine;
pub mod outcome;

pub use commit::CommitWatch;
pub use engine::{require_endorsement, ChaincodeCall, TransactionEngine};
pub use outcome::{CommitStatus, InvokeOutcome, OrderStatus, TransactionOutcome, TxPhase};
