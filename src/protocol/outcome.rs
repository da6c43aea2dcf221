//! Invoke outcome types.

use std::fmt;

use crate::ledger::types::{BroadcastResponse, TX_VALID};

/// Orderer acknowledgement of the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Success,
    /// Carries the status the orderer returned.
    Failure(String),
}

impl From<&BroadcastResponse> for OrderStatus {
    fn from(response: &BroadcastResponse) -> Self {
        if response.is_success() {
            OrderStatus::Success
        } else {
            OrderStatus::Failure(response.status.clone())
        }
    }
}

/// What the peer reported about the commit, or that it never reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    Valid,
    /// Carries the validation code.
    Invalid(String),
    Timeout,
}

impl CommitStatus {
    pub fn from_code(code: &str) -> Self {
        if code == TX_VALID {
            CommitStatus::Valid
        } else {
            CommitStatus::Invalid(code.to_string())
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommitStatus::Valid => "valid",
            CommitStatus::Invalid(_) => "invalid",
            CommitStatus::Timeout => "timeout",
        }
    }
}

/// Single logical result of an invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    Failure(String),
    Timeout,
}

/// Protocol states of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Built,
    Proposed,
    Endorsed,
    Rejected,
    Ordered,
    CommitConfirmed,
    CommitTimeout,
    CommitInvalid,
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxPhase::Built => "BUILT",
            TxPhase::Proposed => "PROPOSED",
            TxPhase::Endorsed => "ENDORSED",
            TxPhase::Rejected => "REJECTED",
            TxPhase::Ordered => "ORDERED",
            TxPhase::CommitConfirmed => "COMMIT_CONFIRMED",
            TxPhase::CommitTimeout => "COMMIT_TIMEOUT",
            TxPhase::CommitInvalid => "COMMIT_INVALID",
        };
        f.write_str(name)
    }
}

/// The joined order acknowledgement and commit status of an invoke.
///
/// Ordering failures, commit timeouts and invalid commits are reported here
/// rather than as errors; callers needing strict semantics check
/// [`InvokeOutcome::is_committed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOutcome {
    pub tx_id: String,
    pub order: OrderStatus,
    pub commit: CommitStatus,
}

impl InvokeOutcome {
    /// An ordering failure takes precedence over the commit status.
    pub fn outcome(&self) -> TransactionOutcome {
        match (&self.order, &self.commit) {
            (OrderStatus::Failure(status), _) => TransactionOutcome::Failure(status.clone()),
            (OrderStatus::Success, CommitStatus::Valid) => TransactionOutcome::Success,
            (OrderStatus::Success, CommitStatus::Invalid(code)) => TransactionOutcome::Failure(code.clone()),
            (OrderStatus::Success, CommitStatus::Timeout) => TransactionOutcome::Timeout,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.outcome() == TransactionOutcome::Success
    }

    /// Terminal protocol state reached by the commit wait.
    pub fn phase(&self) -> TxPhase {
        match self.commit {
            CommitStatus::Valid => TxPhase::CommitConfirmed,
            CommitStatus::Invalid(_) => TxPhase::CommitInvalid,
            CommitStatus::Timeout => TxPhase::CommitTimeout,
        }
    }
}
