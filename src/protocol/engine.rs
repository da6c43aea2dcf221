//! Propose, order and confirm a single chaincode invocation.
//!
//! # Responsibilities
//! - Mint a fresh transaction id per invocation
//! - Collect and check endorsements
//! - Register the commit listener, then order and wait concurrently;
//!   the first hard failure of either settles the call
//! - Join order acknowledgement and commit status into one outcome
//!
//! # Design Decisions
//! - Hard failure only on enrollment, rejected proposals, transport errors
//!   and event stream failures
//! - Ordering and commit mismatches are returned as data
//! - No retries; callers re-invoke

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::channel::ChannelHandle;
use crate::error::{FabricError, FabricResult};
use crate::identity::EnrolledIdentity;
use crate::ledger::types::{ProposalRequest, ProposalResult, QueryRequest, QueryResponse, TransactionRequest};
use crate::ledger::{LedgerSdk, TransactionId};
use crate::observability::metrics;
use crate::protocol::commit::CommitWatch;
use crate::protocol::outcome::{CommitStatus, InvokeOutcome, OrderStatus, TxPhase};

/// A chaincode function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeCall {
    pub chaincode_id: String,
    pub fcn: String,
    pub args: Vec<String>,
}

impl ChaincodeCall {
    pub fn new(chaincode_id: impl Into<String>, fcn: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            chaincode_id: chaincode_id.into(),
            fcn: fcn.into(),
            args,
        }
    }
}

/// Check a proposal result, turning a bad endorsement into
/// [`FabricError::ProposalRejected`].
pub fn require_endorsement(result: ProposalResult) -> FabricResult<ProposalResult> {
    if result.is_endorsed() {
        metrics::record_proposal(true);
        return Ok(result);
    }

    metrics::record_proposal(false);
    let err = match result.first_failure() {
        Some(failed) => FabricError::ProposalRejected {
            status: Some(failed.status),
            message: format!(
                "endorsement from {} returned status {}: {}",
                failed.endorser, failed.status, failed.message
            ),
        },
        None => FabricError::ProposalRejected {
            status: None,
            message: "no endorsement responses received".to_string(),
        },
    };
    Err(err)
}

/// Drives the transaction protocol against one peer event endpoint.
pub struct TransactionEngine {
    sdk: Arc<dyn LedgerSdk>,
    peer_event_url: String,
    commit_timeout: Duration,
}

impl TransactionEngine {
    pub fn new(sdk: Arc<dyn LedgerSdk>, peer_event_url: impl Into<String>, commit_timeout: Duration) -> Self {
        Self {
            sdk,
            peer_event_url: peer_event_url.into(),
            commit_timeout,
        }
    }

    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }

    /// Invoke `call` on `channel` and wait for it to be ordered and committed.
    pub async fn invoke(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        call: ChaincodeCall,
    ) -> FabricResult<InvokeOutcome> {
        let started = Instant::now();
        let tx_id = TransactionId::mint(identity);
        tracing::info!(
            channel = %channel.name(),
            chaincode = %call.chaincode_id,
            fcn = %call.fcn,
            tx_id = %tx_id,
            phase = %TxPhase::Built,
            "Sending transaction proposal"
        );

        let request = ProposalRequest {
            chaincode_id: call.chaincode_id,
            fcn: call.fcn,
            args: call.args,
            channel_id: channel.name().to_string(),
            tx_id,
        };
        let proposal = self.sdk.send_transaction_proposal(channel, &request).await?;
        tracing::debug!(tx_id = %request.tx_id, phase = %TxPhase::Proposed, responses = proposal.responses.len(), "Proposal responses received");

        let endorsed = require_endorsement(proposal).map_err(|e| {
            tracing::error!(tx_id = %request.tx_id, phase = %TxPhase::Rejected, error = %e, "Transaction proposal was bad");
            e
        })?;
        if let Some(first) = endorsed.responses.first() {
            tracing::info!(
                tx_id = %request.tx_id,
                phase = %TxPhase::Endorsed,
                status = first.status,
                message = %first.message,
                "Transaction proposal was good"
            );
        }

        let watch = CommitWatch::listen(self.sdk.new_event_hub(&self.peer_event_url), request.tx_id.as_str()).await?;
        let order_request = TransactionRequest {
            proposal_responses: endorsed.responses,
            proposal: endorsed.proposal,
        };

        // Either hard failure settles the call at once; dropping the watch
        // releases the listener.
        let (ack, commit) = tokio::try_join!(
            async {
                self.sdk
                    .send_transaction(channel, &order_request)
                    .await
                    .map_err(FabricError::from)
            },
            watch.wait(self.commit_timeout),
        )?;

        let outcome = InvokeOutcome {
            tx_id: request.tx_id.to_string(),
            order: OrderStatus::from(&ack),
            commit,
        };
        self.report(channel, &outcome, started);
        Ok(outcome)
    }

    fn report(&self, channel: &ChannelHandle, outcome: &InvokeOutcome, started: Instant) {
        match &outcome.order {
            OrderStatus::Success => {
                tracing::info!(tx_id = %outcome.tx_id, phase = %TxPhase::Ordered, "Successfully sent transaction to the orderer");
            }
            OrderStatus::Failure(status) => {
                tracing::error!(tx_id = %outcome.tx_id, status = %status, "Failed to order the transaction");
            }
        }
        metrics::record_order_status(outcome.order == OrderStatus::Success);
        metrics::record_commit_status(outcome.commit.label());
        metrics::record_invoke_duration(channel.name(), started);

        if outcome.is_committed() {
            tracing::info!(tx_id = %outcome.tx_id, phase = %outcome.phase(), "Successfully committed the change to the ledger");
        } else {
            let reason = match &outcome.commit {
                CommitStatus::Valid => "VALID",
                CommitStatus::Invalid(code) => code.as_str(),
                CommitStatus::Timeout => "TIMEOUT",
            };
            tracing::warn!(
                tx_id = %outcome.tx_id,
                phase = %outcome.phase(),
                commit = %reason,
                outcome = ?outcome.outcome(),
                "Transaction was not confirmed on the ledger"
            );
        }
    }

    /// Evaluate `request` on the channel's peer without ordering it.
    ///
    /// Exactly one response is required; it is returned as a string.
    pub async fn query(
        &self,
        channel: &ChannelHandle,
        identity: &EnrolledIdentity,
        request: QueryRequest,
    ) -> FabricResult<String> {
        tracing::info!(
            channel = %channel.name(),
            chaincode = %request.chaincode_id,
            fcn = %request.fcn,
            user = %identity.username(),
            "Sending query"
        );

        let result = self.run_query(channel, &request).await;
        metrics::record_operation("query", result.is_ok());
        if let Err(e) = &result {
            tracing::error!(channel = %channel.name(), kind = e.kind(), error = %e, "Failed to query successfully");
        }
        result
    }

    async fn run_query(&self, channel: &ChannelHandle, request: &QueryRequest) -> FabricResult<String> {
        let mut responses = self
            .sdk
            .query_by_chaincode(channel, request)
            .await
            .map_err(|e| FabricError::Query(format!("Query request failed: {}", e)))?;

        if responses.len() != 1 {
            return Err(FabricError::Query(format!(
                "Expected exactly one query response, got {}",
                responses.len()
            )));
        }

        match responses.remove(0) {
            QueryResponse::Payload(payload) => {
                let result = String::from_utf8_lossy(&payload).into_owned();
                tracing::debug!(response = %result, "Query has completed");
                Ok(result)
            }
            QueryResponse::Error(message) => Err(FabricError::Query(format!("Error from query: {}", message))),
        }
    }
}

impl std::fmt::Debug for TransactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionEngine")
            .field("peer_event_url", &self.peer_event_url)
            .field("commit_timeout", &self.commit_timeout)
            .finish()
    }
}
