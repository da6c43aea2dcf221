//! Commit confirmation: the event listener racing the commit timer.

use std::time::Duration;

use tokio::time::sleep;

use crate::error::{FabricError, FabricResult};
use crate::ledger::{EventHub, TxEventReceiver};
use crate::protocol::outcome::CommitStatus;

/// An open event subscription for one transaction id.
///
/// The listener is unregistered and the hub disconnected exactly once,
/// whichever of event or timer wins. Dropping the watch (including when the
/// waiting future is cancelled) performs the same cleanup.
pub struct CommitWatch {
    hub: Box<dyn EventHub>,
    tx_id: String,
    events: Option<TxEventReceiver>,
    connected: bool,
    listening: bool,
}

impl CommitWatch {
    /// Connect `hub` and register interest in `tx_id`.
    ///
    /// Must complete before the transaction is sent to the orderer, or a
    /// fast commit can be missed.
    pub async fn listen(hub: Box<dyn EventHub>, tx_id: &str) -> FabricResult<Self> {
        let mut watch = Self {
            hub,
            tx_id: tx_id.to_string(),
            events: None,
            connected: false,
            listening: false,
        };

        watch.hub.connect().await.map_err(|e| {
            FabricError::EventHub(format!("Failed to connect to {}: {}", watch.hub.peer_addr(), e))
        })?;
        watch.connected = true;

        let events = watch
            .hub
            .register_tx_event(tx_id)
            .map_err(|e| FabricError::EventHub(format!("Failed to register listener for {}: {}", tx_id, e)))?;
        watch.events = Some(events);
        watch.listening = true;

        tracing::debug!(tx_id = %tx_id, peer = %watch.hub.peer_addr(), "Commit listener registered");
        Ok(watch)
    }

    /// Wait for the commit event, giving up after `timeout`.
    ///
    /// A timeout is reported as [`CommitStatus::Timeout`]; only a failure of
    /// the event stream itself is an error.
    pub async fn wait(mut self, timeout: Duration) -> FabricResult<CommitStatus> {
        let Some(events) = self.events.take() else {
            return Err(FabricError::EventHub(format!("No listener registered for {}", self.tx_id)));
        };

        let result = tokio::select! {
            biased;
            delivered = events => match delivered {
                Ok(Ok(event)) => {
                    let status = CommitStatus::from_code(&event.code);
                    match &status {
                        CommitStatus::Valid => tracing::info!(
                            tx_id = %self.tx_id,
                            peer = %self.hub.peer_addr(),
                            block = ?event.block_number,
                            "The transaction has been committed"
                        ),
                        _ => tracing::error!(tx_id = %self.tx_id, code = %event.code, "The transaction was invalid"),
                    }
                    Ok(status)
                }
                Ok(Err(e)) => Err(FabricError::EventHub(format!("There was a problem with the event hub: {}", e))),
                Err(_) => Err(FabricError::EventHub(format!(
                    "Event stream closed before {} was delivered",
                    self.tx_id
                ))),
            },
            _ = sleep(timeout) => {
                tracing::warn!(tx_id = %self.tx_id, timeout_ms = timeout.as_millis() as u64, "Commit event not received in time");
                Ok(CommitStatus::Timeout)
            }
        };

        self.release();
        result
    }

    fn release(&mut self) {
        if self.listening {
            self.hub.unregister_tx_event(&self.tx_id);
            self.listening = false;
        }
        if self.connected {
            self.hub.disconnect();
            self.connected = false;
        }
    }
}

impl Drop for CommitWatch {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::{EventScript, HubStats, MockLedger};
    use crate::ledger::LedgerSdk;

    #[tokio::test]
    async fn test_drop_without_wait_releases_once() {
        let mock = MockLedger::new();
        mock.update(|s| s.event = EventScript::Silent);

        let watch = CommitWatch::listen(mock.new_event_hub("grpc://localhost:7053"), "tx1")
            .await
            .unwrap();
        drop(watch);

        let stats = mock.hub_stats();
        assert_eq!(HubStats::get(&stats.unregisters), 1);
        assert_eq!(HubStats::get(&stats.disconnects), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_needs_no_cleanup() {
        let mock = MockLedger::new();
        mock.update(|s| s.event = EventScript::ConnectFails("refused".into()));

        let err = CommitWatch::listen(mock.new_event_hub("grpc://localhost:7053"), "tx1")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FabricError::EventHub(msg) if msg.contains("localhost:7053")));
        assert_eq!(HubStats::get(&mock.hub_stats().disconnects), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let mock = MockLedger::new();
        mock.update(|s| s.event = EventScript::Silent);

        let watch = CommitWatch::listen(mock.new_event_hub("grpc://localhost:7053"), "tx1")
            .await
            .unwrap();
        let status = watch.wait(Duration::from_millis(3000)).await.unwrap();
        assert_eq!(status, CommitStatus::Timeout);
        assert_eq!(HubStats::get(&mock.hub_stats().unregisters), 1);
    }
}
