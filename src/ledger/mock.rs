//! Scripted in-memory ledger library.
//!
//! Every call is recorded in order so tests can assert on sequencing
//! (e.g. listener registered before the orderer broadcast). Responses come
//! from a [`MockScript`] that can be changed between calls.
//!
//! ## Thread Safety
//!
//! Uses `std::sync::Mutex`; poisoned locks are recovered rather than
//! propagated, so the mock never panics on its own.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::channel::ChannelHandle;
use crate::ledger::sdk::{EventHub, LedgerSdk, TxEventReceiver};
use crate::ledger::types::{
    Block, BlockchainInfo, BroadcastResponse, ChaincodeInfo, ChaincodeQueryResponse, ChannelInfo,
    ChannelQueryResponse, ConfigSignature, CreateChannelRequest, CreateUserRequest, GenesisBlockRequest,
    Identity, InstallRequest, InstantiateRequest, JoinChannelRequest, LedgerError, LedgerResult, Peer,
    Proposal, ProposalRequest, ProposalResponse, ProposalResult, QueryRequest, QueryResponse,
    TransactionRequest, TxEvent, BROADCAST_SUCCESS, STATUS_SUCCESS, TX_VALID,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How the event hub behaves once a listener is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScript {
    /// Deliver `code` after `after`.
    Deliver { code: String, after: Duration },
    /// Never deliver anything.
    Silent,
    /// Fail the listener with a stream error right after registration.
    StreamError(String),
    /// Refuse the registration itself.
    RegisterFails(String),
    /// Refuse to connect.
    ConnectFails(String),
}

impl EventScript {
    pub fn valid_after(after: Duration) -> Self {
        EventScript::Deliver {
            code: TX_VALID.to_string(),
            after,
        }
    }
}

/// Canned responses for every library call.
#[derive(Debug, Clone)]
pub struct MockScript {
    pub identity: Option<Identity>,
    pub store_error: Option<String>,
    /// One endorsement per entry.
    pub proposal_statuses: Vec<i32>,
    pub proposal_error: Option<String>,
    pub order_status: String,
    pub order_error: Option<String>,
    pub event: EventScript,
    pub query_responses: Vec<QueryResponse>,
    pub query_error: Option<String>,
    pub install_statuses: Vec<i32>,
    pub install_error: Option<String>,
    pub installed: Option<ChaincodeQueryResponse>,
    pub instantiated: Option<ChaincodeQueryResponse>,
    pub channels: Option<ChannelQueryResponse>,
    pub block: Block,
    pub info: BlockchainInfo,
    pub create_status: String,
    pub create_error: Option<String>,
    pub genesis_error: Option<String>,
    pub join_statuses: Vec<i32>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            identity: Some(Identity {
                username: "user1".to_string(),
                msp_id: "Org1MSP".to_string(),
                certificate: b"-----BEGIN CERTIFICATE-----\nuser1\n-----END CERTIFICATE-----\n".to_vec(),
                enrolled: true,
            }),
            store_error: None,
            proposal_statuses: vec![STATUS_SUCCESS],
            proposal_error: None,
            order_status: BROADCAST_SUCCESS.to_string(),
            order_error: None,
            event: EventScript::valid_after(Duration::from_millis(10)),
            query_responses: vec![QueryResponse::Payload(b"100".to_vec())],
            query_error: None,
            install_statuses: vec![STATUS_SUCCESS],
            install_error: None,
            installed: Some(ChaincodeQueryResponse {
                chaincodes: vec![ChaincodeInfo {
                    name: "fabcar".to_string(),
                    version: "1.0".to_string(),
                    path: "github.com/fabcar".to_string(),
                }],
            }),
            instantiated: Some(ChaincodeQueryResponse {
                chaincodes: vec![ChaincodeInfo {
                    name: "fabcar".to_string(),
                    version: "1.0".to_string(),
                    path: "github.com/fabcar".to_string(),
                }],
            }),
            channels: Some(ChannelQueryResponse {
                channels: vec![ChannelInfo {
                    channel_id: "mychannel".to_string(),
                }],
            }),
            block: Block {
                number: 0,
                previous_hash: Vec::new(),
                data_hash: vec![0xAB; 32],
                data: vec![b"genesis".to_vec()],
            },
            info: BlockchainInfo {
                height: 5,
                current_block_hash: vec![0x05; 32],
                previous_block_hash: vec![0x04; 32],
            },
            create_status: BROADCAST_SUCCESS.to_string(),
            create_error: None,
            genesis_error: None,
            join_statuses: vec![STATUS_SUCCESS],
        }
    }
}

/// Requests the mock has received, by operation.
#[derive(Debug, Clone, Default)]
pub struct RecordedRequests {
    pub users: Vec<CreateUserRequest>,
    pub proposals: Vec<ProposalRequest>,
    pub transactions: Vec<TransactionRequest>,
    pub queries: Vec<QueryRequest>,
    pub installs: Vec<InstallRequest>,
    pub instantiates: Vec<InstantiateRequest>,
    pub creates: Vec<CreateChannelRequest>,
    pub genesis: Vec<GenesisBlockRequest>,
    pub joins: Vec<JoinChannelRequest>,
}

impl RecordedRequests {
    /// Every transaction id seen, in the order the requests arrived.
    pub fn tx_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        ids.extend(self.proposals.iter().map(|r| r.tx_id.to_string()));
        ids.extend(self.instantiates.iter().map(|r| r.tx_id.to_string()));
        ids.extend(self.creates.iter().map(|r| r.tx_id.to_string()));
        ids.extend(self.genesis.iter().map(|r| r.tx_id.to_string()));
        ids.extend(self.joins.iter().map(|r| r.tx_id.to_string()));
        ids
    }
}

/// Counters shared by every event hub the mock hands out.
#[derive(Debug, Default)]
pub struct HubStats {
    pub connects: AtomicUsize,
    pub registers: AtomicUsize,
    pub unregisters: AtomicUsize,
    pub disconnects: AtomicUsize,
    /// Events that fired after their listener was already gone.
    pub late_deliveries: AtomicUsize,
}

impl HubStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory [`LedgerSdk`].
pub struct MockLedger {
    script: Mutex<MockScript>,
    calls: Arc<Mutex<Vec<String>>>,
    requests: Mutex<RecordedRequests>,
    hub_stats: Arc<HubStats>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::with_script(MockScript::default())
    }

    pub fn with_script(script: MockScript) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
            requests: Mutex::new(RecordedRequests::default()),
            hub_stats: Arc::new(HubStats::default()),
        }
    }

    /// Change the script for subsequent calls.
    pub fn update(&self, f: impl FnOnce(&mut MockScript)) {
        f(&mut lock(&self.script));
    }

    /// Names of every call, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.as_str() == call).count()
    }

    pub fn recorded(&self) -> RecordedRequests {
        lock(&self.requests).clone()
    }

    pub fn hub_stats(&self) -> &HubStats {
        &self.hub_stats
    }

    fn record(&self, call: &str) -> MockScript {
        lock(&self.calls).push(call.to_string());
        lock(&self.script).clone()
    }

    fn fail_with(error: &Option<String>) -> LedgerResult<()> {
        match error {
            Some(message) => Err(LedgerError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn responses(statuses: &[i32]) -> Vec<ProposalResponse> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| ProposalResponse {
                endorser: format!("peer{}", i),
                status: *status,
                message: if *status == STATUS_SUCCESS { "OK".to_string() } else { "simulation failed".to_string() },
                payload: Vec::new(),
            })
            .collect()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerSdk for MockLedger {
    async fn open_credential_store(&self, _path: &Path) -> LedgerResult<()> {
        let script = self.record("open_credential_store");
        match script.store_error {
            Some(message) => Err(LedgerError::Store(message)),
            None => Ok(()),
        }
    }

    async fn user_context(&self, _username: &str) -> LedgerResult<Option<Identity>> {
        Ok(self.record("user_context").identity)
    }

    async fn create_user(&self, request: &CreateUserRequest) -> LedgerResult<Identity> {
        self.record("create_user");
        lock(&self.requests).users.push(request.clone());
        let identity = Identity {
            username: request.username.clone(),
            msp_id: request.msp_id.clone(),
            certificate: request.signed_cert_path.display().to_string().into_bytes(),
            enrolled: true,
        };
        self.update(|script| script.identity = Some(identity.clone()));
        Ok(identity)
    }

    async fn send_transaction_proposal(
        &self,
        _channel: &ChannelHandle,
        request: &ProposalRequest,
    ) -> LedgerResult<ProposalResult> {
        let script = self.record("send_transaction_proposal");
        lock(&self.requests).proposals.push(request.clone());
        Self::fail_with(&script.proposal_error)?;
        Ok(ProposalResult {
            responses: Self::responses(&script.proposal_statuses),
            proposal: Proposal {
                tx_id: request.tx_id.to_string(),
                bytes: request.fcn.clone().into_bytes(),
            },
        })
    }

    async fn send_transaction(
        &self,
        _channel: &ChannelHandle,
        request: &TransactionRequest,
    ) -> LedgerResult<BroadcastResponse> {
        let script = self.record("send_transaction");
        lock(&self.requests).transactions.push(request.clone());
        Self::fail_with(&script.order_error)?;
        Ok(BroadcastResponse {
            status: script.order_status,
            info: String::new(),
        })
    }

    async fn query_by_chaincode(
        &self,
        _channel: &ChannelHandle,
        request: &QueryRequest,
    ) -> LedgerResult<Vec<QueryResponse>> {
        let script = self.record("query_by_chaincode");
        lock(&self.requests).queries.push(request.clone());
        Self::fail_with(&script.query_error)?;
        Ok(script.query_responses)
    }

    fn new_event_hub(&self, peer_event_url: &str) -> Box<dyn EventHub> {
        let script = self.record("new_event_hub");
        Box::new(MockEventHub {
            addr: peer_event_url.to_string(),
            script: script.event,
            calls: Arc::clone(&self.calls),
            stats: Arc::clone(&self.hub_stats),
            pending: HashMap::new(),
        })
    }

    async fn install_chaincode(&self, request: &InstallRequest) -> LedgerResult<ProposalResult> {
        let script = self.record("install_chaincode");
        lock(&self.requests).installs.push(request.clone());
        Self::fail_with(&script.install_error)?;
        Ok(ProposalResult {
            responses: Self::responses(&script.install_statuses),
            proposal: Proposal {
                tx_id: String::new(),
                bytes: Vec::new(),
            },
        })
    }

    async fn send_instantiate_proposal(
        &self,
        _channel: &ChannelHandle,
        request: &InstantiateRequest,
    ) -> LedgerResult<ProposalResult> {
        let script = self.record("send_instantiate_proposal");
        lock(&self.requests).instantiates.push(request.clone());
        Self::fail_with(&script.proposal_error)?;
        Ok(ProposalResult {
            responses: Self::responses(&script.proposal_statuses),
            proposal: Proposal {
                tx_id: request.tx_id.to_string(),
                bytes: request.chaincode_id.clone().into_bytes(),
            },
        })
    }

    async fn query_installed_chaincodes(&self, _peer: &Peer) -> LedgerResult<Option<ChaincodeQueryResponse>> {
        Ok(self.record("query_installed_chaincodes").installed)
    }

    async fn query_instantiated_chaincodes(
        &self,
        _channel: &ChannelHandle,
    ) -> LedgerResult<Option<ChaincodeQueryResponse>> {
        Ok(self.record("query_instantiated_chaincodes").instantiated)
    }

    async fn query_channels(&self, _peer: &Peer) -> LedgerResult<Option<ChannelQueryResponse>> {
        Ok(self.record("query_channels").channels)
    }

    async fn query_block(&self, _channel: &ChannelHandle, number: u64) -> LedgerResult<Block> {
        let script = self.record("query_block");
        Ok(Block { number, ..script.block })
    }

    async fn query_info(&self, _channel: &ChannelHandle) -> LedgerResult<BlockchainInfo> {
        Ok(self.record("query_info").info)
    }

    fn extract_channel_config(&self, envelope: &[u8]) -> LedgerResult<Vec<u8>> {
        self.record("extract_channel_config");
        if envelope.is_empty() {
            return Err(LedgerError::Crypto("empty envelope".to_string()));
        }
        Ok(envelope.to_vec())
    }

    fn sign_channel_config(&self, identity: &Identity, config: &[u8]) -> LedgerResult<ConfigSignature> {
        self.record("sign_channel_config");
        Ok(ConfigSignature {
            signature_header: identity.username.clone().into_bytes(),
            signature: config.iter().rev().copied().collect(),
        })
    }

    async fn create_channel(&self, request: &CreateChannelRequest) -> LedgerResult<BroadcastResponse> {
        let script = self.record("create_channel");
        lock(&self.requests).creates.push(request.clone());
        Self::fail_with(&script.create_error)?;
        Ok(BroadcastResponse {
            status: script.create_status,
            info: String::new(),
        })
    }

    async fn get_genesis_block(
        &self,
        _channel: &ChannelHandle,
        request: &GenesisBlockRequest,
    ) -> LedgerResult<Block> {
        let script = self.record("get_genesis_block");
        lock(&self.requests).genesis.push(request.clone());
        Self::fail_with(&script.genesis_error)?;
        Ok(script.block)
    }

    async fn join_channel(
        &self,
        _channel: &ChannelHandle,
        request: &JoinChannelRequest,
    ) -> LedgerResult<Vec<ProposalResponse>> {
        let script = self.record("join_channel");
        lock(&self.requests).joins.push(request.clone());
        Ok(Self::responses(&script.join_statuses))
    }
}

/// Event hub handed out by [`MockLedger`].
pub struct MockEventHub {
    addr: String,
    script: EventScript,
    calls: Arc<Mutex<Vec<String>>>,
    stats: Arc<HubStats>,
    /// Senders held open for `Silent` listeners.
    pending: HashMap<String, oneshot::Sender<LedgerResult<TxEvent>>>,
}

impl MockEventHub {
    fn record(&self, call: &str) {
        lock(&self.calls).push(call.to_string());
    }
}

#[async_trait]
impl EventHub for MockEventHub {
    async fn connect(&mut self) -> LedgerResult<()> {
        self.record("hub.connect");
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            EventScript::ConnectFails(message) => Err(LedgerError::Transport(message.clone())),
            _ => Ok(()),
        }
    }

    fn register_tx_event(&mut self, tx_id: &str) -> LedgerResult<TxEventReceiver> {
        self.record("hub.register_tx_event");
        self.stats.registers.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        match &self.script {
            EventScript::Deliver { code, after } => {
                let event = TxEvent {
                    tx_id: tx_id.to_string(),
                    code: code.clone(),
                    block_number: Some(1),
                };
                let after = *after;
                let stats = Arc::clone(&self.stats);
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if tx.send(Ok(event)).is_err() {
                        stats.late_deliveries.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
            EventScript::Silent => {
                self.pending.insert(tx_id.to_string(), tx);
            }
            EventScript::StreamError(message) => {
                let _ = tx.send(Err(LedgerError::Transport(message.clone())));
            }
            EventScript::RegisterFails(message) => return Err(LedgerError::Transport(message.clone())),
            EventScript::ConnectFails(message) => return Err(LedgerError::Transport(message.clone())),
        }
        Ok(rx)
    }

    fn unregister_tx_event(&mut self, tx_id: &str) {
        self.record("hub.unregister_tx_event");
        self.stats.unregisters.fetch_add(1, Ordering::SeqCst);
        self.pending.remove(tx_id);
    }

    fn disconnect(&mut self) {
        self.record("hub.disconnect");
        self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
        self.pending.clear();
    }

    fn peer_addr(&self) -> &str {
        &self.addr
    }
}

