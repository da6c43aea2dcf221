//! The client facade.
//!
//! # Responsibilities
//! - Build every subsystem from one loaded configuration
//! - Resolve the channel handle, then the identity, then call the subsystem
//! - Keep identity resolution ahead of any transaction id minting
//!
//! # Design Decisions
//! - Subsystems initialize in order, not concurrently
//! - TLS material is read once here; the registry never touches the filesystem
//! - Artifact generation runs before anything else in `create_channel`, so a
//!   generator failure makes no network call

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::chaincode::{ChaincodeLifecycle, ChaincodeSpec};
use crate::channel::{ChannelAdmin, ChannelHandle, ChannelRegistry, ConfigTxGen};
use crate::config::{load_config, ConfigStore, FabricConfig};
use crate::error::FabricResult;
use crate::identity::IdentityContext;
use crate::ledger::types::{Block, BlockchainInfo, ChaincodeInfo, ChannelInfo, Identity, QueryRequest};
use crate::ledger::LedgerSdk;
use crate::net::TlsMaterial;
use crate::protocol::{ChaincodeCall, InvokeOutcome, TransactionEngine};

/// One configured client: identity, channels, and the operations on them.
pub struct FabricClient {
    config: FabricConfig,
    identity: IdentityContext,
    channels: ChannelRegistry,
    engine: TransactionEngine,
    chaincode: ChaincodeLifecycle,
    admin: ChannelAdmin,
    artifacts: ConfigTxGen,
}

impl FabricClient {
    /// Build a client from an already loaded configuration.
    ///
    /// Fails only when TLS is configured and the certificate files cannot be
    /// read.
    pub fn new(config: FabricConfig, sdk: Arc<dyn LedgerSdk>) -> FabricResult<Self> {
        let client = &config.client;
        let settings = &config.settings;

        let tls = if client.secure() {
            let material = TlsMaterial::load(
                &config.base_dir.join(&client.tls_peer_path),
                &config.base_dir.join(&client.tls_orderer_path),
            )?;
            tracing::info!(peer = %client.tls_peer_path, orderer = %client.tls_orderer_path, "TLS material loaded");
            Some(material)
        } else {
            tracing::info!("TLS disabled; using plaintext endpoints");
            None
        };

        let identity = IdentityContext::new(
            Arc::clone(&sdk),
            client.username.clone(),
            settings.msp_id.clone(),
            config.store_path.clone(),
        );
        let channels = ChannelRegistry::new(client, tls.as_ref(), &settings.tls);
        let engine = TransactionEngine::new(
            Arc::clone(&sdk),
            client.peer_event_url.clone(),
            Duration::from_millis(settings.commit_timeout_ms),
        );
        let chaincode = ChaincodeLifecycle::new(Arc::clone(&sdk));
        let admin = ChannelAdmin::new(Arc::clone(&sdk));
        let artifacts = ConfigTxGen::from_config(&settings.configtxgen, &config.base_dir);

        tracing::info!(
            username = %client.username,
            peer = %client.peer_grpc_url,
            orderer = %client.orderer_url,
            "Fabric client initialized"
        );

        Ok(Self {
            config,
            identity,
            channels,
            engine,
            chaincode,
            admin,
            artifacts,
        })
    }

    /// Load the first record from `store` and build a client from it.
    pub fn from_store(store: &dyn ConfigStore, base_dir: &Path, sdk: Arc<dyn LedgerSdk>) -> FabricResult<Self> {
        let config = load_config(store, base_dir)?;
        Self::new(config, sdk)
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Return the handle for `name`, registering it on first use.
    pub fn channel(&self, name: &str) -> Arc<ChannelHandle> {
        self.channels.get_or_create(name)
    }

    fn default_channel(&self) -> Arc<ChannelHandle> {
        self.channel(&self.config.settings.default_channel)
    }

    /// Propose, order and wait for the commit of one chaincode call.
    ///
    /// A commit timeout, an invalid commit or an orderer refusal is returned
    /// in the outcome rather than as an error.
    pub async fn invoke(
        &self,
        channel: &str,
        chaincode_id: &str,
        fcn: &str,
        args: Vec<String>,
    ) -> FabricResult<InvokeOutcome> {
        let channel = self.channel(channel);
        let identity = self.identity.resolve().await?;
        self.engine
            .invoke(&channel, &identity, ChaincodeCall::new(chaincode_id, fcn, args))
            .await
    }

    pub async fn query(&self, channel: &str, chaincode_id: &str, fcn: &str, args: Vec<String>) -> FabricResult<String> {
        let channel = self.channel(channel);
        let identity = self.identity.resolve().await?;
        let request = QueryRequest {
            chaincode_id: chaincode_id.to_string(),
            fcn: fcn.to_string(),
            args,
        };
        self.engine.query(&channel, &identity, request).await
    }

    /// Install chaincode from `path` on the configured peer.
    pub async fn install(&self, path: &str, name: &str, version: &str) -> FabricResult<()> {
        let channel = self.default_channel();
        self.identity.resolve().await?;
        self.chaincode
            .install(channel.peer(), &ChaincodeSpec::new(name, version, path))
            .await
    }

    pub async fn instantiate(&self, channel: &str, name: &str, version: &str, args: Vec<String>) -> FabricResult<()> {
        let channel = self.channel(channel);
        let identity = self.identity.resolve().await?;
        self.chaincode
            .instantiate(&channel, &identity, &ChaincodeSpec::new(name, version, ""), args)
            .await
    }

    pub async fn query_installed_chaincodes(&self) -> FabricResult<Vec<ChaincodeInfo>> {
        let channel = self.default_channel();
        self.identity.resolve().await?;
        self.chaincode.query_installed_chaincodes(channel.peer()).await
    }

    pub async fn query_instantiated_chaincodes(&self, channel: &str) -> FabricResult<Vec<ChaincodeInfo>> {
        let channel = self.channel(channel);
        self.identity.resolve().await?;
        self.chaincode.query_instantiated_chaincodes(&channel).await
    }

    /// Channels the configured peer has joined.
    pub async fn query_channels(&self) -> FabricResult<Vec<ChannelInfo>> {
        let channel = self.default_channel();
        self.identity.resolve().await?;
        self.chaincode.query_channels(channel.peer()).await
    }

    pub async fn query_block(&self, channel: &str, number: u64) -> FabricResult<Block> {
        let channel = self.channel(channel);
        self.identity.resolve().await?;
        self.chaincode.query_block(&channel, number).await
    }

    pub async fn query_info(&self, channel: &str) -> FabricResult<BlockchainInfo> {
        let channel = self.channel(channel);
        self.identity.resolve().await?;
        self.chaincode.query_info(&channel).await
    }

    /// Register the configured user from a private key and signed certificate.
    pub async fn import_identity(&self, private_key_path: &Path, signed_cert_path: &Path) -> FabricResult<Identity> {
        self.default_channel();
        self.identity.import(private_key_path, signed_cert_path).await
    }

    /// Run the channel configuration generator for `name`.
    pub async fn create_channel_artifact(&self, name: &str) -> FabricResult<PathBuf> {
        self.artifacts.generate(name).await
    }

    /// Generate the channel artifact and submit the channel creation.
    pub async fn create_channel(&self, name: &str) -> FabricResult<()> {
        let artifact = self.create_channel_artifact(name).await?;
        let channel = self.channel(name);
        let identity = self.identity.resolve().await?;
        self.admin.create_channel(&channel, &identity, &artifact).await
    }

    /// Join the configured peer to `name`.
    pub async fn join_channel(&self, name: &str) -> FabricResult<()> {
        let channel = self.channel(name);
        let identity = self.identity.resolve().await?;
        self.admin.join_channel(&channel, &identity).await
    }
}

impl std::fmt::Debug for FabricClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FabricClient")
            .field("identity", &self.identity)
            .field("channels", &self.channels)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
