//! Process-wide client slot with lazy async initialization.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;

use crate::client::facade::FabricClient;
use crate::error::FabricResult;

/// Holds at most one [`FabricClient`], built on first access.
///
/// Readers never block once the client exists. Initialization is serialized
/// so the configuration is loaded once even under concurrent first access.
pub struct GlobalClient {
    slot: ArcSwapOption<FabricClient>,
    init: Mutex<()>,
}

impl GlobalClient {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            init: Mutex::new(()),
        }
    }

    /// Return the client, running `init` if none exists yet.
    ///
    /// A failed `init` leaves the slot empty; the next call tries again.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> FabricResult<Arc<FabricClient>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FabricResult<FabricClient>>,
    {
        if let Some(client) = self.slot.load_full() {
            return Ok(client);
        }

        let _guard = self.init.lock().await;
        if let Some(client) = self.slot.load_full() {
            return Ok(client);
        }

        let client = Arc::new(init().await?);
        self.slot.store(Some(Arc::clone(&client)));
        tracing::debug!("Global client initialized");
        Ok(client)
    }

    pub fn get(&self) -> Option<Arc<FabricClient>> {
        self.slot.load_full()
    }

    /// Drop the held client. Handles already given out stay valid.
    pub fn reset(&self) {
        if self.slot.swap(None).is_some() {
            tracing::debug!("Global client reset");
        }
    }
}

impl Default for GlobalClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide slot.
pub fn global() -> &'static GlobalClient {
    static GLOBAL: OnceLock<GlobalClient> = OnceLock::new();
    GLOBAL.get_or_init(GlobalClient::new)
}
