//! Channel handle cache.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::schema::{ClientConfig, TlsOverrideConfig};
use crate::ledger::types::{EndpointOptions, Orderer, Peer};
use crate::net::tls::TlsMaterial;

/// One ledger channel wired to the configured peer and orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    name: String,
    peer: Peer,
    orderer: Orderer,
}

impl ChannelHandle {
    pub fn new(name: impl Into<String>, peer: Peer, orderer: Orderer) -> Self {
        Self {
            name: name.into(),
            peer,
            orderer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    pub fn orderer(&self) -> &Orderer {
        &self.orderer
    }
}

/// Lazily built, never evicted map of channel name to handle.
///
/// Registration never touches the network. Whether endpoints use TLS is
/// fixed when the registry is built.
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<ChannelHandle>>,
    peer: Peer,
    orderer: Orderer,
}

impl ChannelRegistry {
    /// Build the registry's endpoint templates from the client record.
    ///
    /// `tls` is `Some` exactly when the record configured certificate paths.
    pub fn new(config: &ClientConfig, tls: Option<&TlsMaterial>, overrides: &TlsOverrideConfig) -> Self {
        let (peer_options, orderer_options) = match tls {
            Some(material) => (
                EndpointOptions::Tls {
                    pem: material.peer_pem.clone(),
                    server_name_override: overrides.peer_server_name.clone(),
                },
                EndpointOptions::Tls {
                    pem: material.orderer_pem.clone(),
                    server_name_override: overrides.orderer_server_name.clone(),
                },
            ),
            None => (EndpointOptions::Plaintext, EndpointOptions::Plaintext),
        };

        Self {
            channels: DashMap::new(),
            peer: Peer {
                url: config.peer_grpc_url.clone(),
                options: peer_options,
            },
            orderer: Orderer {
                url: config.orderer_url.clone(),
                options: orderer_options,
            },
        }
    }

    /// Return the handle for `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<ChannelHandle> {
        if let Some(existing) = self.channels.get(name) {
            return Arc::clone(existing.value());
        }

        let entry = self.channels.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(
                channel = %name,
                peer = %self.peer.url,
                orderer = %self.orderer.url,
                tls = self.peer.options.is_tls(),
                "Channel registered"
            );
            Arc::new(ChannelHandle::new(name, self.peer.clone(), self.orderer.clone()))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ChannelHandle>> {
        self.channels.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// The configured peer, shared by every channel.
    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    pub fn orderer(&self) -> &Orderer {
        &self.orderer
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels.len())
            .field("peer", &self.peer.url)
            .field("orderer", &self.orderer.url)
            .field("tls", &self.peer.options.is_tls())
            .finish()
    }
}
