//! Network endpoint material.
//!
//! # Data Flow
//! ```text
//! ClientConfig TLS paths
//!     → tls.rs (read PEM files once, check they hold certificates)
//!     → TlsMaterial (owned by the channel registry)
//!     → EndpointOptions::Tls for every peer/orderer endpoint
//! ```

pub mod tls;

pub use tls::{TlsError, TlsMaterial};
