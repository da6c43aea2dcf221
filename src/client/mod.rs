//! Client facade.
//!
//! # Data Flow
//! ```text
//! ConfigStore → load_config → FabricClient::new
//!     → IdentityContext, ChannelRegistry (TLS decided here)
//!     → TransactionEngine, ChaincodeLifecycle, ChannelAdmin, ConfigTxGen
//! ```
//!
//! A client is usually built once per process and shared through
//! [`global()`]; tests build their own and call [`GlobalClient::reset`].

pub mod facade;
pub mod global;

pub use facade::FabricClient;
pub use global::{global, GlobalClient};
