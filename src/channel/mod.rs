//! Channel subsystem.
//!
//! # Data Flow
//! ```text
//! channel name
//!     → registry.rs (one cached handle per name, endpoints fixed at startup)
//!
//! create:
//!     artifact.rs (configtxgen → <name>.tx)
//!     → admin.rs (read, extract, sign, submit to orderer)
//!
//! join:
//!     admin.rs (genesis block from orderer → join request to peer)
//! ```

pub mod admin;
pub mod artifact;
pub mod registry;

pub use admin::ChannelAdmin;
pub use artifact::ConfigTxGen;
pub use registry::{ChannelHandle, ChannelRegistry};
