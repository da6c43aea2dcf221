//! Chaincode lifecycle.
//!
//! Install targets the configured peer; instantiate is ordered without
//! waiting for a commit event. Queries return the inner lists of the
//! library responses.

pub mod operations;

pub use operations::{ChaincodeLifecycle, ChaincodeSpec};
