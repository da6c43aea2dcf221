//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig (username, credential store path)
//!     → context.rs (open store once, look up user, check enrollment)
//!     → EnrolledIdentity (required by every protocol operation)
//! ```
//!
//! # Security Constraints
//! - Key material is handed to the library by path, never read here
//! - A missing or unenrolled user fails before any proposal is built

pub mod context;

pub use context::{EnrolledIdentity, IdentityContext};
