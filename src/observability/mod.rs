//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (channel, tx_id) on every protocol event
//! - The crate never installs a metrics exporter itself
//! - Logging init is idempotent so tests can call it freely

pub mod logging;
pub mod metrics;
