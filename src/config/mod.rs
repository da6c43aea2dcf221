//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config store (TOML file, JSON-lines document file, or memory)
//!     → loader.rs (find_all, take first record)
//!     → validation.rs (semantic checks)
//!     → FabricConfig (validated, immutable)
//!     → owned by the client facade for its whole lifetime
//! ```
//!
//! # Design Decisions
//! - Config is loaded once; a new config means a new client
//! - All settings have defaults so a bare client record is enough
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigStore, FileConfigStore, MemoryConfigStore};
pub use schema::{ClientConfig, FabricConfig, Settings};
