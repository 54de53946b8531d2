//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → ConnectionRouter::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the primary cannot be swapped at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::RouterConfig;
pub use schema::PoolConfig;
pub use schema::ObservabilityConfig;
