//! Read/write splitting connection router.
//!
//! Presents a primary database and its read replicas as one handle: writes
//! and transactions go to the primary, reads rotate over the replicas.

pub mod config;
pub mod observability;
pub mod router;

pub use config::schema::RouterConfig;
pub use router::{ConnectionRouter, FatalWriteError, RouterError, SqlValue};
