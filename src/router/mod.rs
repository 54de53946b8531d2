//! Read/write connection routing.
//!
//! # Data Flow
//! ```text
//! "db0;db1;db2" + driver
//!     → sources.rs (split, resolve driver, build URLs)
//!     → backend.rs (one client pool per target, index 0 = primary)
//!     → pool.rs (ConnectionRouter)
//!
//! Read (select / get / query_rows / query_row):
//!     → selector.rs (atomic round-robin over 1..N)
//!     → secondary backend
//!
//! Write (execute_or_panic / named_execute / begin_transaction):
//!     → primary backend (never round-robin)
//!     → failure on execute/begin raises FatalWriteError
//! ```
//!
//! # Design Decisions
//! - The selection counter is the only mutable routing state
//! - No locks are held across database I/O
//! - No failover: a secondary that is down keeps being selected
//! - Ping is fail-fast; health_report checks every backend

pub mod backend;
pub mod error;
pub mod named;
pub mod pool;
pub mod selector;
pub mod sources;
pub mod value;

pub use backend::{Backend, Role, RouterTransaction, RowStream};
pub use error::{FatalWriteError, RouterError, RouterResult};
pub use pool::{ConnectionRouter, HealthReport, Topology};
pub use value::SqlValue;
