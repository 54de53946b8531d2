//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router operations produce:
//!     → tracing events (backend opened, ping failures, fatal writes)
//!     → metrics.rs (selection counters, ping results, slots in use)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary installs subscriber and exporter
//! - Metric updates are cheap enough for the read path

pub mod logging;
pub mod metrics;
