//! Router error types.

use thiserror::Error;

/// Errors returned by the router.
///
/// Failures coming from the database client are wrapped transparently so
/// their message reaches the caller verbatim.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The source list contained no usable target.
    #[error("no sources")]
    NoSources,

    /// The driver name does not match any installed driver.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// A backing connection failed to open or to answer a ping.
    #[error(transparent)]
    Connection(sqlx::Error),

    /// A forwarded query failed.
    #[error(transparent)]
    Query(#[from] sqlx::Error),

    /// A named placeholder had no matching field in the argument.
    #[error("missing named parameter: {0}")]
    MissingParameter(String),

    /// The named argument did not serialize to a map or struct.
    #[error("invalid named argument: {0}")]
    InvalidNamedArgument(String),
}

impl RouterError {
    /// True for failures caused by bad construction input.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::NoSources | Self::UnsupportedDriver(_))
    }

    /// True for open and liveness failures.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Unrecoverable failure of a write on the primary.
///
/// Never returned as a value: the write path raises it as the panic payload,
/// so a supervisor using `catch_unwind` (or a `JoinError` from a spawned
/// task) can downcast to it.
#[derive(Debug, Error)]
#[error("fatal write error on primary: {0}")]
pub struct FatalWriteError(#[source] pub sqlx::Error);

impl FatalWriteError {
    /// Log the failure and terminate the calling flow.
    #[track_caller]
    pub(crate) fn raise(err: sqlx::Error) -> ! {
        let fatal = Self(err);
        tracing::error!(error = %fatal, "Write on primary failed, aborting caller");
        crate::observability::metrics::record_fatal_write();
        std::panic::panic_any(fatal)
    }
}
