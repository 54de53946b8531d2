//! Source list parsing and driver resolution.
//!
//! # Responsibilities
//! - Split a `;`-delimited source list into targets
//! - Map a driver name onto the client's URL scheme
//! - Redact credentials before a target reaches a log line

use url::Url;
use crate::router::error::{RouterError, RouterResult};
use crate::router::named::BindStyle;

/// Delimiter between targets in a source list.
pub const SOURCE_DELIMITER: char = ';';

/// SQL dialects the router can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
}

impl Driver {
    /// Resolve a driver name. Matching is case-insensitive.
    pub fn parse(name: &str) -> RouterResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::MySql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(RouterError::UnsupportedDriver(name.to_string())),
        }
    }

    /// URL scheme understood by the client.
    pub fn scheme(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Positional placeholder style of the dialect.
    pub fn bind_style(&self) -> BindStyle {
        match self {
            Driver::Postgres => BindStyle::Dollar,
            Driver::MySql | Driver::Sqlite => BindStyle::Question,
        }
    }

    /// Build the connection URL for a target.
    ///
    /// Targets that already carry this driver's scheme pass through as-is.
    pub fn url_for(&self, target: &str) -> String {
        let has_scheme = match self {
            Driver::Postgres => target.starts_with("postgres:") || target.starts_with("postgresql:"),
            _ => target.starts_with(&format!("{}:", self.scheme())),
        };
        if has_scheme {
            return target.to_string();
        }
        match self {
            Driver::Sqlite => format!("sqlite:{}", target),
            _ => format!("{}://{}", self.scheme(), target),
        }
    }
}

/// Split a source list into trimmed, non-empty targets.
///
/// An empty or whitespace-only list yields `RouterError::NoSources`.
pub fn split_sources(sources: &str) -> RouterResult<Vec<String>> {
    let targets: Vec<String> = sources
        .split(SOURCE_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if targets.is_empty() {
        return Err(RouterError::NoSources);
    }
    Ok(targets)
}

/// Replace the password of a connection URL.
pub fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
