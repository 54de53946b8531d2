//! replica-router CLI.
//!
//! Opens a router from a config file and/or flags and runs one command
//! against it.
//!
//! ```text
//! replica-router --driver postgres --sources "db0/app;db1/app" ping
//! replica-router --config router.toml status
//! replica-router --config router.toml query "SELECT id, name FROM users"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use futures_util::TryStreamExt;
use serde_json::{Map, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

use replica_router::config::loader::load_config;
use replica_router::config::validation::validate_config;
use replica_router::observability::{logging, metrics as router_metrics};
use replica_router::{ConnectionRouter, RouterConfig};

#[derive(Parser)]
#[command(name = "replica-router")]
#[command(about = "Route reads to replicas and writes to the primary", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Driver name, overrides the config file.
    #[arg(short, long)]
    driver: Option<String>,

    /// `;`-delimited sources, overrides the config file.
    #[arg(short, long)]
    sources: Option<String>,

    /// Open-connection limit per backend (0 = unlimited).
    #[arg(long)]
    max_open: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping every backend, stopping at the first failure
    Ping,
    /// Ping every backend and print each result
    Health,
    /// Print the routing table
    Status,
    /// Run a read query on a replica and print the rows
    Query {
        /// SQL text
        sql: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(driver) = cli.driver {
        config.driver = driver;
    }
    if let Some(sources) = cli.sources {
        config.sources = sources;
    }
    if let Some(max_open) = cli.max_open {
        config.pool.max_open_connections = max_open;
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("config error: {}", e);
        }
        return Ok(ExitCode::from(2));
    }

    logging::init(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => router_metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = ConnectionRouter::from_config(&config).await?;

    let outcome = run(&router, cli.command).await;
    router.close().await;
    Ok(if outcome? { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run one command and report whether it succeeded.
///
/// Never exits the process; the caller closes the router afterwards.
async fn run(router: &ConnectionRouter, command: Commands) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Commands::Ping => {
            router.ping().await?;
            println!("ok: {} backend(s) alive", router.len());
        }
        Commands::Health => {
            let report = router.health_report().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(report.all_healthy());
        }
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&router.topology())?);
        }
        Commands::Query { sql } => {
            let rows: Vec<AnyRow> = router.query_rows(&sql, &[]).await?.try_collect().await?;
            let json: Vec<Value> = rows.iter().map(row_to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(true)
}

fn row_to_json(row: &AnyRow) -> Value {
    let mut object = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), cell_to_json(row, i));
    }
    Value::Object(object)
}

fn cell_to_json(row: &AnyRow, i: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map_or(Value::Null, Value::from);
    }
    match row.try_get::<Option<Vec<u8>>, _>(i) {
        Ok(Some(bytes)) => Value::String(format!("<{} bytes>", bytes.len())),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_router::config::PoolConfig;

    #[tokio::test]
    async fn test_unhealthy_report_returns_to_caller() {
        let settings = PoolConfig {
            acquire_timeout_secs: 1,
            ..PoolConfig::default()
        };
        let router = ConnectionRouter::open_with("postgres", "127.0.0.1:1/app", &settings)
            .await
            .unwrap();

        let healthy = run(&router, Commands::Health).await.unwrap();
        assert!(!healthy);

        router.close().await;
        assert!(router.primary().pool().is_closed());
    }

    #[tokio::test]
    async fn test_status_succeeds() {
        let router = ConnectionRouter::open("postgres", "db0/app;db1/app").await.unwrap();
        assert!(run(&router, Commands::Status).await.unwrap());
        router.close().await;
    }
}
