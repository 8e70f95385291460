//! Main application entry point (CLI binary).
//!
//! A thin demo on top of the `questdb_repository` library:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - Create table, write sample readings, read them back
//!
//! All protocol handling is implemented in the library crate.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{debug, info};
use std::process;

use questdb_repository::initialization::init_logger_with;
use questdb_repository::{Config, Protocol, Record, Repository};

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    match run_demo(&config).await {
        Ok(rows) => {
            println!(
                "Read back {} row{} from {}",
                rows,
                if rows == 1 { "" } else { "s" },
                config.table
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("questdb_repository error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run_demo(config: &Config) -> Result<usize> {
    let repo = config
        .build_repository()
        .context("Failed to build repository backend")?;
    // DDL and verification reads go over PostgreSQL wire when the selected
    // protocol cannot read.
    let sql_repo = config
        .build_backend(Protocol::PostgresWire)
        .context("Failed to build PostgreSQL wire backend")?;
    let reader: &dyn Repository = if repo.protocol().supports_read() {
        repo.as_ref()
    } else {
        sql_repo.as_ref()
    };

    info!("Creating table {} if it does not exist", config.table);
    match sql_repo.read(&create_table_sql(&config.table)).await {
        Ok(_) => {}
        Err(e) if e.is_no_result_set() => debug!("Table DDL executed ({e})"),
        Err(e) => return Err(e).context("Failed to create table"),
    }

    let readings = sample_readings();
    repo.write(&readings, &config.table)
        .await
        .context("Failed to write records")?;
    info!("Wrote {} records via {}", readings.len(), repo.protocol());

    let query = format!(
        "SELECT * FROM {} ORDER BY timestamp DESC LIMIT 10;",
        config.table
    );
    let rows = reader
        .read(&query)
        .await
        .with_context(|| format!("Failed to read records via {}", reader.protocol()))?;
    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(rows.len())
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            timestamp TIMESTAMP,
            device_id STRING,
            temperature DOUBLE,
            humidity DOUBLE
        ) timestamp(timestamp) PARTITION BY DAY;"
    )
}

fn sample_readings() -> Vec<Record> {
    vec![
        Record::new()
            .with("timestamp", Utc::now())
            .with("device_id", "device_A")
            .with("temperature", 25.5)
            .with("humidity", 60.1),
        Record::new()
            .with("timestamp", Utc::now())
            .with("device_id", "device_B")
            .with("temperature", 26.1)
            .with("humidity", 58.8),
    ]
}
