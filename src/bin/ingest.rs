//! Load location records from a CSV export into SurrealDB
//!
//! Rows whose name already exists in the store are skipped; names are the
//! join key for map edits and must stay unique.

use anyhow::Result;
use clap::Parser;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use zip_referral::config::{init_tracing, DEFAULT_DB_PATH};
use zip_referral::db::{self, SurrealStore};
use zip_referral::models::CsvRecord;
use zip_referral::store::LocationStore;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Import location records from CSV")]
struct Args {
    /// CSV file with one location per row
    #[arg(long, default_value = "raw-data/locations.csv")]
    csv: PathBuf,

    /// Database path
    #[arg(long, env = "ZIP_REFERRAL_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("info");

    info!("Connecting to SurrealDB at {}", args.db_path);
    let conn = db::connect(&args.db_path).await?;

    info!("Initializing schema...");
    db::init_schema(&conn).await?;

    let store = SurrealStore::new(conn);
    let mut names: HashSet<String> = store
        .list_all()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    info!("Store already holds {} locations", names.len());

    info!("Reading CSV from {:?}", args.csv);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(&args.csv)?;

    let mut created = 0;
    let mut skipped = 0;
    let mut error_count = 0;

    for (i, row) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = match row {
            Ok(record) => record,
            Err(e) => {
                warn!("Row {}: {}", i + 1, e);
                error_count += 1;
                continue;
            }
        };

        let location = record.to_location();
        if location.name.is_empty() {
            warn!("Row {}: missing name", i + 1);
            error_count += 1;
            continue;
        }
        if !names.insert(location.name.clone()) {
            skipped += 1;
            continue;
        }

        let name = location.name.clone();
        match db::create_location(store.conn(), location).await {
            Ok(id) => {
                info!("Created {} as {}", name, id);
                created += 1;
            }
            Err(e) => {
                warn!("Failed to create {}: {}", name, e);
                error_count += 1;
            }
        }
    }

    info!(
        "Ingestion complete: {} created, {} already present, {} errors",
        created, skipped, error_count
    );

    Ok(())
}
