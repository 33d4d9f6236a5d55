use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use zip_referral::config::{init_tracing, DEFAULT_DB_PATH};
use zip_referral::db::SurrealStore;
use zip_referral::resolver::ZipIndex;
use zip_referral::store::LocationStore;
use zip_referral::ZipAssignmentProposal;

#[derive(Parser, Debug)]
#[command(name = "zip_referral")]
#[command(about = "Look up ZIP referrals against the location store")]
struct Cli {
    /// Database path
    #[arg(long, env = "ZIP_REFERRAL_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a 5-digit ZIP to its location
    Lookup { zip: String },
    /// List locations with their referring ZIPs
    Locations,
    /// Apply a ZIP assignment proposal (JSON) to the store
    Apply {
        /// File holding `{"assignments": {"<zip>": "<location name>", ...}}`
        proposal: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("warn");

    let store = SurrealStore::open(&cli.db_path).await?;
    info!("Connected to SurrealDB");

    match cli.command {
        Command::Lookup { zip } => {
            let index = ZipIndex::build(store.list_all().await?);
            match index.resolve(&zip)? {
                Some(found) => {
                    println!("Match ({}): {}", found.match_type, found.location);
                    if let Some(address) = &found.address {
                        println!("  Address:  {}", address);
                    }
                    if let Some(calendar) = &found.calendar_url {
                        println!("  Calendar: {}", calendar);
                    }
                    if let Some(phone) = &found.phone {
                        println!("  Phone:    {}", phone);
                    }
                    if let Some(pref) = &found.contact_pref {
                        println!("  Contact:  {}", pref);
                    }
                }
                None => println!("No matching location found."),
            }
        }
        Command::Locations => {
            let records = store.list_all().await?;
            println!("{:<40} {:>6}  ZIPs", "Location", "Count");
            for record in &records {
                println!(
                    "{:<40} {:>6}  {}",
                    record.name,
                    record.referring_zips.len(),
                    record.referring_zips.join(", ")
                );
            }
            println!("{} locations", records.len());
        }
        Command::Apply { proposal } => {
            info!("Reading proposal from {}", proposal.display());
            let raw = std::fs::read_to_string(&proposal)?;
            let proposal: ZipAssignmentProposal = serde_json::from_str(&raw)?;

            let report = zip_referral::reconcile(&store, proposal).await?;
            for applied in &report.applied {
                println!(
                    "Updated {}: [{}] -> [{}]",
                    applied.name,
                    applied.previous.join(", "),
                    applied.zips.join(", ")
                );
            }
            for failed in &report.failed {
                println!("Failed  {}: {}", failed.name, failed.error);
            }
            println!(
                "{} updated, {} unchanged, {} skipped",
                report.applied.len(),
                report.unchanged,
                report.skipped
            );
            report.into_result()?;
        }
    }

    Ok(())
}
