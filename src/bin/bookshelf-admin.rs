//! Bookshelf administration tool
//!
//! # Commands
//!
//! - `seed-books` - Upsert books from a JSON array
//! - `seed-reservations` - Create reservations from a JSON array
//! - `seed-users` - Create user accounts from a JSON array
//! - `purge-reservations` - Delete every reservation
//! - `purge-books` - Delete every book (refused while reservations exist)
//! - `purge-all` - Delete reservations then books

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use bookshelf_server::{
    build_repository,
    config::AppConfig,
    init_tracing,
    models::{
        load_report::{BookSeed, LoadReport, ReservationSeed, UserSeed},
        purge::Confirmation,
    },
    services::Services,
};

/// Bookshelf bulk loading and purge tools.
#[derive(Parser)]
#[command(name = "bookshelf-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert books from a JSON file
    SeedBooks {
        /// Path to a JSON array of books
        file: PathBuf,
    },

    /// Create reservations from a JSON file
    SeedReservations {
        /// Path to a JSON array of reservations
        file: PathBuf,
    },

    /// Create user accounts from a JSON file
    SeedUsers {
        /// Path to a JSON array of users
        file: PathBuf,
    },

    /// Delete every reservation and mark all books available
    PurgeReservations {
        /// Skip the interactive confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every book
    PurgeBooks {
        /// Skip the interactive confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every reservation and every book
    PurgeAll {
        /// Skip the interactive confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let repository = build_repository(&config)
        .await
        .context("Failed to open the store")?;
    let services = Services::new(repository, config.auth.clone());

    match cli.command {
        Commands::SeedBooks { file } => {
            let seeds: Vec<BookSeed> = read_seeds(&file)?;
            let report = services.loader.load_books(&seeds).await?;
            print_report("books", &report)
        }
        Commands::SeedReservations { file } => {
            let seeds: Vec<ReservationSeed> = read_seeds(&file)?;
            let report = services.loader.load_reservations(&seeds).await?;
            print_report("reservations", &report)
        }
        Commands::SeedUsers { file } => {
            let seeds: Vec<UserSeed> = read_seeds(&file)?;
            let report = services.auth.seed_users(&seeds).await?;
            print_report("users", &report)
        }
        Commands::PurgeReservations { yes } => {
            let confirmation = confirm(yes, "delete ALL reservations")?;
            let summary = services.purge.purge_reservations(confirmation).await?;
            println!("Deleted {} record(s): {} reservations", summary.total(), summary.reservations);
            Ok(())
        }
        Commands::PurgeBooks { yes } => {
            let confirmation = confirm(yes, "delete ALL books")?;
            let summary = services.purge.purge_books(confirmation).await?;
            println!("Deleted {} record(s): {} books", summary.total(), summary.books);
            Ok(())
        }
        Commands::PurgeAll { yes } => {
            let confirmation = confirm(yes, "delete ALL reservations and books")?;
            let summary = services.purge.purge_all(confirmation).await?;
            println!(
                "Deleted {} record(s): {} reservations and {} books",
                summary.total(),
                summary.reservations,
                summary.books
            );
            Ok(())
        }
    }
}

fn read_seeds<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_report(what: &str, report: &LoadReport) -> anyhow::Result<()> {
    println!("Loaded {} {} record(s): {}", report.processed(), what, report);
    for failure in &report.failures {
        eprintln!(
            "  record #{} ({}): {} - {}",
            failure.index, failure.key, failure.kind, failure.message
        );
    }
    if !report.is_clean() {
        bail!("{} record(s) failed to load", report.failures.len());
    }
    Ok(())
}

/// Ask on the terminal unless `--yes` was given. Anything but `y`/`yes` declines.
fn confirm(yes: bool, action: &str) -> anyhow::Result<Confirmation> {
    if yes {
        return Ok(Confirmation::Confirmed);
    }

    print!("This will {}. This cannot be undone. Continue? [y/N] ", action);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    if !confirmed {
        println!("Aborted.");
    }
    Ok(Confirmation::from(confirmed))
}
