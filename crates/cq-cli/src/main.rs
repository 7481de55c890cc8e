use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cq_advisory::{AdvisoryConfig, OpenAiAdvisor};
use cq_core::{QueryPipeline, QueryRecord};
use cq_storage::{AuditLog, RecordStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod scanner;

use scanner::StdinScanner;

#[derive(Parser)]
#[command(name = "cq")]
#[command(about = "Chemical product safety queries with an audit trail", long_about = None)]
struct Cli {
    /// SQLite database holding the query history
    #[arg(long, default_value = "consultas.db")]
    db: PathBuf,
    /// Append-only CSV audit file
    #[arg(long, default_value = "registro_consultas.csv")]
    audit_log: PathBuf,
    /// Model identifier sent to the advisory service
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,
    /// Override the advisory service endpoint
    #[arg(long)]
    base_url: Option<String>,
    /// Per-request timeout for advisory calls, in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a barcode or QR code and query the scanned product
    Scan,
    /// Query a product by name
    Ask { product: String },
    /// Show recent recorded queries
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store = RecordStore::new(&cli.db);
    let audit = AuditLog::new(&cli.audit_log);

    // History review needs no advisory credentials.
    if let Some(Commands::Recent { limit }) = &cli.command {
        return show_recent(&store, *limit);
    }

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let mut config = AdvisoryConfig::new(api_key)
        .with_model(&cli.model)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    let advisor = OpenAiAdvisor::new(config).context("failed to build advisory client")?;
    let pipeline = QueryPipeline::new(&advisor, &store, &audit);

    match cli.command {
        Some(Commands::Scan) => run_scan(&pipeline),
        Some(Commands::Ask { product }) => run_query(&pipeline, &product),
        Some(Commands::Recent { .. }) => Ok(()),
        None => run_menu(&pipeline),
    }
}

fn run_menu(pipeline: &QueryPipeline) -> Result<()> {
    println!("1) Scan a code");
    println!("2) Enter a product name");
    print!("Choice: ");
    io::stdout().flush()?;

    let mut choice = String::new();
    io::stdin().lock().read_line(&mut choice)?;
    match choice.trim() {
        "1" => run_scan(pipeline),
        "2" => {
            print!("Chemical product name: ");
            io::stdout().flush()?;
            let mut name = String::new();
            io::stdin().lock().read_line(&mut name)?;
            // Only the line ending comes off; the name itself is passed
            // through verbatim.
            run_query(pipeline, name.trim_end_matches(['\r', '\n']))
        }
        _ => {
            println!("Invalid choice.");
            Ok(())
        }
    }
}

fn run_scan(pipeline: &QueryPipeline) -> Result<()> {
    println!("Scan a QR or barcode (blank line to abort):");
    let mut scanner = StdinScanner::new();
    match pipeline.run_scan(&mut scanner) {
        Some(record) => print_outcome(&record),
        None => println!("No code detected."),
    }
    Ok(())
}

fn run_query(pipeline: &QueryPipeline, product: &str) -> Result<()> {
    let record = pipeline.run_manual(product);
    print_outcome(&record);
    Ok(())
}

fn print_outcome(record: &QueryRecord) {
    println!("Result for {}: {}", record.product, record.result);
}

fn show_recent(store: &RecordStore, limit: usize) -> Result<()> {
    let records = store.recent(limit).context("failed to read query history")?;
    if records.is_empty() {
        println!("No recorded queries.");
        return Ok(());
    }
    for record in records {
        println!(
            "[{}] {}: {}",
            record.queried_at.to_rfc3339(),
            record.product,
            record.result
        );
    }
    Ok(())
}
