mod config;
mod engine;
mod journal;
mod models;
mod providers;
mod render;
mod session;
mod types;

use std::env;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::config::Config;
use crate::engine::CurrencyConverter;
use crate::journal::{Commit, Journal, JournalError, JournalLocator};
use crate::providers::Hledger;
use crate::render::Renderer;
use crate::session::{confirm, drive, Session, TerminalInput};

const LEDGER_FILE: &str = "LEDGER_FILE";

#[derive(Debug, Parser)]
#[command(author, version, about = "Interactive transaction entry for hledger journals", long_about = None)]
struct Cli {
    /// Available log levels: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file to write to
    #[arg(short = 'f', long, global = true)]
    file: Option<PathBuf>,

    /// Main file used for searches and balances
    #[arg(short = 'm', long = "mainfile", global = true)]
    main_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a new transaction to your ledger
    Add {
        /// Print the transaction without writing it
        #[arg(long)]
        dry_run: bool
    },
    /// Print the location of the config file
    Config
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?
    };
    let config = Config::load_or_init(&config_path)?;

    match cli.command {
        Command::Config => {
            println!("{}", config_path.display());
            Ok(())
        }
        Command::Add { dry_run } => add(&config, cli.file.as_deref(), cli.main_file, dry_run).await
    }
}

async fn add(config: &Config, file: Option<&Path>, main_file: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let locator = journal_locator(file, config)?;
    let main_file = main_file.unwrap_or_else(|| locator.main_file());

    debug!("Using [{}] as main file", main_file.display());

    let converter = CurrencyConverter::new(config.conversion_accounts());
    let hledger = Hledger::new(&config.hledger.binary, Some(main_file), config.hledger_timeout())
        .with_cache_ttl(config.hledger_cache_ttl());

    let session = Session::new(Local::now().date_naive(), &locator, &converter, &hledger);
    let mut input = TerminalInput::stdin();

    let timer = Instant::now();
    let Some(draft) = drive(session, &mut input, &mut std::io::stdout()).await? else {
        return Ok(());
    };
    info!("Transaction composed in: {:?}", timer.elapsed());

    let text = Renderer::new(config.amount_column).render(&draft.transaction);

    let journal = Journal::new(draft.journal);

    println!("\nAdding this following transaction to {}:", journal.path().display());
    println!("{text}");

    if dry_run {
        return Ok(());
    }

    if !confirm(&mut input, "Is this correct")? {
        println!("Transaction discarded.");
        return Ok(());
    }

    println!("Validating transaction...");

    match journal.commit(&text, &hledger).await? {
        Commit::Accepted => println!("Transaction added successfully."),
        Commit::Rejected { receipt, report } => {
            println!("Error validating ledger:");
            println!("{report}");

            if confirm(&mut input, "Do you want to revert the changes?")? {
                journal.revert(receipt)?;
                println!("Changes reverted.");
            } else {
                println!("Changes kept despite validation errors.");
            }
        }
    }

    Ok(())
}

/// `--file` wins, then the sharded layout, then `LEDGER_FILE`.
fn journal_locator(file: Option<&Path>, config: &Config) -> Result<JournalLocator> {
    if let Some(file) = file {
        return Ok(JournalLocator::Fixed(file.to_path_buf()));
    }

    if config.efficient_file_structure.enabled {
        return Ok(JournalLocator::Sharded { root: config.files_root() });
    }

    match env::var_os(LEDGER_FILE) {
        Some(path) if !path.is_empty() => Ok(JournalLocator::Fixed(PathBuf::from(path))),
        _ => Err(JournalError::Unconfigured.into())
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'warn'", level);
            LevelFilter::WARN
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Prompts and the rendered transaction own stdout, logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
