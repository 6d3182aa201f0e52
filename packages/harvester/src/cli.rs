//! Command-line interface for the harvester.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    validate_date, Credentials, SessionConfig, DEFAULT_PAGE_SIZE, DEFAULT_STRIDE_DAYS,
};
use crate::error::Result;
use crate::harvest::{harvest, HarvestOptions};
use crate::output::DocumentWriter;
use crate::session::{Session, Throttled};
use crate::sources::{browse_sources, search_sources, SourceListing};
use crate::types::QueryDescriptor;

/// Newswire Harvester - Collect documents from a paginated archive search service.
#[derive(Parser)]
#[command(name = "newswire-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the archive and save matching documents as JSON files.
    Harvest {
        /// Keyword query, e.g. "liberal arts"
        query: String,

        /// Numeric id of the source to search
        #[arg(short, long)]
        source_id: u64,

        /// First day of the date range (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day of the date range (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Also retrieve each document's full text
        #[arg(long)]
        full_text: bool,

        /// Results per page request
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u64,

        /// Initial date window width in days
        #[arg(long, default_value_t = DEFAULT_STRIDE_DAYS)]
        stride_days: i64,

        /// Fixed delay between requests, in milliseconds
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up archive sources available to the account.
    Sources {
        /// Partial source name to search for
        name: Option<String>,

        /// Browse the folder hierarchy instead of searching by name
        #[arg(long)]
        browse: bool,

        /// Folder id to browse into
        #[arg(long, requires = "browse")]
        folder: Option<String>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            query,
            source_id,
            from,
            to,
            full_text,
            page_size,
            stride_days,
            delay_ms,
            output,
        } => harvest_command(
            &query,
            source_id,
            &from,
            &to,
            HarvestOptions {
                page_size,
                stride_days,
                include_full_text: full_text,
            },
            delay_ms,
            output,
        ),
        Commands::Sources {
            name,
            browse,
            folder,
        } => sources_command(name.as_deref(), browse, folder.as_deref()),
    }
}

/// Authenticate a session from environment configuration.
fn connect() -> Result<Session> {
    let config = SessionConfig::from_env()?;
    let credentials = Credentials::from_env()?;
    let mut session = Session::new(config)?;

    let pb = spinner("Authenticating...");
    let outcome = session.authenticate(&credentials.username, &credentials.password);
    pb.finish_and_clear();
    outcome?;

    Ok(session)
}

/// Execute the harvest command.
fn harvest_command(
    query: &str,
    source_id: u64,
    from: &str,
    to: &str,
    options: HarvestOptions,
    delay_ms: u64,
    output: Option<PathBuf>,
) -> Result<()> {
    // Validate inputs before touching the network
    let start_date = validate_date(from)?;
    let end_date = validate_date(to)?;

    let descriptor = QueryDescriptor::new(query, source_id, start_date, end_date);
    let out_dir = output.unwrap_or_else(|| PathBuf::from("."));
    let mut writer = DocumentWriter::new(out_dir, &descriptor)?;

    println!(
        "{} {} in source {} from {} to {}",
        style("Harvesting").bold(),
        style(query).cyan(),
        style(source_id).cyan(),
        style(from).green(),
        style(to).green()
    );
    println!();

    let session = connect()?;
    let client = Throttled::new(session, Duration::from_millis(delay_ms));

    let pb = spinner("Searching...");
    let mut run = harvest(&client, descriptor, options);
    for document in run.by_ref() {
        writer.write(&document)?;
        pb.set_message(format!("Saved {} documents...", writer.written()));
    }
    pb.finish_and_clear();

    println!(
        "{} {} documents to {}",
        style("Saved").green().bold(),
        writer.written(),
        writer.dir().display()
    );

    let abandoned = run.abandoned();
    if !abandoned.is_empty() {
        println!();
        println!(
            "{} {} date window(s) could not be harvested:",
            style("Warning:").yellow().bold(),
            abandoned.len()
        );
        for window in abandoned {
            println!("  ! {window}");
        }
    }

    Ok(())
}

/// Execute the sources command.
fn sources_command(name: Option<&str>, browse: bool, folder: Option<&str>) -> Result<()> {
    let session = connect()?;

    if browse {
        match browse_sources(&session, folder)? {
            SourceListing::Folders(folders) => {
                println!("{}", style("Folders:").bold());
                for folder in folders {
                    println!("  {}  {}", style(&folder.folder_id).cyan(), folder.name);
                }
            }
            SourceListing::Sources(sources) => print_sources(&sources),
        }
        return Ok(());
    }

    let Some(name) = name else {
        println!("Provide a partial source name to search for, or use --browse.");
        return Ok(());
    };

    let sources = search_sources(&session, name)?;
    if sources.is_empty() {
        println!("No sources match '{name}'.");
    } else {
        print_sources(&sources);
    }
    Ok(())
}

fn print_sources(sources: &[crate::sources::SourceInfo]) {
    println!("{}", style("Sources:").bold());
    for source in sources {
        let premium = if source.premium_source { " (premium)" } else { "" };
        println!(
            "  {}  {} [{}]{}",
            style(source.source_id).cyan(),
            source.name,
            source.kind,
            premium
        );
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
