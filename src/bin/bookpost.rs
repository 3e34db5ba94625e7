use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bookpost::app::{App, FetchReport, PostCheck};
use bookpost::collector::{ReviewCollector, SequentialCollector};
use bookpost::config::{ConfigLoader, ResolvedConfig, SourceMode};
use bookpost::domain::{Isbn, ReviewCollection, ReviewQuery};
use bookpost::error::BookpostError;
use bookpost::google_books::{BookData, GoogleBooksClient, GoogleBooksHttpClient};
use bookpost::progress::{ProgressEvent, ProgressLevel, ProgressSink};
use bookpost::store::Store;

#[derive(Parser)]
#[command(name = "bookpost")]
#[command(about = "Book review auto poster: fetch metadata and review signal by ISBN")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch book metadata and collect reviews")]
    Fetch(FetchArgs),
    #[command(about = "Check that the publishing inputs are in place")]
    Post(PostArgs),
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long)]
    isbn: String,

    #[arg(long)]
    sources: Option<SourceMode>,
}

#[derive(Args)]
struct PostArgs {
    #[arg(long)]
    isbn: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<BookpostError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BookpostError) -> u8 {
    match error {
        BookpostError::InvalidIsbn(_)
        | BookpostError::MissingBookData(_)
        | BookpostError::MissingArticle(_)
        | BookpostError::MissingThumbnail(_) => 2,
        BookpostError::GoogleBooksHttp(_)
        | BookpostError::GoogleBooksStatus { .. }
        | BookpostError::BookNotFound(_)
        | BookpostError::HttpClientInit(_) => 3,
        _ => 1,
    }
}

/// Prints progress to the console and mirrors it into the tracing log.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn event(&self, event: ProgressEvent) {
        match event.level {
            ProgressLevel::Info => tracing::info!("{}", event.message),
            ProgressLevel::Warn => tracing::warn!("{}", event.message),
        }
        println!("  {}", event.message);
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let store = Store::new(resolved.data_dir.clone());
    init_logging(&store);

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, &resolved, store),
        Commands::Post(args) => run_post(args, store),
    }
}

fn init_logging(store: &Store) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = store.log_path();
    let log_file = log_path
        .parent()
        .ok_or(())
        .and_then(|dir| std::fs::create_dir_all(dir.as_std_path()).map_err(|_| ()))
        .and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path.as_std_path())
                .map_err(|_| ())
        });

    match log_file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        // an unwritable data dir falls back to stderr logging
        Err(()) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn run_fetch(args: FetchArgs, resolved: &ResolvedConfig, store: Store) -> miette::Result<()> {
    let isbn = args.isbn.parse::<Isbn>().into_diagnostic()?;
    let mode = args.sources.unwrap_or(resolved.sources);

    let article_hint = store.article_path(&isbn);
    let thumbnail_hint = store.thumbnail_path(&isbn);

    let books = GoogleBooksHttpClient::new().into_diagnostic()?;
    let collector = SequentialCollector::new(mode).into_diagnostic()?;
    let app = App::new(store, books, collector);

    println!("Fetching book data for ISBN {isbn}");
    let report = app.fetch(&isbn, &ConsoleSink).into_diagnostic()?;
    print_fetch_summary(&report, &article_hint, &thumbnail_hint);
    Ok(())
}

fn print_fetch_summary(
    report: &FetchReport,
    article_hint: &camino::Utf8Path,
    thumbnail_hint: &camino::Utf8Path,
) {
    let green = "\x1b[32m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!();
    println!("{green}Book metadata and reviews fetched{reset}");
    println!("  Title:   {}", report.book.title);
    println!("  Authors: {}", report.book.authors.join(", "));
    if !report.book.published_date.is_empty() {
        println!("  Published: {}", report.book.published_date);
    }
    match (report.reviews.cached, report.reviews.count) {
        (true, _) => println!(
            "{cyan}  Reviews: cached report at {}{reset}",
            report.reviews.path
        ),
        (false, Some(count)) => println!(
            "{cyan}  Reviews: {count} records saved to {}{reset}",
            report.reviews.path
        ),
        (false, None) => {}
    }
    println!();
    println!("Next steps:");
    println!("1. Draft the article from {}", report.reviews.path);
    println!("   into {article_hint}");
    println!("2. Generate a thumbnail into {thumbnail_hint}");
}

struct NopBooks;

impl GoogleBooksClient for NopBooks {
    fn fetch(&self, _isbn: &Isbn) -> Result<BookData, BookpostError> {
        Err(BookpostError::GoogleBooksHttp(
            "catalog client not configured".to_string(),
        ))
    }
}

struct NopCollector;

impl ReviewCollector for NopCollector {
    fn collect(&self, _query: &ReviewQuery, _sink: &dyn ProgressSink) -> ReviewCollection {
        ReviewCollection::new()
    }
}

fn run_post(args: PostArgs, store: Store) -> miette::Result<()> {
    let isbn = args.isbn.parse::<Isbn>().into_diagnostic()?;
    let app = App::new(store, NopBooks, NopCollector);

    println!("Checking publishing inputs for ISBN {isbn}");
    let check = app.post_check(&isbn, &ConsoleSink).into_diagnostic()?;
    print_post_summary(&check);
    Ok(())
}

fn print_post_summary(check: &PostCheck) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";

    println!();
    println!("{green}Publishing inputs are in place{reset}");
    println!("  Title:     {}", check.book.title);
    println!("  Article:   {} ({} chars)", check.article_path, check.article_chars);
    println!(
        "  Thumbnail: {} ({:.2} MB)",
        check.thumbnail_path,
        check.thumbnail_bytes as f64 / (1024.0 * 1024.0)
    );
    if check.thumbnail_oversized {
        println!("{yellow}  Warning: thumbnail exceeds the 2 MB upload limit{reset}");
    }
    println!("Publishing itself is not implemented yet; upload the files by hand.");
}
