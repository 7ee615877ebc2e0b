//! Fanqie CLI - fanqienovel.com novel downloader.

use anyhow::{Context, Result};
use clap::Parser;
use fanqie::{ChapterRecord, Config, Console, FanqieClient};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::PathBuf;

/// Download novels from fanqienovel.com.
///
/// Chapter text is written to stdout; progress goes to stderr.
#[derive(Parser, Debug)]
#[command(name = "fanqie")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Book ID, or a fanqienovel.com page, reader or keyword URL.
    input: String,

    /// Start downloading from chapter N (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    start: Option<u32>,

    /// Stop downloading at chapter N (1-based, inclusive).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    end: Option<u32>,

    /// Print the chapter list and exit.
    #[arg(long)]
    list: bool,

    /// Number of chapters to download at the same time.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=16))]
    jobs: u32,

    /// Read configuration from this file instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "warn", value_enum)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("fanqie={}", args.log_level.as_str()))
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let console = Console::new();
    console.section("Fanqie - Novel Downloader");

    console.step("Loading configuration...");
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let client = FanqieClient::new(config).context("Failed to create client")?;
    console.success("Configuration loaded");
    console.info(&console.muted(&format!(
        "Session cookie: {}",
        client.cookie_store().path().display()
    )));

    console.step("Resolving book id...");
    let book_id = client
        .book_id_from_any_url(&args.input)
        .await
        .context("Failed to resolve book id")?;
    console.success(&format!("Book id: {}", book_id));

    console.step("Fetching book information...");
    match client
        .get_book_info(&book_id)
        .await
        .context("Failed to fetch book info")?
    {
        Some(info) => {
            console.success(&format!("Found: {}", info.name));
            console.info(&format!("Author: {}", info.author));
            console.info(&console.muted(&info.description));
        }
        None => console.warning("Book page unavailable, continuing without details"),
    }

    console.step("Fetching chapter list...");
    let chapters = client
        .extract_chapters(&book_id)
        .await
        .context("Failed to fetch chapter list")?;
    if chapters.is_empty() {
        anyhow::bail!("No chapters found for book {}", book_id);
    }
    console.success(&format!("Found {} chapters", console.count(chapters.len())));

    if args.list {
        let mut out = std::io::stdout().lock();
        for chapter in &chapters {
            writeln!(out, "{:>5}  {}  {}", chapter.index + 1, chapter.id, chapter.title)?;
        }
        return Ok(());
    }

    let (start, end) = validate_chapter_range(args.start, args.end, chapters.len(), &console)?;
    let selected = &chapters[start - 1..end];

    let failures = download_chapters(&client, selected, args.jobs as usize, &console).await?;

    console.section("Done!");
    if failures > 0 {
        anyhow::bail!("{} of {} chapters failed to download", failures, selected.len());
    }
    Ok(())
}

/// Downloads chapters with up to `jobs` in flight, writing them to stdout
/// in list order. Returns the number of chapters that failed.
async fn download_chapters(
    client: &FanqieClient,
    chapters: &[ChapterRecord],
    jobs: usize,
    console: &Console,
) -> Result<usize> {
    let total = chapters.len();
    let mut downloads = stream::iter(chapters)
        .map(|chapter| async move { (chapter, client.down_text(&chapter.id).await) })
        .buffered(jobs);

    let mut done = 0;
    let mut failures = 0;
    let mut characters = 0;

    while let Some((chapter, result)) = downloads.next().await {
        done += 1;
        match result {
            Ok(content) => {
                characters += content.chars().count();
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}\n\n{}\n", chapter.title, content)?;
                console.progress_update(&format!(
                    "{} {}",
                    console.chapter_progress(done, total),
                    chapter.title
                ));
            }
            Err(e) => {
                failures += 1;
                console.clear_line();
                console.error(&format!("{}: {}", chapter.title, e));
            }
        }
    }

    console.clear_line();
    console.success(&format!(
        "Downloaded {} chapters ({} characters)",
        console.count(total - failures),
        console.count(characters)
    ));
    Ok(failures)
}

/// Validates the chapter range arguments.
fn validate_chapter_range(
    start: Option<u32>,
    end: Option<u32>,
    total_chapters: usize,
    console: &Console,
) -> Result<(usize, usize)> {
    let start_chapter = start.map_or(1, |n| n as usize);
    let end_chapter = end.map_or(total_chapters, |n| n as usize);

    if start_chapter > end_chapter {
        anyhow::bail!(
            "Start chapter ({}) cannot be greater than end chapter ({})",
            start_chapter,
            end_chapter
        );
    }

    if end_chapter > total_chapters {
        anyhow::bail!(
            "End chapter ({}) exceeds total chapters ({})",
            end_chapter,
            total_chapters
        );
    }

    console.info(&format!(
        "Processing chapters {} to {} of {}",
        start_chapter, end_chapter, total_chapters
    ));

    Ok((start_chapter, end_chapter))
}
