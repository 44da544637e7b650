use crate::browser::BrowserView;
use crate::config::ClientConfig;
use crate::pagination::Page;
use crate::search::SearchView;
use crate::transport::{AudioFile, Record};
use crate::Workspace;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// How long `upload` waits for the post-batch listing before giving up on it
const REFRESH_WAIT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "scribe-desk", version, about = "Upload, browse and search transcription records")]
struct Cli {
    /// JSON config file (created with defaults if missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service origin
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of stored records
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Search records by file name or transcription content
    Search {
        keyword: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Upload audio files for transcription
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the record list whenever it changes, until Ctrl+C
    Watch,
}

pub async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(endpoint) = &cli.endpoint {
        config.api_endpoint = crate::config::normalize_endpoint(endpoint);
    }

    let workspace = Workspace::connect(config).context("Failed to create HTTP client")?;

    match cli.command {
        Command::List { page } => list(&workspace, page).await,
        Command::Search { keyword, page } => search(&workspace, &keyword, page).await,
        Command::Upload { files } => upload(&workspace, files).await,
        Command::Watch => watch(&workspace).await,
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scribe_desk=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn list(workspace: &Workspace, page: usize) -> Result<()> {
    let browser = workspace.browser();
    if !browser.refresh().await {
        bail!("Could not retrieve records from {}", workspace.config().api_endpoint);
    }
    browser.go_to_page(page);
    print_browser(&browser.view());
    Ok(())
}

async fn search(workspace: &Workspace, keyword: &str, page: usize) -> Result<()> {
    let engine = workspace.search();
    engine.submit(keyword).await?;
    engine.go_to_page(page);

    match engine.view() {
        SearchView::Results(page) => {
            println!("Search Result(s):");
            print_page(&page, |record| {
                println!("{}", or_placeholder(&record.transcription));
                println!(
                    "    File Name: {}, Channel: {}, Sample Rate: {}, Duration: {}s",
                    record.file_name,
                    field_text(&record.channel),
                    field_text(&record.sample_rate),
                    field_text(&record.duration)
                );
                println!("    Created at: {}", record.created_at);
            });
        }
        view => println!("{}", view.message().unwrap_or_default()),
    }
    Ok(())
}

async fn upload(workspace: &Workspace, paths: Vec<PathBuf>) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        match AudioFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
        }
    }
    if files.is_empty() {
        bail!("None of the given files could be read");
    }

    let browser = workspace.browser();
    let handle = browser.activate().await;
    let mut refreshes = browser.watch_refreshes();
    let seen = *refreshes.borrow();

    let uploads = workspace.uploads();
    uploads.select_files(files);
    println!("Uploading {} file(s)...", uploads.selected_count());
    let report = uploads.upload_selected().await?;

    for line in report.messages() {
        println!("{}", line);
    }

    let refreshed = tokio::time::timeout(
        Duration::from_secs(REFRESH_WAIT_SECS),
        refreshes.wait_for(|n| *n > seen),
    )
    .await
    .is_ok();
    if refreshed {
        println!("{} record(s) stored.", browser.records().len());
    }

    handle.deactivate();
    Ok(())
}

async fn watch(workspace: &Workspace) -> Result<()> {
    let browser = workspace.browser();
    let mut refreshes = browser.watch_refreshes();
    let handle = browser.activate().await;
    print_browser(&browser.view());

    loop {
        tokio::select! {
            changed = refreshes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_browser(&browser.view());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.deactivate();
    Ok(())
}

fn print_browser(view: &BrowserView) {
    match view {
        BrowserView::Records(page) => {
            println!("Stored Transcripts:");
            print_page(page, |record| {
                println!("{}", record.file_name);
                println!("    {}", or_placeholder(&record.transcription));
                println!("    Created at: {}", record.created_at);
                println!(
                    "    Duration: {}, Channel: {}, Sample Rate: {}",
                    field_text(&record.duration),
                    field_text(&record.channel),
                    field_text(&record.sample_rate)
                );
            });
        }
        view => println!("{}", view.message().unwrap_or_default()),
    }
}

fn print_page<F: Fn(&Record)>(page: &Page<Record>, print_record: F) {
    for record in &page.items {
        print_record(record);
    }

    let window = &page.window;
    if !window.show_controls() {
        return;
    }

    let numbers: Vec<String> = window
        .visible_pages
        .iter()
        .map(|&n| {
            if n == window.current_page {
                format!("[{}]", n)
            } else {
                n.to_string()
            }
        })
        .collect();

    println!(
        "{} {} {}   (page {} of {})",
        if window.has_previous() { "<" } else { " " },
        numbers.join(" "),
        if window.has_next() { ">" } else { " " },
        window.current_page,
        window.total_pages
    );
}

fn or_placeholder(text: &str) -> &str {
    if text.is_empty() {
        "No content available"
    } else {
        text
    }
}

fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
