//! `streamtree` CLI - Discover and crawl media streams

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use streamtree::{
    Config, Crawler, DiscoveryEngine, HttpTransport, MemoryStore, MimeType, Stream, StreamStore,
};

#[derive(Parser)]
#[command(name = "streamtree")]
#[command(about = "Discover playable media streams behind web pages and playlists")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/streamtree/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the child streams of a page or playlist
    Discover {
        /// Page or playlist URL
        url: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the media type of a URL
    Classify {
        /// URL to classify
        url: String,
    },

    /// Crawl a page or playlist recursively and print the stream tree
    Crawl {
        /// Root page or playlist URL
        url: String,

        /// Levels to descend (overrides config)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let transport = Arc::new(HttpTransport::with_config(&config.http)?);
    let engine = DiscoveryEngine::with_config(transport, &config.discovery);

    match cli.command {
        Commands::Discover { url, json } => cmd_discover(&engine, &url, json).await?,
        Commands::Classify { url } => cmd_classify(&engine, &url).await?,
        Commands::Crawl { url, depth, json } => {
            let mut crawl = config.crawl.clone();
            if let Some(depth) = depth {
                crawl.max_depth = depth;
            }
            cmd_crawl(engine, crawl, &url, json).await?;
        }
    }

    Ok(())
}

/// Root stream for a URL, typed by classification when possible.
async fn root_stream(engine: &DiscoveryEngine, url: &str) -> Result<Stream> {
    let mime = match engine.classify(url).await {
        Ok(Some(mime)) => mime,
        _ => MimeType::from_header("text/html")?,
    };
    Ok(Stream::new(url, url, mime))
}

async fn cmd_discover(engine: &DiscoveryEngine, url: &str, json: bool) -> Result<()> {
    let root = root_stream(engine, url).await?;
    let streams = engine
        .discover(&root)
        .await
        .with_context(|| format!("discovery failed for {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    for stream in &streams {
        println!("{:<32} {:<28} {}", truncate(&stream.title, 32), stream.mime_type, stream.url);
    }
    eprintln!("({} streams)", streams.len());
    Ok(())
}

async fn cmd_classify(engine: &DiscoveryEngine, url: &str) -> Result<()> {
    match engine.classify(url).await? {
        Some(mime) => {
            let kind = if mime.is_playable() {
                "playable"
            } else if mime.is_traversable() {
                "traversable"
            } else {
                "unsupported"
            };
            println!("{mime} ({kind})");
        }
        None => println!("unknown"),
    }
    Ok(())
}

async fn cmd_crawl(
    engine: DiscoveryEngine,
    crawl: streamtree::config::CrawlConfig,
    url: &str,
    json: bool,
) -> Result<()> {
    let root = root_stream(&engine, url).await?;
    let store = Arc::new(MemoryStore::new());
    let root_id = store.insert(&root).await?;
    let root = store.get(root_id).await?.context("root stream vanished")?;

    let crawler = Crawler::new(engine, store.clone(), crawl);
    let report = crawler.refresh(&root).await?;

    if json {
        let output = serde_json::json!({
            "report": report,
            "streams": store.all().await,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_tree(store.as_ref(), &root, 0).await?;
    for failure in &report.failures {
        eprintln!("failed: {} ({})", failure.url, failure.error);
    }
    eprintln!(
        "({} refreshed, {} streams)",
        report.refreshed,
        store.len().await.saturating_sub(1)
    );
    Ok(())
}

async fn print_tree(store: &MemoryStore, root: &Stream, depth: usize) -> Result<()> {
    let mut stack = vec![(root.clone(), depth)];
    while let Some((node, depth)) = stack.pop() {
        println!("{}{} [{}] {}", "  ".repeat(depth), node.title, node.mime_type, node.url);
        if let Some(id) = node.id {
            let children = store.query_children(id).await?;
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
