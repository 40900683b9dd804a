use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wiki_wordfreq::{
    analyze::{render_text_report, Analysis, Analyzer, Source},
    cache::CacheStore,
    http::{router, AppState},
    text::{PipelineConfig, TextPipeline},
    wiki::{LiveWikiClient, WikiConfig},
};

#[derive(Parser)]
#[command(name = "wiki-wordfreq")]
#[command(about = "Word frequency analysis of wiki categories, web pages and text files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[arg(long, default_value = "cache", global = true)]
    cache_dir: PathBuf,

    #[arg(long, global = true)]
    debug: bool,

    /// Count simple plurals under their singular form
    #[arg(long, global = true)]
    fold_plurals: bool,

    /// Article requests kept in flight while fetching content
    #[arg(long, default_value = "1", global = true)]
    concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a category and print the most common words
    Analyze {
        category: String,

        #[arg(long)]
        force_refresh: bool,

        /// Number of words to print
        #[arg(long, default_value = "20")]
        top: usize,

        /// Write the full text report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze the visible text of a web page
    AnalyzeUrl {
        url: String,

        #[arg(long)]
        force_refresh: bool,

        #[arg(long, default_value = "20")]
        top: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a plain-text file
    AnalyzeFile {
        path: PathBuf,

        #[arg(long)]
        force_refresh: bool,

        #[arg(long, default_value = "20")]
        top: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve analyses over HTTP
    Serve {
        #[arg(short, long, default_value = "3005")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wiki_wordfreq={filter_level},tower_http=info").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = WikiConfig::from_env().context("Failed to load wiki configuration from environment")?;
    let client = LiveWikiClient::new(config)?;
    let store = CacheStore::open(&args.cache_dir)
        .await
        .with_context(|| format!("Failed to open cache at {}", args.cache_dir.display()))?;
    let pipeline = TextPipeline::new(PipelineConfig {
        fold_plurals: args.fold_plurals,
        ..PipelineConfig::default()
    });

    let analyzer = Analyzer::new(store, Arc::new(client), pipeline)
        .with_fetch_concurrency(args.concurrency);

    match args.command {
        Command::Analyze {
            category,
            force_refresh,
            top,
            output,
        } => {
            let analysis = analyzer.analyze(&category, force_refresh).await?;
            present(&analysis, top, output).await?;
        }
        Command::AnalyzeUrl {
            url,
            force_refresh,
            top,
            output,
        } => {
            let analysis = analyzer.analyze_url(&url, force_refresh).await?;
            present(&analysis, top, output).await?;
        }
        Command::AnalyzeFile {
            path,
            force_refresh,
            top,
            output,
        } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            let text = String::from_utf8_lossy(&bytes).into_owned();

            let analysis = analyzer
                .analyze_source(Source::text(name, text), force_refresh)
                .await?;
            present(&analysis, top, output).await?;
        }
        Command::Serve { port, host } => {
            let app = router(AppState {
                analyzer: Arc::new(analyzer),
            });

            let bind_addr = format!("{host}:{port}");
            let listener = TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("failed to bind to {bind_addr}"))?;

            info!("wiki-wordfreq server started on {}", bind_addr);
            info!("   curl 'http://{}/analyze?category=Physics'", bind_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")?;
        }
    }

    Ok(())
}

async fn present(analysis: &Analysis, top: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = output {
        tokio::fs::write(&path, render_text_report(analysis))
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }

    println!("\nMost common words in '{}':", analysis.name);
    for term in analysis.result.terms.ranked(top) {
        println!("{}: {}", term.word, term.count);
    }
    if !analysis.skipped_pages.is_empty() {
        println!("\n{} page(s) skipped", analysis.skipped_pages.len());
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
