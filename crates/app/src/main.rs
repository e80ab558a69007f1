use chrono::Utc;
use clap::{Parser, Subcommand};
use docstream_core::{
    analyze, collection_stats, normalize, paragraphs, ApiClient, CancellationToken, ClientConfig,
    ClientError, DEFAULT_BASE_URL,
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod render;

#[derive(Parser)]
#[command(name = "docstream", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document-indexing service base URL
    #[arg(long, global = true, env = "DOCSTREAM_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Timeout in seconds for every request except the ingestion stream
    #[arg(long, global = true, env = "DOCSTREAM_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the service is up and whether it has an index.
    Health,
    /// Index a folder, following the server's progress stream.
    Ingest {
        /// Folder on the server host to index.
        #[arg(long)]
        folder: String,
    },
    /// Index a folder with a single blocking request.
    Upload {
        /// Folder on the server host to index.
        #[arg(long)]
        folder: String,
    },
    /// List indexed documents.
    Documents,
    /// Show one document with its text statistics.
    Show {
        /// Document id.
        #[arg(long)]
        id: String,
        /// Highlight this literal term in the printed paragraphs.
        #[arg(long)]
        highlight: Option<String>,
        /// Number of paragraphs to print.
        #[arg(long, default_value = "3")]
        paragraphs: usize,
    },
    /// Search indexed documents and rank them by relative relevance.
    Search {
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of results to return.
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Print the highest-weighted TF-IDF terms of each document.
    Tfidf {
        /// Terms to print per document.
        #[arg(long, default_value = "5")]
        top: usize,
    },
}

fn user_error(error: ClientError) -> anyhow::Error {
    anyhow::anyhow!(error.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ClientConfig {
        base_url: cli.api_url.clone(),
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..ClientConfig::default()
    };
    let api = ApiClient::new(&config).map_err(user_error)?;
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        api_url = %api.base_url(),
        "docstream boot"
    );

    match cli.command {
        Command::Health => {
            let health = api.health().await.map_err(user_error)?;
            println!(
                "status={} version={} indexed={} documents={}",
                health.status, health.version, health.indexed, health.total_documents
            );
            if !health.message.is_empty() {
                println!("{}", health.message);
            }
        }
        Command::Ingest { folder } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            info!(folder = %folder, "streaming ingestion");
            let report = api
                .ingest(&folder, &cancel, |state| {
                    if let Some(snapshot) = state.progress() {
                        eprintln!("{}", render::progress_line(snapshot));
                    }
                })
                .await
                .map_err(user_error)?;

            if report.skipped_lines > 0 {
                warn!(
                    session_id = %report.session_id,
                    skipped_lines = report.skipped_lines,
                    "some stream lines could not be decoded"
                );
            }
            if report.progress_regressions > 0 {
                warn!(
                    session_id = %report.session_id,
                    regressions = report.progress_regressions,
                    "server progress moved backwards during ingestion"
                );
            }

            for doc in &report.documents {
                println!("{}", render::document_row(doc));
            }
            let stats = collection_stats(&report.documents);
            println!(
                "{} documents indexed ({} words, {} avg) in {}s",
                stats.total_documents,
                stats.total_words,
                stats.avg_words,
                (report.finished_at - report.started_at).num_seconds()
            );
        }
        Command::Upload { folder } => {
            let response = api.upload(&folder).await.map_err(user_error)?;
            for doc in &response.documents {
                println!("{}", render::document_row(doc));
            }
            println!(
                "{} ({} documents at {})",
                response.message,
                response.total_documents,
                Utc::now().to_rfc3339()
            );
        }
        Command::Documents => {
            let documents = api.list_documents().await.map_err(user_error)?;
            for doc in &documents {
                println!("{}", render::document_row(doc));
            }
            let stats = collection_stats(&documents);
            println!(
                "documents={} total_words={} avg_words={}",
                stats.total_documents, stats.total_words, stats.avg_words
            );
        }
        Command::Show {
            id,
            highlight,
            paragraphs: paragraph_limit,
        } => {
            let detail = api.document_detail(&id).await.map_err(user_error)?;
            let report = analyze(&detail);

            println!("document: {} [{}]", detail.filename, detail.id);
            if !detail.path.is_empty() {
                println!("  path={}", detail.path);
            }
            for line in render::report_lines(&report) {
                println!("  {line}");
            }

            let term = highlight.unwrap_or_default();
            let all = paragraphs(&detail.original_text);
            for paragraph in all.iter().take(paragraph_limit) {
                println!("\n{}", render::highlighted(paragraph, &term));
            }
            if all.len() > paragraph_limit {
                println!("\n... output truncated to first {paragraph_limit} paragraph(s)");
            }
        }
        Command::Search { query, top_k } => {
            let response = api.search(&query, top_k).await.map_err(user_error)?;

            println!(
                "query: {} -> {} ({} result(s))",
                response.query_original, response.query_processed, response.total_results
            );
            if !response.query_tokens.is_empty() {
                println!("tokens: {}", response.query_tokens.join(", "));
            }

            let ranked = normalize(&response.results);
            for (display, result) in ranked.iter().zip(&response.results) {
                println!(
                    "#{} {} similarity={:.4} relative={:.0}% {} words={}",
                    display.rank,
                    display.filename,
                    display.similarity,
                    display.normalized_score,
                    display.tier,
                    result.word_count
                );
                println!(
                    "  {}",
                    render::highlighted(&render::preview(&result.original_text, 200), &query)
                );
            }
        }
        Command::Tfidf { top } => {
            let matrix = api.tfidf_matrix().await.map_err(user_error)?;
            println!(
                "documents={} terms={}",
                matrix.num_documents, matrix.num_terms
            );
            for document in &matrix.documents {
                let terms = document
                    .top_terms
                    .iter()
                    .take(top)
                    .map(|entry| format!("{}={:.4}", entry.term, entry.tfidf))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("doc {}: {terms}", document.doc_index);
            }
        }
    }

    Ok(())
}
