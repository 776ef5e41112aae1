//! Document Q&A server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server [-- --interactive]

use clap::Parser;
use docqa::{config::RagConfig, server::RagServer, server::state::AppState};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docqa-server")]
#[command(about = "Answer questions about PDF documents over HTTP", version)]
struct Args {
    /// TOML configuration file (environment variables override it)
    #[arg(short, long, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Also read questions from stdin while the server runs
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::load_from(args.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Input folder: {}", config.input.folder.display());
    tracing::info!("  - Pinecone index: {}", config.pinecone.index_name);
    tracing::info!("  - Chunk words: {}", config.chunking.chunk_words);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);
    tracing::info!(
        "  - Backends: {}",
        config
            .generation
            .backends
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let server = RagServer::new(config).await?;
    println!("\nServer starting on http://{}", server.address());
    println!("  GET  /documents   - List documents");
    println!("  POST /chat/       - Ask a question (?question=...)");
    println!("  POST /hackrx/run  - Answer questions about a PDF URL\n");

    if !args.interactive {
        server.start().await?;
        return Ok(());
    }

    let state = server.state().clone();
    let listener = server.bind().await?;
    tokio::select! {
        served = server.serve(listener) => served?,
        terminal = run_terminal(&state) => terminal?,
    }

    Ok(())
}

/// Read questions from stdin until `exit`/`quit` or end of input
async fn run_terminal(state: &AppState) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Ask anything about your documents (type 'exit' to quit):\n")
        .await?;
    loop {
        stdout.write_all(b"Your query: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match state.pipeline().answer_question(question).await {
            Ok(answer) => println!("\nAnswer:\n{}\n", answer.answer),
            Err(e) => eprintln!("\nFailed to answer: {}\n", e),
        }
    }

    Ok(())
}
