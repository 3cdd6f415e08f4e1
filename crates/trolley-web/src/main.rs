//! Trolley problem API server.
//!
//! Holds the model key so browsers never see it.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p trolley-web
//! OPENROUTER_KEY=sk-... cargo run -p trolley-web -- --backend openrouter
//! GEMINI_API_KEY=... cargo run -p trolley-web -- --port 8080 --static-dir ./dist
//! ```
//!
//! ```bash
//! curl -s localhost:3001/api/ask -H 'content-type: application/json' \
//!   -d '{"question": "Invent one absurd trolley problem"}'
//! curl -s localhost:3001/api/batch -H 'content-type: application/json' -d '{"size": 3}'
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use trolley::config::{Backend, QuizConfig};
use trolley_web::{WebConfig, spawn_web};

/// Trolley problem API server.
#[derive(Parser)]
#[command(about = "Serves /api/ask and /api/batch backed by a language model")]
struct Args {
    /// Backend service used for generation.
    #[arg(long, value_enum, default_value_t = Backend::Gemini)]
    backend: Backend,

    /// Model identifier (defaults to the backend's model).
    #[arg(long)]
    model: Option<String>,

    /// Port for the server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Listen on all interfaces instead of localhost.
    #[arg(long)]
    public: bool,

    /// Serve static files from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), String> {
    let quiz = QuizConfig {
        backend: args.backend,
        model: args.model,
        ..Default::default()
    };
    let generator = quiz.build_generator().map_err(|e| e.to_string())?;

    let host = if args.public {
        [0, 0, 0, 0]
    } else {
        [127, 0, 0, 1]
    };
    let config = WebConfig {
        bind_addr: (host, args.port).into(),
        static_dir: args.static_dir,
        ..Default::default()
    };
    let addr = spawn_web(generator, config)
        .await
        .map_err(|e| format!("failed to bind port {}: {e}", args.port))?;
    println!("trolley-web: http://{addr} (model {})", quiz.model());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for ctrl-c: {e}"))?;
    Ok(())
}
