//! Absurd trolley problems in the terminal.
//!
//! Reads `GEMINI_API_KEY` (or `OPENROUTER_KEY` with `--backend openrouter`)
//! unless `--server` points at a running `trolley-web`.
//!
//! # Examples
//!
//! ```sh
//! trolley-tui
//! trolley-tui --backend openrouter --model meta-llama/llama-3.3-70b-instruct
//! trolley-tui --server http://127.0.0.1:3001 --prefetch on-exhaust
//! ```

use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use trolley::config::{Backend, QuizConfig};
use trolley::prompt::{ADJECTIVES_PER_BATCH, BATCH_SIZE};
use trolley::session::PrefetchPolicy;
use trolley::ui::tracing::UiTracingLayer;
use trolley::{Action, Driver, QuizState, dispatch};
use trolley_tui::{TuiConfig, spawn_tui};

/// Absurd trolley problems in the terminal.
#[derive(Parser)]
#[command(name = "trolley-tui")]
struct Cli {
    /// Backend service used for generation.
    #[arg(long, value_enum, default_value_t = Backend::Gemini)]
    backend: Backend,

    /// Model identifier (defaults to the backend's model).
    #[arg(long)]
    model: Option<String>,

    /// Go through a trolley-web server at this URL instead of the backend.
    #[arg(long)]
    server: Option<String>,

    /// Problems requested per batch.
    #[arg(long, default_value_t = BATCH_SIZE)]
    batch_size: usize,

    /// Adjectives mixed into each batch prompt.
    #[arg(long, default_value_t = ADJECTIVES_PER_BATCH)]
    adjectives: usize,

    /// When to request the next batch.
    #[arg(long, value_enum, default_value_t = PrefetchPolicy::Eager)]
    prefetch: PrefetchPolicy,

    /// Milliseconds between revealed characters.
    #[arg(long, default_value_t = 18)]
    speed: u64,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = QuizConfig {
        backend: cli.backend,
        model: cli.model,
        server: cli.server,
        batch_size: cli.batch_size.max(1),
        adjective_count: cli.adjectives,
        typewriter_speed: Duration::from_millis(cli.speed),
        prefetch: cli.prefetch,
    };

    // Fail before the alternate screen hides the message.
    let generator = config
        .build_generator()
        .map_err(|e| format!("failed to create client: {e}"))?;

    let label = match config.server {
        Some(ref url) => format!("via {url}"),
        None => format!("{} / {}", generator.name(), config.model()),
    };

    // Tracing → TUI log buffer.
    let (tracing_layer, log_buffer) = UiTracingLayer::new();
    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(tracing_layer)
        .init();

    let state = Arc::new(Mutex::new(QuizState::new(config.prefetch)));
    if let Ok(mut s) = state.lock() {
        s.backend = label;
    }

    let (driver, effects) = Driver::new(state.clone(), generator, config);
    let driver = tokio::spawn(driver.run());
    dispatch(&state, Action::Start, &effects);

    let tui_config = TuiConfig {
        log_buffer: Some(log_buffer),
    };
    let tui = spawn_tui(state, effects, tui_config);

    tokio::task::spawn_blocking(move || tui.join())
        .await
        .map_err(|e| format!("TUI task failed: {e}"))?
        .map_err(|_| "TUI thread panicked".to_string())?;

    driver.abort();
    Ok(())
}
