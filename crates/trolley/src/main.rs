//! Command-line access to the trolley problem generator.
//!
//! Reads `GEMINI_API_KEY` (or `OPENROUTER_KEY` with `--backend openrouter`)
//! from the environment unless `--server` points at a running `trolley-web`.
//!
//! # Examples
//!
//! ```sh
//! # Free-form prompt, printed verbatim
//! trolley ask --prompt "Invent one absurd trolley problem"
//!
//! # A parsed batch of five problems as JSON
//! trolley batch --size 5
//!
//! # Recover problems from saved model output
//! trolley parse response.txt
//! cat response.txt | trolley parse
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trolley::config::{Backend, QuizConfig};
use trolley::parse::parse_batch_detailed;
use trolley::prompt::{ADJECTIVES_PER_BATCH, BATCH_SIZE};
use trolley::{BatchPrompt, fetch_batch};

/// Generate and parse absurd trolley problems.
#[derive(Parser)]
#[command(name = "trolley")]
struct Cli {
    /// Backend service used for generation
    #[arg(long, value_enum, default_value_t = Backend::Gemini, global = true)]
    backend: Backend,

    /// Model identifier (defaults to the backend's model)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Send prompts to a trolley-web server instead of the backend
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a prompt and print the model's answer
    Ask {
        /// Prompt text
        #[arg(long)]
        prompt: String,
    },
    /// Generate one batch and print the parsed problems as JSON
    Batch {
        /// Problems to request
        #[arg(long, default_value_t = BATCH_SIZE)]
        size: usize,

        /// Adjectives mixed into the prompt
        #[arg(long, default_value_t = ADJECTIVES_PER_BATCH)]
        adjectives: usize,

        /// Print the prompt instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse saved model output and print the recovered problems as JSON
    Parse {
        /// File to read (stdin when omitted)
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String, String> {
    let config = QuizConfig {
        backend: cli.backend,
        model: cli.model,
        server: cli.server,
        ..Default::default()
    };

    match cli.command {
        Command::Ask { prompt } => {
            let generator = config.build_generator().map_err(|e| e.to_string())?;
            generator
                .generate(&prompt)
                .await
                .map_err(|e| format!("{} request failed: {e}", generator.name()))
        }
        Command::Batch {
            size,
            adjectives,
            dry_run,
        } => {
            let prompt = BatchPrompt::random(size, adjectives);
            if dry_run {
                return Ok(prompt.render());
            }
            let generator = config.build_generator().map_err(|e| e.to_string())?;
            let items = fetch_batch(generator.as_ref(), &prompt)
                .await
                .map_err(|e| e.user_message().to_string())?;
            to_json(&items)
        }
        Command::Parse { file } => {
            let text = match file {
                Some(path) => read_file(&path)?,
                None => read_stdin_content()?,
            };
            let parsed = parse_batch_detailed(&text);
            if parsed.items.is_empty() {
                return Err("no trolley problems found in input".to_string());
            }
            to_json(&parsed.items)
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to format output: {e}"))
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read '{}': {e}", path.display()))
}

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn parse_command_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Sure!\n```json\n[{{\"question\": \"q\", \"estimates\": {{\"Press the lever\": \"1%\", \"Do nothing\": \"99%\"}}}}]\n```"
        )
        .unwrap();

        let cli = Cli::parse_from(["trolley", "parse", file.path().to_str().unwrap()]);
        let out = run(cli).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["question"], "q");
        assert_eq!(value[0]["estimates"]["Do nothing"], "99%");
    }

    #[tokio::test]
    async fn parse_command_rejects_empty_input() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cli = Cli::parse_from(["trolley", "parse", file.path().to_str().unwrap()]);
        let err = run(cli).await.unwrap_err();
        assert!(err.contains("no trolley problems"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("nope.txt")).unwrap_err();
        assert!(err.starts_with("failed to read"));
    }

    #[tokio::test]
    async fn dry_run_prints_prompt_without_a_key() {
        let cli = Cli::parse_from(["trolley", "batch", "--size", "4", "--dry-run"]);
        let out = run(cli).await.unwrap();
        assert!(out.starts_with("Create 4 "));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["trolley", "ask", "--prompt", "hi", "--backend", "openrouter"]);
        assert_eq!(cli.backend, Backend::Openrouter);
    }
}
