//! Absurd trolley problems, generated on demand.
//!
//! `trolley` asks a language model for batches of ridiculous trolley
//! problems, recovers them from whatever text the model returns, and runs a
//! quiz over them: show a problem, let the user press the lever or do nothing,
//! then reveal how many people the model guesses would agree.
//!
//! The crate is split so that the quiz logic never touches I/O:
//!
//! | Module | Role |
//! |---|---|
//! | [`item`] | Problem, choice and agreement types |
//! | [`prompt`] | Batch prompt with random adjectives |
//! | [`parse`] | Four-stage recovery of problems from model text |
//! | [`client`] | [`Generator`] trait plus Gemini, OpenRouter and pass-through clients |
//! | [`fetch`] | One prompt → generate → parse round-trip |
//! | [`session`] | Pure quiz reducers returning [`Effect`]s |
//! | [`reveal`] | Typewriter reveal and its cancellable timer |
//! | [`driver`] | Executes effects on the tokio runtime |
//! | [`ui`] | State shared with a frontend, plus log capture |
//!
//! # Getting started
//!
//! ```ignore
//! use trolley::{BatchPrompt, QuizConfig, fetch_batch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let config = QuizConfig::default();
//!     let generator = config.build_generator().map_err(|e| e.to_string())?;
//!     let items = fetch_batch(generator.as_ref(), &config.batch_prompt())
//!         .await
//!         .map_err(|e| e.user_message().to_string())?;
//!     for item in items {
//!         println!("{}", item.question);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod item;
pub mod parse;
pub mod prompt;
pub mod reveal;
pub mod session;
pub mod ui;

pub use client::{AskClient, GeminiClient, GenerateFuture, Generator, OpenRouterClient};
pub use config::{Backend, QuizConfig};
pub use driver::Driver;
pub use error::{FetchError, GenerateError};
pub use fetch::fetch_batch;
pub use item::{Agreement, BatchItem, Choice, Estimates};
pub use parse::{parse_batch_detailed, parse_batch_response};
pub use prompt::BatchPrompt;
pub use session::{Effect, PrefetchPolicy, Session, View};
pub use ui::{Action, QuizState, dispatch};
