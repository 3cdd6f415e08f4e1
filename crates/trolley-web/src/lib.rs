//! HTTP front for the trolley problem generator.
//!
//! `trolley-web` serves two JSON endpoints backed by any
//! [`Generator`](trolley::Generator):
//!
//! - `POST /api/ask`: forwards `{ "question" }` to the model and returns
//!   `{ "answer" }`. The key never leaves the server.
//! - `POST /api/batch`: builds a batch prompt, generates, parses, and returns
//!   `{ "items", "adjectives" }`.
//!
//! A directory of static files can be served alongside for a browser
//! frontend.
//!
//! # Quick start
//!
//! ```ignore
//! use trolley::QuizConfig;
//! use trolley_web::{WebConfig, spawn_web};
//!
//! let generator = QuizConfig::default().build_generator()?;
//! let addr = spawn_web(generator, WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```

mod api;
mod server;

pub use api::{BatchRequest, BatchResponse};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use trolley::Generator;
use trolley::prompt::{ADJECTIVES_PER_BATCH, BATCH_SIZE};

/// Largest batch a client may request.
pub const MAX_BATCH_SIZE: usize = 25;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory of static files served for unmatched paths.
    ///
    /// If `None`, only the API is served and the frontend runs elsewhere.
    pub static_dir: Option<PathBuf>,
    /// Batch size when a request doesn't name one. Default: `10`.
    pub batch_size: usize,
    /// Adjectives mixed into each batch prompt. Default: `3`.
    pub adjective_count: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
            batch_size: BATCH_SIZE,
            adjective_count: ADJECTIVES_PER_BATCH,
        }
    }
}

/// Bind the server and run it on a Tokio task.
///
/// Returns the bound address; with port `0` this is the port the OS picked.
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(
    generator: Arc<dyn Generator>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let state = api::AppState {
        generator,
        batch_size: config.batch_size,
        adjective_count: config.adjective_count,
    };
    let router = server::build_router(state, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
