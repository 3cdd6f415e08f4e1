//! Effect executor.
//!
//! The session reducers only describe side effects. The [`Driver`] runs on
//! the tokio runtime and carries them out: batch fetches become spawned tasks
//! whose outcome is fed back into the session, and reveals become
//! [`RevealHandle`]s writing typewriter output into [`QuizState`].

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

use crate::client::Generator;
use crate::config::QuizConfig;
use crate::fetch::fetch_batch;
use crate::reveal::RevealHandle;
use crate::session::Effect;
use crate::ui::{QuizState, RevealText, forward};

pub struct Driver {
    state: Arc<Mutex<QuizState>>,
    generator: Arc<dyn Generator>,
    config: QuizConfig,
    effects_tx: UnboundedSender<Effect>,
    effects_rx: UnboundedReceiver<Effect>,
    reveal: Option<RevealHandle>,
}

impl Driver {
    /// Create a driver and the sender frontends pass to
    /// [`dispatch`](crate::ui::dispatch).
    pub fn new(
        state: Arc<Mutex<QuizState>>,
        generator: Arc<dyn Generator>,
        config: QuizConfig,
    ) -> (Self, UnboundedSender<Effect>) {
        let (effects_tx, effects_rx) = unbounded_channel();
        let driver = Self {
            state,
            generator,
            config,
            effects_tx: effects_tx.clone(),
            effects_rx,
            reveal: None,
        };
        (driver, effects_tx)
    }

    /// Execute effects until the frontend requests quit.
    pub async fn run(mut self) {
        while let Some(effect) = self.effects_rx.recv().await {
            self.handle(effect);
            if self.quit_requested() {
                break;
            }
        }
        self.reveal = None;
    }

    fn quit_requested(&self) -> bool {
        self.state.lock().map(|s| s.quit_requested).unwrap_or(true)
    }

    fn handle(&mut self, effect: Effect) {
        match effect {
            Effect::Fetch => self.spawn_fetch(),
            Effect::StartReveal { epoch, text } => {
                // Replacing the handle cancels the previous reveal.
                self.reveal = Some(self.spawn_reveal(epoch, text));
            }
            Effect::CancelReveal => self.reveal = None,
        }
    }

    fn spawn_fetch(&self) {
        let prompt = self.config.batch_prompt();
        debug!(adjectives = ?prompt.adjectives, size = prompt.size, "requesting batch");
        if let Ok(mut s) = self.state.lock() {
            s.adjectives = prompt.adjectives.clone();
        }

        let generator = Arc::clone(&self.generator);
        let state = Arc::clone(&self.state);
        let effects = self.effects_tx.clone();
        tokio::spawn(async move {
            let result = fetch_batch(generator.as_ref(), &prompt).await;
            let produced = {
                let Ok(mut s) = state.lock() else {
                    return;
                };
                match result {
                    Ok(items) => s.session.fetch_succeeded(items),
                    Err(err) => s.session.fetch_failed(err),
                }
            };
            forward(produced, &effects);
        });
    }

    fn spawn_reveal(&self, epoch: u64, text: String) -> RevealHandle {
        let state = Arc::clone(&self.state);
        RevealHandle::spawn(text, self.config.typewriter_speed, move |visible, done| {
            let Ok(mut s) = state.lock() else {
                return;
            };
            if s.session.reveal_epoch() != epoch {
                return;
            }
            s.reveal = RevealText {
                epoch,
                visible: visible.to_string(),
            };
            if done {
                s.session.reveal_finished(epoch);
            }
        })
    }
}
