//! Character-by-character text reveal.
//!
//! [`Typewriter`] is the pure reveal state. [`RevealHandle`] drives one on a
//! tokio task at a fixed speed and can be cancelled at any time; the flag is
//! checked before every step, so a cancelled reveal never emits again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default delay between revealed characters.
pub const DEFAULT_SPEED: Duration = Duration::from_millis(18);

/// Reveal progress over a fixed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Typewriter {
    text: String,
    /// Number of characters (not bytes) currently visible.
    shown: usize,
    total: usize,
}

impl Typewriter {
    /// Start a reveal. The first character is visible immediately.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let total = text.chars().count();
        Self {
            text,
            shown: total.min(1),
            total,
        }
    }

    /// Reveal one more character. Returns `false` once everything is shown.
    pub fn tick(&mut self) -> bool {
        if self.shown < self.total {
            self.shown += 1;
            true
        } else {
            false
        }
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.total
    }

    /// The currently visible prefix.
    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.shown) {
            Some((byte, _)) => self.text.get(..byte).unwrap_or(&self.text),
            None => &self.text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A running reveal. Dropping the handle cancels it.
#[derive(Debug)]
pub struct RevealHandle {
    cancelled: Arc<AtomicBool>,
}

impl RevealHandle {
    /// Spawn a reveal of `text` on the current tokio runtime.
    ///
    /// `on_step` receives the visible prefix after every step and whether the
    /// reveal is complete. It is called at least once, immediately, and never
    /// after [`cancel`](Self::cancel).
    pub fn spawn<F>(text: impl Into<String>, speed: Duration, mut on_step: F) -> Self
    where
        F: FnMut(&str, bool) + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let mut typewriter = Typewriter::new(text);

        tokio::spawn(async move {
            loop {
                if flag.load(Ordering::Acquire) {
                    return;
                }
                let done = typewriter.is_done();
                on_step(typewriter.visible(), done);
                if done {
                    return;
                }
                tokio::time::sleep(speed).await;
                typewriter.tick();
            }
        });

        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
