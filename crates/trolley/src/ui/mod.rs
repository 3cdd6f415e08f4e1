//! Shared quiz state for interactive frontends.
//!
//! ```text
//! Frontend ──Action──▶ dispatch ──▶ Session reducers ──Effect──▶ Driver
//!    ▲                                                             │
//!    └──────────── reads ── Arc<Mutex<QuizState>> ◀── writes ──────┘
//! ```
//!
//! The frontend never calls the network. It turns input into an [`Action`]
//! and calls [`dispatch`], which applies the matching session transition and
//! forwards the resulting effects to the [`Driver`](crate::driver::Driver).

pub mod tracing;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::item::Choice;
use crate::session::{Effect, PrefetchPolicy, Session};

/// Maximum log lines kept in memory.
pub const MAX_LOG_LINES: usize = 2000;
/// Trim to this many when the cap is exceeded.
pub const LOG_TRIM_TO: usize = 1200;

// ── Log Types ─────────────────────────────────────────────────────────

/// A single log line captured from tracing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

/// Log severity level (mirrors tracing levels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short fixed-width label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

// ── QuizState ─────────────────────────────────────────────────────────

/// Typewriter output for one reveal epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealText {
    pub epoch: u64,
    pub visible: String,
}

/// Quiz state shared between the driver and a frontend.
pub struct QuizState {
    pub session: Session,
    /// Latest typewriter output. Only meaningful while its epoch matches
    /// the session's.
    pub reveal: RevealText,
    /// Adjectives used for the most recent batch request.
    pub adjectives: Vec<String>,
    /// Backend and model label for the status bar.
    pub backend: String,
    /// Problems answered so far.
    pub answered: u32,
    pub logs: Vec<LogLine>,
    /// The frontend sets this to `true` when the user requests quit.
    pub quit_requested: bool,
}

impl QuizState {
    pub fn new(prefetch: PrefetchPolicy) -> Self {
        Self {
            session: Session::new(prefetch),
            reveal: RevealText::default(),
            adjectives: Vec::new(),
            backend: String::new(),
            answered: 0,
            logs: Vec::new(),
            quit_requested: false,
        }
    }

    /// The part of the current question that should be on screen.
    pub fn visible_question(&self) -> &str {
        if self.reveal.epoch == self.session.reveal_epoch() {
            &self.reveal.visible
        } else {
            ""
        }
    }
}

impl Default for QuizState {
    fn default() -> Self {
        Self::new(PrefetchPolicy::default())
    }
}

/// User intent, produced by a frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Start,
    Choose(Choice),
    Next,
    Retry,
}

/// Apply `action` to the shared session and forward the resulting effects.
///
/// The state lock is held only while the transition runs. Returns the
/// number of effects forwarded.
pub fn dispatch(
    state: &Arc<Mutex<QuizState>>,
    action: Action,
    effects: &UnboundedSender<Effect>,
) -> usize {
    let produced = {
        let Ok(mut s) = state.lock() else {
            return 0;
        };
        let produced = match action {
            Action::Start => s.session.start(),
            Action::Choose(choice) => s.session.choose(choice),
            Action::Next => s.session.next(),
            Action::Retry => s.session.retry(),
        };
        if matches!(action, Action::Choose(_)) && !produced.is_empty() {
            s.answered += 1;
        }
        produced
    };
    forward(produced, effects)
}

/// Send effects to the driver, returning how many were delivered.
pub(crate) fn forward(produced: Vec<Effect>, effects: &UnboundedSender<Effect>) -> usize {
    produced
        .into_iter()
        .filter(|e| effects.send(e.clone()).is_ok())
        .count()
}
