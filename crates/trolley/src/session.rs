//! Quiz session state machine.
//!
//! [`Session`] owns the queue of fetched problems and the cursor into it.
//! All transitions are plain methods that mutate the session and return the
//! [`Effect`]s the caller must carry out (start a fetch, restart or cancel the
//! typewriter). Nothing here touches the network, timers, or a UI framework.
//!
//! ```text
//!            start/retry            fetch_succeeded
//!  Loading ──────────────▶ (in flight) ──────────────▶ Ready
//!     ▲                        │                        │ choose
//!     │ next (exhausted)       │ fetch_failed           ▼
//!     └────────────────────────┼──────────────── Question ⇄ Estimate
//!                              ▼                   next
//!                            Error ──retry──▶ (in flight)
//! ```
//!
//! A single `in_flight` flag guards against overlapping fetches: every path
//! that wants a fetch goes through [`Session::begin_fetch`], which emits
//! [`Effect::Fetch`] at most once until the fetch completes.

use crate::error::FetchError;
use crate::item::{Agreement, BatchItem, Choice};

/// Prefetch when fewer than this many unseen items follow the current one.
pub const PREFETCH_LOW_WATER: usize = 2;

/// When to request the next batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PrefetchPolicy {
    /// Fetch ahead once the queue is nearly empty, hiding latency.
    #[default]
    Eager,
    /// Fetch only after the last item has been answered.
    OnExhaust,
}

/// Fetch status of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    Error(FetchError),
}

/// Which half of a problem is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The question is shown and the user has not answered yet.
    Question,
    /// The user answered; the agreement estimate is shown.
    Estimate(Choice),
}

/// Side effects requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Request a new batch. Report the outcome with
    /// [`Session::fetch_succeeded`] or [`Session::fetch_failed`].
    Fetch,
    /// Start revealing `text`; report completion with
    /// [`Session::reveal_finished`] and the same `epoch`.
    StartReveal { epoch: u64, text: String },
    /// Stop any running reveal.
    CancelReveal,
}

/// What the presentation layer should draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View<'a> {
    Loading,
    Error {
        message: &'static str,
    },
    Empty,
    Question {
        item: &'a BatchItem,
        revealed: bool,
    },
    Estimate {
        item: &'a BatchItem,
        choice: Choice,
        agreement: Agreement,
    },
}

/// One quiz session: a queue of problems plus cursor, phase and fetch state.
#[derive(Clone, Debug)]
pub struct Session {
    batch: Vec<BatchItem>,
    cursor: usize,
    status: Status,
    phase: Phase,
    in_flight: bool,
    revealed: bool,
    reveal_epoch: u64,
    prefetch: PrefetchPolicy,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PrefetchPolicy::default())
    }
}

impl Session {
    pub fn new(prefetch: PrefetchPolicy) -> Self {
        Self {
            batch: Vec::new(),
            cursor: 0,
            status: Status::Loading,
            phase: Phase::Question,
            in_flight: false,
            revealed: false,
            reveal_epoch: 0,
            prefetch,
        }
    }

    // ── Accessors ──

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn batch(&self) -> &[BatchItem] {
        &self.batch
    }

    pub fn current(&self) -> Option<&BatchItem> {
        self.batch.get(self.cursor)
    }

    /// Unseen items queued after the current one.
    pub fn remaining(&self) -> usize {
        self.batch.len().saturating_sub(self.cursor + 1)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn reveal_epoch(&self) -> u64 {
        self.reveal_epoch
    }

    pub fn prefetch(&self) -> PrefetchPolicy {
        self.prefetch
    }

    pub fn view(&self) -> View<'_> {
        if let Status::Error(ref err) = self.status {
            return View::Error {
                message: err.user_message(),
            };
        }
        match (self.current(), self.phase) {
            (None, _) if self.in_flight || self.status == Status::Loading => View::Loading,
            (None, _) => View::Empty,
            (Some(item), Phase::Question) => View::Question {
                item,
                revealed: self.revealed,
            },
            (Some(item), Phase::Estimate(choice)) => View::Estimate {
                item,
                choice,
                agreement: item.agreement(choice),
            },
        }
    }

    // ── Transitions ──

    /// Kick off the first fetch.
    pub fn start(&mut self) -> Vec<Effect> {
        self.begin_fetch()
    }

    /// Request a batch unless one is already in flight.
    pub fn begin_fetch(&mut self) -> Vec<Effect> {
        if self.in_flight {
            return Vec::new();
        }
        self.in_flight = true;
        self.status = Status::Loading;
        vec![Effect::Fetch]
    }

    /// Manual "try again" after an error.
    pub fn retry(&mut self) -> Vec<Effect> {
        self.begin_fetch()
    }

    /// Merge a freshly parsed batch into the queue.
    ///
    /// Items before the cursor have been shown and are dropped; the current
    /// and unseen items are kept ahead of the new ones, so whatever is on
    /// screen stays on screen.
    pub fn fetch_succeeded(&mut self, items: Vec<BatchItem>) -> Vec<Effect> {
        self.in_flight = false;
        if items.is_empty() {
            self.status = Status::Error(FetchError::Unparseable);
            return Vec::new();
        }

        let had_current = self.current().is_some();
        let shown = self.cursor.min(self.batch.len());
        self.batch.drain(..shown);
        self.batch.extend(items);
        self.cursor = 0;
        self.status = Status::Ready;

        if had_current {
            Vec::new()
        } else {
            self.phase = Phase::Question;
            self.restart_reveal()
        }
    }

    pub fn fetch_failed(&mut self, err: FetchError) -> Vec<Effect> {
        self.in_flight = false;
        self.status = Status::Error(err);
        Vec::new()
    }

    /// A reveal finished. Stale epochs (from a cancelled reveal) are ignored.
    ///
    /// Returns whether the completion was accepted.
    pub fn reveal_finished(&mut self, epoch: u64) -> bool {
        if epoch != self.reveal_epoch || self.current().is_none() {
            return false;
        }
        self.revealed = true;
        true
    }

    /// Answer the current question.
    pub fn choose(&mut self, choice: Choice) -> Vec<Effect> {
        if self.phase != Phase::Question
            || self.current().is_none()
            || matches!(self.status, Status::Error(_))
        {
            return Vec::new();
        }
        self.phase = Phase::Estimate(choice);
        // The question stays fully visible in the estimate phase.
        self.revealed = true;
        self.reveal_epoch += 1;
        vec![Effect::CancelReveal]
    }

    /// Move to the next problem, fetching more when the queue runs low.
    pub fn next(&mut self) -> Vec<Effect> {
        if self.current().is_none() || matches!(self.status, Status::Error(_)) {
            return Vec::new();
        }
        self.phase = Phase::Question;

        if self.cursor + 1 < self.batch.len() {
            self.cursor += 1;
            let mut effects = self.restart_reveal();
            if self.prefetch == PrefetchPolicy::Eager && self.remaining() < PREFETCH_LOW_WATER {
                effects.extend(self.begin_fetch());
            }
            effects
        } else {
            self.cursor = self.batch.len();
            let mut effects = self.restart_reveal();
            effects.extend(self.begin_fetch());
            effects
        }
    }

    fn restart_reveal(&mut self) -> Vec<Effect> {
        self.reveal_epoch += 1;
        self.revealed = false;
        match (self.current(), self.phase) {
            (Some(item), Phase::Question) => vec![Effect::StartReveal {
                epoch: self.reveal_epoch,
                text: item.question.clone(),
            }],
            _ => vec![Effect::CancelReveal],
        }
    }
}
