//! Terminal quiz for absurd trolley problems.
//!
//! Renders a shared [`QuizState`] with ratatui + crossterm on a dedicated OS
//! thread and turns key presses into [`Action`](trolley::Action)s. All
//! network and timer work happens in the [`Driver`](trolley::Driver) on the
//! tokio runtime; the TUI only dispatches and draws.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::{Arc, Mutex};
//! use trolley::{Action, Driver, QuizConfig, QuizState, dispatch};
//! use trolley_tui::{TuiConfig, spawn_tui};
//!
//! let config = QuizConfig::default();
//! let state = Arc::new(Mutex::new(QuizState::new(config.prefetch)));
//! let (driver, effects) = Driver::new(state.clone(), config.build_generator()?, config);
//! tokio::spawn(driver.run());
//! dispatch(&state, Action::Start, &effects);
//! spawn_tui(state, effects, TuiConfig::default()).join().unwrap();
//! ```

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{cursor, execute};
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use trolley::session::Effect;
use trolley::ui::tracing::LogBuffer;
use trolley::{QuizState, dispatch};

mod app;
mod input;
mod render;

pub use render::{agreement_bar, log_level_style};

use app::App;
use input::{KeyContext, handle_key_event};
use render::render;

/// Frame interval; also bounds how long a key press waits to be seen.
const FRAME: Duration = Duration::from_millis(30);

/// Configuration for the TUI.
#[derive(Default)]
pub struct TuiConfig {
    /// Optional log buffer from the tracing layer.
    ///
    /// When set, the TUI drains pending log lines from this buffer once
    /// per frame and merges them into `QuizState::logs`, so logging never
    /// contends with the render lock.
    pub log_buffer: Option<LogBuffer>,
}

/// Spawn the TUI on a dedicated OS thread.
///
/// The TUI runs until the user quits or `quit_requested` is set.
pub fn spawn_tui(
    state: Arc<Mutex<QuizState>>,
    effects: UnboundedSender<Effect>,
    config: TuiConfig,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_tui(state, &effects, &config) {
            eprintln!("TUI error: {e}");
        }
    })
}

/// Run the TUI event loop (blocking). Call this from a dedicated OS thread.
pub fn run_tui(
    state: Arc<Mutex<QuizState>>,
    effects: &UnboundedSender<Effect>,
    config: &TuiConfig,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new();

    let result = event_loop(&mut terminal, &mut app, &state, effects, config);

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    state: &Arc<Mutex<QuizState>>,
    effects: &UnboundedSender<Effect>,
    config: &TuiConfig,
) -> io::Result<()> {
    loop {
        let quit = state.lock().map(|s| s.quit_requested).unwrap_or(true);
        if app.should_quit || quit {
            if let Ok(mut s) = state.lock() {
                s.quit_requested = true;
            }
            // Wake the driver so it sees the flag.
            let _ = effects.send(Effect::CancelReveal);
            return Ok(());
        }

        if let Some(ref log_buf) = config.log_buffer {
            log_buf.flush_into(state);
        }

        terminal.draw(|frame| render(frame, state, app))?;

        if event::poll(FRAME)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ctx = match state.lock() {
                Ok(s) => KeyContext::from_state(&s),
                Err(_) => continue,
            };
            if let Some(action) = handle_key_event(key, app, ctx) {
                let sent = dispatch(state, action, effects);
                debug!(?action, effects = sent, "dispatched");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn quit_flag_ends_loop_and_wakes_driver() {
        let state = Arc::new(Mutex::new(QuizState::default()));
        state.lock().unwrap().quit_requested = true;
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let mut app = App::new();

        event_loop(&mut terminal, &mut app, &state, &tx, &TuiConfig::default()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Effect::CancelReveal);
    }

    #[test]
    fn app_defaults() {
        let app = App::new();
        assert!(!app.should_quit);
        assert!(!app.show_logs);
        assert!(app.status_message.is_none());
        assert_eq!(app.log_scroll, 0);
    }
}
