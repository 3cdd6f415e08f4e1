//! Key handling for the quiz TUI.
//!
//! Keys are translated into [`Action`]s against a [`KeyContext`] read from
//! the shared state, so the mapping itself never locks anything.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use trolley::Action;
use trolley::QuizState;
use trolley::item::Choice;
use trolley::session::{Phase, Status};

use crate::app::App;

/// The parts of the quiz state that decide what a key does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KeyContext {
    pub(crate) phase: Phase,
    pub(crate) has_item: bool,
    pub(crate) revealed: bool,
    pub(crate) error: bool,
}

impl KeyContext {
    pub(crate) fn from_state(state: &QuizState) -> Self {
        let session = &state.session;
        Self {
            phase: session.phase(),
            has_item: session.current().is_some(),
            revealed: session.is_revealed(),
            error: matches!(session.status(), Status::Error(_)),
        }
    }

    /// Answer buttons are live: a question is fully shown and unanswered.
    pub(crate) fn can_choose(&self) -> bool {
        self.has_item && self.revealed && !self.error && self.phase == Phase::Question
    }
}

/// Update `app` for `key` and return the action to dispatch, if any.
pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App, ctx: KeyContext) -> Option<Action> {
    // Ctrl+C always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return None;
    }
    app.status_message = None;

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            None
        }
        KeyCode::Char(',') => {
            app.show_logs = !app.show_logs;
            app.log_scroll = 0;
            None
        }
        KeyCode::Up | KeyCode::Char('k') if app.show_logs => {
            app.log_scroll = app.log_scroll.saturating_add(3);
            None
        }
        KeyCode::Down | KeyCode::Char('j') if app.show_logs => {
            app.log_scroll = app.log_scroll.saturating_sub(3);
            None
        }
        KeyCode::PageUp if app.show_logs => {
            app.log_scroll = app.log_scroll.saturating_add(20);
            None
        }
        KeyCode::PageDown if app.show_logs => {
            app.log_scroll = app.log_scroll.saturating_sub(20);
            None
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h' | 'l') => {
            app.toggle_hovered();
            None
        }
        KeyCode::Char('1') => choose(app, ctx, Choice::ALL[0]),
        KeyCode::Char('2') => choose(app, ctx, Choice::ALL[1]),
        KeyCode::Enter | KeyCode::Char(' ') => match ctx.phase {
            Phase::Question => {
                let hovered = app.hovered;
                choose(app, ctx, hovered)
            }
            Phase::Estimate(_) => next(ctx),
        },
        KeyCode::Char('n') => next(ctx),
        KeyCode::Char('r') if ctx.error => Some(Action::Retry),
        _ => None,
    }
}

fn choose(app: &mut App, ctx: KeyContext, choice: Choice) -> Option<Action> {
    if !ctx.can_choose() {
        if ctx.has_item && !ctx.revealed && ctx.phase == Phase::Question {
            app.status_message = Some("Let the question finish first.".into());
        }
        return None;
    }
    app.hovered = choice;
    Some(Action::Choose(choice))
}

fn next(ctx: KeyContext) -> Option<Action> {
    (ctx.has_item && !ctx.error && matches!(ctx.phase, Phase::Estimate(_))).then_some(Action::Next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn question(revealed: bool) -> KeyContext {
        KeyContext {
            phase: Phase::Question,
            has_item: true,
            revealed,
            error: false,
        }
    }

    fn estimate() -> KeyContext {
        KeyContext {
            phase: Phase::Estimate(Choice::PressLever),
            ..question(true)
        }
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = App::new();
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ev, &mut app, question(true)), None);
        assert!(app.should_quit);
    }

    #[test]
    fn choices_wait_for_reveal() {
        let mut app = App::new();
        assert_eq!(
            handle_key_event(key(KeyCode::Char('2')), &mut app, question(false)),
            None
        );
        assert!(app.status_message.is_some());
        assert_eq!(
            handle_key_event(key(KeyCode::Char('2')), &mut app, question(true)),
            Some(Action::Choose(Choice::ALL[1]))
        );
    }

    #[test]
    fn enter_picks_hovered_then_advances() {
        let mut app = App::new();
        handle_key_event(key(KeyCode::Right), &mut app, question(true));
        assert_eq!(app.hovered, Choice::ALL[1]);
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), &mut app, question(true)),
            Some(Action::Choose(Choice::ALL[1]))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), &mut app, estimate()),
            Some(Action::Next)
        );
    }

    #[test]
    fn next_requires_an_answer() {
        let mut app = App::new();
        assert_eq!(
            handle_key_event(key(KeyCode::Char('n')), &mut app, question(true)),
            None
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('n')), &mut app, estimate()),
            Some(Action::Next)
        );
    }

    #[test]
    fn retry_only_after_error() {
        let mut app = App::new();
        assert_eq!(
            handle_key_event(key(KeyCode::Char('r')), &mut app, question(true)),
            None
        );
        let failed = KeyContext {
            error: true,
            has_item: false,
            ..question(false)
        };
        assert_eq!(
            handle_key_event(key(KeyCode::Char('r')), &mut app, failed),
            Some(Action::Retry)
        );
    }

    #[test]
    fn log_scroll_only_when_visible() {
        let mut app = App::new();
        handle_key_event(key(KeyCode::Up), &mut app, question(true));
        assert_eq!(app.log_scroll, 0);
        handle_key_event(key(KeyCode::Char(',')), &mut app, question(true));
        handle_key_event(key(KeyCode::Up), &mut app, question(true));
        assert_eq!(app.log_scroll, 3);
        handle_key_event(key(KeyCode::Down), &mut app, question(true));
        assert_eq!(app.log_scroll, 0);
    }
}
