//! TUI-local state (not shared with the driver).

use trolley::Choice;

/// TUI-local state (not shared with the driver).
pub(crate) struct App {
    /// Choice highlighted in the button row.
    pub(crate) hovered: Choice,
    /// Whether the logs pane is visible (toggled with `,`).
    pub(crate) show_logs: bool,
    /// Offset from the bottom of the log (0 = follow tail).
    pub(crate) log_scroll: usize,
    /// Status messages shown temporarily at the bottom.
    pub(crate) status_message: Option<String>,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            hovered: Choice::ALL[0],
            show_logs: false,
            log_scroll: 0,
            status_message: None,
            should_quit: false,
        }
    }

    /// Move the highlight to the other button.
    pub(crate) fn toggle_hovered(&mut self) {
        self.hovered = match self.hovered {
            Choice::PressLever => Choice::DoNothing,
            Choice::DoNothing => Choice::PressLever,
        };
    }
}
