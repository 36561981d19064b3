use crate::constants::{INPUT_PLACEHOLDER, SUGGESTIONS, WAITING_PLACEHOLDER};
use crate::conversation::ConversationView;
use crate::status_indicator::StatusIndicator;

/// Terminal-side state. The conversation itself lives in the controller
/// task; `view` is its latest snapshot.
pub struct App {
    pub view: ConversationView,
    pub input: String,
    /// Lines scrolled up from the bottom of the message list.
    pub scroll_from_bottom: u16,
    pub selected_suggestion: usize,
    pub status_indicator: StatusIndicator,
    /// A submitted message the controller has not picked up yet.
    pub pending: bool,
}

impl App {
    pub fn new(view: ConversationView) -> App {
        let mut app = App {
            view: view.clone(),
            input: String::new(),
            scroll_from_bottom: 0,
            selected_suggestion: 0,
            status_indicator: StatusIndicator::new(),
            pending: false,
        };
        app.apply_view(view);
        app
    }

    pub fn apply_view(&mut self, view: ConversationView) {
        if view.messages.len() != self.view.messages.len() {
            self.scroll_from_bottom = 0;
        }
        if view.state != self.view.state || view.messages.len() != self.view.messages.len() {
            self.pending = false;
        }
        self.status_indicator.set_thinking(view.is_busy());
        if view.is_busy() {
            self.status_indicator.set_status(WAITING_PLACEHOLDER);
        } else {
            self.status_indicator.clear_status();
        }
        self.view = view;
    }

    pub fn input_enabled(&self) -> bool {
        self.view.input_enabled() && !self.pending
    }

    pub fn placeholder(&self) -> &'static str {
        if self.view.is_busy() || self.pending {
            WAITING_PLACEHOLDER
        } else {
            INPUT_PLACEHOLDER
        }
    }

    pub fn select_next_suggestion(&mut self) {
        self.selected_suggestion = (self.selected_suggestion + 1) % SUGGESTIONS.len();
    }

    pub fn select_previous_suggestion(&mut self) {
        self.selected_suggestion =
            (self.selected_suggestion + SUGGESTIONS.len() - 1) % SUGGESTIONS.len();
    }

    pub fn scroll_up(&mut self) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(3);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(3);
    }
}
