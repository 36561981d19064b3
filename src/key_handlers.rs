use crate::{app::App, constants::SUGGESTIONS};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Send(String),
    DismissError,
    Quit,
}

/// Maps a key press onto the app. Returns the action the caller must
/// forward to the controller, if any.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<UiAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(UiAction::Quit)
        }
        KeyCode::Esc => {
            return if app.view.error.is_some() {
                Some(UiAction::DismissError)
            } else {
                Some(UiAction::Quit)
            };
        }
        KeyCode::PageUp => {
            app.scroll_up();
            return None;
        }
        KeyCode::PageDown => {
            app.scroll_down();
            return None;
        }
        _ => {}
    }

    // Input is disabled while busy or without a session.
    if !app.input_enabled() {
        return None;
    }

    match key.code {
        KeyCode::Up if app.view.shows_suggestions() => app.select_previous_suggestion(),
        KeyCode::Down if app.view.shows_suggestions() => app.select_next_suggestion(),
        KeyCode::Enter => {
            let text = if !app.input.trim().is_empty() {
                std::mem::take(&mut app.input)
            } else if app.view.shows_suggestions() {
                SUGGESTIONS[app.selected_suggestion].1.to_string()
            } else {
                return None;
            };
            app.pending = true;
            return Some(UiAction::Send(text));
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.push(c);
        }
        _ => {}
    }
    None
}
