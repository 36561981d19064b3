use crate::{
    app::App,
    constants::{SUGGESTIONS, SUGGESTIONS_HEADING},
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Rows needed by `draw_suggestions`: heading plus one per suggestion.
pub const SUGGESTIONS_HEIGHT: u16 = SUGGESTIONS.len() as u16 + 1;

pub fn draw_suggestions(f: &mut Frame<'_>, area: Rect, app: &App) {
    let mut lines = vec![Line::styled(
        SUGGESTIONS_HEADING,
        Style::default().fg(Color::Gray),
    )];

    for (idx, (label, _)) in SUGGESTIONS.iter().enumerate() {
        let style = if idx == app.selected_suggestion {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::LightBlue)
        };
        lines.push(Line::from(Span::styled(format!(" {} ", label), style)));
    }

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}
