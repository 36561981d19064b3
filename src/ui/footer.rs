use crate::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};

/// Draws the error banner (when there is one) above the key help.
pub fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &App) {
    let mut lines = Vec::new();

    if let Some(error) = &app.view.error {
        lines.push(Line::styled(
            format!("{}  (Esc para cerrar)", error),
            Style::default().fg(Color::Red),
        ));
    }

    let instructions = if app.view.shows_suggestions() {
        "Enter envía · ↑/↓ elige una sugerencia · PgUp/PgDn desplaza · Ctrl+C sale"
    } else {
        "Enter envía · PgUp/PgDn desplaza · Esc o Ctrl+C sale"
    };
    lines.push(Line::styled(
        instructions,
        Style::default().fg(Color::LightCyan),
    ));

    let footer = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(footer, area);
}
