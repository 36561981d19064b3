use crate::{
    app::App,
    chat_message::{ChatMessage, Role},
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

pub fn draw_messages(f: &mut Frame<'_>, area: Rect, app: &App) {
    let mut lines = Vec::new();
    for message in &app.view.messages {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.extend(message_lines(message, area.width));
    }

    let scroll = scroll_offset(lines.len(), area.height, app.scroll_from_bottom);
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

/// Top line to show so the view sits `from_bottom` lines above the end.
/// Line counts past `u16::MAX` are clamped.
pub fn scroll_offset(total_lines: usize, height: u16, from_bottom: u16) -> u16 {
    let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);
    total_lines
        .saturating_sub(height)
        .saturating_sub(from_bottom)
}

/// Lays out one entry: user turns on the right, model turns on the left,
/// system notices centered in red.
pub fn message_lines(message: &ChatMessage, width: u16) -> Vec<Line<'static>> {
    let bubble_width = (width as usize * 3 / 4).max(10);

    let (label, alignment, style) = match message.role {
        Role::User => ("Tú", Alignment::Right, Style::default().fg(Color::Rgb(255, 223, 128))),
        Role::Model => (
            "Asistente",
            Alignment::Left,
            Style::default().fg(Color::Rgb(144, 238, 144)),
        ),
        Role::System => ("", Alignment::Center, Style::default().fg(Color::Red)),
    };

    let mut lines = Vec::new();
    if !label.is_empty() {
        lines.push(
            Line::from(Span::styled(
                label,
                style.add_modifier(Modifier::BOLD),
            ))
            .alignment(alignment),
        );
    }

    for paragraph in message.text.split('\n') {
        if paragraph.is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for chunk in wrap(paragraph, bubble_width) {
            lines.push(Line::from(Span::styled(chunk.into_owned(), style)).alignment(alignment));
        }
    }

    lines
}

pub fn draw_input(f: &mut Frame<'_>, area: Rect, app: &App) {
    let enabled = app.input_enabled();
    let (text, style) = if app.input.is_empty() {
        (app.placeholder().to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (app.input.clone(), Style::default().fg(Color::White))
    };

    let border_color = if enabled { Color::LightBlue } else { Color::DarkGray };
    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(input, area);

    if enabled {
        let inner_width = area.width.saturating_sub(2);
        let x = area.x + 1 + (app.input.width() as u16).min(inner_width.saturating_sub(1));
        f.set_cursor_position((x, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_message_has_label_and_wraps() {
        let message = ChatMessage::model("uno dos tres cuatro cinco seis siete ocho");
        let lines = message_lines(&message, 20);

        assert_eq!(lines[0].to_string(), "Asistente");
        assert!(lines.len() > 2);
        assert!(lines.iter().skip(1).all(|l| l.width() <= 15));
    }

    #[test]
    fn test_system_message_has_no_label() {
        let lines = message_lines(&ChatMessage::system("Error"), 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].alignment, Some(Alignment::Center));
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(5, 10, 0), 0);
        assert_eq!(scroll_offset(30, 10, 0), 20);
        assert_eq!(scroll_offset(30, 10, 5), 15);
        assert_eq!(scroll_offset(30, 10, 50), 0);
    }

    #[test]
    fn test_scroll_offset_clamps_long_sessions() {
        assert_eq!(scroll_offset(70_000, 10, 0), u16::MAX - 10);
        assert_eq!(scroll_offset(65_546, 10, 0), u16::MAX - 10);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let lines = message_lines(&ChatMessage::user("a\n\nb"), 80);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
    }
}
