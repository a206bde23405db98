use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Cyan;
pub const MUTED: Color = Color::DarkGray;
pub const WARNING: Color = Color::Yellow;
pub const DANGER: Color = Color::Red;

pub fn panel_title(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn panel_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn selected_row() -> Style {
    Style::default()
        .bg(Color::Rgb(45, 50, 60))
        .add_modifier(Modifier::BOLD)
}

/// Highlight for the row being carried in grab (reorder) mode.
pub fn grabbed_row() -> Style {
    Style::default()
        .bg(Color::Rgb(70, 60, 30))
        .fg(WARNING)
        .add_modifier(Modifier::BOLD)
}

pub fn completed_item() -> Style {
    Style::default()
        .fg(MUTED)
        .add_modifier(Modifier::CROSSED_OUT)
}

pub fn overdue_item() -> Style {
    Style::default().fg(DANGER)
}
