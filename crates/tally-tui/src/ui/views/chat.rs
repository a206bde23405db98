use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use tally_core::models::Sender;

use crate::ui::{theme, App, Focus};

pub fn render_chat(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Chat;

    let title = if app.ai_busy {
        " Assistant [thinking…] "
    } else if app.recording {
        " Assistant [listening…] "
    } else {
        " Assistant "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(focused))
        .title(Span::styled(title, theme::panel_title(focused)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    for message in &app.chat {
        let (prefix, style) = match message.sender {
            Sender::User => ("you ", Style::default().add_modifier(Modifier::BOLD)),
            Sender::Assistant => (
                "tally ",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        let mut first = true;
        for wrapped in wrap_text(&message.text, width.saturating_sub(prefix.len()).max(1)) {
            if first {
                lines.push(Line::from(vec![
                    Span::styled(prefix, style),
                    Span::raw(wrapped),
                ]));
                first = false;
            } else {
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(prefix.len())),
                    Span::raw(wrapped),
                ]));
            }
        }
        lines.push(Line::default());
    }

    // Anchor to the bottom; chat_scroll counts lines back up.
    let visible = inner.height as usize;
    let total = lines.len();
    let max_scroll = total.saturating_sub(visible);
    let scroll = app.chat_scroll.min(max_scroll);
    let top = total.saturating_sub(visible + scroll);
    let window: Vec<Line> = lines.into_iter().skip(top).take(visible).collect();

    f.render_widget(Paragraph::new(window), inner);
}

/// Width-aware greedy wrap. Splits on whitespace; words wider than the
/// line are broken mid-word.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in text.lines() {
        let mut line = String::new();
        let mut line_width = 0usize;
        for word in raw_line.split_whitespace() {
            let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            let sep = if line.is_empty() { 0 } else { 1 };
            if line_width + sep + word_width <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += sep + word_width;
            } else if word_width > width {
                // Flush, then hard-break the long word.
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                for c in word.chars() {
                    let cw = c.width().unwrap_or(0);
                    if line_width + cw > width {
                        out.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push(c);
                    line_width += cw;
                }
            } else {
                out.push(std::mem::take(&mut line));
                line.push_str(word);
                line_width = word_width;
            }
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_line_untouched() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_breaks_on_word_boundary() {
        assert_eq!(
            wrap_text("add milk to the list", 8),
            vec!["add milk", "to the", "list"]
        );
    }

    #[test]
    fn test_wrap_hard_breaks_long_word() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_preserves_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }
}
