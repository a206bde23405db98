use chrono::Local;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::ui::{theme, App, Focus, Grab};

pub fn render_items(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Items;
    let grabbed = matches!(app.grab, Some(Grab::Item { .. }));
    let today = Local::now().date_naive();

    let (title, rows) = match app.store.active_category() {
        Some(cat) => {
            let rows: Vec<ListItem> = cat
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let marker = if item.completed { "[x] " } else { "[ ] " };
                    let mut spans = vec![Span::raw(marker), Span::raw(item.content.clone())];
                    if let Some(due) = item.due_date {
                        let style = if item.is_overdue(today) {
                            theme::overdue_item()
                        } else {
                            Style::default().fg(theme::MUTED)
                        };
                        spans.push(Span::styled(format!("  due {}", due), style));
                    }
                    if item.notes.is_some() {
                        spans.push(Span::styled("  *", Style::default().fg(theme::MUTED)));
                    }

                    let style = if i == app.item_index && grabbed {
                        theme::grabbed_row()
                    } else if i == app.item_index && focused {
                        theme::selected_row()
                    } else if item.completed {
                        theme::completed_item()
                    } else {
                        Style::default()
                    };
                    ListItem::new(Line::from(spans)).style(style)
                })
                .collect();

            let suffix = if grabbed { " [moving]" } else { "" };
            (format!(" {} {}{} ", cat.icon, cat.name, suffix), rows)
        }
        None => (
            " No categories ".to_string(),
            vec![ListItem::new("Press n to create a category")],
        ),
    };

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(focused))
            .title(Span::styled(title, theme::panel_title(focused))),
    );

    let mut state = ListState::default();
    state.select(Some(app.item_index));
    f.render_stateful_widget(list, area, &mut state);
}
