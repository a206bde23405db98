use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::ui::{theme, App, Focus, Grab};

pub fn render_categories(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Categories;
    let active_index = app.category_index();
    let grabbed = matches!(app.grab, Some(Grab::Category { .. }));

    let rows: Vec<ListItem> = app
        .store
        .categories()
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            let open = cat.open_count();
            let count = if open > 0 {
                format!(" ({})", open)
            } else {
                String::new()
            };
            let line = Line::from(vec![
                Span::raw(format!("{} ", cat.icon)),
                Span::raw(cat.name.clone()),
                Span::styled(count, Style::default().fg(theme::MUTED)),
            ]);
            let style = if i == active_index && grabbed {
                theme::grabbed_row()
            } else if i == active_index {
                theme::selected_row()
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = if grabbed {
        " Categories [moving] "
    } else {
        " Categories "
    };
    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(focused))
            .title(Span::styled(title, theme::panel_title(focused))),
    );

    let mut state = ListState::default();
    state.select(Some(active_index));
    f.render_stateful_widget(list, area, &mut state);
}
