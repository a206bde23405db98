use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::ui::views::{render_categories, render_chat, render_items};
use crate::ui::{theme, App, EditTarget, Focus, InputMode, ModalState};

pub(crate) fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(f.area());

    let panels = Layout::horizontal([
        Constraint::Percentage(22),
        Constraint::Percentage(38),
        Constraint::Percentage(40),
    ])
    .split(chunks[0]);

    render_categories(f, app, panels[0]);
    render_items(f, app, panels[1]);
    render_chat(f, app, panels[2]);

    render_footer(f, app, chunks[1]);
    render_statusbar(f, app, chunks[2]);

    match &app.modal {
        ModalState::ConfirmDeleteCategory {
            name, item_count, ..
        } => render_confirm_delete(f, name, *item_count),
        ModalState::MergePicker {
            source_id,
            selected,
        } => render_merge_picker(f, app, source_id, *selected),
        ModalState::None => {}
    }
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    if app.input_mode == InputMode::Editing {
        let title = match &app.edit_target {
            Some(EditTarget::NewItem) => " New item ",
            Some(EditTarget::EditItem { .. }) => " Edit item ",
            Some(EditTarget::NewCategory) => " New category ",
            Some(EditTarget::RenameCategory { .. }) => " Rename category ",
            Some(EditTarget::Chat) | None => " Message ",
        };
        let input = Paragraph::new(app.input.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::panel_border(true))
                .title(Span::styled(title, theme::panel_title(true))),
        );
        f.render_widget(input, area);
        f.set_cursor_position((
            area.x + 1 + app.cursor_position as u16,
            area.y + 1,
        ));
        return;
    }

    let hints = match app.focus {
        Focus::Categories => "n new  r rename  d delete  m merge  g grab  Tab focus  q quit",
        Focus::Items => {
            "a add  e edit  space toggle  d delete  g grab  c clear done  u undo  Tab focus  q quit"
        }
        Focus::Chat => "i type  Ctrl+R voice  s speak on/off  j/k scroll  Tab focus  q quit",
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(theme::MUTED),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::MUTED)),
    );
    f.render_widget(footer, area);
}

fn render_statusbar(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.pending_quit {
        Span::styled(
            " Press Ctrl+C again to quit ",
            Style::default()
                .fg(theme::DANGER)
                .add_modifier(Modifier::BOLD),
        )
    } else if let Some(status) = app.status_line() {
        Span::styled(format!(" {} ", status), Style::default().fg(theme::WARNING))
    } else if let Some(action) = app.undo.peek() {
        Span::styled(
            format!(" u: undo {} ", action.label()),
            Style::default().fg(theme::MUTED),
        )
    } else {
        Span::raw("")
    };
    f.render_widget(Paragraph::new(Line::from(text)), area);
}

fn render_confirm_delete(f: &mut Frame, name: &str, item_count: usize) {
    let area = centered_rect(46, 6, f.area());
    f.render_widget(Clear, area);

    let body = vec![
        Line::default(),
        Line::from(format!(
            "\"{}\" still has {} item(s).",
            name, item_count
        )),
        Line::from("Delete it anyway?"),
        Line::default(),
        Line::from(Span::styled(
            "y delete    n / Esc keep",
            Style::default().fg(theme::MUTED),
        )),
    ];
    let modal = Paragraph::new(body)
        .centered()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::DANGER))
                .title(Span::styled(
                    " Delete category ",
                    Style::default()
                        .fg(theme::DANGER)
                        .add_modifier(Modifier::BOLD),
                )),
        );
    f.render_widget(modal, area);
}

fn render_merge_picker(f: &mut Frame, app: &App, source_id: &str, selected: usize) {
    let candidates = app.merge_candidates(source_id);
    let height = (candidates.len() as u16 + 4).min(f.area().height);
    let area = centered_rect(40, height, f.area());
    f.render_widget(Clear, area);

    let rows: Vec<ListItem> = candidates
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            let style = if i == selected {
                theme::selected_row()
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {}", cat.icon, cat.name)).style(style)
        })
        .collect();

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(true))
            .title(Span::styled(" Merge into ", theme::panel_title(true))),
    );
    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
