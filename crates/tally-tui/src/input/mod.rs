//! Keyboard event processing. Routes keys by modal state first, then
//! input mode, then grab mode, then the focused panel.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::{App, EditTarget, Focus, InputMode, ModalState};

pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    let code = key.code;
    let modifiers = key.modifiers;

    if !app.modal.is_none() {
        handle_modal_key(app, code);
        return Ok(());
    }

    if app.input_mode == InputMode::Editing {
        handle_editing_key(app, code, modifiers);
        return Ok(());
    }

    if app.grab.is_some() {
        handle_grab_key(app, code);
        return Ok(());
    }

    // Global voice capture hotkey.
    if code == KeyCode::Char('r') && modifiers.contains(KeyModifiers::CONTROL) {
        app.start_voice_capture();
        return Ok(());
    }

    match code {
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('u') => app.undo_last(),
        KeyCode::Char('s') => app.toggle_speak_replies(),
        _ => match app.focus {
            Focus::Categories => handle_categories_key(app, code),
            Focus::Items => handle_items_key(app, code),
            Focus::Chat => handle_chat_key(app, code),
        },
    }
    Ok(())
}

fn handle_modal_key(app: &mut App, code: KeyCode) {
    match app.modal.clone() {
        ModalState::ConfirmDeleteCategory { .. } => match code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_delete_category(),
            KeyCode::Char('n') | KeyCode::Esc => app.modal = ModalState::None,
            _ => {}
        },
        ModalState::MergePicker {
            source_id,
            selected,
        } => match code {
            KeyCode::Char('j') | KeyCode::Down => {
                let max = app.merge_candidates(&source_id).len().saturating_sub(1);
                app.modal = ModalState::MergePicker {
                    source_id,
                    selected: (selected + 1).min(max),
                };
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.modal = ModalState::MergePicker {
                    source_id,
                    selected: selected.saturating_sub(1),
                };
            }
            KeyCode::Enter => app.confirm_merge(),
            KeyCode::Esc => app.modal = ModalState::None,
            _ => {}
        },
        ModalState::None => {}
    }
}

fn handle_editing_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => app.enter_char(c),
        _ => {}
    }
}

fn handle_grab_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.grab_move(1),
        KeyCode::Char('k') | KeyCode::Up => app.grab_move(-1),
        // Drop in place; the cumulative move (if any) becomes undoable.
        KeyCode::Char('g') | KeyCode::Enter | KeyCode::Esc => app.drop_grab(),
        _ => {}
    }
}

fn handle_categories_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.select_category_offset(1),
        KeyCode::Char('k') | KeyCode::Up => app.select_category_offset(-1),
        KeyCode::Char('n') => app.begin_edit(EditTarget::NewCategory, ""),
        KeyCode::Char('r') => {
            if let Some(cat) = app.store.active_category() {
                let (id, name) = (cat.id.clone(), cat.name.clone());
                app.begin_edit(EditTarget::RenameCategory { category_id: id }, &name);
            }
        }
        KeyCode::Char('d') => app.request_delete_active_category(),
        KeyCode::Char('m') => app.open_merge_picker(),
        KeyCode::Char('g') => app.start_grab(),
        KeyCode::Enter => app.focus = Focus::Items,
        _ => {}
    }
}

fn handle_items_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.select_item_offset(1),
        KeyCode::Char('k') | KeyCode::Up => app.select_item_offset(-1),
        KeyCode::Char('a') => app.begin_edit(EditTarget::NewItem, ""),
        KeyCode::Char('e') => {
            if let Some(item) = app.selected_item() {
                let (id, content) = (item.id.clone(), item.content.clone());
                app.begin_edit(EditTarget::EditItem { item_id: id }, &content);
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_item(),
        KeyCode::Char('d') => app.delete_selected_item(),
        KeyCode::Char('c') => app.clear_completed_in_active(),
        KeyCode::Char('g') => app.start_grab(),
        KeyCode::Char('h') | KeyCode::Left => app.focus = Focus::Categories,
        KeyCode::Char('l') | KeyCode::Right => app.focus = Focus::Chat,
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('i') | KeyCode::Enter => app.begin_edit(EditTarget::Chat, ""),
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll = app.chat_scroll.saturating_sub(1),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll += 1,
        KeyCode::Char('G') => app.chat_scroll = 0,
        KeyCode::Char('h') | KeyCode::Left => app.focus = Focus::Items,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use tally_core::CoreConfig;

    fn test_app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::new(dir.path());
        config.llm_api_key = None;
        config.speech_api_key = None;
        (App::new(config), dir)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::from(code)).unwrap();
    }

    #[test]
    fn test_tab_cycles_focus() {
        let (mut app, _dir) = test_app();
        app.focus = Focus::Categories;
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Items);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Chat);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Categories);
    }

    #[test]
    fn test_escape_cancels_edit_without_changes() {
        let (mut app, _dir) = test_app();
        app.focus = Focus::Items;
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input_mode, InputMode::Editing);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.store.active_category().unwrap().items.len(), 0);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_modal_n_keeps_category() {
        let (mut app, _dir) = test_app();
        let cat_id = app.store.active_category_id().unwrap().to_string();
        app.store
            .add_item(&cat_id, tally_core::models::Item::new("x"));
        let before = app.store.categories().len();

        app.focus = Focus::Categories;
        press(&mut app, KeyCode::Char('d'));
        assert!(!app.modal.is_none());
        press(&mut app, KeyCode::Char('n'));

        assert!(app.modal.is_none());
        assert_eq!(app.store.categories().len(), before);
    }

    #[test]
    fn test_grab_swallows_panel_keys_until_drop() {
        let (mut app, _dir) = test_app();
        let cat_id = app.store.active_category_id().unwrap().to_string();
        app.store
            .add_item(&cat_id, tally_core::models::Item::new("a"));
        app.store
            .add_item(&cat_id, tally_core::models::Item::new("b"));
        app.focus = Focus::Items;

        press(&mut app, KeyCode::Char('g'));
        assert!(app.grab.is_some());
        // 'd' must not delete while carrying a row.
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.active_category().unwrap().items.len(), 2);

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert!(app.grab.is_none());
        let order: Vec<&str> = app
            .store
            .active_category()
            .unwrap()
            .items
            .iter()
            .map(|i| i.content.as_str())
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
