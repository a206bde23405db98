use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

use tally_core::ai::{parse_command, system_prompt, Interpreter, LlmClient};
use tally_core::constants::{APOLOGY_REPLY, CHAT_CONTEXT_WINDOW, OFFLINE_REPLY};
use tally_core::models::{Category, ChatMessage, Item};
use tally_core::speech::{record_clip, SpeechPlayer, SpeechRecognizer, SpeechSynthesizer};
use tally_core::store::{ListStorage, Preferences};
use tally_core::{CoreConfig, ListStore, UndoSlot};

/// How long a voice capture runs before it's sent for transcription.
const RECORD_DURATION: Duration = Duration::from_secs(4);

/// How long status-line messages stay visible.
const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Categories,
    Items,
    Chat,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Categories => Focus::Items,
            Focus::Items => Focus::Chat,
            Focus::Chat => Focus::Categories,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Categories => Focus::Chat,
            Focus::Items => Focus::Categories,
            Focus::Chat => Focus::Items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// What the shared input buffer is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    NewItem,
    EditItem { item_id: String },
    NewCategory,
    RenameCategory { category_id: String },
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    None,
    /// Direct-UI counterpart of the assistant's two-step delete flow.
    ConfirmDeleteCategory {
        category_id: String,
        name: String,
        item_count: usize,
    },
    /// Destination picker for merging the source category away.
    MergePicker { source_id: String, selected: usize },
}

impl ModalState {
    pub fn is_none(&self) -> bool {
        matches!(self, ModalState::None)
    }
}

/// Grab-and-move reordering state: which row is being carried and where
/// it started, so the drop records one cumulative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    Item { origin: usize },
    Category { origin: usize },
}

/// Results coming back from spawned tasks, applied on the event loop.
#[derive(Debug)]
pub enum TaskResult {
    /// Raw model output (or a user-facing error) for one assistant turn.
    AiTurn(Result<String, String>),
    /// Transcribed voice input.
    Transcription(Result<String, String>),
    /// Synthesized MP3 for the latest spoken reply.
    SpokenReply(Result<Vec<u8>, String>),
}

pub struct App {
    pub running: bool,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub input: String,
    pub cursor_position: usize,
    pub edit_target: Option<EditTarget>,
    pub modal: ModalState,
    pub grab: Option<Grab>,

    pub store: ListStore,
    pub undo: UndoSlot,
    interpreter: Interpreter,
    storage: ListStorage,

    pub chat: Vec<ChatMessage>,
    /// Selection index in the item panel, clamped to the active category.
    pub item_index: usize,
    /// Scroll offset in the chat history, counted in lines from the bottom.
    pub chat_scroll: usize,

    pub pending_quit: bool,
    pub ai_busy: bool,
    pub recording: bool,
    pub speak_replies: bool,
    pub player: SpeechPlayer,

    pub config: CoreConfig,
    task_tx: Option<Sender<TaskResult>>,
    status: Option<(String, Instant)>,
}

impl App {
    pub fn new(config: CoreConfig) -> Self {
        let mut storage = ListStorage::new(&config.data_dir);
        let categories = storage.load_categories();
        let chat = storage.load_chat();
        let prefs = storage.load_preferences();

        let mut store = ListStore::new(categories);
        // Without a stored preference, keep the store's own pick (the
        // first category); passing None through would clear it.
        if prefs.active_category_id.is_some() {
            store.set_active_category(prefs.active_category_id.clone());
        }

        let mut app = Self {
            running: true,
            focus: Focus::Items,
            input_mode: InputMode::Normal,
            input: String::new(),
            cursor_position: 0,
            edit_target: None,
            modal: ModalState::None,
            grab: None,
            store,
            undo: UndoSlot::new(),
            interpreter: Interpreter::new(),
            storage,
            chat,
            item_index: 0,
            chat_scroll: 0,
            pending_quit: false,
            ai_busy: false,
            recording: false,
            speak_replies: prefs.speak_replies,
            player: SpeechPlayer::new(),
            config,
            task_tx: None,
            status: None,
        };

        if let Some(error) = app.storage.last_error().map(|e| e.to_string()) {
            app.set_status(&format!("Storage warning: {}", error));
            app.storage.clear_error();
        }
        app
    }

    pub fn set_task_tx(&mut self, tx: Sender<TaskResult>) {
        self.task_tx = Some(tx);
    }

    pub fn quit(&mut self) {
        self.persist_preferences();
        self.running = false;
    }

    // ===== Status line =====

    pub fn set_status(&mut self, message: &str) {
        self.status = Some((message.to_string(), Instant::now()));
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Per-tick housekeeping: expire the undo slot and stale status text.
    pub fn tick(&mut self) {
        self.undo.expire();
        if self
            .status
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= STATUS_TTL)
        {
            self.status = None;
        }
    }

    // ===== Selection =====

    /// Index of the active category in the panel, or 0 when none.
    pub fn category_index(&self) -> usize {
        self.store
            .active_category_id()
            .and_then(|id| self.store.category_index(id))
            .unwrap_or(0)
    }

    pub fn select_category_offset(&mut self, delta: isize) {
        let len = self.store.categories().len();
        if len == 0 {
            return;
        }
        let current = self.category_index() as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        let id = self.store.categories()[next].id.clone();
        self.store.set_active_category(Some(id));
        self.clamp_item_index();
        self.persist_preferences();
    }

    pub fn select_item_offset(&mut self, delta: isize) {
        let len = self.active_item_count();
        if len == 0 {
            return;
        }
        let next = (self.item_index as isize + delta).clamp(0, len as isize - 1);
        self.item_index = next as usize;
    }

    pub fn active_item_count(&self) -> usize {
        self.store
            .active_category()
            .map(|c| c.items.len())
            .unwrap_or(0)
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.store
            .active_category()
            .and_then(|c| c.items.get(self.item_index))
    }

    pub fn clamp_item_index(&mut self) {
        let len = self.active_item_count();
        if len == 0 {
            self.item_index = 0;
        } else if self.item_index >= len {
            self.item_index = len - 1;
        }
    }

    // ===== Shared input buffer =====

    pub fn begin_edit(&mut self, target: EditTarget, initial: &str) {
        self.edit_target = Some(target);
        self.input = initial.to_string();
        self.cursor_position = self.input.chars().count();
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_edit(&mut self) {
        self.edit_target = None;
        self.input.clear();
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn enter_char(&mut self, c: char) {
        let byte_index = self.byte_index();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let remove_at = self.cursor_position - 1;
        self.input = self
            .input
            .chars()
            .enumerate()
            .filter(|(i, _)| *i != remove_at)
            .map(|(_, c)| c)
            .collect();
        self.cursor_position = remove_at;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let len = self.input.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(len);
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Apply the committed buffer according to its target.
    pub fn commit_edit(&mut self) {
        let Some(target) = self.edit_target.take() else {
            self.cancel_edit();
            return;
        };
        let text = self.input.trim().to_string();
        self.input.clear();
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;

        if text.is_empty() {
            return;
        }

        match target {
            EditTarget::NewItem => {
                let Some(cat_id) = self.store.active_category_id().map(String::from) else {
                    return;
                };
                if let Some(action) = self.store.add_item(&cat_id, Item::new(&*text)) {
                    self.undo.record(action);
                }
                self.item_index = self.active_item_count().saturating_sub(1);
                self.persist_categories();
            }
            EditTarget::EditItem { item_id } => {
                let Some(cat_id) = self.store.active_category_id().map(String::from) else {
                    return;
                };
                let Some(mut updated) = self
                    .store
                    .category(&cat_id)
                    .and_then(|c| c.find_item(&item_id))
                    .cloned()
                else {
                    return;
                };
                updated.content = text;
                if let Some(action) = self.store.update_item(&cat_id, &item_id, updated) {
                    self.undo.record(action);
                }
                self.persist_categories();
            }
            EditTarget::NewCategory => {
                let action = self.store.create_category(Category::new(&*text, "•"));
                self.undo.record(action);
                self.persist_categories();
            }
            EditTarget::RenameCategory { category_id } => {
                if let Some(action) = self.store.rename_category(&category_id, &text) {
                    self.undo.record(action);
                }
                self.persist_categories();
            }
            EditTarget::Chat => {
                self.send_chat_message(text);
            }
        }
    }

    // ===== Direct item mutations =====

    pub fn toggle_selected_item(&mut self) {
        let Some((cat_id, item_id)) = self.selected_ids() else {
            return;
        };
        if let Some(action) = self.store.toggle_item(&cat_id, &item_id) {
            self.undo.record(action);
            self.persist_categories();
        }
    }

    pub fn delete_selected_item(&mut self) {
        let Some((cat_id, item_id)) = self.selected_ids() else {
            return;
        };
        if let Some(action) = self.store.delete_item(&cat_id, &item_id) {
            self.undo.record(action);
            self.clamp_item_index();
            self.persist_categories();
            self.set_status("Item deleted - press u to undo");
        }
    }

    pub fn clear_completed_in_active(&mut self) {
        let scope = self.store.active_category_id().map(String::from);
        match self.store.clear_completed(scope.as_deref()) {
            Some(action) => {
                self.undo.record(action);
                self.clamp_item_index();
                self.persist_categories();
                self.set_status("Cleared completed items - press u to undo");
            }
            None => self.set_status("No completed items to clear"),
        }
    }

    fn selected_ids(&self) -> Option<(String, String)> {
        let cat = self.store.active_category()?;
        let item = cat.items.get(self.item_index)?;
        Some((cat.id.clone(), item.id.clone()))
    }

    // ===== Category mutations =====

    /// Delete the active category: empty ones go immediately, non-empty
    /// ones open the confirmation modal first.
    pub fn request_delete_active_category(&mut self) {
        let Some(cat) = self.store.active_category() else {
            return;
        };
        let (id, name, count) = (cat.id.clone(), cat.name.clone(), cat.items.len());

        if count == 0 {
            if let Some(action) = self.store.delete_category(&id) {
                self.undo.record(action);
                self.clamp_item_index();
                self.persist_categories();
                self.set_status(&format!("Deleted {} - press u to undo", name));
            }
            return;
        }
        self.modal = ModalState::ConfirmDeleteCategory {
            category_id: id,
            name,
            item_count: count,
        };
    }

    pub fn confirm_delete_category(&mut self) {
        let ModalState::ConfirmDeleteCategory {
            category_id, name, ..
        } = std::mem::replace(&mut self.modal, ModalState::None)
        else {
            return;
        };
        if let Some(action) = self.store.delete_category(&category_id) {
            self.undo.record(action);
            self.clamp_item_index();
            self.persist_categories();
            self.set_status(&format!("Deleted {} - press u to undo", name));
        }
    }

    pub fn open_merge_picker(&mut self) {
        let Some(source) = self.store.active_category() else {
            return;
        };
        if self.store.categories().len() < 2 {
            self.set_status("Nothing to merge into - only one category");
            return;
        }
        self.modal = ModalState::MergePicker {
            source_id: source.id.clone(),
            selected: 0,
        };
    }

    /// Destination candidates for the merge picker (everything but the
    /// source).
    pub fn merge_candidates(&self, source_id: &str) -> Vec<&Category> {
        self.store
            .categories()
            .iter()
            .filter(|c| c.id != source_id)
            .collect()
    }

    pub fn confirm_merge(&mut self) {
        let ModalState::MergePicker {
            source_id,
            selected,
        } = std::mem::replace(&mut self.modal, ModalState::None)
        else {
            return;
        };
        let Some(dest) = self.merge_candidates(&source_id).get(selected).copied() else {
            return;
        };
        let (dest_id, dest_name) = (dest.id.clone(), dest.name.clone());
        if let Some(action) = self.store.merge_categories(&source_id, &dest_id) {
            self.undo.record(action);
            self.clamp_item_index();
            self.persist_categories();
            self.set_status(&format!("Merged into {} - press u to undo", dest_name));
        }
    }

    // ===== Grab-and-move reordering =====

    pub fn start_grab(&mut self) {
        match self.focus {
            Focus::Items => {
                if self.selected_item().is_some() {
                    self.grab = Some(Grab::Item {
                        origin: self.item_index,
                    });
                }
            }
            Focus::Categories => {
                if !self.store.categories().is_empty() {
                    self.grab = Some(Grab::Category {
                        origin: self.category_index(),
                    });
                }
            }
            Focus::Chat => {}
        }
    }

    /// Move the carried row. Intermediate per-step actions are discarded;
    /// the drop records one cumulative move.
    pub fn grab_move(&mut self, delta: isize) {
        match self.grab {
            Some(Grab::Item { .. }) => {
                let Some(cat_id) = self.store.active_category_id().map(String::from) else {
                    return;
                };
                let len = self.active_item_count();
                if len == 0 {
                    return;
                }
                let from = self.item_index;
                let to = (from as isize + delta).clamp(0, len as isize - 1) as usize;
                if self.store.move_item(&cat_id, from, to).is_some() {
                    self.item_index = to;
                }
            }
            Some(Grab::Category { .. }) => {
                let len = self.store.categories().len();
                if len == 0 {
                    return;
                }
                let from = self.category_index();
                let to = (from as isize + delta).clamp(0, len as isize - 1) as usize;
                // Moving the active category keeps it active; the id doesn't change.
                let _ = self.store.move_category(from, to);
            }
            None => {}
        }
    }

    /// Drop the carried row, recording the cumulative permutation as a
    /// single undoable action.
    pub fn drop_grab(&mut self) {
        match self.grab.take() {
            Some(Grab::Item { origin }) => {
                let current = self.item_index;
                if origin != current {
                    if let Some(cat_id) = self.store.active_category_id() {
                        self.undo.record(tally_core::UndoAction::ItemMoved {
                            category_id: cat_id.to_string(),
                            from: origin,
                            to: current,
                        });
                    }
                    self.persist_categories();
                }
            }
            Some(Grab::Category { origin }) => {
                let current = self.category_index();
                if origin != current {
                    self.undo.record(tally_core::UndoAction::CategoryMoved {
                        from: origin,
                        to: current,
                    });
                    self.persist_categories();
                }
            }
            None => {}
        }
    }

    // ===== Undo =====

    pub fn undo_last(&mut self) {
        let Some(action) = self.undo.take() else {
            self.set_status("Nothing to undo");
            return;
        };
        let label = action.label();
        if self.store.apply_undo(action) {
            self.clamp_item_index();
            self.persist_categories();
            self.set_status(&format!("Undid: {}", label));
        } else {
            warn!(label, "undo target vanished");
            self.set_status("Couldn't undo that anymore");
        }
    }

    // ===== Chat / AI turns =====

    pub fn send_chat_message(&mut self, text: String) {
        self.chat.push(ChatMessage::user(&*text));
        self.chat_scroll = 0;
        self.persist_chat();

        let Some(api_key) = self.config.llm_api_key.clone() else {
            self.push_assistant_reply(OFFLINE_REPLY.to_string());
            return;
        };
        let Some(tx) = self.task_tx.clone() else {
            return;
        };

        self.ai_busy = true;
        let client = LlmClient::new(api_key, self.config.llm_model.clone());
        let prompt = system_prompt(&self.store);
        let start = self.chat.len().saturating_sub(CHAT_CONTEXT_WINDOW);
        let transcript: Vec<ChatMessage> = self.chat[start..].to_vec();

        tokio::spawn(async move {
            let result = client
                .request_command(&prompt, &transcript)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::AiTurn(result)).await;
        });
    }

    /// Apply one task result on the event loop.
    pub fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::AiTurn(outcome) => {
                self.ai_busy = false;
                let reply = match outcome {
                    Ok(raw) => match parse_command(&raw) {
                        Ok(command) => {
                            let outcome =
                                self.interpreter
                                    .apply(command, &mut self.store, &mut self.undo);
                            if outcome.applied {
                                // The carried row may have just vanished.
                                self.grab = None;
                                self.clamp_item_index();
                                self.persist_categories();
                            }
                            outcome.reply
                        }
                        Err(e) => {
                            warn!(error = %e, "unparsable model response");
                            APOLOGY_REPLY.to_string()
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "assistant turn failed");
                        APOLOGY_REPLY.to_string()
                    }
                };
                self.push_assistant_reply(reply);
            }
            TaskResult::Transcription(outcome) => {
                self.recording = false;
                match outcome {
                    Ok(text) if !text.is_empty() => {
                        info!(text = %text, "voice input transcribed");
                        self.send_chat_message(text);
                    }
                    Ok(_) => self.set_status("Didn't catch that - try again"),
                    Err(e) => {
                        warn!(error = %e, "voice capture failed");
                        self.set_status("Voice input failed");
                    }
                }
            }
            TaskResult::SpokenReply(outcome) => match outcome {
                Ok(audio) => {
                    if let Err(e) = self.player.play(audio) {
                        warn!(error = %e, "playback failed");
                    }
                }
                Err(e) => warn!(error = %e, "speech synthesis failed"),
            },
        }
    }

    fn push_assistant_reply(&mut self, reply: String) {
        if self.speak_replies {
            self.speak(&reply);
        }
        self.chat.push(ChatMessage::assistant(reply));
        self.chat_scroll = 0;
        self.persist_chat();
    }

    // ===== Speech =====

    pub fn start_voice_capture(&mut self) {
        if self.recording {
            return;
        }
        let Some(api_key) = self.config.speech_api_key.clone() else {
            self.set_status("Voice input needs TALLY_ELEVENLABS_API_KEY");
            return;
        };
        let Some(tx) = self.task_tx.clone() else {
            return;
        };

        self.recording = true;
        self.set_status("Listening…");
        tokio::spawn(async move {
            let clip = tokio::task::spawn_blocking(move || record_clip(RECORD_DURATION))
                .await
                .map_err(|e| e.to_string())
                .and_then(|r| r.map_err(|e| e.to_string()));

            let result = match clip {
                Ok(clip) => SpeechRecognizer::new(api_key)
                    .transcribe(clip.wav_bytes)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            let _ = tx.send(TaskResult::Transcription(result)).await;
        });
    }

    pub fn toggle_speak_replies(&mut self) {
        self.speak_replies = !self.speak_replies;
        self.persist_preferences();
        self.set_status(if self.speak_replies {
            "Spoken replies on"
        } else {
            "Spoken replies off"
        });
    }

    fn speak(&mut self, text: &str) {
        let Some(api_key) = self.config.speech_api_key.clone() else {
            return;
        };
        let Some(tx) = self.task_tx.clone() else {
            return;
        };
        let synth = SpeechSynthesizer::new(api_key, self.config.voice_id.clone());
        let text = text.to_string();
        tokio::spawn(async move {
            let result = synth
                .text_to_speech(&text)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::SpokenReply(result)).await;
        });
    }

    // ===== Persistence =====

    pub fn persist_categories(&mut self) {
        if let Err(e) = self.storage.save_categories(self.store.categories()) {
            self.set_status(&format!("WARNING: {}", e));
        }
    }

    pub fn persist_chat(&mut self) {
        if let Err(e) = self.storage.save_chat(&self.chat) {
            self.set_status(&format!("WARNING: {}", e));
        }
    }

    pub fn persist_preferences(&mut self) {
        let prefs = Preferences {
            active_category_id: self.store.active_category_id().map(String::from),
            speak_replies: self.speak_replies,
        };
        if let Err(e) = self.storage.save_preferences(&prefs) {
            self.set_status(&format!("WARNING: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::new(dir.path());
        config.llm_api_key = None;
        config.speech_api_key = None;
        (App::new(config), dir)
    }

    fn add_items(app: &mut App, names: &[&str]) {
        let cat_id = app.store.active_category_id().unwrap().to_string();
        for name in names {
            app.store.add_item(&cat_id, Item::new(*name));
        }
    }

    #[test]
    fn test_fresh_start_selects_first_category() {
        let (app, _dir) = test_app();
        // No preferences file yet: the seeded first category is active.
        let active = app.store.active_category().expect("seed category active");
        assert_eq!(active.id, app.store.categories()[0].id);
    }

    #[test]
    fn test_stored_active_category_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::new(dir.path());
        config.llm_api_key = None;
        config.speech_api_key = None;

        let mut app = App::new(config.clone());
        app.persist_categories();
        app.select_category_offset(1);
        let chosen = app.store.active_category_id().unwrap().to_string();
        drop(app);

        let reopened = App::new(config);
        assert_eq!(reopened.store.active_category_id(), Some(chosen.as_str()));
    }

    #[test]
    fn test_grab_survives_category_emptied_by_assistant() {
        let (mut app, _dir) = test_app();
        add_items(&mut app, &["a", "b"]);
        app.focus = Focus::Items;
        app.start_grab();

        // An in-flight assistant turn merges the active category away
        // while the row is still being carried.
        let raw = r#"{"action": "merge_categories", "source": "To-Do", "destination": "Watch-list"}"#;
        app.handle_task_result(TaskResult::AiTurn(Ok(raw.to_string())));

        assert!(app.grab.is_none());
        // Moving after the mutation must be a no-op, not a panic.
        app.grab_move(1);
        app.drop_grab();
    }

    #[test]
    fn test_grab_move_on_empty_category_is_noop() {
        let (mut app, _dir) = test_app();
        app.grab = Some(Grab::Item { origin: 0 });
        app.grab_move(1);
        assert_eq!(app.item_index, 0);
    }

    #[test]
    fn test_grab_records_single_cumulative_move() {
        let (mut app, _dir) = test_app();
        add_items(&mut app, &["a", "b", "c", "d"]);

        app.focus = Focus::Items;
        app.item_index = 0;
        app.start_grab();
        app.grab_move(1);
        app.grab_move(1);
        app.grab_move(1);
        app.drop_grab();

        let cat = app.store.active_category().unwrap();
        let order: Vec<&str> = cat.items.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "d", "a"]);

        // One undo restores the original order in a single step.
        app.undo_last();
        let cat = app.store.active_category().unwrap();
        let order: Vec<&str> = cat.items.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_grab_without_net_movement_records_nothing() {
        let (mut app, _dir) = test_app();
        add_items(&mut app, &["a", "b"]);

        app.focus = Focus::Items;
        app.start_grab();
        app.grab_move(1);
        app.grab_move(-1);
        app.drop_grab();

        assert!(app.undo.is_empty());
    }

    #[test]
    fn test_offline_chat_gets_canned_reply() {
        let (mut app, _dir) = test_app();
        app.send_chat_message("add milk to shopping".to_string());

        assert_eq!(app.chat.len(), 2);
        assert_eq!(app.chat[1].text, OFFLINE_REPLY);
        assert!(!app.ai_busy);
    }

    #[test]
    fn test_delete_empty_category_skips_modal() {
        let (mut app, _dir) = test_app();
        let before = app.store.categories().len();

        app.request_delete_active_category();

        assert!(app.modal.is_none());
        assert_eq!(app.store.categories().len(), before - 1);
    }

    #[test]
    fn test_delete_nonempty_category_opens_modal() {
        let (mut app, _dir) = test_app();
        add_items(&mut app, &["keep me"]);
        let before = app.store.categories().len();

        app.request_delete_active_category();
        assert!(matches!(
            app.modal,
            ModalState::ConfirmDeleteCategory { .. }
        ));
        assert_eq!(app.store.categories().len(), before);

        app.confirm_delete_category();
        assert!(app.modal.is_none());
        assert_eq!(app.store.categories().len(), before - 1);
    }

    #[test]
    fn test_commit_new_item_selects_it() {
        let (mut app, _dir) = test_app();
        app.begin_edit(EditTarget::NewItem, "");
        for c in "buy stamps".chars() {
            app.enter_char(c);
        }
        app.commit_edit();

        assert_eq!(app.input_mode, InputMode::Normal);
        let cat = app.store.active_category().unwrap();
        assert_eq!(cat.items.len(), 1);
        assert_eq!(app.item_index, 0);
        assert!(!app.undo.is_empty());
    }

    #[test]
    fn test_unparsable_ai_response_degrades_to_apology() {
        let (mut app, _dir) = test_app();
        app.handle_task_result(TaskResult::AiTurn(Ok("not json at all".to_string())));

        assert_eq!(app.chat.last().unwrap().text, APOLOGY_REPLY);
    }

    #[test]
    fn test_ai_turn_applies_command() {
        let (mut app, _dir) = test_app();
        let raw = r#"{"action": "add_item", "category": "Shopping", "content": "milk"}"#;
        app.handle_task_result(TaskResult::AiTurn(Ok(raw.to_string())));

        let shopping = app.store.category_by_name("shopping").unwrap();
        assert!(shopping.find_item_by_name("milk").is_some());
        assert!(app.chat.last().unwrap().text.contains("milk"));
    }

    #[test]
    fn test_merge_candidates_exclude_source() {
        let (mut app, _dir) = test_app();
        let source_id = app.store.active_category_id().unwrap().to_string();
        let candidates = app.merge_candidates(&source_id);
        assert!(candidates.iter().all(|c| c.id != source_id));
        assert_eq!(candidates.len(), app.store.categories().len() - 1);
    }
}
