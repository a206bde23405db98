use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::constants::CHAT_HISTORY_LIMIT;
use crate::models::{category::default_categories, Category, ChatMessage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {name}: {source}")]
    Read {
        name: &'static str,
        source: std::io::Error,
    },
    #[error("Failed to parse {name}: {source}")]
    Parse {
        name: &'static str,
        source: serde_json::Error,
    },
    #[error("Failed to save {name}: {message}")]
    Write { name: &'static str, message: String },
}

/// Whole-collection JSON blobs keyed by file name in the data dir.
/// Each collection is written in full on every save; a missing file is
/// not an error, and an unreadable one falls back to the built-in
/// default with the error kept around for the UI to surface.
pub struct ListStorage {
    data_dir: PathBuf,
    last_error: Option<StorageError>,
}

const CATEGORIES_FILE: &str = "categories.json";
const CHAT_FILE: &str = "chat.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// UI state worth keeping across runs.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Preferences {
    /// Id of the category that was active when the app last ran.
    #[serde(default)]
    pub active_category_id: Option<String>,
    /// Whether spoken replies are enabled.
    #[serde(default)]
    pub speak_replies: bool,
}

impl ListStorage {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(&data_dir) {
            warn!(dir = %data_dir.display(), error = %e, "could not create data dir");
        }
        Self {
            data_dir,
            last_error: None,
        }
    }

    /// Load the category collection, falling back to the seed set when the
    /// file is missing or unreadable.
    pub fn load_categories(&mut self) -> Vec<Category> {
        match self.load(CATEGORIES_FILE) {
            Ok(Some(categories)) => categories,
            Ok(None) => default_categories(),
            Err(e) => {
                warn!(error = %e, "falling back to default categories");
                self.last_error = Some(e);
                default_categories()
            }
        }
    }

    pub fn save_categories(&mut self, categories: &[Category]) -> Result<(), StorageError> {
        self.save(CATEGORIES_FILE, &categories)
    }

    /// Load the chat transcript; an empty transcript on any failure.
    pub fn load_chat(&mut self) -> Vec<ChatMessage> {
        match self.load(CHAT_FILE) {
            Ok(Some(messages)) => messages,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "starting with an empty transcript");
                self.last_error = Some(e);
                Vec::new()
            }
        }
    }

    /// Persist the transcript, keeping only the trailing window.
    pub fn save_chat(&mut self, messages: &[ChatMessage]) -> Result<(), StorageError> {
        let start = messages.len().saturating_sub(CHAT_HISTORY_LIMIT);
        self.save(CHAT_FILE, &&messages[start..])
    }

    pub fn load_preferences(&mut self) -> Preferences {
        match self.load(PREFERENCES_FILE) {
            Ok(Some(prefs)) => prefs,
            Ok(None) => Preferences::default(),
            Err(e) => {
                self.last_error = Some(e);
                Preferences::default()
            }
        }
    }

    pub fn save_preferences(&mut self, prefs: &Preferences) -> Result<(), StorageError> {
        self.save(PREFERENCES_FILE, prefs)
    }

    /// Last load/save error, for surfacing in the status line.
    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn load<T: DeserializeOwned>(&self, name: &'static str) -> Result<Option<T>, StorageError> {
        let path = self.data_dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| StorageError::Parse { name, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { name, source }),
        }
    }

    fn save<T: Serialize>(&mut self, name: &'static str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::Write {
            name,
            message: e.to_string(),
        })?;

        // Write to a temp file then rename so a crash mid-write never
        // truncates the collection.
        let path = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!(".{}.tmp", name));
        if let Err(e) = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, &path)) {
            warn!(name, error = %e, "save failed, keeping in-memory state");
            self.last_error = Some(StorageError::Write {
                name,
                message: e.to_string(),
            });
            return Err(StorageError::Write {
                name,
                message: e.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;

    #[test]
    fn test_missing_files_are_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ListStorage::new(dir.path());
        let categories = storage.load_categories();
        assert_eq!(categories.len(), default_categories().len());
        assert!(storage.load_chat().is_empty());
        assert!(storage.last_error().is_none());
    }

    #[test]
    fn test_categories_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ListStorage::new(dir.path());

        let mut categories = default_categories();
        categories[0].items.push(Item::new("buy stamps"));
        storage.save_categories(&categories).unwrap();

        let mut reloaded_storage = ListStorage::new(dir.path());
        let reloaded = reloaded_storage.load_categories();
        assert_eq!(reloaded.len(), categories.len());
        assert_eq!(reloaded[0].items[0].content, "buy stamps");
        assert_eq!(reloaded[0].items[0].id, categories[0].items[0].id);
    }

    #[test]
    fn test_corrupt_file_falls_back_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATEGORIES_FILE), "{not json").unwrap();

        let mut storage = ListStorage::new(dir.path());
        let categories = storage.load_categories();
        assert_eq!(categories.len(), default_categories().len());
        assert!(matches!(
            storage.last_error(),
            Some(StorageError::Parse { .. })
        ));
    }

    #[test]
    fn test_chat_truncated_to_history_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ListStorage::new(dir.path());

        let messages: Vec<ChatMessage> = (0..CHAT_HISTORY_LIMIT + 25)
            .map(|i| ChatMessage::user(format!("msg {}", i)))
            .collect();
        storage.save_chat(&messages).unwrap();

        let reloaded = ListStorage::new(dir.path()).load_chat();
        assert_eq!(reloaded.len(), CHAT_HISTORY_LIMIT);
        assert_eq!(reloaded[0].text, "msg 25");
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ListStorage::new(dir.path());
        let prefs = Preferences {
            active_category_id: Some("cat-1".to_string()),
            speak_replies: true,
        };
        storage.save_preferences(&prefs).unwrap();

        let reloaded = ListStorage::new(dir.path()).load_preferences();
        assert_eq!(reloaded.active_category_id.as_deref(), Some("cat-1"));
        assert!(reloaded.speak_replies);
    }
}
