pub mod list_store;
pub mod storage;

pub use list_store::ListStore;
pub use storage::{ListStorage, Preferences, StorageError};
