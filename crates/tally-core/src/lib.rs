pub mod ai;
pub mod config;
pub mod constants;
pub mod models;
pub mod speech;
pub mod store;
pub mod tracing_setup;
pub mod undo;

pub use config::CoreConfig;
pub use store::{ListStore, StorageError};
pub use undo::{UndoAction, UndoSlot};
