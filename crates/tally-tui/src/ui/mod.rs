pub mod app;
pub mod terminal;
pub mod theme;
pub mod views;

pub use app::{App, EditTarget, Focus, Grab, InputMode, ModalState, TaskResult};
pub use terminal::{init, restore, Tui};
