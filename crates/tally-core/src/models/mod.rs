pub mod category;
pub mod chat;
pub mod item;

pub use category::Category;
pub use chat::{ChatMessage, Sender};
pub use item::Item;

/// Current Unix timestamp in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
