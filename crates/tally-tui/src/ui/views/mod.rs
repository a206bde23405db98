mod categories;
mod chat;
mod items;

pub use categories::render_categories;
pub use chat::render_chat;
pub use items::render_items;
