use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Item;

/// A named, ordered group of items with an icon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "Category::default_icon")]
    pub icon: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Category {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: format!("cat-{}", Uuid::new_v4()),
            name: name.into(),
            icon: icon.into(),
            items: Vec::new(),
        }
    }

    fn default_icon() -> String {
        "•".to_string()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Case-insensitive lookup by item content (first match wins).
    pub fn find_item_by_name(&self, name: &str) -> Option<&Item> {
        let needle = name.trim().to_lowercase();
        self.items
            .iter()
            .find(|i| i.content.to_lowercase() == needle)
    }

    pub fn open_count(&self) -> usize {
        self.items.iter().filter(|i| !i.completed).count()
    }
}

/// The seed collection used on first run or when the stored file is unreadable.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("To-Do", "✓"),
        Category::new("Shopping", "🛒"),
        Category::new("Watch-list", "🎬"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_item_by_name_case_insensitive() {
        let mut cat = Category::new("Shopping", "🛒");
        cat.items.push(Item::new("Olive Oil"));
        assert!(cat.find_item_by_name("olive oil").is_some());
        assert!(cat.find_item_by_name("  OLIVE OIL ").is_some());
        assert!(cat.find_item_by_name("olive").is_none());
    }

    #[test]
    fn test_open_count() {
        let mut cat = Category::new("To-Do", "✓");
        cat.items.push(Item::new("a"));
        let mut done = Item::new("b");
        done.completed = true;
        cat.items.push(done);
        assert_eq!(cat.open_count(), 1);
    }
}
