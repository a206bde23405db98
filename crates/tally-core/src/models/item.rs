use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single task/entry in a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Item {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: format!("item-{}", Uuid::new_v4()),
            content: content.into(),
            completed: false,
            due_date: None,
            notes: None,
        }
    }

    pub fn with_details(
        content: impl Into<String>,
        due_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Self {
        Self {
            due_date,
            notes: notes.filter(|n| !n.trim().is_empty()),
            ..Self::new(content)
        }
    }

    /// Whether the item is due strictly before the given date and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|d| d < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_ignores_completed() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let mut item = Item::with_details(
            "return library books",
            NaiveDate::from_ymd_opt(2026, 3, 1),
            None,
        );
        assert!(item.is_overdue(today));
        item.completed = true;
        assert!(!item.is_overdue(today));
    }

    #[test]
    fn test_blank_notes_dropped() {
        let item = Item::with_details("milk", None, Some("   ".to_string()));
        assert!(item.notes.is_none());
    }
}
