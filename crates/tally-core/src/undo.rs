use std::time::{Duration, Instant};

use crate::constants::UNDO_EXPIRY;
use crate::models::{Category, Item};

/// One reversible mutation. Each variant carries exactly what the store
/// needs to invert the operation once: prior values and prior indices.
#[derive(Debug, Clone)]
pub enum UndoAction {
    ItemAdded {
        category_id: String,
        item_id: String,
    },
    ItemUpdated {
        category_id: String,
        index: usize,
        prior: Item,
    },
    ItemDeleted {
        category_id: String,
        index: usize,
        item: Item,
    },
    ItemToggled {
        category_id: String,
        item_id: String,
    },
    ItemMoved {
        category_id: String,
        from: usize,
        to: usize,
    },
    CategoryCreated {
        category_id: String,
    },
    CategoryRenamed {
        category_id: String,
        prior_name: String,
    },
    CategoryDeleted {
        index: usize,
        category: Category,
    },
    CategoryMoved {
        from: usize,
        to: usize,
    },
    CategoriesMerged {
        source_index: usize,
        /// The source category as it was, items included.
        source: Category,
        /// Ids of the items appended to the destination, for removal on undo.
        moved_ids: Vec<String>,
        destination_id: String,
    },
    CompletedCleared {
        /// (category_id, prior index, item) for every removed item.
        removed: Vec<(String, usize, Item)>,
    },
}

impl UndoAction {
    /// Short human label for the status line ("Undid: add item" etc.).
    pub fn label(&self) -> &'static str {
        match self {
            UndoAction::ItemAdded { .. } => "add item",
            UndoAction::ItemUpdated { .. } => "edit item",
            UndoAction::ItemDeleted { .. } => "delete item",
            UndoAction::ItemToggled { .. } => "toggle item",
            UndoAction::ItemMoved { .. } => "move item",
            UndoAction::CategoryCreated { .. } => "create category",
            UndoAction::CategoryRenamed { .. } => "rename category",
            UndoAction::CategoryDeleted { .. } => "delete category",
            UndoAction::CategoryMoved { .. } => "move category",
            UndoAction::CategoriesMerged { .. } => "merge categories",
            UndoAction::CompletedCleared { .. } => "clear completed",
        }
    }
}

/// Holds at most one undoable action. Recording replaces the previous one
/// (most-recent-wins); the action expires unconditionally after
/// `UNDO_EXPIRY` and an expired action can never be taken.
#[derive(Debug, Default)]
pub struct UndoSlot {
    slot: Option<(UndoAction, Instant)>,
}

impl UndoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: UndoAction) {
        self.slot = Some((action, Instant::now()));
    }

    /// Take the pending action if it hasn't expired. Clears the slot
    /// either way.
    pub fn take(&mut self) -> Option<UndoAction> {
        let (action, recorded_at) = self.slot.take()?;
        if recorded_at.elapsed() >= UNDO_EXPIRY {
            return None;
        }
        Some(action)
    }

    /// Clear the slot if the recorded action has outlived the expiry.
    /// Called from the UI tick so the hint disappears on time.
    pub fn expire(&mut self) {
        self.expire_after(UNDO_EXPIRY);
    }

    fn expire_after(&mut self, ttl: Duration) {
        if let Some((_, recorded_at)) = self.slot {
            if recorded_at.elapsed() >= ttl {
                self.slot = None;
            }
        }
    }

    pub fn peek(&self) -> Option<&UndoAction> {
        self.slot.as_ref().map(|(a, _)| a)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> UndoAction {
        UndoAction::ItemAdded {
            category_id: "cat".to_string(),
            item_id: id.to_string(),
        }
    }

    fn item_id(a: &UndoAction) -> &str {
        match a {
            UndoAction::ItemAdded { item_id, .. } => item_id,
            _ => panic!("unexpected variant"),
        }
    }

    #[test]
    fn test_most_recent_wins() {
        let mut slot = UndoSlot::new();
        slot.record(action("first"));
        slot.record(action("second"));
        let taken = slot.take().expect("action available");
        assert_eq!(item_id(&taken), "second");
        assert!(slot.is_empty());
    }

    #[test]
    fn test_take_clears_slot() {
        let mut slot = UndoSlot::new();
        slot.record(action("only"));
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_expiry_clears_action() {
        let mut slot = UndoSlot::new();
        slot.record(action("stale"));
        slot.expire_after(Duration::ZERO);
        assert!(slot.is_empty());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_fresh_action_survives_expire() {
        let mut slot = UndoSlot::new();
        slot.record(action("fresh"));
        slot.expire();
        assert!(!slot.is_empty());
    }
}
