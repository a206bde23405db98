use chrono::NaiveDate;
use tracing::info;

use crate::models::{Category, Item};
use crate::store::ListStore;
use crate::undo::UndoSlot;

use super::AssistantCommand;

/// Result of applying one assistant command.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// What the assistant says back (also what gets spoken aloud).
    pub reply: String,
    /// Whether the store was mutated.
    pub applied: bool,
}

impl Outcome {
    fn mutated(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            applied: true,
        }
    }

    fn unchanged(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            applied: false,
        }
    }
}

/// Delete held back until the user confirms it.
#[derive(Debug, Clone)]
struct PendingDelete {
    category_id: String,
    category_name: String,
}

/// Applies structured commands to the store, one per user turn.
/// Category and item names are matched case-insensitively. Deleting a
/// non-empty category is a two-step flow: the first request parks a
/// `PendingDelete`, and only an explicit confirmation on the very next
/// turn finalizes it - any other command abandons it.
#[derive(Default)]
pub struct Interpreter {
    pending_delete: Option<PendingDelete>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a delete is waiting on user confirmation.
    pub fn has_pending_delete(&self) -> bool {
        self.pending_delete.is_some()
    }

    pub fn apply(
        &mut self,
        command: AssistantCommand,
        store: &mut ListStore,
        undo: &mut UndoSlot,
    ) -> Outcome {
        // Only an immediate confirmation keeps the pending delete alive.
        let pending = self.pending_delete.take();

        match command {
            AssistantCommand::AddItem {
                category,
                content,
                due_date,
                notes,
            } => {
                let Some(cat) = store.category_by_name(&category) else {
                    return self.unknown_category(&category, store);
                };
                let cat_id = cat.id.clone();
                let cat_name = cat.name.clone();
                let item = Item::with_details(content.trim(), parse_due_date(due_date), notes);
                let content = item.content.clone();
                if let Some(action) = store.add_item(&cat_id, item) {
                    undo.record(action);
                }
                Outcome::mutated(format!("Added \"{}\" to {}.", content, cat_name))
            }

            AssistantCommand::UpdateItem {
                category,
                item,
                content,
                completed,
                due_date,
                notes,
            } => {
                let Some(cat) = store.category_by_name(&category) else {
                    return self.unknown_category(&category, store);
                };
                let cat_id = cat.id.clone();
                let Some(existing) = cat.find_item_by_name(&item) else {
                    return Outcome::unchanged(format!(
                        "I couldn't find \"{}\" in {}.",
                        item, cat.name
                    ));
                };
                let item_id = existing.id.clone();

                let mut updated = existing.clone();
                if let Some(content) = content {
                    updated.content = content.trim().to_string();
                }
                if let Some(completed) = completed {
                    updated.completed = completed;
                }
                if due_date.is_some() {
                    updated.due_date = parse_due_date(due_date);
                }
                if let Some(notes) = notes {
                    updated.notes = Some(notes).filter(|n| !n.trim().is_empty());
                }
                let summary = updated.content.clone();

                if let Some(action) = store.update_item(&cat_id, &item_id, updated) {
                    undo.record(action);
                }
                Outcome::mutated(format!("Updated \"{}\".", summary))
            }

            AssistantCommand::DeleteItem { category, item } => {
                let Some(cat) = store.category_by_name(&category) else {
                    return self.unknown_category(&category, store);
                };
                let cat_id = cat.id.clone();
                let cat_name = cat.name.clone();
                let Some(existing) = cat.find_item_by_name(&item) else {
                    return Outcome::unchanged(format!(
                        "I couldn't find \"{}\" in {}.",
                        item, cat_name
                    ));
                };
                let item_id = existing.id.clone();
                let content = existing.content.clone();

                if let Some(action) = store.delete_item(&cat_id, &item_id) {
                    undo.record(action);
                }
                Outcome::mutated(format!("Removed \"{}\" from {}.", content, cat_name))
            }

            AssistantCommand::CreateCategory { name, icon } => {
                let name = name.trim().to_string();
                if store.category_by_name(&name).is_some() {
                    return Outcome::unchanged(format!(
                        "There's already a category called {}.",
                        name
                    ));
                }
                let category =
                    Category::new(name.clone(), icon.unwrap_or_else(|| "•".to_string()));
                let action = store.create_category(category);
                undo.record(action);
                Outcome::mutated(format!("Created the {} category.", name))
            }

            AssistantCommand::RenameCategory { category, name } => {
                let Some(cat) = store.category_by_name(&category) else {
                    return self.unknown_category(&category, store);
                };
                let cat_id = cat.id.clone();
                let old_name = cat.name.clone();
                if let Some(action) = store.rename_category(&cat_id, &name) {
                    undo.record(action);
                }
                Outcome::mutated(format!("Renamed {} to {}.", old_name, name.trim()))
            }

            AssistantCommand::DeleteCategory { category } => {
                let Some(cat) = store.category_by_name(&category) else {
                    return self.unknown_category(&category, store);
                };
                let cat_id = cat.id.clone();
                let cat_name = cat.name.clone();

                if cat.items.is_empty() {
                    if let Some(action) = store.delete_category(&cat_id) {
                        undo.record(action);
                    }
                    return Outcome::mutated(format!("Deleted the {} category.", cat_name));
                }

                // Non-empty: park the delete and ask first.
                let count = cat.items.len();
                self.pending_delete = Some(PendingDelete {
                    category_id: cat_id,
                    category_name: cat_name.clone(),
                });
                info!(category = %cat_name, "delete parked pending confirmation");
                Outcome::unchanged(format!(
                    "{} still has {} item{}. Are you sure you want to delete it?",
                    cat_name,
                    count,
                    if count == 1 { "" } else { "s" }
                ))
            }

            AssistantCommand::ConfirmDeleteCategory { category } => {
                let Some(pending) = pending else {
                    return Outcome::unchanged(
                        "There's nothing waiting for confirmation.".to_string(),
                    );
                };
                let matches = category.trim().to_lowercase()
                    == pending.category_name.to_lowercase()
                    || category == pending.category_id;
                if !matches {
                    return Outcome::unchanged(format!(
                        "That doesn't match the pending delete of {}.",
                        pending.category_name
                    ));
                }
                if let Some(action) = store.delete_category(&pending.category_id) {
                    undo.record(action);
                    Outcome::mutated(format!("Deleted the {} category.", pending.category_name))
                } else {
                    Outcome::unchanged(format!("{} is already gone.", pending.category_name))
                }
            }

            AssistantCommand::MergeCategories {
                source,
                destination,
            } => {
                let Some(src) = store.category_by_name(&source) else {
                    return self.unknown_category(&source, store);
                };
                let Some(dst) = store.category_by_name(&destination) else {
                    return self.unknown_category(&destination, store);
                };
                let (src_id, src_name) = (src.id.clone(), src.name.clone());
                let (dst_id, dst_name) = (dst.id.clone(), dst.name.clone());
                if src_id == dst_id {
                    return Outcome::unchanged(
                        "Those are the same category - nothing to merge.".to_string(),
                    );
                }
                if let Some(action) = store.merge_categories(&src_id, &dst_id) {
                    undo.record(action);
                }
                Outcome::mutated(format!("Merged {} into {}.", src_name, dst_name))
            }

            AssistantCommand::ClearCompleted { category } => {
                let scope_id = match &category {
                    Some(name) => match store.category_by_name(name) {
                        Some(cat) => Some(cat.id.clone()),
                        None => return self.unknown_category(name, store),
                    },
                    None => None,
                };
                match store.clear_completed(scope_id.as_deref()) {
                    Some(action) => {
                        let count = match &action {
                            crate::undo::UndoAction::CompletedCleared { removed } => removed.len(),
                            _ => 0,
                        };
                        undo.record(action);
                        Outcome::mutated(format!(
                            "Cleared {} completed item{}.",
                            count,
                            if count == 1 { "" } else { "s" }
                        ))
                    }
                    None => Outcome::unchanged("No completed items to clear.".to_string()),
                }
            }

            AssistantCommand::Reply { message } => Outcome::unchanged(message),
        }
    }

    fn unknown_category(&self, name: &str, store: &ListStore) -> Outcome {
        let known: Vec<&str> = store.categories().iter().map(|c| c.name.as_str()).collect();
        Outcome::unchanged(format!(
            "I couldn't find a category called \"{}\". You have: {}.",
            name,
            known.join(", ")
        ))
    }
}

fn parse_due_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// System prompt for the command request: the assistant's contract plus a
/// snapshot of the current collections so it can resolve names.
pub fn system_prompt(store: &ListStore) -> String {
    let mut listing = String::new();
    for cat in store.categories() {
        listing.push_str(&format!("- {} ({} items)\n", cat.name, cat.items.len()));
        for item in &cat.items {
            let state = if item.completed { "done" } else { "open" };
            listing.push_str(&format!("    - {} [{}]\n", item.content, state));
        }
    }

    format!(
        "You are the assistant inside a personal list manager. The user \
         manages categorized lists of items. Respond with exactly one JSON \
         command matching the provided schema: a mutation when the user \
         asks for one, or a `reply` action for anything conversational. \
         Use the category and item names exactly as they appear below \
         (matching is case-insensitive). Before deleting a category that \
         still has items, the app requires a `confirm_delete_category` \
         turn after the user agrees.\n\nCurrent lists:\n{}",
        listing
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::default_categories;

    fn setup() -> (Interpreter, ListStore, UndoSlot) {
        let mut categories = default_categories();
        categories[1].items.push(Item::new("Milk"));
        categories[1].items.push(Item::new("Bread"));
        (
            Interpreter::new(),
            ListStore::new(categories),
            UndoSlot::new(),
        )
    }

    fn apply(
        interp: &mut Interpreter,
        store: &mut ListStore,
        undo: &mut UndoSlot,
        raw: &str,
    ) -> Outcome {
        let cmd = super::super::parse_command(raw).unwrap();
        interp.apply(cmd, store, undo)
    }

    #[test]
    fn test_add_item_matches_category_case_insensitively() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "add_item", "category": "shopping", "content": "eggs"}"#,
        );
        assert!(outcome.applied);
        let shopping = store.category_by_name("Shopping").unwrap();
        assert!(shopping.find_item_by_name("eggs").is_some());
        assert!(!undo.is_empty());
    }

    #[test]
    fn test_add_item_unknown_category_lists_options() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "add_item", "category": "groceries", "content": "eggs"}"#,
        );
        assert!(!outcome.applied);
        assert!(outcome.reply.contains("Shopping"));
        assert!(undo.is_empty());
    }

    #[test]
    fn test_update_item_case_insensitive_item_match() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "update_item", "category": "SHOPPING", "item": "milk", "completed": true}"#,
        );
        assert!(outcome.applied);
        let shopping = store.category_by_name("shopping").unwrap();
        assert!(shopping.find_item_by_name("Milk").unwrap().completed);
    }

    #[test]
    fn test_delete_nonempty_category_requires_confirmation() {
        let (mut interp, mut store, mut undo) = setup();

        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "delete_category", "category": "Shopping"}"#,
        );
        assert!(!outcome.applied);
        assert!(interp.has_pending_delete());
        assert!(store.category_by_name("Shopping").is_some());

        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "confirm_delete_category", "category": "shopping"}"#,
        );
        assert!(outcome.applied);
        assert!(store.category_by_name("Shopping").is_none());
        assert!(!interp.has_pending_delete());
    }

    #[test]
    fn test_unrelated_command_abandons_pending_delete() {
        let (mut interp, mut store, mut undo) = setup();

        apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "delete_category", "category": "Shopping"}"#,
        );
        assert!(interp.has_pending_delete());

        // Any other turn drops the pending delete.
        apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "add_item", "category": "Shopping", "content": "cheese"}"#,
        );
        assert!(!interp.has_pending_delete());

        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "confirm_delete_category", "category": "Shopping"}"#,
        );
        assert!(!outcome.applied);
        assert!(store.category_by_name("Shopping").is_some());
    }

    #[test]
    fn test_delete_empty_category_is_immediate() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "delete_category", "category": "watch-list"}"#,
        );
        assert!(outcome.applied);
        assert!(!interp.has_pending_delete());
        assert!(store.category_by_name("Watch-list").is_none());
    }

    #[test]
    fn test_confirm_without_pending_is_refused() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "confirm_delete_category", "category": "Shopping"}"#,
        );
        assert!(!outcome.applied);
        assert!(store.category_by_name("Shopping").is_some());
    }

    #[test]
    fn test_merge_via_command() {
        let (mut interp, mut store, mut undo) = setup();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "merge_categories", "source": "shopping", "destination": "to-do"}"#,
        );
        assert!(outcome.applied);
        assert!(store.category_by_name("Shopping").is_none());
        assert_eq!(store.category_by_name("To-Do").unwrap().items.len(), 2);

        // The merge is undoable as a single action.
        let action = undo.take().unwrap();
        assert!(store.apply_undo(action));
        assert_eq!(store.category_by_name("Shopping").unwrap().items.len(), 2);
        assert!(store.category_by_name("To-Do").unwrap().items.is_empty());
    }

    #[test]
    fn test_clear_completed_reports_count() {
        let (mut interp, mut store, mut undo) = setup();
        apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "update_item", "category": "Shopping", "item": "Milk", "completed": true}"#,
        );

        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "clear_completed", "category": "Shopping"}"#,
        );
        assert!(outcome.applied);
        assert!(outcome.reply.contains("1 completed item"));
        assert_eq!(store.category_by_name("Shopping").unwrap().items.len(), 1);
    }

    #[test]
    fn test_reply_mutates_nothing() {
        let (mut interp, mut store, mut undo) = setup();
        let before = store.total_items();
        let outcome = apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "reply", "message": "You have 2 items on your shopping list."}"#,
        );
        assert!(!outcome.applied);
        assert_eq!(outcome.reply, "You have 2 items on your shopping list.");
        assert_eq!(store.total_items(), before);
        assert!(undo.is_empty());
    }

    #[test]
    fn test_due_date_parsing() {
        let (mut interp, mut store, mut undo) = setup();
        apply(
            &mut interp,
            &mut store,
            &mut undo,
            r#"{"action": "add_item", "category": "To-Do", "content": "renew passport", "due_date": "2026-09-15"}"#,
        );
        let todo = store.category_by_name("To-Do").unwrap();
        let item = todo.find_item_by_name("renew passport").unwrap();
        assert_eq!(
            item.due_date,
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
    }

    #[test]
    fn test_system_prompt_includes_collections() {
        let (_, store, _) = setup();
        let prompt = system_prompt(&store);
        assert!(prompt.contains("Shopping"));
        assert!(prompt.contains("Milk"));
        assert!(prompt.contains("[open]"));
    }
}
