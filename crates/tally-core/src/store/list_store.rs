use tracing::debug;

use crate::models::{Category, Item};
use crate::undo::UndoAction;

/// Single source of truth for the category/item collections. All three
/// mutation sources (direct UI, grab-and-move reordering, AI commands)
/// funnel through these mutators; each one swaps in a rebuilt category
/// vector and hands back the `UndoAction` that inverts it.
///
/// A mutator returns `None` when its target no longer exists, in which
/// case the collection is untouched.
pub struct ListStore {
    categories: Vec<Category>,
    /// Id of the category shown in the item panel. Always resolves to an
    /// existing category or is None; re-validated after delete/merge.
    active_category_id: Option<String>,
}

impl ListStore {
    pub fn new(categories: Vec<Category>) -> Self {
        let active_category_id = categories.first().map(|c| c.id.clone());
        Self {
            categories,
            active_category_id,
        }
    }

    // ===== Read access =====

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn category_index(&self, category_id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id == category_id)
    }

    /// Case-insensitive category lookup by name (first match wins).
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let needle = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase() == needle)
    }

    pub fn active_category(&self) -> Option<&Category> {
        self.active_category_id
            .as_deref()
            .and_then(|id| self.category(id))
    }

    pub fn active_category_id(&self) -> Option<&str> {
        self.active_category_id.as_deref()
    }

    /// Point the item panel at a category. Ignored when the id doesn't
    /// resolve, so the reference can never dangle.
    pub fn set_active_category(&mut self, category_id: Option<String>) {
        match category_id {
            Some(id) if self.category(&id).is_some() => self.active_category_id = Some(id),
            Some(_) => {}
            None => self.active_category_id = None,
        }
    }

    pub fn total_items(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    // ===== Item mutations =====

    pub fn add_item(&mut self, category_id: &str, item: Item) -> Option<UndoAction> {
        let item_id = item.id.clone();
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            cat.items.push(item);
            Some(UndoAction::ItemAdded {
                category_id: category_id.to_string(),
                item_id,
            })
        })
    }

    /// Replace an item wholesale, keeping its id and position.
    pub fn update_item(
        &mut self,
        category_id: &str,
        item_id: &str,
        mut updated: Item,
    ) -> Option<UndoAction> {
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            let index = cat.items.iter().position(|i| i.id == item_id)?;
            updated.id = item_id.to_string();
            let prior = std::mem::replace(&mut cat.items[index], updated);
            Some(UndoAction::ItemUpdated {
                category_id: category_id.to_string(),
                index,
                prior,
            })
        })
    }

    pub fn delete_item(&mut self, category_id: &str, item_id: &str) -> Option<UndoAction> {
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            let index = cat.items.iter().position(|i| i.id == item_id)?;
            let item = cat.items.remove(index);
            Some(UndoAction::ItemDeleted {
                category_id: category_id.to_string(),
                index,
                item,
            })
        })
    }

    pub fn toggle_item(&mut self, category_id: &str, item_id: &str) -> Option<UndoAction> {
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            let item = cat.items.iter_mut().find(|i| i.id == item_id)?;
            item.completed = !item.completed;
            Some(UndoAction::ItemToggled {
                category_id: category_id.to_string(),
                item_id: item_id.to_string(),
            })
        })
    }

    /// Reorder one item within its category. Pure permutation: count and
    /// identity are untouched.
    pub fn move_item(&mut self, category_id: &str, from: usize, to: usize) -> Option<UndoAction> {
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            if from >= cat.items.len() || to >= cat.items.len() || from == to {
                return None;
            }
            let item = cat.items.remove(from);
            cat.items.insert(to, item);
            Some(UndoAction::ItemMoved {
                category_id: category_id.to_string(),
                from,
                to,
            })
        })
    }

    // ===== Category mutations =====

    pub fn create_category(&mut self, category: Category) -> UndoAction {
        let category_id = category.id.clone();
        self.mutate(|categories| {
            categories.push(category);
            Some(UndoAction::CategoryCreated {
                category_id: category_id.clone(),
            })
        })
        .expect("push cannot fail")
    }

    pub fn rename_category(&mut self, category_id: &str, name: &str) -> Option<UndoAction> {
        self.mutate(|categories| {
            let cat = categories.iter_mut().find(|c| c.id == category_id)?;
            let prior_name = std::mem::replace(&mut cat.name, name.trim().to_string());
            Some(UndoAction::CategoryRenamed {
                category_id: category_id.to_string(),
                prior_name,
            })
        })
    }

    pub fn delete_category(&mut self, category_id: &str) -> Option<UndoAction> {
        let action = self.mutate(|categories| {
            let index = categories.iter().position(|c| c.id == category_id)?;
            let category = categories.remove(index);
            Some(UndoAction::CategoryDeleted { index, category })
        });
        if action.is_some() {
            self.revalidate_active();
        }
        action
    }

    pub fn move_category(&mut self, from: usize, to: usize) -> Option<UndoAction> {
        self.mutate(|categories| {
            if from >= categories.len() || to >= categories.len() || from == to {
                return None;
            }
            let cat = categories.remove(from);
            categories.insert(to, cat);
            Some(UndoAction::CategoryMoved { from, to })
        })
    }

    /// Move every item from source to the end of destination, then remove
    /// the source category.
    pub fn merge_categories(&mut self, source_id: &str, dest_id: &str) -> Option<UndoAction> {
        if source_id == dest_id {
            return None;
        }
        let action = self.mutate(|categories| {
            let source_index = categories.iter().position(|c| c.id == source_id)?;
            categories.iter().position(|c| c.id == dest_id)?;

            let source = categories.remove(source_index);
            let moved_ids: Vec<String> = source.items.iter().map(|i| i.id.clone()).collect();

            let dest = categories
                .iter_mut()
                .find(|c| c.id == dest_id)
                .expect("destination checked above");
            dest.items.extend(source.items.iter().cloned());

            Some(UndoAction::CategoriesMerged {
                source_index,
                source,
                moved_ids,
                destination_id: dest_id.to_string(),
            })
        });
        if action.is_some() {
            self.revalidate_active();
        }
        action
    }

    /// Filtered bulk delete: drop completed items, optionally scoped to a
    /// single category.
    pub fn clear_completed(&mut self, category_id: Option<&str>) -> Option<UndoAction> {
        self.mutate(|categories| {
            let mut removed: Vec<(String, usize, Item)> = Vec::new();
            for cat in categories.iter_mut() {
                if category_id.is_some_and(|id| id != cat.id) {
                    continue;
                }
                let mut kept = Vec::with_capacity(cat.items.len());
                for (index, item) in cat.items.drain(..).enumerate() {
                    if item.completed {
                        removed.push((cat.id.clone(), index, item));
                    } else {
                        kept.push(item);
                    }
                }
                cat.items = kept;
            }
            if removed.is_empty() {
                return None;
            }
            Some(UndoAction::CompletedCleared { removed })
        })
    }

    // ===== Undo =====

    /// Replay the inverse of a recorded action. Returns false when the
    /// action's target vanished (which only happens if the collection was
    /// mutated through a path that didn't clear the slot).
    pub fn apply_undo(&mut self, action: UndoAction) -> bool {
        debug!(action = action.label(), "undoing");
        let applied = match action {
            UndoAction::ItemAdded {
                category_id,
                item_id,
            } => self.delete_item(&category_id, &item_id).is_some(),
            UndoAction::ItemUpdated {
                category_id,
                index,
                prior,
            } => self
                .mutate(|categories| {
                    let cat = categories.iter_mut().find(|c| c.id == category_id)?;
                    let pos = cat.items.iter().position(|i| i.id == prior.id)?;
                    cat.items.remove(pos);
                    cat.items.insert(index.min(cat.items.len()), prior);
                    Some(())
                })
                .is_some(),
            UndoAction::ItemDeleted {
                category_id,
                index,
                item,
            } => self
                .mutate(|categories| {
                    let cat = categories.iter_mut().find(|c| c.id == category_id)?;
                    cat.items.insert(index.min(cat.items.len()), item);
                    Some(())
                })
                .is_some(),
            UndoAction::ItemToggled {
                category_id,
                item_id,
            } => self.toggle_item(&category_id, &item_id).is_some(),
            UndoAction::ItemMoved {
                category_id,
                from,
                to,
            } => self.move_item(&category_id, to, from).is_some(),
            UndoAction::CategoryCreated { category_id } => {
                self.delete_category(&category_id).is_some()
            }
            UndoAction::CategoryRenamed {
                category_id,
                prior_name,
            } => self.rename_category(&category_id, &prior_name).is_some(),
            UndoAction::CategoryDeleted { index, category } => self
                .mutate(|categories| {
                    categories.insert(index.min(categories.len()), category);
                    Some(())
                })
                .is_some(),
            UndoAction::CategoryMoved { from, to } => self.move_category(to, from).is_some(),
            UndoAction::CategoriesMerged {
                source_index,
                source,
                moved_ids,
                destination_id,
            } => self
                .mutate(|categories| {
                    let dest = categories.iter_mut().find(|c| c.id == destination_id)?;
                    dest.items.retain(|i| !moved_ids.contains(&i.id));
                    categories.insert(source_index.min(categories.len()), source);
                    Some(())
                })
                .is_some(),
            UndoAction::CompletedCleared { mut removed } => {
                // Reinsert in ascending index order per category so every
                // recorded index is valid by the time it's used.
                removed.sort_by_key(|(_, index, _)| *index);
                self.mutate(|categories| {
                    for (category_id, index, item) in removed {
                        let Some(cat) = categories.iter_mut().find(|c| c.id == category_id) else {
                            continue;
                        };
                        cat.items.insert(index.min(cat.items.len()), item);
                    }
                    Some(())
                })
                .is_some()
            }
        };
        applied
    }

    // ===== Internals =====

    /// Copy-on-write whole-collection replacement: the mutation runs on a
    /// clone and is swapped in only when it produced a result, so a bailed
    /// mutation can never leave a half-applied collection.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut Vec<Category>) -> Option<T>) -> Option<T> {
        let mut next = self.categories.clone();
        let result = f(&mut next)?;
        self.categories = next;
        Some(result)
    }

    /// Keep the active-category reference pointing at an existing category.
    fn revalidate_active(&mut self) {
        let still_exists = self
            .active_category_id
            .as_deref()
            .is_some_and(|id| self.category(id).is_some());
        if !still_exists {
            self.active_category_id = self.categories.first().map(|c| c.id.clone());
        }
    }
}
