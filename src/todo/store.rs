//! Item store: id → item mapping plus the monotonic id allocator
//!
//! `next_id` only ever grows, so a deleted item's id is never handed out
//! again even when the highest-numbered item is the one removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{Result, TodoError};
use super::types::{TodoId, TodoItem};

/// Todo items for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedStore")]
pub struct ItemStore {
    items: BTreeMap<TodoId, TodoItem>,
    next_id: TodoId,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Id the next created item will receive
    pub fn next_id(&self) -> TodoId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: TodoId) -> Result<TodoItem> {
        self.items
            .get(&id)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    /// Insert or overwrite an item, returning its id.
    ///
    /// An unassigned item (id 0) receives `next_id`. An assigned item must
    /// already be present; ids are never chosen by callers.
    pub fn put(&mut self, mut item: TodoItem) -> Result<TodoId> {
        if !item.is_assigned() {
            let id = self.next_id;
            item.id = id;
            self.items.insert(id, item);
            self.next_id += 1;
            tracing::debug!(todo_id = id, next_id = self.next_id, "Inserted todo");
            return Ok(id);
        }

        let id = item.id;
        match self.items.get_mut(&id) {
            Some(slot) => {
                *slot = item;
                tracing::debug!(todo_id = id, "Overwrote todo");
                Ok(id)
            }
            None => Err(TodoError::NotFound(id.to_string())),
        }
    }

    pub fn delete(&mut self, id: TodoId) -> Result<TodoItem> {
        let removed = self
            .items
            .remove(&id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        tracing::debug!(todo_id = id, "Deleted todo");
        Ok(removed)
    }

    /// Snapshot of every item in ascending id order
    pub fn list(&self) -> Vec<TodoItem> {
        self.items.values().cloned().collect()
    }
}

/// On-disk shape, checked before it becomes an [`ItemStore`]
#[derive(Deserialize)]
struct PersistedStore {
    #[serde(default)]
    items: BTreeMap<TodoId, TodoItem>,
    #[serde(default = "first_id")]
    next_id: TodoId,
}

fn first_id() -> TodoId {
    1
}

impl TryFrom<PersistedStore> for ItemStore {
    type Error = String;

    fn try_from(raw: PersistedStore) -> std::result::Result<Self, Self::Error> {
        for (key, item) in &raw.items {
            if *key == 0 || *key != item.id {
                return Err(format!("item stored under key {key} has id {}", item.id));
            }
        }
        let max_id = raw.items.keys().next_back().copied().unwrap_or(0);
        if raw.next_id <= max_id {
            return Err(format!(
                "next_id {} must be greater than highest id {max_id}",
                raw.next_id
            ));
        }
        Ok(Self {
            items: raw.items,
            next_id: raw.next_id,
        })
    }
}
