//! Field setter: applies request fields to an item
//!
//! Fields are checked in a fixed order (content, priority, due_date) and the
//! first failure aborts. The function works on an owned copy, so a failed
//! update never reaches the store.

use chrono::{DateTime, TimeZone};

use super::error::{Result, TodoError};
use super::params::ItemFields;
use super::types::TodoItem;
use crate::validation;

/// Relative and zone-less due dates are read in the zone of `now`.
pub fn apply_fields<Tz: TimeZone>(
    mut item: TodoItem,
    fields: &ItemFields,
    now: DateTime<Tz>,
) -> Result<TodoItem> {
    match &fields.content {
        Some(content) if !content.is_empty() => item.content = content.to_text(),
        _ => return Err(TodoError::validation("Missing required field \"content\".")),
    }

    if let Some(priority) = &fields.priority {
        item.priority = validation::parse_priority(priority)
            .ok_or_else(|| TodoError::validation("Priority must be a positive integer."))?;
    }

    if let Some(due_date) = &fields.due_date {
        let input = due_date.to_text();
        let parsed = validation::parse_date(&input, now).map_err(|e| {
            TodoError::InvalidDueDate {
                input: input.clone(),
                source: e.into(),
            }
        })?;
        item.due_date = Some(parsed);
    }

    Ok(item)
}
