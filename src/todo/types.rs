//! Todo item record and its wire representation

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Store-assigned identifier. Zero marks an item that was never stored.
pub type TodoId = u64;

/// A single todo task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,

    /// What needs to be done
    pub content: String,

    #[serde(default)]
    pub priority: u64,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Completion time; `None` while the item is open
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Default item for a creation request, before request fields are applied
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            content: String::new(),
            priority: 0,
            due_date: None,
            created_at: now,
            completed: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.id != 0
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Mark as completed. An existing completion time is kept.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        if self.completed.is_none() {
            self.completed = Some(now);
        }
    }

    pub fn reopen(&mut self) {
        self.completed = None;
    }

    /// Wire form with timestamps rendered in `zone`
    pub fn to_view<Tz>(&self, zone: &Tz) -> TodoView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let render = |d: DateTime<Utc>| d.with_timezone(zone).to_rfc2822();
        TodoView {
            id: self.id,
            content: self.content.clone(),
            priority: self.priority,
            due_date: self.due_date.map(render),
            created_at: render(self.created_at),
            completed: self.completed.map(render),
        }
    }
}

/// JSON shape returned to clients: timestamps rendered as RFC 2822 strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoView {
    pub id: TodoId,
    pub content: String,
    pub priority: u64,
    pub due_date: Option<String>,
    pub created_at: String,
    pub completed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_complete_keeps_first_timestamp() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut item = TodoItem::new(t0);

        item.complete(t0 + Duration::hours(1));
        item.complete(t0 + Duration::hours(2));
        assert_eq!(item.completed, Some(t0 + Duration::hours(1)));

        item.reopen();
        assert!(!item.is_completed());
    }

    #[test]
    fn test_view_renders_rfc2822() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut item = TodoItem::new(t0);
        item.id = 3;
        item.content = "Write tests".to_string();
        item.due_date = Some(t0);

        let view = item.to_view(&Utc);
        assert!(view.created_at.starts_with("Mon, "));
        let due = DateTime::parse_from_rfc2822(view.due_date.as_deref().unwrap()).unwrap();
        assert_eq!(due.with_timezone(&Utc), t0);
        assert!(view.completed.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["completed"].is_null());
    }

    #[test]
    fn test_view_renders_in_zone() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        let mut item = TodoItem::new(t0);
        item.due_date = Some(t0);

        let view = item.to_view(&chrono_tz::America::Chicago);
        assert_eq!(view.created_at, "Mon, 1 Jan 2024 09:00:00 -0600");
        assert_eq!(view.due_date.as_deref(), Some("Mon, 1 Jan 2024 09:00:00 -0600"));
    }
}
