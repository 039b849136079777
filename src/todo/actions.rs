//! Action dispatcher
//!
//! Maps a request onto store operations:
//!
//! | method | id  | action             | effect                              |
//! |--------|-----|--------------------|-------------------------------------|
//! | GET    | no  | -                  | filtered/sorted list                |
//! | GET    | yes | -                  | single item                         |
//! | POST   | no  | -                  | create, assign next id              |
//! | POST   | yes | update (default)   | re-apply fields                     |
//! | POST   | yes | delete             | remove                              |
//! | POST   | yes | complete           | set or clear completion time        |
//!
//! Every id is resolved against the store before any action is examined, so
//! an unknown id always reports not-found and nothing is mutated.

use chrono::{DateTime, TimeZone, Utc};

use super::error::{Result, TodoError};
use super::fields::apply_fields;
use super::params::{parse_id, RequestValue, TodoParams};
use super::query::ListQuery;
use super::store::ItemStore;
use super::types::{TodoId, TodoItem};

/// Mutation requested on an existing item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
    Complete,
}

impl Action {
    /// A missing action means update
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(Self::Update);
        };
        match raw.to_lowercase().as_str() {
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "complete" => Ok(Self::Complete),
            other => Err(TodoError::validation(format!(
                "Invalid action specified: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Complete => "complete",
        }
    }
}

/// Target state of the `complete` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Done,
    NotDone,
}

impl CompletionState {
    /// Accepts exactly: absent, `true`, `"true"`, `1`, `"1"` for done and
    /// `false`, `"false"`, `0`, `"0"` for not done. Strings match in any case.
    pub fn parse(raw: Option<&RequestValue>) -> Result<Self> {
        let state = match raw {
            None => return Ok(Self::Done),
            Some(state) => state,
        };
        let parsed = match state {
            RequestValue::Bool(true) | RequestValue::Integer(1) => Some(Self::Done),
            RequestValue::Bool(false) | RequestValue::Integer(0) => Some(Self::NotDone),
            RequestValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "1" => Some(Self::Done),
                "false" | "0" => Some(Self::NotDone),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| {
            let shown = match state {
                RequestValue::Text(s) => s.to_lowercase(),
                other => other.to_text(),
            };
            TodoError::validation(format!("Invalid state specified for completion: {shown}"))
        })
    }
}

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// New item stored; carries the assigned id
    Created(TodoItem),
    Item(TodoItem),
    Items(Vec<TodoItem>),
    Deleted(TodoId),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Item(_) => "item",
            Self::Items(_) => "list",
            Self::Deleted(_) => "delete",
        }
    }
}

/// Read-only request: one item by id, or the filtered/sorted list
pub fn dispatch_get(store: &ItemStore, params: &TodoParams) -> Result<Outcome> {
    if let Some(raw_id) = &params.id {
        let id = parse_id(raw_id)?;
        return store.get(id).map(Outcome::Item);
    }

    let query = ListQuery::from_params(params)?;
    Ok(Outcome::Items(query.run(store.list())))
}

/// Mutating request. Nothing is written to `store` unless the whole
/// operation succeeds.
///
/// `now` carries the zone used for relative and zone-less due dates.
pub fn dispatch_post<Tz: TimeZone>(
    store: &mut ItemStore,
    params: &TodoParams,
    now: DateTime<Tz>,
) -> Result<Outcome> {
    let Some(raw_id) = &params.id else {
        return create(store, params, now);
    };

    let id = parse_id(raw_id)?;
    let existing = store.get(id)?;

    match Action::parse(params.action.as_deref())? {
        Action::Update => {
            let updated = apply_fields(existing, &params.fields, now)?;
            store.put(updated.clone())?;
            tracing::info!(todo_id = id, "Updated todo");
            Ok(Outcome::Item(updated))
        }
        Action::Delete => {
            store.delete(id)?;
            tracing::info!(todo_id = id, "Deleted todo");
            Ok(Outcome::Deleted(id))
        }
        Action::Complete => {
            let mut item = existing;
            match CompletionState::parse(params.state.as_ref())? {
                CompletionState::Done => item.complete(now.with_timezone(&Utc)),
                CompletionState::NotDone => item.reopen(),
            }
            store.put(item.clone())?;
            tracing::info!(todo_id = id, completed = item.is_completed(), "Set completion");
            Ok(Outcome::Item(item))
        }
    }
}

fn create<Tz: TimeZone>(
    store: &mut ItemStore,
    params: &TodoParams,
    now: DateTime<Tz>,
) -> Result<Outcome> {
    let created_at = now.with_timezone(&Utc);
    let mut item = apply_fields(TodoItem::new(created_at), &params.fields, now)?;
    item.id = store.put(item.clone())?;
    tracing::info!(todo_id = item.id, priority = item.priority, "Created todo");
    Ok(Outcome::Created(item))
}
