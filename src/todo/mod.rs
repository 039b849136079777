//! Todo domain: items, per-session store, request parameters, field
//! validation, listing queries and the action dispatcher.
//!
//! Nothing here knows about HTTP or persistence. A handler resolves
//! [`TodoParams`] from the request, loads the session's [`ItemStore`] and
//! calls [`dispatch_get`] or [`dispatch_post`].

pub mod actions;
pub mod error;
pub mod fields;
pub mod params;
pub mod query;
pub mod store;
pub mod types;

pub use actions::{dispatch_get, dispatch_post, Action, CompletionState, Outcome};
pub use error::TodoError;
pub use fields::apply_fields;
pub use params::{parse_id, ItemFields, RequestValue, RequestValues, TodoParams};
pub use query::{CompleteFilter, ListQuery, SortDirection, SortKey};
pub use store::ItemStore;
pub use types::{TodoId, TodoItem, TodoView};
