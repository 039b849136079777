//! todo-json library
//!
//! Session-scoped todo lists behind a single JSON endpoint.
//!
//! # Layout
//! - [`todo`]: item store, field validation, list queries, action dispatch
//! - [`session`]: RocksDB persistence of one item store per session
//! - [`handlers`]: axum router, request extraction, health and metrics
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use todo_json::todo::{dispatch_post, ItemStore, Outcome, RequestValues, TodoParams};
//!
//! let mut store = ItemStore::new();
//! let values = RequestValues::new().with_query([("content", "Buy milk")]);
//! let outcome = dispatch_post(&mut store, &TodoParams::resolve(&values), Utc::now()).unwrap();
//! assert!(matches!(outcome, Outcome::Created(item) if item.id == 1));
//! ```

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod session;
pub mod todo;
pub mod tracing_setup;
pub mod validation;
