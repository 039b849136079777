//! HTTP API Handlers
//!
//! Each submodule handles one concern of the server.

// Core modules
pub mod router;
pub mod state;

// Request parsing
pub mod extract;

// Health and metrics
pub mod health;

// Todo endpoint
pub mod todos;

// Test utilities (compiled only in test builds)
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use router::{build_app, build_public_routes, build_router, build_todo_routes};
pub use state::TodoServer;
pub use todos::{AppState, SessionId};
