//! Todo endpoint
//!
//! One route for everything: GET reads, POST mutates, the session cookie
//! picks whose items are touched.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use chrono_tz::Tz;
use uuid::Uuid;

use super::extract::TodoRequest;
use super::state::TodoServer;
use crate::errors::{AppError, Result};
use crate::metrics::TODO_ACTIONS_TOTAL;
use crate::todo::{dispatch_get, dispatch_post, Action, Outcome, TodoParams};
use crate::validation;

/// Application state type alias
pub type AppState = std::sync::Arc<TodoServer>;

/// Session resolved from the request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId {
    pub id: Uuid,
    /// Freshly minted; the response must set the cookie
    pub is_new: bool,
}

impl SessionId {
    /// Read the session cookie, minting a new id when it is missing or malformed
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        match find_cookie(headers, cookie_name).map(|v| validation::validate_session_id(&v)) {
            Some(Ok(id)) => Self { id, is_new: false },
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Replacing invalid session cookie");
                Self::mint()
            }
            None => Self::mint(),
        }
    }

    fn mint() -> Self {
        Self {
            id: Uuid::new_v4(),
            is_new: true,
        }
    }

    pub fn set_cookie(&self, cookie_name: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{cookie_name}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }
}

fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
}

/// `GET|POST /todo`
pub async fn todo_endpoint(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    TodoRequest(values): TodoRequest,
) -> Response {
    let session = SessionId::from_headers(&headers, state.session_cookie());
    let params = TodoParams::resolve(&values);

    let mut response = match handle(&state, &method, &session, params).await {
        Ok(outcome) => render(outcome, uri.path(), &state.timezone()),
        Err(e) => e.into_response(),
    };

    if session.is_new {
        if let Some(cookie) = session.set_cookie(state.session_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

async fn handle(
    state: &AppState,
    method: &Method,
    session: &SessionId,
    params: TodoParams,
) -> Result<Outcome> {
    let is_post = if method == Method::POST {
        true
    } else if method == Method::GET {
        false
    } else {
        return Err(AppError::MethodNotAllowed(method.to_string()));
    };
    let label = action_label(is_post, &params);

    let sessions = state.sessions.clone();
    let session_key = session.id.to_string();
    let now = Utc::now().with_timezone(&state.timezone());

    let result = tokio::task::spawn_blocking(move || {
        sessions.with_session(&session_key, |store| -> Result<Outcome> {
            let outcome = if is_post {
                dispatch_post(store, &params, now)
            } else {
                dispatch_get(store, &params)
            };
            Ok(outcome?)
        })
    })
    .await
    .map_err(|e| AppError::internal(anyhow::anyhow!("Blocking task failed: {e}")))
    .and_then(|r| r);

    let outcome_label = match &result {
        Ok(_) => "success",
        Err(e) => e.metric_result(),
    };
    TODO_ACTIONS_TOTAL
        .with_label_values(&[label, outcome_label])
        .inc();

    match &result {
        Ok(outcome) => tracing::debug!(
            session = %session.id,
            action = label,
            outcome = outcome.label(),
            "Todo request handled"
        ),
        Err(e) => tracing::debug!(
            session = %session.id,
            action = label,
            code = e.code(),
            "Todo request failed"
        ),
    }

    result
}

/// Bounded action name for metrics and logs
fn action_label(is_post: bool, params: &TodoParams) -> &'static str {
    match (is_post, &params.id) {
        (false, None) => "list",
        (false, Some(_)) => "get",
        (true, None) => "create",
        (true, Some(_)) => Action::parse(params.action.as_deref())
            .map(|a| a.as_str())
            .unwrap_or("unknown"),
    }
}

fn render(outcome: Outcome, path: &str, zone: &Tz) -> Response {
    match outcome {
        Outcome::Created(item) => {
            let location = format!("{path}?id={}", item.id);
            let mut response = (StatusCode::CREATED, Json(item.to_view(zone))).into_response();
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
            response
        }
        Outcome::Item(item) => Json(item.to_view(zone)).into_response(),
        Outcome::Items(items) => Json(
            items
                .iter()
                .map(|item| item.to_view(zone))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Outcome::Deleted(id) => {
            Json(serde_json::json!({ "msg": format!("Deleted todo item {id}.") })).into_response()
        }
    }
}
