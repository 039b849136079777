//! Request value extraction
//!
//! Collects query-string pairs plus either a urlencoded form body (POST
//! only) or a JSON body into one [`RequestValues`]. Bodies that do not parse
//! contribute nothing; they never fail the request.

use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{header, HeaderMap, Method},
    Form,
};

use crate::errors::AppError;
use crate::todo::RequestValues;

/// Extractor for every value a todo request carries
#[derive(Debug, Clone, Default)]
pub struct TodoRequest(pub RequestValues);

impl<S> FromRequest<S> for TodoRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Ignoring malformed query string");
                Vec::new()
            }
        };
        let values = RequestValues::new().with_query(query);

        if req.method() == Method::POST && is_form(req.headers()) {
            return match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(pairs)) => Ok(Self(values.with_form(pairs))),
                Err(rejection) => {
                    tracing::debug!(error = %rejection, "Ignoring malformed form body");
                    Ok(Self(values))
                }
            };
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
        if body.is_empty() {
            return Ok(Self(values));
        }

        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(json) => Ok(Self(values.with_json_body(&json))),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring non-JSON body");
                Ok(Self(values))
            }
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}
