//! Request value source
//!
//! Values arrive from the query string, a form body or a JSON body. They are
//! merged once per request with a fixed precedence (form > query > JSON) and
//! resolved into [`TodoParams`].

use std::collections::HashMap;
use std::fmt;

use super::error::{Result, TodoError};
use super::types::TodoId;

/// An untyped request value
///
/// Query and form values are always text; JSON bodies may also carry
/// numbers and booleans. JSON `null` is treated as absent and never becomes
/// a `RequestValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl RequestValue {
    /// Convert a JSON value; `null` yields `None`
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    /// Emptiness in the loose sense: "", "0", 0, 0.0 and false are empty
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty() || s == "0",
            Self::Integer(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Bool(b) => !b,
        }
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Merged view over every value source of one request
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    form: HashMap<String, RequestValue>,
    query: HashMap<String, RequestValue>,
    body: HashMap<String, RequestValue>,
}

impl RequestValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = text_map(pairs);
        self
    }

    pub fn with_form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.form = text_map(pairs);
        self
    }

    /// Merge a JSON body. Anything but a JSON object contributes nothing.
    pub fn with_json_body(mut self, body: &serde_json::Value) -> Self {
        if let Some(object) = body.as_object() {
            self.body = object
                .iter()
                .filter_map(|(k, v)| RequestValue::from_json(v).map(|v| (k.clone(), v)))
                .collect();
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&RequestValue> {
        self.form
            .get(key)
            .or_else(|| self.query.get(key))
            .or_else(|| self.body.get(key))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(RequestValue::to_text)
    }

    fn lowercase(&self, key: &str) -> Option<String> {
        self.text(key).map(|s| s.to_lowercase())
    }
}

fn text_map<I, K, V>(pairs: I) -> HashMap<String, RequestValue>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), RequestValue::Text(v.into())))
        .collect()
}

/// Editable item fields, applied in order content → priority → due_date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFields {
    pub content: Option<RequestValue>,
    pub priority: Option<RequestValue>,
    pub due_date: Option<RequestValue>,
}

/// Typed parameters of one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoParams {
    /// Raw id as sent; parsed when it is looked up
    pub id: Option<String>,
    /// Lower-cased action name
    pub action: Option<String>,
    /// Completion state for the `complete` action
    pub state: Option<RequestValue>,
    /// Lower-cased `complete` filter
    pub complete: Option<String>,
    /// Lower-cased sort key
    pub order_by: Option<String>,
    /// Lower-cased sort direction
    pub direction: Option<String>,
    pub fields: ItemFields,
}

impl TodoParams {
    pub fn resolve(values: &RequestValues) -> Self {
        Self {
            id: values.text("id"),
            action: values.lowercase("action"),
            state: values.get("state").cloned(),
            complete: values.lowercase("complete"),
            order_by: values.lowercase("order_by"),
            direction: values.lowercase("direction"),
            fields: ItemFields {
                content: values.get("content").cloned(),
                priority: values.get("priority").cloned(),
                due_date: values.get("due_date").cloned(),
            },
        }
    }
}

/// Parse an item id: the canonical decimal form of a positive integer.
/// Anything else (`01`, ` 1`, `+1`, `abc`) cannot name an item, so it is
/// reported as not found.
pub fn parse_id(raw: &str) -> Result<TodoId> {
    let canonical = !raw.is_empty()
        && !raw.starts_with('0')
        && raw.bytes().all(|b| b.is_ascii_digit());
    match raw.parse::<TodoId>() {
        Ok(id) if canonical => Ok(id),
        _ => Err(TodoError::NotFound(raw.to_string())),
    }
}
