//! Response normalization with one documented fallback rule.
//!
//! The backend is not consistent about envelopes: some endpoints return the
//! payload bare, some wrap it as `{"data": ...}`, and list endpoints
//! sometimes wrap items with pagination metadata. Rather than chaining
//! optional lookups at every call site, every response passes through this
//! module, which applies exactly one rule:
//!
//! 1. A JSON object carrying a `data` key unwraps one level (once, not
//!    recursively).
//! 2. Anything else passes through untouched.
//!
//! Typed extraction then happens via [`one`], [`many`], and [`paginated`];
//! a shape that still does not fit is a [`TransportError::Malformed`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::TransportError;

/// Keys under which list endpoints have been observed to nest their items.
const ITEM_KEYS: &[&str] = &["items", "products", "orders", "categories", "restaurants"];

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, alias = "page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "total")]
    pub total_items: u64,
    #[serde(default, alias = "hasMore")]
    pub has_next_page: bool,
}

/// A page of items plus its pagination metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// Unwrap a `{"data": ...}` envelope one level; pass anything else through.
#[must_use]
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Extract a single entity.
///
/// # Errors
///
/// Returns [`TransportError::Malformed`] if the payload does not deserialize
/// into `T` after the envelope rule is applied.
pub fn one<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(unwrap_data(value))
        .map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Extract a list of entities.
///
/// Tolerates a bare array, a `{"items": [...]}`-style wrapper under any of
/// the known item keys, and `null` (which yields an empty list).
///
/// # Errors
///
/// Returns [`TransportError::Malformed`] for any other shape.
pub fn many<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, TransportError> {
    let value = unwrap_data(value);
    let items = match value {
        Value::Null => Value::Array(Vec::new()),
        Value::Array(_) => value,
        Value::Object(mut map) => {
            let key = ITEM_KEYS.iter().find(|k| map.contains_key(**k));
            match key {
                Some(k) => map.remove(*k).unwrap_or(Value::Null),
                None => {
                    return Err(TransportError::Malformed(
                        "expected a list payload".to_owned(),
                    ));
                }
            }
        }
        other => {
            return Err(TransportError::Malformed(format!(
                "expected a list payload, got {other}"
            )));
        }
    };
    serde_json::from_value(items).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Extract a page of entities plus pagination metadata.
///
/// A bare array (no metadata) becomes a single terminal page. A wrapper
/// object contributes its `pagination` object when present; otherwise the
/// metadata defaults to a terminal page as well.
///
/// # Errors
///
/// Returns [`TransportError::Malformed`] if the items cannot be extracted.
pub fn paginated<T: DeserializeOwned>(value: Value) -> Result<Page<T>, TransportError> {
    let value = unwrap_data(value);

    let info = value
        .as_object()
        .and_then(|map| map.get("pagination"))
        .and_then(|raw| serde_json::from_value::<PageInfo>(raw.clone()).ok())
        .unwrap_or_default();

    let items: Vec<T> = many(value)?;
    Ok(Page { items, info })
}
