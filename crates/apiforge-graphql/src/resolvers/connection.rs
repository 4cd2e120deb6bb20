//! Connection payloads.
//!
//! Builds the JSON payloads of `<Name>Connection` types from a page of
//! normalized items, and turns pagination arguments into an offset window.
//! Cursors are base64-encoded item offsets.

use serde_json::{Value, json};

use crate::Result;
use crate::error::GraphQLError;
use crate::schema::{PaginationType, TypeBuilder};
use crate::types::TypeHandle;

/// Cursor data encoded in the cursor string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CursorData {
    /// Offset of the item in the collection.
    pub offset: u64,
}

impl CursorData {
    pub fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Encode cursor data to a base64 string.
    pub fn encode(&self) -> String {
        use base64::Engine;
        let json = serde_json::to_string(self).unwrap_or_default();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode cursor data from a base64 string.
    pub fn decode(cursor: &str) -> Option<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(cursor)
            .ok()?;
        let json = String::from_utf8(bytes).ok()?;
        serde_json::from_str(&json).ok()
    }
}

/// Offset window of a collection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionWindow {
    pub offset: u64,
    pub limit: u64,
}

/// Window selected by Relay cursor arguments.
///
/// `total` is only needed when `last` is given without `before`; pass `None`
/// otherwise and the window is computed from the cursors alone.
///
/// # Errors
///
/// Returns `GraphQLError::UnexpectedValue` for undecodable cursors, negative
/// counts, or `last` without `before` and without `total`.
pub fn cursor_window(
    first: Option<i64>,
    last: Option<i64>,
    before: Option<&str>,
    after: Option<&str>,
    items_per_page: u64,
    total: Option<u64>,
) -> Result<CollectionWindow> {
    let decode = |cursor: &str, name: &str| {
        CursorData::decode(cursor).map(|c| c.offset).ok_or_else(|| {
            GraphQLError::UnexpectedValue(format!("Cursor \"{cursor}\" passed as \"{name}\" is invalid"))
        })
    };
    let count = |value: i64, name: &str| {
        u64::try_from(value).map_err(|_| {
            GraphQLError::UnexpectedValue(format!("\"{name}\" must not be negative, got {value}"))
        })
    };

    let start = match after {
        Some(cursor) => decode(cursor, "after")? + 1,
        None => 0,
    };
    let end = match before {
        Some(cursor) => Some(decode(cursor, "before")?),
        None => None,
    };

    if let Some(last) = last {
        let last = count(last, "last")?;
        let end = match (end, total) {
            (Some(end), _) => end,
            (None, Some(total)) => total,
            (None, None) => {
                return Err(GraphQLError::UnexpectedValue(
                    "\"last\" without \"before\" requires the collection size".to_string(),
                ));
            }
        };
        let offset = end.saturating_sub(last).max(start);
        return Ok(CollectionWindow {
            offset,
            limit: end.saturating_sub(offset),
        });
    }

    let mut limit = match first {
        Some(first) => count(first, "first")?,
        None => items_per_page,
    };
    if let Some(end) = end {
        limit = limit.min(end.saturating_sub(start));
    }
    Ok(CollectionWindow {
        offset: start,
        limit,
    })
}

/// Pagination style of a connection type, read from its fields.
pub(crate) fn connection_pagination(
    connection: &TypeHandle,
    builder: &TypeBuilder,
) -> Result<PaginationType> {
    let fields = connection.named_type().fields(builder)?;
    if fields.iter().any(|f| f.name == "edges") {
        Ok(PaginationType::Cursor)
    } else if fields.iter().any(|f| f.name == "collection") {
        Ok(PaginationType::Page)
    } else {
        Err(GraphQLError::Logic(format!(
            "Type \"{}\" is not a connection type.",
            connection.named_type().name()
        )))
    }
}

/// Window of a 1-based page.
#[must_use]
pub fn page_window(page: Option<i64>, items_per_page: u64) -> CollectionWindow {
    let page = page.and_then(|p| u64::try_from(p).ok()).unwrap_or(1).max(1);
    CollectionWindow {
        offset: (page - 1) * items_per_page,
        limit: items_per_page,
    }
}

/// Cursor-based connection payload (`edges`, `pageInfo`, `totalCount`).
#[must_use]
pub fn cursor_connection(items: Vec<Value>, offset: u64, total: u64) -> Value {
    let count = items.len() as u64;
    let edges: Vec<Value> = items
        .into_iter()
        .zip(offset..)
        .map(|(node, position)| {
            json!({
                "node": node,
                "cursor": CursorData::new(position).encode(),
            })
        })
        .collect();

    let (start_cursor, end_cursor) = if count == 0 {
        (Value::Null, Value::Null)
    } else {
        (
            Value::String(CursorData::new(offset).encode()),
            Value::String(CursorData::new(offset + count - 1).encode()),
        )
    };

    json!({
        "edges": edges,
        "pageInfo": {
            "startCursor": start_cursor,
            "endCursor": end_cursor,
            "hasNextPage": offset + count < total,
            "hasPreviousPage": offset > 0,
        },
        "totalCount": total,
    })
}

/// Page-based connection payload (`collection`, `paginationInfo`).
#[must_use]
pub fn page_connection(items: Vec<Value>, items_per_page: u64, total: u64) -> Value {
    let last_page = if items_per_page == 0 {
        1
    } else {
        total.div_ceil(items_per_page).max(1)
    };
    json!({
        "collection": items,
        "paginationInfo": {
            "itemsPerPage": items_per_page,
            "lastPage": last_page,
            "totalCount": total,
        },
    })
}
