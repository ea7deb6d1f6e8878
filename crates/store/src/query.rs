//! Filtering, ordering and pagination over stored documents.
//!
//! Field names address top-level keys of the document payload. `id`,
//! `createdAt` and `updatedAt` resolve to document metadata instead;
//! the two timestamps compare as unix milliseconds.

use std::cmp::Ordering;

use banner_core::persistence::{Filter, FilterOp, OrderBy, Page, QueryOptions, SortDirection, StoredDocument};
use serde_json::Value;

use crate::error::StoreError;

/// Resolve `field` on `doc`.
pub fn field_value(doc: &StoredDocument, field: &str) -> Option<Value> {
    match field {
        "id" => Some(Value::String(doc.id.clone())),
        "createdAt" => Some(Value::from(doc.created_at.timestamp_millis())),
        "updatedAt" => Some(Value::from(doc.updated_at.timestamp_millis())),
        _ => doc.data.get(field).cloned(),
    }
}

/// Order two JSON scalars of the same kind. Mixed or structured values are
/// incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// `true` when `doc` satisfies `filter`. A missing field never matches.
pub fn matches(doc: &StoredDocument, filter: &Filter) -> bool {
    let Some(actual) = field_value(doc, &filter.field) else {
        return false;
    };
    let expected = &filter.value;
    match filter.op {
        FilterOp::Eq => actual == *expected,
        FilterOp::Ne => actual != *expected,
        FilterOp::Lt => compare_values(&actual, expected) == Some(Ordering::Less),
        FilterOp::Le => matches!(
            compare_values(&actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOp::Gt => compare_values(&actual, expected) == Some(Ordering::Greater),
        FilterOp::Ge => matches!(
            compare_values(&actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::In => expected
            .as_array()
            .is_some_and(|candidates| candidates.contains(&actual)),
        FilterOp::ArrayContains => actual
            .as_array()
            .is_some_and(|elements| elements.contains(expected)),
    }
}

/// Sort in place. Documents missing the field sort last; ties keep id order.
pub fn sort_documents(docs: &mut [StoredDocument], order: &OrderBy) {
    docs.sort_by(|a, b| {
        let ordering = match (field_value(a, &order.field), field_value(b, &order.field)) {
            (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    });
}

/// Run `options` over `docs` (already in id order).
///
/// One extra document past `limit` is inspected to compute `has_more`.
pub fn run_query(mut docs: Vec<StoredDocument>, options: &QueryOptions) -> Result<Page, StoreError> {
    docs.retain(|doc| options.filters.iter().all(|filter| matches(doc, filter)));
    if let Some(order) = &options.order_by {
        sort_documents(&mut docs, order);
    }

    if let Some(cursor) = &options.start_after {
        let position = docs
            .iter()
            .position(|doc| &doc.id == cursor)
            .ok_or_else(|| StoreError::UnknownCursor(cursor.clone()))?;
        docs.drain(..=position);
    }

    let has_more = match options.limit {
        Some(limit) if docs.len() > limit => {
            docs.truncate(limit);
            true
        }
        _ => false,
    };
    let cursor = docs.last().map(|doc| doc.id.clone());

    Ok(Page {
        documents: docs,
        has_more,
        cursor,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
