//! Turns raw feed records into [`ChangeEvent`]s.
//!
//! Feeds deliver untyped row snapshots whose presence depends on the change
//! kind and the table's replica identity. Normalization makes the shape
//! explicit: inserts carry the new row, updates carry both rows and deletes
//! carry only the id of the old row.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ChangeEvent, Order, OrderId};
use crate::port::{ChangeKind, RawChange};

/// Why a raw change could not be turned into an event.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("{kind:?} change without a {which} record")]
    MissingRecord {
        kind: ChangeKind,
        which: &'static str,
    },

    #[error("delete change without an id")]
    MissingId,

    #[error("undecodable {which} record: {source}")]
    Decode {
        which: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Normalize one raw change.
///
/// # Errors
///
/// Returns an error when a record required by the change kind is absent or
/// does not decode as an order.
pub fn normalize(raw: RawChange) -> Result<ChangeEvent, NormalizeError> {
    match raw.kind {
        ChangeKind::Insert => {
            let new = present(raw.new).ok_or(NormalizeError::MissingRecord {
                kind: raw.kind,
                which: "new",
            })?;
            Ok(ChangeEvent::Insert(decode(new, "new")?))
        }
        ChangeKind::Update => {
            let new = present(raw.new).ok_or(NormalizeError::MissingRecord {
                kind: raw.kind,
                which: "new",
            })?;
            // Without full replica identity the old record holds only the
            // primary key; the remaining columns are taken from `new`.
            let old = match present(raw.old) {
                Some(old) => overlay(&new, old),
                None => new.clone(),
            };
            Ok(ChangeEvent::Update {
                new: decode(new, "new")?,
                old: decode(old, "old")?,
            })
        }
        ChangeKind::Delete => {
            let old = present(raw.old).ok_or(NormalizeError::MissingRecord {
                kind: raw.kind,
                which: "old",
            })?;
            let id = record_id(&old).ok_or(NormalizeError::MissingId)?;
            Ok(ChangeEvent::Delete { id })
        }
    }
}

/// Treat `null` and `{}` the same as an absent record.
fn present(record: Option<Value>) -> Option<Value> {
    record.filter(|value| match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    })
}

fn overlay(base: &Value, partial: Value) -> Value {
    match (base, partial) {
        (Value::Object(base), Value::Object(partial)) => {
            let mut merged: Map<String, Value> = base.clone();
            merged.extend(partial);
            Value::Object(merged)
        }
        (_, partial) => partial,
    }
}

fn record_id(record: &Value) -> Option<OrderId> {
    match record.get("id")? {
        Value::String(id) if !id.is_empty() => Some(OrderId::new(id.as_str())),
        Value::Number(id) => Some(OrderId::new(id.to_string())),
        _ => None,
    }
}

fn decode(record: Value, which: &'static str) -> Result<Order, NormalizeError> {
    serde_json::from_value(record).map_err(|source| NormalizeError::Decode { which, source })
}
