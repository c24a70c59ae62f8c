//! Storage Backend Driver Port
//!
//! Port implemented by every backend driver (document store, key-value
//! store, flat file, in-memory). The repository layer is coded only against
//! this contract and assumes the weakest common guarantee: a single-entity
//! write is atomic, multi-entity operations are not.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record yielded by a scan: backend key plus payload
pub type ScanItem = (String, Value);

/// Lazy, single-pass sequence of scan results.
///
/// Abandoning the stream (dropping it) releases any backing cursor; the
/// sequence is not restartable without re-issuing the scan.
pub type ScanStream = BoxStream<'static, Result<ScanItem>>;

/// Comparison operator of a predicate descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    /// Field equals value
    Eq,
    /// Field does not equal value
    Ne,
    /// Field is less than value
    Lt,
    /// Field is less than or equal to value
    Le,
    /// Field is greater than value
    Gt,
    /// Field is greater than or equal to value
    Ge,
    /// String field contains the value as a substring, or array field
    /// contains the value as an element
    Contains,
}

/// Backend-agnostic query filter: field, operator, value.
///
/// Drivers that support pushdown evaluate the predicate natively during
/// `scan`; the repository applies [`Predicate::matches`] in-process for
/// drivers that cannot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field name; dotted paths descend into nested objects
    pub field: String,
    /// Comparison operator
    pub op: FieldOp,
    /// Comparison value
    pub value: Value,
}

impl Predicate {
    /// Create a new predicate
    pub fn new<F: Into<String>>(field: F, op: FieldOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an equality predicate
    pub fn eq<F: Into<String>, V: Into<Value>>(field: F, value: V) -> Self {
        Self::new(field, FieldOp::Eq, value.into())
    }

    /// Evaluate the predicate against a payload in-process.
    ///
    /// A missing field never matches.
    pub fn matches(&self, payload: &Value) -> bool {
        let Some(actual) = lookup_field(payload, &self.field) else {
            return false;
        };

        match self.op {
            FieldOp::Eq => actual == &self.value,
            FieldOp::Ne => actual != &self.value,
            FieldOp::Lt | FieldOp::Le | FieldOp::Gt | FieldOp::Ge => {
                compare(actual, &self.value).is_some_and(|ordering| match self.op {
                    FieldOp::Lt => ordering.is_lt(),
                    FieldOp::Le => ordering.is_le(),
                    FieldOp::Gt => ordering.is_gt(),
                    FieldOp::Ge => ordering.is_ge(),
                    FieldOp::Eq | FieldOp::Ne | FieldOp::Contains => false,
                })
            }
            FieldOp::Contains => match (actual, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle),
                (Value::Array(items), needle) => items.contains(needle),
                _ => false,
            },
        }
    }
}

/// Resolve a dotted field path inside a payload
fn lookup_field<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Order two JSON values when both are numbers or both are strings
fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Storage Backend Driver Port
///
/// Each driver adapts one concrete external store (document store,
/// key-value store, flat file). Connections follow scoped-resource
/// semantics: acquired on `connect` (or lazily on first use), released on
/// `close` or container teardown.
#[async_trait]
pub trait StoreDriver: Send + Sync + std::fmt::Debug {
    /// Acquire the backend connection.
    ///
    /// May block or suspend; callers must issue this off any
    /// latency-sensitive path owned by the host.
    async fn connect(&self) -> Result<()>;

    /// Release the backend connection
    async fn close(&self) -> Result<()>;

    /// Read the payload stored under an identity, if present
    async fn read(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Write a payload under an identity.
    ///
    /// Atomic for the single entity; nothing stronger is guaranteed.
    async fn write(&self, collection: &str, id: &str, payload: &Value) -> Result<()>;

    /// Remove the payload stored under an identity.
    ///
    /// Returns `false` (not an error) when the identity was already absent.
    async fn remove(&self, collection: &str, id: &str) -> Result<bool>;

    /// Scan a collection, optionally filtered by a predicate.
    ///
    /// Drivers that report no pushdown support may ignore the predicate;
    /// the repository then filters in-process.
    async fn scan(&self, collection: &str, predicate: Option<&Predicate>) -> Result<ScanStream>;

    /// Force any buffered writes to the backend
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Whether `scan` evaluates predicates natively
    fn supports_predicate_pushdown(&self) -> bool {
        false
    }

    /// Produce a backend-assigned identity for a new entity
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Name of this driver implementation (e.g. "document", "kv", "file")
    fn driver_name(&self) -> &str;
}
