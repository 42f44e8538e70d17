//! Document store adapter.
//!
//! Collections hold schema-free JSON documents addressed by a generated ID.
//! The store stamps `createdAt`/`updatedAt` itself so every client sees the
//! same clock.

mod schema;
mod sqlite;

pub use schema::*;
pub use sqlite::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field/value body of a document.
pub type Fields = Map<String, Value>;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Decode into a model type. The store-owned `id`, `createdAt` and
    /// `updatedAt` always win over anything in the body.
    pub fn decode<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        let mut fields = self.fields;
        fields.insert("id".into(), Value::String(self.id));
        fields.insert("createdAt".into(), Value::String(self.created_at));
        fields.insert("updatedAt".into(), Value::String(self.updated_at));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Serialize a model into document fields.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidQuery(format!(
            "document body must be an object, got {}",
            other
        ))),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality predicate on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Ordering on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// List query: a conjunction of equality filters plus optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Set the ordering field.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }
}

/// Collection-scoped CRUD over a document database.
///
/// Implementations are blocking; the repositories move calls onto the
/// runtime's blocking pool.
pub trait DocumentStore: Send + Sync {
    /// Store `fields` as a new document and return its generated ID.
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Fetch one document. A missing ID is `Ok(None)`.
    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Materialize every document matching `query`.
    fn list(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Merge `patch` into an existing document and refresh `updatedAt`.
    fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()>;

    /// Remove a document. Deleting a missing ID is not an error.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Thing {
        id: String,
        name: String,
        created_at: String,
        updated_at: String,
    }

    #[test]
    fn test_decode_prefers_store_fields() {
        let mut fields = Fields::new();
        fields.insert("name".into(), "lens".into());
        fields.insert("id".into(), "spoofed".into());
        fields.insert("createdAt".into(), "1970".into());

        let doc = Document {
            id: "real".into(),
            fields,
            created_at: "2024".into(),
            updated_at: "2025".into(),
        };
        let thing: Thing = doc.decode().unwrap();
        assert_eq!(thing.id, "real");
        assert_eq!(thing.created_at, "2024");
        assert_eq!(thing.updated_at, "2025");
        assert_eq!(thing.name, "lens");
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(to_fields(&serde_json::json!({ "a": 1 })).is_ok());
        assert!(matches!(to_fields(&3), Err(StoreError::InvalidQuery(_))));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new()
            .where_eq("patientId", "p1")
            .order_by("date", Direction::Descending);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].value, Value::String("p1".into()));
        assert_eq!(query.order_by.unwrap().direction, Direction::Descending);
    }
}
