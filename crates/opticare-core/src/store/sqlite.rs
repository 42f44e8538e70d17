//! SQLite-backed document store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};
use serde_json::Value;

use super::{
    Direction, Document, DocumentStore, Fields, Query, StoreError, StoreResult, NOW, SCHEMA,
};

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted) => StoreError::Cancelled,
            Some(
                ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::AuthorizationForStatementDenied,
            ) => StoreError::PermissionDenied(e.to_string()),
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::NotADatabase,
            ) => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Sqlite(e),
        }
    }
}

/// Document store on a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open store at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Create in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an existing store without write access. Writes fail with
    /// `PermissionDenied`.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Initialize schema.
    fn initialize(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
    }
}

/// Raw row before the JSON body is parsed.
struct DocumentRow {
    id: String,
    body: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> StoreResult<Self> {
        let fields = match serde_json::from_str(&row.body)? {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        };
        Ok(Document {
            id: row.id,
            fields,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        body: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

/// `json_extract` expression for a top-level field. Field names are
/// restricted to identifier characters since they are spliced into SQL.
fn json_field(field: &str) -> StoreResult<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidQuery(format!(
            "unsupported field name: {:?}",
            field
        )));
    }
    Ok(format!("json_extract(body, '$.{}')", field))
}

/// Map a JSON filter value to what `json_extract` yields. `None` is JSON null.
fn sql_value(value: &Value) -> StoreResult<Option<SqlValue>> {
    let converted = match value {
        Value::Null => None,
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(SqlValue::Integer(i)),
            None => Some(SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::InvalidQuery(
                "equality filters only support scalar values".into(),
            ))
        }
    };
    Ok(converted)
}

impl DocumentStore for SqliteStore {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let body = serde_json::to_string(&Value::Object(fields))?;
        self.conn()?.execute(
            &format!(
                "INSERT INTO documents (collection, id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, {NOW}, {NOW})"
            ),
            params![collection, id, body],
        )?;
        Ok(id)
    }

    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.conn()?
            .query_row(
                r#"
                SELECT id, body, created_at, updated_at
                FROM documents
                WHERE collection = ?1 AND id = ?2
                "#,
                params![collection, id],
                read_row,
            )
            .optional()?
            .map(Document::try_from)
            .transpose()
    }

    fn list(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let mut sql = String::from(
            "SELECT id, body, created_at, updated_at FROM documents WHERE collection = ?1",
        );
        let mut values = vec![SqlValue::Text(collection.to_string())];

        for filter in &query.filters {
            let field = json_field(&filter.field)?;
            match sql_value(&filter.value)? {
                Some(value) => {
                    values.push(value);
                    sql.push_str(&format!(" AND {} = ?{}", field, values.len()));
                }
                None => sql.push_str(&format!(" AND {} IS NULL", field)),
            }
        }

        match &query.order_by {
            Some(order) => {
                let direction = match order.direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                sql.push_str(&format!(
                    " ORDER BY {} {}, id",
                    json_field(&order.field)?,
                    direction
                ));
            }
            None => sql.push_str(" ORDER BY created_at, id"),
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), read_row)?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?.try_into()?);
        }
        Ok(documents)
    }

    fn update(&self, collection: &str, id: &str, patch: Fields) -> StoreResult<()> {
        let patch = serde_json::to_string(&Value::Object(patch))?;
        let rows_affected = self.conn()?.execute(
            &format!(
                "UPDATE documents SET body = json_patch(body, ?3), updated_at = {NOW}
                 WHERE collection = ?1 AND id = ?2"
            ),
            params![collection, id, patch],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.conn()?.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = setup_store();

        let id = store
            .create("patients", fields(json!({ "firstName": "Ada", "age": "36" })))
            .unwrap();
        assert_eq!(id.len(), 36); // UUID format

        let doc = store.get_by_id("patients", &id).unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.fields["firstName"], "Ada");
        assert!(!doc.created_at.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = setup_store();
        assert!(store.get_by_id("patients", "nope").unwrap().is_none());
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = setup_store();
        let id = store.create("patients", Fields::new()).unwrap();
        assert!(store.get_by_id("appointments", &id).unwrap().is_none());
        assert_eq!(store.list("appointments", &Query::new()).unwrap().len(), 0);
    }

    #[test]
    fn test_list_with_filter_and_order() {
        let store = setup_store();
        for (patient, time) in [("p1", "14:00"), ("p2", "09:00"), ("p1", "08:30")] {
            store
                .create(
                    "appointments",
                    fields(json!({ "patientId": patient, "time": time, "duration": 30 })),
                )
                .unwrap();
        }

        let query = Query::new()
            .where_eq("patientId", "p1")
            .order_by("time", Direction::Ascending);
        let docs = store.list("appointments", &query).unwrap();
        let times: Vec<_> = docs.iter().map(|d| d.fields["time"].clone()).collect();
        assert_eq!(times, vec![json!("08:30"), json!("14:00")]);

        let by_duration = store
            .list("appointments", &Query::new().where_eq("duration", 30))
            .unwrap();
        assert_eq!(by_duration.len(), 3);
    }

    #[test]
    fn test_list_rejects_unsafe_field_names() {
        let store = setup_store();
        let query = Query::new().where_eq("x') OR 1=1 --", "y");
        assert!(matches!(
            store.list("patients", &query),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_update_merges_and_refreshes_timestamp() {
        let store = setup_store();
        let id = store
            .create("patients", fields(json!({ "firstName": "Ada", "notes": "" })))
            .unwrap();
        let before = store.get_by_id("patients", &id).unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store
            .update("patients", &id, fields(json!({ "notes": "x" })))
            .unwrap();

        let after = store.get_by_id("patients", &id).unwrap().unwrap();
        assert_eq!(after.fields["firstName"], "Ada");
        assert_eq!(after.fields["notes"], "x");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = setup_store();
        let result = store.update("patients", "nope", Fields::new());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = setup_store();
        let id = store.create("patients", Fields::new()).unwrap();

        store.delete("patients", &id).unwrap();
        assert!(store.get_by_id("patients", &id).unwrap().is_none());
        store.delete("patients", &id).unwrap();
    }

    #[test]
    fn test_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opticare.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store
                .create("patients", fields(json!({ "firstName": "Ada" })))
                .unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        let doc = store.get_by_id("patients", &id).unwrap().unwrap();
        assert_eq!(doc.fields["firstName"], "Ada");
    }

    #[test]
    fn test_read_only_write_is_permission_denied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opticare.db");
        SqliteStore::open(&path).unwrap();

        let store = SqliteStore::open_read_only(&path).unwrap();
        assert!(store.list("patients", &Query::new()).unwrap().is_empty());

        let result = store.create("patients", Fields::new());
        assert!(matches!(result, Err(StoreError::PermissionDenied(_))));
    }
}
