//! SQLite schema definition.

/// Collection holding patient records.
pub const PATIENTS: &str = "patients";

/// Collection holding appointments.
pub const APPOINTMENTS: &str = "appointments";

/// Timestamp expression evaluated by SQLite, so writes carry store time.
pub(crate) const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Complete database schema for the document store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Documents
-- ============================================================================

CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(body)),   -- JSON object
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);

-- Hot query paths for appointments
CREATE INDEX IF NOT EXISTS idx_documents_patient
    ON documents(collection, json_extract(body, '$.patientId'));
CREATE INDEX IF NOT EXISTS idx_documents_date
    ON documents(collection, json_extract(body, '$.date'));
"#;
