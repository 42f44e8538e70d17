//! OptiCare Core Library
//!
//! Patient records, appointment scheduling and reporting for a small
//! optician practice, on top of a document store.
//!
//! # Architecture
//!
//! ```text
//!   Presentation / REST API
//!            │
//!            ▼
//!   ┌──────────────────┐     ┌──────────────────────┐
//!   │ PatientRepository│     │ AppointmentRepository│
//!   └────────┬─────────┘     └──────────┬───────────┘
//!            │    FetchScope + deadline │
//!            └────────────┬─────────────┘
//!                         ▼
//!               DocumentStore (trait)
//!                         │
//!                         ▼
//!              SqliteStore (documents table)
//!
//!   Patient list ──► report::PatientReport ──► CSV / JSON
//! ```
//!
//! # Modules
//!
//! - [`store`]: Document store adapter and its SQLite implementation
//! - [`models`]: Domain types (Patient, Appointment, snapshots, patches)
//! - [`repo`]: Patient and appointment repositories, error taxonomy
//! - [`schedule`]: Appointment filters, upcoming list, month calendar
//! - [`report`]: Statistics and CSV export

pub mod models;
pub mod report;
pub mod repo;
pub mod schedule;
pub mod store;

// Re-export commonly used types
pub use models::{
    Appointment, AppointmentPatch, AppointmentStats, AppointmentStatus, AppointmentType,
    NewAppointment, NewPatient, Patient, PatientPatch, PatientSnapshot, Sex,
};
pub use repo::{
    AppointmentRepository, FetchScope, PatientRepository, RepoError, RepoResult,
    RepositoryOptions, ScopeGuard,
};
pub use report::PatientReport;
pub use store::{DocumentStore, SqliteStore, StoreError};

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Both repositories over one shared store.
#[derive(Clone)]
pub struct OptiCare {
    patients: PatientRepository,
    appointments: AppointmentRepository,
}

impl OptiCare {
    /// Open or create a SQLite store at the given path.
    pub fn open<P: AsRef<Path>>(path: P, options: RepositoryOptions) -> Result<Self, StoreError> {
        let store = SqliteStore::open(path)?;
        Ok(Self::with_store(Arc::new(store), options))
    }

    /// In-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = SqliteStore::open_in_memory()?;
        Ok(Self::with_store(Arc::new(store), RepositoryOptions::default()))
    }

    /// Wire the repositories to any document store.
    pub fn with_store(store: Arc<dyn DocumentStore>, options: RepositoryOptions) -> Self {
        Self {
            patients: PatientRepository::new(Arc::clone(&store), options),
            appointments: AppointmentRepository::new(store, options),
        }
    }

    pub fn patients(&self) -> &PatientRepository {
        &self.patients
    }

    pub fn appointments(&self) -> &AppointmentRepository {
        &self.appointments
    }

    /// Fetch every patient and build a report stamped `generated_at`.
    pub async fn patient_report(
        &self,
        scope: &FetchScope,
        generated_at: DateTime<Utc>,
    ) -> RepoResult<PatientReport> {
        let patients = self.patients.get_all_patients(scope).await?;
        Ok(PatientReport::build(&patients, generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let core = OptiCare::open_in_memory().unwrap();
        let scope = FetchScope::detached();
        assert!(core.patients().get_all_patients(&scope).await.unwrap().is_empty());
        assert!(core
            .appointments()
            .get_all_appointments(&scope)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_repositories_share_store() {
        let core = OptiCare::open_in_memory().unwrap();
        let scope = FetchScope::detached();

        let id = core
            .patients()
            .add_patient(NewPatient::new("Ada", "Lovelace", "ada@example.com", "555"))
            .await
            .unwrap();
        let patient = core
            .patients()
            .get_patient_by_id(&scope, &id)
            .await
            .unwrap()
            .unwrap();
        core.appointments()
            .add_appointment(NewAppointment::new(
                &patient.id,
                PatientSnapshot::of(&patient),
                "2024-03-15",
                "09:00",
            ))
            .await
            .unwrap();

        let list = core
            .appointments()
            .get_patient_appointments(&scope, &id)
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].snapshot.patient_name, "Ada Lovelace");
    }
}
