//! Appointment repository.

use std::sync::Arc;

use tracing::info;

use super::{decode_all, FetchScope, RepoError, RepoResult, RepositoryOptions, StoreHandle};
use crate::models::{Appointment, AppointmentPatch, AppointmentStats, NewAppointment};
use crate::store::{to_fields, Direction, Document, DocumentStore, Query, APPOINTMENTS};

/// CRUD and scheduling queries over the `appointments` collection.
///
/// Bookings are not checked for overlaps, and `patientId` is not checked
/// against the patients collection.
#[derive(Clone)]
pub struct AppointmentRepository {
    handle: StoreHandle,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>, options: RepositoryOptions) -> Self {
        Self {
            handle: StoreHandle::new(store, options),
        }
    }

    /// Book an appointment. The patient name/phone come from the snapshot
    /// carried by `data`.
    pub async fn add_appointment(&self, data: NewAppointment) -> RepoResult<String> {
        let missing = data.missing_required();
        if !missing.is_empty() {
            return Err(RepoError::missing_fields(&missing));
        }

        let fields = to_fields(&data)?;
        let id = self
            .handle
            .write("appointment", move |store| store.create(APPOINTMENTS, fields))
            .await?;
        info!(
            appointment_id = %id,
            patient_id = %data.patient_id,
            date = %data.date,
            time = %data.time,
            "appointment booked"
        );
        Ok(id)
    }

    /// All appointments, latest date first.
    pub async fn get_all_appointments(&self, scope: &FetchScope) -> RepoResult<Vec<Appointment>> {
        let query = Query::new().order_by("date", Direction::Descending);
        self.list(scope, "appointments", query).await
    }

    /// An appointment by ID, or `None`.
    pub async fn get_appointment_by_id(
        &self,
        scope: &FetchScope,
        id: &str,
    ) -> RepoResult<Option<Appointment>> {
        let id = id.to_string();
        let doc = self
            .handle
            .read(scope, "appointment", move |store| {
                store.get_by_id(APPOINTMENTS, &id)
            })
            .await?
            .or_empty();
        Ok(doc.map(Document::decode).transpose()?)
    }

    /// A patient's appointments, latest date first.
    pub async fn get_patient_appointments(
        &self,
        scope: &FetchScope,
        patient_id: &str,
    ) -> RepoResult<Vec<Appointment>> {
        let query = Query::new()
            .where_eq("patientId", patient_id)
            .order_by("date", Direction::Descending);
        self.list(scope, "patient appointments", query).await
    }

    /// Appointments whose `date` text equals `date` exactly, earliest time
    /// first. `"2024-3-15"` does not match `"2024-03-15"`.
    pub async fn get_appointments_by_date(
        &self,
        scope: &FetchScope,
        date: &str,
    ) -> RepoResult<Vec<Appointment>> {
        let query = Query::new()
            .where_eq("date", date)
            .order_by("time", Direction::Ascending);
        self.list(scope, "appointments for date", query).await
    }

    /// Apply a partial update. Status may change to any value; date and
    /// time may not be blanked.
    pub async fn update_appointment(&self, id: &str, patch: AppointmentPatch) -> RepoResult<()> {
        let blanked = patch.blanked_required();
        if !blanked.is_empty() {
            return Err(RepoError::missing_fields(&blanked));
        }

        let fields = to_fields(&patch)?;
        let id = id.to_string();
        self.handle
            .write("appointment", move |store| {
                store.update(APPOINTMENTS, &id, fields)
            })
            .await
    }

    /// Hard delete.
    pub async fn delete_appointment(&self, id: &str) -> RepoResult<()> {
        let id = id.to_string();
        self.handle
            .write("appointment", move |store| store.delete(APPOINTMENTS, &id))
            .await
    }

    /// Counts by status, recomputed from the full list on every call.
    pub async fn get_appointment_stats(&self, scope: &FetchScope) -> RepoResult<AppointmentStats> {
        let appointments = self.get_all_appointments(scope).await?;
        Ok(AppointmentStats::from_appointments(&appointments))
    }

    async fn list(
        &self,
        scope: &FetchScope,
        what: &'static str,
        query: Query,
    ) -> RepoResult<Vec<Appointment>> {
        let docs = self
            .handle
            .read(scope, what, move |store| store.list(APPOINTMENTS, &query))
            .await?
            .or_empty();
        decode_all(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, AppointmentType, PatientSnapshot};
    use crate::store::SqliteStore;

    fn setup_repo() -> AppointmentRepository {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        AppointmentRepository::new(store, RepositoryOptions::default())
    }

    fn booking(patient_id: &str, date: &str, time: &str) -> NewAppointment {
        NewAppointment::new(
            patient_id,
            PatientSnapshot::new("Ada Lovelace", "555-0101"),
            date,
            time,
        )
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let repo = setup_repo();
        let scope = FetchScope::detached();

        let mut input = booking("p1", "2024-03-15", "09:30");
        input.kind = AppointmentType::PrescriptionExam;
        input.duration = 45;
        input.notes = "bring old glasses".into();

        let id = repo.add_appointment(input).await.unwrap();
        let appointment = repo.get_appointment_by_id(&scope, &id).await.unwrap().unwrap();

        assert_eq!(appointment.patient_id, "p1");
        assert_eq!(appointment.snapshot.patient_name, "Ada Lovelace");
        assert_eq!(appointment.kind, AppointmentType::PrescriptionExam);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.duration, 45);
        assert_eq!(appointment.notes, "bring old glasses");
    }

    #[tokio::test]
    async fn test_add_requires_patient_date_time() {
        let repo = setup_repo();
        let err = repo
            .add_appointment(booking("p1", "", "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(ref msg) if msg.contains("date")));
    }

    #[tokio::test]
    async fn test_all_appointments_sorted_by_date_desc() {
        let repo = setup_repo();
        for date in ["2024-03-01", "2024-05-20", "2024-04-10"] {
            repo.add_appointment(booking("p1", date, "10:00")).await.unwrap();
        }

        let all = repo
            .get_all_appointments(&FetchScope::detached())
            .await
            .unwrap();
        let dates: Vec<_> = all.iter().map(|a| a.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-20", "2024-04-10", "2024-03-01"]);
    }

    #[tokio::test]
    async fn test_patient_appointments() {
        let repo = setup_repo();
        repo.add_appointment(booking("p1", "2024-03-01", "10:00")).await.unwrap();
        repo.add_appointment(booking("p2", "2024-03-02", "10:00")).await.unwrap();
        repo.add_appointment(booking("p1", "2024-03-03", "10:00")).await.unwrap();

        let list = repo
            .get_patient_appointments(&FetchScope::detached(), "p1")
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].date, "2024-03-03");
        assert!(list.iter().all(|a| a.patient_id == "p1"));
    }

    #[tokio::test]
    async fn test_status_change_and_stats() {
        let repo = setup_repo();
        let scope = FetchScope::detached();
        let a = repo.add_appointment(booking("p1", "2024-03-01", "10:00")).await.unwrap();
        let b = repo.add_appointment(booking("p1", "2024-03-02", "10:00")).await.unwrap();
        repo.add_appointment(booking("p2", "2024-03-02", "11:00")).await.unwrap();

        repo.update_appointment(&a, AppointmentPatch::status(AppointmentStatus::Completed))
            .await
            .unwrap();
        repo.update_appointment(&b, AppointmentPatch::status(AppointmentStatus::NoShow))
            .await
            .unwrap();
        // Any transition is allowed, including back out of a terminal state.
        repo.update_appointment(&a, AppointmentPatch::status(AppointmentStatus::Cancelled))
            .await
            .unwrap();

        let stats = repo.get_appointment_stats(&scope).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.scheduled, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.no_show, 1);
        assert_eq!(stats.completed, 0);
    }

    #[tokio::test]
    async fn test_double_booking_is_accepted() {
        let repo = setup_repo();
        repo.add_appointment(booking("p1", "2024-03-15", "09:00")).await.unwrap();
        repo.add_appointment(booking("p2", "2024-03-15", "09:00")).await.unwrap();

        let list = repo
            .get_appointments_by_date(&FetchScope::detached(), "2024-03-15")
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_appointment() {
        let repo = setup_repo();
        let scope = FetchScope::detached();
        let id = repo.add_appointment(booking("p1", "2024-03-15", "09:00")).await.unwrap();

        repo.delete_appointment(&id).await.unwrap();
        assert!(repo.get_appointment_by_id(&scope, &id).await.unwrap().is_none());
        repo.delete_appointment(&id).await.unwrap();
    }
}
