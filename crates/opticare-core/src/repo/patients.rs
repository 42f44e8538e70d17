//! Patient repository.

use std::sync::Arc;

use tracing::info;

use super::{decode_all, FetchScope, RepoError, RepoResult, RepositoryOptions, StoreHandle};
use crate::models::{filter_patients, NewPatient, Patient, PatientPatch};
use crate::store::{to_fields, Document, DocumentStore, Query, PATIENTS};

/// CRUD over the `patients` collection.
#[derive(Clone)]
pub struct PatientRepository {
    handle: StoreHandle,
}

impl PatientRepository {
    pub fn new(store: Arc<dyn DocumentStore>, options: RepositoryOptions) -> Self {
        Self {
            handle: StoreHandle::new(store, options),
        }
    }

    /// Add a patient and return the store-assigned ID.
    pub async fn add_patient(&self, data: NewPatient) -> RepoResult<String> {
        let missing = data.missing_required();
        if !missing.is_empty() {
            return Err(RepoError::missing_fields(&missing));
        }

        let fields = to_fields(&data)?;
        let id = self
            .handle
            .write("patient", move |store| store.create(PATIENTS, fields))
            .await?;
        info!(patient_id = %id, "patient added");
        Ok(id)
    }

    /// Every patient, in no particular order. Empty if the caller went away.
    pub async fn get_all_patients(&self, scope: &FetchScope) -> RepoResult<Vec<Patient>> {
        let docs = self
            .handle
            .read(scope, "patients", |store| store.list(PATIENTS, &Query::new()))
            .await?
            .or_empty();
        decode_all(docs)
    }

    /// A patient by ID, or `None`.
    pub async fn get_patient_by_id(
        &self,
        scope: &FetchScope,
        id: &str,
    ) -> RepoResult<Option<Patient>> {
        let id = id.to_string();
        let doc = self
            .handle
            .read(scope, "patient", move |store| store.get_by_id(PATIENTS, &id))
            .await?
            .or_empty();
        Ok(doc.map(Document::decode).transpose()?)
    }

    /// Patients matching `term` on name, email or phone.
    ///
    /// Fetches the whole collection and filters in memory; practices hold
    /// at most a few thousand records.
    pub async fn search_patients(
        &self,
        scope: &FetchScope,
        term: &str,
    ) -> RepoResult<Vec<Patient>> {
        let patients = self.get_all_patients(scope).await?;
        Ok(filter_patients(&patients, term).into_iter().cloned().collect())
    }

    /// Apply a partial update.
    pub async fn update_patient(&self, id: &str, patch: PatientPatch) -> RepoResult<()> {
        let blanked = patch.blanked_required();
        if !blanked.is_empty() {
            return Err(RepoError::missing_fields(&blanked));
        }

        let fields = to_fields(&patch)?;
        let id = id.to_string();
        self.handle
            .write("patient", move |store| store.update(PATIENTS, &id, fields))
            .await
    }

    /// Hard delete. Appointments referencing the patient are left alone.
    pub async fn delete_patient(&self, id: &str) -> RepoResult<()> {
        let id = id.to_string();
        self.handle
            .write("patient", move |store| store.delete(PATIENTS, &id))
            .await
    }
}
