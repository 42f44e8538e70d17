//! Patient models.

use serde::{Deserialize, Serialize};

/// Sex as recorded on the intake form. Unset is stored as the empty string.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sex {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "other")]
    Other,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

/// Fixed set of history categories captured during an eye examination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HistoryCategory {
    /// Past medical history
    #[serde(rename = "pmHx")]
    PastMedical,
    /// Past ocular history
    #[serde(rename = "poHx")]
    PastOcular,
    /// Visual display unit exposure
    #[serde(rename = "vdu")]
    VisualDisplayUnit,
    #[serde(rename = "strabismus")]
    Strabismus,
    /// Near point of convergence
    #[serde(rename = "npc")]
    NearPointOfConvergence,
}

impl HistoryCategory {
    /// Short label used on printed records.
    pub fn label(&self) -> &'static str {
        match self {
            HistoryCategory::PastMedical => "PM Hx",
            HistoryCategory::PastOcular => "PO Hx",
            HistoryCategory::VisualDisplayUnit => "VDU",
            HistoryCategory::Strabismus => "Strabismus",
            HistoryCategory::NearPointOfConvergence => "NPC",
        }
    }
}

/// One tagged history note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub category: HistoryCategory,
    #[serde(default)]
    pub text: String,
}

impl HistoryEntry {
    pub fn new(category: HistoryCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// Prescription for a single eye. Empty string means "not recorded".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EyePrescription {
    pub sphere: String,
    pub cylinder: String,
    pub axis: String,
    pub add: String,
    pub pd: String,
}

impl EyePrescription {
    /// True when at least one measurement was recorded.
    pub fn is_recorded(&self) -> bool {
        [&self.sphere, &self.cylinder, &self.axis, &self.add, &self.pd]
            .iter()
            .any(|v| !v.is_empty())
    }
}

/// A stored patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Store-assigned ID
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Age as entered (text-encoded integer)
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    /// Insurance provider
    #[serde(default)]
    pub insurance: String,
    /// Chief complaint
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Right eye
    #[serde(default)]
    pub od: EyePrescription,
    /// Left eye
    #[serde(default)]
    pub os: EyePrescription,
    /// Creation timestamp (store time)
    pub created_at: String,
    /// Last update timestamp (store time)
    pub updated_at: String,
}

impl Patient {
    /// "First Last", as shown in lists and copied onto appointments.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// One-line sphere summary for both eyes, `-` when not recorded.
    pub fn prescription_summary(&self) -> String {
        let od = dash_if_empty(&self.od.sphere);
        let os = dash_if_empty(&self.os.sphere);
        format!("OD: {}, OS: {}", od, os)
    }

    /// Case-insensitive match on names and email, plain substring on phone.
    pub fn matches(&self, term: &str) -> bool {
        let lower = term.to_lowercase();
        self.first_name.to_lowercase().contains(&lower)
            || self.last_name.to_lowercase().contains(&lower)
            || self.email.to_lowercase().contains(&lower)
            || self.phone.contains(term)
    }
}

fn dash_if_empty(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Filter an already-fetched patient list by a search term.
pub fn filter_patients<'a>(patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| p.matches(term)).collect()
}

/// Input for creating a patient. Everything but the four identifying
/// fields defaults to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub sex: Sex,
    pub date_of_birth: String,
    pub address: String,
    pub insurance: String,
    pub problem: String,
    pub notes: String,
    pub history: Vec<HistoryEntry>,
    pub od: EyePrescription,
    pub os: EyePrescription,
}

impl NewPatient {
    /// Create a new patient input with the required fields.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    /// Names of required fields that are blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        required_blanks([
            ("firstName", Some(&self.first_name)),
            ("lastName", Some(&self.last_name)),
            ("email", Some(&self.email)),
            ("phone", Some(&self.phone)),
        ])
    }
}

/// Partial update of one eye. Measurements left as `None` keep their
/// stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EyePrescriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sphere: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cylinder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pd: Option<String>,
}

/// Partial update. Only `Some` fields are written; prescriptions merge
/// per measurement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub od: Option<EyePrescriptionPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<EyePrescriptionPatch>,
}

impl PatientPatch {
    /// Patch that only replaces the clinical notes.
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }

    /// Required fields this patch would blank out.
    pub fn blanked_required(&self) -> Vec<&'static str> {
        required_blanks([
            ("firstName", self.first_name.as_ref()),
            ("lastName", self.last_name.as_ref()),
            ("email", self.email.as_ref()),
            ("phone", self.phone.as_ref()),
        ])
    }
}

fn required_blanks<const N: usize>(fields: [(&'static str, Option<&String>); N]) -> Vec<&'static str> {
    fields
        .into_iter()
        .filter(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
}
