//! Appointment models.

use serde::{Deserialize, Serialize};

use super::patient::Patient;

/// Default visit length in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Kind of visit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    Consultation,
    FollowUp,
    PrescriptionExam,
    Other,
}

/// Appointment status. Any status may move to any other.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Wire name, also used as the store filter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }
}

/// Patient name and phone copied onto an appointment when it is booked.
///
/// This is a point-in-time copy: later edits to the patient are not
/// reflected here, and it survives deletion of the patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientSnapshot {
    pub patient_name: String,
    pub patient_phone: String,
}

impl PatientSnapshot {
    pub fn new(patient_name: impl Into<String>, patient_phone: impl Into<String>) -> Self {
        Self {
            patient_name: patient_name.into(),
            patient_phone: patient_phone.into(),
        }
    }

    /// Snapshot the current name and phone of a patient.
    pub fn of(patient: &Patient) -> Self {
        Self::new(patient.full_name(), patient.phone.clone())
    }
}

/// A stored appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Store-assigned ID
    pub id: String,
    /// Weak reference to a patient ID (not enforced)
    pub patient_id: String,
    #[serde(flatten)]
    pub snapshot: PatientSnapshot,
    /// `YYYY-MM-DD`, compared as text
    pub date: String,
    /// `HH:MM`, compared as text
    pub time: String,
    /// Duration in minutes
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: AppointmentType,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// Input for booking an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(default)]
    pub patient_id: String,
    #[serde(flatten)]
    pub snapshot: PatientSnapshot,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: AppointmentType,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
}

impl NewAppointment {
    /// Book a scheduled consultation for a patient snapshot.
    pub fn new(
        patient_id: impl Into<String>,
        snapshot: PatientSnapshot,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            snapshot,
            date: date.into(),
            time: time.into(),
            duration: DEFAULT_DURATION_MINUTES,
            kind: AppointmentType::default(),
            status: AppointmentStatus::default(),
            notes: String::new(),
        }
    }

    /// Names of required fields that are blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("patientId", &self.patient_id),
            ("date", &self.date),
            ("time", &self.time),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Partial appointment update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AppointmentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AppointmentPatch {
    /// Patch that only changes the status.
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Required fields this patch would blank out.
    pub fn blanked_required(&self) -> Vec<&'static str> {
        [("date", self.date.as_ref()), ("time", self.time.as_ref())]
            .into_iter()
            .filter(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }
}

/// Appointment counts by status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
}

impl AppointmentStats {
    /// Count a list of appointments by status.
    pub fn from_appointments(appointments: &[Appointment]) -> Self {
        appointments
            .iter()
            .fold(Self::default(), |mut stats, appointment| {
                stats.total += 1;
                match appointment.status {
                    AppointmentStatus::Scheduled => stats.scheduled += 1,
                    AppointmentStatus::Completed => stats.completed += 1,
                    AppointmentStatus::Cancelled => stats.cancelled += 1,
                    AppointmentStatus::NoShow => stats.no_show += 1,
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&AppointmentType::PrescriptionExam).unwrap(),
            "\"prescription-exam\""
        );
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
            "\"no-show\""
        );
        for status in AppointmentStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_new_appointment_flattens_snapshot() {
        let input = NewAppointment::new(
            "p1",
            PatientSnapshot::new("Ada Lovelace", "555"),
            "2024-03-15",
            "09:30",
        );
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["patientName"], "Ada Lovelace");
        assert_eq!(json["patientPhone"], "555");
        assert_eq!(json["type"], "consultation");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["duration"], 30);
    }

    #[test]
    fn test_missing_required() {
        let input = NewAppointment::new("", PatientSnapshot::default(), "2024-03-15", "");
        assert_eq!(input.missing_required(), vec!["patientId", "time"]);
    }

    #[test]
    fn test_patch_blanked_required() {
        assert!(AppointmentPatch::status(AppointmentStatus::Completed)
            .blanked_required()
            .is_empty());

        let patch = AppointmentPatch {
            date: Some(" ".into()),
            time: Some(String::new()),
            notes: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(patch.blanked_required(), vec!["date", "time"]);
    }

    #[test]
    fn test_stats_from_appointments() {
        let make = |status| Appointment {
            id: "a".into(),
            patient_id: "p".into(),
            snapshot: PatientSnapshot::default(),
            date: "2024-03-15".into(),
            time: "09:00".into(),
            duration: 30,
            kind: AppointmentType::Consultation,
            status,
            notes: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let list = vec![
            make(AppointmentStatus::Scheduled),
            make(AppointmentStatus::Scheduled),
            make(AppointmentStatus::NoShow),
            make(AppointmentStatus::Completed),
        ];
        let stats = AppointmentStats::from_appointments(&list);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 0);
        assert_eq!(stats.no_show, 1);
    }
}
