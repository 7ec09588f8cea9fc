use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::dates::parse_instant;
use super::enums::{lenient_option, AppointmentStatus, AppointmentType};

/// A scheduled appointment ("rendez-vous").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendezVous {
    pub id: String,
    pub date: String,
    /// Time of day, `HH:MM`.
    pub heure: String,
    /// Patient display name.
    pub patient: String,
    pub patient_id: Option<String>,
    /// Doctor display name.
    pub medecin: String,
    pub medecin_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(deserialize_with = "lenient_option")]
    pub statut: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl RendezVous {
    pub fn when(&self) -> Option<NaiveDateTime> {
        parse_instant(&self.date)
    }

    /// Confirmed or completed, i.e. counted in weekly activity.
    pub fn is_qualifying(&self) -> bool {
        self.statut.is_some_and(|s| s.is_qualifying())
    }

    /// Doctor identity used for double-booking checks: the id when both
    /// sides carry one, the display name otherwise.
    pub fn same_doctor(&self, other: &RendezVous) -> bool {
        match (&self.medecin_id, &other.medecin_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.medecin.trim().eq_ignore_ascii_case(other.medecin.trim()),
        }
    }
}
