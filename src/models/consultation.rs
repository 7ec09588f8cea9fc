use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::dates::parse_instant;
use super::enums::AppointmentType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consultation {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub patient_id: Option<String>,
    pub medecin_id: Option<String>,
    pub diagnostic: Option<String>,
    pub traitement: Option<String>,
    pub notes: Option<String>,
    /// Duration in minutes.
    pub duree: Option<u32>,
    pub statut: Option<String>,
    pub montant: Option<f64>,
    /// Payment status, e.g. "Payé".
    pub paiement: Option<String>,
}

impl Consultation {
    pub fn when(&self) -> Option<NaiveDateTime> {
        parse_instant(&self.date)
    }
}
