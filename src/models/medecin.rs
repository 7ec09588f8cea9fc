use serde::{Deserialize, Serialize};

use super::enums::{lenient_or_default, DoctorStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medecin {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub specialite: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    #[serde(deserialize_with = "lenient_or_default")]
    pub status: DoctorStatus,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

impl Medecin {
    pub fn nom_complet(&self) -> String {
        format!("{} {}", self.nom, self.prenom).trim().to_string()
    }

    pub fn is_on_leave(&self) -> bool {
        self.status == DoctorStatus::EnConge
    }
}
