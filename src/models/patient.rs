use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::dates::{parse_instant, parse_opt};
use super::enums::{lenient_option, TreatmentStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub age: Option<u32>,
    pub sexe: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    /// Diabetes classification, e.g. "Type 1" / "Type 2".
    pub diabete: Option<String>,
    pub derniere_visite: Option<String>,
    pub date_consultation: Option<String>,
    pub notes: Option<String>,
    pub ordonnances: Vec<String>,
    pub etat_civil: Option<EtatCivil>,
    pub diagnostic: Option<Diagnostic>,
    pub antecedents: Option<Antecedents>,
    pub clinique: Option<Clinique>,
    pub evolution: Option<Evolution>,
    pub anesthesie: Option<Anesthesie>,
    #[serde(deserialize_with = "lenient_option")]
    pub statut: Option<TreatmentStatus>,
    pub statut_history: Vec<StatusEntry>,
    pub created_at: Option<String>,
}

impl Patient {
    pub fn nom_complet(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    /// Most recent contact date: last visit, then consultation date, then
    /// creation timestamp. Unparseable values are skipped.
    pub fn last_activity(&self) -> Option<NaiveDateTime> {
        parse_opt(self.derniere_visite.as_deref())
            .or_else(|| parse_opt(self.date_consultation.as_deref()))
            .or_else(|| parse_opt(self.created_at.as_deref()))
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        parse_opt(self.created_at.as_deref())
    }

    /// Status in effect at `at`, from the history list.
    pub fn status_at(&self, at: NaiveDateTime) -> Option<TreatmentStatus> {
        self.statut_history
            .iter()
            .filter_map(|e| parse_instant(&e.date).map(|d| (d, e.statut)))
            .filter(|(d, _)| *d <= at)
            .max_by_key(|(d, _)| *d)
            .map(|(_, s)| s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub statut: TreatmentStatus,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtatCivil {
    pub profession: Option<String>,
    pub origine: Option<String>,
    pub habitudes_toxiques: Option<HabitudesToxiques>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitudesToxiques {
    pub tabac: bool,
    pub alcool: bool,
    pub autres: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostic {
    pub type_operation: Option<String>,
    pub type_operation_preciser: Option<String>,
    pub laterality: Option<String>,
    pub reprise: Option<String>,
    pub date_operation: Option<String>,
    pub facteurs_risque: Option<FacteursRisque>,
    pub maladie_cardiovasculaire: Option<String>,
    #[serde(rename = "maladie_cardiovasculaire_fe")]
    pub fraction_ejection: Option<String>,
    pub maladie_cardiovasculaire_autre: Option<String>,
    pub depuis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacteursRisque {
    pub hta: bool,
    pub diabete: bool,
    pub dyslipidemie: bool,
    pub obesite: bool,
    pub tabac: bool,
    pub cancer: bool,
    pub autres: Option<String>,
}

impl FacteursRisque {
    /// Flag name / value pairs, in display order.
    pub fn flags(&self) -> [(&'static str, bool); 6] {
        [
            ("hta", self.hta),
            ("diabete", self.diabete),
            ("dyslipidemie", self.dyslipidemie),
            ("obesite", self.obesite),
            ("tabac", self.tabac),
            ("cancer", self.cancer),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Antecedents {
    pub medicaux: Option<String>,
    pub medicaux_details: Option<AntecedentsMedicaux>,
    pub chirurgicaux: Option<String>,
    pub chirurgicaux_details: Option<AntecedentsChirurgicaux>,
    pub familiaux: Option<AntecedentsFamiliaux>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntecedentsMedicaux {
    pub angor_effort: bool,
    pub sca: bool,
    pub idm: bool,
    pub aomi: bool,
    pub avc: bool,
}

impl AntecedentsMedicaux {
    pub fn flags(&self) -> [(&'static str, bool); 5] {
        [
            ("angor_effort", self.angor_effort),
            ("sca", self.sca),
            ("idm", self.idm),
            ("aomi", self.aomi),
            ("avc", self.avc),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntecedentsChirurgicaux {
    pub amputation_anterieure: Option<String>,
    pub amputation_anterieure_type: Option<String>,
    pub amputation_familiale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntecedentsFamiliaux {
    pub hta: bool,
    pub dt2: bool,
    pub autres: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clinique {
    pub tension_arterielle: Option<TensionArterielle>,
    pub frequence_cardiaque: Option<f64>,
    pub poids: Option<f64>,
    pub taille: Option<f64>,
    pub bmi: Option<f64>,
    pub examen_neurologique: Option<ExamenNeurologique>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionArterielle {
    pub systolique: Option<f64>,
    pub diastolique: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamenNeurologique {
    pub effectue: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evolution {
    pub cicatrisation_delai: Option<f64>,
    pub cicatrisation_unite: Option<String>,
    pub prothese_date: Option<String>,
    pub crp: Option<SerieSuivi>,
    pub hemoglobine_glyquee: Option<SerieSuivi>,
    pub troponine_avant: Option<f64>,
    pub troponine_apres: Option<f64>,
    pub cycle: Option<String>,
    pub autre: Option<String>,
}

/// Follow-up lab series: baseline then one, two and three months.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerieSuivi {
    pub initial: Option<f64>,
    pub un_mois: Option<f64>,
    pub deux_mois: Option<f64>,
    pub trois_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anesthesie {
    pub ag: bool,
    pub alr: Vec<String>,
    /// ASA physical-status classification, carried opaquely.
    pub asa: Option<String>,
}
