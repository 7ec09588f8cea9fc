//! Whole-collection breakdowns: totals, distributions and podiatry figures.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::dates::parse_instant;
use crate::models::*;

pub const NOT_SPECIFIED: &str = "Non spécifié";

pub const AGE_BRACKETS: [&str; 4] = ["18-29", "30-49", "50-69", "70+"];

pub const WEEKDAY_LABELS: [&str; 7] = ["Lun", "Mar", "Mer", "Jeu", "Ven", "Sam", "Dim"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Count values in first-seen order. Missing or blank values are grouped
/// under [`NOT_SPECIFIED`].
pub fn count_by<'a, I>(values: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: Vec<LabelCount> = Vec::new();
    for value in values {
        let label = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_SPECIFIED);
        match counts.iter_mut().find(|c| c.label == label) {
            Some(c) => c.count += 1,
            None => counts.push(LabelCount { label: label.to_string(), count: 1 }),
        }
    }
    counts
}

// ─── Totals ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_patients: usize,
    pub total_medecins: usize,
    pub total_rendez_vous: usize,
    pub total_consultations: usize,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThisMonth {
    pub new_patients: usize,
    pub rendez_vous: usize,
    pub consultations: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Today {
    pub rendez_vous: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub consultations: usize,
}

fn revenue<'a>(consultations: impl Iterator<Item = &'a Consultation>) -> f64 {
    consultations.filter_map(|c| c.montant).sum()
}

pub fn overview(snapshot: &ClinicSnapshot<'_>) -> Overview {
    Overview {
        total_patients: snapshot.patients.len(),
        total_medecins: snapshot.medecins.len(),
        total_rendez_vous: snapshot.rendez_vous.len(),
        total_consultations: snapshot.consultations.len(),
        total_revenue: revenue(snapshot.consultations.iter()),
    }
}

fn same_month(at: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    at.is_some_and(|d| d.year() == now.year() && d.month() == now.month())
}

pub fn this_month(snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> ThisMonth {
    let consultations: Vec<&Consultation> = snapshot
        .consultations
        .iter()
        .filter(|c| same_month(c.when(), now))
        .collect();

    ThisMonth {
        new_patients: snapshot
            .patients
            .iter()
            .filter(|p| same_month(p.created(), now))
            .count(),
        rendez_vous: snapshot
            .rendez_vous
            .iter()
            .filter(|r| same_month(r.when(), now))
            .count(),
        consultations: consultations.len(),
        revenue: revenue(consultations.into_iter()),
    }
}

pub fn today(snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Today {
    Today {
        rendez_vous: snapshot
            .rendez_vous
            .iter()
            .filter(|r| r.when().is_some_and(|d| d.date() == now.date()))
            .count(),
    }
}

/// Consultations per patient as a percentage, one decimal.
pub fn taux_suivi(consultations: usize, patients: usize) -> String {
    if patients == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", consultations as f64 / patients as f64 * 100.0)
}

/// Consultations per calendar month, chronological.
pub fn monthly_trend(consultations: &[Consultation]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for at in consultations.iter().filter_map(|c| c.when()) {
        *months.entry((at.year(), at.month())).or_default() += 1;
    }
    months
        .into_iter()
        .map(|((year, month), consultations)| MonthlyTrend { year, month, consultations })
        .collect()
}

// ─── Distributions ───────────────────────────────────────────────────────────

/// Age bracket label. Anything under 30, including a missing age, falls in
/// the first bracket.
pub fn age_bracket(age: Option<u32>) -> &'static str {
    match age.unwrap_or(0) {
        0..=29 => AGE_BRACKETS[0],
        30..=49 => AGE_BRACKETS[1],
        50..=69 => AGE_BRACKETS[2],
        _ => AGE_BRACKETS[3],
    }
}

pub fn age_distribution(patients: &[Patient]) -> Vec<LabelCount> {
    AGE_BRACKETS
        .iter()
        .map(|bracket| LabelCount {
            label: bracket.to_string(),
            count: patients.iter().filter(|p| age_bracket(p.age) == *bracket).count(),
        })
        .collect()
}

/// Appointments per weekday, Monday first. Unparseable dates are skipped.
pub fn visits_by_weekday(rendez_vous: &[RendezVous]) -> Vec<LabelCount> {
    let mut counts = [0usize; 7];
    for rdv in rendez_vous {
        if let Some(at) = parse_instant(&rdv.date) {
            counts[at.weekday().num_days_from_monday() as usize] += 1;
        }
    }
    WEEKDAY_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| LabelCount { label: label.to_string(), count })
        .collect()
}

fn flag_counts<const N: usize>(
    flag_sets: impl Iterator<Item = [(&'static str, bool); N]>,
    keys: [&'static str; N],
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = keys.iter().map(|k| (k.to_string(), 0)).collect();
    for flags in flag_sets {
        for (name, set) in flags {
            if set {
                *counts.entry(name.to_string()).or_default() += 1;
            }
        }
    }
    counts
}

pub fn risk_factors(patients: &[Patient]) -> BTreeMap<String, usize> {
    let keys = FacteursRisque::default().flags().map(|(k, _)| k);
    flag_counts(
        patients
            .iter()
            .filter_map(|p| p.diagnostic.as_ref()?.facteurs_risque.as_ref())
            .map(FacteursRisque::flags),
        keys,
    )
}

pub fn antecedents_medicaux(patients: &[Patient]) -> BTreeMap<String, usize> {
    let keys = AntecedentsMedicaux::default().flags().map(|(k, _)| k);
    flag_counts(
        patients
            .iter()
            .filter_map(|p| p.antecedents.as_ref()?.medicaux_details.as_ref())
            .map(AntecedentsMedicaux::flags),
        keys,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdowns {
    pub patients_by_diabetes_type: Vec<LabelCount>,
    pub sex_distribution: Vec<LabelCount>,
    pub age_distribution: Vec<LabelCount>,
    pub rendez_vous_status: Vec<LabelCount>,
    pub visits_by_weekday: Vec<LabelCount>,
    pub operation_types: Vec<LabelCount>,
    pub operation_laterality: Vec<LabelCount>,
    pub operation_reprise: Vec<LabelCount>,
    pub amputation_anterieure: Vec<LabelCount>,
    pub amputation_familiale: Vec<LabelCount>,
    pub maladie_cardio_types: Vec<LabelCount>,
    pub maladie_cardio_fe: Vec<LabelCount>,
    pub risk_factors: BTreeMap<String, usize>,
    pub antecedents_medicaux: BTreeMap<String, usize>,
}

fn by_diagnostic(patients: &[Patient], f: fn(&Diagnostic) -> Option<&str>) -> Vec<LabelCount> {
    count_by(patients.iter().map(|p| p.diagnostic.as_ref().and_then(f)))
}

fn by_chirurgicaux(
    patients: &[Patient],
    f: fn(&AntecedentsChirurgicaux) -> Option<&str>,
) -> Vec<LabelCount> {
    count_by(patients.iter().map(|p| {
        p.antecedents
            .as_ref()
            .and_then(|a| a.chirurgicaux_details.as_ref())
            .and_then(f)
    }))
}

pub fn breakdowns(snapshot: &ClinicSnapshot<'_>) -> Breakdowns {
    let patients = snapshot.patients;
    Breakdowns {
        patients_by_diabetes_type: count_by(patients.iter().map(|p| p.diabete.as_deref())),
        sex_distribution: count_by(patients.iter().map(|p| p.sexe.as_deref())),
        age_distribution: age_distribution(patients),
        rendez_vous_status: count_by(
            snapshot.rendez_vous.iter().map(|r| r.statut.map(|s| s.as_str())),
        ),
        visits_by_weekday: visits_by_weekday(snapshot.rendez_vous),
        operation_types: by_diagnostic(patients, |d| d.type_operation.as_deref()),
        operation_laterality: by_diagnostic(patients, |d| d.laterality.as_deref()),
        operation_reprise: by_diagnostic(patients, |d| d.reprise.as_deref()),
        amputation_anterieure: by_chirurgicaux(patients, |c| c.amputation_anterieure.as_deref()),
        amputation_familiale: by_chirurgicaux(patients, |c| c.amputation_familiale.as_deref()),
        maladie_cardio_types: by_diagnostic(patients, |d| d.maladie_cardiovasculaire.as_deref()),
        maladie_cardio_fe: by_diagnostic(patients, |d| d.fraction_ejection.as_deref()),
        risk_factors: risk_factors(patients),
        antecedents_medicaux: antecedents_medicaux(patients),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AppointmentStatus, AppointmentType};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn patient_with_age(age: Option<u32>) -> Patient {
        Patient { age, ..Default::default() }
    }

    #[test]
    fn count_by_groups_missing_values() {
        let counts = count_by([Some("Type 2"), None, Some("Type 1"), Some(" "), Some("Type 2")]);
        assert_eq!(
            counts,
            vec![
                LabelCount { label: "Type 2".into(), count: 2 },
                LabelCount { label: NOT_SPECIFIED.into(), count: 2 },
                LabelCount { label: "Type 1".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn age_brackets_cover_edges() {
        assert_eq!(age_bracket(Some(12)), "18-29");
        assert_eq!(age_bracket(None), "18-29");
        assert_eq!(age_bracket(Some(29)), "18-29");
        assert_eq!(age_bracket(Some(30)), "30-49");
        assert_eq!(age_bracket(Some(69)), "50-69");
        assert_eq!(age_bracket(Some(70)), "70+");

        let patients: Vec<Patient> =
            [Some(25), Some(45), Some(61), Some(66), Some(82)].map(patient_with_age).into();
        let counts: Vec<usize> = age_distribution(&patients).iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![1, 1, 2, 1]);
    }

    #[test]
    fn taux_suivi_formats_one_decimal() {
        assert_eq!(taux_suivi(0, 0), "0.0%");
        assert_eq!(taux_suivi(5, 4), "125.0%");
        assert_eq!(taux_suivi(1, 3), "33.3%");
    }

    #[test]
    fn monthly_trend_is_chronological() {
        let consultations: Vec<Consultation> =
            ["2024-02-10", "2023-12-01", "2024-02-28", "pas de date", "2024-01-05"]
                .iter()
                .map(|d| Consultation { date: d.to_string(), ..Default::default() })
                .collect();
        let trend = monthly_trend(&consultations);
        assert_eq!(
            trend,
            vec![
                MonthlyTrend { year: 2023, month: 12, consultations: 1 },
                MonthlyTrend { year: 2024, month: 1, consultations: 1 },
                MonthlyTrend { year: 2024, month: 2, consultations: 2 },
            ]
        );
    }

    #[test]
    fn totals_month_and_today() {
        let now = dt("2024-05-08 10:00:00");
        let patients = vec![
            Patient { created_at: Some("2024-05-02".into()), ..Default::default() },
            Patient { created_at: Some("2024-04-30".into()), ..Default::default() },
        ];
        let rdvs = vec![
            RendezVous { date: "2024-05-08T15:00:00".into(), ..Default::default() },
            RendezVous { date: "2024-05-20".into(), ..Default::default() },
            RendezVous { date: "2024-06-01".into(), ..Default::default() },
        ];
        let consultations = vec![
            Consultation { date: "2024-05-03".into(), montant: Some(3000.0), ..Default::default() },
            Consultation { date: "2024-04-03".into(), montant: Some(2000.0), ..Default::default() },
            Consultation { date: "2024-05-04".into(), montant: None, ..Default::default() },
        ];
        let snapshot = ClinicSnapshot {
            patients: &patients,
            medecins: &[],
            rendez_vous: &rdvs,
            consultations: &consultations,
        };

        let o = overview(&snapshot);
        assert_eq!(o.total_revenue, 5000.0);
        assert_eq!(o.total_rendez_vous, 3);

        let m = this_month(&snapshot, now);
        assert_eq!((m.new_patients, m.rendez_vous, m.consultations), (1, 2, 2));
        assert_eq!(m.revenue, 3000.0);

        assert_eq!(today(&snapshot, now).rendez_vous, 1);
    }

    #[test]
    fn weekday_counts_start_monday() {
        let rdvs: Vec<RendezVous> = ["2024-05-06", "2024-05-12T18:00:00", "2024-05-13", "??"]
            .iter()
            .map(|d| RendezVous { date: d.to_string(), ..Default::default() })
            .collect();
        let counts: Vec<(String, usize)> = visits_by_weekday(&rdvs)
            .into_iter()
            .map(|c| (c.label, c.count))
            .collect();
        assert_eq!(counts[0], ("Lun".to_string(), 2));
        assert_eq!(counts[6], ("Dim".to_string(), 1));
        assert_eq!(counts.iter().map(|(_, c)| c).sum::<usize>(), 3);
    }

    #[test]
    fn podiatry_breakdowns_and_flags() {
        let patients = vec![
            Patient {
                diagnostic: Some(Diagnostic {
                    type_operation: Some("Amputation mineure".into()),
                    laterality: Some("Droite".into()),
                    facteurs_risque: Some(FacteursRisque {
                        hta: true,
                        tabac: true,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                antecedents: Some(Antecedents {
                    medicaux_details: Some(AntecedentsMedicaux { aomi: true, ..Default::default() }),
                    chirurgicaux_details: Some(AntecedentsChirurgicaux {
                        amputation_anterieure: Some("Oui".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Patient {
                diagnostic: Some(Diagnostic {
                    type_operation: Some("Amputation mineure".into()),
                    facteurs_risque: Some(FacteursRisque { hta: true, ..Default::default() }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Patient::default(),
        ];
        let rdvs = vec![RendezVous {
            statut: Some(AppointmentStatus::EnAttente),
            kind: AppointmentType::Consultation,
            ..Default::default()
        }];
        let snapshot = ClinicSnapshot { patients: &patients, rendez_vous: &rdvs, ..Default::default() };
        let b = breakdowns(&snapshot);

        assert_eq!(b.operation_types[0], LabelCount { label: "Amputation mineure".into(), count: 2 });
        assert_eq!(b.operation_types[1].label, NOT_SPECIFIED);
        assert_eq!(b.operation_laterality.len(), 2);
        assert_eq!(b.amputation_anterieure[0].label, "Oui");
        assert_eq!(b.risk_factors["hta"], 2);
        assert_eq!(b.risk_factors["tabac"], 1);
        assert_eq!(b.risk_factors["cancer"], 0);
        assert_eq!(b.risk_factors.len(), 6);
        assert_eq!(b.antecedents_medicaux["aomi"], 1);
        assert_eq!(b.rendez_vous_status[0].label, "En attente");
        assert_eq!(b.sex_distribution, vec![LabelCount { label: NOT_SPECIFIED.into(), count: 3 }]);
    }
}
