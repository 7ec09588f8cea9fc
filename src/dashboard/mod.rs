//! Dashboard aggregation: weekly windows plus whole-collection breakdowns.
//!
//! All functions are pure over a [`ClinicSnapshot`] and an explicit `now`.

pub mod breakdowns;
pub mod weekly;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::ClinicSnapshot;

pub use breakdowns::{
    Breakdowns, LabelCount, MonthlyTrend, Overview, ThisMonth, Today, NOT_SPECIFIED,
};
pub use weekly::{
    week_windows, weekly_summaries, ConsultationsUrgencesPoint, MedecinsServicePoint,
    PatientsEvolutionPoint, WeekWindow, WeeklySummary, DEFAULT_WEEKS, MAX_WEEKS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub monthly: Vec<MonthlyTrend>,
}

/// Everything the dashboard and statistics pages render, in one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub overview: Overview,
    pub this_month: ThisMonth,
    pub today: Today,
    pub taux_suivi: String,
    pub trends: Trends,
    pub breakdowns: Breakdowns,
    pub weekly: Vec<WeeklySummary>,
    pub consultations_urgences: Vec<ConsultationsUrgencesPoint>,
    pub patients_evolution: Vec<PatientsEvolutionPoint>,
    pub medecins_service: Vec<MedecinsServicePoint>,
}

pub fn dashboard_stats(
    snapshot: &ClinicSnapshot<'_>,
    now: NaiveDateTime,
    weeks: usize,
) -> DashboardStats {
    let windows = week_windows(now, weeks);
    let overview = breakdowns::overview(snapshot);
    let taux_suivi =
        breakdowns::taux_suivi(overview.total_consultations, overview.total_patients);

    DashboardStats {
        this_month: breakdowns::this_month(snapshot, now),
        today: breakdowns::today(snapshot, now),
        taux_suivi,
        trends: Trends {
            monthly: breakdowns::monthly_trend(snapshot.consultations),
        },
        breakdowns: breakdowns::breakdowns(snapshot),
        weekly: windows
            .iter()
            .map(|w| weekly::summarize_week(snapshot, w))
            .collect(),
        consultations_urgences: weekly::consultations_urgences(snapshot, &windows),
        patients_evolution: weekly::patients_evolution(snapshot, &windows),
        medecins_service: weekly::medecins_service(snapshot, &windows),
        overview,
    }
}
