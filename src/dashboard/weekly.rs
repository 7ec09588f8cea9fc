//! Calendar-week bucketing.
//!
//! A window is Monday 00:00 up to (not including) the next Monday, which
//! covers Sunday 23:59:59 and any fraction of that last second. Windows
//! never overlap, so a record with a parseable date lands in at most one.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::dates::{format_instant, parse_opt, start_of_week};
use crate::models::enums::{AppointmentType, DoctorStatus, TreatmentStatus};
use crate::models::ClinicSnapshot;

pub const DEFAULT_WEEKS: usize = 12;

/// Upper bound on the number of windows, about two years.
pub const MAX_WEEKS: usize = 104;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDateTime,
}

impl WeekWindow {
    /// Exclusive upper bound: the next Monday 00:00.
    pub fn next_start(&self) -> NaiveDateTime {
        self.start + Duration::days(7)
    }

    /// Sunday 23:59:59.999, for display.
    pub fn end(&self) -> NaiveDateTime {
        self.next_start() - Duration::milliseconds(1)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.next_start()
    }

    /// `"{day}/{month}"` of the Monday, unpadded.
    pub fn label(&self) -> String {
        format!("{}/{}", self.start.day(), self.start.month())
    }

    fn contains_opt(&self, raw: Option<&str>) -> bool {
        parse_opt(raw).is_some_and(|at| self.contains(at))
    }
}

/// `n` consecutive week windows ending with the week containing `now`,
/// oldest first. `n` is clamped to [`MAX_WEEKS`]; windows that would start
/// before the earliest representable date are left out.
pub fn week_windows(now: NaiveDateTime, n: usize) -> Vec<WeekWindow> {
    let current = start_of_week(now);
    let mut windows: Vec<WeekWindow> = (0..n.min(MAX_WEEKS))
        .map_while(|i| {
            let weeks = i64::try_from(i).ok()?;
            let back = Duration::try_weeks(weeks)?;
            current
                .checked_sub_signed(back)
                .map(|start| WeekWindow { start })
        })
        .collect();
    windows.reverse();
    windows
}

/// Activity figures for one week window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week: String,
    pub start: String,
    pub end: String,
    /// Confirmed or completed appointments.
    pub rendez_vous: usize,
    pub consultations: usize,
    pub urgences: usize,
    pub autres: usize,
    pub nouveaux_patients: usize,
    /// Qualifying appointments per doctor, two decimals.
    pub taux_occupation: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn occupancy(appointments: usize, doctors: usize) -> f64 {
    round2(appointments as f64 / doctors.max(1) as f64)
}

pub fn summarize_week(snapshot: &ClinicSnapshot<'_>, window: &WeekWindow) -> WeeklySummary {
    let mut summary = WeeklySummary {
        week: window.label(),
        start: format_instant(window.start),
        end: format_instant(window.end()),
        rendez_vous: 0,
        consultations: 0,
        urgences: 0,
        autres: 0,
        nouveaux_patients: 0,
        taux_occupation: 0.0,
    };

    for rdv in snapshot.rendez_vous.iter().filter(|r| r.is_qualifying()) {
        if !window.contains_opt(Some(&rdv.date)) {
            continue;
        }
        summary.rendez_vous += 1;
        match rdv.kind {
            AppointmentType::Consultation => summary.consultations += 1,
            AppointmentType::Urgence => summary.urgences += 1,
            _ => summary.autres += 1,
        }
    }

    summary.nouveaux_patients = snapshot
        .patients
        .iter()
        .filter(|p| window.contains_opt(p.created_at.as_deref()))
        .count();
    summary.taux_occupation = occupancy(summary.rendez_vous, snapshot.medecins.len());
    summary
}

pub fn weekly_summaries(
    snapshot: &ClinicSnapshot<'_>,
    now: NaiveDateTime,
    n: usize,
) -> Vec<WeeklySummary> {
    week_windows(now, n)
        .iter()
        .map(|w| summarize_week(snapshot, w))
        .collect()
}

// ─── Series ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationsUrgencesPoint {
    pub week: String,
    pub consultations: usize,
    pub urgences: usize,
}

/// Consultation records per week, urgent ones split out.
pub fn consultations_urgences(
    snapshot: &ClinicSnapshot<'_>,
    windows: &[WeekWindow],
) -> Vec<ConsultationsUrgencesPoint> {
    windows
        .iter()
        .map(|w| {
            let (urgences, consultations): (Vec<_>, Vec<_>) = snapshot
                .consultations
                .iter()
                .filter(|c| w.contains_opt(Some(&c.date)))
                .partition(|c| c.kind.is_urgent());
            ConsultationsUrgencesPoint {
                week: w.label(),
                consultations: consultations.len(),
                urgences: urgences.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientsEvolutionPoint {
    pub week: String,
    pub nouveau: usize,
    pub sous_trt: usize,
    pub apres_trt: usize,
    pub decede: usize,
}

/// Patients per treatment status as of each window's end.
pub fn patients_evolution(
    snapshot: &ClinicSnapshot<'_>,
    windows: &[WeekWindow],
) -> Vec<PatientsEvolutionPoint> {
    windows
        .iter()
        .map(|w| {
            let mut point = PatientsEvolutionPoint {
                week: w.label(),
                nouveau: 0,
                sous_trt: 0,
                apres_trt: 0,
                decede: 0,
            };
            for status in snapshot.patients.iter().filter_map(|p| p.status_at(w.end())) {
                match status {
                    TreatmentStatus::Nouveau => point.nouveau += 1,
                    TreatmentStatus::SousTraitement => point.sous_trt += 1,
                    TreatmentStatus::ApresTraitement => point.apres_trt += 1,
                    TreatmentStatus::Decede => point.decede += 1,
                }
            }
            point
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedecinsServicePoint {
    pub week: String,
    pub en_service: usize,
}

/// Doctors currently in service who were on the roster by each window's
/// end. A doctor without a usable `created_at` counts in every week.
pub fn medecins_service(
    snapshot: &ClinicSnapshot<'_>,
    windows: &[WeekWindow],
) -> Vec<MedecinsServicePoint> {
    windows
        .iter()
        .map(|w| MedecinsServicePoint {
            week: w.label(),
            en_service: snapshot
                .medecins
                .iter()
                .filter(|m| m.status == DoctorStatus::EnService)
                .filter(|m| match parse_opt(m.created_at.as_deref()) {
                    Some(at) => at < w.next_start(),
                    None => true,
                })
                .count(),
        })
        .collect()
}
