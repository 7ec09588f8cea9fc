//! Appointment scheduling: double-booking detection and planning views.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::dates::parse_instant;
use crate::models::RendezVous;

pub const DOUBLE_BOOKING_MESSAGE: &str = "Ce médecin a déjà un rendez-vous prévu à cette heure";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("{}", DOUBLE_BOOKING_MESSAGE)]
    DoubleBooking { conflicting_id: String },
}

// ─── Conflict detection ───────────────────────────────────────────────────────

/// Calendar day of an appointment, when its date parses.
fn calendar_day(rdv: &RendezVous) -> Option<NaiveDate> {
    parse_instant(&rdv.date).map(|d| d.date())
}

fn same_day(a: &RendezVous, b: &RendezVous) -> bool {
    match (calendar_day(a), calendar_day(b)) {
        (Some(x), Some(y)) => x == y,
        // Unparseable dates can only collide verbatim
        _ => a.date.trim() == b.date.trim(),
    }
}

/// First existing appointment occupying the candidate's slot: same doctor,
/// same calendar day, same `heure`. The candidate itself (same id) is
/// ignored so updates can keep their own slot.
pub fn find_conflict<'a>(
    existing: &'a [RendezVous],
    candidate: &RendezVous,
) -> Option<&'a RendezVous> {
    existing.iter().find(|other| {
        (candidate.id.is_empty() || other.id != candidate.id)
            && other.same_doctor(candidate)
            && other.heure.trim() == candidate.heure.trim()
            && same_day(other, candidate)
    })
}

/// `Err(DoubleBooking)` when the candidate's slot is taken.
pub fn check_slot(existing: &[RendezVous], candidate: &RendezVous) -> Result<(), SchedulingError> {
    match find_conflict(existing, candidate) {
        Some(other) => Err(SchedulingError::DoubleBooking {
            conflicting_id: other.id.clone(),
        }),
        None => Ok(()),
    }
}

// ─── Planning views ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningView {
    #[default]
    Jour,
    Semaine,
    Mois,
}

impl PlanningView {
    /// Inclusive day range covered by this view around `reference`.
    pub fn range(&self, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Jour => (reference, reference),
            Self::Semaine => {
                let monday = reference
                    - Duration::days(reference.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(6))
            }
            Self::Mois => {
                let first = reference.with_day(1).unwrap_or(reference);
                let next_month = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                };
                let last = next_month
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(first);
                (first, last)
            }
        }
    }
}

/// Appointments visible in the given view, sorted by date then time.
/// `search` filters by patient name, case-insensitively.
pub fn planning(
    rdvs: &[RendezVous],
    view: PlanningView,
    reference: NaiveDate,
    search: Option<&str>,
) -> Vec<RendezVous> {
    let (from, to) = view.range(reference);
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut visible: Vec<(NaiveDate, &RendezVous)> = rdvs
        .iter()
        .filter_map(|r| calendar_day(r).map(|d| (d, r)))
        .filter(|(d, _)| *d >= from && *d <= to)
        .filter(|(_, r)| match &needle {
            Some(n) => r.patient.to_lowercase().contains(n),
            None => true,
        })
        .collect();

    visible.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.heure.cmp(&b.heure)));
    visible.into_iter().map(|(_, r)| r.clone()).collect()
}
