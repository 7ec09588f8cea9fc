//! Client-side application state.
//!
//! `AppState` holds the last fetched collections plus loading and error
//! flags. Completions are applied through [`AppState::apply`], which
//! discards any completion older than the latest one already applied.

use std::fmt::Display;

use crate::dashboard::DashboardStats;
use crate::models::{ClinicSnapshot, Consultation, Medecin, Patient, RendezVous};

/// The one message shown to the user when a fetch fails.
pub const LOAD_ERROR_MESSAGE: &str = "Erreur lors du chargement des données";

/// Records addressable by id, for optimistic local updates.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Patient {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Medecin {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for RendezVous {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Consultation {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Replace the record with the same id, or append.
pub fn upsert<T: Keyed>(list: &mut Vec<T>, item: T) {
    match list.iter_mut().find(|existing| existing.key() == item.key()) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

/// Drop the record with `id`. Returns whether one was removed.
pub fn remove<T: Keyed>(list: &mut Vec<T>, id: &str) -> bool {
    let before = list.len();
    list.retain(|item| item.key() != id);
    list.len() != before
}

/// Result of one full fetch: the four collections and the dashboard stats.
#[derive(Debug, Clone, Default)]
pub struct FetchedData {
    pub patients: Vec<Patient>,
    pub medecins: Vec<Medecin>,
    pub rendez_vous: Vec<RendezVous>,
    pub consultations: Vec<Consultation>,
    pub dashboard_stats: Option<DashboardStats>,
}

/// Sequence number handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub patients: Vec<Patient>,
    pub medecins: Vec<Medecin>,
    pub rendez_vous: Vec<RendezVous>,
    pub consultations: Vec<Consultation>,
    pub dashboard_stats: Option<DashboardStats>,
    pub loading: bool,
    pub error: Option<String>,
    issued: u64,
    applied: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: sets `loading` and returns the ticket its completion
    /// must present.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket(self.issued)
    }

    /// Apply a fetch completion. Returns `false` when the completion is
    /// stale and was discarded.
    ///
    /// Success replaces every collection and clears the error. Failure
    /// keeps the previous data and records [`LOAD_ERROR_MESSAGE`].
    pub fn apply<E: Display>(&mut self, ticket: FetchTicket, result: Result<FetchedData, E>) -> bool {
        if ticket.0 <= self.applied {
            tracing::warn!(
                seq = ticket.0,
                applied = self.applied,
                "Discarding stale fetch completion"
            );
            return false;
        }
        self.applied = ticket.0;
        if self.applied >= self.issued {
            self.loading = false;
        }

        match result {
            Ok(data) => {
                self.patients = data.patients;
                self.medecins = data.medecins;
                self.rendez_vous = data.rendez_vous;
                self.consultations = data.consultations;
                self.dashboard_stats = data.dashboard_stats;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(seq = ticket.0, error = %e, "Fetch failed");
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self) -> ClinicSnapshot<'_> {
        ClinicSnapshot {
            patients: &self.patients,
            medecins: &self.medecins,
            rendez_vous: &self.rendez_vous,
            consultations: &self.consultations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with_patients(names: &[&str]) -> FetchedData {
        FetchedData {
            patients: names
                .iter()
                .enumerate()
                .map(|(i, nom)| Patient {
                    id: format!("p{i}"),
                    nom: nom.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn begin_fetch_sets_loading() {
        let mut state = AppState::new();
        assert!(!state.loading);
        let ticket = state.begin_fetch();
        assert!(state.loading);
        assert_eq!(ticket.seq(), 1);
    }

    #[test]
    fn successful_fetch_populates_state() {
        let mut state = AppState::new();
        let ticket = state.begin_fetch();
        assert!(state.apply::<String>(ticket, Ok(data_with_patients(&["Benali"]))));
        assert!(!state.loading);
        assert_eq!(state.patients.len(), 1);
        assert!(state.error.is_none());
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut state = AppState::new();
        let first = state.begin_fetch();
        state.apply::<String>(first, Ok(data_with_patients(&["Benali"])));

        let second = state.begin_fetch();
        assert!(state.apply(second, Err("connection refused")));
        assert_eq!(state.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert_eq!(state.patients.len(), 1);
        assert!(!state.loading);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut state = AppState::new();
        let older = state.begin_fetch();
        let newer = state.begin_fetch();

        assert!(state.apply::<String>(newer, Ok(data_with_patients(&["Benali", "Saidi"]))));
        assert!(!state.loading);

        // The older request resolves last and must not overwrite
        assert!(!state.apply::<String>(older, Ok(data_with_patients(&["Old"]))));
        assert_eq!(state.patients.len(), 2);
        assert_eq!(state.patients[0].nom, "Benali");
    }

    #[test]
    fn older_completion_first_keeps_loading() {
        let mut state = AppState::new();
        let older = state.begin_fetch();
        let newer = state.begin_fetch();

        assert!(state.apply::<String>(older, Ok(data_with_patients(&["Old"]))));
        assert!(state.loading, "newer fetch still in flight");

        assert!(state.apply::<String>(newer, Ok(data_with_patients(&["New"]))));
        assert!(!state.loading);
        assert_eq!(state.patients[0].nom, "New");
    }

    #[test]
    fn stale_error_does_not_clobber_fresh_data() {
        let mut state = AppState::new();
        let older = state.begin_fetch();
        let newer = state.begin_fetch();
        state.apply::<String>(newer, Ok(data_with_patients(&["Benali"])));
        assert!(!state.apply(older, Err("timeout")));
        assert!(state.error.is_none());
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let mut list = vec![Medecin {
            id: "m1".into(),
            nom: "Haddad".into(),
            ..Default::default()
        }];
        upsert(
            &mut list,
            Medecin {
                id: "m1".into(),
                nom: "Haddad-Benali".into(),
                ..Default::default()
            },
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].nom, "Haddad-Benali");

        upsert(
            &mut list,
            Medecin {
                id: "m2".into(),
                ..Default::default()
            },
        );
        assert_eq!(list.len(), 2);

        assert!(remove(&mut list, "m1"));
        assert!(!remove(&mut list, "m1"));
        assert_eq!(list[0].id, "m2");
    }
}
