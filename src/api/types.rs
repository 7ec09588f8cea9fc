//! Shared types for the clinic API layer.

use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db;
use crate::models::{dates, ClinicSnapshot, Consultation, Medecin, Patient, RendezVous};

// ─── API context ────────────────────────────────────────────

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

// ─── Whole-clinic reads ─────────────────────────────────────

/// The four collections, loaded together for aggregation endpoints.
#[derive(Debug, Default)]
pub struct ClinicData {
    pub patients: Vec<Patient>,
    pub medecins: Vec<Medecin>,
    pub rendez_vous: Vec<RendezVous>,
    pub consultations: Vec<Consultation>,
}

impl ClinicData {
    pub fn load(conn: &Connection) -> Result<Self, ApiError> {
        Ok(Self {
            patients: db::list_patients(conn)?,
            medecins: db::list_medecins(conn)?,
            rendez_vous: db::list_rendez_vous(conn)?,
            consultations: db::list_consultations(conn)?,
        })
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

// ─── Reference instant ──────────────────────────────────────

/// Resolve the reference instant: the supplied value, or local wall-clock time.
pub fn reference_now(raw: Option<&str>) -> Result<NaiveDateTime, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(dates::now_local()),
        Some(s) => dates::parse_instant(s)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid date for now: {s}"))),
    }
}
