use std::collections::HashMap;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::dates::{format_instant, now_local, parse_instant};
use crate::models::enums::TreatmentStatus;
use crate::models::*;

use super::{from_json, to_json};

const PATIENT_COLUMNS: &str = "id, nom, prenom, age, sexe, telephone, email, adresse, diabete,
     derniere_visite, date_consultation, notes, ordonnances, etat_civil, diagnostic,
     antecedents, clinique, evolution, anesthesie, statut, created_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        nom: row.get(1)?,
        prenom: row.get(2)?,
        age: row.get(3)?,
        sexe: row.get(4)?,
        telephone: row.get(5)?,
        email: row.get(6)?,
        adresse: row.get(7)?,
        diabete: row.get(8)?,
        derniere_visite: row.get(9)?,
        date_consultation: row.get(10)?,
        notes: row.get(11)?,
        ordonnances: from_json(row.get(12)?).unwrap_or_default(),
        etat_civil: from_json(row.get(13)?),
        diagnostic: from_json(row.get(14)?),
        antecedents: from_json(row.get(15)?),
        clinique: from_json(row.get(16)?),
        evolution: from_json(row.get(17)?),
        anesthesie: from_json(row.get(18)?),
        statut: row
            .get::<_, Option<String>>(19)?
            .and_then(|s| s.parse().ok()),
        statut_history: Vec::new(),
        created_at: row.get(20)?,
    })
}

/// Enforce "current status = last history entry" and chronological history.
///
/// An empty history is seeded from the current status at creation time.
/// A history entry with an unparseable date, or one dated before its
/// predecessor, is rejected.
pub fn normalize_status_history(patient: &mut Patient) -> Result<(), DatabaseError> {
    let mut previous: Option<NaiveDateTime> = None;
    for entry in &patient.statut_history {
        let at = parse_instant(&entry.date).ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!(
                "statut_history entry has an invalid date: {}",
                entry.date
            ))
        })?;
        if previous.is_some_and(|p| at < p) {
            return Err(DatabaseError::ConstraintViolation(
                "statut_history must be in chronological order".into(),
            ));
        }
        previous = Some(at);
    }

    match patient.statut_history.last() {
        Some(last) => patient.statut = Some(last.statut),
        None => {
            if let Some(statut) = patient.statut {
                let date = patient
                    .created_at
                    .clone()
                    .unwrap_or_else(|| format_instant(now_local()));
                patient.statut_history.push(StatusEntry { statut, date });
            }
        }
    }
    Ok(())
}

fn write_history(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM patient_status_history WHERE patient_id = ?1",
        params![patient.id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO patient_status_history (patient_id, statut, date) VALUES (?1, ?2, ?3)",
    )?;
    for entry in &patient.statut_history {
        stmt.execute(params![patient.id, entry.statut.as_str(), entry.date])?;
    }
    Ok(())
}

fn load_history(conn: &Connection, patient_id: &str) -> Result<Vec<StatusEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT statut, date FROM patient_status_history WHERE patient_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![patient_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (statut, date) = row?;
        history.push(StatusEntry { statut: statut.parse()?, date });
    }
    Ok(history)
}

/// Insert a patient. Status history is normalized before writing.
pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<Patient, DatabaseError> {
    let mut patient = patient.clone();
    if patient.created_at.is_none() {
        patient.created_at = Some(format_instant(now_local()));
    }
    normalize_status_history(&mut patient)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        &format!(
            "INSERT INTO patients ({PATIENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21)"
        ),
        params![
            patient.id,
            patient.nom,
            patient.prenom,
            patient.age,
            patient.sexe,
            patient.telephone,
            patient.email,
            patient.adresse,
            patient.diabete,
            patient.derniere_visite,
            patient.date_consultation,
            patient.notes,
            serde_json::to_string(&patient.ordonnances)?,
            to_json(&patient.etat_civil)?,
            to_json(&patient.diagnostic)?,
            to_json(&patient.antecedents)?,
            to_json(&patient.clinique)?,
            to_json(&patient.evolution)?,
            to_json(&patient.anesthesie)?,
            patient.statut.map(|s| s.as_str()),
            patient.created_at,
        ],
    )?;
    write_history(&tx, &patient)?;
    tx.commit()?;
    Ok(patient)
}

pub fn get_patient(conn: &Connection, id: &str) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id],
            patient_from_row,
        )
        .optional()?;

    match patient {
        Some(mut p) => {
            p.statut_history = load_history(conn, &p.id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

/// All patients, oldest first, each with its status history.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at, nom"
    ))?;
    let mut patients = stmt
        .query_map([], patient_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut histories: HashMap<String, Vec<StatusEntry>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT patient_id, statut, date FROM patient_status_history ORDER BY patient_id, id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (patient_id, statut, date) = row?;
        let statut: TreatmentStatus = statut.parse()?;
        histories
            .entry(patient_id)
            .or_default()
            .push(StatusEntry { statut, date });
    }

    for p in &mut patients {
        p.statut_history = histories.remove(&p.id).unwrap_or_default();
    }
    Ok(patients)
}

/// Merge an edited record's status with the stored transition log.
///
/// The stored history is only ever extended. An incoming history that
/// does not start with the stored entries is replaced by them, and a
/// `statut` that differs from the last entry is appended as a transition
/// dated now. A missing `statut` keeps the current one.
fn reconcile_history(stored: Vec<StatusEntry>, patient: &mut Patient) {
    let incoming = std::mem::take(&mut patient.statut_history);
    let extends_stored = incoming.starts_with(&stored);
    patient.statut_history = if extends_stored { incoming } else { stored };

    let last = patient.statut_history.last().map(|entry| entry.statut);
    match (patient.statut, last) {
        (Some(statut), last) if last != Some(statut) => {
            patient.statut_history.push(StatusEntry {
                statut,
                date: format_instant(now_local()),
            });
        }
        (None, Some(current)) => patient.statut = Some(current),
        _ => {}
    }
}

/// Update a patient. The status history is append-only, see `reconcile_history`.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<Patient, DatabaseError> {
    let mut patient = patient.clone();
    let stored = load_history(conn, &patient.id)?;
    reconcile_history(stored, &mut patient);
    normalize_status_history(&mut patient)?;

    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE patients SET nom = ?2, prenom = ?3, age = ?4, sexe = ?5, telephone = ?6,
             email = ?7, adresse = ?8, diabete = ?9, derniere_visite = ?10,
             date_consultation = ?11, notes = ?12, ordonnances = ?13, etat_civil = ?14,
             diagnostic = ?15, antecedents = ?16, clinique = ?17, evolution = ?18,
             anesthesie = ?19, statut = ?20
         WHERE id = ?1",
        params![
            patient.id,
            patient.nom,
            patient.prenom,
            patient.age,
            patient.sexe,
            patient.telephone,
            patient.email,
            patient.adresse,
            patient.diabete,
            patient.derniere_visite,
            patient.date_consultation,
            patient.notes,
            serde_json::to_string(&patient.ordonnances)?,
            to_json(&patient.etat_civil)?,
            to_json(&patient.diagnostic)?,
            to_json(&patient.antecedents)?,
            to_json(&patient.clinique)?,
            to_json(&patient.evolution)?,
            to_json(&patient.anesthesie)?,
            patient.statut.map(|s| s.as_str()),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient.id,
        });
    }
    write_history(&tx, &patient)?;
    tx.commit()?;

    // created_at is immutable; report the stored value
    get_patient(conn, &patient.id)?.ok_or(DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: patient.id,
    })
}

/// Append a status transition dated `date`. The date may not precede the
/// last recorded transition.
pub fn record_status_change(
    conn: &Connection,
    id: &str,
    statut: TreatmentStatus,
    date: &str,
) -> Result<Patient, DatabaseError> {
    let mut patient = get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: id.to_string(),
    })?;
    patient.statut = Some(statut);
    patient.statut_history.push(StatusEntry {
        statut,
        date: date.to_string(),
    });
    update_patient(conn, &patient)
}

pub fn delete_patient(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
