use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::AppointmentType;
use crate::models::*;
use crate::scheduling::find_conflict;

const RDV_COLUMNS: &str =
    "id, date, heure, patient, patient_id, medecin, medecin_id, type, statut, notes";

fn rendez_vous_from_row(row: &Row<'_>) -> rusqlite::Result<RendezVous> {
    Ok(RendezVous {
        id: row.get(0)?,
        date: row.get(1)?,
        heure: row.get(2)?,
        patient: row.get(3)?,
        patient_id: row.get(4)?,
        medecin: row.get(5)?,
        medecin_id: row.get(6)?,
        kind: AppointmentType::from(row.get::<_, String>(7)?.as_str()),
        statut: row
            .get::<_, Option<String>>(8)?
            .and_then(|s| s.parse().ok()),
        notes: row.get(9)?,
    })
}

fn ensure_slot_free(conn: &Connection, candidate: &RendezVous) -> Result<(), DatabaseError> {
    let existing = list_rendez_vous(conn)?;
    if let Some(clash) = find_conflict(&existing, candidate) {
        tracing::info!(
            rendez_vous = %candidate.id,
            conflicts_with = %clash.id,
            "Rejected double booking"
        );
        return Err(DatabaseError::Conflict(
            crate::scheduling::DOUBLE_BOOKING_MESSAGE.into(),
        ));
    }
    Ok(())
}

/// Insert an appointment after checking the doctor's slot is free.
pub fn schedule_rendez_vous(conn: &Connection, rdv: &RendezVous) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    ensure_slot_free(&tx, rdv)?;
    tx.execute(
        &format!("INSERT INTO rendez_vous ({RDV_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            rdv.id,
            rdv.date,
            rdv.heure,
            rdv.patient,
            rdv.patient_id,
            rdv.medecin,
            rdv.medecin_id,
            rdv.kind.as_str(),
            rdv.statut.map(|s| s.as_str()),
            rdv.notes,
        ],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn get_rendez_vous(conn: &Connection, id: &str) -> Result<Option<RendezVous>, DatabaseError> {
    let rdv = conn
        .query_row(
            &format!("SELECT {RDV_COLUMNS} FROM rendez_vous WHERE id = ?1"),
            params![id],
            rendez_vous_from_row,
        )
        .optional()?;
    Ok(rdv)
}

pub fn list_rendez_vous(conn: &Connection) -> Result<Vec<RendezVous>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RDV_COLUMNS} FROM rendez_vous ORDER BY date, heure"
    ))?;
    let rdvs = stmt
        .query_map([], rendez_vous_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rdvs)
}

/// Update an appointment. The conflict check ignores the appointment itself.
pub fn reschedule_rendez_vous(conn: &Connection, rdv: &RendezVous) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    ensure_slot_free(&tx, rdv)?;
    let changed = tx.execute(
        "UPDATE rendez_vous SET date = ?2, heure = ?3, patient = ?4, patient_id = ?5,
             medecin = ?6, medecin_id = ?7, type = ?8, statut = ?9, notes = ?10
         WHERE id = ?1",
        params![
            rdv.id,
            rdv.date,
            rdv.heure,
            rdv.patient,
            rdv.patient_id,
            rdv.medecin,
            rdv.medecin_id,
            rdv.kind.as_str(),
            rdv.statut.map(|s| s.as_str()),
            rdv.notes,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "rendez_vous".into(),
            id: rdv.id.clone(),
        });
    }
    tx.commit()?;
    Ok(())
}

pub fn delete_rendez_vous(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM rendez_vous WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "rendez_vous".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
