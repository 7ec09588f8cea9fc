use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::AppointmentType;
use crate::models::*;

const CONSULTATION_COLUMNS: &str = "id, date, type, patient_id, medecin_id, diagnostic,
     traitement, notes, duree, statut, montant, paiement";

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        id: row.get(0)?,
        date: row.get(1)?,
        kind: AppointmentType::from(row.get::<_, String>(2)?.as_str()),
        patient_id: row.get(3)?,
        medecin_id: row.get(4)?,
        diagnostic: row.get(5)?,
        traitement: row.get(6)?,
        notes: row.get(7)?,
        duree: row.get(8)?,
        statut: row.get(9)?,
        montant: row.get(10)?,
        paiement: row.get(11)?,
    })
}

pub fn insert_consultation(conn: &Connection, c: &Consultation) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO consultations ({CONSULTATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            c.id,
            c.date,
            c.kind.as_str(),
            c.patient_id,
            c.medecin_id,
            c.diagnostic,
            c.traitement,
            c.notes,
            c.duree,
            c.statut,
            c.montant,
            c.paiement,
        ],
    )?;
    Ok(())
}

pub fn get_consultation(conn: &Connection, id: &str) -> Result<Option<Consultation>, DatabaseError> {
    let c = conn
        .query_row(
            &format!("SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE id = ?1"),
            params![id],
            consultation_from_row,
        )
        .optional()?;
    Ok(c)
}

pub fn list_consultations(conn: &Connection) -> Result<Vec<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSULTATION_COLUMNS} FROM consultations ORDER BY date"
    ))?;
    let rows = stmt
        .query_map([], consultation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_consultation(conn: &Connection, c: &Consultation) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE consultations SET date = ?2, type = ?3, patient_id = ?4, medecin_id = ?5,
             diagnostic = ?6, traitement = ?7, notes = ?8, duree = ?9, statut = ?10,
             montant = ?11, paiement = ?12
         WHERE id = ?1",
        params![
            c.id,
            c.date,
            c.kind.as_str(),
            c.patient_id,
            c.medecin_id,
            c.diagnostic,
            c.traitement,
            c.notes,
            c.duree,
            c.statut,
            c.montant,
            c.paiement,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "consultation".into(),
            id: c.id.clone(),
        });
    }
    Ok(())
}

pub fn delete_consultation(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM consultations WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "consultation".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
