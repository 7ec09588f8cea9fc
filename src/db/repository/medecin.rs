use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const MEDECIN_COLUMNS: &str =
    "id, nom, prenom, specialite, email, telephone, status, notes, created_at";

fn medecin_from_row(row: &Row<'_>) -> rusqlite::Result<Medecin> {
    Ok(Medecin {
        id: row.get(0)?,
        nom: row.get(1)?,
        prenom: row.get(2)?,
        specialite: row.get(3)?,
        email: row.get(4)?,
        telephone: row.get(5)?,
        status: row
            .get::<_, String>(6)?
            .parse()
            .unwrap_or_default(),
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert_medecin(conn: &Connection, medecin: &Medecin) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO medecins ({MEDECIN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            medecin.id,
            medecin.nom,
            medecin.prenom,
            medecin.specialite,
            medecin.email,
            medecin.telephone,
            medecin.status.as_str(),
            medecin.notes,
            medecin.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_medecin(conn: &Connection, id: &str) -> Result<Option<Medecin>, DatabaseError> {
    let medecin = conn
        .query_row(
            &format!("SELECT {MEDECIN_COLUMNS} FROM medecins WHERE id = ?1"),
            params![id],
            medecin_from_row,
        )
        .optional()?;
    Ok(medecin)
}

pub fn list_medecins(conn: &Connection) -> Result<Vec<Medecin>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDECIN_COLUMNS} FROM medecins ORDER BY nom, prenom"
    ))?;
    let medecins = stmt
        .query_map([], medecin_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(medecins)
}

pub fn update_medecin(conn: &Connection, medecin: &Medecin) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medecins SET nom = ?2, prenom = ?3, specialite = ?4, email = ?5,
             telephone = ?6, status = ?7, notes = ?8
         WHERE id = ?1",
        params![
            medecin.id,
            medecin.nom,
            medecin.prenom,
            medecin.specialite,
            medecin.email,
            medecin.telephone,
            medecin.status.as_str(),
            medecin.notes,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medecin".into(),
            id: medecin.id.clone(),
        });
    }
    Ok(())
}

pub fn delete_medecin(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM medecins WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medecin".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
