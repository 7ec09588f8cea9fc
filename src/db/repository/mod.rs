//! Repository layer: entity-scoped database operations.
//!
//! Nested patient sections are stored as JSON text columns; everything the
//! dashboard and notification rules filter on is a plain column.

mod consultation;
mod medecin;
mod patient;
mod rendez_vous;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DatabaseError;

pub use consultation::*;
pub use medecin::*;
pub use patient::*;
pub use rendez_vous::*;

/// Serialize an optional section into its JSON column.
pub(crate) fn to_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>, DatabaseError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(DatabaseError::from)
}

/// Read a JSON column back. A malformed value is logged and dropped rather
/// than failing the whole row.
pub(crate) fn from_json<T: DeserializeOwned>(raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed JSON column");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_patient(id: &str, statut: Option<TreatmentStatus>) -> Patient {
        Patient {
            id: id.into(),
            nom: "Benali".into(),
            prenom: "Karim".into(),
            age: Some(58),
            sexe: Some("M".into()),
            diabete: Some("Type 2".into()),
            statut,
            created_at: Some("2024-01-10T09:00:00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn patient_insert_and_retrieve_with_sections() {
        let conn = test_db();
        let mut p = make_patient("p1", Some(TreatmentStatus::Nouveau));
        p.ordonnances = vec!["Metformine 850mg".into()];
        p.diagnostic = Some(Diagnostic {
            type_operation: Some("Amputation".into()),
            facteurs_risque: Some(FacteursRisque {
                hta: true,
                diabete: true,
                ..Default::default()
            }),
            ..Default::default()
        });
        insert_patient(&conn, &p).unwrap();

        let loaded = get_patient(&conn, "p1").unwrap().unwrap();
        assert_eq!(loaded.nom_complet(), "Karim Benali");
        assert_eq!(loaded.ordonnances, vec!["Metformine 850mg".to_string()]);
        let fr = loaded.diagnostic.unwrap().facteurs_risque.unwrap();
        assert!(fr.hta && fr.diabete && !fr.tabac);
        assert!(get_patient(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn insert_seeds_history_from_status() {
        let conn = test_db();
        let stored = insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();
        assert_eq!(stored.statut_history.len(), 1);
        assert_eq!(stored.statut_history[0].date, "2024-01-10T09:00:00");

        let loaded = get_patient(&conn, "p1").unwrap().unwrap();
        assert_eq!(loaded.statut_history, stored.statut_history);
    }

    #[test]
    fn status_follows_last_history_entry() {
        let conn = test_db();
        let mut p = make_patient("p1", Some(TreatmentStatus::Nouveau));
        p.statut_history = vec![
            StatusEntry { statut: TreatmentStatus::Nouveau, date: "2024-01-10".into() },
            StatusEntry { statut: TreatmentStatus::SousTraitement, date: "2024-02-01".into() },
        ];
        let stored = insert_patient(&conn, &p).unwrap();
        assert_eq!(stored.statut, Some(TreatmentStatus::SousTraitement));
    }

    #[test]
    fn out_of_order_history_is_rejected() {
        let conn = test_db();
        let mut p = make_patient("p1", None);
        p.statut_history = vec![
            StatusEntry { statut: TreatmentStatus::SousTraitement, date: "2024-02-01".into() },
            StatusEntry { statut: TreatmentStatus::Nouveau, date: "2024-01-10".into() },
        ];
        let err = insert_patient(&conn, &p).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert!(list_patients(&conn).unwrap().is_empty());
    }

    #[test]
    fn record_status_change_appends() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();

        let updated =
            record_status_change(&conn, "p1", TreatmentStatus::ApresTraitement, "2024-03-01").unwrap();
        assert_eq!(updated.statut, Some(TreatmentStatus::ApresTraitement));
        assert_eq!(updated.statut_history.len(), 2);

        let err = record_status_change(&conn, "p1", TreatmentStatus::Decede, "2023-01-01");
        assert!(matches!(err, Err(DatabaseError::ConstraintViolation(_))));

        let err = record_status_change(&conn, "nope", TreatmentStatus::Decede, "2024-04-01");
        assert!(matches!(err, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn edited_status_is_appended_on_update() {
        let conn = test_db();
        let mut edited =
            insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();
        edited.statut = Some(TreatmentStatus::SousTraitement);

        let updated = update_patient(&conn, &edited).unwrap();
        assert_eq!(updated.statut, Some(TreatmentStatus::SousTraitement));
        assert_eq!(updated.statut_history.len(), 2);
        assert_eq!(updated.statut_history[0].statut, TreatmentStatus::Nouveau);
        assert_eq!(updated.statut_history[1].statut, TreatmentStatus::SousTraitement);
    }

    #[test]
    fn update_without_history_keeps_stored_transitions() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();
        record_status_change(&conn, "p1", TreatmentStatus::SousTraitement, "2024-02-01T10:00:00")
            .unwrap();

        // Same status, history left out of the payload
        let mut edited = make_patient("p1", Some(TreatmentStatus::SousTraitement));
        edited.telephone = Some("0550 11 22 33".into());
        let updated = update_patient(&conn, &edited).unwrap();
        assert_eq!(updated.statut_history.len(), 2);
        assert_eq!(updated.statut_history[1].date, "2024-02-01T10:00:00");

        // No status at all keeps the current one
        let updated = update_patient(&conn, &make_patient("p1", None)).unwrap();
        assert_eq!(updated.statut, Some(TreatmentStatus::SousTraitement));
        assert_eq!(updated.statut_history.len(), 2);

        // A rewritten history cannot replace the stored one
        let mut rewritten = make_patient("p1", Some(TreatmentStatus::SousTraitement));
        rewritten.statut_history = vec![StatusEntry {
            statut: TreatmentStatus::SousTraitement,
            date: "2024-01-10T09:00:00".into(),
        }];
        let updated = update_patient(&conn, &rewritten).unwrap();
        assert_eq!(updated.statut_history[0].statut, TreatmentStatus::Nouveau);
        assert_eq!(updated.statut_history.len(), 2);
    }

    #[test]
    fn update_keeps_created_at_and_missing_is_not_found() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", None)).unwrap();

        let mut changed = make_patient("p1", None);
        changed.telephone = Some("0550 00 00 00".into());
        changed.created_at = Some("2030-01-01".into());
        let stored = update_patient(&conn, &changed).unwrap();
        assert_eq!(stored.telephone.as_deref(), Some("0550 00 00 00"));
        assert_eq!(stored.created_at.as_deref(), Some("2024-01-10T09:00:00"));

        let err = update_patient(&conn, &make_patient("ghost", None)).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn delete_patient_cascades_history() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();
        delete_patient(&conn, "p1").unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM patient_status_history", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 0);
        assert!(matches!(delete_patient(&conn, "p1"), Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn list_patients_attaches_histories() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", Some(TreatmentStatus::Nouveau))).unwrap();
        let mut p2 = make_patient("p2", None);
        p2.created_at = Some("2024-02-01T09:00:00".into());
        insert_patient(&conn, &p2).unwrap();

        let all = list_patients(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "p1");
        assert_eq!(all[0].statut_history.len(), 1);
        assert!(all[1].statut_history.is_empty());
    }

    #[test]
    fn malformed_section_json_is_dropped() {
        let conn = test_db();
        insert_patient(&conn, &make_patient("p1", None)).unwrap();
        conn.execute("UPDATE patients SET clinique = '{not json' WHERE id = 'p1'", [])
            .unwrap();
        let loaded = get_patient(&conn, "p1").unwrap().unwrap();
        assert!(loaded.clinique.is_none());
    }

    fn make_medecin(id: &str, status: DoctorStatus) -> Medecin {
        Medecin {
            id: id.into(),
            nom: "Haddad".into(),
            prenom: "Samia".into(),
            specialite: Some("Chirurgie vasculaire".into()),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn medecin_crud() {
        let conn = test_db();
        insert_medecin(&conn, &make_medecin("m1", DoctorStatus::EnService)).unwrap();
        insert_medecin(&conn, &make_medecin("m2", DoctorStatus::EnConge)).unwrap();

        let m2 = get_medecin(&conn, "m2").unwrap().unwrap();
        assert!(m2.is_on_leave());

        let mut m1 = make_medecin("m1", DoctorStatus::EnFormation);
        m1.telephone = Some("021 00 00 00".into());
        update_medecin(&conn, &m1).unwrap();
        assert_eq!(
            get_medecin(&conn, "m1").unwrap().unwrap().status,
            DoctorStatus::EnFormation
        );

        delete_medecin(&conn, "m2").unwrap();
        assert_eq!(list_medecins(&conn).unwrap().len(), 1);
    }

    fn make_rdv(id: &str, medecin_id: &str, date: &str, heure: &str) -> RendezVous {
        RendezVous {
            id: id.into(),
            date: date.into(),
            heure: heure.into(),
            patient: "Karim Benali".into(),
            patient_id: Some("p1".into()),
            medecin: "Dr. Haddad".into(),
            medecin_id: Some(medecin_id.into()),
            kind: AppointmentType::Consultation,
            statut: Some(AppointmentStatus::Confirme),
            notes: None,
        }
    }

    #[test]
    fn schedule_rejects_double_booking() {
        let conn = test_db();
        schedule_rendez_vous(&conn, &make_rdv("r1", "m1", "2024-05-06", "10:00")).unwrap();

        let err =
            schedule_rendez_vous(&conn, &make_rdv("r2", "m1", "2024-05-06", "10:00")).unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        // other doctor, other hour: fine
        schedule_rendez_vous(&conn, &make_rdv("r3", "m2", "2024-05-06", "10:00")).unwrap();
        schedule_rendez_vous(&conn, &make_rdv("r4", "m1", "2024-05-06", "11:00")).unwrap();
        assert_eq!(list_rendez_vous(&conn).unwrap().len(), 3);
    }

    #[test]
    fn reschedule_excludes_itself() {
        let conn = test_db();
        schedule_rendez_vous(&conn, &make_rdv("r1", "m1", "2024-05-06", "10:00")).unwrap();
        schedule_rendez_vous(&conn, &make_rdv("r2", "m1", "2024-05-06", "11:00")).unwrap();

        let mut same = make_rdv("r1", "m1", "2024-05-06", "10:00");
        same.notes = Some("apporter bilan".into());
        reschedule_rendez_vous(&conn, &same).unwrap();

        let clash = make_rdv("r1", "m1", "2024-05-06", "11:00");
        assert!(matches!(
            reschedule_rendez_vous(&conn, &clash),
            Err(DatabaseError::Conflict(_))
        ));

        delete_rendez_vous(&conn, "r2").unwrap();
        reschedule_rendez_vous(&conn, &clash).unwrap();
        assert_eq!(get_rendez_vous(&conn, "r1").unwrap().unwrap().heure, "11:00");
    }

    #[test]
    fn unknown_appointment_status_reads_as_none() {
        let conn = test_db();
        schedule_rendez_vous(&conn, &make_rdv("r1", "m1", "2024-05-06", "10:00")).unwrap();
        conn.execute("UPDATE rendez_vous SET statut = 'Annulé' WHERE id = 'r1'", [])
            .unwrap();
        assert!(get_rendez_vous(&conn, "r1").unwrap().unwrap().statut.is_none());
    }

    #[test]
    fn consultation_crud() {
        let conn = test_db();
        let c = Consultation {
            id: "c1".into(),
            date: "2024-05-06T10:30:00".into(),
            kind: AppointmentType::Urgence,
            patient_id: Some("p1".into()),
            medecin_id: Some("m1".into()),
            duree: Some(30),
            montant: Some(2500.0),
            paiement: Some("Payé".into()),
            ..Default::default()
        };
        insert_consultation(&conn, &c).unwrap();
        assert_eq!(get_consultation(&conn, "c1").unwrap().unwrap(), c);

        let mut changed = c.clone();
        changed.diagnostic = Some("Ulcère plantaire".into());
        update_consultation(&conn, &changed).unwrap();
        assert_eq!(list_consultations(&conn).unwrap(), vec![changed]);

        delete_consultation(&conn, "c1").unwrap();
        assert!(matches!(
            delete_consultation(&conn, "c1"),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
