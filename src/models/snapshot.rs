use super::{Consultation, Medecin, Patient, RendezVous};

/// Borrowed view of the four collections. Everything derived for the
/// dashboard and the notification feed reads from one of these.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicSnapshot<'a> {
    pub patients: &'a [Patient],
    pub medecins: &'a [Medecin],
    pub rendez_vous: &'a [RendezVous],
    pub consultations: &'a [Consultation],
}
