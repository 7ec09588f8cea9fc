//! Notification generation.
//!
//! Each rule is an independent pass over one collection of a
//! [`ClinicSnapshot`]. The generator concatenates rule output in a fixed
//! order, then stable-sorts by priority so ties keep emission order.
//! Nothing here touches the store or the clock: `now` is always passed in.

pub mod center;
pub mod rules;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::*;

pub use crate::models::ClinicSnapshot;
pub use center::{NotificationCenter, Toast, ToastVariant};

/// Dashboard feed shows at most this many notifications.
pub const DASHBOARD_FEED_LIMIT: usize = 10;

// ─── Variants ────────────────────────────────────────────────────────────

/// Which surface the notifications are generated for. The two differ in
/// their first rule and in how `time` labels are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Dashboard,
    Center,
}

// ─── Trait ────────────────────────────────────────────────────────────────────

/// One rule per alert family. Self-contained and independently testable.
pub trait NotificationRule: Send + Sync {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification>;
}

// ─── Generator ───────────────────────────────────────────────────────────────

pub struct NotificationGenerator {
    rules: Vec<Box<dyn NotificationRule>>,
    limit: Option<usize>,
}

impl NotificationGenerator {
    /// Activity feed: same-day appointments first, top 10 kept.
    pub fn dashboard() -> Self {
        let labels = rules::TimeLabels::Relative;
        Self {
            rules: vec![
                Box::new(rules::SameDayAppointments),
                Box::new(rules::UrgentAppointments { labels }),
                Box::new(rules::NewPatients { labels }),
                Box::new(rules::DoctorsOnLeave { labels }),
                Box::new(rules::RecentConsultations { labels }),
            ],
            limit: Some(DASHBOARD_FEED_LIMIT),
        }
    }

    /// Notification center: upcoming reminders first, wall-clock labels,
    /// uncapped (the center keeps its own history cap).
    pub fn center() -> Self {
        let labels = rules::TimeLabels::WallClock;
        Self {
            rules: vec![
                Box::new(rules::UpcomingReminders),
                Box::new(rules::UrgentAppointments { labels }),
                Box::new(rules::NewPatients { labels }),
                Box::new(rules::DoctorsOnLeave { labels }),
                Box::new(rules::RecentConsultations { labels }),
            ],
            limit: None,
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Dashboard => Self::dashboard(),
            Variant::Center => Self::center(),
        }
    }

    pub fn generate(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .rules
            .iter()
            .flat_map(|rule| rule.collect(snapshot, now))
            .collect();

        rank(&mut notifications);
        if let Some(limit) = self.limit {
            notifications.truncate(limit);
        }
        notifications
    }
}

/// Stable sort, highest priority first.
pub fn rank(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
}

/// Shorthand for `NotificationGenerator::for_variant(variant).generate(..)`.
pub fn generate(
    snapshot: &ClinicSnapshot<'_>,
    now: NaiveDateTime,
    variant: Variant,
) -> Vec<Notification> {
    NotificationGenerator::for_variant(variant).generate(snapshot, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::*;
    use chrono::Duration;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn urgent(id: &str, date: &str, heure: &str) -> RendezVous {
        RendezVous {
            id: id.into(),
            date: date.into(),
            heure: heure.into(),
            patient: format!("Patient {id}"),
            medecin: "Dr. Haddad".into(),
            kind: AppointmentType::Urgence,
            statut: Some(AppointmentStatus::Confirme),
            ..Default::default()
        }
    }

    #[test]
    fn scenario_orders_high_medium_low() {
        let now = dt("2024-05-08 10:00:00");
        let rdvs = vec![
            urgent("u1", "2024-05-08T14:00:00", "14:00"),
            urgent("u2", "2024-05-08T15:00:00", "15:00"),
            urgent("u3", "2024-05-08T16:30:00", "16:30"),
        ];
        let patients = vec![Patient {
            id: "p1".into(),
            nom: "Saidi".into(),
            prenom: "Amel".into(),
            created_at: Some("2024-05-08T08:00:00".into()),
            ..Default::default()
        }];
        let medecins = vec![Medecin {
            id: "m1".into(),
            status: DoctorStatus::EnConge,
            ..Default::default()
        }];
        let snapshot = ClinicSnapshot {
            patients: &patients,
            medecins: &medecins,
            rendez_vous: &rdvs,
            consultations: &[],
        };

        let out = generate(&snapshot, now, Variant::Dashboard);
        let titles: Vec<&str> = out.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["URGENCE", "URGENCE", "URGENCE", "Médecins en congé", "Nouveaux patients"]
        );
        assert_eq!(out[0].id, "urgent-u1");
        assert_eq!(out[3].priority, Priority::Medium);
        assert_eq!(out[4].priority, Priority::Low);
        assert_eq!(out[4].message, "1 nouveau(x) patient(s) ajouté(s)");
    }

    #[test]
    fn no_low_precedes_high_and_ties_keep_order() {
        let now = dt("2024-05-08 10:00:00");
        let mut rdvs: Vec<RendezVous> = (0..4)
            .map(|i| urgent(&format!("u{i}"), "2024-05-09T09:00:00", "09:00"))
            .collect();
        let consultations = vec![Consultation {
            id: "c1".into(),
            date: "2024-05-08T09:00:00".into(),
            ..Default::default()
        }];
        rdvs.push(RendezVous {
            id: "today".into(),
            date: "2024-05-08T08:00:00".into(),
            heure: "08:00".into(),
            patient: "Nadia".into(),
            ..Default::default()
        });
        let snapshot = ClinicSnapshot {
            rendez_vous: &rdvs,
            consultations: &consultations,
            ..Default::default()
        };

        let out = generate(&snapshot, now, Variant::Dashboard);
        let ranks: Vec<u8> = out.iter().map(|n| n.priority.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "{ranks:?}");

        let urgent_ids: Vec<&str> = out
            .iter()
            .filter(|n| n.kind == NotificationKind::Urgent)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(urgent_ids, vec!["urgent-u0", "urgent-u1", "urgent-u2", "urgent-u3"]);
    }

    #[test]
    fn dashboard_feed_is_capped() {
        let now = dt("2024-05-08 10:00:00");
        let rdvs: Vec<RendezVous> = (0..15)
            .map(|i| urgent(&format!("u{i}"), "2024-05-10", "09:00"))
            .collect();
        let snapshot = ClinicSnapshot { rendez_vous: &rdvs, ..Default::default() };

        assert_eq!(generate(&snapshot, now, Variant::Dashboard).len(), DASHBOARD_FEED_LIMIT);
        assert_eq!(generate(&snapshot, now, Variant::Center).len(), 15);
    }

    #[test]
    fn empty_snapshot_yields_nothing() {
        let now = dt("2024-05-08 10:00:00");
        assert!(generate(&ClinicSnapshot::default(), now, Variant::Dashboard).is_empty());
        assert!(generate(&ClinicSnapshot::default(), now + Duration::days(1), Variant::Center).is_empty());
    }
}
