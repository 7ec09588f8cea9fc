//! The individual notification rules.

use chrono::{Duration, NaiveDateTime};

use crate::models::dates::{parse_instant, start_of_day};
use crate::models::*;

use super::{ClinicSnapshot, NotificationRule};

const RECENT_WINDOW_HOURS: i64 = 24;

/// How a rule writes the `time` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabels {
    /// "Maintenant", "Récemment", "Il y a 3h".
    Relative,
    /// Wall-clock `HH:MM` of generation.
    WallClock,
}

impl TimeLabels {
    fn label(&self, relative: &str, now: NaiveDateTime) -> String {
        match self {
            Self::Relative => relative.to_string(),
            Self::WallClock => now.format("%H:%M").to_string(),
        }
    }
}

fn within_recent_window(at: NaiveDateTime, now: NaiveDateTime) -> bool {
    at >= now - Duration::hours(RECENT_WINDOW_HOURS) && at <= now
}

fn notification(
    id: String,
    kind: NotificationKind,
    title: &str,
    message: String,
    time: String,
    priority: Priority,
) -> Notification {
    Notification {
        id,
        kind,
        title: title.to_string(),
        message,
        time,
        read: false,
        priority,
        related_id: None,
        action_url: None,
    }
}

fn same_day_notification(rdv: &RendezVous, time: String) -> Notification {
    Notification {
        related_id: Some(rdv.id.clone()),
        action_url: Some("/planning".into()),
        ..notification(
            format!("appointment-today-{}", rdv.id),
            NotificationKind::Appointment,
            "Rendez-vous aujourd'hui",
            format!("{} - {} ({})", rdv.patient, rdv.heure, rdv.kind),
            time,
            Priority::Medium,
        )
    }
}

// ─── Appointments ────────────────────────────────────────────────────────────

/// Appointments earlier today, up to `now`.
pub struct SameDayAppointments;

impl NotificationRule for SameDayAppointments {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let window_start = start_of_day(now) - Duration::days(1);

        snapshot
            .rendez_vous
            .iter()
            .filter_map(|rdv| rdv.when().map(|at| (rdv, at)))
            .filter(|(_, at)| *at >= window_start && *at <= now && at.date() == now.date())
            .map(|(rdv, at)| {
                let hours_ago = (now - at).num_hours();
                let time = if hours_ago > 0 {
                    format!("Il y a {hours_ago}h")
                } else {
                    "Récemment".to_string()
                };
                same_day_notification(rdv, time)
            })
            .collect()
    }
}

/// Appointments between today 00:00 and tomorrow 00:00. Those starting
/// within two hours become high-priority reminders.
pub struct UpcomingReminders;

impl NotificationRule for UpcomingReminders {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let today = start_of_day(now);
        let tomorrow = today + Duration::days(1);
        let time = TimeLabels::WallClock.label("", now);

        let mut out = Vec::new();
        for rdv in snapshot.rendez_vous {
            let Some(at) = rdv.when() else { continue };
            if at < today || at > tomorrow {
                continue;
            }

            let hours_until = (at - now).num_hours();
            if hours_until > 0 && hours_until <= 2 {
                out.push(Notification {
                    related_id: Some(rdv.id.clone()),
                    action_url: Some("/planning".into()),
                    ..notification(
                        format!("appointment-{}", rdv.id),
                        NotificationKind::Reminder,
                        "Rendez-vous dans 2h",
                        format!("{} - {} avec Dr. {}", rdv.patient, rdv.heure, rdv.medecin),
                        time.clone(),
                        Priority::High,
                    )
                });
            } else if at.date() == now.date() {
                out.push(same_day_notification(rdv, time.clone()));
            }
        }
        out
    }
}

/// Urgent appointments from today onward. One notification each.
pub struct UrgentAppointments {
    pub labels: TimeLabels,
}

impl NotificationRule for UrgentAppointments {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let today = start_of_day(now);

        snapshot
            .rendez_vous
            .iter()
            .filter(|rdv| rdv.kind.is_urgent())
            .filter(|rdv| rdv.when().is_some_and(|at| at >= today))
            .map(|rdv| Notification {
                related_id: Some(rdv.id.clone()),
                action_url: Some("/planning".into()),
                ..notification(
                    format!("urgent-{}", rdv.id),
                    NotificationKind::Urgent,
                    "URGENCE",
                    format!("{} - {} - {}", rdv.patient, rdv.heure, rdv.medecin),
                    self.labels.label("Maintenant", now),
                    Priority::High,
                )
            })
            .collect()
    }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Patients active in the last 24 hours. A single aggregate notification.
pub struct NewPatients {
    pub labels: TimeLabels,
}

impl NotificationRule for NewPatients {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let count = snapshot
            .patients
            .iter()
            .filter(|p| p.last_activity().is_some_and(|at| within_recent_window(at, now)))
            .count();
        if count == 0 {
            return Vec::new();
        }

        vec![Notification {
            action_url: Some("/patients".into()),
            ..notification(
                "new-patients".into(),
                NotificationKind::Success,
                "Nouveaux patients",
                format!("{count} nouveau(x) patient(s) ajouté(s)"),
                self.labels.label("Récemment", now),
                Priority::Low,
            )
        }]
    }
}

pub struct DoctorsOnLeave {
    pub labels: TimeLabels,
}

impl NotificationRule for DoctorsOnLeave {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let count = snapshot.medecins.iter().filter(|m| m.is_on_leave()).count();
        if count == 0 {
            return Vec::new();
        }

        vec![Notification {
            action_url: Some("/medecins".into()),
            ..notification(
                "doctors-leave".into(),
                NotificationKind::Warning,
                "Médecins en congé",
                format!("{count} médecin(s) actuellement en congé"),
                self.labels.label("Maintenant", now),
                Priority::Medium,
            )
        }]
    }
}

/// Consultations dated in the last 24 hours.
pub struct RecentConsultations {
    pub labels: TimeLabels,
}

impl NotificationRule for RecentConsultations {
    fn collect(&self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Notification> {
        let count = snapshot
            .consultations
            .iter()
            .filter(|c| parse_instant(&c.date).is_some_and(|at| within_recent_window(at, now)))
            .count();
        if count == 0 {
            return Vec::new();
        }

        vec![Notification {
            action_url: Some("/statistiques".into()),
            ..notification(
                "recent-consultations".into(),
                NotificationKind::Info,
                "Consultations récentes",
                format!("{count} consultation(s) effectuée(s) récemment"),
                self.labels.label("Récemment", now),
                Priority::Low,
            )
        }]
    }
}
