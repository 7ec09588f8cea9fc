//! API endpoint handlers, one module per resource.

pub mod consultations;
pub mod health;
pub mod medecins;
pub mod notifications;
pub mod patients;
pub mod rendez_vous;
pub mod stats;

use uuid::Uuid;

use crate::models::dates;

/// Keep a client-supplied id, or mint a fresh one.
pub(crate) fn assign_id(id: &str) -> String {
    if id.trim().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.trim().to_string()
    }
}

/// Creation timestamp for a new record, unless the client sent one.
pub(crate) fn assign_created_at(created_at: Option<String>) -> Option<String> {
    created_at
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(dates::format_instant(dates::now_local())))
}
