//! In-memory notification center: bounded history, read state and toasts.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Notification, NotificationKind, Priority};

use super::{ClinicSnapshot, NotificationGenerator};

/// Most recent notifications kept by the center.
pub const CENTER_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// Transient pop-up raised for a newly seen high-priority notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    fn from_notification(n: &Notification) -> Self {
        Self {
            title: n.title.clone(),
            description: n.message.clone(),
            variant: if n.kind == NotificationKind::Urgent {
                ToastVariant::Destructive
            } else {
                ToastVariant::Default
            },
        }
    }
}

pub struct NotificationCenter {
    generator: NotificationGenerator,
    history: Vec<Notification>,
    seen: HashSet<String>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            generator: NotificationGenerator::center(),
            history: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Regenerate from the snapshot and merge. Returns toasts for new
    /// high-priority notifications.
    pub fn refresh(&mut self, snapshot: &ClinicSnapshot<'_>, now: NaiveDateTime) -> Vec<Toast> {
        let generated = self.generator.generate(snapshot, now);
        self.ingest(generated)
    }

    /// Prepend notifications whose id was never seen before, then cap the
    /// history. Already seen ids are ignored even after deletion.
    pub fn ingest(&mut self, generated: Vec<Notification>) -> Vec<Toast> {
        let fresh: Vec<Notification> = generated
            .into_iter()
            .filter(|n| self.seen.insert(n.id.clone()))
            .collect();
        if fresh.is_empty() {
            return Vec::new();
        }

        let toasts = fresh
            .iter()
            .filter(|n| n.priority == Priority::High)
            .map(Toast::from_notification)
            .collect();

        tracing::debug!(new = fresh.len(), "Notification center updated");
        let mut history = fresh;
        history.append(&mut self.history);
        history.truncate(CENTER_HISTORY_LIMIT);
        self.history = history;
        toasts
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.history
    }

    pub fn unread_count(&self) -> usize {
        self.history.iter().filter(|n| !n.read).count()
    }

    /// Returns false when no notification has this id.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.history.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.history {
            n.read = true;
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.history.len();
        self.history.retain(|n| n.id != id);
        self.history.len() != before
    }

    /// Mark read and return the navigation target, if any.
    pub fn activate(&mut self, id: &str) -> Option<String> {
        let n = self.history.iter_mut().find(|n| n.id == id)?;
        n.read = true;
        n.action_url.clone()
    }
}
