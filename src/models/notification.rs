use serde::{Deserialize, Serialize};

/// Notification category. Drives icon and color through [`NotificationKind::style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Appointment,
    Urgent,
    Reminder,
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::High => "#ef4444",
            Self::Medium => "#f59e0b",
            Self::Low => "#3b82f6",
        }
    }
}

/// Icon and accent color for a notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

const KIND_STYLES: &[(NotificationKind, KindStyle)] = &[
    (NotificationKind::Appointment, KindStyle { icon: "calendar", color: "#3b82f6" }),
    (NotificationKind::Urgent, KindStyle { icon: "alert-circle", color: "#ef4444" }),
    (NotificationKind::Reminder, KindStyle { icon: "clock", color: "#f59e0b" }),
    (NotificationKind::Info, KindStyle { icon: "info", color: "#06b6d4" }),
    (NotificationKind::Success, KindStyle { icon: "check-circle", color: "#10b981" }),
    (NotificationKind::Warning, KindStyle { icon: "alert-triangle", color: "#f59e0b" }),
];

impl NotificationKind {
    pub fn style(&self) -> KindStyle {
        KIND_STYLES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, style)| *style)
            .unwrap_or(KindStyle { icon: "bell", color: "#64748b" })
    }

    /// Accent color once priority is taken into account. High priority
    /// keeps urgent/reminder colors and turns everything else blue.
    pub fn color_for(&self, priority: Priority) -> &'static str {
        if priority == Priority::High {
            return match self {
                Self::Urgent | Self::Reminder => self.style().color,
                _ => "#3b82f6",
            };
        }
        self.style().color
    }
}

/// A derived, never-persisted alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Relative-time label ("Il y a 3h", "Maintenant", "14:05").
    pub time: String,
    pub read: bool,
    pub priority: Priority,
    pub related_id: Option<String>,
    pub action_url: Option<String>,
}
