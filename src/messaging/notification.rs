// Notification system for reporting transport diagnostics to the host UI

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Subsystem a notification originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// Host time problems (backward or non-finite ticks)
    Clock,
    /// Rejected tempo changes
    Tempo,
}

/// Notification with host timestamp and metadata
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    /// Host real time in seconds when the notification was raised
    pub real_time: f64,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: String,
        real_time: f64,
    ) -> Self {
        Self {
            level,
            category,
            message,
            real_time,
        }
    }

    pub fn warning(category: NotificationCategory, message: String, real_time: f64) -> Self {
        Self::new(NotificationLevel::Warning, category, message, real_time)
    }
}
