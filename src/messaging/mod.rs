// Messaging - lock-free channels and diagnostics reporting

pub mod channels;
pub mod notification;
pub mod throttle;

pub use channels::{
    EventConsumer, EventProducer, NotificationConsumer, NotificationProducer,
    create_event_channel, create_notification_channel,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
pub use throttle::DiagnosticThrottle;
