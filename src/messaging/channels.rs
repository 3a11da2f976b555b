// Communication channels lock-free

use crate::instrument::InstrumentEvent;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

pub type EventProducer = ringbuf::HeapProd<InstrumentEvent>;
pub type EventConsumer = ringbuf::HeapCons<InstrumentEvent>;

/// Channel carrying scheduled note events from the control thread to the audio thread
pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<InstrumentEvent>::new(capacity);
    rb.split()
}
