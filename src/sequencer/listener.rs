// Beat listeners - registration and dispatch
// The listener set is frozen while beats are dispatched; attach/detach requested
// from inside a callback are queued and applied once the dispatch loop is done.

use super::clock::TimeMapping;
use super::timeline::{BeatIndex, Tempo};
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Anything that reacts to beat boundaries
pub trait BeatListener {
    /// Called once per crossed integer beat, in increasing order
    fn on_beat(&mut self, beat: BeatIndex, clock: &mut ClockContext<'_>);

    /// Called when the transport stops or pauses
    fn on_stop(&mut self) {}
}

/// Listener shared between the clock and its owner
pub type SharedListener = Rc<RefCell<dyn BeatListener>>;

/// Handle returned by attach, used to detach later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

enum PendingChange {
    Attach(ListenerId, SharedListener),
    Detach(ListenerId),
}

/// Attach/detach requests collected during dispatch
#[derive(Default)]
struct ChangeQueue {
    pending: Vec<PendingChange>,
    next_id: u64,
}

impl ChangeQueue {
    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// View of the clock handed to listeners during dispatch
///
/// Timestamps are computed from the clock state as it was before the current
/// advance, which is the mapping the dispatched beats were derived from.
pub struct ClockContext<'a> {
    mapping: TimeMapping,
    changes: &'a mut ChangeQueue,
}

impl ClockContext<'_> {
    /// Musical position (beats) at the start of the current advance
    pub fn position(&self) -> f64 {
        self.mapping.position
    }

    /// Host time (seconds) matching [`ClockContext::position`]
    pub fn real_time(&self) -> f64 {
        self.mapping.real_time
    }

    pub fn tempo(&self) -> Tempo {
        self.mapping.tempo
    }

    /// Host time (seconds) at which `position` (beats) will sound
    pub fn timestamp(&self, position: f64) -> f64 {
        self.mapping.timestamp(position)
    }

    /// Queue a listener; it receives beats from the next advance on
    pub fn attach(&mut self, listener: SharedListener) -> ListenerId {
        let id = self.changes.allocate_id();
        self.changes.pending.push(PendingChange::Attach(id, listener));
        id
    }

    /// Queue a detach; the listener still receives the rest of this advance
    pub fn detach(&mut self, id: ListenerId) {
        self.changes.pending.push(PendingChange::Detach(id));
    }
}

/// Attached listeners in attach order
#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: Vec<(ListenerId, SharedListener)>,
    changes: ChangeQueue,
}

impl ListenerSet {
    pub fn attach(&mut self, listener: SharedListener) -> ListenerId {
        let id = self.changes.allocate_id();
        self.entries.push((id, listener));
        id
    }

    pub fn detach(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Dispatch every beat of `beats` to every listener, then apply queued changes
    pub fn dispatch(&mut self, beats: Range<BeatIndex>, mapping: TimeMapping) {
        for beat in beats {
            for (id, listener) in &self.entries {
                let mut context = ClockContext {
                    mapping,
                    changes: &mut self.changes,
                };
                match listener.try_borrow_mut() {
                    Ok(mut listener) => listener.on_beat(beat, &mut context),
                    Err(_) => {
                        tracing::warn!(%id, beat, "listener busy during dispatch, beat skipped");
                    }
                }
            }
        }
        self.apply_pending();
    }

    /// Forward a transport stop to every listener
    pub fn notify_stop(&mut self) {
        for (id, listener) in &self.entries {
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_stop(),
                Err(_) => tracing::warn!(%id, "listener busy, stop notification skipped"),
            }
        }
    }

    fn apply_pending(&mut self) {
        for change in std::mem::take(&mut self.changes.pending) {
            match change {
                PendingChange::Attach(id, listener) => self.entries.push((id, listener)),
                PendingChange::Detach(id) => {
                    self.detach(id);
                }
            }
        }
    }
}
