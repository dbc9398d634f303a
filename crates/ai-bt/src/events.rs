//! Named events raised by running trees.
//!
//! An event stays active while something keeps signalling it during traversal. The first
//! signal emits a start notification and a tick without any signal emits an end notification.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEvent {
    pub name: String,
    /// Signalled during the current tick.
    pub hit: bool,
    pub is_async: bool,
}

/// Notification waiting to be delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEvent {
    pub name: String,
    pub phase: EventPhase,
    /// Async events may be delivered from any thread; the rest wait for the main thread.
    pub is_async: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    active: Vec<ActiveEvent>,
    inbound: Vec<(String, bool)>,
    outgoing: VecDeque<OutgoingEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event received between ticks; merged at the start of the next tick.
    pub fn push(&mut self, name: impl Into<String>, is_async: bool) {
        self.inbound.push((name.into(), is_async));
    }

    /// Mark `name` as hit for the current tick, starting it if needed.
    pub fn signal(&mut self, name: &str, is_async: bool) {
        if let Some(event) = self.active.iter_mut().find(|e| e.name == name) {
            event.hit = true;
            return;
        }
        self.active.push(ActiveEvent {
            name: name.to_string(),
            hit: true,
            is_async,
        });
        self.outgoing.push_back(OutgoingEvent {
            name: name.to_string(),
            phase: EventPhase::Start,
            is_async,
        });
    }

    pub(crate) fn begin_tick(&mut self) {
        for event in self.active.iter_mut() {
            event.hit = false;
        }
        for (name, is_async) in std::mem::take(&mut self.inbound) {
            self.signal(&name, is_async);
        }
    }

    /// End every event that was not signalled since `begin_tick`.
    pub(crate) fn end_tick(&mut self) {
        let outgoing = &mut self.outgoing;
        self.active.retain(|event| {
            if !event.hit {
                outgoing.push_back(OutgoingEvent {
                    name: event.name.clone(),
                    phase: EventPhase::End,
                    is_async: event.is_async,
                });
            }
            event.hit
        });
    }

    pub(crate) fn end_all(&mut self) {
        self.inbound.clear();
        for event in self.active.drain(..) {
            self.outgoing.push_back(OutgoingEvent {
                name: event.name,
                phase: EventPhase::End,
                is_async: event.is_async,
            });
        }
    }

    pub fn active(&self) -> &[ActiveEvent] {
        &self.active
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|e| e.name == name)
    }

    pub fn outgoing(&self) -> impl Iterator<Item = &OutgoingEvent> {
        self.outgoing.iter()
    }

    /// Deliver queued events allowed on this thread, keeping the others queued in order.
    ///
    /// Returns the number of delivered events.
    pub fn dispatch(
        &mut self,
        on_main_thread: bool,
        mut deliver: impl FnMut(&OutgoingEvent),
    ) -> usize {
        let mut delivered = 0;
        let mut kept = VecDeque::with_capacity(self.outgoing.len());
        while let Some(event) = self.outgoing.pop_front() {
            if event.is_async || on_main_thread {
                deliver(&event);
                delivered += 1;
            } else {
                kept.push_back(event);
            }
        }
        self.outgoing = kept;
        delivered
    }
}
