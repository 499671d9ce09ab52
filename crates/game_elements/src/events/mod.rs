//! Broadcast notifications for completed stage transitions.
//!
//! Key principles:
//! - Observers register with an interest mask; only interested observers run
//! - Dispatch is synchronous fan-out on the driving thread, in registration
//!   structure order, with no reentrancy guarantees
//! - Registration hands back a stable key so observers can be removed later

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};

use crate::element::Sender;

bitflags! {
    /// Interest mask used at observer registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u8 {
        /// The hierarchy finished preparing (including scene steps).
        const PREPARED = 1 << 0;
        /// The hierarchy became ready.
        const READY = 1 << 1;
        /// The hierarchy started playing.
        const STARTED = 1 << 2;
        /// The hierarchy paused.
        const PAUSED = 1 << 3;
        /// The hierarchy resumed.
        const RESUMED = 1 << 4;
        /// The hierarchy finished.
        const FINISHED = 1 << 5;
        /// Every notification.
        const ALL = Self::PREPARED.bits()
            | Self::READY.bits()
            | Self::STARTED.bits()
            | Self::PAUSED.bits()
            | Self::RESUMED.bits()
            | Self::FINISHED.bits();
    }
}

/// A completed stage transition, carrying the instigating sender.
///
/// Fired after the corresponding internal transition has run through the
/// whole hierarchy. Destruction is deliberately not broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Preparation completed, scene load/initialize steps included.
    Prepared(Sender),
    /// Ready completed.
    Ready(Sender),
    /// Start completed.
    Started(Sender),
    /// Pause completed.
    Paused(Sender),
    /// Resume completed.
    Resumed(Sender),
    /// Finish completed.
    Finished(Sender),
}

impl GameEvent {
    /// The instigator forwarded with the transition.
    pub fn sender(&self) -> Sender {
        match *self {
            GameEvent::Prepared(sender)
            | GameEvent::Ready(sender)
            | GameEvent::Started(sender)
            | GameEvent::Paused(sender)
            | GameEvent::Resumed(sender)
            | GameEvent::Finished(sender) => sender,
        }
    }

    /// The mask bit this event matches against observer interest.
    pub fn mask(&self) -> EventMask {
        match self {
            GameEvent::Prepared(_) => EventMask::PREPARED,
            GameEvent::Ready(_) => EventMask::READY,
            GameEvent::Started(_) => EventMask::STARTED,
            GameEvent::Paused(_) => EventMask::PAUSED,
            GameEvent::Resumed(_) => EventMask::RESUMED,
            GameEvent::Finished(_) => EventMask::FINISHED,
        }
    }
}

/// Receives broadcast notifications.
///
/// Implemented for any `FnMut(&GameEvent)` closure, so quick subscribers can
/// be registered without a named type.
pub trait GameObserver {
    /// Called for every event matching the observer's interest mask.
    fn on_game_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent) + 'static> GameObserver for F {
    fn on_game_event(&mut self, event: &GameEvent) {
        self(event);
    }
}

new_key_type! {
    /// Stable handle for a registered observer.
    pub struct ObserverKey;
}

struct Subscription {
    interest: EventMask,
    observer: Box<dyn GameObserver>,
}

/// Observer list with synchronous fan-out.
pub struct ObserverList {
    subscriptions: SlotMap<ObserverKey, Subscription>,
}

impl ObserverList {
    /// Empty list.
    pub fn new() -> Self {
        Self {
            subscriptions: SlotMap::with_key(),
        }
    }

    /// Registers an observer for the masked events.
    pub fn register(&mut self, interest: EventMask, observer: Box<dyn GameObserver>) -> ObserverKey {
        self.subscriptions.insert(Subscription { interest, observer })
    }

    /// Removes an observer; `false` when the key is stale.
    pub fn unregister(&mut self, key: ObserverKey) -> bool {
        self.subscriptions.remove(key).is_some()
    }

    /// Fans the event out to every interested observer.
    pub fn notify(&mut self, event: &GameEvent) {
        let mask = event.mask();
        for subscription in self.subscriptions.values_mut() {
            if subscription.interest.contains(mask) {
                subscription.observer.on_game_event(event);
            }
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drops every observer (state transitions, teardown).
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl Default for ObserverList {
    fn default() -> Self {
        Self::new()
    }
}
