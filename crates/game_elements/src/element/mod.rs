//! Elements: the participants of the staged hierarchy.
//!
//! An [`Element`] is anything that moves through the shared stage sequence.
//! Implementors embed a [`Lifecycle`] and override whichever stage hooks they
//! care about; the gated entry points are provided and must not be
//! reimplemented. Containers ([`ElementGroup`], [`ElementLayer`]) are
//! elements themselves and relay every transition to their children.
//!
//! A fault (panic) inside a hook is deliberately not caught here: it unwinds
//! through the propagation and aborts the remaining siblings. Registry-level
//! failures stay recoverable boolean/`Result` outcomes.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::lifecycle::{GameStage, Lifecycle};
use crate::registry::Castable;

mod group;
mod layer;

pub use group::{Container, ElementGroup, ElementStore, GroupHooks, OrderedChildren};
pub use layer::{ElementLayer, TypedChildren};

/// Erased shared handle to an element.
pub type ElementRc = Rc<RefCell<dyn Element>>;

/// Weak back-reference from a child to its registering container.
pub type ElementWeak = Weak<RefCell<dyn Element>>;

/// Opaque identity of whoever instigated a stage call.
///
/// Forwarded unchanged to every hook for diagnostics and targeted logic; the
/// state machine itself never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The external driver of the hierarchy.
    Driver,
    /// A container reconciling a late-joined child.
    CatchUp,
    /// Ad-hoc diagnostic tag.
    Named(&'static str),
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Driver => f.write_str("driver"),
            Sender::CatchUp => f.write_str("catch-up"),
            Sender::Named(name) => f.write_str(name),
        }
    }
}

/// A participant in the staged hierarchy.
///
/// The nine `on_*` hooks default to empty; implement the ones the element
/// needs. The entry points (`prepare` … `destroy`) carry the gating contract
/// and are provided: a call whose precondition fails is a silent no-op, so a
/// hook fires at most once per stage no matter how many propagation paths
/// reach the element.
///
/// `on_registered`/`on_unregistered` bracket container membership and are
/// invoked by the container, never by the element itself.
pub trait Element: Castable {
    /// The element's embedded lifecycle state.
    fn lifecycle(&self) -> &Lifecycle;

    /// Mutable access to the embedded lifecycle state.
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Current stage, shorthand for `self.lifecycle().stage()`.
    fn stage(&self) -> GameStage {
        self.lifecycle().stage()
    }

    /// Called once when a container takes ownership of this element.
    fn on_registered(&mut self) {}

    /// Stage hook for [`GameStage::Prepare`].
    fn on_prepare(&mut self, _sender: Sender) {}

    /// Stage hook for [`GameStage::Ready`].
    fn on_ready(&mut self, _sender: Sender) {}

    /// Stage hook for [`GameStage::Play`].
    fn on_start(&mut self, _sender: Sender) {}

    /// Stage hook for [`GameStage::Pause`].
    fn on_pause(&mut self, _sender: Sender) {}

    /// Resume hook; runs while the stored stage is still
    /// [`GameStage::Pause`].
    fn on_resume(&mut self, _sender: Sender) {}

    /// Stage hook for [`GameStage::Finish`].
    fn on_finish(&mut self, _sender: Sender) {}

    /// Stage hook for [`GameStage::Destroy`].
    fn on_destroy(&mut self, _sender: Sender) {}

    /// Called once when the element leaves its container.
    fn on_unregistered(&mut self) {}

    /// Create → prepare.
    fn prepare(&mut self, sender: Sender) {
        if self.lifecycle_mut().step_to(GameStage::Prepare) {
            self.on_prepare(sender);
        }
    }

    /// Prepare → ready.
    fn ready(&mut self, sender: Sender) {
        if self.lifecycle_mut().step_to(GameStage::Ready) {
            self.on_ready(sender);
        }
    }

    /// Ready → play.
    fn start(&mut self, sender: Sender) {
        if self.lifecycle_mut().step_to(GameStage::Play) {
            self.on_start(sender);
        }
    }

    /// Play → pause.
    fn pause(&mut self, sender: Sender) {
        if self.lifecycle_mut().step_to(GameStage::Pause) {
            self.on_pause(sender);
        }
    }

    /// Pause → play. The hook fires first so it can still observe the
    /// pre-resume stage.
    fn resume(&mut self, sender: Sender) {
        if self.lifecycle().can_resume() {
            self.on_resume(sender);
            self.lifecycle_mut().complete_resume();
        }
    }

    /// Terminal finish; reachable from any earlier stage, fires once.
    fn finish(&mut self, sender: Sender) {
        if self.lifecycle_mut().jump_to(GameStage::Finish) {
            self.on_finish(sender);
        }
    }

    /// Terminal destroy; reachable from any earlier stage, fires once.
    fn destroy(&mut self, sender: Sender) {
        if self.lifecycle_mut().jump_to(GameStage::Destroy) {
            self.on_destroy(sender);
        }
    }
}

/// Replays the stage hooks a container has already completed onto a
/// late-joined child, collapsed into one synchronous sequence.
///
/// Nothing happens while the container is below [`GameStage::Prepare`] (the
/// child will be driven normally by the next real transition) or at/after
/// [`GameStage::Finish`] (no catch-up into a dead container). A resume is
/// never synthesized: a child joining a container that paused and resumed
/// earlier only ever observes `play` directly.
pub fn catch_up(element: &ElementRc, container_stage: GameStage, sender: Sender) {
    if container_stage >= GameStage::Finish {
        return;
    }
    if container_stage < GameStage::Prepare {
        return;
    }
    log::trace!("catching element up to {container_stage}");
    let mut element = element.borrow_mut();
    element.prepare(sender);
    if container_stage >= GameStage::Ready {
        element.ready(sender);
    }
    if container_stage >= GameStage::Play {
        element.start(sender);
    }
    if container_stage == GameStage::Pause {
        element.pause(sender);
    }
}

/// Concrete type id of an erased element, via the vtable.
pub(crate) fn concrete_type_id(element: &ElementRc) -> TypeId {
    let borrowed = element.borrow();
    let element: &dyn Element = &*borrowed;
    element.type_id()
}


#[cfg(test)]
mod tests {
    use super::test_support::{journal, Probe};
    use super::*;

    #[test]
    fn test_hooks_fire_at_most_once_per_stage() {
        let log = journal();
        let probe = Probe::new("p", &log);
        {
            let mut p = probe.borrow_mut();
            p.prepare(Sender::Driver);
            p.prepare(Sender::Driver);
            p.ready(Sender::Driver);
            p.ready(Sender::Driver);
            p.start(Sender::Driver);
        }
        assert_eq!(*log.borrow(), vec!["p:prepare", "p:ready", "p:start"]);
    }

    #[test]
    fn test_out_of_order_calls_are_silent() {
        let log = journal();
        let probe = Probe::new("p", &log);
        {
            let mut p = probe.borrow_mut();
            p.start(Sender::Driver);
            p.pause(Sender::Driver);
            p.resume(Sender::Driver);
        }
        assert!(log.borrow().is_empty());
        assert_eq!(probe.borrow().stage(), GameStage::Create);
    }

    #[test]
    fn test_resume_hook_sees_pause_stage() {
        struct StageWitness {
            lifecycle: Lifecycle,
            observed: Option<GameStage>,
        }
        impl Castable for StageWitness {}
        impl Element for StageWitness {
            fn lifecycle(&self) -> &Lifecycle {
                &self.lifecycle
            }
            fn lifecycle_mut(&mut self) -> &mut Lifecycle {
                &mut self.lifecycle
            }
            fn on_resume(&mut self, _sender: Sender) {
                self.observed = Some(self.lifecycle.stage());
            }
        }

        let mut witness = StageWitness {
            lifecycle: Lifecycle::new(),
            observed: None,
        };
        witness.prepare(Sender::Driver);
        witness.ready(Sender::Driver);
        witness.start(Sender::Driver);
        witness.pause(Sender::Driver);
        witness.resume(Sender::Driver);

        assert_eq!(witness.observed, Some(GameStage::Pause));
        assert_eq!(witness.stage(), GameStage::Play);
    }

    #[test]
    fn test_finish_fires_once_from_any_stage() {
        let log = journal();
        let probe = Probe::new("p", &log);
        {
            let mut p = probe.borrow_mut();
            p.prepare(Sender::Driver);
            p.finish(Sender::Driver);
            p.finish(Sender::Driver);
            p.destroy(Sender::Driver);
            p.destroy(Sender::Driver);
        }
        assert_eq!(*log.borrow(), vec!["p:prepare", "p:finish", "p:destroy"]);
    }

    #[test]
    fn test_catch_up_replays_completed_stages_in_order() {
        let log = journal();
        let probe = Probe::new("p", &log);
        let handle: ElementRc = probe;
        catch_up(&handle, GameStage::Ready, Sender::CatchUp);
        assert_eq!(*log.borrow(), vec!["p:prepare", "p:ready"]);
    }

    #[test]
    fn test_catch_up_into_paused_container_ends_paused() {
        let log = journal();
        let probe = Probe::new("p", &log);
        let handle: ElementRc = probe;
        catch_up(&handle, GameStage::Pause, Sender::CatchUp);
        assert_eq!(
            *log.borrow(),
            vec!["p:prepare", "p:ready", "p:start", "p:pause"]
        );
    }

    #[test]
    fn test_no_catch_up_outside_the_window() {
        let log = journal();
        let probe = Probe::new("p", &log);
        let handle: ElementRc = probe;
        catch_up(&handle, GameStage::Create, Sender::CatchUp);
        catch_up(&handle, GameStage::Finish, Sender::CatchUp);
        catch_up(&handle, GameStage::Destroy, Sender::CatchUp);
        assert!(log.borrow().is_empty());
        assert_eq!(handle.borrow().stage(), GameStage::Create);
    }
}
