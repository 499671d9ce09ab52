//! Per-element lifecycle state holder.

use std::fmt;

use crate::context::GameSystem;
use crate::element::{ElementRc, ElementWeak};

use super::GameStage;

/// Holds one element's position in the stage sequence together with its
/// registration bracket and back-references.
///
/// Every element embeds one of these and exposes it through
/// [`Element::lifecycle`](crate::element::Element::lifecycle). All gates are
/// silent no-ops when their precondition fails: duplicate calls arriving over
/// multiple propagation paths must never take a hierarchy down.
///
/// The back-references are injected by the registering container. The parent
/// is identity only; the [`GameSystem`] handle is the element's way to reach
/// the surrounding wiring (node lookup, scene steps) without any global state.
pub struct Lifecycle {
    stage: GameStage,
    registered: bool,
    parent: Option<ElementWeak>,
    system: Option<GameSystem>,
}

impl Lifecycle {
    /// New holder at [`GameStage::Create`], not registered anywhere.
    pub fn new() -> Self {
        Self {
            stage: GameStage::Create,
            registered: false,
            parent: None,
            system: None,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> GameStage {
        self.stage
    }

    /// Whether the element currently belongs to a container.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The registering container, if it is still alive.
    pub fn parent(&self) -> Option<ElementRc> {
        self.parent.as_ref().and_then(std::rc::Weak::upgrade)
    }

    /// The system handle injected at registration time.
    pub fn system(&self) -> Option<&GameSystem> {
        self.system.as_ref()
    }

    /// Single-step forward gate.
    ///
    /// Applies `next` only when the current stage is its direct predecessor
    /// (create→prepare, prepare→ready, ready→play, play→pause). Returns
    /// whether the transition applied; the caller fires the matching hook
    /// only on `true`.
    pub fn step_to(&mut self, next: GameStage) -> bool {
        if self.stage.rank() + 1 == next.rank() && !next.is_terminal() {
            self.stage = next;
            true
        } else {
            false
        }
    }

    /// Terminal jump gate for [`GameStage::Finish`] and
    /// [`GameStage::Destroy`].
    ///
    /// Applies only while the current stage is below `terminal`, so each
    /// terminal hook fires at most once no matter how often the call is
    /// replayed, and an element that never started can still finish.
    pub fn jump_to(&mut self, terminal: GameStage) -> bool {
        if terminal.is_terminal() && self.stage < terminal {
            self.stage = terminal;
            true
        } else {
            false
        }
    }

    /// Whether a resume may begin (the element is paused).
    ///
    /// Resume is the one two-way edge: the hook runs first, while the stored
    /// stage is still [`GameStage::Pause`], and [`Self::complete_resume`]
    /// moves the stage back afterwards.
    pub fn can_resume(&self) -> bool {
        self.stage == GameStage::Pause
    }

    /// Finishes a resume by returning the stage to [`GameStage::Play`].
    pub fn complete_resume(&mut self) -> bool {
        if self.stage == GameStage::Pause {
            self.stage = GameStage::Play;
            true
        } else {
            false
        }
    }

    /// Attaches the element to a container.
    ///
    /// Called by the registering container, never by the element itself.
    /// Resets the stage to [`GameStage::Create`] so a re-added element
    /// restarts its lifecycle. Returns `false` without side effects when the
    /// element is already registered.
    pub fn register(&mut self, parent: Option<ElementWeak>, system: Option<GameSystem>) -> bool {
        if self.registered {
            return false;
        }
        self.stage = GameStage::Create;
        self.parent = parent;
        self.system = system;
        self.registered = true;
        true
    }

    /// Detaches the element from its container.
    ///
    /// No stage precondition: removal does not drive finish/destroy. Returns
    /// `false` when the element was not registered, so the unregister hook
    /// fires exactly once per registration.
    pub fn unregister(&mut self) -> bool {
        if !self.registered {
            return false;
        }
        self.parent = None;
        self.system = None;
        self.registered = false;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("stage", &self.stage)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_steps_apply_once() {
        let mut cycle = Lifecycle::new();
        assert!(cycle.step_to(GameStage::Prepare));
        assert!(!cycle.step_to(GameStage::Prepare));
        assert!(cycle.step_to(GameStage::Ready));
        assert!(cycle.step_to(GameStage::Play));
        assert!(cycle.step_to(GameStage::Pause));
        assert_eq!(cycle.stage(), GameStage::Pause);
    }

    #[test]
    fn test_skipping_a_step_is_a_no_op() {
        let mut cycle = Lifecycle::new();
        assert!(!cycle.step_to(GameStage::Ready));
        assert!(!cycle.step_to(GameStage::Play));
        assert_eq!(cycle.stage(), GameStage::Create);
    }

    #[test]
    fn test_terminals_reachable_from_any_earlier_stage() {
        let mut cycle = Lifecycle::new();
        assert!(cycle.jump_to(GameStage::Finish));
        assert_eq!(cycle.stage(), GameStage::Finish);
        assert!(!cycle.jump_to(GameStage::Finish));
        assert!(cycle.jump_to(GameStage::Destroy));
        assert!(!cycle.jump_to(GameStage::Destroy));
    }

    #[test]
    fn test_terminal_gate_rejects_forward_stages() {
        let mut cycle = Lifecycle::new();
        assert!(!cycle.jump_to(GameStage::Play));
        assert_eq!(cycle.stage(), GameStage::Create);
    }

    #[test]
    fn test_step_gate_rejects_terminals() {
        let mut cycle = Lifecycle::new();
        cycle.step_to(GameStage::Prepare);
        cycle.step_to(GameStage::Ready);
        cycle.step_to(GameStage::Play);
        cycle.step_to(GameStage::Pause);
        // Pause -> Finish is rank-adjacent but must go through jump_to.
        assert!(!cycle.step_to(GameStage::Finish));
        assert!(cycle.jump_to(GameStage::Finish));
    }

    #[test]
    fn test_resume_edge() {
        let mut cycle = Lifecycle::new();
        assert!(!cycle.can_resume());
        assert!(!cycle.complete_resume());
        cycle.step_to(GameStage::Prepare);
        cycle.step_to(GameStage::Ready);
        cycle.step_to(GameStage::Play);
        cycle.step_to(GameStage::Pause);
        assert!(cycle.can_resume());
        assert!(cycle.complete_resume());
        assert_eq!(cycle.stage(), GameStage::Play);
        assert!(!cycle.complete_resume());
    }

    #[test]
    fn test_registration_bracket() {
        let mut cycle = Lifecycle::new();
        cycle.step_to(GameStage::Prepare);
        assert!(cycle.register(None, None));
        assert_eq!(cycle.stage(), GameStage::Create, "registration restarts the lifecycle");
        assert!(!cycle.register(None, None));
        assert!(cycle.unregister());
        assert!(!cycle.unregister());
        assert!(cycle.register(None, None), "a detached element may be registered again");
    }
}
