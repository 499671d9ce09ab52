//! Composite elements: propagation over a child collection.

use std::any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::lifecycle::Lifecycle;
use crate::registry::{Castable, SharedCell};

use super::{catch_up, Element, ElementRc, ElementWeak, Sender};

/// Self-behavior of a container, composed in rather than inherited.
///
/// A container's own hook fires before its children for every forward stage
/// and for finish; destroy is the exception, where children tear down first
/// while the container is still alive. All hooks default to empty.
pub trait GroupHooks: 'static {
    /// Container registered into its parent.
    fn on_registered(&mut self) {}
    /// Container preparing, before any child.
    fn on_prepare(&mut self, _sender: Sender) {}
    /// Container ready, before any child.
    fn on_ready(&mut self, _sender: Sender) {}
    /// Container starting, before any child.
    fn on_start(&mut self, _sender: Sender) {}
    /// Container pausing, before any child.
    fn on_pause(&mut self, _sender: Sender) {}
    /// Container resuming, before any child.
    fn on_resume(&mut self, _sender: Sender) {}
    /// Container finishing, before any child.
    fn on_finish(&mut self, _sender: Sender) {}
    /// Container tearing down, after every child.
    fn on_destroy(&mut self, _sender: Sender) {}
    /// Container removed from its parent.
    fn on_unregistered(&mut self) {}
}

impl GroupHooks for () {}

/// Storage strategy for a container's children.
pub trait ElementStore: 'static {
    /// Snapshot of the current members, in this store's iteration order.
    /// Propagation iterates the snapshot, so membership changes triggered
    /// mid-walk (by a hook with outside access) cannot skip or repeat a
    /// child.
    fn snapshot(&self) -> Vec<ElementRc>;

    /// Number of members.
    fn len(&self) -> usize;

    /// Whether the store has no members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered child storage: members propagate in insertion order.
#[derive(Default)]
pub struct OrderedChildren {
    pub(crate) items: Vec<ElementRc>,
}

impl ElementStore for OrderedChildren {
    fn snapshot(&self) -> Vec<ElementRc> {
        self.items.clone()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// An element that owns other elements and relays every stage transition.
///
/// The two strategies are composed in: `S` decides how children are stored
/// and iterated (ordered list or typed map), `H` supplies the container's own
/// stage behavior. Containers live inside `Rc<RefCell<_>>` so children can
/// hold a real weak back-reference to their parent; use [`ElementGroup`] or
/// [`ElementLayer`](super::ElementLayer) constructors to build one.
pub struct Container<S: ElementStore, H: GroupHooks = ()> {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) children: S,
    pub(crate) hooks: H,
    pub(crate) self_weak: Weak<RefCell<Self>>,
}

/// A container over an ordered child list.
pub type ElementGroup<H = ()> = Container<OrderedChildren, H>;

impl<S: ElementStore + Default, H: GroupHooks> Container<S, H> {
    /// Builds a container with the given self-behavior.
    pub fn with_hooks(hooks: H) -> SharedCell<Self> {
        Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                lifecycle: Lifecycle::new(),
                children: S::default(),
                hooks,
                self_weak: weak.clone(),
            })
        })
    }
}

impl<S: ElementStore + Default> Container<S, ()> {
    /// Builds a container with no self-behavior of its own.
    pub fn new() -> SharedCell<Self> {
        Self::with_hooks(())
    }
}

impl<S: ElementStore, H: GroupHooks> Container<S, H> {
    /// Number of current children.
    pub fn element_count(&self) -> usize {
        self.children.len()
    }

    /// Snapshot of the current children.
    pub fn elements(&self) -> Vec<ElementRc> {
        self.children.snapshot()
    }

    /// The composed self-behavior.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Mutable access to the composed self-behavior.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Wires a freshly stored child: back-references, the one-time
    /// registration hook, then catch-up to this container's stage.
    pub(crate) fn register_child(&mut self, child: &ElementRc) {
        {
            let mut child = child.borrow_mut();
            let parent: ElementWeak = self.self_weak.clone();
            if child
                .lifecycle_mut()
                .register(Some(parent), self.lifecycle.system().cloned())
            {
                child.on_registered();
            }
        }
        catch_up(child, self.lifecycle.stage(), Sender::CatchUp);
    }

    /// Detaches a child that has just left the store.
    pub(crate) fn unregister_child(child: &ElementRc) {
        let mut child = child.borrow_mut();
        if child.lifecycle_mut().unregister() {
            child.on_unregistered();
        }
    }
}

impl<H: GroupHooks> Container<OrderedChildren, H> {
    /// Appends a child and runs the registration/catch-up protocol.
    ///
    /// Fails when the element already belongs to a container: an element has
    /// exactly one parent at a time.
    pub fn add_element<T: Element>(&mut self, element: SharedCell<T>) -> bool {
        if element.borrow().lifecycle().is_registered() {
            log::debug!(
                "rejected {}: element already has a parent",
                any::type_name::<T>()
            );
            return false;
        }
        let handle: ElementRc = element;
        self.children.items.push(Rc::clone(&handle));
        self.register_child(&handle);
        true
    }

    /// Removes a child by handle identity and fires its unregister hook.
    ///
    /// Does not drive finish/destroy: a caller that wants a clean teardown
    /// drives those stages before removing.
    pub fn remove_element(&mut self, element: &ElementRc) -> bool {
        if let Some(index) = self
            .children
            .items
            .iter()
            .position(|child| Rc::ptr_eq(child, element))
        {
            let removed = self.children.items.remove(index);
            Self::unregister_child(&removed);
            true
        } else {
            false
        }
    }
}

impl<S: ElementStore, H: GroupHooks> Castable for Container<S, H> {}

impl<S: ElementStore, H: GroupHooks> Element for Container<S, H> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_registered(&mut self) {
        self.hooks.on_registered();
    }

    fn on_prepare(&mut self, sender: Sender) {
        self.hooks.on_prepare(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().prepare(sender);
        }
    }

    fn on_ready(&mut self, sender: Sender) {
        self.hooks.on_ready(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().ready(sender);
        }
    }

    fn on_start(&mut self, sender: Sender) {
        self.hooks.on_start(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().start(sender);
        }
    }

    fn on_pause(&mut self, sender: Sender) {
        self.hooks.on_pause(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().pause(sender);
        }
    }

    fn on_resume(&mut self, sender: Sender) {
        self.hooks.on_resume(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().resume(sender);
        }
    }

    fn on_finish(&mut self, sender: Sender) {
        self.hooks.on_finish(sender);
        for child in self.children.snapshot() {
            child.borrow_mut().finish(sender);
        }
    }

    fn on_destroy(&mut self, sender: Sender) {
        // Children release their resources while the container is still alive.
        for child in self.children.snapshot() {
            child.borrow_mut().destroy(sender);
        }
        self.hooks.on_destroy(sender);
    }

    fn on_unregistered(&mut self) {
        self.hooks.on_unregistered();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{journal, Journal, Probe};
    use super::*;
    use crate::lifecycle::GameStage;

    struct NamedHooks {
        journal: Journal,
        name: &'static str,
    }

    impl NamedHooks {
        fn record(&self, hook: &str) {
            self.journal.borrow_mut().push(format!("{}:{hook}", self.name));
        }
    }

    impl GroupHooks for NamedHooks {
        fn on_prepare(&mut self, _sender: Sender) {
            self.record("prepare");
        }
        fn on_start(&mut self, _sender: Sender) {
            self.record("start");
        }
        fn on_destroy(&mut self, _sender: Sender) {
            self.record("destroy");
        }
    }

    #[test]
    fn test_forward_propagation_is_self_then_children() {
        let log = journal();
        let group = ElementGroup::with_hooks(NamedHooks {
            journal: Rc::clone(&log),
            name: "group",
        });
        {
            let mut g = group.borrow_mut();
            g.add_element(Probe::new("a", &log));
            g.add_element(Probe::new("b", &log));
        }
        log.borrow_mut().clear();

        group.borrow_mut().prepare(Sender::Driver);
        assert_eq!(*log.borrow(), vec!["group:prepare", "a:prepare", "b:prepare"]);
    }

    #[test]
    fn test_destroy_runs_children_first() {
        let log = journal();
        let group = ElementGroup::with_hooks(NamedHooks {
            journal: Rc::clone(&log),
            name: "group",
        });
        {
            let mut g = group.borrow_mut();
            g.add_element(Probe::new("a", &log));
            g.add_element(Probe::new("b", &log));
            g.add_element(Probe::new("c", &log));
        }
        log.borrow_mut().clear();

        group.borrow_mut().destroy(Sender::Driver);
        let entries = log.borrow();
        assert_eq!(entries.last().map(String::as_str), Some("group:destroy"));
        assert_eq!(
            entries.iter().filter(|e| e.as_str() == "group:destroy").count(),
            1
        );
        for name in ["a", "b", "c"] {
            assert!(entries.contains(&format!("{name}:destroy")));
        }
    }

    #[test]
    fn test_group_does_not_refire_stages_a_child_already_passed() {
        let log = journal();
        let group = ElementGroup::new();
        let probe = Probe::new("a", &log);
        let handle: ElementRc = probe.clone();
        group.borrow_mut().add_element(probe);
        // Drive the child ahead of the group through a second path.
        handle.borrow_mut().prepare(Sender::Named("side-path"));
        log.borrow_mut().clear();

        group.borrow_mut().prepare(Sender::Driver);
        assert!(
            log.borrow().is_empty(),
            "child at prepare must not observe prepare again"
        );
    }

    #[test]
    fn test_late_joiner_catches_up_to_group_stage() {
        let log = journal();
        let group = ElementGroup::new();
        {
            let mut g = group.borrow_mut();
            g.lifecycle_mut().register(None, None);
            g.prepare(Sender::Driver);
            g.ready(Sender::Driver);
        }

        let probe = Probe::new("late", &log);
        let handle: ElementRc = probe.clone();
        assert!(group.borrow_mut().add_element(probe));
        assert_eq!(handle.borrow().stage(), GameStage::Ready);
        assert_eq!(
            *log.borrow(),
            vec!["late:registered", "late:prepare", "late:ready"]
        );
    }

    #[test]
    fn test_children_get_parent_back_reference() {
        let log = journal();
        let group = ElementGroup::new();
        let probe = Probe::new("a", &log);
        let handle: ElementRc = probe.clone();
        group.borrow_mut().add_element(probe);

        let parent = handle.borrow().lifecycle().parent().expect("parent set");
        let group_handle: ElementRc = group;
        assert!(Rc::ptr_eq(&parent, &group_handle));
    }

    #[test]
    fn test_add_rejects_element_with_a_parent() {
        let log = journal();
        let first = ElementGroup::new();
        let second = ElementGroup::new();
        let probe = Probe::new("a", &log);
        assert!(first.borrow_mut().add_element(Rc::clone(&probe)));
        assert!(!second.borrow_mut().add_element(probe));
        assert_eq!(first.borrow().element_count(), 1);
        assert_eq!(second.borrow().element_count(), 0);
    }

    #[test]
    fn test_remove_unregisters_exactly_once() {
        let log = journal();
        let group = ElementGroup::new();
        let probe = Probe::new("a", &log);
        let handle: ElementRc = probe.clone();
        group.borrow_mut().add_element(probe);

        assert!(group.borrow_mut().remove_element(&handle));
        assert!(!group.borrow_mut().remove_element(&handle));
        let unregistered = log
            .borrow()
            .iter()
            .filter(|e| e.as_str() == "a:unregistered")
            .count();
        assert_eq!(unregistered, 1);
    }
}
