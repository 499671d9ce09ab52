//! Nodes: the lifecycle-inert service hierarchy.
//!
//! Nodes are wired statically and looked up, never advanced through stages.
//! A [`NodeLayer`] stores at most one node per concrete type and resolves
//! typed lookups exactly like the element registry, including capability
//! views. It is the service-locator surface elements reach through their
//! [`GameSystem`](crate::context::GameSystem) handle.

use std::any::{self, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use crate::registry::{entry_cast, CastFn, Castable, RegistryError, SharedCell, TypeRegistry};

/// Erased shared handle to a node.
pub type NodeRc = Rc<RefCell<dyn Node>>;

/// A participant in the node hierarchy.
///
/// Nodes have no stage hooks. A node that nests other nodes under it exposes
/// them through [`Node::child_registrations`] so a layer running in
/// auto-register mode can discover them.
pub trait Node: Castable {
    /// Nodes nested directly under this one.
    fn child_registrations(&self) -> Vec<NodeRegistration> {
        Vec::new()
    }
}

/// A node captured together with its concrete-type key and cast closure,
/// ready to enter a layer through the normal insert path even after its
/// concrete type has been erased.
pub struct NodeRegistration {
    key: TypeId,
    type_name: &'static str,
    handle: NodeRc,
    cast: CastFn,
}

impl NodeRegistration {
    /// Captures a concrete node for later registration.
    pub fn of<T: Node>(node: SharedCell<T>) -> Self {
        let cast = entry_cast(&node);
        let handle: NodeRc = node;
        Self {
            key: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            handle,
            cast,
        }
    }

    /// The erased node handle.
    pub fn handle(&self) -> &NodeRc {
        &self.handle
    }
}

/// Typed registry over the node hierarchy.
///
/// Registration is keyed by concrete type and duplicates are errors, unlike
/// the boolean element-layer contract: node wiring is static, so a collision
/// is a setup bug worth surfacing. With child registration enabled (decided
/// once, at construction), registering a node also discovers and registers
/// every node nested under it; nodes attached to a subtree later are not
/// discovered retroactively.
pub struct NodeLayer {
    registry: TypeRegistry<NodeRc>,
    register_children: bool,
}

impl NodeLayer {
    /// Layer that registers only what it is handed directly.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            register_children: false,
        }
    }

    /// Layer that also adopts the descendants of every registered node.
    pub fn with_child_registration() -> Self {
        Self {
            registry: TypeRegistry::new(),
            register_children: true,
        }
    }

    /// Whether descendant discovery is enabled.
    pub fn register_children_enabled(&self) -> bool {
        self.register_children
    }

    /// Registers a node under its concrete type.
    pub fn register<T: Node>(&mut self, node: SharedCell<T>) -> Result<(), RegistryError> {
        let handle: NodeRc = node.clone();
        if !self.registry.insert(&node, Rc::clone(&handle)) {
            return Err(RegistryError::duplicate::<T>());
        }
        log::debug!("registered node {}", any::type_name::<T>());
        if self.register_children {
            self.adopt_descendants(&handle)?;
        }
        Ok(())
    }

    /// Removes the node registered under exactly `T`.
    pub fn unregister<T: Node>(&mut self) -> Result<(), RegistryError> {
        if self.registry.remove(TypeId::of::<T>()).is_some() {
            Ok(())
        } else {
            Err(RegistryError::not_found::<T>())
        }
    }

    /// The node of exact type `T`, or the first node viewable as `T`.
    pub fn node<T: ?Sized + 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.registry.find::<T>()
    }

    /// Non-throwing variant of [`Self::node`].
    pub fn try_node<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        self.registry.try_find::<T>()
    }

    /// Every registered node viewable as `T`, in unspecified order.
    pub fn nodes<T: ?Sized + 'static>(&self) -> Vec<SharedCell<T>> {
        self.registry.find_all::<T>()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn adopt_descendants(&mut self, node: &NodeRc) -> Result<(), RegistryError> {
        for registration in node.borrow().child_registrations() {
            let child = Rc::clone(registration.handle());
            self.adopt(registration)?;
            self.adopt_descendants(&child)?;
        }
        Ok(())
    }

    fn adopt(&mut self, registration: NodeRegistration) -> Result<(), RegistryError> {
        let NodeRegistration {
            key,
            type_name,
            handle,
            cast,
        } = registration;
        if !self.registry.insert_raw(key, type_name, handle, cast) {
            return Err(RegistryError::Duplicate { type_name });
        }
        log::debug!("registered node {type_name}");
        Ok(())
    }
}

impl Default for NodeLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;

    trait Clock {
        fn now(&self) -> u64;
    }

    struct SteadyClock {
        ticks: u64,
    }

    impl Clock for SteadyClock {
        fn now(&self) -> u64 {
            self.ticks
        }
    }

    impl Castable for SteadyClock {
        fn cast(cell: &SharedCell<Self>, target: TypeId) -> Option<Box<dyn Any>> {
            if target == TypeId::of::<dyn Clock>() {
                let view: Rc<RefCell<dyn Clock>> = cell.clone();
                return Some(Box::new(view));
            }
            None
        }
    }

    impl Node for SteadyClock {}

    struct AudioHub {
        channels: Vec<SharedCell<AudioChannel>>,
    }

    struct AudioChannel {
        id: u8,
    }

    impl Castable for AudioHub {}
    impl Castable for AudioChannel {}

    impl Node for AudioHub {
        fn child_registrations(&self) -> Vec<NodeRegistration> {
            self.channels
                .iter()
                .map(|channel| NodeRegistration::of(Rc::clone(channel)))
                .collect()
        }
    }

    impl Node for AudioChannel {}

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut layer = NodeLayer::new();
        layer
            .register(Rc::new(RefCell::new(SteadyClock { ticks: 1 })))
            .unwrap();
        let err = layer
            .register(Rc::new(RefCell::new(SteadyClock { ticks: 2 })))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_lookup_by_exact_type_and_capability() {
        let mut layer = NodeLayer::new();
        layer
            .register(Rc::new(RefCell::new(SteadyClock { ticks: 42 })))
            .unwrap();

        assert_eq!(layer.node::<SteadyClock>().unwrap().borrow().ticks, 42);
        assert_eq!(layer.node::<dyn Clock>().unwrap().borrow().now(), 42);
        assert!(layer.try_node::<dyn Clock>().is_some());
    }

    #[test]
    fn test_unregister_by_type() {
        let mut layer = NodeLayer::new();
        layer
            .register(Rc::new(RefCell::new(SteadyClock { ticks: 1 })))
            .unwrap();
        assert!(layer.unregister::<SteadyClock>().is_ok());
        assert!(matches!(
            layer.unregister::<SteadyClock>(),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_child_registration_mode_discovers_descendants() {
        let mut layer = NodeLayer::with_child_registration();
        let hub = AudioHub {
            channels: vec![Rc::new(RefCell::new(AudioChannel { id: 7 }))],
        };
        layer.register(Rc::new(RefCell::new(hub))).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.node::<AudioChannel>().unwrap().borrow().id, 7);
    }

    #[test]
    fn test_children_ignored_without_the_mode() {
        let mut layer = NodeLayer::new();
        let hub = AudioHub {
            channels: vec![Rc::new(RefCell::new(AudioChannel { id: 7 }))],
        };
        layer.register(Rc::new(RefCell::new(hub))).unwrap();

        assert_eq!(layer.len(), 1);
        assert!(layer.try_node::<AudioChannel>().is_none());
    }
}
