//! The scene context: root of the hierarchy and driver control surface.
//!
//! A [`SceneContext`] owns the root element layer, the node layer, the
//! observer list, and the scene load/initialize sequences. An external
//! driver calls the stage methods on it; each call propagates through the
//! root layer and then broadcasts the matching notification. Roots (elements
//! and nodes) are wired before the first transition.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::config::ContextConfig;
use crate::element::{Element, ElementLayer, ElementRc, Sender};
use crate::events::{EventMask, GameEvent, GameObserver, ObserverKey, ObserverList};
use crate::lifecycle::GameStage;
use crate::node::{Node, NodeLayer};
use crate::registry::{RegistryError, SharedCell};

/// Failure of a scene load or initialize step, surfaced from
/// [`SceneContext::prepare`].
#[derive(Debug, Error)]
pub enum SceneError {
    /// A load step failed.
    #[error("scene load step failed: {0}")]
    Load(String),
    /// An initialize step failed.
    #[error("scene initialization step failed: {0}")]
    Initialize(String),
}

/// An asynchronous-in-spirit load step, run cooperatively during prepare.
///
/// Every registered loader must complete before the context reports itself
/// prepared.
pub trait SceneLoader {
    /// Performs the load step.
    fn load(&mut self, sender: Sender, system: &GameSystem) -> Result<(), SceneError>;
}

/// An initialize step, run after every load step has completed.
pub trait SceneInitializer {
    /// Performs the initialization step.
    fn initialize(&mut self, sender: Sender, system: &GameSystem) -> Result<(), SceneError>;
}

/// Cheaply-cloneable handle to the surrounding system, injected into every
/// element at registration time.
///
/// This is the element's only path to its wider surroundings: typed node
/// lookup for service wiring, and scene-step registration during prepare.
/// Sibling-element lookup is deliberately absent: the element tree is
/// mid-mutation whenever a hook runs, and a path back into it from a hook
/// is a guaranteed borrow panic.
#[derive(Clone)]
pub struct GameSystem {
    nodes: Rc<RefCell<NodeLayer>>,
    loaders: Rc<RefCell<Vec<Box<dyn SceneLoader>>>>,
    initializers: Rc<RefCell<Vec<Box<dyn SceneInitializer>>>>,
}

impl GameSystem {
    fn new(nodes: NodeLayer) -> Self {
        Self {
            nodes: Rc::new(RefCell::new(nodes)),
            loaders: Rc::new(RefCell::new(Vec::new())),
            initializers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The node of exact type `T`, or the first node viewable as `T`.
    pub fn node<T: ?Sized + 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.nodes.borrow().node::<T>()
    }

    /// Non-throwing variant of [`Self::node`].
    pub fn try_node<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        self.nodes.borrow().try_node::<T>()
    }

    /// Every registered node viewable as `T`.
    pub fn nodes<T: ?Sized + 'static>(&self) -> Vec<SharedCell<T>> {
        self.nodes.borrow().nodes::<T>()
    }

    /// Queues a load step; typically called from an `on_prepare` hook.
    pub fn register_loader(&self, loader: Box<dyn SceneLoader>) {
        self.loaders.borrow_mut().push(loader);
    }

    /// Queues an initialize step; typically called from an `on_prepare` hook.
    pub fn register_initializer(&self, initializer: Box<dyn SceneInitializer>) {
        self.initializers.borrow_mut().push(initializer);
    }
}

/// Root of one element hierarchy plus its ambient wiring.
pub struct SceneContext {
    config: ContextConfig,
    root: SharedCell<ElementLayer>,
    system: GameSystem,
    observers: ObserverList,
}

impl SceneContext {
    /// Builds a context from configuration and registers its root layer.
    pub fn new(config: ContextConfig) -> Self {
        let nodes = if config.register_child_nodes {
            NodeLayer::with_child_registration()
        } else {
            NodeLayer::new()
        };
        let system = GameSystem::new(nodes);
        let root = ElementLayer::new();
        {
            let mut layer = root.borrow_mut();
            if layer.lifecycle_mut().register(None, Some(system.clone())) {
                layer.on_registered();
            }
        }
        log::info!("scene context `{}` created", config.name);
        Self {
            config,
            root,
            system,
            observers: ObserverList::new(),
        }
    }

    /// The context configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// A system handle, for wiring collaborators outside the hierarchy.
    pub fn system(&self) -> GameSystem {
        self.system.clone()
    }

    /// Current stage of the root layer.
    pub fn stage(&self) -> GameStage {
        self.root.borrow().stage()
    }

    /// Adds a root element through the root layer's add/catch-up protocol.
    pub fn add_element<T: Element>(&self, element: SharedCell<T>) -> bool {
        self.root.borrow_mut().add_element(element)
    }

    /// Removes a root element by concrete type of the given handle.
    pub fn remove_element(&self, element: &ElementRc) -> bool {
        self.root.borrow_mut().remove_element(element)
    }

    /// The root element of exact type `T`, or the first viewable as `T`.
    pub fn element<T: ?Sized + 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.root.borrow().element::<T>()
    }

    /// Non-throwing variant of [`Self::element`].
    pub fn try_element<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        self.root.borrow().try_element::<T>()
    }

    /// Registers a root node (and, in child-registration mode, everything
    /// nested under it).
    pub fn register_node<T: Node>(&self, node: SharedCell<T>) -> Result<(), RegistryError> {
        self.system.nodes.borrow_mut().register(node)
    }

    /// Removes the node registered under exactly `T`.
    pub fn unregister_node<T: Node>(&self) -> Result<(), RegistryError> {
        self.system.nodes.borrow_mut().unregister::<T>()
    }

    /// Subscribes an observer to the masked notifications.
    pub fn observe(&mut self, interest: EventMask, observer: Box<dyn GameObserver>) -> ObserverKey {
        self.observers.register(interest, observer)
    }

    /// Removes a subscription.
    pub fn unobserve(&mut self, key: ObserverKey) -> bool {
        self.observers.unregister(key)
    }

    /// Drives preparation: propagates the stage through the hierarchy, runs
    /// every queued load step and then every initialize step, and finally
    /// broadcasts [`GameEvent::Prepared`].
    ///
    /// Stage hooks stay idempotent under replay; the notification follows
    /// every driver call.
    pub fn prepare(&mut self, sender: Sender) -> Result<(), SceneError> {
        log::info!("preparing scene `{}`", self.config.name);
        self.root.borrow_mut().prepare(sender);
        self.run_load_sequence(sender)?;
        self.run_initialize_sequence(sender)?;
        self.observers.notify(&GameEvent::Prepared(sender));
        Ok(())
    }

    /// Drives the ready transition and broadcasts [`GameEvent::Ready`].
    pub fn ready(&mut self, sender: Sender) {
        log::info!("scene `{}` ready", self.config.name);
        self.root.borrow_mut().ready(sender);
        self.observers.notify(&GameEvent::Ready(sender));
    }

    /// Drives the start transition and broadcasts [`GameEvent::Started`].
    pub fn start(&mut self, sender: Sender) {
        log::info!("starting scene `{}`", self.config.name);
        self.root.borrow_mut().start(sender);
        self.observers.notify(&GameEvent::Started(sender));
    }

    /// Drives the pause transition and broadcasts [`GameEvent::Paused`].
    pub fn pause(&mut self, sender: Sender) {
        self.root.borrow_mut().pause(sender);
        self.observers.notify(&GameEvent::Paused(sender));
    }

    /// Drives the resume transition and broadcasts [`GameEvent::Resumed`].
    pub fn resume(&mut self, sender: Sender) {
        self.root.borrow_mut().resume(sender);
        self.observers.notify(&GameEvent::Resumed(sender));
    }

    /// Drives the finish transition and broadcasts [`GameEvent::Finished`].
    pub fn finish(&mut self, sender: Sender) {
        log::info!("finishing scene `{}`", self.config.name);
        self.root.borrow_mut().finish(sender);
        self.observers.notify(&GameEvent::Finished(sender));
    }

    /// Drives destruction, children before the root layer's own teardown.
    /// Not broadcast.
    pub fn destroy(&mut self, sender: Sender) {
        log::info!("destroying scene `{}`", self.config.name);
        self.root.borrow_mut().destroy(sender);
    }

    fn run_load_sequence(&mut self, sender: Sender) -> Result<(), SceneError> {
        // Steps are drained before running so a step may queue further steps
        // without re-borrowing the live list.
        let mut steps: Vec<_> = self.system.loaders.borrow_mut().drain(..).collect();
        let mut outcome = Ok(());
        for step in &mut steps {
            if let Err(err) = step.load(sender, &self.system) {
                outcome = Err(err);
                break;
            }
        }
        let mut slot = self.system.loaders.borrow_mut();
        let added: Vec<_> = slot.drain(..).collect();
        *slot = steps;
        slot.extend(added);
        outcome
    }

    fn run_initialize_sequence(&mut self, sender: Sender) -> Result<(), SceneError> {
        let mut steps: Vec<_> = self.system.initializers.borrow_mut().drain(..).collect();
        let mut outcome = Ok(());
        for step in &mut steps {
            if let Err(err) = step.initialize(sender, &self.system) {
                outcome = Err(err);
                break;
            }
        }
        let mut slot = self.system.initializers.borrow_mut();
        let added: Vec<_> = slot.drain(..).collect();
        *slot = steps;
        slot.extend(added);
        outcome
    }
}
