//! Typed child storage: containers indexed by concrete element type.

use std::any;
use std::rc::Rc;

use crate::registry::{RegistryError, SharedCell, TypeRegistry};

use super::{concrete_type_id, Container, Element, ElementRc, ElementStore, GroupHooks};

/// Typed child storage: at most one child per concrete element type, with
/// lookup by exact type or declared capability in addition to propagation.
#[derive(Default)]
pub struct TypedChildren {
    pub(crate) registry: TypeRegistry<ElementRc>,
}

impl ElementStore for TypedChildren {
    fn snapshot(&self) -> Vec<ElementRc> {
        self.registry.handles().map(Rc::clone).collect()
    }

    fn len(&self) -> usize {
        self.registry.len()
    }
}

/// A container whose children are indexed by concrete type.
pub type ElementLayer<H = ()> = Container<TypedChildren, H>;

impl<H: GroupHooks> Container<TypedChildren, H> {
    /// Stores a child under its concrete type and runs the
    /// registration/catch-up protocol.
    ///
    /// Fails when a child of the same concrete type is already present, or
    /// when the element already belongs to a container. On success the child
    /// observes, synchronously and in order, every stage hook this layer has
    /// already completed.
    pub fn add_element<T: Element>(&mut self, element: SharedCell<T>) -> bool {
        if element.borrow().lifecycle().is_registered() {
            log::debug!(
                "rejected {}: element already has a parent",
                any::type_name::<T>()
            );
            return false;
        }
        let handle: ElementRc = element.clone();
        if !self.children.registry.insert(&element, Rc::clone(&handle)) {
            log::debug!("rejected {}: type already present", any::type_name::<T>());
            return false;
        }
        log::debug!("registered element {}", any::type_name::<T>());
        self.register_child(&handle);
        true
    }

    /// Removes the child stored under the element's concrete type and fires
    /// its unregister hook.
    ///
    /// Fails when no child of that type is present. Does not drive
    /// finish/destroy.
    pub fn remove_element(&mut self, element: &ElementRc) -> bool {
        let key = concrete_type_id(element);
        if let Some(stored) = self.children.registry.remove(key) {
            Self::unregister_child(&stored);
            true
        } else {
            false
        }
    }

    /// The child of exact type `T`, or the first child viewable as `T`.
    pub fn element<T: ?Sized + 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.children.registry.find::<T>()
    }

    /// Non-throwing variant of [`Self::element`].
    pub fn try_element<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        self.children.registry.try_find::<T>()
    }

    /// The child stored under exactly `T`, never by capability.
    pub fn element_exact<T: 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.children.registry.get_exact::<T>()
    }
}
