//! Exact-type keyed storage with polymorphic lookup.
//!
//! A [`TypeRegistry`] maps the concrete type of a stored value to exactly one
//! instance. Lookup works either by the exact concrete type or by any
//! capability the instance has declared through [`Castable::cast`], which
//! stands in for "retrieve by base type" without runtime reflection.
//! When several stored types expose the same capability the scan order is
//! unspecified and the first match wins.

use std::any::{self, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

/// Shared single-threaded handle to a value in the hierarchy.
pub type SharedCell<T> = Rc<RefCell<T>>;

/// Per-entry cast closure: produces a typed view for a requested type id.
pub(crate) type CastFn = Box<dyn Fn(TypeId) -> Option<Box<dyn Any>>>;

/// Registry failures, reported either as faults (`get`/`find`) or folded into
/// boolean/`Option` outcomes by the non-throwing variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An entry of the exact concrete type is already stored.
    #[error("value already exists: {type_name}")]
    Duplicate {
        /// Concrete type of the rejected value.
        type_name: &'static str,
    },
    /// No entry matches the requested type, exactly or by capability.
    #[error("value is not found: {type_name}")]
    NotFound {
        /// The requested type.
        type_name: &'static str,
    },
}

impl RegistryError {
    pub(crate) fn duplicate<T: ?Sized>() -> Self {
        RegistryError::Duplicate {
            type_name: any::type_name::<T>(),
        }
    }

    pub(crate) fn not_found<T: ?Sized>() -> Self {
        RegistryError::NotFound {
            type_name: any::type_name::<T>(),
        }
    }
}

/// Declares the capability views a storable type exposes.
///
/// The default declares none: the value is then retrievable only by its
/// exact concrete type. A type that should also be found through one of its
/// traits overrides [`Castable::cast`] and hands out a coerced handle per
/// capability:
///
/// ```
/// use std::any::{Any, TypeId};
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use game_elements::registry::{Castable, SharedCell};
///
/// trait Scoreboard {
///     fn points(&self) -> u32;
/// }
///
/// struct Hud {
///     points: u32,
/// }
///
/// impl Scoreboard for Hud {
///     fn points(&self) -> u32 {
///         self.points
///     }
/// }
///
/// impl Castable for Hud {
///     fn cast(cell: &SharedCell<Self>, target: TypeId) -> Option<Box<dyn Any>> {
///         if target == TypeId::of::<dyn Scoreboard>() {
///             let view: Rc<RefCell<dyn Scoreboard>> = cell.clone();
///             return Some(Box::new(view));
///         }
///         None
///     }
/// }
/// ```
pub trait Castable: Any {
    /// Returns a `Rc<RefCell<dyn Capability>>` boxed as `Any` when `target`
    /// names a declared capability of this type, `None` otherwise.
    fn cast(cell: &SharedCell<Self>, target: TypeId) -> Option<Box<dyn Any>>
    where
        Self: Sized,
    {
        let _ = (cell, target);
        None
    }
}

struct Entry<H> {
    handle: H,
    cast: CastFn,
    type_name: &'static str,
}

/// Maps a concrete type to exactly one instance.
///
/// `H` is the erased handle the owning container iterates over (for example
/// `Rc<RefCell<dyn Element>>`); typed lookup goes through the per-entry cast
/// closures instead.
pub struct TypeRegistry<H> {
    entries: HashMap<TypeId, Entry<H>>,
}

impl<H: Clone> TypeRegistry<H> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts a value keyed by its concrete type.
    ///
    /// `handle` is the caller's erased view of the same cell. Returns `false`
    /// and leaves the existing entry untouched when the exact type is already
    /// present; deduplication never considers capability overlap.
    pub fn insert<T: Castable>(&mut self, cell: &SharedCell<T>, handle: H) -> bool {
        let key = TypeId::of::<T>();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            Entry {
                handle,
                cast: entry_cast(cell),
                type_name: any::type_name::<T>(),
            },
        );
        true
    }

    /// Inserts a pre-erased entry. Used by layers that adopt values whose
    /// concrete type was erased at discovery time.
    pub(crate) fn insert_raw(
        &mut self,
        key: TypeId,
        type_name: &'static str,
        handle: H,
        cast: CastFn,
    ) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            Entry {
                handle,
                cast,
                type_name,
            },
        );
        true
    }

    /// Removes the entry stored under `key`, returning its handle.
    pub fn remove(&mut self, key: TypeId) -> Option<H> {
        let entry = self.entries.remove(&key)?;
        log::debug!("removed {} from registry", entry.type_name);
        Some(entry.handle)
    }

    /// Whether an entry of exactly this concrete type is stored.
    pub fn contains(&self, key: TypeId) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Erased handles of all entries, in unspecified order.
    pub fn handles(&self) -> impl Iterator<Item = &H> {
        self.entries.values().map(|entry| &entry.handle)
    }

    /// The entry stored under exactly `T`, never by capability.
    pub fn get_exact<T: 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        let target = TypeId::of::<T>();
        self.entries
            .get(&target)
            .and_then(|entry| typed_view::<T>(entry, target))
            .ok_or_else(RegistryError::not_found::<T>)
    }

    /// The entry stored under exactly `T`, or the first entry viewable as
    /// `T` (`T` may be a `dyn Capability` object type). Scan order is
    /// unspecified; register capability-overlapping types only when any match
    /// is acceptable.
    pub fn find<T: ?Sized + 'static>(&self) -> Result<SharedCell<T>, RegistryError> {
        self.lookup::<T>().ok_or_else(RegistryError::not_found::<T>)
    }

    /// Non-throwing variant of [`Self::find`].
    pub fn try_find<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        self.lookup::<T>()
    }

    /// Every stored entry viewable as `T`, in unspecified order.
    pub fn find_all<T: ?Sized + 'static>(&self) -> Vec<SharedCell<T>> {
        let target = TypeId::of::<T>();
        self.entries
            .values()
            .filter_map(|entry| typed_view::<T>(entry, target))
            .collect()
    }

    fn lookup<T: ?Sized + 'static>(&self) -> Option<SharedCell<T>> {
        let target = TypeId::of::<T>();
        if let Some(entry) = self.entries.get(&target) {
            if let Some(cell) = typed_view::<T>(entry, target) {
                return Some(cell);
            }
        }
        self.entries
            .values()
            .find_map(|entry| typed_view::<T>(entry, target))
    }
}

impl<H: Clone> Default for TypeRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn typed_view<T: ?Sized + 'static>(entry: &Entry<impl Clone>, target: TypeId) -> Option<SharedCell<T>> {
    let view = (entry.cast)(target)?;
    view.downcast::<SharedCell<T>>().ok().map(|cell| *cell)
}

/// Builds the cast closure for a concrete entry: the identity view plus
/// whatever capabilities the type declares.
pub(crate) fn entry_cast<T: Castable>(cell: &SharedCell<T>) -> CastFn {
    let cell = Rc::clone(cell);
    Box::new(move |target: TypeId| {
        if target == TypeId::of::<T>() {
            return Some(Box::new(Rc::clone(&cell)));
        }
        T::cast(&cell, target)
    })
}
