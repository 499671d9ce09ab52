//! # Game Elements
//!
//! Composable game elements in a hierarchical scene graph, driven through a
//! shared lifecycle.
//!
//! ## Features
//!
//! - **Staged lifecycle**: create → prepare → ready → play → pause/resume →
//!   finish → destroy, with idempotent, replay-safe transitions
//! - **Group propagation**: containers relay every transition to their
//!   children, self first on the way up and children first on destroy
//! - **Late-join catch-up**: an element added mid-lifecycle synchronously
//!   observes every stage its container already completed
//! - **Typed registries**: one instance per concrete type, retrievable by
//!   exact type or by any declared capability
//! - **Broadcast notifications**: interest-masked observers of completed
//!   transitions
//!
//! ## Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use game_elements::prelude::*;
//!
//! struct Scoreboard {
//!     lifecycle: Lifecycle,
//!     points: u32,
//! }
//!
//! impl Castable for Scoreboard {}
//!
//! impl Element for Scoreboard {
//!     fn lifecycle(&self) -> &Lifecycle {
//!         &self.lifecycle
//!     }
//!
//!     fn lifecycle_mut(&mut self) -> &mut Lifecycle {
//!         &mut self.lifecycle
//!     }
//!
//!     fn on_start(&mut self, _sender: Sender) {
//!         self.points = 0;
//!     }
//! }
//!
//! let mut context = SceneContext::new(ContextConfig::default());
//! let scoreboard = Rc::new(RefCell::new(Scoreboard {
//!     lifecycle: Lifecycle::new(),
//!     points: 7,
//! }));
//! assert!(context.add_element(scoreboard));
//!
//! context.prepare(Sender::Driver).unwrap();
//! context.ready(Sender::Driver);
//! context.start(Sender::Driver);
//!
//! assert_eq!(context.stage(), GameStage::Play);
//! let board = context.element::<Scoreboard>().unwrap();
//! assert_eq!(board.borrow().points, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod context;
pub mod element;
pub mod events;
pub mod foundation;
pub mod lifecycle;
pub mod node;
pub mod registry;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ContextConfig},
        context::{GameSystem, SceneContext, SceneError, SceneInitializer, SceneLoader},
        element::{
            catch_up, Container, Element, ElementGroup, ElementLayer, ElementRc, GroupHooks,
            Sender,
        },
        events::{EventMask, GameEvent, GameObserver, ObserverKey},
        lifecycle::{GameStage, Lifecycle},
        node::{Node, NodeLayer, NodeRegistration},
        registry::{Castable, RegistryError, SharedCell, TypeRegistry},
    };
}
