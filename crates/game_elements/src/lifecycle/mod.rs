//! Staged lifecycle: the shared stage sequence and the per-element state
//! holder that enforces it.
//!
//! Every element moves through the same sequence of stages
//! (create → prepare → ready → play → pause/resume → finish → destroy).
//! [`GameStage`] defines the ordering; [`Lifecycle`] holds one element's
//! position in it and gates every transition so that duplicate or
//! out-of-order calls are silent no-ops rather than errors.

mod machine;
mod stage;

pub use machine::Lifecycle;
pub use stage::{GameStage, ALL_STAGES};
