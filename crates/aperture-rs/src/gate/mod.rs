//! Phase-gated action visibility.
//!
//! An agent moves through a fixed workflow ([`Phase`]), and each phase
//! exposes a different slice of the action catalogue. The [`PhaseGate`]
//! enforces the transition table and answers "what may the model call right
//! now?"; the [`ActionCatalog`] is the configuration behind that answer.

pub mod catalog;
pub mod machine;

// Re-export commonly used items at the module level.
pub use catalog::{ActionCatalog, ActionGroup};
pub use machine::{Phase, PhaseGate};
