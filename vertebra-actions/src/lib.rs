//! vertebra-actions: action registry for vertebra devices
//!
//! Provides:
//! - Actions that can be referenced before their handler exists
//! - A registry that keeps one shared handle per action identifier
//! - Pending handler and interrupt bindings
//! - Deferred invocation of actions that are not bound yet

pub mod action;
pub mod error;
pub mod registry;

pub use action::{handler_fn, Action, ActionBinding, ActionCall, ActionHandler, ActionOutcome};
pub use error::ActionError;
pub use registry::{ActionRegistry, ActionSummary, RegistryEvent, UnboundAction};
