//! vertebra-core: shared plumbing for vertebra devices
//!
//! Provides:
//! - The spine capability (event/query bus) and an in-process implementation
//! - Caller sessions and group-membership authorization
//! - Scoped settings handles
//! - Configuration loading and validation

pub mod config;
pub mod error;
pub mod session;
pub mod settings;
pub mod spine;

pub use config::{ActionsConfig, LoggingConfig, SpineConfig, UnboundPolicy, VertebraConfig};
pub use error::ConfigError;
pub use session::{authorized, session_authorized, Session};
pub use settings::{MemorySettingsStore, Settings, SettingsStore};
pub use spine::{events, queries, GroupGate, LocalSpine, QueryHandler, QueryRequest, Spine, SpineEvent};
