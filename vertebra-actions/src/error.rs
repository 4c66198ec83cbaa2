//! Error types for vertebra-actions

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Action '{0}' has no handler bound")]
    Unbound(String),

    #[error("Action '{action_id}' already has {limit} deferred calls queued")]
    DeferredQueueFull { action_id: String, limit: usize },

    #[error("Handler error: {0}")]
    Handler(String),
}
