//! Actions: remotely invokable operations
//!
//! An [`Action`] is always handed out as `Arc<Action>`. Its binding is either
//! a concrete handler or [`ActionBinding::Linked`], a placeholder for a handler
//! that has not been registered yet. Rebinding swaps the variant in place, so
//! every holder of the handle sees the resolution.

use crate::error::ActionError;
use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use vertebra_core::UnboundPolicy;

/// Arguments of one action invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    #[serde(default)]
    pub args: Vec<JsonValue>,
    #[serde(default)]
    pub kwargs: Map<String, JsonValue>,
}

impl ActionCall {
    pub fn new(args: Vec<JsonValue>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }
}

/// Code that runs when a bound action is invoked
pub trait ActionHandler: Send + Sync {
    fn call(&self, call: &ActionCall) -> Result<JsonValue, ActionError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&ActionCall) -> Result<JsonValue, ActionError> + Send + Sync,
{
    fn call(&self, call: &ActionCall) -> Result<JsonValue, ActionError> {
        self(call)
    }
}

/// Wrap a closure as a shareable handler
pub fn handler_fn<F>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(&ActionCall) -> Result<JsonValue, ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Bound handler or pending placeholder
#[derive(Clone)]
pub enum ActionBinding {
    Bound(Arc<dyn ActionHandler>),
    Linked,
}

impl fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionBinding::Bound(_) => f.write_str("Bound"),
            ActionBinding::Linked => f.write_str("Linked"),
        }
    }
}

/// Result of [`Action::execute`]
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The handler ran and returned this value
    Completed(JsonValue),
    /// No handler yet; the call waits in the queue at this depth
    Deferred { queued: usize },
}

struct ActionState {
    name: String,
    binding: ActionBinding,
    deferred: Vec<ActionCall>,
}

/// Remotely invokable action
pub struct Action {
    action_id: String,
    unbound_policy: UnboundPolicy,
    max_deferred_calls: usize,
    state: RwLock<ActionState>,
    /// Held while deferred calls replay; fresh calls wait on it
    replay: ReentrantMutex<()>,
}

impl Action {
    /// Create a bound action
    pub fn new(action_id: impl Into<String>, name: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        Self::with_binding(action_id.into(), name.into(), ActionBinding::Bound(handler))
    }

    /// Create a bound action from a closure
    pub fn from_fn<F>(action_id: impl Into<String>, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ActionCall) -> Result<JsonValue, ActionError> + Send + Sync + 'static,
    {
        Self::new(action_id, name, handler_fn(f))
    }

    /// Create a placeholder for an action referenced before it exists.
    /// Its display name is the identifier until a real action arrives.
    pub fn linked(action_id: impl Into<String>) -> Self {
        let action_id = action_id.into();
        let name = action_id.clone();
        Self::with_binding(action_id, name, ActionBinding::Linked)
    }

    fn with_binding(action_id: String, name: String, binding: ActionBinding) -> Self {
        Self {
            action_id,
            unbound_policy: UnboundPolicy::default(),
            max_deferred_calls: 0,
            state: RwLock::new(ActionState {
                name,
                binding,
                deferred: Vec::new(),
            }),
            replay: ReentrantMutex::new(()),
        }
    }

    /// Apply the registry's policy for calls made while unbound
    pub(crate) fn configured(mut self, unbound_policy: UnboundPolicy, max_deferred_calls: usize) -> Self {
        self.unbound_policy = unbound_policy;
        self.max_deferred_calls = max_deferred_calls;
        self
    }

    pub(crate) fn into_parts(self) -> (String, ActionBinding) {
        let state = self.state.into_inner();
        (state.name, state.binding)
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn binding(&self) -> ActionBinding {
        self.state.read().binding.clone()
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.state.read().binding, ActionBinding::Linked)
    }

    pub fn is_bound(&self) -> bool {
        !self.is_linked()
    }

    /// Calls waiting for a handler
    pub fn deferred_len(&self) -> usize {
        self.state.read().deferred.len()
    }

    /// Invoke the action
    pub fn execute(&self, call: ActionCall) -> Result<ActionOutcome, ActionError> {
        let handler = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            match &state.binding {
                ActionBinding::Bound(handler) => handler.clone(),
                ActionBinding::Linked => {
                    return match self.unbound_policy {
                        UnboundPolicy::Fail => Err(ActionError::Unbound(self.action_id.clone())),
                        UnboundPolicy::Defer => {
                            if state.deferred.len() >= self.max_deferred_calls {
                                return Err(ActionError::DeferredQueueFull {
                                    action_id: self.action_id.clone(),
                                    limit: self.max_deferred_calls,
                                });
                            }
                            state.deferred.push(call);
                            debug!(
                                "Call to unbound action '{}' deferred ({} queued)",
                                self.action_id,
                                state.deferred.len()
                            );
                            Ok(ActionOutcome::Deferred {
                                queued: state.deferred.len(),
                            })
                        }
                    };
                }
            }
        };

        // Queued calls go first. Reentrant so a replayed handler may call
        // this action again.
        drop(self.replay.lock());

        // Handler runs outside the state lock; it may re-enter the registry.
        handler.call(&call).map(ActionOutcome::Completed)
    }

    /// Swap name and binding in place. When the new binding is a handler,
    /// queued calls are replayed in order, ahead of any call made after the
    /// swap; returns how many succeeded.
    pub(crate) fn rebind(&self, name: String, binding: ActionBinding) -> usize {
        let _replay = self.replay.lock();
        let (handler, pending) = {
            let mut state = self.state.write();
            state.name = name;
            state.binding = binding.clone();
            match binding {
                ActionBinding::Bound(handler) => (handler, std::mem::take(&mut state.deferred)),
                ActionBinding::Linked => return 0,
            }
        };

        let mut replayed = 0;
        for call in pending {
            match handler.call(&call) {
                Ok(_) => replayed += 1,
                Err(e) => warn!("Deferred call to '{}' failed on replay: {}", self.action_id, e),
            }
        }
        replayed
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Action")
            .field("action_id", &self.action_id)
            .field("name", &state.name)
            .field("binding", &state.binding)
            .field("deferred", &state.deferred.len())
            .finish()
    }
}
