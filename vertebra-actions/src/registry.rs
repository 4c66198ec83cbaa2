//! Action registry with forward references

use crate::action::{Action, ActionBinding, ActionHandler};
use crate::error::ActionError;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use vertebra_core::{ActionsConfig, UnboundPolicy};

/// Pending handler binding: the action a handler will implement once bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboundAction {
    pub action_id: String,
    pub name: String,
}

/// Action registry event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A new identifier was registered with a real action
    ActionRegistered { action_id: String },
    /// An unknown identifier was resolved and reserved by a placeholder
    PlaceholderCreated { action_id: String },
    /// A placeholder received its handler
    PlaceholderResolved { action_id: String, replayed: usize },
}

/// Row of [`ActionRegistry::snapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub action_id: String,
    pub name: String,
    pub bound: bool,
    pub deferred: usize,
}

/// Process-wide action registry.
///
/// Construct once and share by `Arc`. Every identifier maps to exactly one
/// `Arc<Action>` for the lifetime of the registry.
pub struct ActionRegistry {
    actions: Mutex<HashMap<String, Arc<Action>>>,
    unbound_actions: RwLock<HashMap<String, UnboundAction>>,
    unbound_interrupts: RwLock<HashMap<String, String>>,
    event_sender: broadcast::Sender<RegistryEvent>,
    unbound_policy: UnboundPolicy,
    max_deferred_calls: usize,
}

impl ActionRegistry {
    pub fn new(config: &ActionsConfig) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            actions: Mutex::new(HashMap::new()),
            unbound_actions: RwLock::new(HashMap::new()),
            unbound_interrupts: RwLock::new(HashMap::new()),
            event_sender,
            unbound_policy: config.unbound_policy,
            max_deferred_calls: config.max_deferred_calls,
        }
    }

    /// Register an action. An existing handle for the same identifier keeps
    /// its identity and takes over the new name and binding; the returned
    /// handle is the one every caller shares.
    pub fn register(&self, action: Action) -> Arc<Action> {
        let action_id = action.action_id().to_string();

        let mut actions = self.actions.lock();
        let Some(handle) = actions.get(&action_id).cloned() else {
            let handle = Arc::new(action.configured(self.unbound_policy, self.max_deferred_calls));
            actions.insert(action_id.clone(), handle.clone());
            drop(actions);

            info!("Action registered: {} ({})", handle.name(), action_id);
            let _ = self.event_sender.send(RegistryEvent::ActionRegistered { action_id });
            return handle;
        };
        // Rebind outside the map lock; handlers may re-enter the registry.
        drop(actions);

        let was_linked = handle.is_linked();
        let (name, binding) = action.into_parts();
        let resolves = was_linked && matches!(binding, ActionBinding::Bound(_));
        let replayed = handle.rebind(name, binding);

        if resolves {
            info!(
                "Linked action resolved: {} ({} deferred call(s) replayed)",
                action_id, replayed
            );
            let _ = self.event_sender.send(RegistryEvent::PlaceholderResolved {
                action_id,
                replayed,
            });
        } else if was_linked {
            debug!("Linked action '{}' re-registered as linked", action_id);
        } else {
            warn!("Action '{}' overwritten by a new registration", action_id);
        }

        handle
    }

    /// Look up an action, reserving a linked placeholder if the identifier
    /// is unknown. Never fails.
    pub fn resolve(&self, action_id: &str) -> Arc<Action> {
        let placeholder = {
            let mut actions = self.actions.lock();
            if let Some(action) = actions.get(action_id) {
                return action.clone();
            }

            let placeholder = Arc::new(
                Action::linked(action_id).configured(self.unbound_policy, self.max_deferred_calls),
            );
            actions.insert(action_id.to_string(), placeholder.clone());
            placeholder
        };

        debug!("Linked placeholder created for action '{}'", action_id);
        let _ = self.event_sender.send(RegistryEvent::PlaceholderCreated {
            action_id: action_id.to_string(),
        });
        placeholder
    }

    /// Look up an action without reserving the identifier
    pub fn get(&self, action_id: &str) -> Option<Arc<Action>> {
        self.actions.lock().get(action_id).cloned()
    }

    pub fn contains(&self, action_id: &str) -> bool {
        self.actions.lock().contains_key(action_id)
    }

    /// Record that `handler_name` will implement `action_id` once bound
    pub fn register_unbound(&self, handler_name: &str, action_id: &str, name: &str) {
        let mut unbound = self.unbound_actions.write();
        unbound.insert(
            handler_name.to_string(),
            UnboundAction {
                action_id: action_id.to_string(),
                name: name.to_string(),
            },
        );
        debug!("Unbound handler '{}' -> action '{}'", handler_name, action_id);
    }

    /// Record that `interrupt_name` will trigger `action_id` once bound
    pub fn register_unbound_interrupt(&self, interrupt_name: &str, action_id: &str) {
        let mut unbound = self.unbound_interrupts.write();
        unbound.insert(interrupt_name.to_string(), action_id.to_string());
        debug!("Unbound interrupt '{}' -> action '{}'", interrupt_name, action_id);
    }

    pub fn is_unbound(&self, handler_name: &str) -> bool {
        self.unbound_actions.read().contains_key(handler_name)
    }

    pub fn is_unbound_interrupt(&self, interrupt_name: &str) -> bool {
        self.unbound_interrupts.read().contains_key(interrupt_name)
    }

    pub fn get_unbound(&self, handler_name: &str) -> Result<UnboundAction, ActionError> {
        self.unbound_actions
            .read()
            .get(handler_name)
            .cloned()
            .ok_or_else(|| ActionError::NotFound(format!("unbound handler '{}'", handler_name)))
    }

    pub fn get_unbound_interrupt(&self, interrupt_name: &str) -> Result<String, ActionError> {
        self.unbound_interrupts
            .read()
            .get(interrupt_name)
            .cloned()
            .ok_or_else(|| ActionError::NotFound(format!("unbound interrupt '{}'", interrupt_name)))
    }

    /// Supply the handler for a pending binding and register its action
    pub fn bind_unbound(
        &self,
        handler_name: &str,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<Arc<Action>, ActionError> {
        let pending = self
            .unbound_actions
            .write()
            .remove(handler_name)
            .ok_or_else(|| ActionError::NotFound(format!("unbound handler '{}'", handler_name)))?;

        Ok(self.register(Action::new(pending.action_id, pending.name, handler)))
    }

    /// Settle a pending interrupt and hand back the action it triggers
    pub fn bind_unbound_interrupt(&self, interrupt_name: &str) -> Result<Arc<Action>, ActionError> {
        let action_id = self
            .unbound_interrupts
            .write()
            .remove(interrupt_name)
            .ok_or_else(|| ActionError::NotFound(format!("unbound interrupt '{}'", interrupt_name)))?;

        debug!("Interrupt '{}' bound to action '{}'", interrupt_name, action_id);
        Ok(self.resolve(&action_id))
    }

    /// Registered identifiers, sorted
    pub fn action_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.actions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Identifiers still held by placeholders, sorted
    pub fn linked_ids(&self) -> Vec<String> {
        let actions: Vec<Arc<Action>> = self.actions.lock().values().cloned().collect();
        let mut ids: Vec<String> = actions
            .iter()
            .filter(|a| a.is_linked())
            .map(|a| a.action_id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Pending handler bindings, sorted by handler name
    pub fn unbound_handlers(&self) -> Vec<(String, UnboundAction)> {
        let mut pending: Vec<(String, UnboundAction)> = self
            .unbound_actions
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pending.sort_by(|a, b| a.0.cmp(&b.0));
        pending
    }

    /// Pending interrupt bindings, sorted by interrupt name
    pub fn unbound_interrupts(&self) -> Vec<(String, String)> {
        let mut pending: Vec<(String, String)> = self
            .unbound_interrupts
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pending.sort();
        pending
    }

    /// Current state of every action, sorted by identifier
    pub fn snapshot(&self) -> Vec<ActionSummary> {
        let actions: Vec<Arc<Action>> = self.actions.lock().values().cloned().collect();
        let mut rows: Vec<ActionSummary> = actions
            .iter()
            .map(|a| ActionSummary {
                action_id: a.action_id().to_string(),
                name: a.name(),
                bound: a.is_bound(),
                deferred: a.deferred_len(),
            })
            .collect();
        rows.sort_by(|a, b| a.action_id.cmp(&b.action_id));
        rows
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(&ActionsConfig::default())
    }
}
