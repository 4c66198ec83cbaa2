//! Spine: the event/query bus components talk to
//!
//! The [`Spine`] trait is the capability components consume. Delivery across
//! processes is left to whoever implements it; [`LocalSpine`] keeps everything
//! in-process and is what tests and the CLI run against.

use crate::config::SpineConfig;
use crate::session::{session_authorized, Session};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Query names answered by components
pub mod queries {
    pub const GET_DASHBOARD_COMPONENTS: &str = "getDashboardComponents";
    pub const GET_COMPONENT_INFO: &str = "getComponentInfo";
}

/// Event names published by components and dashboard links
pub mod events {
    pub const COMPONENT_CHANGE_NAME: &str = "componentChangeName";
    pub const COMPONENT_CHANGE_ICON: &str = "componentChangeIcon";
    pub const DASHBOARD_LINK_CHANGED: &str = "dashboardLinkChanged";
}

/// A query as seen by a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Positional arguments
    #[serde(default)]
    pub args: Vec<JsonValue>,
    /// Keyword arguments
    #[serde(default)]
    pub kwargs: Map<String, JsonValue>,
    /// Caller session, `None` for in-process callers
    #[serde(default)]
    pub session: Option<Session>,
}

impl QueryRequest {
    pub fn new(args: Vec<JsonValue>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
            session: None,
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Positional argument `index` as a string, if present and a string
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|v| v.as_str())
    }
}

/// Handler answering a named query. `None` means "no answer from me".
pub type QueryHandler = Arc<dyn Fn(&QueryRequest) -> Option<JsonValue> + Send + Sync>;

/// Event as delivered to spine subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineEvent {
    pub name: String,
    pub args: Vec<JsonValue>,
}

/// Coarse group restriction on a query handler. Sessions sharing none of
/// the gate's groups never reach the handler; an empty list is open.
#[derive(Clone)]
pub enum GroupGate {
    /// Groups fixed at registration
    Fixed(Vec<String>),
    /// Groups read again on every query
    Live(Arc<dyn Fn() -> Vec<String> + Send + Sync>),
}

impl GroupGate {
    pub fn open() -> Self {
        GroupGate::Fixed(Vec::new())
    }

    pub fn live<F>(groups: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        GroupGate::Live(Arc::new(groups))
    }

    /// Groups currently required
    pub fn groups(&self) -> Vec<String> {
        match self {
            GroupGate::Fixed(groups) => groups.clone(),
            GroupGate::Live(groups) => groups(),
        }
    }

    pub fn admits(&self, session: Option<&Session>) -> bool {
        match (self, session) {
            (_, None) => true,
            (GroupGate::Fixed(groups), session) => session_authorized(session, groups),
            (GroupGate::Live(groups), session) => session_authorized(session, &groups()),
        }
    }
}

impl From<Vec<String>> for GroupGate {
    fn from(groups: Vec<String>) -> Self {
        GroupGate::Fixed(groups)
    }
}

impl From<&[String]> for GroupGate {
    fn from(groups: &[String]) -> Self {
        GroupGate::Fixed(groups.to_vec())
    }
}

impl fmt::Debug for GroupGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupGate::Fixed(groups) => f.debug_tuple("Fixed").field(groups).finish(),
            GroupGate::Live(_) => f.write_str("Live"),
        }
    }
}

/// Publish/subscribe plus query/response capability
pub trait Spine: Send + Sync {
    /// Register `handler` for `query` behind `gate`
    fn register_query_handler(&self, query: &str, handler: QueryHandler, gate: GroupGate);

    /// Fire-and-forget notification
    fn trigger_event(&self, event: &str, args: Vec<JsonValue>);
}

#[derive(Clone)]
struct Registration {
    handler: QueryHandler,
    gate: GroupGate,
}

/// In-process spine
pub struct LocalSpine {
    handlers: RwLock<HashMap<String, Vec<Registration>>>,
    event_sender: broadcast::Sender<SpineEvent>,
}

impl LocalSpine {
    pub fn new(config: &SpineConfig) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            handlers: RwLock::new(HashMap::new()),
            event_sender,
        }
    }

    /// Run every admitted handler for `query` and collect their answers
    pub fn send_query(&self, query: &str, request: &QueryRequest) -> Vec<JsonValue> {
        // Clone out so gates and handlers can re-enter the spine.
        let registrations: Vec<Registration> = self
            .handlers
            .read()
            .get(query)
            .cloned()
            .unwrap_or_default();

        let admitted: Vec<QueryHandler> = registrations
            .into_iter()
            .filter(|r| r.gate.admits(request.session.as_ref()))
            .map(|r| r.handler)
            .collect();

        trace!("Query '{}' reaches {} handler(s)", query, admitted.len());

        admitted
            .iter()
            .filter_map(|handler| handler(request))
            .collect()
    }

    /// Subscribe to events triggered from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SpineEvent> {
        self.event_sender.subscribe()
    }

    /// Number of handlers registered for `query`
    pub fn handler_count(&self, query: &str) -> usize {
        self.handlers.read().get(query).map(Vec::len).unwrap_or(0)
    }
}

impl Default for LocalSpine {
    fn default() -> Self {
        Self::new(&SpineConfig::default())
    }
}

impl Spine for LocalSpine {
    fn register_query_handler(&self, query: &str, handler: QueryHandler, gate: GroupGate) {
        debug!("Query handler registered: {} (gate: {:?})", query, gate);
        let mut handlers = self.handlers.write();
        handlers
            .entry(query.to_string())
            .or_insert_with(Vec::new)
            .push(Registration { handler, gate });
    }

    fn trigger_event(&self, event: &str, args: Vec<JsonValue>) {
        // No subscribers is fine.
        let _ = self.event_sender.send(SpineEvent {
            name: event.to_string(),
            args,
        });
    }
}
