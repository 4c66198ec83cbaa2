//! Component base: identity, groups, UI parameters and introspection
//!
//! A [`Component`] is created through [`Component::new`], which wires two
//! query handlers into the spine:
//!
//! - `getDashboardComponents(dashboard_id, section_id)` answers with the
//!   component's links placed in that section
//! - `getComponentInfo(component_id?)` answers with a [`ComponentInfo`] when
//!   the caller's session shares a group with the component's user groups
//!
//! Concrete components plug their specifics in through [`ComponentDetails`].

use crate::dashboard::DashboardLink;
use crate::error::ComponentError;
use crate::info::{ComponentInfo, ComponentReference, LinkDescriptor};
use crate::naming::camel_case_parameters;
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use vertebra_core::{
    events, queries, session_authorized, GroupGate, MemorySettingsStore, QueryRequest, Session,
    Settings, SettingsStore, Spine,
};

/// Hooks a concrete component provides
pub trait ComponentDetails: Send + Sync {
    /// UI parameters the component declares, with their initial values
    fn ui_parameters(&self) -> Map<String, JsonValue> {
        Map::new()
    }

    /// Component-specific info merged into introspection answers
    fn info(&self, component: &Component, _request: &QueryRequest) -> Map<String, JsonValue> {
        debug!("abstract info reached: {}", component.component_id());
        Map::new()
    }

    /// Last chance to reshape UI parameters before they are camel-cased
    fn present_ui_parameters(&self, parameters: Map<String, JsonValue>) -> Map<String, JsonValue> {
        parameters
    }
}

/// Details for components that add nothing to the base contract
#[derive(Debug, Clone, Default)]
pub struct PlainDetails;

impl ComponentDetails for PlainDetails {}

/// Optional construction parameters
#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub admin_groups: Vec<String>,
    pub user_groups: Vec<String>,
    /// Store behind the component's settings; a private in-memory store
    /// is used when absent
    pub settings_store: Option<Arc<dyn SettingsStore>>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }
}

struct ComponentState {
    name: String,
    icon: Option<String>,
    visible: bool,
    admin_groups: Vec<String>,
    user_groups: Vec<String>,
    ui_parameters: Map<String, JsonValue>,
}

impl ComponentState {
    /// Every admin group must also be a user group
    fn include_admin_groups(&mut self) {
        for group in &self.admin_groups {
            if !self.user_groups.contains(group) {
                self.user_groups.push(group.clone());
            }
        }
    }
}

/// Device capability exposed to dashboards
pub struct Component {
    component_id: String,
    component_type: String,
    spine: Arc<dyn Spine>,
    settings: Settings,
    details: Arc<dyn ComponentDetails>,
    state: RwLock<ComponentState>,
    dashboard_links: RwLock<Vec<Arc<DashboardLink>>>,
    self_ref: Weak<Component>,
}

impl Component {
    /// Create a component and register its query handlers on `spine`
    pub fn new(
        spine: Arc<dyn Spine>,
        component_id: impl Into<String>,
        component_type: impl Into<String>,
        name: impl Into<String>,
        options: ComponentOptions,
        details: Arc<dyn ComponentDetails>,
    ) -> Arc<Self> {
        let component_id = component_id.into();
        let component_type = component_type.into();
        let store = options
            .settings_store
            .unwrap_or_else(|| Arc::new(MemorySettingsStore::new()));
        let settings = Settings::new(format!("{}_{}", component_type, component_id), store);

        let mut state = ComponentState {
            name: name.into(),
            icon: None,
            visible: true,
            admin_groups: options.admin_groups,
            user_groups: options.user_groups,
            ui_parameters: details.ui_parameters(),
        };
        state.include_admin_groups();

        let component = Arc::new_cyclic(|self_ref| Self {
            component_id,
            component_type,
            spine,
            settings,
            details,
            state: RwLock::new(state),
            dashboard_links: RwLock::new(Vec::new()),
            self_ref: self_ref.clone(),
        });

        debug!("component created: {}", component.component_id);
        component.register_query_handlers();
        component
    }

    /// Both handlers sit behind a gate that reads the current user groups,
    /// so group setters take effect on the spine immediately.
    fn register_query_handlers(&self) {
        let this = self.self_ref.clone();
        self.spine.register_query_handler(
            queries::GET_DASHBOARD_COMPONENTS,
            Arc::new(move |request: &QueryRequest| -> Option<JsonValue> {
                let component = this.upgrade()?;
                let dashboard_id = request.arg_str(0)?;
                let section_id = request.arg_str(1)?;
                let links = component.dashboard_components(dashboard_id, section_id);
                Some(JsonValue::Array(links.into_iter().map(JsonValue::from).collect()))
            }),
            self.user_group_gate(),
        );

        let this = self.self_ref.clone();
        self.spine.register_query_handler(
            queries::GET_COMPONENT_INFO,
            Arc::new(move |request: &QueryRequest| -> Option<JsonValue> {
                let component = this.upgrade()?;
                component.component_info(request).map(JsonValue::from)
            }),
            self.user_group_gate(),
        );
    }

    fn user_group_gate(&self) -> GroupGate {
        let this = self.self_ref.clone();
        GroupGate::live(move || {
            this.upgrade()
                .map(|component| component.user_groups())
                .unwrap_or_default()
        })
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn spine(&self) -> &Arc<dyn Spine> {
        &self.spine
    }

    /// Settings scoped to `{component_type}_{component_id}`
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn downgrade(&self) -> Weak<Component> {
        self.self_ref.clone()
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.write().name = name.clone();
        self.spine.trigger_event(
            events::COMPONENT_CHANGE_NAME,
            vec![JsonValue::String(self.component_id.clone()), JsonValue::String(name)],
        );
    }

    pub fn icon(&self) -> Option<String> {
        self.state.read().icon.clone()
    }

    pub fn set_icon(&self, icon: Option<String>) {
        self.state.write().icon = icon.clone();
        self.spine.trigger_event(
            events::COMPONENT_CHANGE_ICON,
            vec![
                JsonValue::String(self.component_id.clone()),
                icon.map(JsonValue::String).unwrap_or(JsonValue::Null),
            ],
        );
    }

    pub fn visible(&self) -> bool {
        self.state.read().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.write().visible = visible;
    }

    pub fn user_groups(&self) -> Vec<String> {
        self.state.read().user_groups.clone()
    }

    /// Replace the user groups; admin groups are added back
    pub fn set_user_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        state.user_groups = groups.into_iter().map(Into::into).collect();
        state.include_admin_groups();
    }

    pub fn admin_groups(&self) -> Vec<String> {
        self.state.read().admin_groups.clone()
    }

    /// Replace the admin groups; each one also becomes a user group
    pub fn set_admin_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        state.admin_groups = groups.into_iter().map(Into::into).collect();
        state.include_admin_groups();
    }

    /// User groups in order followed by admin groups not already listed
    pub fn ui_groups(&self) -> Vec<String> {
        let state = self.state.read();
        let mut groups: Vec<String> = Vec::with_capacity(state.user_groups.len() + state.admin_groups.len());
        for group in state.user_groups.iter().chain(state.admin_groups.iter()) {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        groups
    }

    pub fn ui_parameters(&self) -> Map<String, JsonValue> {
        self.state.read().ui_parameters.clone()
    }

    /// Declare a UI parameter after construction, or reset its value
    pub fn declare_ui_parameter(&self, name: &str, default: JsonValue) {
        self.state.write().ui_parameters.insert(name.to_string(), default);
    }

    /// Change a declared UI parameter
    pub fn set_ui_parameter(&self, name: &str, value: JsonValue) -> Result<(), ComponentError> {
        let mut state = self.state.write();
        match state.ui_parameters.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.invalid_parameter(name)),
        }
    }

    /// Place the component in a dashboard section.
    ///
    /// The link starts from the declared UI parameters, `overrides` may only
    /// change declared names, and `link_to_header`/`icon` default to
    /// `false`/`null` when not declared.
    pub fn link_to_dashboard(
        &self,
        dashboard_id: &str,
        section_id: &str,
        overrides: Map<String, JsonValue>,
    ) -> Result<Arc<DashboardLink>, ComponentError> {
        let mut parameters = self.ui_parameters();

        for (key, value) in overrides {
            match parameters.get_mut(&key) {
                Some(slot) => *slot = value,
                None => return Err(self.invalid_parameter(&key)),
            }
        }

        parameters
            .entry("link_to_header")
            .or_insert(JsonValue::Bool(false));
        parameters.entry("icon").or_insert(JsonValue::Null);

        let link = Arc::new(DashboardLink::new(
            dashboard_id.to_string(),
            section_id.to_string(),
            parameters,
            self,
        ));
        self.dashboard_links.write().push(link.clone());

        debug!(
            "component '{}' linked to {}/{} (link {})",
            self.component_id,
            dashboard_id,
            section_id,
            link.link_id()
        );
        Ok(link)
    }

    pub fn dashboard_links(&self) -> Vec<Arc<DashboardLink>> {
        self.dashboard_links.read().clone()
    }

    pub fn get_reference(&self) -> ComponentReference {
        ComponentReference {
            id: self.component_id.clone(),
            component_type: self.component_type.clone(),
        }
    }

    /// Links shown in `section_id` of `dashboard_id`
    pub fn dashboard_components(&self, dashboard_id: &str, section_id: &str) -> Vec<LinkDescriptor> {
        self.dashboard_links
            .read()
            .iter()
            .filter(|link| link.matches(dashboard_id, section_id))
            .map(|link| link.descriptor())
            .collect()
    }

    /// Introspection answer for `request`.
    ///
    /// `None` when the request targets another component or when the
    /// session shares no group with a non-empty user group list. Denial is
    /// silent so callers cannot tell hidden components from absent ones.
    pub fn component_info(&self, request: &QueryRequest) -> Option<ComponentInfo> {
        let target = request
            .arg_str(0)
            .or_else(|| request.kwargs.get("component_id").and_then(|v| v.as_str()));
        if let Some(target) = target {
            if target != self.component_id {
                return None;
            }
        }

        if !self.is_authorized(request.session.as_ref()) {
            return None;
        }

        // Subtype hook runs before the state lock is taken.
        let extensions = self.details.info(self, request);

        let (name, visible, ui_parameters) = {
            let state = self.state.read();
            (state.name.clone(), state.visible, state.ui_parameters.clone())
        };
        let ui = camel_case_parameters(&self.details.present_ui_parameters(ui_parameters));

        Some(ComponentInfo::new(
            self.component_type.clone(),
            self.component_id.clone(),
            visible,
            name,
            ui,
            extensions,
        ))
    }

    /// Whether `session` may see this component
    pub fn is_authorized(&self, session: Option<&Session>) -> bool {
        session_authorized(session, &self.state.read().user_groups)
    }

    fn invalid_parameter(&self, name: &str) -> ComponentError {
        ComponentError::InvalidParameter {
            component_id: self.component_id.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Component")
            .field("component_id", &self.component_id)
            .field("component_type", &self.component_type)
            .field("name", &state.name)
            .field("visible", &state.visible)
            .field("user_groups", &state.user_groups)
            .field("admin_groups", &state.admin_groups)
            .finish()
    }
}
