//! Links between components and dashboard sections

use crate::component::Component;
use crate::info::LinkDescriptor;
use crate::naming::camel_case_parameters;
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::{Arc, Weak};
use vertebra_core::{events, Spine};

/// Dashboard id matching every dashboard
pub const ANY_DASHBOARD: &str = "*";

/// Places a component in a dashboard section with its own parameters
pub struct DashboardLink {
    link_id: u64,
    dashboard_id: String,
    section_id: String,
    parameters: RwLock<Map<String, JsonValue>>,
    component_id: String,
    component: Weak<Component>,
    spine: Arc<dyn Spine>,
}

impl DashboardLink {
    pub(crate) fn new(
        dashboard_id: String,
        section_id: String,
        parameters: Map<String, JsonValue>,
        component: &Component,
    ) -> Self {
        Self {
            // Random ids are not collision-checked.
            link_id: rand::random::<u64>(),
            dashboard_id,
            section_id,
            parameters: RwLock::new(parameters),
            component_id: component.component_id().to_string(),
            component: component.downgrade(),
            spine: component.spine().clone(),
        }
    }

    pub fn link_id(&self) -> u64 {
        self.link_id
    }

    pub fn dashboard_id(&self) -> &str {
        &self.dashboard_id
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Owning component, if it is still alive
    pub fn component(&self) -> Option<Arc<Component>> {
        self.component.upgrade()
    }

    pub fn parameters(&self) -> Map<String, JsonValue> {
        self.parameters.read().clone()
    }

    pub fn parameter(&self, name: &str) -> Option<JsonValue> {
        self.parameters.read().get(name).cloned()
    }

    /// Set a parameter and announce the full parameter set. Unlike
    /// [`Component::set_ui_parameter`], any name is accepted.
    pub fn set_parameter(&self, name: &str, value: JsonValue) {
        let snapshot = {
            let mut parameters = self.parameters.write();
            parameters.insert(name.to_string(), value);
            parameters.clone()
        };

        self.spine.trigger_event(
            events::DASHBOARD_LINK_CHANGED,
            vec![JsonValue::from(self.link_id), JsonValue::Object(snapshot)],
        );
    }

    /// True when this link belongs in `section_id` of `dashboard_id`
    pub fn matches(&self, dashboard_id: &str, section_id: &str) -> bool {
        (self.dashboard_id == ANY_DASHBOARD || self.dashboard_id == dashboard_id)
            && self.section_id == section_id
    }

    pub fn descriptor(&self) -> LinkDescriptor {
        LinkDescriptor {
            link_id: self.link_id,
            component_id: self.component_id.clone(),
            parameters: camel_case_parameters(&self.parameters.read()),
        }
    }
}

impl fmt::Debug for DashboardLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardLink")
            .field("link_id", &self.link_id)
            .field("dashboard_id", &self.dashboard_id)
            .field("section_id", &self.section_id)
            .field("component_id", &self.component_id)
            .field("parameters", &*self.parameters.read())
            .finish()
    }
}
