//! Wire records sent to dashboards

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// Keys owned by [`ComponentInfo`]; extensions may not shadow them
pub const RESERVED_INFO_KEYS: [&str; 5] = ["componentType", "id", "visible", "name", "ui"];

/// Answer to a `getComponentInfo` query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub component_type: String,
    pub id: String,
    pub visible: bool,
    pub name: String,
    /// UI parameters, keys already camel-cased
    pub ui: Map<String, JsonValue>,
    /// Component-specific keys
    #[serde(flatten)]
    pub extensions: Map<String, JsonValue>,
}

impl ComponentInfo {
    pub fn new(
        component_type: String,
        id: String,
        visible: bool,
        name: String,
        ui: Map<String, JsonValue>,
        mut extensions: Map<String, JsonValue>,
    ) -> Self {
        for key in RESERVED_INFO_KEYS {
            extensions.remove(key);
        }

        Self {
            component_type,
            id,
            visible,
            name,
            ui,
            extensions,
        }
    }
}

impl From<ComponentInfo> for JsonValue {
    fn from(info: ComponentInfo) -> Self {
        let mut map = info.extensions;
        map.insert("componentType".to_string(), JsonValue::String(info.component_type));
        map.insert("id".to_string(), JsonValue::String(info.id));
        map.insert("visible".to_string(), JsonValue::Bool(info.visible));
        map.insert("name".to_string(), JsonValue::String(info.name));
        map.insert("ui".to_string(), JsonValue::Object(info.ui));
        JsonValue::Object(map)
    }
}

/// One dashboard link in a `getDashboardComponents` answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
    pub link_id: u64,
    pub component_id: String,
    /// Link parameters, keys already camel-cased
    pub parameters: Map<String, JsonValue>,
}

impl From<LinkDescriptor> for JsonValue {
    fn from(link: LinkDescriptor) -> Self {
        json!({
            "linkId": link.link_id,
            "componentId": link.component_id,
            "parameters": link.parameters,
        })
    }
}

/// Minimal handle other entities use to refer to a component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentReference {
    pub id: String,
    pub component_type: String,
}
