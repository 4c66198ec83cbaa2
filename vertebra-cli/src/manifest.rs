// Device manifest loader
// Builds a spine, an action registry and components from a TOML file

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use vertebra_actions::{handler_fn, Action, ActionCall, ActionRegistry};
use vertebra_components::{Component, ComponentDetails, ComponentOptions};
use vertebra_core::{LocalSpine, QueryRequest, VertebraConfig};

/// Manifest file layout
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub pending_handlers: Vec<PendingHandler>,
    #[serde(default)]
    pub pending_interrupts: Vec<PendingInterrupt>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub user_groups: Vec<String>,
    #[serde(default)]
    pub admin_groups: Vec<String>,
    /// Declared UI parameters with their defaults
    #[serde(default)]
    pub ui: HashMap<String, toml::Value>,
    /// Extra keys merged into introspection answers
    #[serde(default)]
    pub info: HashMap<String, toml::Value>,
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LinkDefinition {
    pub dashboard: String,
    pub section: String,
    #[serde(default)]
    pub parameters: HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Fixed reply; the call arguments are echoed when absent
    #[serde(default)]
    pub reply: Option<toml::Value>,
    /// Only reserve the identifier, no handler yet
    #[serde(default)]
    pub linked: bool,
}

#[derive(Debug, Deserialize)]
pub struct PendingHandler {
    pub handler: String,
    pub action: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PendingInterrupt {
    pub interrupt: String,
    pub action: String,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Convert a TOML value to JSON
fn toml_to_json(value: toml::Value) -> JsonValue {
    match value {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        toml::Value::Array(arr) => JsonValue::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn toml_map(values: HashMap<String, toml::Value>) -> Map<String, JsonValue> {
    values
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect()
}

/// Component whose UI parameters and info come from the manifest
struct ManifestDetails {
    ui: Map<String, JsonValue>,
    info: Map<String, JsonValue>,
}

impl ComponentDetails for ManifestDetails {
    fn ui_parameters(&self) -> Map<String, JsonValue> {
        self.ui.clone()
    }

    fn info(&self, _component: &Component, _request: &QueryRequest) -> Map<String, JsonValue> {
        self.info.clone()
    }
}

/// Everything a manifest describes, wired together
pub struct Device {
    pub spine: Arc<LocalSpine>,
    pub actions: Arc<ActionRegistry>,
    pub components: Vec<Arc<Component>>,
}

impl Device {
    pub fn build(manifest: Manifest, config: &VertebraConfig) -> Result<Self> {
        let spine = Arc::new(LocalSpine::new(&config.spine));
        let actions = Arc::new(ActionRegistry::new(&config.actions));

        for definition in manifest.actions {
            if definition.linked {
                actions.resolve(&definition.id);
                continue;
            }
            let name = definition.name.unwrap_or_else(|| definition.id.clone());
            let reply = definition.reply.map(toml_to_json);
            actions.register(Action::new(
                definition.id,
                name,
                handler_fn(move |call: &ActionCall| {
                    Ok(reply
                        .clone()
                        .unwrap_or_else(|| JsonValue::Array(call.args.clone())))
                }),
            ));
        }

        for pending in manifest.pending_handlers {
            let name = pending.name.unwrap_or_else(|| pending.action.clone());
            actions.register_unbound(&pending.handler, &pending.action, &name);
        }

        for pending in manifest.pending_interrupts {
            actions.register_unbound_interrupt(&pending.interrupt, &pending.action);
        }

        let mut components = Vec::with_capacity(manifest.components.len());
        for definition in manifest.components {
            let component = Component::new(
                spine.clone(),
                definition.id.clone(),
                definition.component_type,
                definition.name,
                ComponentOptions::new()
                    .with_user_groups(definition.user_groups)
                    .with_admin_groups(definition.admin_groups),
                Arc::new(ManifestDetails {
                    ui: toml_map(definition.ui),
                    info: toml_map(definition.info),
                }),
            );
            if definition.icon.is_some() {
                component.set_icon(definition.icon);
            }
            component.set_visible(definition.visible);

            for link in definition.links {
                component
                    .link_to_dashboard(&link.dashboard, &link.section, toml_map(link.parameters))
                    .with_context(|| {
                        format!(
                            "Invalid link {}/{} for component '{}'",
                            link.dashboard, link.section, definition.id
                        )
                    })?;
            }

            debug!("Manifest component loaded: {}", definition.id);
            components.push(component);
        }

        info!(
            "Device ready: {} component(s), {} action(s)",
            components.len(),
            actions.len()
        );

        Ok(Self {
            spine,
            actions,
            components,
        })
    }
}
