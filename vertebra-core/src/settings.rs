//! Scoped settings handles
//!
//! Persistence is the store's business. Components only see a [`Settings`]
//! handle bound to their own scope.

use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Backing store for settings values, keyed by scope and name
pub trait SettingsStore: Send + Sync {
    fn store(&self, scope: &str, name: &str, value: JsonValue);
    fn retrieve(&self, scope: &str, name: &str) -> Option<JsonValue>;
}

/// Process-local settings store
#[derive(Default)]
pub struct MemorySettingsStore {
    values: DashMap<(String, String), JsonValue>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn store(&self, scope: &str, name: &str, value: JsonValue) {
        self.values.insert((scope.to_string(), name.to_string()), value);
    }

    fn retrieve(&self, scope: &str, name: &str) -> Option<JsonValue> {
        self.values
            .get(&(scope.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }
}

/// Settings handle bound to one scope
#[derive(Clone)]
pub struct Settings {
    scope: String,
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(scope: impl Into<String>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            scope: scope.into(),
            store,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn store_value(&self, name: &str, value: JsonValue) {
        self.store.store(&self.scope, name, value);
    }

    pub fn retrieve_value(&self, name: &str) -> Option<JsonValue> {
        self.store.retrieve(&self.scope, name)
    }

    /// Stored value, or `default` when nothing was stored yet
    pub fn retrieve_or(&self, name: &str, default: JsonValue) -> JsonValue {
        self.retrieve_value(name).unwrap_or(default)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").field("scope", &self.scope).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scopes_are_isolated() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let left = Settings::new("motor_left", store.clone());
        let right = Settings::new("motor_right", store);

        left.store_value("trim", json!(3));
        assert_eq!(left.retrieve_value("trim"), Some(json!(3)));
        assert_eq!(right.retrieve_value("trim"), None);
        assert_eq!(right.retrieve_or("trim", json!(0)), json!(0));
    }
}
