//! Terraform Resources for RKE
//!
//! Defines the flat resource state exchanged with Terraform and the resources
//! the provider manages.

mod cluster;

pub use cluster::{ClusterDriver, NoopDriver, RkeClusterResource};

use crate::schema::{Diagnostic, ResourceSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, Vec<Diagnostic>>;

/// Read access to flat configuration values
pub trait ResourceData {
    /// Value stored under `key`, or `None` when the key is absent
    fn get_ok(&self, key: &str) -> Option<&Value>;
}

/// Write access to flat state
pub trait StateWriter {
    fn set(&mut self, key: &str, value: Value) -> rke_common::Result<()>;

    fn set_id(&mut self, id: &str);
}

/// Resource state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub values: HashMap<String, Value>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State from a JSON object; anything else yields `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|obj| Self {
            values: obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.values.get("id").and_then(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ResourceData for ResourceState {
    fn get_ok(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl StateWriter for ResourceState {
    fn set(&mut self, key: &str, value: Value) -> rke_common::Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn set_id(&mut self, id: &str) {
        self.values.insert("id".to_string(), Value::String(id.to_string()));
    }
}

/// Nested blocks are read through the same accessor as the top level
impl ResourceData for Map<String, Value> {
    fn get_ok(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Resource trait
pub trait Resource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &str;

    /// Get the schema for this resource
    fn schema(&self) -> ResourceSchema;

    /// Check a configuration without applying it
    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Create a new resource
    fn create(&self, planned: &ResourceState) -> ResourceResult<ResourceState>;

    /// Read an existing resource
    fn read(&self, current: &ResourceState) -> ResourceResult<ResourceState>;

    /// Update an existing resource
    fn update(
        &self,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Delete a resource
    fn delete(&self, current: &ResourceState) -> ResourceResult<()>;

    /// Plan changes
    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        // Default implementation: return proposed state
        let _ = current;
        Ok(proposed.clone())
    }
}

/// Get all available resources
pub fn get_all_resources() -> Vec<Box<dyn Resource>> {
    vec![Box::new(RkeClusterResource::default())]
}
