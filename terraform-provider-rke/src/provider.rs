//! Terraform Provider Implementation
//!
//! Implements the line-delimited JSON-RPC plugin protocol for RKE.

use crate::resources::{get_all_resources, Resource, ResourceState, StateWriter};
use crate::schema::{
    Diagnostic, ProviderSchema, RpcRequest, RpcResponse, SchemaBlock, JSONRPC_VERSION,
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// JSON-RPC: invalid JSON was received
pub const PARSE_ERROR: i32 = -32700;
/// JSON-RPC: the request is not a valid 2.0 request
pub const INVALID_REQUEST: i32 = -32600;
/// JSON-RPC: the method does not exist
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC: internal error
pub const INTERNAL_ERROR: i32 = -32603;

/// RKE Terraform Provider
pub struct RkeProvider {
    resources: HashMap<String, Box<dyn Resource>>,
}

impl RkeProvider {
    /// Create a provider serving every registered resource
    pub fn new() -> Self {
        Self::with_resources(get_all_resources())
    }

    pub fn with_resources(resources: Vec<Box<dyn Resource>>) -> Self {
        let resources = resources
            .into_iter()
            .map(|r| (r.type_name().to_string(), r))
            .collect();
        Self { resources }
    }

    /// Get provider schema
    fn get_schema(&self) -> ProviderSchema {
        let provider_block =
            SchemaBlock::new().with_description("Rancher Kubernetes Engine cluster provider");

        self.resources
            .iter()
            .fold(ProviderSchema::new(provider_block), |schema, (name, resource)| {
                schema.with_resource(name, resource.schema())
            })
    }

    /// Handle an RPC request
    pub fn handle_request(&self, input: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Rejected malformed request: {}", e);
                return encode(&RpcResponse::error(
                    0,
                    PARSE_ERROR,
                    &format!("Parse error: {}", e),
                ));
            }
        };

        let id = request.id;
        if request.jsonrpc != JSONRPC_VERSION {
            tracing::warn!(id, version = %request.jsonrpc, "Rejected request version");
            return encode(&RpcResponse::error(
                id,
                INVALID_REQUEST,
                &format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            ));
        }

        tracing::debug!(id, method = %request.method, "Handling request");

        let params = &request.params;
        let response = match request.method.as_str() {
            "GetProviderSchema" => {
                RpcResponse::success(id, serde_json::to_value(self.get_schema()).unwrap_or_default())
            }
            "ConfigureProvider" => self.handle_configure(id),
            "ValidateResourceConfig" => self.with_resource(id, params, |resource| {
                let config = state_param(params, "config").unwrap_or_default();
                json!({ "diagnostics": resource.validate(&config) })
            }),
            "PlanResourceChange" => self.with_resource(id, params, |resource| {
                handle_plan_resource(resource, params)
            }),
            "ApplyResourceChange" => self.with_resource(id, params, |resource| {
                handle_apply_resource(resource, params)
            }),
            "ReadResource" => self.with_resource(id, params, |resource| {
                handle_read_resource(resource, params)
            }),
            "ImportResourceState" => self.with_resource(id, params, |resource| {
                handle_import_resource(resource, params)
            }),
            "StopProvider" => RpcResponse::success(id, json!({})),
            _ => RpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };

        encode(&response)
    }

    fn handle_configure(&self, id: i64) -> RpcResponse {
        tracing::info!(resources = self.resources.len(), "Provider configured");
        RpcResponse::success(id, json!({ "diagnostics": [] }))
    }

    /// Run `handler` against the resource named by `type_name`, reporting an
    /// unknown type as a diagnostic
    fn with_resource<F>(&self, id: i64, params: &Value, handler: F) -> RpcResponse
    where
        F: FnOnce(&dyn Resource) -> Value,
    {
        let type_name = params
            .get("type_name")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        match self.resources.get(type_name) {
            Some(resource) => RpcResponse::success(id, handler(resource.as_ref())),
            None => RpcResponse::success(
                id,
                json!({
                    "diagnostics": [
                        Diagnostic::error(&format!("Unknown resource type: {}", type_name))
                    ]
                }),
            ),
        }
    }
}

impl Default for RkeProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(response: &RpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        serde_json::to_string(&RpcResponse::error(
            response.id,
            INTERNAL_ERROR,
            &format!("Serialization error: {}", e),
        ))
        .unwrap_or_default()
    })
}

/// State object under `key`; null or missing yields `None`
fn state_param(params: &Value, key: &str) -> Option<ResourceState> {
    params.get(key).and_then(ResourceState::from_value)
}

fn handle_plan_resource(resource: &dyn Resource, params: &Value) -> Value {
    let proposed = state_param(params, "proposed_new_state").unwrap_or_default();
    let prior = state_param(params, "prior_state");

    match resource.plan_change(prior.as_ref(), &proposed) {
        Ok(planned) => json!({ "planned_state": planned.values, "diagnostics": [] }),
        Err(diagnostics) => json!({ "diagnostics": diagnostics }),
    }
}

fn handle_apply_resource(resource: &dyn Resource, params: &Value) -> Value {
    let planned = state_param(params, "planned_state");
    let prior = state_param(params, "prior_state");

    let result = match (prior, planned) {
        (Some(prior), None) => resource.delete(&prior).map(|_| None),
        (None, None) => Ok(None),
        (None, Some(planned)) => resource.create(&planned).map(Some),
        (Some(prior), Some(planned)) => resource.update(&prior, &planned).map(Some),
    };

    match result {
        Ok(Some(new_state)) => json!({ "new_state": new_state.values, "diagnostics": [] }),
        Ok(None) => json!({ "new_state": null, "diagnostics": [] }),
        Err(diagnostics) => json!({ "diagnostics": diagnostics }),
    }
}

fn handle_read_resource(resource: &dyn Resource, params: &Value) -> Value {
    let current = state_param(params, "current_state").unwrap_or_default();

    match resource.read(&current) {
        // Resource no longer exists
        Ok(state) if state.is_empty() => json!({ "new_state": null, "diagnostics": [] }),
        Ok(state) => json!({ "new_state": state.values, "diagnostics": [] }),
        Err(diagnostics) => json!({ "diagnostics": diagnostics }),
    }
}

fn handle_import_resource(resource: &dyn Resource, params: &Value) -> Value {
    let resource_id = params.get("id").and_then(|v| v.as_str()).unwrap_or("");
    if resource_id.is_empty() {
        return json!({ "diagnostics": [Diagnostic::error("Import requires a cluster name")] });
    }

    let mut import_state = ResourceState::new();
    import_state.set_id(resource_id);

    match resource.read(&import_state) {
        Ok(state) => json!({
            "imported_resources": [{
                "type_name": resource.type_name(),
                "state": state.values,
            }],
            "diagnostics": [],
        }),
        Err(diagnostics) => json!({ "diagnostics": diagnostics }),
    }
}
