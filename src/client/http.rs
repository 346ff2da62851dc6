//! HTTP implementation of [`FlowApi`] over reqwest.
//!
//! The worker drives this client synchronously, so the async reqwest stack
//! is wrapped in a private current-thread tokio runtime and every call is
//! a `block_on`. Timeouts are per request: metadata fetches abort after
//! [`METADATA_TIMEOUT`] so a dead backend cannot hang the UI in a loading
//! state, while saves and control actions get the longer
//! [`MUTATION_TIMEOUT`].

use crate::client::api::FlowApi;
use crate::error::{FlowStudioError, Result};
use crate::flow::{ComponentSchema, ComponentType, FlowGraph, ValidationResult};
use crate::types::{RuntimeAction, RuntimeStatusReport};
use serde::Deserialize;
use std::time::Duration;

/// Deadline for component metadata and status fetches
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for saves and lifecycle control actions
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-backed client for the flow backend's REST API
pub struct HttpFlowApi {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlowApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FlowStudioError::Io)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("flowstudio-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FlowStudioError::from_request_error)?;
        Ok(Self {
            runtime,
            client,
            base_url: normalize_base_url(base_url.into()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }
}

impl FlowApi for HttpFlowApi {
    fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url.to_string());
    }

    fn component_types(&self) -> Result<Vec<ComponentType>> {
        let url = self.url("components/types");
        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .timeout(METADATA_TIMEOUT)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            let response = ensure_success(response).await?;
            response
                .json::<Vec<ComponentType>>()
                .await
                .map_err(FlowStudioError::from_request_error)
        })
    }

    fn component_schema(&self, type_id: &str) -> Result<Option<ComponentSchema>> {
        let url = self.url(&format!("components/types/{type_id}"));
        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .timeout(METADATA_TIMEOUT)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            // No schema registered for this type; caller falls back to raw JSON
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = ensure_success(response).await?;
            let descriptor: ComponentType = response
                .json()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            Ok(descriptor.schema)
        })
    }

    fn fetch_flow(&self, flow_id: &str) -> Result<FlowGraph> {
        let url = self.url(&format!("flows/{flow_id}"));
        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .timeout(METADATA_TIMEOUT)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            let response = ensure_success(response).await?;
            response
                .json::<FlowGraph>()
                .await
                .map_err(FlowStudioError::from_request_error)
        })
    }

    fn save_flow(&self, flow: &FlowGraph) -> Result<Option<ValidationResult>> {
        let url = self.url(&format!("flows/{}", flow.id));
        self.runtime.block_on(async {
            let response = self
                .client
                .put(&url)
                .timeout(MUTATION_TIMEOUT)
                .json(flow)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            let response = ensure_success(response).await?;
            let body = response
                .text()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            parse_save_response(&body)
        })
    }

    fn control(&self, flow_id: &str, action: RuntimeAction) -> Result<()> {
        let url = self.url(&format!("flows/{flow_id}/{}", action.endpoint()));
        self.runtime.block_on(async {
            let response = self
                .client
                .post(&url)
                .timeout(MUTATION_TIMEOUT)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            ensure_success(response).await?;
            Ok(())
        })
    }

    fn runtime_status(&self, flow_id: &str) -> Result<RuntimeStatusReport> {
        let url = self.url(&format!("flows/{flow_id}/runtime"));
        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .timeout(METADATA_TIMEOUT)
                .send()
                .await
                .map_err(FlowStudioError::from_request_error)?;
            let response = ensure_success(response).await?;
            response
                .json::<RuntimeStatusReport>()
                .await
                .map_err(FlowStudioError::from_request_error)
        })
    }
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FlowStudioError::Api {
        status: status.as_u16(),
        message: extract_error_message(status, &body),
    })
}

/// Pull a human-readable message out of an error response body
///
/// The backend usually answers with `{"error": "..."}` but older versions
/// use `message` or `detail`, and proxies may return plain text or HTML.
fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('<') {
        return trimmed.chars().take(200).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[derive(Deserialize)]
struct SaveResponseBody {
    #[serde(default, alias = "validationResult")]
    validation: Option<ValidationResult>,
}

/// Interpret a 2xx save response body
///
/// Accepted shapes: empty body, `{"validation": {...}}` (or the older
/// `validationResult` key), or a bare `{"errors": [...], "warnings": [...]}`
/// object. Anything else is a malformed response and fails the save.
fn parse_save_response(body: &str) -> Result<Option<ValidationResult>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
        FlowStudioError::Serialization(format!("save response was not valid JSON: {e}"))
    })?;

    let wrapper: SaveResponseBody = serde_json::from_value(value.clone())
        .map_err(|e| FlowStudioError::Serialization(format!("unexpected save response: {e}")))?;
    if wrapper.validation.is_some() {
        return Ok(wrapper.validation);
    }

    if value.get("errors").is_some() || value.get("warnings").is_some() {
        let result: ValidationResult = serde_json::from_value(value)
            .map_err(|e| FlowStudioError::Serialization(format!("unexpected save response: {e}")))?;
        return Ok(Some(result));
    }

    Ok(None)
}
