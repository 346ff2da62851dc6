//! FlowApi trait for the backend seam
//!
//! This module provides a common trait for backend access, enabling both
//! the real HTTP client and scripted fakes for testing. The worker thread
//! owns exactly one implementation and drives it synchronously.

use crate::error::Result;
use crate::flow::{ComponentSchema, ComponentType, FlowGraph, ValidationResult};
use crate::types::{RuntimeAction, RuntimeStatusReport};

/// Unified interface to the flow backend
///
/// Implementations must be `Send` so the service worker thread can own
/// them. All calls block until the backend answers or the request's
/// deadline passes.
#[cfg_attr(test, mockall::automock)]
pub trait FlowApi: Send {
    /// Point subsequent requests at a different backend
    fn set_base_url(&mut self, base_url: &str);

    /// List every component type the backend registry offers
    fn component_types(&self) -> Result<Vec<ComponentType>>;

    /// Fetch one component type's config schema
    ///
    /// `None` means the backend has no schema for this type; the editor
    /// falls back to raw JSON editing. A 404 from the backend is this
    /// case, not an error.
    fn component_schema(&self, type_id: &str) -> Result<Option<ComponentSchema>>;

    /// Load a flow document by id
    fn fetch_flow(&self, flow_id: &str) -> Result<FlowGraph>;

    /// Persist a flow
    ///
    /// A `Some` result carries the backend's validation verdict for the
    /// saved document; `None` means the backend reported nothing beyond
    /// success.
    fn save_flow(&self, flow: &FlowGraph) -> Result<Option<ValidationResult>>;

    /// Request a lifecycle transition for a deployed flow
    fn control(&self, flow_id: &str, action: RuntimeAction) -> Result<()>;

    /// Poll the runtime for state, throughput and recent logs
    fn runtime_status(&self, flow_id: &str) -> Result<RuntimeStatusReport>;
}
