//! The flow document model.
//!
//! A flow is a graph of component instances (nodes) wired by directed
//! connections. The backend owns the component registry and validation;
//! this module owns the editable document and the cheap structural checks
//! the canvas runs between saves.
//!
//! ```text
//! [UDP Input] ──► [JSON Transform] ──► [HTTP Output]
//!                                 └──► [File Writer]
//! ```

pub mod component;
pub mod graph;
pub mod id;
pub mod node;
pub mod validation;

pub use component::{
    ComponentCategory, ComponentPorts, ComponentSchema, ComponentType, PropertyKind, PropertySpec,
    DEFAULT_PROPERTY_SECTION,
};
pub use graph::{Connection, FlowGraph};
pub use id::{ConnectionId, NodeId};
pub use node::{CanvasPos, FlowNode};
pub use validation::{lint_graph, IssueSeverity, ValidationIssue, ValidationResult};
