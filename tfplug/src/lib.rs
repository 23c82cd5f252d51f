//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust: typed values and
//! schemas, async provider/resource/data source traits, schema-driven
//! planning and an in-process host that drives the full resource lifecycle.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

// Planning and lifecycle
pub mod host;
pub mod plan;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use host::{HostError, ProviderHost, ResourcePlan, StoredState};
pub use import::import_state_passthrough_id;
pub use plan::PlanAction;
pub use provider::Provider;
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
