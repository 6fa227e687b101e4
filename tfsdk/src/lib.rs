//! tfsdk - a framework for Terraform-style providers
//!
//! Resources declare a schema and implement the expand/flatten contract and their
//! remote calls; the [`Reconciler`] turns that into create, read, update and delete with
//! consistent idempotence and error semantics.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod registry;
pub mod resource;

// Reconciliation
pub mod convert;
pub mod identifier;
pub mod metadata;
pub mod poller;
pub mod reconciler;

// Helper modules
pub mod import;
pub mod logging;
pub mod plan;
pub mod validator;

pub mod server;
pub mod testing;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, ReadOnlyResource, Reader};
pub use error::{RemoteError, Result, SdkError};
pub use identifier::{ResourceId, Segment};
pub use import::{import_state_passthrough_id, import_state_with_id};
pub use logging::{init_logging, try_init_logging};
pub use metadata::{ChangeSet, ResourceMetaData};
pub use poller::{PollResult, PollerType, PollingStatus};
pub use provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
pub use reconciler::{Completion, ReconciledResource, Reconciler, Timeouts};
pub use registry::Registry;
pub use resource::Resource;
pub use schema::{AttributeBuilder, AttributeType, BlockBuilder, NestedBlock, Schema, SchemaBuilder};
pub use server::{ProviderServer, ServerConfig};
pub use types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue};

#[doc(hidden)]
pub use serde as __serde;
