//! Resource trait and related types
//!
//! This module defines the object-safe Resource trait the registry and server work with.
//! Most resources do not implement it directly: they implement
//! [`ReconciledResource`](crate::reconciler::ReconciledResource) and are wrapped in a
//! [`Reconciler`](crate::reconciler::Reconciler).

use crate::context::Context;
use crate::import::import_state_passthrough_id;
use crate::schema::Schema;
use crate::types::{Diagnostics, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Base trait for resources - implement CRUD operations
/// Type name should be constant and match the name it is registered under
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name should be constant (e.g., "azurerm_api_connection")
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Called right after the registry instantiates the resource, with the data
    /// returned by the provider's configure
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;

    /// Called during plan to validate configuration
    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.schema().validate(&request.config),
        }
    }

    /// Called to create a new resource
    /// MUST populate all attributes in response.new_state (including computed)
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// Called to read current state - used for refresh and after create/update
    /// MUST return None if the resource no longer exists
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    /// Called to update an existing resource in place
    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    /// Called to delete a resource
    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;

    /// Called during "terraform import"; the server reads the returned state afterwards
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(self.type_name(), &request.id)
    }
}

pub struct ConfigureResourceRequest {
    /// Data from ConfigureProviderResponse.provider_data
    /// Downcast to your provider's specific type
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

#[derive(Debug, Default)]
pub struct ConfigureResourceResponse {
    pub diagnostics: Diagnostics,
}

pub struct ValidateResourceConfigRequest {
    pub config: DynamicValue,
}

#[derive(Debug, Default)]
pub struct ValidateResourceConfigResponse {
    pub diagnostics: Diagnostics,
}

pub struct CreateResourceRequest {
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

#[derive(Debug)]
pub struct CreateResourceResponse {
    /// Null when the create failed
    pub new_state: DynamicValue,
    pub diagnostics: Diagnostics,
}

pub struct ReadResourceRequest {
    pub current_state: DynamicValue,
}

#[derive(Debug)]
pub struct ReadResourceResponse {
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Diagnostics,
}

pub struct UpdateResourceRequest {
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

#[derive(Debug)]
pub struct UpdateResourceResponse {
    /// The prior state when the update failed
    pub new_state: DynamicValue,
    pub diagnostics: Diagnostics,
}

pub struct DeleteResourceRequest {
    pub prior_state: DynamicValue,
}

#[derive(Debug, Default)]
pub struct DeleteResourceResponse {
    pub diagnostics: Diagnostics,
}

pub struct ImportResourceStateRequest {
    pub id: String,
}

#[derive(Debug, Default)]
pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}
