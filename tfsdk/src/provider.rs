//! Provider trait and related types

use crate::context::Context;
use crate::error::Result;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::types::{Diagnostics, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Base trait for providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider type name (e.g., "azurerm")
    fn type_name(&self) -> &str;

    /// Schema of the provider configuration block
    fn schema(&self) -> Schema;

    /// Called once with the provider block. The returned provider data is handed to
    /// every resource and data source through their configure.
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Registers every resource and data source type the provider serves.
    fn register(&self, registry: &mut Registry) -> Result<()>;
}

pub struct ConfigureProviderRequest {
    pub config: DynamicValue,
}

#[derive(Default)]
pub struct ConfigureProviderResponse {
    pub diagnostics: Diagnostics,
    /// Data to pass to resources/data sources (e.g., API client)
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}
