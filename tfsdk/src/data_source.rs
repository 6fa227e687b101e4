//! DataSource trait and related types
//!
//! This module defines the DataSource trait that data sources must implement, and
//! [`Reader`], which implements it for any [`ReadOnlyResource`].

use crate::context::Context;
use crate::error::{RemoteError, Result, SdkError};
use crate::identifier::ResourceId;
use crate::metadata::ResourceMetaData;
use crate::schema::Schema;
use crate::types::{Diagnostics, DynamicValue};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Base trait for data sources - read is the only operation
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name should be constant (e.g., "azurerm_private_dns_resolver")
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse;

    /// Called during plan to validate configuration
    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: self.schema().validate(&request.config),
        }
    }

    /// MUST populate all attributes in response.state
    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse;
}

pub struct ConfigureDataSourceRequest {
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

#[derive(Debug, Default)]
pub struct ConfigureDataSourceResponse {
    pub diagnostics: Diagnostics,
}

pub struct ValidateDataSourceConfigRequest {
    pub config: DynamicValue,
}

#[derive(Debug, Default)]
pub struct ValidateDataSourceConfigResponse {
    pub diagnostics: Diagnostics,
}

pub struct ReadDataSourceRequest {
    pub config: DynamicValue,
}

#[derive(Debug)]
pub struct ReadDataSourceResponse {
    pub state: DynamicValue,
    pub diagnostics: Diagnostics,
}

/// A data source that looks up one existing remote resource.
#[async_trait]
pub trait ReadOnlyResource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Default + fmt::Debug + Send + Sync;
    type Id: ResourceId;
    type Properties: Send + Sync;

    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn read_timeout(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> Result<()>;

    /// Builds the identifier of the resource to look up from the configuration.
    fn build_id(&self, config: &Self::Model) -> Result<Self::Id>;

    fn flatten(
        &self,
        id: &Self::Id,
        remote: Self::Properties,
        config: &Self::Model,
    ) -> Result<Self::Model>;

    async fn get(
        &self,
        ctx: &Context,
        id: &Self::Id,
    ) -> std::result::Result<Self::Properties, RemoteError>;
}

pub struct Reader<R> {
    inner: R,
}

impl<R: ReadOnlyResource> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Looks the resource up. Unlike a resource read, not found is an error.
    pub async fn read(&self, ctx: &Context, metadata: &mut ResourceMetaData) -> Result<()> {
        let ctx = ctx.with_timeout(self.inner.read_timeout());
        let config: R::Model = metadata.decode()?;
        let id = self.inner.build_id(&config)?;

        let remote = ctx
            .bound(self.inner.get(&ctx, &id))
            .await?
            .map_err(|e| match e {
                RemoteError::NotFound => SdkError::operation(
                    "retrieving",
                    &id,
                    SdkError::Custom(format!("{} was not found", R::Id::kind())),
                ),
                other => SdkError::operation("retrieving", &id, other),
            })?;

        let model = self.inner.flatten(&id, remote, &config)?;
        metadata.set_id(id.id());
        metadata.encode(&model)
    }
}

#[async_trait]
impl<R: ReadOnlyResource> DataSource for Reader<R> {
    fn type_name(&self) -> &str {
        self.inner.resource_type()
    }

    fn schema(&self) -> Schema {
        self.inner.schema()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = Diagnostics::new();
        match request.provider_data {
            Some(data) => {
                if let Err(e) = self.inner.configure(data.as_ref()) {
                    diagnostics.add_error(
                        format!("Failed to configure {}", self.inner.resource_type()),
                        e.to_string(),
                    );
                }
            }
            None => diagnostics.add_error(
                "Provider not configured",
                format!(
                    "{} requires the provider to be configured before use",
                    self.inner.resource_type()
                ),
            ),
        }
        ConfigureDataSourceResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let diagnostics = self.inner.schema().validate(&request.config);
        if diagnostics.has_errors() {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        }

        let mut metadata = ResourceMetaData::for_data_source(self.inner.resource_type(), request.config);
        match Reader::read(self, &ctx, &mut metadata).await {
            Ok(()) => ReadDataSourceResponse {
                state: metadata.into_new_state().unwrap_or_else(DynamicValue::null),
                diagnostics,
            },
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: Diagnostics::from_error(
                    format!("Failed to read {}", self.inner.resource_type()),
                    &e,
                ),
            },
        }
    }
}
