//! In-process provider server
//!
//! `ProviderServer` is the surface Terraform's plugin protocol maps onto: schema,
//! configure, validate, plan, apply, read, import and data source reads. Every call
//! instantiates the resource from the registry and configures it with the provider data.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSource, ReadDataSourceRequest, ReadDataSourceResponse,
};
use crate::error::{Result, SdkError};
use crate::logging::try_init_logging;
use crate::plan::{plan_resource_change, PlannedChange};
use crate::provider::{ConfigureProviderRequest, Provider};
use crate::registry::Registry;
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{Diagnostics, DynamicValue};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether to install the stderr logging subscriber
    pub enable_logging: bool,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Schemas of the provider and everything it serves.
#[derive(Debug, Clone)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

/// Outcome of applying a planned change.
#[derive(Debug)]
pub struct ApplyResourceChangeResponse {
    /// Null after a delete, or after a create that failed.
    pub new_state: DynamicValue,
    pub diagnostics: Diagnostics,
}

pub struct ProviderServer<P> {
    provider: P,
    registry: Registry,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Result<Self> {
        Self::with_config(provider, ServerConfig::default())
    }

    pub fn with_config(provider: P, config: ServerConfig) -> Result<Self> {
        if config.enable_logging {
            try_init_logging(&config.log_level);
        }

        let mut registry = Registry::new();
        provider.register(&mut registry)?;
        tracing::info!(
            provider = provider.type_name(),
            resources = registry.resource_types().count(),
            data_sources = registry.data_source_types().count(),
            "provider registered"
        );

        Ok(Self {
            provider,
            registry,
            provider_data: None,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn provider_schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: self.provider.schema(),
            resources: self.registry.resource_schemas(),
            data_sources: self.registry.data_source_schemas(),
        }
    }

    /// Configures the provider. Resources and data sources are unusable until this succeeds.
    pub async fn configure(&mut self, ctx: Context, config: DynamicValue) -> Diagnostics {
        let mut diagnostics = self.provider.schema().validate(&config);
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let span = tracing::info_span!("configure", provider = self.provider.type_name());
        let response = self
            .provider
            .configure(ctx, ConfigureProviderRequest { config })
            .instrument(span)
            .await;
        diagnostics.extend(response.diagnostics);
        if !diagnostics.has_errors() {
            self.provider_data = response.provider_data;
        }
        diagnostics
    }

    async fn resource(&self, ctx: &Context, type_name: &str) -> Result<Box<dyn Resource>> {
        let provider_data = self
            .provider_data
            .clone()
            .ok_or(SdkError::ProviderNotConfigured)?;
        let mut resource = self.registry.resource(type_name)?;
        resource
            .configure(
                ctx.clone(),
                ConfigureResourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await
            .diagnostics
            .into_operation_result()?;
        Ok(resource)
    }

    async fn data_source(&self, ctx: &Context, type_name: &str) -> Result<Box<dyn DataSource>> {
        let provider_data = self
            .provider_data
            .clone()
            .ok_or(SdkError::ProviderNotConfigured)?;
        let mut data_source = self.registry.data_source(type_name)?;
        data_source
            .configure(
                ctx.clone(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await
            .diagnostics
            .into_operation_result()?;
        Ok(data_source)
    }

    /// Validates a resource configuration without touching the remote.
    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: DynamicValue,
    ) -> Diagnostics {
        match self.registry.resource(type_name) {
            Ok(resource) => {
                resource
                    .validate(ctx, ValidateResourceConfigRequest { config })
                    .await
                    .diagnostics
            }
            Err(e) => Diagnostics::from_error("Unknown resource type", &e),
        }
    }

    pub fn plan_resource_change(
        &self,
        type_name: &str,
        prior_state: &DynamicValue,
        proposed_new_state: &DynamicValue,
    ) -> Result<PlannedChange> {
        let schema = self.registry.resource(type_name)?.schema();
        Ok(plan_resource_change(&schema, prior_state, proposed_new_state))
    }

    /// Creates when there is no prior state, deletes when there is no planned state,
    /// and updates otherwise.
    pub async fn apply_resource_change(
        &self,
        ctx: Context,
        type_name: &str,
        prior_state: DynamicValue,
        planned_state: DynamicValue,
        config: DynamicValue,
    ) -> ApplyResourceChangeResponse {
        let span = tracing::info_span!("apply", resource_type = type_name);
        async move {
            let resource = match self.resource(&ctx, type_name).await {
                Ok(resource) => resource,
                Err(e) => {
                    return ApplyResourceChangeResponse {
                        new_state: prior_state,
                        diagnostics: Diagnostics::from_error("Failed to configure resource", &e),
                    }
                }
            };

            match (prior_state.is_null(), planned_state.is_null()) {
                (true, true) => ApplyResourceChangeResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: Diagnostics::new(),
                },
                (true, false) => {
                    let response = resource
                        .create(ctx, CreateResourceRequest { planned_state, config })
                        .await;
                    ApplyResourceChangeResponse {
                        new_state: response.new_state,
                        diagnostics: response.diagnostics,
                    }
                }
                (false, true) => {
                    let response = resource
                        .delete(ctx, DeleteResourceRequest {
                            prior_state: prior_state.clone(),
                        })
                        .await;
                    let new_state = if response.diagnostics.has_errors() {
                        prior_state
                    } else {
                        DynamicValue::null()
                    };
                    ApplyResourceChangeResponse {
                        new_state,
                        diagnostics: response.diagnostics,
                    }
                }
                (false, false) => {
                    let response = resource
                        .update(ctx, UpdateResourceRequest {
                            prior_state,
                            planned_state,
                            config,
                        })
                        .await;
                    ApplyResourceChangeResponse {
                        new_state: response.new_state,
                        diagnostics: response.diagnostics,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn read_resource(
        &self,
        ctx: Context,
        type_name: &str,
        current_state: DynamicValue,
    ) -> ReadResourceResponse {
        let resource = match self.resource(&ctx, type_name).await {
            Ok(resource) => resource,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(current_state),
                    diagnostics: Diagnostics::from_error("Failed to configure resource", &e),
                }
            }
        };

        resource
            .read(ctx, ReadResourceRequest { current_state })
            .instrument(tracing::info_span!("read", resource_type = type_name))
            .await
    }

    /// Imports by id, then reads each imported resource to fill in its state.
    pub async fn import_resource_state(
        &self,
        ctx: Context,
        type_name: &str,
        id: &str,
    ) -> ImportResourceStateResponse {
        let resource = match self.resource(&ctx, type_name).await {
            Ok(resource) => resource,
            Err(e) => {
                return ImportResourceStateResponse {
                    imported_resources: Vec::new(),
                    diagnostics: Diagnostics::from_error("Failed to configure resource", &e),
                }
            }
        };

        let span = tracing::info_span!("import", resource_type = type_name, id = id);
        async move {
            let imported = resource
                .import_state(ctx.clone(), ImportResourceStateRequest { id: id.to_string() })
                .await;
            let mut response = ImportResourceStateResponse {
                imported_resources: Vec::new(),
                diagnostics: imported.diagnostics,
            };
            if response.diagnostics.has_errors() {
                return response;
            }

            for ImportedResource { type_name, state } in imported.imported_resources {
                let read = resource
                    .read(ctx.clone(), ReadResourceRequest { current_state: state })
                    .await;
                response.diagnostics.extend(read.diagnostics);
                match read.new_state {
                    Some(state) if !response.diagnostics.has_errors() => {
                        response
                            .imported_resources
                            .push(ImportedResource { type_name, state });
                    }
                    Some(_) => {}
                    None => response.diagnostics.add_error(
                        "Cannot import non-existent remote object",
                        format!(
                            "While attempting to import an existing object to {:?}, the provider detected that no object exists with the given id {:?}.",
                            type_name, id
                        ),
                    ),
                }
            }
            response
        }
        .instrument(span)
        .await
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        type_name: &str,
        config: DynamicValue,
    ) -> ReadDataSourceResponse {
        let data_source = match self.data_source(&ctx, type_name).await {
            Ok(data_source) => data_source,
            Err(e) => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: Diagnostics::from_error("Failed to configure data source", &e),
                }
            }
        };

        data_source
            .read(ctx, ReadDataSourceRequest { config })
            .instrument(tracing::info_span!("read_data_source", data_source_type = type_name))
            .await
    }
}
