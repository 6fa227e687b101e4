pub mod api;
pub mod config;
pub mod data_sources;
pub mod ids;
pub mod provider_data;
pub mod resources;
pub mod validate;

use async_trait::async_trait;
use std::sync::Arc;
use tfsdk::provider::{ConfigureProviderRequest, ConfigureProviderResponse};
use tfsdk::{
    AttributeBuilder, AttributeType, Context, Diagnostics, Provider, Reader, Reconciler, Registry,
    Schema, SchemaBuilder,
};

use api::{ArmClient, ClientSecretCredential, TokenCredential};
use config::{Credentials, ProviderConfig};
use provider_data::AzureRmProviderData;

#[derive(Default)]
pub struct AzureRmProvider;

impl AzureRmProvider {
    pub fn new() -> Self {
        Self
    }
}

fn setting(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
}

#[async_trait]
impl Provider for AzureRmProvider {
    fn type_name(&self) -> &str {
        "azurerm"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Azure Resource Manager")
            .attribute(setting("subscription_id", "The subscription resources are managed in").build())
            .attribute(setting("tenant_id", "The tenant of the service principal").build())
            .attribute(setting("client_id", "The client ID of the service principal").build())
            .attribute(
                setting("client_secret", "The client secret of the service principal")
                    .sensitive()
                    .build(),
            )
            .attribute(
                setting("access_token", "A pre-issued Resource Manager access token")
                    .sensitive()
                    .build(),
            )
            .attribute(setting("environment", "One of public, usgovernment or china").build())
            .attribute(
                setting("resource_manager_endpoint", "Overrides the Resource Manager endpoint")
                    .build(),
            )
            .attribute(setting("authority_host", "Overrides the token authority").build())
            .build()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match ProviderConfig::resolve(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        let credential = match &config.credentials {
            Credentials::AccessToken(token) => TokenCredential::Static(token.clone()),
            Credentials::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => TokenCredential::ClientSecret(ClientSecretCredential::new(
                &config.authority_host,
                tenant_id,
                client_id,
                client_secret,
                &config.resource_manager_endpoint,
            )),
        };

        let mut diagnostics = Diagnostics::new();
        match ArmClient::new(&config.resource_manager_endpoint, credential) {
            Ok(client) => {
                tracing::info!(
                    endpoint = %config.resource_manager_endpoint,
                    subscription_id = %config.subscription_id,
                    "configured azurerm provider"
                );
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(AzureRmProviderData::new(
                        client,
                        config.subscription_id,
                    ))),
                }
            }
            Err(e) => {
                diagnostics.add_error("Failed to create API client", e.to_string());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn register(&self, registry: &mut Registry) -> tfsdk::Result<()> {
        use data_sources::{DynatraceMonitorDataSource, PrivateDnsResolverDataSource};
        use resources::{
            ApiConnectionResource, AppServiceConnectionResource, ClusterExtensionResource,
            DynatraceMonitorResource, ManagedPoolResource, PrivateDnsResolverResource,
        };

        registry.register_resource(|| Box::new(Reconciler::new(ApiConnectionResource::default())))?;
        registry.register_resource(|| Box::new(Reconciler::new(DynatraceMonitorResource::default())))?;
        registry.register_resource(|| Box::new(Reconciler::new(ClusterExtensionResource::default())))?;
        registry.register_resource(|| Box::new(Reconciler::new(PrivateDnsResolverResource::default())))?;
        registry
            .register_resource(|| Box::new(Reconciler::new(AppServiceConnectionResource::default())))?;
        registry.register_resource(|| Box::new(Reconciler::new(ManagedPoolResource::default())))?;

        registry.register_data_source(|| Box::new(Reader::new(DynatraceMonitorDataSource::default())))?;
        registry
            .register_data_source(|| Box::new(Reader::new(PrivateDnsResolverDataSource::default())))?;
        Ok(())
    }
}
