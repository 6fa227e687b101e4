//! Private DNS resolver data source implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::flatten_map;
use tfsdk::{
    AttributeBuilder, AttributeType, Context, ReadOnlyResource, RemoteError, Schema, SchemaBuilder,
};

use crate::api::network::dns_resolvers::DnsResolver;
use crate::ids::DnsResolverId;
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::resources::network::resource_private_dns_resolver::flatten_virtual_network_id;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateDnsResolverDataModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub virtual_network_id: String,
    pub tags: HashMap<String, String>,
}

#[derive(Default)]
pub struct PrivateDnsResolverDataSource {
    provider_data: Option<AzureRmProviderData>,
}

#[async_trait]
impl ReadOnlyResource for PrivateDnsResolverDataSource {
    type Model = PrivateDnsResolverDataModel;
    type Id = DnsResolverId;
    type Properties = DnsResolver;

    fn resource_type(&self) -> &'static str {
        "azurerm_private_dns_resolver"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Gets information about an existing private DNS resolver")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the DNS resolver")
                    .required()
                    .validator(validate::dns_resolver_name())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group_name", AttributeType::String)
                    .description("The name of the resource group the DNS resolver lives in")
                    .required()
                    .validator(validate::resource_group_name())
                    .build(),
            )
            .attribute(common::computed_location_attribute())
            .attribute(
                AttributeBuilder::new("virtual_network_id", AttributeType::String)
                    .description("The ID of the virtual network the resolver is attached to")
                    .computed()
                    .build(),
            )
            .attribute(common::computed_tags_attribute())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, config: &PrivateDnsResolverDataModel) -> tfsdk::Result<DnsResolverId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(DnsResolverId::new(
            &provider.subscription_id,
            &config.resource_group_name,
            &config.name,
        ))
    }

    fn flatten(
        &self,
        id: &DnsResolverId,
        remote: DnsResolver,
        _config: &PrivateDnsResolverDataModel,
    ) -> tfsdk::Result<PrivateDnsResolverDataModel> {
        Ok(PrivateDnsResolverDataModel {
            name: id.dns_resolver_name.clone(),
            resource_group_name: id.resource_group_name.clone(),
            location: common::flatten_location(Some(remote.location.as_str())),
            virtual_network_id: flatten_virtual_network_id(remote.properties.virtual_network)?,
            tags: flatten_map(remote.tags),
        })
    }

    async fn get(&self, _ctx: &Context, id: &DnsResolverId) -> Result<DnsResolver, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.network().dns_resolvers().get(id).await?)
    }
}
