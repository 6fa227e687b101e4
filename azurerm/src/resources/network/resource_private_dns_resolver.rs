//! Private DNS resolver resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::flatten_map;
use tfsdk::validator::resource_id;
use tfsdk::{
    AttributeBuilder, AttributeType, ChangeSet, Completion, Context, ReconciledResource,
    RemoteError, ResourceId, Schema, SchemaBuilder,
};

use crate::api::common::SubResource;
use crate::api::network::dns_resolvers::{DnsResolver, DnsResolverPatch, DnsResolverProperties};
use crate::ids::{DnsResolverId, VirtualNetworkId};
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateDnsResolverModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub virtual_network_id: String,
    pub tags: HashMap<String, String>,
}

#[derive(Default)]
pub struct PrivateDnsResolverResource {
    provider_data: Option<AzureRmProviderData>,
}

/// The virtual network a resolver is attached to, in canonical form. ARM returns it
/// with whatever casing the network was created with.
pub(crate) fn flatten_virtual_network_id(network: SubResource) -> tfsdk::Result<String> {
    match network.id {
        Some(id) => Ok(VirtualNetworkId::parse_insensitively(&id)?.to_string()),
        None => Ok(String::new()),
    }
}

#[async_trait]
impl ReconciledResource for PrivateDnsResolverResource {
    type Model = PrivateDnsResolverModel;
    type Id = DnsResolverId;
    type Properties = DnsResolver;
    type Patch = DnsResolverPatch;

    fn resource_type(&self) -> &'static str {
        "azurerm_private_dns_resolver"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a private DNS resolver")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute(
                "The name of the DNS resolver",
                validate::dns_resolver_name(),
            ))
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("virtual_network_id", AttributeType::String)
                    .description("The ID of the virtual network the resolver is attached to")
                    .required()
                    .force_new()
                    .validator(resource_id::<VirtualNetworkId>())
                    .build(),
            )
            .attribute(common::tags_attribute())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &PrivateDnsResolverModel) -> tfsdk::Result<DnsResolverId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(DnsResolverId::new(
            &provider.subscription_id,
            &model.resource_group_name,
            &model.name,
        ))
    }

    fn expand(&self, model: &PrivateDnsResolverModel) -> tfsdk::Result<DnsResolver> {
        let network = VirtualNetworkId::parse(&model.virtual_network_id)?;
        Ok(DnsResolver {
            location: model.location.clone(),
            tags: common::expand_tags(&model.tags),
            properties: DnsResolverProperties {
                virtual_network: SubResource {
                    id: Some(network.to_string()),
                },
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &DnsResolverId,
        remote: DnsResolver,
        _prior: &PrivateDnsResolverModel,
    ) -> tfsdk::Result<PrivateDnsResolverModel> {
        Ok(PrivateDnsResolverModel {
            name: id.dns_resolver_name.clone(),
            resource_group_name: id.resource_group_name.clone(),
            location: common::flatten_location(Some(remote.location.as_str())),
            virtual_network_id: flatten_virtual_network_id(remote.properties.virtual_network)?,
            tags: flatten_map(remote.tags),
        })
    }

    fn expand_patch(
        &self,
        model: &PrivateDnsResolverModel,
        changes: &ChangeSet,
        _existing: DnsResolver,
    ) -> tfsdk::Result<DnsResolverPatch> {
        let mut patch = DnsResolverPatch::default();
        if changes.contains("tags") {
            patch.tags = common::expand_tags(&model.tags);
        }
        Ok(patch)
    }

    async fn get(&self, _ctx: &Context, id: &DnsResolverId) -> Result<DnsResolver, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.network().dns_resolvers().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &DnsResolverId,
        properties: DnsResolver,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.network().dns_resolvers().create_or_update(id, &properties).await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &DnsResolverId,
        patch: DnsResolverPatch,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.network().dns_resolvers().update(id, &patch).await?)
    }

    async fn delete(&self, _ctx: &Context, id: &DnsResolverId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.network().dns_resolvers().delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VNET: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet";

    #[test]
    fn test_expand_references_the_virtual_network() {
        let model = PrivateDnsResolverModel {
            name: "resolver".to_string(),
            resource_group_name: "rg".to_string(),
            location: "westeurope".to_string(),
            virtual_network_id: VNET.to_string(),
            tags: HashMap::new(),
        };

        let body = serde_json::to_value(PrivateDnsResolverResource::default().expand(&model).unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "location": "westeurope",
                "tags": {},
                "properties": { "virtualNetwork": { "id": VNET } }
            })
        );
    }

    #[test]
    fn test_flatten_normalizes_network_id_casing() {
        let remote: DnsResolver = serde_json::from_value(json!({
            "location": "West Europe",
            "properties": {
                "virtualNetwork": { "id": VNET.replace("virtualNetworks", "virtualnetworks") },
                "dnsResolverState": "Connected",
                "provisioningState": "Succeeded"
            }
        }))
        .unwrap();
        let id = DnsResolverId::new("00000000-0000-0000-0000-000000000000", "rg", "resolver");

        let flattened = PrivateDnsResolverResource::default()
            .flatten(&id, remote, &PrivateDnsResolverModel::default())
            .unwrap();

        assert_eq!(flattened.virtual_network_id, VNET);
        assert_eq!(flattened.location, "westeurope");
        assert!(flattened.tags.is_empty());
    }

    #[test]
    fn test_flatten_without_network_is_empty() {
        assert_eq!(flatten_virtual_network_id(SubResource::default()).unwrap(), "");
    }
}
