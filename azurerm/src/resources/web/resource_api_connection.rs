//! API connection resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::{flatten_map, from_optional, optional};
use tfsdk::{
    AttributeBuilder, AttributeType, ChangeSet, Completion, Context, RemoteError,
    ReconciledResource, ResourceId, Schema, SchemaBuilder,
};

use crate::api::web::connections::{
    ApiConnection, ApiConnectionPatch, ApiConnectionPatchProperties, ApiConnectionProperties,
    ApiReference,
};
use crate::ids::{ConnectionId, ManagedApiId};
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConnectionModel {
    pub name: String,
    pub resource_group_name: String,
    pub managed_api_id: String,
    pub display_name: String,
    pub parameter_values: HashMap<String, String>,
    pub tags: HashMap<String, String>,
}

#[derive(Default)]
pub struct ApiConnectionResource {
    provider_data: Option<AzureRmProviderData>,
}

#[async_trait]
impl ReconciledResource for ApiConnectionResource {
    type Model = ApiConnectionModel;
    type Id = ConnectionId;
    type Properties = ApiConnection;
    type Patch = ApiConnectionPatch;

    fn resource_type(&self) -> &'static str {
        "azurerm_api_connection"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an API connection to a managed API")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute(
                "The name of the API connection",
                validate::connection_name(),
            ))
            .attribute(common::resource_group_name_attribute())
            .attribute(
                AttributeBuilder::new("managed_api_id", AttributeType::String)
                    .description("The ID of the managed API this connection is for")
                    .required()
                    .force_new()
                    .validator(tfsdk::validator::resource_id::<ManagedApiId>())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .description("A display name for the connection")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("parameter_values", common::string_map())
                    .description("Parameter values for the managed API; never returned by the service")
                    .optional()
                    .sensitive()
                    .force_new()
                    .build(),
            )
            .attribute(common::tags_attribute())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &ApiConnectionModel) -> tfsdk::Result<ConnectionId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(ConnectionId::new(
            &provider.subscription_id,
            &model.resource_group_name,
            &model.name,
        ))
    }

    fn expand(&self, model: &ApiConnectionModel) -> tfsdk::Result<ApiConnection> {
        let managed_api = ManagedApiId::parse(&model.managed_api_id)?;
        Ok(ApiConnection {
            location: Some(managed_api.location_name.clone()),
            tags: common::expand_tags(&model.tags),
            properties: Some(ApiConnectionProperties {
                api: Some(ApiReference {
                    id: Some(managed_api.to_string()),
                    name: None,
                }),
                display_name: optional(&model.display_name),
                parameter_values: optional(&model.parameter_values),
            }),
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &ConnectionId,
        remote: ApiConnection,
        prior: &ApiConnectionModel,
    ) -> tfsdk::Result<ApiConnectionModel> {
        let properties = remote.properties.unwrap_or_default();
        let managed_api_id = match properties.api.and_then(|api| api.id) {
            Some(api_id) => ManagedApiId::parse_insensitively(&api_id)?.to_string(),
            None => prior.managed_api_id.clone(),
        };

        Ok(ApiConnectionModel {
            name: id.connection_name.clone(),
            resource_group_name: id.resource_group_name.clone(),
            managed_api_id,
            display_name: from_optional(properties.display_name),
            parameter_values: prior.parameter_values.clone(),
            tags: flatten_map(remote.tags),
        })
    }

    fn expand_patch(
        &self,
        model: &ApiConnectionModel,
        changes: &ChangeSet,
        _existing: ApiConnection,
    ) -> tfsdk::Result<ApiConnectionPatch> {
        let mut patch = ApiConnectionPatch::default();
        if changes.contains("display_name") {
            patch.properties = Some(ApiConnectionPatchProperties {
                display_name: Some(model.display_name.clone()),
            });
        }
        if changes.contains("tags") {
            patch.tags = common::expand_tags(&model.tags);
        }
        Ok(patch)
    }

    async fn get(&self, _ctx: &Context, id: &ConnectionId) -> Result<ApiConnection, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.web().connections().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &ConnectionId,
        properties: ApiConnection,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.web().connections().create_or_update(id, &properties).await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &ConnectionId,
        patch: ApiConnectionPatch,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.web().connections().update(id, &patch).await?)
    }

    async fn delete(&self, _ctx: &Context, id: &ConnectionId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.web().connections().delete(id).await?)
    }
}
