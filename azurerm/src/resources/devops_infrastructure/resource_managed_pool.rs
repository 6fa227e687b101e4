//! Managed DevOps pool resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfsdk::convert::{expand_singleton, flatten_map, from_optional, optional};
use tfsdk::validator::{int_between, is_https_url, resource_id, ListElementsValidator};
use tfsdk::{
    AttributeBuilder, AttributeType, BlockBuilder, ChangeSet, Completion, Context, NestedBlock,
    ReconciledResource, RemoteError, ResourceId, Schema, SchemaBuilder,
};

use crate::api::devops_infrastructure::pools::{
    AgentProfile, AzureDevOpsOrganizationProfile, Organization, OrganizationProfile, Pool,
    PoolProperties, PoolUpdate, PoolUpdateProperties, StatefulAgentProfile, StatelessAgentProfile,
};
use crate::ids::{DevCenterProjectId, PoolId};
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedPoolModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub dev_center_project_id: String,
    pub maximum_concurrency: i64,
    pub azure_devops_organization: Vec<OrganizationModel>,
    pub stateful_agent: Vec<StatefulAgentModel>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationModel {
    pub url: String,
    pub projects: Vec<String>,
    pub parallelism: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatefulAgentModel {
    pub max_agent_lifetime: String,
    pub grace_period_time_span: String,
}

#[derive(Default)]
pub struct ManagedPoolResource {
    provider_data: Option<AzureRmProviderData>,
}

fn organization_block() -> NestedBlock {
    NestedBlock::list(
        "azure_devops_organization",
        BlockBuilder::new()
            .description("An Azure DevOps organization the pool serves")
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("The organization URL, e.g. https://dev.azure.com/contoso")
                    .required()
                    .validator(is_https_url())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("projects", common::string_list())
                    .description("Projects allowed to use the pool; all projects when empty")
                    .optional()
                    .validator(ListElementsValidator {
                        inner: Arc::new(validate::project_name()),
                    })
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("parallelism", AttributeType::Number)
                    .description("How many agents the organization may use at once")
                    .optional()
                    .validator(int_between(1, 10000))
                    .build(),
            )
            .build(),
    )
    .required()
}

fn stateful_agent_block() -> NestedBlock {
    NestedBlock::list(
        "stateful_agent",
        BlockBuilder::new()
            .description("Keeps agents between jobs; agents are fresh for every job when absent")
            .attribute(
                AttributeBuilder::new("max_agent_lifetime", AttributeType::String)
                    .description("How long an agent lives, at most 7 days")
                    .optional()
                    .default_value("7.00:00:00")
                    .validator(validate::agent_lifetime())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("grace_period_time_span", AttributeType::String)
                    .description("How long an idle agent is kept before it is removed")
                    .optional()
                    .default_value("00:00:00")
                    .validator(validate::agent_lifetime())
                    .build(),
            )
            .build(),
    )
    .max_items(1)
}

fn expand_organization_profile(organizations: &[OrganizationModel]) -> OrganizationProfile {
    OrganizationProfile::AzureDevOps(AzureDevOpsOrganizationProfile {
        organizations: organizations
            .iter()
            .map(|organization| Organization {
                url: organization.url.clone(),
                projects: optional(&organization.projects),
                parallelism: optional(&organization.parallelism),
            })
            .collect(),
    })
}

fn expand_agent_profile(stateful: &[StatefulAgentModel]) -> AgentProfile {
    expand_singleton(stateful, |agent| {
        AgentProfile::Stateful(StatefulAgentProfile {
            max_agent_lifetime: optional(&agent.max_agent_lifetime),
            grace_period_time_span: optional(&agent.grace_period_time_span),
        })
    })
    .unwrap_or(AgentProfile::Stateless(StatelessAgentProfile {}))
}

fn flatten_organizations(profile: Option<OrganizationProfile>) -> Vec<OrganizationModel> {
    match profile {
        Some(OrganizationProfile::AzureDevOps(profile)) => profile
            .organizations
            .into_iter()
            .map(|organization| OrganizationModel {
                url: organization.url,
                projects: from_optional(organization.projects),
                parallelism: from_optional(organization.parallelism),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn flatten_stateful_agent(profile: Option<AgentProfile>) -> Vec<StatefulAgentModel> {
    match profile {
        Some(AgentProfile::Stateful(agent)) => vec![StatefulAgentModel {
            max_agent_lifetime: from_optional(agent.max_agent_lifetime),
            grace_period_time_span: from_optional(agent.grace_period_time_span),
        }],
        _ => Vec::new(),
    }
}

#[async_trait]
impl ReconciledResource for ManagedPoolResource {
    type Model = ManagedPoolModel;
    type Id = PoolId;
    type Properties = Pool;
    type Patch = PoolUpdate;

    fn resource_type(&self) -> &'static str {
        "azurerm_managed_devops_pool"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a managed DevOps pool")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute("The name of the pool", validate::pool_name()))
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("dev_center_project_id", AttributeType::String)
                    .description("The ID of the dev center project the pool belongs to")
                    .required()
                    .validator(resource_id::<DevCenterProjectId>())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("maximum_concurrency", AttributeType::Number)
                    .description("The maximum number of agents running at the same time")
                    .required()
                    .validator(int_between(1, 10000))
                    .build(),
            )
            .attribute(common::tags_attribute())
            .block(organization_block())
            .block(stateful_agent_block())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &ManagedPoolModel) -> tfsdk::Result<PoolId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(PoolId::new(
            &provider.subscription_id,
            &model.resource_group_name,
            &model.name,
        ))
    }

    fn expand(&self, model: &ManagedPoolModel) -> tfsdk::Result<Pool> {
        let project = DevCenterProjectId::parse(&model.dev_center_project_id)?;
        Ok(Pool {
            location: model.location.clone(),
            tags: common::expand_tags(&model.tags),
            properties: Some(PoolProperties {
                dev_center_project_resource_id: Some(project.to_string()),
                maximum_concurrency: Some(model.maximum_concurrency),
                organization_profile: Some(expand_organization_profile(&model.azure_devops_organization)),
                agent_profile: Some(expand_agent_profile(&model.stateful_agent)),
                provisioning_state: None,
            }),
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &PoolId,
        remote: Pool,
        _prior: &ManagedPoolModel,
    ) -> tfsdk::Result<ManagedPoolModel> {
        let properties = remote.properties.unwrap_or_default();
        let dev_center_project_id = match properties.dev_center_project_resource_id {
            Some(project) => DevCenterProjectId::parse_insensitively(&project)?.to_string(),
            None => String::new(),
        };

        Ok(ManagedPoolModel {
            name: id.pool_name.clone(),
            resource_group_name: id.resource_group_name.clone(),
            location: common::flatten_location(Some(remote.location.as_str())),
            dev_center_project_id,
            maximum_concurrency: from_optional(properties.maximum_concurrency),
            azure_devops_organization: flatten_organizations(properties.organization_profile),
            stateful_agent: flatten_stateful_agent(properties.agent_profile),
            tags: flatten_map(remote.tags),
        })
    }

    fn expand_patch(
        &self,
        model: &ManagedPoolModel,
        changes: &ChangeSet,
        _existing: Pool,
    ) -> tfsdk::Result<PoolUpdate> {
        let mut properties = PoolUpdateProperties::default();
        if changes.contains("dev_center_project_id") {
            let project = DevCenterProjectId::parse(&model.dev_center_project_id)?;
            properties.dev_center_project_resource_id = Some(project.to_string());
        }
        if changes.contains("maximum_concurrency") {
            properties.maximum_concurrency = Some(model.maximum_concurrency);
        }
        if changes.contains("azure_devops_organization") {
            properties.organization_profile =
                Some(expand_organization_profile(&model.azure_devops_organization));
        }
        if changes.contains("stateful_agent") {
            properties.agent_profile = Some(expand_agent_profile(&model.stateful_agent));
        }

        Ok(PoolUpdate {
            tags: if changes.contains("tags") {
                common::expand_tags(&model.tags)
            } else {
                None
            },
            properties: (!properties.is_empty()).then_some(properties),
        })
    }

    async fn get(&self, _ctx: &Context, id: &PoolId) -> Result<Pool, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.devops_infrastructure().pools().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &PoolId,
        properties: Pool,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.devops_infrastructure().pools().create_or_update(id, &properties).await?)
    }

    async fn update(&self, _ctx: &Context, id: &PoolId, patch: PoolUpdate) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.devops_infrastructure().pools().update(id, &patch).await?)
    }

    async fn delete(&self, _ctx: &Context, id: &PoolId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.devops_infrastructure().pools().delete(id).await?)
    }
}
