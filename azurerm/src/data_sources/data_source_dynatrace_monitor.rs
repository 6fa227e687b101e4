//! Dynatrace monitor data source implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::{flatten_enum, flatten_map, flatten_singleton, from_optional};
use tfsdk::{
    AttributeBuilder, AttributeType, Context, ReadOnlyResource, RemoteError, Schema, SchemaBuilder,
};

use crate::api::dynatrace::monitors::{MonitorResource, MonitoringStatus};
use crate::ids::MonitorId;
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::resources::dynatrace::resource_monitor::{IdentityModel, PlanModel, UserModel};
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynatraceMonitorDataModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub identity: Vec<IdentityModel>,
    pub marketplace_subscription: String,
    pub monitoring_enabled: bool,
    pub plan: Vec<PlanModel>,
    pub user: Vec<UserModel>,
    pub tags: HashMap<String, String>,
}

#[derive(Default)]
pub struct DynatraceMonitorDataSource {
    provider_data: Option<AzureRmProviderData>,
}

fn object_list(fields: &[&str]) -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Object(
        fields
            .iter()
            .map(|field| (field.to_string(), AttributeType::String))
            .collect(),
    )))
}

#[async_trait]
impl ReadOnlyResource for DynatraceMonitorDataSource {
    type Model = DynatraceMonitorDataModel;
    type Id = MonitorId;
    type Properties = MonitorResource;

    fn resource_type(&self) -> &'static str {
        "azurerm_dynatrace_monitor"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Gets information about an existing Dynatrace monitor")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the monitor")
                    .required()
                    .validator(validate::monitor_name())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group_name", AttributeType::String)
                    .description("The name of the resource group the monitor lives in")
                    .required()
                    .validator(validate::resource_group_name())
                    .build(),
            )
            .attribute(common::computed_location_attribute())
            .attribute(
                AttributeBuilder::new("identity", object_list(&["type", "principal_id", "tenant_id"]))
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("marketplace_subscription", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("monitoring_enabled", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "plan",
                    object_list(&["billing_cycle", "plan", "usage_type", "effective_date"]),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "user",
                    object_list(&["first_name", "last_name", "email", "phone_number", "country"]),
                )
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

    fn build_id(&self, config: &DynatraceMonitorDataModel) -> tfsdk::Result<MonitorId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(MonitorId::new(
            &provider.subscription_id,
            &config.resource_group_name,
            &config.name,
        ))
    }

    fn flatten(
        &self,
        id: &MonitorId,
        remote: MonitorResource,
        _config: &DynatraceMonitorDataModel,
    ) -> tfsdk::Result<DynatraceMonitorDataModel> {
        let properties = remote.properties;
        Ok(DynatraceMonitorDataModel {
            name: id.monitor_name.clone(),
            resource_group_name: id.resource_group_name.clone(),
            location: common::flatten_location(Some(remote.location.as_str())),
            identity: flatten_singleton(remote.identity, |identity| IdentityModel {
                identity_type: flatten_enum(identity.identity_type.as_ref()),
                principal_id: from_optional(identity.principal_id),
                tenant_id: from_optional(identity.tenant_id),
            }),
            marketplace_subscription: flatten_enum(properties.marketplace_subscription_status.as_ref()),
            monitoring_enabled: !matches!(properties.monitoring_status, Some(MonitoringStatus::Disabled)),
            plan: flatten_singleton(properties.plan_data, |plan| PlanModel {
                billing_cycle: from_optional(plan.billing_cycle),
                plan: from_optional(plan.plan_details),
                usage_type: from_optional(plan.usage_type),
                effective_date: from_optional(plan.effective_date),
            }),
            user: flatten_singleton(properties.user_info, |user| UserModel {
                first_name: from_optional(user.first_name),
                last_name: from_optional(user.last_name),
                email: from_optional(user.email_address),
                phone_number: from_optional(user.phone_number),
                country: from_optional(user.country),
            }),
            tags: flatten_map(remote.tags),
        })
    }

    async fn get(&self, _ctx: &Context, id: &MonitorId) -> Result<MonitorResource, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.dynatrace().monitors().get(id).await?)
    }
}
