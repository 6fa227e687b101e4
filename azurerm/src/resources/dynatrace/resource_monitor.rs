//! Dynatrace monitor resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::{expand_enum, expand_singleton, flatten_enum, flatten_map, flatten_singleton, from_optional, optional};
use tfsdk::validator::{string_in_slice, StringIsNotEmptyValidator};
use tfsdk::{
    AttributeBuilder, AttributeType, BlockBuilder, ChangeSet, Completion, Context, NestedBlock,
    ReconciledResource, RemoteError, Schema, SchemaBuilder,
};

use crate::api::dynatrace::monitors::{
    IdentityProperties, ManagedIdentityType, MarketplaceSubscriptionStatus, MonitorProperties,
    MonitorResource, MonitorResourceUpdate, MonitoringStatus, PlanData, UserInfo,
};
use crate::ids::MonitorId;
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorModel {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityModel {
    #[serde(rename = "type")]
    pub identity_type: String,
    pub principal_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanModel {
    pub billing_cycle: String,
    pub plan: String,
    pub usage_type: String,
    pub effective_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserModel {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
}

#[derive(Default)]
pub struct DynatraceMonitorResource {
    provider_data: Option<AzureRmProviderData>,
}

fn identity_block() -> NestedBlock {
    NestedBlock::list(
        "identity",
        BlockBuilder::new()
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("The type of managed identity; only SystemAssigned is supported")
                    .required()
                    .validator(string_in_slice(&["SystemAssigned"], false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("principal_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(AttributeBuilder::new("tenant_id", AttributeType::String).computed().build())
            .build(),
    )
    .required()
    .max_items(1)
    .force_new()
}

fn plan_block() -> NestedBlock {
    NestedBlock::list(
        "plan",
        BlockBuilder::new()
            .attribute(
                AttributeBuilder::new("billing_cycle", AttributeType::String)
                    .description("Billing cycle of the plan")
                    .optional()
                    .default_value("MONTHLY")
                    .validator(string_in_slice(&["MONTHLY", "WEEKLY"], false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("plan", AttributeType::String)
                    .description("The plan details, e.g. azureportalintegration_privatepreview@TIDgmz7xq9ge3py")
                    .required()
                    .validator(StringIsNotEmptyValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("usage_type", AttributeType::String)
                    .description("Usage type of the plan")
                    .optional()
                    .default_value("COMMITTED")
                    .validator(string_in_slice(&["PAYG", "COMMITTED"], false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("effective_date", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build(),
    )
    .required()
    .max_items(1)
    .force_new()
}

fn user_block() -> NestedBlock {
    let field = |name: &str, required: bool| {
        let builder = AttributeBuilder::new(name, AttributeType::String);
        if required {
            builder.required().validator(StringIsNotEmptyValidator).build()
        } else {
            builder.optional().build()
        }
    };
    NestedBlock::list(
        "user",
        BlockBuilder::new()
            .description("Contact details of the Dynatrace account owner")
            .attribute(field("first_name", true))
            .attribute(field("last_name", true))
            .attribute(field("email", true))
            .attribute(field("phone_number", false))
            .attribute(field("country", true))
            .build(),
    )
    .required()
    .max_items(1)
    .force_new()
}

/// The service may return user details partially; missing fields keep their prior value.
fn flatten_user(remote: Option<UserInfo>, prior: &[UserModel]) -> Vec<UserModel> {
    let prior = prior.first().cloned().unwrap_or_default();
    let Some(user) = remote else {
        return if prior == UserModel::default() { Vec::new() } else { vec![prior] };
    };
    let pick = |remote: Option<String>, prior: String| remote.filter(|v| !v.is_empty()).unwrap_or(prior);
    vec![UserModel {
        first_name: pick(user.first_name, prior.first_name),
        last_name: pick(user.last_name, prior.last_name),
        email: pick(user.email_address, prior.email),
        phone_number: pick(user.phone_number, prior.phone_number),
        country: pick(user.country, prior.country),
    }]
}

#[async_trait]
impl ReconciledResource for DynatraceMonitorResource {
    type Model = MonitorModel;
    type Id = MonitorId;
    type Properties = MonitorResource;
    type Patch = MonitorResourceUpdate;

    fn resource_type(&self) -> &'static str {
        "azurerm_dynatrace_monitor"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a Dynatrace monitor")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute("The name of the monitor", validate::monitor_name()))
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("marketplace_subscription", AttributeType::String)
                    .description("Status of the marketplace subscription")
                    .required()
                    .force_new()
                    .validator(string_in_slice(MarketplaceSubscriptionStatus::VALUES, false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("monitoring_enabled", AttributeType::Bool)
                    .description("Whether log and metric monitoring is enabled")
                    .optional()
                    .force_new()
                    .default_value(true)
                    .build(),
            )
            .attribute(common::tags_attribute())
            .block(identity_block())
            .block(plan_block())
            .block(user_block())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &MonitorModel) -> tfsdk::Result<MonitorId> {
        let provider = common::provider(&self.provider_data)?;
        Ok(MonitorId::new(
            &provider.subscription_id,
            &model.resource_group_name,
            &model.name,
        ))
    }

    fn expand(&self, model: &MonitorModel) -> tfsdk::Result<MonitorResource> {
        let monitoring_status = if model.monitoring_enabled {
            MonitoringStatus::Enabled
        } else {
            MonitoringStatus::Disabled
        };

        Ok(MonitorResource {
            location: model.location.clone(),
            tags: common::expand_tags(&model.tags),
            identity: expand_singleton(&model.identity, |identity| IdentityProperties {
                identity_type: expand_enum::<ManagedIdentityType>(&identity.identity_type),
                ..Default::default()
            }),
            properties: MonitorProperties {
                marketplace_subscription_status: expand_enum(&model.marketplace_subscription),
                monitoring_status: Some(monitoring_status),
                plan_data: expand_singleton(&model.plan, |plan| PlanData {
                    billing_cycle: optional(&plan.billing_cycle),
                    effective_date: None,
                    plan_details: optional(&plan.plan),
                    usage_type: optional(&plan.usage_type),
                }),
                user_info: expand_singleton(&model.user, |user| UserInfo {
                    country: optional(&user.country),
                    email_address: optional(&user.email),
                    first_name: optional(&user.first_name),
                    last_name: optional(&user.last_name),
                    phone_number: optional(&user.phone_number),
                }),
                provisioning_state: None,
            },
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &MonitorId,
        remote: MonitorResource,
        prior: &MonitorModel,
    ) -> tfsdk::Result<MonitorModel> {
        let properties = remote.properties;

        Ok(MonitorModel {
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
            user: flatten_user(properties.user_info, &prior.user),
            tags: flatten_map(remote.tags),
        })
    }

    fn expand_patch(
        &self,
        model: &MonitorModel,
        changes: &ChangeSet,
        _existing: MonitorResource,
    ) -> tfsdk::Result<MonitorResourceUpdate> {
        Ok(MonitorResourceUpdate {
            tags: if changes.contains("tags") {
                common::expand_tags(&model.tags)
            } else {
                None
            },
        })
    }

    async fn get(&self, _ctx: &Context, id: &MonitorId) -> Result<MonitorResource, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.dynatrace().monitors().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &MonitorId,
        properties: MonitorResource,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.dynatrace().monitors().create_or_update(id, &properties).await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &MonitorId,
        patch: MonitorResourceUpdate,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.dynatrace().monitors().update(id, &patch).await?)
    }

    async fn delete(&self, _ctx: &Context, id: &MonitorId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.dynatrace().monitors().delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> MonitorModel {
        MonitorModel {
            name: "monitor".to_string(),
            resource_group_name: "rg".to_string(),
            location: "westeurope".to_string(),
            identity: vec![IdentityModel {
                identity_type: "SystemAssigned".to_string(),
                ..Default::default()
            }],
            marketplace_subscription: "Active".to_string(),
            monitoring_enabled: true,
            plan: vec![PlanModel {
                billing_cycle: "MONTHLY".to_string(),
                plan: "azureportalintegration_privatepreview@TIDgmz7xq9ge3py".to_string(),
                usage_type: "COMMITTED".to_string(),
                ..Default::default()
            }],
            user: vec![UserModel {
                first_name: "Alice".to_string(),
                last_name: "Bobab".to_string(),
                email: "alice@example.com".to_string(),
                phone_number: "123456".to_string(),
                country: "westeurope".to_string(),
            }],
            tags: HashMap::new(),
        }
    }

    #[test]
    fn test_expand_uses_wire_names() {
        let resource = DynatraceMonitorResource::default();

        let body = serde_json::to_value(resource.expand(&model()).unwrap()).unwrap();

        assert_eq!(body["identity"], json!({ "type": "SystemAssigned" }));
        assert_eq!(body["properties"]["marketplaceSubscriptionStatus"], "Active");
        assert_eq!(body["properties"]["monitoringStatus"], "Enabled");
        assert_eq!(body["properties"]["planData"]["usageType"], "COMMITTED");
        assert_eq!(body["properties"]["userInfo"]["emailAddress"], "alice@example.com");
        assert_eq!(body["tags"], json!({}));
    }

    #[test]
    fn test_flatten_fills_missing_user_fields_from_prior() {
        let resource = DynatraceMonitorResource::default();
        let remote: MonitorResource = serde_json::from_value(json!({
            "location": "West Europe",
            "identity": { "type": "SystemAssigned", "principalId": "p", "tenantId": "t" },
            "properties": {
                "marketplaceSubscriptionStatus": "Active",
                "monitoringStatus": "Disabled",
                "planData": {
                    "billingCycle": "MONTHLY",
                    "planDetails": "azureportalintegration_privatepreview@TIDgmz7xq9ge3py",
                    "usageType": "COMMITTED",
                    "effectiveDate": "2024-01-01T00:00:00Z"
                },
                "userInfo": { "emailAddress": "alice@example.com", "country": "westeurope" }
            }
        }))
        .unwrap();
        let id = MonitorId::new("00000000-0000-0000-0000-000000000000", "rg", "monitor");

        let flattened = resource.flatten(&id, remote, &model()).unwrap();

        assert_eq!(flattened.location, "westeurope");
        assert_eq!(flattened.identity[0].principal_id, "p");
        assert!(!flattened.monitoring_enabled);
        assert_eq!(flattened.plan[0].effective_date, "2024-01-01T00:00:00Z");
        assert_eq!(flattened.user, model().user);
    }

    #[test]
    fn test_flatten_without_user_info_keeps_prior_user() {
        let remote = MonitorResource {
            location: "westeurope".to_string(),
            ..Default::default()
        };
        let id = MonitorId::new("00000000-0000-0000-0000-000000000000", "rg", "monitor");

        let flattened = DynatraceMonitorResource::default().flatten(&id, remote, &model()).unwrap();
        assert_eq!(flattened.user, model().user);
        assert!(flattened.monitoring_enabled);

        let imported = MonitorResource {
            location: "westeurope".to_string(),
            ..Default::default()
        };
        let flattened = DynatraceMonitorResource::default()
            .flatten(&id, imported, &MonitorModel::default())
            .unwrap();
        assert!(flattened.user.is_empty());
    }

    #[test]
    fn test_expand_flatten_round_trips() {
        let resource = DynatraceMonitorResource::default();
        let id = MonitorId::new("00000000-0000-0000-0000-000000000000", "rg", "monitor");
        let mut full = model();
        full.tags.insert("env".to_string(), "prod".to_string());

        let remote = resource.expand(&full).unwrap();
        assert_eq!(resource.flatten(&id, remote, &MonitorModel::default()).unwrap(), full);

        full.monitoring_enabled = false;
        full.marketplace_subscription = "Suspended".to_string();
        full.user[0].phone_number = String::new();
        let remote = resource.expand(&full).unwrap();
        assert_eq!(resource.flatten(&id, remote, &MonitorModel::default()).unwrap(), full);
    }

    #[test]
    fn test_patch_only_carries_tags() {
        let resource = DynatraceMonitorResource::default();
        let mut updated = model();
        updated.tags.insert("env".to_string(), "prod".to_string());

        let patch = resource
            .expand_patch(&updated, &ChangeSet::from_names(["tags"]), MonitorResource::default())
            .unwrap();
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "tags": { "env": "prod" } }));

        let patch = resource
            .expand_patch(&updated, &ChangeSet::default(), MonitorResource::default())
            .unwrap();
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({}));
    }
}
