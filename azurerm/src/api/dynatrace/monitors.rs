//! Dynatrace monitor (Dynatrace.Observability/monitors) operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfsdk::Completion;

use crate::api::common::ProvisioningState;
use crate::api::{ApiError, ArmClient};
use crate::ids::MonitorId;

pub const API_VERSION: &str = "2023-04-27";

tfsdk::string_enum! {
    pub enum ManagedIdentityType {
        SystemAssigned => "SystemAssigned",
        UserAssigned => "UserAssigned",
        SystemAndUserAssigned => "SystemAndUserAssigned",
    }
}

tfsdk::string_enum! {
    pub enum MarketplaceSubscriptionStatus {
        Active => "Active",
        Suspended => "Suspended",
    }
}

tfsdk::string_enum! {
    pub enum MonitoringStatus {
        Enabled => "Enabled",
        Disabled => "Disabled",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityProperties>,
    #[serde(default)]
    pub properties: MonitorProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProperties {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<ManagedIdentityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketplace_subscription_status: Option<MarketplaceSubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_status: Option<MonitoringStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_data: Option<PlanData>,
    /// Write only; reads return it partially or not at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Request body of PATCH /monitors/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

/// Monitors API
pub struct MonitorsApi<'a> {
    client: &'a ArmClient,
}

impl<'a> MonitorsApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET .../providers/Dynatrace.Observability/monitors/{name}
    pub async fn get(&self, id: &MonitorId) -> Result<MonitorResource, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../monitors/{name}
    pub async fn create_or_update(
        &self,
        id: &MonitorId,
        monitor: &MonitorResource,
    ) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, monitor).await
    }

    /// PATCH .../monitors/{name}
    pub async fn update(
        &self,
        id: &MonitorId,
        update: &MonitorResourceUpdate,
    ) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, update).await
    }

    /// DELETE .../monitors/{name}
    pub async fn delete(&self, id: &MonitorId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
