//! Managed DevOps pool (Microsoft.DevOpsInfrastructure/pools) operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfsdk::Completion;

use crate::api::common::ProvisioningState;
use crate::api::{ApiError, ArmClient};
use crate::ids::PoolId;

pub const API_VERSION: &str = "2025-01-21";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PoolProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_center_project_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_profile: Option<OrganizationProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_profile: Option<AgentProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OrganizationProfile {
    AzureDevOps(AzureDevOpsOrganizationProfile),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureDevOpsOrganizationProfile {
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub url: String,
    /// Empty means every project in the organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i64>,
}

/// Stateful agents are reused between jobs; stateless agents are fresh for every job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AgentProfile {
    Stateful(StatefulAgentProfile),
    Stateless(StatelessAgentProfile),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulAgentProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_agent_lifetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_time_span: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatelessAgentProfile {}

/// Request body of PATCH /pools/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PoolUpdateProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolUpdateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_center_project_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_profile: Option<OrganizationProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_profile: Option<AgentProfile>,
}

impl PoolUpdateProperties {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Pools API
pub struct PoolsApi<'a> {
    client: &'a ArmClient,
}

impl<'a> PoolsApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET .../providers/Microsoft.DevOpsInfrastructure/pools/{name}
    pub async fn get(&self, id: &PoolId) -> Result<Pool, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../pools/{name}
    pub async fn create_or_update(&self, id: &PoolId, pool: &Pool) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, pool).await
    }

    /// PATCH .../pools/{name}
    pub async fn update(&self, id: &PoolId, update: &PoolUpdate) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, update).await
    }

    /// DELETE .../pools/{name}
    pub async fn delete(&self, id: &PoolId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profiles_are_tagged_by_kind() {
        let properties = PoolProperties {
            maximum_concurrency: Some(2),
            organization_profile: Some(OrganizationProfile::AzureDevOps(AzureDevOpsOrganizationProfile {
                organizations: vec![Organization {
                    url: "https://dev.azure.com/contoso".to_string(),
                    projects: Some(vec!["web".to_string()]),
                    parallelism: Some(1),
                }],
            })),
            agent_profile: Some(AgentProfile::Stateless(StatelessAgentProfile {})),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&properties).unwrap(),
            json!({
                "maximumConcurrency": 2,
                "organizationProfile": {
                    "kind": "AzureDevOps",
                    "organizations": [
                        { "url": "https://dev.azure.com/contoso", "projects": ["web"], "parallelism": 1 }
                    ]
                },
                "agentProfile": { "kind": "Stateless" }
            })
        );
    }

    #[test]
    fn stateful_profile_round_trips() {
        let body = json!({
            "kind": "Stateful",
            "maxAgentLifetime": "7.00:00:00",
            "gracePeriodTimeSpan": "00:10:00",
            "resourcePredictionsProfile": { "kind": "Automatic" }
        });

        let profile: AgentProfile = serde_json::from_value(body).unwrap();
        assert_eq!(
            profile,
            AgentProfile::Stateful(StatefulAgentProfile {
                max_agent_lifetime: Some("7.00:00:00".to_string()),
                grace_period_time_span: Some("00:10:00".to_string()),
            })
        );
    }

    #[test]
    fn unknown_organization_kinds_are_tolerated() {
        let profile: OrganizationProfile =
            serde_json::from_value(json!({ "kind": "GitHub", "organizations": [] })).unwrap();
        assert_eq!(profile, OrganizationProfile::Unknown);
    }
}
