//! DNS resolver (Microsoft.Network/dnsResolvers) operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfsdk::Completion;

use crate::api::common::{ProvisioningState, SubResource};
use crate::api::{ApiError, ArmClient};
use crate::ids::DnsResolverId;

pub const API_VERSION: &str = "2022-07-01";

tfsdk::string_enum! {
    pub enum DnsResolverState {
        Connected => "Connected",
        Disconnected => "Disconnected",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsResolver {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub properties: DnsResolverProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsResolverProperties {
    #[serde(default)]
    pub virtual_network: SubResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_resolver_state: Option<DnsResolverState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
}

/// Request body of PATCH /dnsResolvers/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DnsResolverPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

/// DNS resolvers API
pub struct DnsResolversApi<'a> {
    client: &'a ArmClient,
}

impl<'a> DnsResolversApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET .../providers/Microsoft.Network/dnsResolvers/{name}
    pub async fn get(&self, id: &DnsResolverId) -> Result<DnsResolver, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../dnsResolvers/{name}
    pub async fn create_or_update(
        &self,
        id: &DnsResolverId,
        resolver: &DnsResolver,
    ) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, resolver).await
    }

    /// PATCH .../dnsResolvers/{name}
    pub async fn update(
        &self,
        id: &DnsResolverId,
        patch: &DnsResolverPatch,
    ) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, patch).await
    }

    /// DELETE .../dnsResolvers/{name}
    pub async fn delete(&self, id: &DnsResolverId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
