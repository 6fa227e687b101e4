//! Cluster extension (Microsoft.KubernetesConfiguration/extensions) operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfsdk::Completion;

use crate::api::common::ProvisioningState;
use crate::api::{ApiError, ArmClient};
use crate::ids::ScopedExtensionId;

pub const API_VERSION: &str = "2022-11-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ExtensionProperties>,
}

/// Marketplace plan of an extension offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,
    pub product: String,
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_minor_version: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_train: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_settings: Option<HashMap<String, String>>,
    /// Write only; reads never return protected settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_protected_settings: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aks_assigned_identity: Option<AksAssignedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Where the extension is installed: cluster wide or into one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ScopeCluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<ScopeNamespace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeNamespace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AksAssignedIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<String>,
}

/// Request body of PATCH /extensions/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchExtension {
    pub properties: PatchExtensionProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchExtensionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_minor_version: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_train: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// A `None` value removes the setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_settings: Option<HashMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_protected_settings: Option<HashMap<String, String>>,
}

/// Extensions API
pub struct ExtensionsApi<'a> {
    client: &'a ArmClient,
}

impl<'a> ExtensionsApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET {scope}/providers/Microsoft.KubernetesConfiguration/extensions/{name}
    pub async fn get(&self, id: &ScopedExtensionId) -> Result<Extension, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../extensions/{name}
    pub async fn create_or_update(
        &self,
        id: &ScopedExtensionId,
        extension: &Extension,
    ) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, extension).await
    }

    /// PATCH .../extensions/{name}
    pub async fn update(
        &self,
        id: &ScopedExtensionId,
        patch: &PatchExtension,
    ) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, patch).await
    }

    /// DELETE .../extensions/{name}
    pub async fn delete(&self, id: &ScopedExtensionId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
