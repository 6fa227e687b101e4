//! Service connection (Microsoft.ServiceLinker/linkers) operations

use serde::{Deserialize, Serialize};
use tfsdk::Completion;

use crate::api::common::ProvisioningState;
use crate::api::{ApiError, ArmClient};
use crate::ids::ScopedLinkerId;

pub const API_VERSION: &str = "2022-05-01";

tfsdk::string_enum! {
    /// The client library the source application uses to reach the target.
    pub enum ClientType {
        None => "none",
        Dotnet => "dotnet",
        Java => "java",
        Python => "python",
        Go => "go",
        Php => "php",
        Ruby => "ruby",
        Django => "django",
        Nodejs => "nodejs",
        SpringBoot => "springBoot",
        KafkaSpringBoot => "kafka-springBoot",
    }
}

tfsdk::string_enum! {
    pub enum VNetSolutionType {
        ServiceEndpoint => "serviceEndpoint",
        PrivateLink => "privateLink",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkerResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<LinkerProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_service: Option<TargetService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<AuthInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(rename = "vNetSolution", skip_serializing_if = "Option::is_none")]
    pub vnet_solution: Option<VNetSolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_store: Option<SecretStore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// The resource the connection points at. Only plain ARM resources are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetService {
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TargetService {
    pub fn azure_resource(id: impl Into<String>) -> Self {
        Self {
            target_type: "AzureResource".to_string(),
            id: Some(id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "authType")]
pub enum AuthInfo {
    #[serde(rename = "secret")]
    Secret(SecretAuthInfo),
    #[serde(rename = "systemAssignedIdentity")]
    SystemAssignedIdentity(SystemAssignedIdentityAuthInfo),
    #[serde(rename = "userAssignedIdentity")]
    UserAssignedIdentity(UserAssignedIdentityAuthInfo),
    #[serde(rename = "servicePrincipalSecret")]
    ServicePrincipalSecret(ServicePrincipalSecretAuthInfo),
    #[serde(rename = "servicePrincipalCertificate")]
    ServicePrincipalCertificate(ServicePrincipalCertificateAuthInfo),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretAuthInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Write only; reads never return the secret value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_info: Option<SecretInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretInfo {
    pub secret_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SecretInfo {
    pub fn raw_value(value: impl Into<String>) -> Self {
        Self {
            secret_type: "rawValue".to_string(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemAssignedIdentityAuthInfo {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignedIdentityAuthInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePrincipalSecretAuthInfo {
    pub client_id: String,
    pub principal_id: String,
    /// Write only; reads return it empty.
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePrincipalCertificateAuthInfo {
    pub client_id: String,
    pub principal_id: String,
    pub certificate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VNetSolution {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub solution_type: Option<VNetSolutionType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_vault_id: Option<String>,
}

/// Request body of PATCH /linkers/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkerPatch {
    pub properties: LinkerProperties,
}

/// Linkers API
pub struct LinkersApi<'a> {
    client: &'a ArmClient,
}

impl<'a> LinkersApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET {resourceUri}/providers/Microsoft.ServiceLinker/linkers/{name}
    pub async fn get(&self, id: &ScopedLinkerId) -> Result<LinkerResource, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../linkers/{name}
    pub async fn create_or_update(
        &self,
        id: &ScopedLinkerId,
        linker: &LinkerResource,
    ) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, linker).await
    }

    /// PATCH .../linkers/{name}
    pub async fn update(&self, id: &ScopedLinkerId, patch: &LinkerPatch) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, patch).await
    }

    /// DELETE .../linkers/{name}
    pub async fn delete(&self, id: &ScopedLinkerId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
