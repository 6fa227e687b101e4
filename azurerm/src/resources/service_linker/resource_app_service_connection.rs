//! App service connection resource implementation
//!
//! A service connector (linker) attached to an app service. Secrets in the
//! `authentication` block are write only: every read keeps them from the prior state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tfsdk::convert::{expand_enum, expand_singleton, flatten_enum, flatten_singleton, from_optional, optional};
use tfsdk::validator::{resource_id, string_in_slice, StringIsNotEmptyValidator};
use tfsdk::{
    AttributeBuilder, AttributeType, BlockBuilder, ChangeSet, Completion, Context, NestedBlock,
    ReconciledResource, RemoteError, ResourceId, Schema, SchemaBuilder, SdkError,
};

use crate::api::service_linker::linkers::{
    AuthInfo, ClientType, LinkerPatch, LinkerProperties, LinkerResource, SecretAuthInfo,
    SecretInfo, SecretStore, ServicePrincipalCertificateAuthInfo, ServicePrincipalSecretAuthInfo,
    SystemAssignedIdentityAuthInfo, TargetService, UserAssignedIdentityAuthInfo, VNetSolution,
    VNetSolutionType,
};
use crate::ids::{AppServiceId, KeyVaultId, ScopedLinkerId, StorageAccountId};
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

const BLOB_SERVICE_SUFFIX: &str = "/blobServices/default";

const AUTH_SECRET: &str = "secret";
const AUTH_SYSTEM_IDENTITY: &str = "systemAssignedIdentity";
const AUTH_USER_IDENTITY: &str = "userAssignedIdentity";
const AUTH_SERVICE_PRINCIPAL_SECRET: &str = "servicePrincipalSecret";
const AUTH_SERVICE_PRINCIPAL_CERTIFICATE: &str = "servicePrincipalCertificate";

const AUTH_TYPES: &[&str] = &[
    AUTH_SECRET,
    AUTH_SYSTEM_IDENTITY,
    AUTH_USER_IDENTITY,
    AUTH_SERVICE_PRINCIPAL_SECRET,
    AUTH_SERVICE_PRINCIPAL_CERTIFICATE,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppServiceConnectionModel {
    pub name: String,
    pub app_service_id: String,
    pub target_resource_id: String,
    pub client_type: String,
    pub vnet_solution: String,
    pub authentication: Vec<AuthenticationModel>,
    pub secret_store: Vec<SecretStoreModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationModel {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub name: String,
    pub secret: String,
    pub client_id: String,
    pub principal_id: String,
    pub subscription_id: String,
    pub certificate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretStoreModel {
    pub key_vault_id: String,
}

#[derive(Default)]
pub struct AppServiceConnectionResource {
    provider_data: Option<AzureRmProviderData>,
}

/// Storage accounts are connected through their blob service.
pub fn expand_target_resource_id(target: &str) -> String {
    match StorageAccountId::parse(target) {
        Ok(account) => format!("{}{}", account, BLOB_SERVICE_SUFFIX),
        Err(_) => target.to_string(),
    }
}

pub fn flatten_target_resource_id(target: &str) -> String {
    let split = target.len().checked_sub(BLOB_SERVICE_SUFFIX.len());
    if let Some(split) = split.filter(|split| target.is_char_boundary(*split)) {
        let (prefix, suffix) = target.split_at(split);
        if suffix.eq_ignore_ascii_case(BLOB_SERVICE_SUFFIX) {
            if let Ok(account) = StorageAccountId::parse_insensitively(prefix) {
                return account.to_string();
            }
        }
    }
    target.to_string()
}

fn authentication_block() -> NestedBlock {
    let optional_string = |name: &str| AttributeBuilder::new(name, AttributeType::String).optional();
    NestedBlock::list(
        "authentication",
        BlockBuilder::new()
            .description("How the app service authenticates against the target")
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("The authentication type")
                    .required()
                    .validator(string_in_slice(AUTH_TYPES, false))
                    .build(),
            )
            .attribute(optional_string("name").description("Username for secret authentication").build())
            .attribute(
                optional_string("secret")
                    .description("Password or service principal secret; never returned by the service")
                    .sensitive()
                    .build(),
            )
            .attribute(optional_string("client_id").build())
            .attribute(optional_string("principal_id").build())
            .attribute(optional_string("subscription_id").build())
            .attribute(
                optional_string("certificate")
                    .description("Service principal certificate; never returned by the service")
                    .sensitive()
                    .build(),
            )
            .build(),
    )
    .required()
    .max_items(1)
}

fn secret_store_block() -> NestedBlock {
    NestedBlock::list(
        "secret_store",
        BlockBuilder::new()
            .attribute(
                AttributeBuilder::new("key_vault_id", AttributeType::String)
                    .description("The key vault the connection secrets are stored in")
                    .required()
                    .validator(resource_id::<KeyVaultId>())
                    .build(),
            )
            .build(),
    )
    .max_items(1)
}

fn validate_authentication(auth: &AuthenticationModel) -> tfsdk::Result<()> {
    let required: Vec<(&str, &str)> = match auth.auth_type.as_str() {
        AUTH_USER_IDENTITY => vec![
            ("client_id", auth.client_id.as_str()),
            ("subscription_id", auth.subscription_id.as_str()),
        ],
        AUTH_SERVICE_PRINCIPAL_SECRET => vec![
            ("client_id", auth.client_id.as_str()),
            ("principal_id", auth.principal_id.as_str()),
            ("secret", auth.secret.as_str()),
        ],
        AUTH_SERVICE_PRINCIPAL_CERTIFICATE => vec![
            ("client_id", auth.client_id.as_str()),
            ("principal_id", auth.principal_id.as_str()),
            ("certificate", auth.certificate.as_str()),
        ],
        _ => Vec::new(),
    };
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(SdkError::InvalidConfiguration(format!(
            "`{}` must be set when the authentication type is `{}`",
            missing.join("`, `"),
            auth.auth_type
        )));
    }
    if auth.auth_type == AUTH_SECRET && auth.name.is_empty() != auth.secret.is_empty() {
        return Err(SdkError::InvalidConfiguration(
            "`name` and `secret` must be set together for secret authentication".to_string(),
        ));
    }
    Ok(())
}

fn expand_auth_info(auth: &AuthenticationModel) -> AuthInfo {
    match auth.auth_type.as_str() {
        AUTH_SECRET => AuthInfo::Secret(SecretAuthInfo {
            name: optional(&auth.name),
            secret_info: optional(&auth.secret).map(SecretInfo::raw_value),
        }),
        AUTH_USER_IDENTITY => AuthInfo::UserAssignedIdentity(UserAssignedIdentityAuthInfo {
            client_id: optional(&auth.client_id),
            subscription_id: optional(&auth.subscription_id),
        }),
        AUTH_SERVICE_PRINCIPAL_SECRET => AuthInfo::ServicePrincipalSecret(ServicePrincipalSecretAuthInfo {
            client_id: auth.client_id.clone(),
            principal_id: auth.principal_id.clone(),
            secret: auth.secret.clone(),
        }),
        AUTH_SERVICE_PRINCIPAL_CERTIFICATE => {
            AuthInfo::ServicePrincipalCertificate(ServicePrincipalCertificateAuthInfo {
                client_id: auth.client_id.clone(),
                principal_id: auth.principal_id.clone(),
                certificate: auth.certificate.clone(),
            })
        }
        _ => AuthInfo::SystemAssignedIdentity(SystemAssignedIdentityAuthInfo {}),
    }
}

fn flatten_auth_info(remote: Option<AuthInfo>, prior: &[AuthenticationModel]) -> Vec<AuthenticationModel> {
    let prior = prior.first().cloned().unwrap_or_default();
    let flattened = match remote {
        None | Some(AuthInfo::Unknown) => prior,
        Some(AuthInfo::Secret(secret)) => AuthenticationModel {
            auth_type: AUTH_SECRET.to_string(),
            name: secret.name.unwrap_or(prior.name),
            secret: prior.secret,
            ..Default::default()
        },
        Some(AuthInfo::SystemAssignedIdentity(_)) => AuthenticationModel {
            auth_type: AUTH_SYSTEM_IDENTITY.to_string(),
            ..Default::default()
        },
        Some(AuthInfo::UserAssignedIdentity(identity)) => AuthenticationModel {
            auth_type: AUTH_USER_IDENTITY.to_string(),
            client_id: from_optional(identity.client_id),
            subscription_id: from_optional(identity.subscription_id),
            ..Default::default()
        },
        Some(AuthInfo::ServicePrincipalSecret(principal)) => AuthenticationModel {
            auth_type: AUTH_SERVICE_PRINCIPAL_SECRET.to_string(),
            client_id: principal.client_id,
            principal_id: principal.principal_id,
            secret: prior.secret,
            ..Default::default()
        },
        Some(AuthInfo::ServicePrincipalCertificate(principal)) => AuthenticationModel {
            auth_type: AUTH_SERVICE_PRINCIPAL_CERTIFICATE.to_string(),
            client_id: principal.client_id,
            principal_id: principal.principal_id,
            certificate: prior.certificate,
            ..Default::default()
        },
    };
    if flattened == AuthenticationModel::default() {
        Vec::new()
    } else {
        vec![flattened]
    }
}

fn expand_vnet_solution(value: &str) -> Option<VNetSolution> {
    expand_enum::<VNetSolutionType>(value).map(|solution_type| VNetSolution {
        solution_type: Some(solution_type),
    })
}

fn expand_secret_store(stores: &[SecretStoreModel]) -> Option<SecretStore> {
    expand_singleton(stores, |store| SecretStore {
        key_vault_id: optional(&store.key_vault_id),
    })
}

#[async_trait]
impl ReconciledResource for AppServiceConnectionResource {
    type Model = AppServiceConnectionModel;
    type Id = ScopedLinkerId;
    type Properties = LinkerResource;
    type Patch = LinkerPatch;

    fn resource_type(&self) -> &'static str {
        "azurerm_app_service_connection"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a service connection from an app service to a target resource")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute("The name of the service connection", validate::linker_name()))
            .attribute(
                AttributeBuilder::new("app_service_id", AttributeType::String)
                    .description("The ID of the app service the connection belongs to")
                    .required()
                    .force_new()
                    .validator(resource_id::<AppServiceId>())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("target_resource_id", AttributeType::String)
                    .description("The ID of the resource the app service connects to")
                    .required()
                    .validator(StringIsNotEmptyValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_type", AttributeType::String)
                    .description("The client library the application uses")
                    .optional()
                    .default_value("none")
                    .validator(string_in_slice(ClientType::VALUES, false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vnet_solution", AttributeType::String)
                    .description("How the connection reaches a target inside a virtual network")
                    .optional()
                    .validator(string_in_slice(VNetSolutionType::VALUES, false))
                    .build(),
            )
            .block(authentication_block())
            .block(secret_store_block())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &AppServiceConnectionModel) -> tfsdk::Result<ScopedLinkerId> {
        let app_service = AppServiceId::parse(&model.app_service_id)?;
        Ok(ScopedLinkerId::new(app_service.to_string(), &model.name))
    }

    fn validate_model(&self, model: &AppServiceConnectionModel) -> tfsdk::Result<()> {
        model.authentication.iter().try_for_each(validate_authentication)
    }

    fn expand(&self, model: &AppServiceConnectionModel) -> tfsdk::Result<LinkerResource> {
        Ok(LinkerResource {
            properties: Some(LinkerProperties {
                target_service: Some(TargetService::azure_resource(expand_target_resource_id(
                    &model.target_resource_id,
                ))),
                auth_info: expand_singleton(&model.authentication, expand_auth_info),
                client_type: expand_enum(&model.client_type),
                vnet_solution: expand_vnet_solution(&model.vnet_solution),
                secret_store: expand_secret_store(&model.secret_store),
                provisioning_state: None,
            }),
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &ScopedLinkerId,
        remote: LinkerResource,
        prior: &AppServiceConnectionModel,
    ) -> tfsdk::Result<AppServiceConnectionModel> {
        let app_service = AppServiceId::parse_insensitively(&id.resource_uri)?;
        let properties = remote.properties.unwrap_or_default();

        let target_resource_id = match properties.target_service.and_then(|t| t.id) {
            Some(target) => flatten_target_resource_id(&target),
            None => prior.target_resource_id.clone(),
        };

        Ok(AppServiceConnectionModel {
            name: id.linker_name.clone(),
            app_service_id: app_service.to_string(),
            target_resource_id,
            client_type: flatten_enum(Some(&properties.client_type.unwrap_or(ClientType::None))),
            vnet_solution: flatten_enum(properties.vnet_solution.and_then(|v| v.solution_type).as_ref()),
            authentication: flatten_auth_info(properties.auth_info, &prior.authentication),
            secret_store: flatten_singleton(
                properties.secret_store.filter(|store| store.key_vault_id.is_some()),
                |store| SecretStoreModel {
                    key_vault_id: from_optional(store.key_vault_id),
                },
            ),
        })
    }

    fn expand_patch(
        &self,
        model: &AppServiceConnectionModel,
        changes: &ChangeSet,
        _existing: LinkerResource,
    ) -> tfsdk::Result<LinkerPatch> {
        let mut properties = LinkerProperties::default();
        if changes.contains("target_resource_id") {
            properties.target_service = Some(TargetService::azure_resource(expand_target_resource_id(
                &model.target_resource_id,
            )));
        }
        if changes.contains("authentication") {
            properties.auth_info = expand_singleton(&model.authentication, expand_auth_info);
        }
        if changes.contains("client_type") {
            properties.client_type = expand_enum(&model.client_type);
        }
        if changes.contains("vnet_solution") {
            properties.vnet_solution = expand_vnet_solution(&model.vnet_solution);
        }
        if changes.contains("secret_store") {
            properties.secret_store = Some(expand_secret_store(&model.secret_store).unwrap_or_default());
        }
        Ok(LinkerPatch { properties })
    }

    async fn get(&self, _ctx: &Context, id: &ScopedLinkerId) -> Result<LinkerResource, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.service_linker().linkers().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &ScopedLinkerId,
        properties: LinkerResource,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.service_linker().linkers().create_or_update(id, &properties).await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &ScopedLinkerId,
        patch: LinkerPatch,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.service_linker().linkers().update(id, &patch).await?)
    }

    /// The linker lingers after the delete is accepted; wait until reads stop finding it.
    async fn delete(&self, _ctx: &Context, id: &ScopedLinkerId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        client.service_linker().linkers().delete(id).await?;
        Ok(Completion::WaitForGone)
    }
}
