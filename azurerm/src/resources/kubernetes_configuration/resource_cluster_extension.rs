//! Kubernetes cluster extension resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use tfsdk::convert::{expand_singleton, flatten_map, flatten_singleton, from_optional, optional};
use tfsdk::validator::{resource_id, StringIsNotEmptyValidator};
use tfsdk::{
    AttributeBuilder, AttributeType, BlockBuilder, ChangeSet, Completion, Context, NestedBlock,
    ReconciledResource, RemoteError, ResourceId, Schema, SchemaBuilder, SdkError,
};

use crate::api::kubernetes_configuration::extensions::{
    Extension, ExtensionProperties, PatchExtension, PatchExtensionProperties, Plan, Scope,
    ScopeCluster, ScopeNamespace,
};
use crate::ids::{KubernetesClusterId, ScopedExtensionId};
use crate::provider_data::AzureRmProviderData;
use crate::resources::common;
use crate::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterExtensionModel {
    pub name: String,
    pub cluster_id: String,
    pub extension_type: String,
    pub plan: Vec<PlanModel>,
    pub release_train: String,
    pub release_namespace: String,
    pub target_namespace: String,
    pub version: String,
    pub configuration_settings: HashMap<String, String>,
    pub configuration_protected_settings: HashMap<String, String>,
    pub current_version: String,
    pub aks_assigned_identity: Vec<AksAssignedIdentityModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanModel {
    pub name: String,
    pub product: String,
    pub publisher: String,
    pub promotion_code: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AksAssignedIdentityModel {
    #[serde(rename = "type")]
    pub identity_type: String,
    pub principal_id: String,
    pub tenant_id: String,
}

#[derive(Default)]
pub struct ClusterExtensionResource {
    provider_data: Option<AzureRmProviderData>,
}

fn plan_block() -> NestedBlock {
    let required = |name: &str| {
        AttributeBuilder::new(name, AttributeType::String)
            .required()
            .validator(StringIsNotEmptyValidator)
            .build()
    };
    NestedBlock::list(
        "plan",
        BlockBuilder::new()
            .description("The marketplace plan of the extension offer")
            .attribute(required("name"))
            .attribute(required("product"))
            .attribute(required("publisher"))
            .attribute(AttributeBuilder::new("promotion_code", AttributeType::String).optional().build())
            .attribute(AttributeBuilder::new("version", AttributeType::String).optional().build())
            .build(),
    )
    .max_items(1)
    .force_new()
}

fn aks_assigned_identity_type() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Object(HashMap::from([
        ("type".to_string(), AttributeType::String),
        ("principal_id".to_string(), AttributeType::String),
        ("tenant_id".to_string(), AttributeType::String),
    ]))))
}

/// Settings removed from the configuration are sent as null so the service drops them.
fn settings_patch(
    desired: &HashMap<String, String>,
    existing: Option<HashMap<String, String>>,
) -> HashMap<String, Option<String>> {
    let mut patch: HashMap<String, Option<String>> = existing
        .unwrap_or_default()
        .into_keys()
        .filter(|key| !desired.contains_key(key))
        .map(|key| (key, None))
        .collect();
    patch.extend(desired.iter().map(|(k, v)| (k.clone(), Some(v.clone()))));
    patch
}

#[async_trait]
impl ReconciledResource for ClusterExtensionResource {
    type Model = ClusterExtensionModel;
    type Id = ScopedExtensionId;
    type Properties = Extension;
    type Patch = PatchExtension;

    fn resource_type(&self) -> &'static str {
        "azurerm_kubernetes_cluster_extension"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an extension installed on a Kubernetes cluster")
            .attribute(common::id_attribute())
            .attribute(common::name_attribute(
                "The name of the extension",
                validate::extension_name(),
            ))
            .attribute(
                AttributeBuilder::new("cluster_id", AttributeType::String)
                    .description("The ID of the managed Kubernetes cluster")
                    .required()
                    .force_new()
                    .validator(resource_id::<KubernetesClusterId>())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("extension_type", AttributeType::String)
                    .description("The type of extension, e.g. microsoft.flux")
                    .required()
                    .force_new()
                    .validator(StringIsNotEmptyValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("release_train", AttributeType::String)
                    .description("The release train the extension takes versions from")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("release_namespace", AttributeType::String)
                    .description("Namespace for a cluster scoped installation")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("target_namespace", AttributeType::String)
                    .description("Namespace for a namespace scoped installation")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("version", AttributeType::String)
                    .description("Pinned version; minor versions are upgraded automatically when unset")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("configuration_settings", common::string_map())
                    .description("Configuration settings of the extension")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("configuration_protected_settings", common::string_map())
                    .description("Protected configuration settings; never returned by the service")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("current_version", AttributeType::String)
                    .description("The version currently installed")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("aks_assigned_identity", aks_assigned_identity_type())
                    .description("The identity AKS assigned to the extension")
                    .computed()
                    .build(),
            )
            .block(plan_block())
            .build()
    }

    fn configure(&mut self, provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<()> {
        self.provider_data = Some(AzureRmProviderData::from_any(provider_data)?);
        Ok(())
    }

    fn build_id(&self, model: &ClusterExtensionModel) -> tfsdk::Result<ScopedExtensionId> {
        let cluster = KubernetesClusterId::parse(&model.cluster_id)?;
        Ok(ScopedExtensionId::new(cluster.to_string(), &model.name))
    }

    fn validate_model(&self, model: &ClusterExtensionModel) -> tfsdk::Result<()> {
        if !model.release_namespace.is_empty() && !model.target_namespace.is_empty() {
            return Err(SdkError::InvalidConfiguration(
                "only one of `release_namespace` and `target_namespace` can be set".to_string(),
            ));
        }
        Ok(())
    }

    fn expand(&self, model: &ClusterExtensionModel) -> tfsdk::Result<Extension> {
        let scope = if !model.target_namespace.is_empty() {
            Scope {
                namespace: Some(ScopeNamespace {
                    target_namespace: Some(model.target_namespace.clone()),
                }),
                ..Default::default()
            }
        } else {
            Scope {
                cluster: Some(ScopeCluster {
                    release_namespace: optional(&model.release_namespace),
                }),
                ..Default::default()
            }
        };

        Ok(Extension {
            plan: expand_singleton(&model.plan, |plan| Plan {
                name: plan.name.clone(),
                product: plan.product.clone(),
                publisher: plan.publisher.clone(),
                promotion_code: optional(&plan.promotion_code),
                version: optional(&plan.version),
            }),
            properties: Some(ExtensionProperties {
                extension_type: Some(model.extension_type.clone()),
                auto_upgrade_minor_version: Some(model.version.is_empty()),
                release_train: optional(&model.release_train),
                version: optional(&model.version),
                scope: Some(scope),
                configuration_settings: optional(&model.configuration_settings),
                configuration_protected_settings: optional(&model.configuration_protected_settings),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn flatten(
        &self,
        id: &ScopedExtensionId,
        remote: Extension,
        prior: &ClusterExtensionModel,
    ) -> tfsdk::Result<ClusterExtensionModel> {
        let cluster = KubernetesClusterId::parse_insensitively(&id.scope)?;
        let properties = remote.properties.unwrap_or_default();
        let scope = properties.scope.unwrap_or_default();

        // The version is only known to the service when it was pinned.
        let version = if properties.auto_upgrade_minor_version == Some(true) {
            String::new()
        } else {
            from_optional(properties.version)
        };

        Ok(ClusterExtensionModel {
            name: id.extension_name.clone(),
            cluster_id: cluster.to_string(),
            extension_type: from_optional(properties.extension_type),
            plan: flatten_singleton(remote.plan, |plan| PlanModel {
                name: plan.name,
                product: plan.product,
                publisher: plan.publisher,
                promotion_code: from_optional(plan.promotion_code),
                version: from_optional(plan.version),
            }),
            release_train: from_optional(properties.release_train),
            release_namespace: from_optional(scope.cluster.and_then(|c| c.release_namespace)),
            target_namespace: from_optional(scope.namespace.and_then(|n| n.target_namespace)),
            version,
            configuration_settings: flatten_map(properties.configuration_settings),
            configuration_protected_settings: prior.configuration_protected_settings.clone(),
            current_version: from_optional(properties.current_version),
            aks_assigned_identity: flatten_singleton(properties.aks_assigned_identity, |identity| {
                AksAssignedIdentityModel {
                    identity_type: from_optional(identity.identity_type),
                    principal_id: from_optional(identity.principal_id),
                    tenant_id: from_optional(identity.tenant_id),
                }
            }),
        })
    }

    fn expand_patch(
        &self,
        model: &ClusterExtensionModel,
        changes: &ChangeSet,
        existing: Extension,
    ) -> tfsdk::Result<PatchExtension> {
        let existing = existing.properties.unwrap_or_default();
        let mut properties = PatchExtensionProperties::default();

        if changes.contains("version") {
            properties.auto_upgrade_minor_version = Some(model.version.is_empty());
            properties.version = optional(&model.version);
        }
        if changes.contains("release_train") {
            properties.release_train = Some(model.release_train.clone());
        }
        if changes.contains("configuration_settings") {
            properties.configuration_settings = Some(settings_patch(
                &model.configuration_settings,
                existing.configuration_settings,
            ));
        }
        if changes.contains("configuration_protected_settings") {
            properties.configuration_protected_settings =
                Some(model.configuration_protected_settings.clone());
        }

        Ok(PatchExtension { properties })
    }

    async fn get(&self, _ctx: &Context, id: &ScopedExtensionId) -> Result<Extension, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.kubernetes_configuration().extensions().get(id).await?)
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        id: &ScopedExtensionId,
        properties: Extension,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client
            .kubernetes_configuration()
            .extensions()
            .create_or_update(id, &properties)
            .await?)
    }

    async fn update(
        &self,
        _ctx: &Context,
        id: &ScopedExtensionId,
        patch: PatchExtension,
    ) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.kubernetes_configuration().extensions().update(id, &patch).await?)
    }

    async fn delete(&self, _ctx: &Context, id: &ScopedExtensionId) -> Result<Completion, RemoteError> {
        let client = common::client(&self.provider_data)?;
        Ok(client.kubernetes_configuration().extensions().delete(id).await?)
    }
}
