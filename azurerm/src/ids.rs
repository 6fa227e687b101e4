//! ARM resource identifiers
//!
//! Every identifier is declared once as a list of segments. Parsing is exact by default;
//! `parse_insensitively` accepts keywords in any case, as ARM sometimes returns them, and
//! formats them back canonically.

use std::fmt;
use tfsdk::identifier::{format_segments, parse_segments};
use tfsdk::{ResourceId, Segment};

macro_rules! arm_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($kind:literal) {
            $($field:ident),+ $(,)?
        }
        segments: $segments:expr;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl $name {
            const SEGMENTS: &'static [Segment] = $segments;

            pub fn new($($field: impl Into<String>),+) -> Self {
                Self {
                    $($field: $field.into(),)+
                }
            }

            pub fn parse_insensitively(input: &str) -> tfsdk::Result<Self> {
                Self::from_segments(input, true)
            }

            fn from_segments(input: &str, insensitively: bool) -> tfsdk::Result<Self> {
                let mut values =
                    parse_segments($kind, input, Self::SEGMENTS, insensitively)?.into_iter();
                Ok(Self {
                    $($field: values.next().unwrap_or_default(),)+
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&format_segments(Self::SEGMENTS, &[$(self.$field.as_str()),+]))
            }
        }

        impl ResourceId for $name {
            fn kind() -> &'static str {
                $kind
            }

            fn parse(input: &str) -> tfsdk::Result<Self> {
                Self::from_segments(input, false)
            }
        }
    };
}

const SUBSCRIPTIONS: Segment = Segment::Static("subscriptions");
const SUBSCRIPTION_ID: Segment = Segment::User("subscriptionId");
const RESOURCE_GROUPS: Segment = Segment::Static("resourceGroups");
const RESOURCE_GROUP_NAME: Segment = Segment::User("resourceGroupName");
const PROVIDERS: Segment = Segment::Static("providers");

arm_id! {
    pub struct ResourceGroupId("Resource Group ID") {
        subscription_id,
        resource_group_name,
    }
    segments: &[SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME];
}

arm_id! {
    pub struct ConnectionId("Connection ID") {
        subscription_id,
        resource_group_name,
        connection_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.Web"), Segment::Static("connections"), Segment::User("connectionName"),
    ];
}

arm_id! {
    /// A managed API offered in one location, e.g. `servicebus` in `westeurope`.
    pub struct ManagedApiId("Managed API ID") {
        subscription_id,
        location_name,
        managed_api_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, PROVIDERS, Segment::Static("Microsoft.Web"),
        Segment::Static("locations"), Segment::User("locationName"),
        Segment::Static("managedApis"), Segment::User("managedApiName"),
    ];
}

arm_id! {
    pub struct MonitorId("Monitor ID") {
        subscription_id,
        resource_group_name,
        monitor_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Dynatrace.Observability"), Segment::Static("monitors"), Segment::User("monitorName"),
    ];
}

arm_id! {
    pub struct KubernetesClusterId("Kubernetes Cluster ID") {
        subscription_id,
        resource_group_name,
        managed_cluster_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.ContainerService"), Segment::Static("managedClusters"),
        Segment::User("managedClusterName"),
    ];
}

arm_id! {
    /// An extension installed on any scope; for this provider, an AKS cluster.
    pub struct ScopedExtensionId("Scoped Extension ID") {
        scope,
        extension_name,
    }
    segments: &[
        Segment::Scope("scope"), PROVIDERS, Segment::Static("Microsoft.KubernetesConfiguration"),
        Segment::Static("extensions"), Segment::User("extensionName"),
    ];
}

arm_id! {
    pub struct DnsResolverId("DNS Resolver ID") {
        subscription_id,
        resource_group_name,
        dns_resolver_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.Network"), Segment::Static("dnsResolvers"), Segment::User("dnsResolverName"),
    ];
}

arm_id! {
    pub struct VirtualNetworkId("Virtual Network ID") {
        subscription_id,
        resource_group_name,
        virtual_network_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.Network"), Segment::Static("virtualNetworks"),
        Segment::User("virtualNetworkName"),
    ];
}

arm_id! {
    pub struct AppServiceId("App Service ID") {
        subscription_id,
        resource_group_name,
        site_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.Web"), Segment::Static("sites"), Segment::User("siteName"),
    ];
}

arm_id! {
    /// A service connector attached to the resource at `resource_uri`.
    pub struct ScopedLinkerId("Scoped Linker ID") {
        resource_uri,
        linker_name,
    }
    segments: &[
        Segment::Scope("resourceUri"), PROVIDERS, Segment::Static("Microsoft.ServiceLinker"),
        Segment::Static("linkers"), Segment::User("linkerName"),
    ];
}

arm_id! {
    pub struct StorageAccountId("Storage Account ID") {
        subscription_id,
        resource_group_name,
        storage_account_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.Storage"), Segment::Static("storageAccounts"),
        Segment::User("storageAccountName"),
    ];
}

arm_id! {
    pub struct KeyVaultId("Key Vault ID") {
        subscription_id,
        resource_group_name,
        vault_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.KeyVault"), Segment::Static("vaults"), Segment::User("vaultName"),
    ];
}

arm_id! {
    pub struct DevCenterProjectId("Dev Center Project ID") {
        subscription_id,
        resource_group_name,
        project_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.DevCenter"), Segment::Static("projects"), Segment::User("projectName"),
    ];
}

arm_id! {
    pub struct PoolId("Pool ID") {
        subscription_id,
        resource_group_name,
        pool_name,
    }
    segments: &[
        SUBSCRIPTIONS, SUBSCRIPTION_ID, RESOURCE_GROUPS, RESOURCE_GROUP_NAME, PROVIDERS,
        Segment::Static("Microsoft.DevOpsInfrastructure"), Segment::Static("pools"), Segment::User("poolName"),
    ];
}

/// Locations compare without case or spaces: `West Europe` is `westeurope`.
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
