//! Provider configuration: Azure clouds and the endpoints they use
//!
//! Every provider attribute falls back to an `ARM_*` environment variable when the
//! provider block leaves it unset.

use tfsdk::{Diagnostics, Dynamic, DynamicValue};

/// An Azure cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Public,
    UsGovernment,
    China,
}

impl Environment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "" | "public" => Some(Environment::Public),
            "usgovernment" => Some(Environment::UsGovernment),
            "china" => Some(Environment::China),
            _ => None,
        }
    }

    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            Environment::Public => "https://management.azure.com",
            Environment::UsGovernment => "https://management.usgovcloudapi.net",
            Environment::China => "https://management.chinacloudapi.cn",
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            Environment::Public => "https://login.microsoftonline.com",
            Environment::UsGovernment => "https://login.microsoftonline.us",
            Environment::China => "https://login.chinacloudapi.cn",
        }
    }
}

/// How the provider authenticates against Resource Manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

/// The resolved provider block, environment fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub credentials: Credentials,
    pub resource_manager_endpoint: String,
    pub authority_host: String,
}

fn setting(config: &DynamicValue, attribute: &str, env_var: &str) -> Option<String> {
    config
        .get(attribute)
        .and_then(Dynamic::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
}

fn required(
    config: &DynamicValue,
    attribute: &str,
    env_var: &str,
    when: &str,
    diagnostics: &mut Diagnostics,
) -> String {
    setting(config, attribute, env_var).unwrap_or_else(|| {
        diagnostics.add_error(
            format!(
                "{} is required{} (set in provider config or {} env var)",
                attribute, when, env_var
            ),
            "",
        );
        String::new()
    })
}

impl ProviderConfig {
    /// Resolves the provider block, reporting every missing or invalid setting.
    pub fn resolve(config: &DynamicValue) -> Result<Self, Diagnostics> {
        let mut diagnostics = Diagnostics::new();

        let subscription_id =
            required(config, "subscription_id", "ARM_SUBSCRIPTION_ID", "", &mut diagnostics);
        if !subscription_id.is_empty() && uuid::Uuid::parse_str(&subscription_id).is_err() {
            diagnostics.add_error(
                "subscription_id must be a UUID",
                format!("Got {:?}", subscription_id),
            );
        }

        let environment_name = setting(config, "environment", "ARM_ENVIRONMENT").unwrap_or_default();
        let environment = Environment::from_name(&environment_name).unwrap_or_else(|| {
            diagnostics.add_error(
                "environment must be one of public, usgovernment or china",
                format!("Got {:?}", environment_name),
            );
            Environment::Public
        });

        let credentials = match setting(config, "access_token", "ARM_ACCESS_TOKEN") {
            Some(token) => Credentials::AccessToken(token),
            None => {
                let when = " when no access_token is set";
                Credentials::ClientSecret {
                    tenant_id: required(config, "tenant_id", "ARM_TENANT_ID", when, &mut diagnostics),
                    client_id: required(config, "client_id", "ARM_CLIENT_ID", when, &mut diagnostics),
                    client_secret: required(
                        config,
                        "client_secret",
                        "ARM_CLIENT_SECRET",
                        when,
                        &mut diagnostics,
                    ),
                }
            }
        };

        let resource_manager_endpoint =
            setting(config, "resource_manager_endpoint", "ARM_RESOURCE_MANAGER_ENDPOINT")
                .unwrap_or_else(|| environment.resource_manager_endpoint().to_string());
        let authority_host = setting(config, "authority_host", "ARM_AUTHORITY_HOST")
            .unwrap_or_else(|| environment.authority_host().to_string());

        if diagnostics.has_errors() {
            return Err(diagnostics);
        }

        Ok(Self {
            subscription_id,
            credentials,
            resource_manager_endpoint: resource_manager_endpoint.trim_end_matches('/').to_string(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SUB: &str = "00000000-0000-0000-0000-000000000000";
    const ENV_VARS: &[&str] = &[
        "ARM_SUBSCRIPTION_ID",
        "ARM_TENANT_ID",
        "ARM_CLIENT_ID",
        "ARM_CLIENT_SECRET",
        "ARM_ACCESS_TOKEN",
        "ARM_ENVIRONMENT",
        "ARM_RESOURCE_MANAGER_ENDPOINT",
        "ARM_AUTHORITY_HOST",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn summaries(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.errors.iter().map(|d| d.summary.clone()).collect()
    }

    #[test]
    #[serial]
    fn block_values_win_over_environment() {
        clear_env();
        std::env::set_var("ARM_SUBSCRIPTION_ID", "11111111-1111-1111-1111-111111111111");
        std::env::set_var("ARM_ACCESS_TOKEN", "from-env");

        let config = ProviderConfig::resolve(&DynamicValue::object([
            ("subscription_id", SUB),
            ("environment", "usgovernment"),
        ]))
        .unwrap();

        assert_eq!(config.subscription_id, SUB);
        assert_eq!(config.credentials, Credentials::AccessToken("from-env".to_string()));
        assert_eq!(config.resource_manager_endpoint, "https://management.usgovcloudapi.net");
        assert_eq!(config.authority_host, "https://login.microsoftonline.us");
        clear_env();
    }

    #[test]
    #[serial]
    fn client_secret_needs_tenant_and_client() {
        clear_env();
        std::env::set_var("ARM_SUBSCRIPTION_ID", SUB);
        std::env::set_var("ARM_CLIENT_SECRET", "secret");

        let diagnostics = ProviderConfig::resolve(&DynamicValue::null()).unwrap_err();
        assert_eq!(
            summaries(&diagnostics),
            vec![
                "tenant_id is required when no access_token is set (set in provider config or ARM_TENANT_ID env var)",
                "client_id is required when no access_token is set (set in provider config or ARM_CLIENT_ID env var)",
            ]
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn subscription_is_required_and_a_uuid() {
        clear_env();
        std::env::set_var("ARM_ACCESS_TOKEN", "token");

        let diagnostics = ProviderConfig::resolve(&DynamicValue::null()).unwrap_err();
        assert_eq!(
            summaries(&diagnostics),
            vec!["subscription_id is required (set in provider config or ARM_SUBSCRIPTION_ID env var)"]
        );

        let diagnostics =
            ProviderConfig::resolve(&DynamicValue::object([("subscription_id", "abc")])).unwrap_err();
        assert_eq!(summaries(&diagnostics), vec!["subscription_id must be a UUID"]);
        clear_env();
    }

    #[test]
    #[serial]
    fn endpoints_can_be_overridden() {
        clear_env();
        std::env::set_var("ARM_RESOURCE_MANAGER_ENDPOINT", "http://127.0.0.1:1234/");

        let config = ProviderConfig::resolve(&DynamicValue::object([
            ("subscription_id", SUB),
            ("tenant_id", "t"),
            ("client_id", "c"),
            ("client_secret", "s"),
        ]))
        .unwrap();

        assert_eq!(config.resource_manager_endpoint, "http://127.0.0.1:1234");
        assert_eq!(config.authority_host, "https://login.microsoftonline.com");
        assert!(matches!(config.credentials, Credentials::ClientSecret { .. }));

        let diagnostics = ProviderConfig::resolve(&DynamicValue::object([
            ("subscription_id", SUB),
            ("access_token", "x"),
            ("environment", "germany"),
        ]))
        .unwrap_err();
        assert_eq!(
            summaries(&diagnostics),
            vec!["environment must be one of public, usgovernment or china"]
        );
        clear_env();
    }

    #[test]
    fn environments_by_name() {
        assert_eq!(Environment::from_name(""), Some(Environment::Public));
        assert_eq!(Environment::from_name("USGovernment"), Some(Environment::UsGovernment));
        assert_eq!(Environment::from_name("china"), Some(Environment::China));
        assert_eq!(Environment::from_name("germany"), None);

        assert_eq!(
            Environment::China.resource_manager_endpoint(),
            "https://management.chinacloudapi.cn"
        );
        assert_eq!(
            Environment::Public.authority_host(),
            "https://login.microsoftonline.com"
        );
    }
}
