//! Common types and utilities for the ARM API

use serde::{Deserialize, Serialize};

/// Error envelope returned by ARM for failed requests and failed operations.
#[derive(Debug, Deserialize)]
pub struct ArmErrorResponse {
    pub error: ArmErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArmErrorDetail {
    pub code: String,
    pub message: String,
}

/// One page of a collection.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// A reference to another ARM resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

tfsdk::string_enum! {
    pub enum ProvisioningState {
        Succeeded => "Succeeded",
        Failed => "Failed",
        Canceled => "Canceled",
        Creating => "Creating",
        Updating => "Updating",
        Deleting => "Deleting",
        Accepted => "Accepted",
    }
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::Canceled
        )
    }
}

/// Reads `properties.provisioningState` from a response body.
pub fn provisioning_state(body: &serde_json::Value) -> Option<ProvisioningState> {
    body.get("properties")
        .and_then(|p| p.get("provisioningState"))
        .and_then(serde_json::Value::as_str)
        .map(ProvisioningState::from)
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every ARM request carries the api-version of the resource type it addresses.
    pub fn api_version(api_version: &str) -> Self {
        Self::new().add("api-version", api_version)
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// `expires_in` arrives as a number from v2 token endpoints and as a string from v1.
pub mod string_or_u64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrU64 {
            String(String),
            U64(u64),
        }

        match StringOrU64::deserialize(deserializer)? {
            StringOrU64::String(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
            StringOrU64::U64(u) => Ok(u),
        }
    }
}
