//! API connection (Microsoft.Web/connections) operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfsdk::Completion;

use crate::api::{ApiError, ArmClient};
use crate::ids::ConnectionId;

pub const API_VERSION: &str = "2016-06-01";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConnection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ApiConnectionProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConnectionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Write only; the service never returns parameter values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_values: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Request body of PATCH /connections/{name}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiConnectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ApiConnectionPatchProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConnectionPatchProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Connections API
pub struct ConnectionsApi<'a> {
    client: &'a ArmClient,
}

impl<'a> ConnectionsApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// GET /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Web/connections/{name}
    pub async fn get(&self, id: &ConnectionId) -> Result<ApiConnection, ApiError> {
        self.client.get(&id.to_string(), API_VERSION).await
    }

    /// PUT .../connections/{name}
    pub async fn create_or_update(
        &self,
        id: &ConnectionId,
        connection: &ApiConnection,
    ) -> Result<Completion, ApiError> {
        self.client.put(&id.to_string(), API_VERSION, connection).await
    }

    /// PATCH .../connections/{name}
    pub async fn update(
        &self,
        id: &ConnectionId,
        patch: &ApiConnectionPatch,
    ) -> Result<Completion, ApiError> {
        self.client.patch(&id.to_string(), API_VERSION, patch).await
    }

    /// DELETE .../connections/{name}
    pub async fn delete(&self, id: &ConnectionId) -> Result<Completion, ApiError> {
        self.client.delete(&id.to_string(), API_VERSION).await
    }
}
