//! Provider data structure passed to resources and data sources

use crate::api::ArmClient;
use std::any::Any;
use tfsdk::SdkError;

#[derive(Clone)]
pub struct AzureRmProviderData {
    pub client: ArmClient,
    pub subscription_id: String,
}

impl AzureRmProviderData {
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    /// Recovers the provider data handed to a resource's configure.
    pub fn from_any(provider_data: &(dyn Any + Send + Sync)) -> tfsdk::Result<Self> {
        provider_data
            .downcast_ref::<AzureRmProviderData>()
            .cloned()
            .ok_or_else(|| {
                SdkError::InvalidConfiguration(
                    "expected azurerm provider data; was the provider configured?".to_string(),
                )
            })
    }
}
