pub mod extensions;

use crate::api::ArmClient;

/// Microsoft.KubernetesConfiguration API
pub struct KubernetesConfigurationApi<'a> {
    client: &'a ArmClient,
}

impl<'a> KubernetesConfigurationApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// Cluster extension operations
    pub fn extensions(&self) -> extensions::ExtensionsApi<'a> {
        extensions::ExtensionsApi::new(self.client)
    }
}
