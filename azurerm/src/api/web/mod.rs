pub mod connections;

use crate::api::ArmClient;

/// Microsoft.Web API
pub struct WebApi<'a> {
    client: &'a ArmClient,
}

impl<'a> WebApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// API connection operations
    pub fn connections(&self) -> connections::ConnectionsApi<'a> {
        connections::ConnectionsApi::new(self.client)
    }
}
