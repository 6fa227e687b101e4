pub mod dns_resolvers;

use crate::api::ArmClient;

/// Microsoft.Network API
pub struct NetworkApi<'a> {
    client: &'a ArmClient,
}

impl<'a> NetworkApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// Private DNS resolver operations
    pub fn dns_resolvers(&self) -> dns_resolvers::DnsResolversApi<'a> {
        dns_resolvers::DnsResolversApi::new(self.client)
    }
}
