pub mod pools;

use crate::api::ArmClient;

/// Microsoft.DevOpsInfrastructure API
pub struct DevOpsInfrastructureApi<'a> {
    client: &'a ArmClient,
}

impl<'a> DevOpsInfrastructureApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// Managed DevOps pool operations
    pub fn pools(&self) -> pools::PoolsApi<'a> {
        pools::PoolsApi::new(self.client)
    }
}
