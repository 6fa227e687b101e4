pub mod linkers;

use crate::api::ArmClient;

/// Microsoft.ServiceLinker API
pub struct ServiceLinkerApi<'a> {
    client: &'a ArmClient,
}

impl<'a> ServiceLinkerApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// Linker (service connection) operations
    pub fn linkers(&self) -> linkers::LinkersApi<'a> {
        linkers::LinkersApi::new(self.client)
    }
}
