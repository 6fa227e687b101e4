pub mod monitors;

use crate::api::ArmClient;

/// Dynatrace.Observability API
pub struct DynatraceApi<'a> {
    client: &'a ArmClient,
}

impl<'a> DynatraceApi<'a> {
    pub fn new(client: &'a ArmClient) -> Self {
        Self { client }
    }

    /// Monitor operations
    pub fn monitors(&self) -> monitors::MonitorsApi<'a> {
        monitors::MonitorsApi::new(self.client)
    }
}
