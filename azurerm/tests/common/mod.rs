//! Shared setup for the mock server tests.

use azurerm::AzureRmProvider;
use mockito::{Matcher, ServerGuard};
use tfsdk::testing::ProviderTester;
use tfsdk::{Dynamic, DynamicValue};

pub const SUB: &str = "00000000-0000-0000-0000-000000000000";

/// A tester whose provider talks to `server` with a static token.
pub async fn tester(server: &ServerGuard) -> ProviderTester<AzureRmProvider> {
    let mut tester = ProviderTester::new(AzureRmProvider::new()).unwrap();
    tester
        .configure(DynamicValue::object([
            ("subscription_id", Dynamic::from(SUB)),
            ("access_token", Dynamic::from("test-token")),
            ("resource_manager_endpoint", Dynamic::from(server.url())),
        ]))
        .await
        .unwrap();
    tester
}

pub fn api_version(version: &str) -> Matcher {
    Matcher::UrlEncoded("api-version".to_string(), version.to_string())
}

pub fn block(entries: Vec<(&str, Dynamic)>) -> Dynamic {
    Dynamic::List(vec![Dynamic::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )])
}

pub fn block_field<'a>(state: &'a DynamicValue, block: &str, field: &str) -> Option<&'a Dynamic> {
    state
        .get(block)
        .and_then(Dynamic::as_list)
        .and_then(|elements| elements.first())
        .and_then(Dynamic::as_map)
        .and_then(|element| element.get(field))
}
