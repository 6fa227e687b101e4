//! Test helpers for the ARM API

#[cfg(test)]
pub fn create_test_client(url: &str) -> super::ArmClient {
    let retry_config = super::RetryConfig {
        max_retries: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        timeout_seconds: 5,
    };
    super::ArmClient::with_config(
        url,
        super::TokenCredential::Static("test-token".to_string()),
        retry_config,
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::create_test_client;
    use mockito::Matcher;
    use serde_json::json;
    use tfsdk::{Completion, Context, PollerType, PollingStatus};

    const RG: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg";

    #[tokio::test]
    async fn test_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[tokio::test]
    async fn test_api_query_params() {
        use common::ApiQueryParams;

        let params = ApiQueryParams::api_version("2022-07-01")
            .add("foo", "bar")
            .add_optional("$filter", Some("name eq 'a b'"))
            .add_optional("none", None::<String>);

        let query = params.to_query_string();
        assert!(query.starts_with("?api-version=2022-07-01"));
        assert!(query.contains("foo=bar"));
        assert!(query.contains("%24filter=name%20eq%20%27a%20b%27"));
        assert!(!query.contains("none="));
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
    }

    #[test]
    fn test_connection_pool_config() {
        use pool::ConnectionPoolConfig;

        let config = ConnectionPoolConfig::default();
        assert_eq!(config.max_idle_per_host, 10);
        assert_eq!(config.request_timeout.as_secs(), 30);
        assert!(config.user_agent.starts_with("terraform-provider-azurerm/"));
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_request_counters() {
        use pool::{ConnectionStats, RequestCounters, RequestOutcome};

        let counters = RequestCounters::default();
        assert_eq!(counters.snapshot(), ConnectionStats::default());

        counters.record(RequestOutcome::Succeeded);
        counters.record(RequestOutcome::Throttled);
        counters.record(RequestOutcome::Failed);
        counters.record_retry();

        assert_eq!(
            counters.snapshot(),
            ConnectionStats {
                total_requests: 3,
                failed_requests: 2,
                throttled_requests: 1,
                retried_requests: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_get_sends_token_and_api_version() {
        let mut server = mockito::Server::new_async().await;
        let path = format!("{RG}/providers/Microsoft.Network/dnsResolvers/r1");
        let mock = server
            .mock("GET", path.as_str())
            .match_query(Matcher::UrlEncoded("api-version".into(), "2022-07-01".into()))
            .match_header("authorization", "Bearer test-token")
            .match_header("x-ms-client-request-id", Matcher::Any)
            .with_status(200)
            .with_body(json!({ "name": "r1", "location": "westeurope" }).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let body: serde_json::Value = client.get(&path, "2022-07-01").await.unwrap();

        assert_eq!(body["name"], "r1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .with_body(json!({ "error": { "code": "ResourceNotFound", "message": "gone" } }).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .get::<serde_json::Value>(&format!("{RG}/providers/Microsoft.Web/connections/c"), "2016-06-01")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().ends_with("/providers/Microsoft.Web/connections/c was not found"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.get::<serde_json::Value>(RG, "2021-04-01").await.unwrap_err();

        assert!(matches!(err, ApiError::ServiceUnavailable));
        let stats = client.connection_stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.retried_requests, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_throttled_request_is_counted_and_retried() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("GET", Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client.get::<serde_json::Value>(RG, "2021-04-01").await.unwrap();

        let stats = client.connection_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.throttled_requests, 1);
        assert_eq!(stats.retried_requests, 1);
        throttled.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_arm_error_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", Matcher::Any)
            .with_status(400)
            .with_body(
                json!({ "error": { "code": "InvalidParameter", "message": "location is invalid" } })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.put(RG, "2021-04-01", &json!({})).await.err().unwrap();

        match err {
            ApiError::ApiError { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, "InvalidParameter");
                assert_eq!(message, "location is invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_forbidden_is_an_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(403)
            .with_body("AuthorizationFailed")
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.get::<serde_json::Value>(RG, "2021-04-01").await.unwrap_err();
        assert!(matches!(err, ApiError::AuthError(ref text) if text == "AuthorizationFailed"));
    }

    #[tokio::test]
    async fn test_list_follows_next_link() {
        let mut server = mockito::Server::new_async().await;
        let path = format!("{RG}/providers/Microsoft.Network/dnsResolvers");
        let next = format!("{}{}?api-version=2022-07-01&page=2", server.url(), path);

        let first = server
            .mock("GET", path.as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "2022-07-01".into()),
                Matcher::UrlEncoded("$filter".into(), "name eq 'a'".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "value": [{ "name": "a" }], "nextLink": next }).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", path.as_str())
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(json!({ "value": [{ "name": "b" }] }).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let items: Vec<serde_json::Value> = client
            .list(&path, "2022-07-01", Some("name eq 'a'"))
            .await
            .unwrap();

        let names: Vec<_> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_async_operation_is_polled() {
        let mut server = mockito::Server::new_async().await;
        let operation = format!("{}/operations/op1", server.url());
        server
            .mock("PUT", Matcher::Any)
            .with_status(201)
            .with_header("Azure-AsyncOperation", operation.as_str())
            .with_body(json!({ "properties": { "provisioningState": "Creating" } }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/operations/op1")
            .with_status(200)
            .with_body(
                json!({ "status": "Failed", "error": { "code": "Conflict", "message": "busy" } })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let completion = client.put(RG, "2021-04-01", &json!({})).await.unwrap();

        let Completion::Poll(poller) = completion else {
            panic!("expected a long running operation");
        };
        let result = poller.poll(&Context::new()).await.unwrap();
        assert_eq!(result.status, PollingStatus::Failed);
        assert_eq!(result.message.as_deref(), Some("Conflict: busy"));
    }

    #[tokio::test]
    async fn test_location_is_polled_until_not_accepted() {
        let mut server = mockito::Server::new_async().await;
        let location = format!("{}/operations/loc1", server.url());
        server
            .mock("DELETE", Matcher::Any)
            .with_status(202)
            .with_header("Location", location.as_str())
            .create_async()
            .await;
        server
            .mock("GET", "/operations/loc1")
            .with_status(202)
            .with_header("Retry-After", "1")
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/operations/loc1")
            .with_status(200)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let Completion::Poll(poller) = client.delete(RG, "2021-04-01").await.unwrap() else {
            panic!("expected a long running operation");
        };

        let ctx = Context::new();
        let first = poller.poll(&ctx).await.unwrap();
        assert_eq!(first.status, PollingStatus::InProgress);
        assert_eq!(first.poll_interval, Some(std::time::Duration::from_secs(1)));
        let second = poller.poll(&ctx).await.unwrap();
        assert_eq!(second.status, PollingStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_provisioning_state_is_polled_on_the_resource() {
        let mut server = mockito::Server::new_async().await;
        let path = format!("{RG}/providers/Microsoft.DevOpsInfrastructure/pools/p");
        server
            .mock("PUT", path.as_str())
            .match_query(Matcher::Any)
            .with_status(201)
            .with_body(json!({ "properties": { "provisioningState": "Accepted" } }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", path.as_str())
            .match_query(Matcher::UrlEncoded("api-version".into(), "2025-01-21".into()))
            .with_status(200)
            .with_body(json!({ "properties": { "provisioningState": "Succeeded" } }).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let Completion::Poll(poller) = client.put(&path, "2025-01-21", &json!({})).await.unwrap() else {
            panic!("expected a long running operation");
        };

        let result = poller.poll(&Context::new()).await.unwrap();
        assert_eq!(result.status, PollingStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_accepted_delete_without_header_waits_for_gone() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", Matcher::Any)
            .with_status(202)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let completion = client.delete(RG, "2022-05-01").await.unwrap();
        assert!(matches!(completion, Completion::WaitForGone));
    }

    #[tokio::test]
    async fn test_succeeded_put_is_done() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", Matcher::Any)
            .with_status(200)
            .with_body(json!({ "properties": { "provisioningState": "Succeeded" } }).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let completion = client.put(RG, "2021-04-01", &json!({})).await.unwrap();
        assert!(matches!(completion, Completion::Done));
    }
}
