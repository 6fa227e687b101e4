mod common;

use common::{api_version, tester, SUB};
use mockito::{Matcher, Server};
use serde_json::json;
use tfsdk::{Dynamic, DynamicValue};

const RESOLVER: &str = "azurerm_private_dns_resolver";
const VERSION: &str = "2022-07-01";

fn resolver_path() -> String {
    format!("/subscriptions/{SUB}/resourceGroups/rg/providers/Microsoft.Network/dnsResolvers/resolver")
}

fn vnet_id() -> String {
    format!("/subscriptions/{SUB}/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet")
}

fn config(env: &str) -> DynamicValue {
    DynamicValue::object([
        ("name", Dynamic::from("resolver")),
        ("resource_group_name", Dynamic::from("rg")),
        ("location", Dynamic::from("westeurope")),
        ("virtual_network_id", Dynamic::from(vnet_id())),
        (
            "tags",
            Dynamic::Map([("env".to_string(), Dynamic::from(env))].into_iter().collect()),
        ),
    ])
}

fn remote(env: &str) -> String {
    json!({
        "id": resolver_path(),
        "name": "resolver",
        "location": "westeurope",
        "tags": { "env": env },
        "properties": {
            "virtualNetwork": { "id": vnet_id().replace("virtualNetworks", "virtualnetworks") },
            "dnsResolverState": "Connected",
            "provisioningState": "Succeeded"
        }
    })
    .to_string()
}

#[tokio::test]
async fn create_then_read_returns_the_same_state() {
    let mut server = Server::new_async().await;
    let absent = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "location": "westeurope",
            "tags": { "env": "test" },
            "properties": { "virtualNetwork": { "id": vnet_id() } }
        })))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let _found = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;

    let mut tester = tester(&server).await;
    let created = tester.create(RESOLVER, config("test")).await.unwrap();

    assert_eq!(created.get("id"), Some(&Dynamic::from(resolver_path())));
    assert_eq!(created.get("location"), Some(&Dynamic::from("westeurope")));
    assert_eq!(created.get("virtual_network_id"), Some(&Dynamic::from(vnet_id())));

    let read = tester.read(RESOLVER, &resolver_path()).await.unwrap().unwrap();
    assert_eq!(read, created);

    absent.assert_async().await;
    put.assert_async().await;
}

#[tokio::test]
async fn create_over_an_existing_resolver_requires_import() {
    let mut server = Server::new_async().await;
    let _found = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let put = server
        .mock("PUT", resolver_path().as_str())
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut tester = tester(&server).await;
    let err = tester.create(RESOLVER, config("test")).await.unwrap_err();

    assert!(err.to_string().contains("already exists"), "{}", err);
    put.assert_async().await;
}

#[tokio::test]
async fn changing_tags_patches_only_the_tags() {
    let mut server = Server::new_async().await;
    let _absent = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let _before = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .expect(2)
        .create_async()
        .await;
    let _after = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("prod"))
        .create_async()
        .await;
    let _put = server
        .mock("PUT", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .match_body(Matcher::Json(json!({ "tags": { "env": "prod" } })))
        .with_status(200)
        .with_body(remote("prod"))
        .expect(1)
        .create_async()
        .await;

    let mut tester = tester(&server).await;
    tester.create(RESOLVER, config("test")).await.unwrap();
    let updated = tester
        .update(RESOLVER, &resolver_path(), config("prod"))
        .await
        .unwrap();

    let tags = updated.get("tags").and_then(Dynamic::as_map).unwrap();
    assert_eq!(tags.get("env"), Some(&Dynamic::from("prod")));
    patch.assert_async().await;
}

#[tokio::test]
async fn moving_the_resolver_to_another_network_requires_replacement() {
    let mut server = Server::new_async().await;
    let _absent = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let _found = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let _put = server
        .mock("PUT", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;

    let mut tester = tester(&server).await;
    tester.create(RESOLVER, config("test")).await.unwrap();

    let mut moved = config("test");
    moved
        .set_value(
            &tfsdk::AttributePath::new("virtual_network_id"),
            Dynamic::from(vnet_id().replace("/vnet", "/other")),
        )
        .unwrap();
    let err = tester
        .update(RESOLVER, &resolver_path(), moved)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("requires replacing"), "{}", err);
}

#[tokio::test]
async fn deleting_a_resolver_that_is_already_gone_succeeds() {
    let mut server = Server::new_async().await;
    let _absent = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let _found = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let _put = server
        .mock("PUT", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let mut tester = tester(&server).await;
    tester.create(RESOLVER, config("test")).await.unwrap();
    tester.delete(RESOLVER, &resolver_path()).await.unwrap();

    assert!(tester.state(&resolver_path()).unwrap().is_none());
    delete.assert_async().await;
}

#[tokio::test]
async fn data_source_reads_an_existing_resolver() {
    let mut server = Server::new_async().await;
    let _found = server
        .mock("GET", resolver_path().as_str())
        .match_query(api_version(VERSION))
        .with_status(200)
        .with_body(remote("test"))
        .create_async()
        .await;

    let tester = tester(&server).await;
    let state = tester
        .read_data_source(
            RESOLVER,
            DynamicValue::object([
                ("name", Dynamic::from("resolver")),
                ("resource_group_name", Dynamic::from("rg")),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(state.get("id"), Some(&Dynamic::from(resolver_path())));
    assert_eq!(state.get("virtual_network_id"), Some(&Dynamic::from(vnet_id())));
    assert_eq!(state.get("location"), Some(&Dynamic::from("westeurope")));
}
