//! Bearer tokens for the Resource Manager endpoint

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::common::string_or_u64;
use super::error::ApiError;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

pub enum TokenCredential {
    /// A pre-issued access token, used as is.
    Static(String),
    /// OAuth2 client credentials of a service principal.
    ClientSecret(ClientSecretCredential),
}

impl TokenCredential {
    pub async fn token(&self, http_client: &reqwest::Client) -> Result<String, ApiError> {
        match self {
            TokenCredential::Static(token) => Ok(token.clone()),
            TokenCredential::ClientSecret(credential) => credential.token(http_client).await,
        }
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "string_or_u64::deserialize")]
    expires_in: u64,
}

pub struct ClientSecretCredential {
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: RwLock<Option<CachedToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        resource_manager_endpoint: &str,
    ) -> Self {
        Self {
            authority_host: authority_host.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            cache: RwLock::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }

    pub async fn token(&self, http_client: &reqwest::Client) -> Result<String, ApiError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "requesting access token");
        let response = http_client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::AuthError(format!(
                "token request for client {:?} failed with status {}: {}",
                self.client_id,
                status.as_u16(),
                text
            )));
        }

        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::ParseError(format!("Failed to parse token response: {}", e)))?;
        let access_token = token.access_token.clone();
        *cache = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn credential(authority: &str) -> ClientSecretCredential {
        ClientSecretCredential::new(
            authority,
            "tenant",
            "client",
            "s3cret",
            "https://management.azure.com/",
        )
    }

    #[test]
    fn static_token_is_returned_as_is() {
        let credential = TokenCredential::Static("abc".to_string());
        let token = tokio_test::block_on(credential.token(&reqwest::Client::new()));
        assert_eq!(tokio_test::assert_ok!(token), "abc");
    }

    #[tokio::test]
    async fn client_secret_token_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant/oauth2/v2.0/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "client".into()),
                Matcher::UrlEncoded("client_secret".into(), "s3cret".into()),
                Matcher::UrlEncoded(
                    "scope".into(),
                    "https://management.azure.com/.default".into(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"tok-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let credential = credential(&server.url());
        let http = reqwest::Client::new();

        assert_eq!(credential.token(&http).await.unwrap(), "tok-1");
        assert_eq!(credential.token(&http).await.unwrap(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn tokens_close_to_expiry_are_refreshed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"expires_in":"60","access_token":"short-lived"}"#)
            .expect(2)
            .create_async()
            .await;

        let credential = credential(&server.url());
        let http = reqwest::Client::new();

        credential.token(&http).await.unwrap();
        credential.token(&http).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_credentials_are_an_auth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/tenant/oauth2/v2.0/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let err = credential(&server.url())
            .token(&reqwest::Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthError(_)));
        assert!(err.to_string().contains("invalid_client"));
    }
}
