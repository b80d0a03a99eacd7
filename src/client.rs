//! HTTP client for the Vault API.
//!
//! Apart from `authenticate`, every method here is a pass-through to one
//! service endpoint; the reconciler owns all decision logic. Enable is
//! idempotent on the service side, and the diff engine avoids redundant
//! calls before they are made.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::config::{AuthMount, EnableAuthOptions};
use crate::error::{Error, Result};

/// The slice of the service API the reconciler needs.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Establish credentials for the following calls. A no-op when a token
    /// is already present.
    async fn authenticate(&self, role: &str) -> Result<()>;

    /// The live auth mount table, keyed exactly as the service reports it
    /// (paths carry a trailing slash).
    async fn list_auth_mounts(&self) -> Result<HashMap<String, AuthMount>>;

    async fn enable_auth_mount(&self, path: &str, options: &EnableAuthOptions) -> Result<()>;

    /// Fails loudly when the target cannot be disabled (the built-in token
    /// backend answers 400).
    async fn disable_auth_mount(&self, path: &str) -> Result<()>;
}

/// Connection settings, read from the same environment variables the
/// official client uses.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: String,
    pub token: Option<String>,
    pub skip_verify: bool,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let address = std::env::var("VAULT_ADDR")
            .unwrap_or_else(|_| "https://127.0.0.1:8200".to_string());
        let token = std::env::var("VAULT_TOKEN").ok().filter(|t| !t.is_empty());
        let skip_verify = std::env::var("VAULT_SKIP_VERIFY")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
            .unwrap_or(false);
        Self {
            address,
            token,
            skip_verify,
        }
    }
}

pub struct VaultClient {
    http: reqwest::Client,
    address: Url,
    token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

impl VaultClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(config.skip_verify)
            .build()?;
        let address = Url::parse(&config.address)?;
        Ok(Self {
            http,
            address,
            token: Mutex::new(config.token),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.address.join(path)?)
    }

    fn current_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match self.current_token() {
            Some(token) => builder.header("X-Vault-Token", token),
            None => builder,
        }
    }

    /// Turn a non-success response into an error carrying the service's
    /// own message (`{"errors": [...]}`) when there is one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.errors.join("; "))
            .unwrap_or(body);
        Err(Error::Api { status, message })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[async_trait]
impl VaultApi for VaultClient {
    async fn authenticate(&self, role: &str) -> Result<()> {
        if self.current_token().is_some() {
            // Supposedly. The lookup below would catch a stale one, but a
            // token from the environment is taken at face value.
            info!("already authenticated by environment variable");
            return Ok(());
        }

        let url = self.endpoint("v1/auth/aws/login")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await?;
        let login: LoginResponse = Self::check(response).await?.json().await?;
        let auth = login.auth.ok_or(Error::NoAuthData)?;
        *self.token.lock().unwrap() = Some(auth.client_token);

        // Round-trip the new token so a bad login fails here, not at the
        // first real call.
        let url = self.endpoint("v1/auth/token/lookup-self")?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_auth_mounts(&self) -> Result<HashMap<String, AuthMount>> {
        let url = self.endpoint("v1/sys/auth")?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let body: serde_json::Value = Self::check(response).await?.json().await?;

        // Newer service versions nest the table under "data"; older ones
        // return it at the top level mixed with request metadata.
        if let Some(data) = body.get("data") {
            return Ok(serde_json::from_value(data.clone())?);
        }
        let mut mounts = HashMap::new();
        if let serde_json::Value::Object(entries) = body {
            for (path, value) in entries {
                if value.get("type").is_some() {
                    mounts.insert(path, serde_json::from_value(value)?);
                }
            }
        }
        Ok(mounts)
    }

    async fn enable_auth_mount(&self, path: &str, options: &EnableAuthOptions) -> Result<()> {
        let url = self.endpoint(&format!("v1/sys/auth/{}", path.trim_matches('/')))?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(options)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn disable_auth_mount(&self, path: &str) -> Result<()> {
        let url = self.endpoint(&format!("v1/sys/auth/{}", path.trim_matches('/')))?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_with_data_envelope_parses() {
        let body: serde_json::Value = serde_json::json!({
            "request_id": "abc",
            "data": {
                "token/": {
                    "type": "token",
                    "config": {"default_lease_ttl": 0, "max_lease_ttl": 0}
                }
            }
        });
        let mounts: HashMap<String, AuthMount> =
            serde_json::from_value(body.get("data").unwrap().clone()).unwrap();
        assert_eq!(mounts["token/"].auth_type, "token");
    }

    #[test]
    fn client_config_defaults_without_environment() {
        // Only exercises the fallbacks; env-driven values are covered by
        // running against a real service.
        let config = ClientConfig {
            address: "https://127.0.0.1:8200".into(),
            token: None,
            skip_verify: false,
        };
        let client = VaultClient::new(config).unwrap();
        let url = client.endpoint("v1/sys/auth").unwrap();
        assert_eq!(url.as_str(), "https://127.0.0.1:8200/v1/sys/auth");
    }
}
