//! Consul KV store implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

/// Response header carrying the modify index of a single-key read
const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";

use crate::domain::storage::{validate_storage_key, KeyValueStore};
use crate::domain::DomainError;

/// Configuration for the Consul KV backend
#[derive(Debug, Clone)]
pub struct ConsulConfig {
    /// `http` or `https`
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8500,
            token: None,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ConsulConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Key-value store backed by the Consul KV HTTP API
#[derive(Debug, Clone)]
pub struct ConsulKeyValueStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ConsulKeyValueStore {
    pub fn new(config: ConsulConfig) -> Result<Self, DomainError> {
        let base_url = Url::parse(&config.address()).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid Consul address '{}': {}",
                config.address(),
                e
            ))
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build Consul client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    /// Builds `/v1/kv/{key}`, percent-encoding each key segment
    ///
    /// Keys with `.` or `..` segments are refused since URL resolution would fold them
    /// into a different key.
    fn kv_url(&self, key: &str) -> Result<Url, DomainError> {
        validate_storage_key(key)?;

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                DomainError::configuration("Consul address cannot be a base URL")
            })?;
            segments.clear().push("v1").push("kv");
            segments.extend(key.split('/'));
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header("X-Consul-Token", token),
            None => builder,
        }
    }

    /// Reads the raw value together with its modify index
    async fn get_indexed(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>, DomainError> {
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut().append_pair("raw", "true");

        let response = self
            .send(self.request(reqwest::Method::GET, url), key)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(key = %key, "Consul key not found");
                Ok(None)
            }
            status if status.is_success() => {
                let index = response
                    .headers()
                    .get(CONSUL_INDEX_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .ok_or_else(|| {
                        DomainError::storage(format!(
                            "Consul read of '{}' carried no usable {} header",
                            key, CONSUL_INDEX_HEADER
                        ))
                    })?;

                let bytes = response.bytes().await.map_err(|e| {
                    DomainError::storage(format!("Failed to read Consul value: {}", e))
                })?;
                Ok(Some((bytes.to_vec(), index)))
            }
            status => Err(DomainError::storage(format!(
                "Consul returned {} reading '{}'",
                status, key
            ))),
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        key: &str,
    ) -> Result<reqwest::Response, DomainError> {
        builder.send().await.map_err(|e| {
            DomainError::storage(format!("Consul request for '{}' failed: {}", key, e))
        })
    }

    /// Consul answers writes with a bare `true` or `false`
    async fn write_result(response: reqwest::Response, key: &str) -> Result<bool, DomainError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::storage(format!(
                "Consul returned {} writing '{}'",
                status, key
            )));
        }

        let body = response.text().await.map_err(|e| {
            DomainError::storage(format!("Failed to read Consul response: {}", e))
        })?;

        Ok(body.trim() == "true")
    }
}

#[async_trait]
impl KeyValueStore for ConsulKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut().append_pair("raw", "true");

        let response = self
            .send(self.request(reqwest::Method::GET, url), key)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(key = %key, "Consul key not found");
                Ok(None)
            }
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(|e| {
                    DomainError::storage(format!("Failed to read Consul value: {}", e))
                })?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(DomainError::storage(format!(
                "Consul returned {} reading '{}'",
                status, key
            ))),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DomainError> {
        let url = self.kv_url(key)?;
        let response = self
            .send(self.request(reqwest::Method::PUT, url).body(value), key)
            .await?;

        if Self::write_result(response, key).await? {
            Ok(())
        } else {
            Err(DomainError::storage(format!(
                "Consul rejected write to '{}'",
                key
            )))
        }
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, DomainError> {
        // cas=0 only succeeds when the key does not exist yet
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut().append_pair("cas", "0");

        let response = self
            .send(self.request(reqwest::Method::PUT, url).body(value), key)
            .await?;

        Self::write_result(response, key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<bool, DomainError> {
        let Some((current, index)) = self.get_indexed(key).await? else {
            return Ok(false);
        };

        if current != expected {
            return Ok(false);
        }

        // cas=<index> fails if the key was modified after our read
        let mut url = self.kv_url(key)?;
        url.query_pairs_mut().append_pair("cas", &index.to_string());

        let response = self
            .send(self.request(reqwest::Method::PUT, url).body(value), key)
            .await?;

        Self::write_result(response, key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        // Consul's DELETE reports success for absent keys too
        if self.get(key).await?.is_none() {
            return Ok(false);
        }

        let url = self.kv_url(key)?;
        let response = self
            .send(self.request(reqwest::Method::DELETE, url), key)
            .await?;

        Self::write_result(response, key).await
    }

    fn backend_name(&self) -> &'static str {
        "consul"
    }
}
