//! HTTP transport used by forms to reach module endpoints

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Status and raw body of an HTTP response
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends module requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as `application/json`
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<HttpReply>;

    /// GET with query parameters
    async fn get(&self, endpoint: &str, query: &[(String, String)]) -> Result<HttpReply>;
}

/// `reqwest`-backed transport; relative endpoints resolve against `base_url`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint
    pub fn resolve(&self, endpoint: &str) -> Result<Url> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base_url.join(endpoint)?),
            Err(e) => Err(Error::from(e)),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<HttpReply> {
        let url = self.resolve(endpoint)?;
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpReply { status, body })
    }

    async fn get(&self, endpoint: &str, query: &[(String, String)]) -> Result<HttpReply> {
        let url = self.resolve(endpoint)?;
        debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpReply { status, body })
    }
}
