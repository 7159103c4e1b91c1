use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;
use crate::error::GatewayError;

// Produces the media for a channel. The gateway only decides whether a
// caller may reach it.
#[async_trait]
pub trait MediaGenerator: Send + Sync {
    async fn make_clip(&self, channel: &str) -> Result<Bytes, GatewayError>;
    async fn make_preview(&self, channel: &str) -> Result<Bytes, GatewayError>;
}

// Generator service reached over HTTP
pub struct UpstreamGenerator {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamGenerator {
    // add http:// if not present, same as the backend list in the old gateway
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.starts_with("http") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };

        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, kind: &str, channel: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind, channel)
    }

    async fn fetch(&self, kind: &str, channel: &str) -> Result<Bytes, GatewayError> {
        let url = self.url(kind, channel);
        debug!(%url, "Calling media generator");

        let res = self.client.get(&url).timeout(self.timeout).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(GatewayError::UpstreamStatus {
                channel: channel.to_string(),
                status,
            });
        }

        Ok(res.bytes().await?)
    }
}

#[async_trait]
impl MediaGenerator for UpstreamGenerator {
    async fn make_clip(&self, channel: &str) -> Result<Bytes, GatewayError> {
        self.fetch("clip", channel).await
    }

    async fn make_preview(&self, channel: &str) -> Result<Bytes, GatewayError> {
        self.fetch("preview", channel).await
    }
}
