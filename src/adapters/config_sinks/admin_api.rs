use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{
    core::assembler::TopLevelConfig,
    ports::config_sink::{ConfigSink, SinkError, SinkResult},
};

/// Config sink that replaces the config of a running runtime through its admin API.
///
/// Posts the document to `<endpoint>/load`. This is for a runtime that already has its
/// admin endpoint enabled; the generated config itself disables it again once loaded.
pub struct AdminApiSink {
    load_url: Url,
    client: Client,
}

impl AdminApiSink {
    pub fn new(endpoint: &str, timeout: Duration) -> SinkResult<Self> {
        let load_url = Self::load_url(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        Ok(Self { load_url, client })
    }

    /// Resolve the `/load` URL below `endpoint`, keeping any path prefix.
    fn load_url(endpoint: &str) -> SinkResult<Url> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| SinkError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(SinkError::InvalidEndpoint(format!(
                "{endpoint}: scheme must be 'http' or 'https', got '{}'",
                base.scheme()
            )));
        }
        if base.host().is_none() {
            return Err(SinkError::InvalidEndpoint(format!(
                "{endpoint}: URL must have a valid host"
            )));
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("load")
            .map_err(|e| SinkError::InvalidEndpoint(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl ConfigSink for AdminApiSink {
    async fn emit(&self, config: &TopLevelConfig) -> SinkResult<()> {
        let response = self
            .client
            .post(self.load_url.clone())
            .json(config)
            .send()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        url = %self.load_url,
                        status = status.as_u16(),
                        error = %e,
                        "Failed to read rejection body"
                    );
                    String::new()
                }
            };
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(url = %self.load_url, status = status.as_u16(), "Runtime accepted config");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("admin API {}", self.load_url)
    }
}
