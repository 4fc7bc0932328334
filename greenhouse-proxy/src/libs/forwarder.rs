//! Sends measurements to the greenhouse ingestion server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{Measurement, error::Error};

/// Destination of decoded measurements.
#[async_trait]
pub trait Uplink: Send + Sync {
    /// Deliver one measurement. Called once per measurement without retry.
    async fn send(&self, measurement: &Measurement) -> Result<(), Error>;
}

/// Immutable forwarding target built once at startup.
#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: String,
    /// Empty means no `X-Greenhouse-Key` header.
    pub auth_key: String,
}

pub struct Forwarder {
    client: Client,
    url: Url,
    auth_key: String,
}

pub const API_PATH: &'static str = "/api/v1/receive";
pub const KEY_HEADER: &'static str = "X-Greenhouse-Key";
const TIMEOUT_MS: u64 = 2000;

impl Forwarder {
    pub fn new(opts: Options) -> Result<Self, Error> {
        let url = format!("{}{}", opts.base_url.trim_end_matches('/'), API_PATH);
        let url = match Url::parse(url.as_str()) {
            Err(e) => {
                return Err(Error::InvalidConfig(format!(
                    "base URL {}: {}",
                    opts.base_url, e
                )));
            }
            Ok(url) => url,
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidConfig(format!(
                "base URL {}: unsupported scheme",
                opts.base_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(TIMEOUT_MS))
            .build()?;

        Ok(Forwarder {
            client,
            url,
            auth_key: opts.auth_key,
        })
    }

    /// POST one measurement. Status codes 400 and above are reported as
    /// [`Error::HttpStatus`].
    pub async fn forward(&self, measurement: &Measurement) -> Result<(), Error> {
        let mut req = self.client.post(self.url.clone()).json(measurement);
        if !self.auth_key.is_empty() {
            req = req.header(KEY_HEADER, self.auth_key.as_str());
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(Error::HttpStatus(status));
        }
        Ok(())
    }
}

#[async_trait]
impl Uplink for Forwarder {
    async fn send(&self, measurement: &Measurement) -> Result<(), Error> {
        self.forward(measurement).await
    }
}
