//! Single-URL fetching with timeout and a one-shot retry on transient
//! transport errors.

use crate::error::Result;
use crate::result::FailureReason;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A fetched resource body plus the response metadata the rest of the
/// pipeline cares about.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration, delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, delay })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET the URL. Non-2xx responses come back as `Fetched` with the status
    /// set; the caller decides what to record. Transient transport failures
    /// (timeout, connect) get exactly one immediate retry; a second failure
    /// is terminal for the URL.
    pub async fn fetch(&self, url: &Url) -> std::result::Result<Fetched, FailureReason> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.get(url).await {
            Ok(fetched) => Ok(fetched),
            Err(e) if is_transient(&e) => {
                debug!("transient error fetching {}: {}, retrying once", url, e);
                self.get(url).await.map_err(classify)
            }
            Err(e) => Err(classify(e)),
        }
    }

    async fn get(&self, url: &Url) -> reqwest::Result<Fetched> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?.to_vec();
        Ok(Fetched {
            status,
            content_type,
            bytes,
        })
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

fn classify(e: reqwest::Error) -> FailureReason {
    if e.is_timeout() {
        FailureReason::Timeout
    } else if e.is_connect() {
        FailureReason::Connect
    } else {
        FailureReason::Request(e.to_string())
    }
}
