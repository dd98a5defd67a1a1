use bytes::{Bytes, BytesMut};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy, Response};
use std::time::Duration;
use tokio::sync::watch;

use super::models::Item;
use super::parser::parse_items;
use crate::config::AppConfig;
use crate::scheduler::wait_for_shutdown;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEED_USER_AGENT: &str = concat!("newsrelay/", env!("CARGO_PKG_VERSION"));

/// Fetches one feed endpoint and turns it into items.
#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch and parse `url`, tagging items with `source_name`.
    ///
    /// Returns [`Error::Cancelled`] as soon as `shutdown` fires, without
    /// waiting for the request in flight.
    async fn fetch(
        &self,
        url: &str,
        source_name: &str,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Item>>;
}

/// Feed fetcher backed by a shared HTTP client
pub struct FeedFetcher {
    client: Client,
    max_bytes: usize,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client =
            Self::build_client(config.ingest.request_timeout_secs, &config.ingest.proxy_url)?;
        Ok(Self {
            client,
            max_bytes: MAX_FEED_BYTES,
        })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(Self::build_headers())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(concat!(
                "application/rss+xml,application/atom+xml,application/feed+json,",
                "application/xml;q=0.9,*/*;q=0.8"
            )),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(FEED_USER_AGENT));
        headers
    }

    /// Download the raw feed document
    async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        read_capped(response, self.max_bytes).await?.ok_or_else(|| {
            Error::FeedParse(format!(
                "Feed larger than {} bytes for URL: {}",
                self.max_bytes, url
            ))
        })
    }

    /// Fetch and parse a feed without cancellation
    pub async fn fetch_items(&self, url: &str, source_name: &str) -> Result<Vec<Item>> {
        tracing::debug!("Fetching feed '{}' from {}", source_name, url);

        let body = self.download(url).await?;
        let items = parse_items(&body, source_name, Utc::now())?;

        tracing::debug!("Feed '{}': {} items", source_name, items.len());
        Ok(items)
    }
}

#[async_trait::async_trait]
impl FeedClient for FeedFetcher {
    async fn fetch(
        &self,
        url: &str,
        source_name: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Item>> {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => Err(Error::Cancelled),
            result = self.fetch_items(url, source_name) => result,
        }
    }
}

/// Read a response body, giving up with `None` once it exceeds `limit` bytes.
///
/// The body is streamed, so a missing or lying `Content-Length` cannot make
/// it buffer more than `limit`.
pub(crate) async fn read_capped(mut response: Response, limit: usize) -> Result<Option<Bytes>> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Ok(None);
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Some(body.freeze()))
}
