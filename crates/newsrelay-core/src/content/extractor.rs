use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::feed::{read_capped, Article};
use crate::{Error, Result};

const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Turns an article into the plain text handed to the summarizer
pub struct ContentExtractor {
    client: Client,
    newline_runs: Regex,
    max_page_bytes: usize,
}

impl ContentExtractor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.delivery.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let newline_runs =
            Regex::new(r"\n{3,}").map_err(|e| Error::Config(format!("Invalid pattern: {}", e)))?;

        Ok(Self {
            client,
            newline_runs,
            max_page_bytes: MAX_PAGE_BYTES,
        })
    }

    /// Extract readable text for `article`.
    ///
    /// A non-blank inline summary from the feed is used as is. Otherwise the
    /// article page is downloaded and reduced to its main text.
    pub async fn extract(&self, article: &Article) -> Result<String> {
        let raw = match article.inline_summary() {
            Some(summary) => {
                tracing::debug!("Using inline summary for article {}", article.id);
                summary.to_string()
            }
            None => self.extract_from_page(&article.link).await?,
        };

        let text = self.clean_text(&raw);
        if text.is_empty() {
            return Err(Error::Extract(format!(
                "No readable text for {}",
                article.link
            )));
        }

        Ok(text)
    }

    async fn extract_from_page(&self, link: &str) -> Result<String> {
        let url = Url::parse(link)?;
        tracing::debug!("Downloading article page {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Extract(format!("HTTP {} for URL: {}", status, url)));
        }

        let body = read_capped(response, self.max_page_bytes)
            .await?
            .ok_or_else(|| {
                Error::Extract(format!(
                    "Page larger than {} bytes for URL: {}",
                    self.max_page_bytes, url
                ))
            })?;

        // readability parses the whole DOM synchronously
        let product = tokio::task::spawn_blocking(move || {
            let html = String::from_utf8_lossy(&body);
            readability::extractor::extract(&mut html.as_bytes(), &url)
        })
        .await
        .map_err(|e| Error::Extract(format!("Extraction task failed: {}", e)))?
        .map_err(|e| Error::Extract(format!("{:?}", e)))?;

        Ok(product.text)
    }

    /// Collapse runs of three or more newlines into one and trim the result
    pub fn clean_text(&self, text: &str) -> String {
        self.newline_runs.replace_all(text, "\n").trim().to_string()
    }
}
