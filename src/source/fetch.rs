//! HTTP fetching for the HTML source
//!
//! This module handles all HTTP requests made by the HTML page accessor:
//! - Building the HTTP client with a descriptive user agent
//! - GET requests for listing and detail pages
//! - Error classification
//!
//! # Status Handling
//!
//! | Condition | Result |
//! |-----------|--------|
//! | HTTP 2xx | Success with body |
//! | HTTP 404 / 410 | NotFound (item gone) |
//! | HTTP 429 | RateLimited |
//! | Other HTTP status | HttpError |
//! | Timeout / connection failure | NetworkError |
//!
//! Retrying is left to the crawl core, which already retries extraction and
//! page advances.

use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// The resource does not exist (404 or 410)
    NotFound,

    /// The server asked us to slow down
    RateLimited,

    /// Any other non-success status
    HttpError { status_code: u16 },

    /// Network error (connection refused, timeout, etc.)
    NetworkError { error: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the HTTP client used for listing and detail pages
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("listing-harvester/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            tracing::debug!("Fetch of {} failed: {}", url, error);
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    let final_url = response.url().to_string();

    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => return FetchResult::NotFound,
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Rate limited by {}", url);
            return FetchResult::RateLimited;
        }
        _ if !status.is_success() => {
            tracing::debug!("Fetch of {} returned {}", url, status);
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }
        _ => {}
    }

    match response.text().await {
        Ok(body) => FetchResult::Success { final_url, body },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}
