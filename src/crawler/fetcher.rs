//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the configured header set
//! - GET requests that report redirects instead of following them
//! - Classifying failures as transient (worth retrying) or fatal

use crate::config::{CrawlerConfig, HttpConfig};
use crate::url::CrawlTarget;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of redirect hops followed by hand for one resource
pub const MAX_REDIRECTS: usize = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// A 2xx response with its body
    Success {
        /// Content-Type header value (empty if missing)
        content_type: String,
        /// Page body content
        body: String,
    },

    /// A 3xx response; the target is a new candidate URL
    Redirect {
        /// `Location` resolved against the requested URL
        location: Url,
    },

    /// A failure that may go away on a later attempt
    ///
    /// Non-2xx status, connection failures, timeouts and body read errors.
    Transient {
        /// Error description
        cause: String,
    },

    /// A failure no retry will fix
    Fatal {
        /// Error description
        cause: String,
    },
}

/// Builds the HTTP client shared by every worker
///
/// # Example
///
/// ```no_run
/// use doc_harvest::config::{CrawlerConfig, HttpConfig};
/// use doc_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    http: &HttpConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&http.accept) {
        headers.insert(ACCEPT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&http.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .user_agent(http.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(crawler.fetch_timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Failure classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | HTTP 3xx with a usable `Location` | Redirect |
/// | HTTP 3xx without one | Fatal |
/// | Any other HTTP status | Transient |
/// | Timeout | Transient |
/// | Connection error | Transient |
/// | Body read error | Transient |
/// | Request could not be built | Fatal |
pub async fn fetch_url(client: &Client, target: &CrawlTarget) -> FetchResult {
    let response = match client.get(target.as_url().clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| target.as_url().join(location).ok());

        return match location {
            Some(location) => FetchResult::Redirect { location },
            None => FetchResult::Fatal {
                cause: format!("HTTP {} without a usable Location header", status.as_u16()),
            },
        };
    }

    if !status.is_success() {
        return FetchResult::Transient {
            cause: format!("HTTP {}", status.as_u16()),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match response.text().await {
        Ok(body) => FetchResult::Success {
            content_type,
            body,
        },
        Err(e) => FetchResult::Transient {
            cause: format!("Failed to read body: {}", e),
        },
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_builder() {
        FetchResult::Fatal {
            cause: format!("Invalid request: {}", e),
        }
    } else if e.is_timeout() {
        FetchResult::Transient {
            cause: "Request timeout".to_string(),
        }
    } else if e.is_connect() {
        FetchResult::Transient {
            cause: format!("Connection failed: {}", e),
        }
    } else {
        FetchResult::Transient {
            cause: e.to_string(),
        }
    }
}

/// True if the Content-Type header names an HTML document
///
/// A missing header is accepted.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}
