//! Robots.txt policy gate
//!
//! The site's robots.txt is fetched once at startup. Every URL is checked
//! against it before it may enter the frontier. A policy that cannot be
//! loaded degrades to allow-all with a single warning.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::MAX_REDIRECTS;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// Decides per URL whether fetching is permitted
#[derive(Debug, Clone)]
pub struct PolicyGate {
    robots: ParsedRobots,
}

impl PolicyGate {
    /// Fetches and parses the crawl policy for the host of `base_url`
    ///
    /// Never fails: any problem leaves the gate permissive.
    pub async fn load(client: &Client, base_url: &Url) -> Self {
        let robots_url = match robots_url(base_url) {
            Some(url) => url,
            None => {
                tracing::warn!(
                    "Cannot derive robots.txt location from {}; continuing without robots.txt rules",
                    base_url
                );
                return Self::degraded();
            }
        };

        match fetch_policy(client, robots_url.clone()).await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    tracing::info!("Loaded robots.txt from {}", robots_url);
                    Self::from_content(&body)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to read robots.txt from {}: {}. Continuing without robots.txt rules",
                        robots_url,
                        e
                    );
                    Self::degraded()
                }
            },
            Ok(response)
                if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) =>
            {
                tracing::info!("No robots.txt at {}; all paths allowed", robots_url);
                Self::degraded()
            }
            Ok(response) => {
                tracing::warn!(
                    "robots.txt at {} returned HTTP {}. Continuing without robots.txt rules",
                    robots_url,
                    response.status().as_u16()
                );
                Self::degraded()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch robots.txt from {}: {}. Continuing without robots.txt rules",
                    robots_url,
                    e
                );
                Self::degraded()
            }
        }
    }

    /// Builds a gate from robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            robots: ParsedRobots::from_content(content),
        }
    }

    /// A permissive gate, used when the site has no usable policy
    pub fn degraded() -> Self {
        Self {
            robots: ParsedRobots::allow_all(),
        }
    }

    /// Checks if `user_agent` may fetch `url`
    pub fn allows(&self, user_agent: &str, url: &str) -> bool {
        self.robots.is_allowed(url, user_agent)
    }
}

/// GET that follows redirects by hand
///
/// The crawl client never follows redirects itself. A robots.txt that moved
/// (http to https, a canonical host) still has to be honoured.
async fn fetch_policy(client: &Client, mut url: Url) -> reqwest::Result<Response> {
    let mut hops = 0;
    loop {
        let response = client.get(url.clone()).send().await?;
        if !response.status().is_redirection() || hops == MAX_REDIRECTS {
            return Ok(response);
        }

        let next = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| url.join(location).ok());
        match next {
            Some(next) => {
                tracing::debug!("robots.txt at {} redirects to {}", url, next);
                url = next;
                hops += 1;
            }
            None => return Ok(response),
        }
    }
}

/// robots.txt always lives at the host root
fn robots_url(base_url: &Url) -> Option<Url> {
    base_url.join("/robots.txt").ok()
}
