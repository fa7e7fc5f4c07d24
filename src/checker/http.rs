// src/checker/http.rs
// =============================================================================
// This module validates a single URL over HTTP.
//
// Key functionality:
// - Assets (images, scripts) get a HEAD request, no retry
// - Pages get a GET with a User-Agent, retried up to 3 times, and their body
//   is kept so the crawler can look for more links in it
// - Every failure is folded into the returned CheckOutcome; nothing here
//   ever aborts the crawl
//
// HTTP error statuses (3xx, 4xx, 5xx) are not failures at this level. They
// are recorded as data and classified later by the report.
// =============================================================================

use crate::checker::classify::is_page_like;
use crate::config::CrawlConfig;
use reqwest::{header, redirect, Client};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Who linked to a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Referrer {
    /// The starting page of the crawl
    Root,
    /// Pre-seeded from the ignore list, never fetched
    Ignored,
    /// The page whose markup contained the link
    Page(String),
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Root => write!(f, "(root)"),
            Referrer::Ignored => write!(f, "Ignored"),
            Referrer::Page(url) => write!(f, "{}", url),
        }
    }
}

/// Why a fetch could not complete cleanly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("could not resolve hostname: {0}")]
    Dns(String),
    #[error("TLS certificate error: {0}")]
    Tls(String),
    #[error("too many redirects: {0}")]
    TooManyRedirects(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("error reading body: {0}")]
    Body(String),
}

impl FetchError {
    // Sorts a transport-level reqwest error into one of our variants.
    //
    // reqwest's own Display only shows the outermost layer ("error sending
    // request for url (...)"), so keywords are looked for in the causes
    // beneath it. The outer message carries the URL, and "/ssl-guide" in a
    // path says nothing about TLS.
    fn from_transport(error: &reqwest::Error) -> Self {
        let detail = error_chain(error);
        let lower = error.source().map(error_chain).unwrap_or_default().to_lowercase();

        if error.is_timeout() {
            FetchError::Timeout(detail)
        } else if error.is_redirect() {
            FetchError::TooManyRedirects(detail)
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            FetchError::Tls(detail)
        } else if lower.contains("dns") || lower.contains("failed to lookup") {
            FetchError::Dns(detail)
        } else if error.is_connect() {
            FetchError::Connect(detail)
        } else {
            FetchError::Request(detail)
        }
    }

    fn from_body(error: &reqwest::Error) -> Self {
        FetchError::Body(error_chain(error))
    }
}

// "outer: inner: root cause"
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// The result of validating one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// HTTP status, `0` when no response was obtained
    pub status_code: u16,
    pub referrer: Referrer,
    pub error: Option<FetchError>,
    /// Page markup; only set for page fetches and consumed by recursion
    pub body: Option<String>,
    /// Set once the crawler has extracted links from this page
    pub recursed: bool,
}

impl CheckOutcome {
    pub fn new(referrer: Referrer) -> Self {
        CheckOutcome {
            status_code: 0,
            referrer,
            error: None,
            body: None,
            recursed: false,
        }
    }

    /// Sentinel for URLs listed in the ignore file
    pub fn ignored() -> Self {
        CheckOutcome::new(Referrer::Ignored)
    }

    pub fn is_ignored(&self) -> bool {
        self.referrer == Referrer::Ignored
    }
}

/// Anything that can validate a URL. The crawler is generic over this so it
/// can be driven without a network.
#[allow(async_fn_in_trait)]
pub trait LinkFetcher {
    async fn fetch(&self, referrer: Referrer, url: &str) -> CheckOutcome;
}

/// Number of GET attempts for a page before giving up.
pub const PAGE_ATTEMPTS: usize = 3;

// What a single GET attempt produced
#[derive(Debug)]
pub(crate) enum Attempt {
    /// Status and the full body
    Complete { status: u16, body: String },
    /// A response arrived but its body could not be read
    ReadFailed { status: u16, error: FetchError },
    /// No response at all
    Transport(FetchError),
}

// Runs `attempt` until it completes or the budget is spent.
//
// The first complete attempt wins and clears any earlier error. Otherwise
// the outcome describes the last attempt: a read failure keeps its status,
// a transport failure leaves status 0.
pub(crate) async fn retry_page<F, Fut>(
    referrer: Referrer,
    url: &str,
    attempts: usize,
    mut attempt: F,
) -> CheckOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt>,
{
    let mut outcome = CheckOutcome::new(referrer);

    for n in 1..=attempts.max(1) {
        match attempt().await {
            Attempt::Complete { status, body } => {
                outcome.status_code = status;
                outcome.body = Some(body);
                outcome.error = None;
                break;
            }
            Attempt::ReadFailed { status, error } => {
                log::debug!("Attempt {}/{} for {} got HTTP {} but {}", n, attempts, url, status, error);
                outcome.status_code = status;
                outcome.error = Some(error);
            }
            Attempt::Transport(error) => {
                log::debug!("Attempt {}/{} for {} failed: {}", n, attempts, url, error);
                outcome.status_code = 0;
                outcome.error = Some(error);
            }
        }
    }

    outcome
}

/// HTTP-backed fetcher. One per crawl run, so every request shares the
/// client's connection pool.
pub struct Fetcher {
    client: Client,
    user_agent: String,
    attempts: usize,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let redirect_policy = if config.max_redirects == 0 {
            redirect::Policy::none()
        } else {
            redirect::Policy::limited(config.max_redirects)
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(config.skip_tls)
            .build()?;

        Ok(Fetcher {
            client,
            user_agent: config.user_agent.clone(),
            attempts: config.page_attempts,
        })
    }

    // HEAD only; assets are never read or recursed into
    async fn check_asset(&self, referrer: Referrer, url: &str) -> CheckOutcome {
        let mut outcome = CheckOutcome::new(referrer);
        match self.client.head(url).send().await {
            Ok(response) => outcome.status_code = response.status().as_u16(),
            Err(e) => outcome.error = Some(FetchError::from_transport(&e)),
        }
        outcome
    }

    async fn fetch_page(&self, referrer: Referrer, url: &str) -> CheckOutcome {
        retry_page(referrer, url, self.attempts, || self.get_once(url)).await
    }

    async fn get_once(&self, url: &str) -> Attempt {
        let response = match self
            .client
            .get(url)
            .header(header::USER_AGENT, self.user_agent.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(FetchError::from_transport(&e)),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Attempt::Complete { status, body },
            Err(e) => Attempt::ReadFailed {
                status,
                error: FetchError::from_body(&e),
            },
        }
    }
}

impl LinkFetcher for Fetcher {
    async fn fetch(&self, referrer: Referrer, url: &str) -> CheckOutcome {
        if is_page_like(url) {
            self.fetch_page(referrer, url).await
        } else {
            self.check_asset(referrer, url).await
        }
    }
}
