// src/config.rs
// =============================================================================
// The run context handed to the fetcher and the crawler.
//
// Everything a crawl needs to know lives in one CrawlConfig value built from
// the command line. Nothing is held in globals, so two crawls in the same
// process (as the tests do) never see each other's settings.
// =============================================================================

use crate::checker::PAGE_ATTEMPTS;
use crate::cli::Cli;
use anyhow::{bail, Result};
use std::time::Duration;

/// Sent with every page GET. Some sites refuse unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.96 Safari/537.36";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Host (and optional port) whose pages are recursed into
    pub host: String,
    /// "http" or "https", used to build the root URL
    pub scheme: String,
    /// Accept invalid TLS certificates
    pub skip_tls: bool,
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Upper bound on in-flight fetches within one batch
    pub concurrency: usize,
    /// 0 disables redirect following
    pub max_redirects: usize,
    pub page_attempts: usize,
}

impl CrawlConfig {
    /// Defaults for everything but the host
    pub fn new(host: &str) -> Self {
        CrawlConfig {
            host: host.to_string(),
            scheme: "http".to_string(),
            skip_tls: false,
            timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 50,
            max_redirects: 10,
            page_attempts: PAGE_ATTEMPTS,
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (scheme, host) = split_host(&cli.host, &cli.scheme)?;

        if cli.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        if cli.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }

        Ok(CrawlConfig {
            host,
            scheme,
            skip_tls: cli.skip_tls,
            timeout: Duration::from_secs(cli.timeout),
            user_agent: cli.user_agent.clone(),
            concurrency: cli.concurrency,
            max_redirects: cli.max_redirects,
            page_attempts: PAGE_ATTEMPTS,
        })
    }

    /// "<scheme>://<host>", the first page fetched
    pub fn root_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

// Accepts "example.com", "example.com:8080/" or "https://example.com".
// A scheme written into the host wins over --scheme.
fn split_host(raw: &str, default_scheme: &str) -> Result<(String, String)> {
    let raw = raw.trim();
    let (scheme, rest) = if let Some(rest) = raw.strip_prefix("https://") {
        ("https", rest)
    } else if let Some(rest) = raw.strip_prefix("http://") {
        ("http", rest)
    } else {
        (default_scheme, raw)
    };

    let host = rest.trim_end_matches('/');
    if host.is_empty() {
        bail!("--host must not be empty");
    }
    if host.contains('/') {
        bail!("--host must be a host name, not a path: {}", raw);
    }
    if scheme != "http" && scheme != "https" {
        bail!("unsupported scheme '{}', expected http or https", scheme);
    }

    Ok((scheme.to_string(), host.to_string()))
}
