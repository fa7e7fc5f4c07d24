// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command: crawl one host and report broken links. All
// knobs are flags so the tool drops straight into a deployment pipeline:
//
//   site-linkcheck --host www.example.com --timeout 10
// =============================================================================

use crate::config::DEFAULT_USER_AGENT;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "site-linkcheck",
    version,
    about = "Crawl a site and report every broken link reachable from its home page",
    long_about = "site-linkcheck fetches the home page of --host, follows every link that stays \
                  on that host, and checks each linked resource (including off-site links and \
                  assets) once. It exits non-zero if any link redirects, errors, or is unreachable."
)]
pub struct Cli {
    /// Host name and optional port of the site to check (e.g. www.example.com:8080)
    #[arg(long)]
    pub host: String,

    /// Scheme used for the starting page
    #[arg(long, default_value = "http")]
    pub scheme: String,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub skip_tls: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,

    /// File of URLs to treat as already checked, one per line
    ///
    /// Lines without a scheme are taken relative to the starting page.
    #[arg(long, default_value = ".linkignore")]
    pub ignore_file: String,

    /// User-Agent header sent when fetching pages
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Maximum number of links checked at the same time
    #[arg(long, default_value_t = 50)]
    pub concurrency: usize,

    /// Redirects to follow per request (0 = report redirects as-is)
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,

    /// Output the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log every retry and skipped link
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
