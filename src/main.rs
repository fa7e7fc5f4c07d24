// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments and set up logging
// 2. Build the run configuration and load the ignore list
// 3. Crawl the host, checking every link once
// 4. Print the report
// 5. Exit with proper code (0 = all links OK, 1 = broken links, 2 = error)
// =============================================================================

mod checker;
mod cli;
mod config;
mod crawl;
mod ignore;
mod report;

use anyhow::{Context, Result};
use checker::Fetcher;
use clap::Parser;
use cli::Cli;
use config::CrawlConfig;
use crawl::{Crawler, HostScope};
use report::Report;
use std::path::Path;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Err = configuration problem or the root page could not be fetched
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = CrawlConfig::from_cli(&cli)?;
    let root_url = config.root_url();
    log::info!("Checking: {}", root_url);

    let ignored = ignore::load_ignore_list(Path::new(&cli.ignore_file), &root_url)?;

    let fetcher = Fetcher::new(&config).context("Failed to build HTTP client")?;
    let scope = HostScope::new(&config.host).context("Invalid host")?;

    let start = Instant::now();
    let registry = Crawler::new(fetcher, scope, config.concurrency)
        .with_ignored(ignored)
        .run(&root_url)
        .await?;

    let report = Report::build(registry.into_entries(), start.elapsed());
    report::print_report(&report, cli.json)?;

    if report.summary.is_clean() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// -v = debug, -q = errors only, otherwise info. RUST_LOG still wins.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
